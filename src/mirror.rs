//! # Secret Mirror
//!
//! Lifecycle façade over the refresh engine: initial load, optional background
//! polling, foreground reloads and shutdown.
//!
//! ```rust,no_run
//! use secret_mirror::{DefaultSecretPolicy, InMemorySecretStore, MirrorOptions, SecretMirror};
//! use std::{sync::Arc, time::Duration};
//!
//! # async fn run() -> secret_mirror::Result<()> {
//! let store = InMemorySecretStore::new();
//! let options = MirrorOptions::new("kv", Some(Duration::from_secs(30)))?;
//! let mirror = SecretMirror::new(Arc::new(store), Arc::new(DefaultSecretPolicy), options);
//!
//! mirror.load_initial().await?;
//! let password = mirror.get("database:password");
//! # let _ = password;
//! mirror.shutdown();
//! mirror.stopped().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{info, Instrument};

use crate::config::{MirrorConfig, MirrorOptions};
use crate::errors::Result;
use crate::observability::metrics;
use crate::secrets::{SecretPolicy, SecretStoreClient};
use crate::sync::{
    ChangeNotifier, NoopNotifier, Poller, PollerState, RefreshEngine, RefreshOutcome, Snapshot,
};

/// Mirrors a remote secret store into an in-memory configuration snapshot
#[derive(Debug)]
pub struct SecretMirror {
    engine: Arc<RefreshEngine>,
    notifier: Arc<dyn ChangeNotifier>,
    poller: Option<Poller>,
    options: MirrorOptions,
}

impl SecretMirror {
    /// Create a mirror that signals nobody on change
    pub fn new(
        client: Arc<dyn SecretStoreClient>,
        policy: Arc<dyn SecretPolicy>,
        options: MirrorOptions,
    ) -> Self {
        Self::with_notifier(client, policy, Arc::new(NoopNotifier), options)
    }

    /// Create a mirror that signals `notifier` after content-changing reloads
    pub fn with_notifier(
        client: Arc<dyn SecretStoreClient>,
        policy: Arc<dyn SecretPolicy>,
        notifier: Arc<dyn ChangeNotifier>,
        options: MirrorOptions,
    ) -> Self {
        let engine = Arc::new(RefreshEngine::new(client, policy, options.store_address()));
        let poller = options.reload_interval().map(Poller::new);
        Self { engine, notifier, poller, options }
    }

    /// Create a mirror from loaded configuration, validating it first
    pub fn from_config(
        client: Arc<dyn SecretStoreClient>,
        policy: Arc<dyn SecretPolicy>,
        notifier: Arc<dyn ChangeNotifier>,
        config: &MirrorConfig,
    ) -> Result<Self> {
        let options = config.to_options()?;
        Ok(Self::with_notifier(client, policy, notifier, options))
    }

    pub fn options(&self) -> &MirrorOptions {
        &self.options
    }

    /// Run the first refresh cycle in the foreground.
    ///
    /// Failures propagate to the caller and nothing is published. On success the
    /// background poller starts when a reload interval is configured. Observers
    /// are not signalled for this cycle.
    pub async fn load_initial(&self) -> Result<()> {
        let outcome = self.foreground_cycle("initial").await?;
        info!(
            store = %self.engine.store(),
            secrets = outcome.snapshot.len(),
            keys = outcome.snapshot.data().len(),
            "Loaded secrets from store"
        );

        if let Some(poller) = &self.poller {
            poller.start(Arc::clone(&self.engine), Arc::clone(&self.notifier));
        }
        Ok(())
    }

    /// Run a refresh cycle now, outside the polling schedule.
    ///
    /// Failures propagate and leave the current snapshot in place. Observers are
    /// signalled when the published content changed. Returns whether it changed.
    pub async fn reload(&self) -> Result<bool> {
        let outcome = self.foreground_cycle("manual").await?;
        if outcome.changed {
            self.notifier.on_reload();
        }
        Ok(outcome.changed)
    }

    async fn foreground_cycle(&self, trigger: &'static str) -> Result<RefreshOutcome> {
        let span = crate::refresh_span!(trigger, store = %self.engine.store());
        let started = Instant::now();

        match self.engine.refresh().instrument(span).await {
            Ok(outcome) => {
                metrics::record_refresh(trigger, &outcome, started.elapsed().as_secs_f64());
                Ok(outcome)
            }
            Err(e) => {
                metrics::record_refresh_failure(trigger);
                Err(e)
            }
        }
    }

    /// The currently published snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.engine.cache().current()
    }

    /// Value currently published under `key`, compared case-insensitively
    pub fn get(&self, key: &str) -> Option<String> {
        self.snapshot().get(key).map(str::to_string)
    }

    /// Receiver that observes every snapshot publication
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.engine.cache().subscribe()
    }

    /// Poller state, or `None` when no reload interval is configured
    pub fn poller_state(&self) -> Option<PollerState> {
        self.poller.as_ref().map(Poller::state)
    }

    /// Stop background polling. Idempotent and safe before `load_initial`.
    pub fn shutdown(&self) {
        if let Some(poller) = &self.poller {
            poller.shutdown();
        }
    }

    /// Wait for the background loop to exit after `shutdown`
    pub async fn stopped(&self) {
        if let Some(poller) = &self.poller {
            poller.stopped().await;
        }
    }
}

impl Drop for SecretMirror {
    fn drop(&mut self) {
        self.shutdown();
    }
}
