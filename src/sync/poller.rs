//! Background poller that re-runs refresh cycles on a fixed interval.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──start()──▶ Running ──shutdown()──▶ Stopped
//!   └──────────────shutdown()──────────────────▲
//! ```
//!
//! Shutdown may happen at any point, including before the poller was started;
//! a cancelled poller never spawns its loop. Cancellation interrupts the interval
//! sleep but never a refresh cycle that has already begun.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};

use super::engine::RefreshEngine;
use super::notifier::ChangeNotifier;
use crate::observability::metrics;

/// Poller lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Not started yet
    Idle,
    /// Loop spawned and sleeping or refreshing
    Running,
    /// Shutdown requested; the loop exits or never starts
    Stopped,
}

#[derive(Debug)]
struct PollerInner {
    state: PollerState,
    handle: Option<JoinHandle<()>>,
}

/// Cancellable background refresh loop
#[derive(Debug)]
pub struct Poller {
    interval: Duration,
    token: CancellationToken,
    inner: Mutex<PollerInner>,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            token: CancellationToken::new(),
            inner: Mutex::new(PollerInner { state: PollerState::Idle, handle: None }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PollerInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> PollerState {
        self.lock().state
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Spawn the refresh loop on the current tokio runtime.
    ///
    /// Returns `true` only for the call that moved the poller from `Idle` to
    /// `Running`. A poller that was already shut down stays stopped.
    pub fn start(&self, engine: Arc<RefreshEngine>, notifier: Arc<dyn ChangeNotifier>) -> bool {
        let mut inner = self.lock();
        if self.token.is_cancelled() {
            inner.state = PollerState::Stopped;
            return false;
        }
        if inner.state != PollerState::Idle {
            return false;
        }

        let token = self.token.clone();
        inner.handle = Some(tokio::spawn(run_loop(engine, notifier, self.interval, token)));
        inner.state = PollerState::Running;
        true
    }

    /// Request shutdown. Idempotent and safe before `start`.
    pub fn shutdown(&self) {
        self.token.cancel();
        let mut inner = self.lock();
        if inner.state != PollerState::Stopped {
            info!(previous_state = ?inner.state, "Stopping secret poller");
            inner.state = PollerState::Stopped;
        }
    }

    /// Wait for the loop task to exit. Returns immediately if it never started.
    pub async fn stopped(&self) {
        let handle = self.lock().handle.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Secret poller task ended abnormally");
            }
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run_loop(
    engine: Arc<RefreshEngine>,
    notifier: Arc<dyn ChangeNotifier>,
    interval: Duration,
    token: CancellationToken,
) {
    info!(
        store = %engine.store(),
        interval_ms = interval.as_millis() as u64,
        "Secret poller started"
    );

    while !token.is_cancelled() {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
        background_cycle(&engine, notifier.as_ref()).await;
    }

    info!(store = %engine.store(), "Secret poller stopped");
}

/// Run one best-effort cycle: errors are logged and counted, never returned.
///
/// Returns whether the cycle succeeded.
pub(crate) async fn background_cycle(
    engine: &RefreshEngine,
    notifier: &dyn ChangeNotifier,
) -> bool {
    let span = crate::refresh_span!("background", store = %engine.store());
    let started = Instant::now();

    match engine.refresh().instrument(span).await {
        Ok(outcome) => {
            metrics::record_refresh("background", &outcome, started.elapsed().as_secs_f64());
            if outcome.changed {
                notifier.on_reload();
            }
            true
        }
        Err(e) => {
            metrics::record_refresh_failure("background");
            warn!(
                store = %engine.store(),
                error = %e,
                transient = e.is_transient(),
                "Background secret refresh failed, keeping previous snapshot"
            );
            false
        }
    }
}
