//! # Secret Mirror
//!
//! Keeps an in-memory configuration snapshot synchronized with a remote secret
//! store. Secrets are listed with their last-modified timestamps; only secrets
//! whose timestamp moved are fetched again, and every cycle publishes a new
//! immutable snapshot that readers pick up without locking.
//!
//! ## Architecture
//!
//! ```text
//! SecretMirror ──▶ Poller ──▶ RefreshEngine ──▶ SecretStoreClient
//!       │                          │
//!       ▼                          ▼
//!  ChangeNotifier            SnapshotCache ──▶ readers
//! ```
//!
//! ## Core Components
//!
//! - **Secrets**: the [`SecretStoreClient`] seam, [`SecretPolicy`] filtering and key mapping
//! - **Sync**: the diffing [`sync::RefreshEngine`], snapshots and the background [`sync::Poller`]
//! - **Mirror**: the [`SecretMirror`] lifecycle façade
//! - **Config / Observability**: environment configuration, structured logging and metrics
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use secret_mirror::{
//!     DefaultSecretPolicy, InMemorySecretStore, MirrorConfig, ReloadSignal, SecretMirror,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> secret_mirror::Result<()> {
//!     let config = MirrorConfig::from_env()?;
//!     secret_mirror::observability::init_observability(&config.observability)?;
//!
//!     let signal = Arc::new(ReloadSignal::new());
//!     let mirror = SecretMirror::from_config(
//!         Arc::new(InMemorySecretStore::new()),
//!         Arc::new(DefaultSecretPolicy),
//!         signal.clone(),
//!         &config,
//!     )?;
//!     mirror.load_initial().await?;
//!
//!     let mut reloads = signal.subscribe();
//!     while reloads.changed().await.is_ok() {
//!         tracing::info!(keys = mirror.snapshot().data().len(), "Configuration reloaded");
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod errors;
pub mod mirror;
pub mod observability;
pub mod secrets;
pub mod sync;

// Re-export commonly used types and traits
pub use config::{MirrorConfig, MirrorOptions};
pub use errors::{MirrorError, Result};
pub use mirror::SecretMirror;
pub use secrets::{
    DefaultSecretPolicy, FetchedSecret, InMemorySecretStore, PrefixSecretPolicy, SecretItem,
    SecretPage, SecretPolicy, SecretStoreClient, SecretValue,
};
pub use sync::{
    ChangeNotifier, ConfigData, NoopNotifier, PollerState, ReloadSignal, Snapshot,
};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
