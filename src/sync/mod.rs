//! Secret synchronization core.
//!
//! ## Architecture
//!
//! ```text
//! Poller ──interval──▶ RefreshEngine ──list/fetch──▶ SecretStoreClient
//!                          │  └──should_load/key_for──▶ SecretPolicy
//!                          ▼
//!                    SnapshotCache ──changed──▶ ChangeNotifier
//! ```
//!
//! Each refresh cycle lists the store, reuses every record whose timestamp did
//! not move, fetches the rest concurrently and publishes a new immutable
//! [`Snapshot`]. A failed cycle publishes nothing.

pub mod engine;
pub mod notifier;
pub mod poller;
pub mod snapshot;

pub use engine::{RefreshEngine, RefreshOutcome};
pub use notifier::{ChangeNotifier, NoopNotifier, ReloadSignal};
pub use poller::{Poller, PollerState};
pub use snapshot::{ConfigData, LoadedSecret, Snapshot, SnapshotCache};
