//! Change notification boundary.
//!
//! The mirror signals "data changed" through [`ChangeNotifier`] after a
//! background refresh that changed the published content. Fan-out to individual
//! observers belongs to the notifier.

use tokio::sync::watch;
use tracing::debug;

/// Receives a signal after each content-changing background refresh
pub trait ChangeNotifier: Send + Sync + std::fmt::Debug {
    fn on_reload(&self);
}

/// Notifier that drops every signal
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl ChangeNotifier for NoopNotifier {
    fn on_reload(&self) {}
}

/// Notifier backed by a watch channel carrying a reload generation.
///
/// Each signal bumps the generation by one. Receivers see the latest generation,
/// so a slow observer may coalesce several reloads into one wake-up.
#[derive(Debug)]
pub struct ReloadSignal {
    generation: watch::Sender<u64>,
}

impl Default for ReloadSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadSignal {
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self { generation }
    }

    /// Subscribe to reload generations
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    /// Number of reloads signalled so far
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }
}

impl ChangeNotifier for ReloadSignal {
    fn on_reload(&self) {
        self.generation.send_modify(|generation| *generation += 1);
        debug!(
            generation = self.generation(),
            observers = self.generation.receiver_count(),
            "Signalled reload"
        );
    }
}
