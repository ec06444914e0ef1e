//! Service lifecycle state machine.
//!
//! ```text
//! Constructed → Starting → Serving → Stopping → Stopped
//! ```
//!
//! Transitions only move forward; `Stopped` is terminal.

use tokio::sync::watch;

/// Observable lifecycle phase of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ServiceState {
    Constructed,
    /// `start` was called and the listener is being bound.
    Starting,
    /// Listener bound, accepting connections.
    Serving,
    /// `stop` was called; draining in-flight connections.
    Stopping,
    Stopped,
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ServiceState::Constructed => "constructed",
            ServiceState::Starting => "starting",
            ServiceState::Serving => "serving",
            ServiceState::Stopping => "stopping",
            ServiceState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Shared, forward-only holder of a [`ServiceState`].
#[derive(Debug)]
pub struct StateCell {
    tx: watch::Sender<ServiceState>,
}

impl StateCell {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ServiceState::Constructed);
        Self { tx }
    }

    pub fn get(&self) -> ServiceState {
        *self.tx.borrow()
    }

    /// Move to `next` if it is later than the current state.
    /// Returns whether the state changed.
    pub fn advance(&self, next: ServiceState) -> bool {
        self.tx.send_if_modified(|state| {
            if next > *state {
                *state = next;
                true
            } else {
                false
            }
        })
    }

    /// Watch for state changes.
    pub fn subscribe(&self) -> watch::Receiver<ServiceState> {
        self.tx.subscribe()
    }

    /// Wait until the state reaches at least `target`.
    pub async fn reached(&self, target: ServiceState) -> ServiceState {
        let mut rx = self.tx.subscribe();
        loop {
            let state = *rx.borrow_and_update();
            if state >= target {
                return state;
            }
            if rx.changed().await.is_err() {
                return state;
            }
        }
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
