//! Server lifecycle state machine.
//!
//! ```text
//! Created -> Starting -> Listening -> Draining -> Stopped
//!                 \_______________________________/
//!                          (bind failure)
//! ```
//!
//! The current state is published on a `watch` channel so callers can await
//! transitions instead of polling.

use std::fmt;

use tokio::sync::watch;

/// Lifecycle state of a [`HealthServer`](super::HealthServer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerState {
    /// Configured, not yet started
    Created,
    /// Binding the listener
    Starting,
    /// Accepting connections
    Listening,
    /// Listener closed, waiting for in-flight requests
    Draining,
    /// All connections closed
    Stopped,
}

impl ServerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerState::Created => "created",
            ServerState::Starting => "starting",
            ServerState::Listening => "listening",
            ServerState::Draining => "draining",
            ServerState::Stopped => "stopped",
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: ServerState) -> bool {
        use ServerState::*;
        matches!(
            (self, next),
            (Created, Starting)
                | (Starting, Listening)
                | (Starting, Stopped)
                | (Listening, Draining)
                | (Draining, Stopped)
        )
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Illegal server state transition from {from} to {to}")]
pub struct TransitionError {
    pub from: ServerState,
    pub to: ServerState,
}

/// Owner of the lifecycle state; hands out receivers for observers.
#[derive(Debug)]
pub struct StateTracker {
    tx: watch::Sender<ServerState>,
}

impl StateTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ServerState::Created);
        Self { tx }
    }

    pub fn current(&self) -> ServerState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.tx.subscribe()
    }

    /// Move to `next`, publishing the change to every subscriber.
    pub fn advance(&self, next: ServerState) -> Result<(), TransitionError> {
        let mut result = Ok(());
        self.tx.send_if_modified(|state| {
            if state.can_transition_to(next) {
                tracing::debug!(from = %state, to = %next, "Server state transition");
                *state = next;
                true
            } else {
                result = Err(TransitionError {
                    from: *state,
                    to: next,
                });
                false
            }
        });
        result
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}
