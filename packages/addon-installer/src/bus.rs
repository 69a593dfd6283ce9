//! Broadcast bus for applied actions.
//!
//! Every action the store reduces is published here after the reducer pass,
//! so subscribers (UI bindings, analytics, tests) observe the same ordered
//! history the store applied.
//!
//! # Guarantees
//!
//! - **At-most-once delivery**: slow receivers may miss actions
//! - **In-memory only**: actions are not persisted
//! - **No replay**: late subscribers only see actions published after they
//!   subscribed; lagged receivers get `RecvError::Lagged`

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::actions::InstallAction;

/// Default channel capacity for the action bus.
pub const DEFAULT_CAPACITY: usize = 1024;

/// An applied action with its position in the store's history.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEnvelope {
    /// Monotonic sequence number assigned by the store, starting at 1.
    pub seq: u64,
    pub dispatched_at: DateTime<Utc>,
    pub action: InstallAction,
}

#[derive(Clone)]
pub struct ActionBus {
    sender: broadcast::Sender<ActionEnvelope>,
}

impl ActionBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// The capacity bounds how many actions are buffered before slow
    /// receivers start lagging.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an envelope to all subscribers.
    ///
    /// Returns the number of receivers that got it.
    pub fn publish(&self, envelope: ActionEnvelope) -> usize {
        self.sender.send(envelope).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ActionEnvelope> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ActionBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ActionBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
