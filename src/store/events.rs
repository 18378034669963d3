//! Notifications emitted by the store.
//!
//! Front ends subscribe to react to side effects (the completion
//! celebration, error toasts, refreshed overviews) without polling.

use crate::types::TaskId;
use serde::Serialize;
use tokio::sync::broadcast;

/// Capacity of the broadcast channel. Slow subscribers lag, they never block the store.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StoreEvent {
    /// A task transitioned to completed.
    Completed { task_id: TaskId, title: String },
    /// An operation failed; `message` is user-facing.
    Error { message: String },
    /// The all-tasks forest was rebuilt.
    Refreshed { task_count: usize },
}

/// Thin wrapper over a broadcast sender.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    /// Emit an event. Having no subscribers is fine.
    pub fn emit(&self, event: StoreEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
