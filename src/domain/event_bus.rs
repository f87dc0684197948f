//! Broadcast channel for domain events.
//!
//! [`EventBus`] wraps a [`tokio::sync::broadcast`] channel. The monitor,
//! backup controller and restore orchestrator publish [`PitrEvent`]s and
//! every WebSocket connection subscribes.

use tokio::sync::broadcast;

use super::PitrEvent;

/// Broadcast bus for [`PitrEvent`]s.
///
/// Lagging receivers lose the oldest events once the ring buffer is full.
/// Publishing never blocks and never fails the publisher.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PitrEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event. With no
    /// receivers the event is dropped.
    pub fn publish(&self, event: PitrEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new receiver for all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PitrEvent> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
