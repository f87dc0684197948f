//! Per-connection topic filter.
//!
//! A new connection receives every topic. Clients narrow the stream with
//! `unsubscribe` and widen it again with `subscribe`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::PitrEvent;

/// Event category a client can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTopic {
    /// Monitor sync events.
    Wal,
    /// Backup lifecycle events.
    Backup,
    /// Restore step and outcome events.
    Restore,
}

impl EventTopic {
    /// Every topic.
    pub const ALL: [Self; 3] = [Self::Wal, Self::Backup, Self::Restore];

    /// Returns the topic an event belongs to.
    #[must_use]
    pub const fn of(event: &PitrEvent) -> Self {
        match event {
            PitrEvent::WalSynced { .. } => Self::Wal,
            PitrEvent::BackupStarted { .. }
            | PitrEvent::BackupCompleted { .. }
            | PitrEvent::BackupFailed { .. } => Self::Backup,
            PitrEvent::RestoreStepStarted { .. }
            | PitrEvent::RestoreStepWarning { .. }
            | PitrEvent::RestoreCompleted { .. }
            | PitrEvent::RestoreFailed { .. } => Self::Restore,
        }
    }
}

/// Manages the topic subscriptions of a single WebSocket connection.
#[derive(Debug)]
pub struct SubscriptionManager {
    topics: HashSet<EventTopic>,
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self {
            topics: EventTopic::ALL.into_iter().collect(),
        }
    }
}

impl SubscriptionManager {
    /// Creates a manager subscribed to every topic.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds topics.
    pub fn subscribe(&mut self, topics: &[EventTopic]) {
        self.topics.extend(topics.iter().copied());
    }

    /// Removes topics.
    pub fn unsubscribe(&mut self, topics: &[EventTopic]) {
        for topic in topics {
            self.topics.remove(topic);
        }
    }

    /// Returns `true` if the event's topic is subscribed.
    #[must_use]
    pub fn matches(&self, event: &PitrEvent) -> bool {
        self.topics.contains(&EventTopic::of(event))
    }

    /// Subscribed topics in a stable order.
    #[must_use]
    pub fn topics(&self) -> Vec<EventTopic> {
        EventTopic::ALL
            .into_iter()
            .filter(|t| self.topics.contains(t))
            .collect()
    }
}
