//! Identifier for a single restore attempt.
//!
//! Each run of the restore orchestrator gets a fresh [`RestoreId`] so its
//! log lines, events and API response can be correlated.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier of one restore attempt (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestoreId(uuid::Uuid);

impl RestoreId {
    /// Creates a new random `RestoreId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for RestoreId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RestoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for RestoreId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}
