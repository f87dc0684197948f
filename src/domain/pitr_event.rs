//! Domain events emitted by the monitor, backup controller and restore
//! orchestrator.
//!
//! Events are broadcast through the [`super::EventBus`] and forwarded to
//! WebSocket clients. They are an observability signal only; nothing in
//! the core reacts to them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Lsn, RestoreId, RestoreStep};

/// Event emitted after a notable state change.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum PitrEvent {
    /// A monitor tick changed at least one catalog row.
    WalSynced {
        /// Archive entries that parsed as WAL segments.
        scanned: usize,
        /// Rows inserted or updated.
        changed: usize,
        /// Entries whose persistence failed.
        failed: usize,
        /// Tick completion time.
        timestamp: DateTime<Utc>,
    },

    /// A base backup was started on the primary.
    BackupStarted {
        /// Execution target of the primary.
        target: String,
        /// Start time.
        timestamp: DateTime<Utc>,
    },

    /// A base backup finished successfully.
    BackupCompleted {
        /// Execution target of the primary.
        target: String,
        /// Completion time.
        timestamp: DateTime<Utc>,
    },

    /// A base backup failed.
    BackupFailed {
        /// Execution target of the primary.
        target: String,
        /// Error message including captured output.
        message: String,
        /// Failure time.
        timestamp: DateTime<Utc>,
    },

    /// The restore orchestrator entered a working step.
    RestoreStepStarted {
        /// Restore attempt.
        restore_id: RestoreId,
        /// The step being entered.
        step: RestoreStep,
        /// Transition time.
        timestamp: DateTime<Utc>,
    },

    /// A best-effort step failed and the restore carried on.
    RestoreStepWarning {
        /// Restore attempt.
        restore_id: RestoreId,
        /// The step that reported the failure.
        step: RestoreStep,
        /// What went wrong.
        message: String,
        /// Time of the warning.
        timestamp: DateTime<Utc>,
    },

    /// The restore target was launched.
    RestoreCompleted {
        /// Restore attempt.
        restore_id: RestoreId,
        /// Replay bound, if one was requested.
        target_lsn: Option<Lsn>,
        /// Completion time.
        timestamp: DateTime<Utc>,
    },

    /// The restore stopped at a fatal step error.
    RestoreFailed {
        /// Restore attempt.
        restore_id: RestoreId,
        /// The failing step.
        step: RestoreStep,
        /// Error message including captured output.
        message: String,
        /// Failure time.
        timestamp: DateTime<Utc>,
    },
}

impl PitrEvent {
    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::WalSynced { .. } => "wal_synced",
            Self::BackupStarted { .. } => "backup_started",
            Self::BackupCompleted { .. } => "backup_completed",
            Self::BackupFailed { .. } => "backup_failed",
            Self::RestoreStepStarted { .. } => "restore_step_started",
            Self::RestoreStepWarning { .. } => "restore_step_warning",
            Self::RestoreCompleted { .. } => "restore_completed",
            Self::RestoreFailed { .. } => "restore_failed",
        }
    }

    /// Returns the restore attempt this event belongs to, if any.
    #[must_use]
    pub const fn restore_id(&self) -> Option<RestoreId> {
        match self {
            Self::RestoreStepStarted { restore_id, .. }
            | Self::RestoreStepWarning { restore_id, .. }
            | Self::RestoreCompleted { restore_id, .. }
            | Self::RestoreFailed { restore_id, .. } => Some(*restore_id),
            _ => None,
        }
    }
}
