//! Service layer: backup, restore and the operator-facing facade.
//!
//! [`PitrService`] is what handlers talk to. It delegates to
//! [`BackupController`] and [`RestoreOrchestrator`], both of which issue
//! commands through [`crate::exec::CommandExecutor`] and publish events on
//! the [`crate::domain::EventBus`].

pub mod backup;
pub mod pitr_service;
pub mod restore;

pub use backup::BackupController;
pub use pitr_service::{BackupStatus, PitrService};
pub use restore::{RestoreOrchestrator, RestoreReport, RestoreRequest};
