//! Facade over the catalog, monitor, backup controller and restore
//! orchestrator.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;

use super::backup::BackupController;
use super::restore::{RestoreOrchestrator, RestoreReport, RestoreRequest};
use crate::domain::{EventBus, WalSegmentRecord};
use crate::error::PitrError;
use crate::monitor::{TickReport, WalMonitor};
use crate::persistence::{WalCatalog, WalLsnInfo, available_lsns};

/// Answer to "has a backup completed?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupStatus {
    /// Whether the marker file is present.
    pub exists: bool,
    /// Host path checked for the marker.
    pub marker_path: PathBuf,
}

/// Entry point for every operator action.
///
/// Backups and restores both rewrite shared directories, so they run one at
/// a time behind a maintenance lock. A request that finds the lock held is
/// rejected with [`PitrError::Busy`] instead of queueing.
///
/// Maintenance work runs on its own task holding the lock. Dropping the
/// caller's future (a client disconnect) does not stop it: the operation
/// runs to its outcome, publishes it, and only then releases the lock.
#[derive(Debug)]
pub struct PitrService {
    catalog: Arc<dyn WalCatalog>,
    monitor: Arc<WalMonitor>,
    backups: BackupController,
    restores: RestoreOrchestrator,
    event_bus: EventBus,
    maintenance: Arc<Mutex<()>>,
}

impl PitrService {
    /// Creates a new `PitrService`.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn WalCatalog>,
        monitor: Arc<WalMonitor>,
        backups: BackupController,
        restores: RestoreOrchestrator,
        event_bus: EventBus,
    ) -> Self {
        Self {
            catalog,
            monitor,
            backups,
            restores,
            event_bus,
            maintenance: Arc::new(Mutex::new(())),
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns the monitor, for spawning its periodic loop.
    #[must_use]
    pub fn monitor(&self) -> &Arc<WalMonitor> {
        &self.monitor
    }

    /// Lists cataloged segments in WAL order.
    ///
    /// # Errors
    ///
    /// Returns [`PitrError::Persistence`] if the catalog cannot be read.
    pub async fn list_segments(&self) -> Result<Vec<WalSegmentRecord>, PitrError> {
        self.catalog.list_segments().await
    }

    /// Lists the start LSN of every cataloged segment.
    ///
    /// # Errors
    ///
    /// Returns [`PitrError::Persistence`] if the catalog cannot be read.
    pub async fn available_lsns(&self) -> Result<Vec<WalLsnInfo>, PitrError> {
        available_lsns(self.catalog.as_ref()).await
    }

    /// Runs one monitor tick now, alongside the periodic loop.
    ///
    /// # Errors
    ///
    /// Returns [`PitrError::Io`] if the archive cannot be listed.
    pub async fn sync_now(&self) -> Result<TickReport, PitrError> {
        self.monitor.tick().await
    }

    /// Reports whether a base backup exists.
    pub async fn backup_status(&self) -> BackupStatus {
        BackupStatus {
            exists: self.backups.has_existing_backup().await,
            marker_path: self.backups.marker_path(),
        }
    }

    /// Takes a fresh base backup.
    ///
    /// # Errors
    ///
    /// Returns [`PitrError::Busy`] if a backup or restore is running, or the
    /// backup's own error.
    pub async fn trigger_backup(&self) -> Result<(), PitrError> {
        let guard = self.begin_maintenance("backup")?;
        let backups = self.backups.clone();
        let task = tokio::spawn(async move {
            let _guard = guard;
            backups.trigger_backup().await
        });
        join_maintenance("backup", task).await
    }

    /// Restores the target from the latest backup.
    ///
    /// # Errors
    ///
    /// Returns [`PitrError::Busy`] if a backup or restore is running, or the
    /// restore's own error.
    pub async fn perform_restore(&self, request: RestoreRequest) -> Result<RestoreReport, PitrError> {
        let guard = self.begin_maintenance("restore")?;
        let restores = self.restores.clone();
        let task = tokio::spawn(async move {
            let _guard = guard;
            restores.perform(request).await
        });
        join_maintenance("restore", task).await
    }

    fn begin_maintenance(&self, operation: &str) -> Result<OwnedMutexGuard<()>, PitrError> {
        Arc::clone(&self.maintenance).try_lock_owned().map_err(|_| {
            tracing::warn!(operation, "rejected: maintenance operation already running");
            PitrError::Busy(format!("cannot start {operation}: a backup or restore is already running"))
        })
    }
}

async fn join_maintenance<T>(
    operation: &str,
    task: JoinHandle<Result<T, PitrError>>,
) -> Result<T, PitrError> {
    task.await.unwrap_or_else(|e| {
        tracing::error!(operation, error = %e, "maintenance task aborted");
        Err(PitrError::Internal(format!("{operation} task aborted: {e}")))
    })
}
