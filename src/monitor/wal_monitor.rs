//! Archive-to-catalog synchronization.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use super::scheduler::{PeriodicTask, spawn_periodic};
use crate::archive::ArchiveDir;
use crate::domain::{EventBus, PitrEvent, WalSegmentRecord};
use crate::error::PitrError;
use crate::persistence::WalCatalog;

/// Counters for one monitor tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Entries that classified as WAL segments.
    pub scanned: usize,
    /// Entries ignored as non-WAL or unreadable.
    pub skipped: usize,
    /// Catalog rows inserted or updated.
    pub changed: usize,
    /// Segments whose upsert failed.
    pub failed: usize,
}

/// Keeps the catalog in step with the archive directory.
#[derive(Debug, Clone)]
pub struct WalMonitor {
    archive: ArchiveDir,
    catalog: Arc<dyn WalCatalog>,
    event_bus: EventBus,
}

impl WalMonitor {
    /// Creates a monitor over `archive` writing into `catalog`.
    pub fn new(archive: ArchiveDir, catalog: Arc<dyn WalCatalog>, event_bus: EventBus) -> Self {
        Self {
            archive,
            catalog,
            event_bus,
        }
    }

    /// Runs one synchronization pass.
    ///
    /// Holds the archive's shared lock for the duration of the pass. A
    /// failed upsert is logged and counted; the remaining segments are still
    /// processed.
    ///
    /// # Errors
    ///
    /// Returns [`PitrError::Io`] if the archive directory cannot be listed.
    pub async fn tick(&self) -> Result<TickReport, PitrError> {
        let _guard = self.archive.lock().shared().await;
        let scan = self.archive.scan().await?;

        let mut report = TickReport {
            scanned: scan.segments.len(),
            skipped: scan.skipped,
            ..TickReport::default()
        };

        for observed in scan.segments {
            let entry = observed.entry;
            let record = WalSegmentRecord::observed(
                entry.canonical_name,
                entry.wal.timeline_id,
                entry.wal.segment_hex,
                entry.is_partial,
                observed.size_bytes,
            );
            match self.catalog.upsert(&record).await {
                Ok(true) => {
                    report.changed += 1;
                    tracing::debug!(
                        file_name = %record.file_name,
                        is_partial = record.is_partial,
                        size = record.file_size_bytes,
                        "catalog row updated"
                    );
                }
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(file_name = %record.file_name, error = %e, "failed to upsert WAL metadata");
                }
            }
        }

        if report.changed > 0 {
            tracing::info!(
                scanned = report.scanned,
                changed = report.changed,
                failed = report.failed,
                "WAL metadata synced"
            );
            let _ = self.event_bus.publish(PitrEvent::WalSynced {
                scanned: report.scanned,
                changed: report.changed,
                failed: report.failed,
                timestamp: Utc::now(),
            });
        } else {
            tracing::debug!(scanned = report.scanned, failed = report.failed, "WAL metadata unchanged");
        }

        Ok(report)
    }

    /// Spawns the monitor loop. A failed tick is logged and the loop keeps
    /// running.
    pub fn spawn(self: Arc<Self>, period: Duration) -> PeriodicTask {
        spawn_periodic("wal_monitor", period, move || {
            let monitor = Arc::clone(&self);
            async move {
                if let Err(e) = monitor.tick().await {
                    tracing::warn!(error = %e, "WAL monitor tick failed");
                }
            }
        })
    }
}
