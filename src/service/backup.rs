//! Base backup of the primary.
//!
//! There is exactly one snapshot, "latest". Each trigger wipes it and takes
//! a fresh one; a failed attempt can leave it half populated, and the next
//! trigger cleans that up first.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;

use crate::config::BackupConfig;
use crate::domain::{EventBus, PitrEvent};
use crate::error::PitrError;
use crate::exec::{CommandExecutor, RemoteCommand};

/// Triggers base backups and answers whether one exists.
#[derive(Debug, Clone)]
pub struct BackupController {
    executor: Arc<dyn CommandExecutor>,
    config: BackupConfig,
    event_bus: EventBus,
}

impl BackupController {
    /// Creates a new `BackupController`.
    pub fn new(executor: Arc<dyn CommandExecutor>, config: BackupConfig, event_bus: EventBus) -> Self {
        Self {
            executor,
            config,
            event_bus,
        }
    }

    /// Host path of the marker file checked by [`Self::has_existing_backup`].
    #[must_use]
    pub fn marker_path(&self) -> PathBuf {
        self.config.marker_path()
    }

    /// Whether a base backup has completed at least once.
    ///
    /// Only the marker file's presence is checked, not its content. An
    /// unreadable path counts as absent.
    pub async fn has_existing_backup(&self) -> bool {
        tokio::fs::try_exists(self.marker_path()).await.unwrap_or(false)
    }

    /// Replaces the latest snapshot with a fresh base backup of the primary.
    ///
    /// # Errors
    ///
    /// Returns [`PitrError::ExternalProcess`] carrying the captured output
    /// if the cleanup or the backup utility fails.
    pub async fn trigger_backup(&self) -> Result<(), PitrError> {
        let target = self.config.primary_target.as_str();
        tracing::info!(target, dest = %self.config.container_dir, "starting base backup");
        let _ = self.event_bus.publish(PitrEvent::BackupStarted {
            target: target.to_string(),
            timestamp: Utc::now(),
        });

        match self.run_backup(target).await {
            Ok(()) => {
                tracing::info!(target, "base backup completed");
                let _ = self.event_bus.publish(PitrEvent::BackupCompleted {
                    target: target.to_string(),
                    timestamp: Utc::now(),
                });
                Ok(())
            }
            Err(e) => {
                tracing::error!(target, error = %e, output = e.captured_output().unwrap_or(""), "base backup failed");
                let _ = self.event_bus.publish(PitrEvent::BackupFailed {
                    target: target.to_string(),
                    message: e.to_string(),
                    timestamp: Utc::now(),
                });
                Err(e)
            }
        }
    }

    async fn run_backup(&self, target: &str) -> Result<(), PitrError> {
        let dest = &self.config.container_dir;

        // pg_basebackup refuses a non-empty destination
        self.executor
            .run_checked(target, &RemoteCommand::new(["rm", "-rf", dest.as_str()]))
            .await?;

        let output = self
            .executor
            .run_checked(target, &self.basebackup_command())
            .await?;
        tracing::debug!(target, output = %output, "pg_basebackup output");
        Ok(())
    }

    fn basebackup_command(&self) -> RemoteCommand {
        RemoteCommand::new([
            "pg_basebackup",
            "-h",
            "localhost",
            "-U",
            self.config.user.as_str(),
            "-D",
            self.config.container_dir.as_str(),
            "-X",
            "stream",
            "-F",
            "p",
            "-v",
        ])
    }
}
