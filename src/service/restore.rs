//! Restore orchestration.
//!
//! Drives a restore target through the states produced by
//! [`RestoreState::advance`]. A failure in a step that is not
//! [`RestoreStep::is_fatal`] becomes a warning. Every fatal error escapes
//! immediately tagged with its step; nothing that already happened is
//! undone. See [`crate::domain::restore_state`] for the
//! state diagram.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use super::backup::BackupController;
use crate::archive::ArchiveDir;
use crate::config::{EngineProfile, RestoreConfig};
use crate::domain::{EventBus, Lsn, PitrEvent, RestoreId, RestoreState, RestoreStep};
use crate::error::PitrError;
use crate::exec::{CommandExecutor, RemoteCommand};

/// Parameters of one restore attempt.
///
/// The target environment and archive location come from
/// [`RestoreConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreRequest {
    /// Stop replay at this position (inclusive). `None` replays all
    /// available WAL.
    pub target_lsn: Option<Lsn>,
}

/// Outcome of a completed restore.
#[derive(Debug, Clone, Serialize)]
pub struct RestoreReport {
    /// Correlates logs and events of this attempt.
    pub restore_id: RestoreId,
    /// Replay bound that was configured.
    pub target_lsn: Option<Lsn>,
    /// States in the order they were entered, `Idle` through `Completed`.
    pub visited: Vec<RestoreState>,
    /// Canonical names written by the WAL snapshot.
    pub snapshotted: Vec<String>,
    /// Best-effort failures that did not stop the restore.
    pub warnings: Vec<String>,
}

/// Mutable bookkeeping for one attempt.
struct RestoreRun {
    id: RestoreId,
    visited: Vec<RestoreState>,
    snapshotted: Vec<String>,
    warnings: Vec<String>,
}

impl RestoreRun {
    fn new() -> Self {
        Self {
            id: RestoreId::new(),
            visited: vec![RestoreState::Idle],
            snapshotted: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn enter(&mut self, state: RestoreState) {
        self.visited.push(state);
    }
}

/// Rebuilds a restore target from the latest base backup plus archived WAL.
#[derive(Debug, Clone)]
pub struct RestoreOrchestrator {
    executor: Arc<dyn CommandExecutor>,
    backups: BackupController,
    config: RestoreConfig,
    archive: ArchiveDir,
    event_bus: EventBus,
}

impl RestoreOrchestrator {
    /// Creates a new `RestoreOrchestrator`.
    ///
    /// `archive` must share its lock with the monitor's handle.
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        backups: BackupController,
        config: RestoreConfig,
        archive: ArchiveDir,
        event_bus: EventBus,
    ) -> Self {
        Self {
            executor,
            backups,
            config,
            archive,
            event_bus,
        }
    }

    /// Runs a full restore.
    ///
    /// # Errors
    ///
    /// Returns [`PitrError::Precondition`] if no base backup exists, before
    /// any command is issued. Otherwise returns [`PitrError::RestoreStep`]
    /// naming the first step that failed fatally.
    pub async fn perform(&self, request: RestoreRequest) -> Result<RestoreReport, PitrError> {
        if !self.backups.has_existing_backup().await {
            return Err(PitrError::Precondition(format!(
                "no base backup found at {}; run a backup first",
                self.backups.marker_path().display()
            )));
        }

        let mut run = RestoreRun::new();
        tracing::info!(
            restore_id = %run.id,
            target = %self.config.target,
            target_lsn = ?request.target_lsn.map(|l| l.to_string()),
            "restore started"
        );

        let mut state = RestoreState::Idle.advance();
        while let RestoreState::Running(step) = state {
            run.enter(state);
            tracing::info!(restore_id = %run.id, %step, "entering restore step");
            let _ = self.event_bus.publish(PitrEvent::RestoreStepStarted {
                restore_id: run.id,
                step,
                timestamp: Utc::now(),
            });

            match self.run_step(step, &request, &mut run).await {
                Ok(()) => {}
                Err(e) if !step.is_fatal() => self.record_warning(step, &mut run, e.to_string()),
                Err(e) => {
                    run.enter(RestoreState::Failed(step));
                    tracing::error!(
                        restore_id = %run.id,
                        %step,
                        error = %e,
                        output = e.captured_output().unwrap_or(""),
                        "restore step failed"
                    );
                    let err = e.at_step(step);
                    let _ = self.event_bus.publish(PitrEvent::RestoreFailed {
                        restore_id: run.id,
                        step,
                        message: err.to_string(),
                        timestamp: Utc::now(),
                    });
                    return Err(err);
                }
            }
            state = state.advance();
        }

        run.enter(RestoreState::Completed);
        tracing::info!(restore_id = %run.id, warnings = run.warnings.len(), "restore target started");
        let _ = self.event_bus.publish(PitrEvent::RestoreCompleted {
            restore_id: run.id,
            target_lsn: request.target_lsn,
            timestamp: Utc::now(),
        });

        Ok(RestoreReport {
            restore_id: run.id,
            target_lsn: request.target_lsn,
            visited: run.visited,
            snapshotted: run.snapshotted,
            warnings: run.warnings,
        })
    }

    async fn run_step(
        &self,
        step: RestoreStep,
        request: &RestoreRequest,
        run: &mut RestoreRun,
    ) -> Result<(), PitrError> {
        match step {
            RestoreStep::StoppingTarget => {
                self.executor
                    .run_checked(&self.config.target, &RemoteCommand::new(["pkill", "postgres"]))
                    .await?;
                Ok(())
            }
            RestoreStep::SnapshottingWal => {
                run.snapshotted = self.archive.snapshot_partials().await?;
                Ok(())
            }
            RestoreStep::PreparingDataDir => self.prepare_data_dir(step, run).await,
            RestoreStep::ConfiguringRecovery => self.configure_recovery(request.target_lsn).await,
            RestoreStep::StartingTarget => {
                self.executor
                    .run_checked(&self.config.target, &start_command(&self.config.engine))
                    .await?;
                Ok(())
            }
        }
    }

    async fn prepare_data_dir(&self, step: RestoreStep, run: &mut RestoreRun) -> Result<(), PitrError> {
        let data_dir = self.config.data_dir.as_str();
        let target = self.config.target.as_str();

        self.executor
            .run_checked(target, &RemoteCommand::shell(format!("rm -rf {data_dir}/*")))
            .await?;
        self.executor
            .run_checked(
                target,
                &RemoteCommand::shell(format!("cp -r {}/* {data_dir}/", self.config.backup_dir)),
            )
            .await?;

        let chown = RemoteCommand::new(["chown", "-R", self.config.data_owner.as_str(), data_dir]);
        self.best_effort(step, run, &chown).await;
        Ok(())
    }

    async fn configure_recovery(&self, target_lsn: Option<Lsn>) -> Result<(), PitrError> {
        let data_dir = self.config.data_dir.as_str();
        let target = self.config.target.as_str();

        self.executor
            .run_checked(
                target,
                &RemoteCommand::new(["touch".to_string(), format!("{data_dir}/recovery.signal")]),
            )
            .await?;

        // one invocation per directive; the first failure stops the step
        for directive in recovery_directives(&self.config.wal_archive_dir, target_lsn) {
            let append = format!("echo \"{directive}\" >> {data_dir}/postgresql.auto.conf");
            self.executor
                .run_checked(target, &RemoteCommand::shell(append))
                .await?;
        }
        Ok(())
    }

    /// Runs a command whose failure is recorded as a warning instead of
    /// failing the step.
    async fn best_effort(&self, step: RestoreStep, run: &mut RestoreRun, command: &RemoteCommand) {
        if let Err(e) = self.executor.run_checked(&self.config.target, command).await {
            self.record_warning(step, run, e.to_string());
        }
    }

    fn record_warning(&self, step: RestoreStep, run: &mut RestoreRun, message: String) {
        tracing::warn!(restore_id = %run.id, %step, error = %message, "best-effort command failed, continuing");
        let _ = self.event_bus.publish(PitrEvent::RestoreStepWarning {
            restore_id: run.id,
            step,
            message: message.clone(),
            timestamp: Utc::now(),
        });
        run.warnings.push(message);
    }
}

/// Recovery settings appended to `postgresql.auto.conf`, in order.
///
/// `archive_dir` is the archive path as seen by the restore target.
#[must_use]
pub fn recovery_directives(archive_dir: &str, target_lsn: Option<Lsn>) -> Vec<String> {
    let mut directives = vec![
        format!("restore_command = 'cp {archive_dir}/%f %p'"),
        "recovery_target_action = 'promote'".to_string(),
    ];
    if let Some(lsn) = target_lsn {
        directives.push(format!("recovery_target_lsn = '{lsn}'"));
        directives.push("recovery_target_inclusive = 'true'".to_string());
    }
    directives
}

/// Detached engine launch with the given profile.
#[must_use]
pub fn start_command(profile: &EngineProfile) -> RemoteCommand {
    RemoteCommand::new([
        "docker-entrypoint.sh".to_string(),
        "postgres".to_string(),
        "-c".to_string(),
        format!("wal_level={}", profile.wal_level),
        "-c".to_string(),
        format!("max_wal_senders={}", profile.max_wal_senders),
        "-c".to_string(),
        format!("max_replication_slots={}", profile.max_replication_slots),
        "-c".to_string(),
        format!("max_connections={}", profile.max_connections),
        "-c".to_string(),
        "archive_mode=off".to_string(),
        "-c".to_string(),
        "listen_addresses=*".to_string(),
    ])
    .detached()
}
