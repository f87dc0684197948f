//! States of the restore state machine.
//!
//! ```text
//! Idle → StoppingTarget → SnapshottingWal → PreparingDataDir
//!      → ConfiguringRecovery → StartingTarget → Completed
//!
//! any working state ──fatal error──▶ Failed
//! ```
//!
//! There is no rollback: side effects of completed steps persist after a
//! failure, and leaving `Failed` means re-running from `Idle`.

use std::fmt;

use serde::Serialize;

/// A working step of the restore. Each one is also a [`RestoreState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreStep {
    /// Best-effort termination of the engine on the target.
    StoppingTarget,
    /// Copying every `.partial` segment to its canonical name.
    SnapshottingWal,
    /// Wiping the data directory and copying the base backup in.
    PreparingDataDir,
    /// Writing the recovery signal and recovery directives.
    ConfiguringRecovery,
    /// Launching the engine detached.
    StartingTarget,
}

impl RestoreStep {
    /// Steps in execution order.
    pub const ORDER: [Self; 5] = [
        Self::StoppingTarget,
        Self::SnapshottingWal,
        Self::PreparingDataDir,
        Self::ConfiguringRecovery,
        Self::StartingTarget,
    ];

    /// Returns the step name as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StoppingTarget => "stopping_target",
            Self::SnapshottingWal => "snapshotting_wal",
            Self::PreparingDataDir => "preparing_data_dir",
            Self::ConfiguringRecovery => "configuring_recovery",
            Self::StartingTarget => "starting_target",
        }
    }

    /// Whether a failure in this step aborts the restore. A failed
    /// non-fatal step is recorded as a warning and the machine advances.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::StoppingTarget)
    }
}

impl fmt::Display for RestoreStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full state of the restore state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreState {
    /// Not started, or ready to be re-run.
    Idle,
    /// Executing a working step.
    Running(RestoreStep),
    /// All steps succeeded and the engine was launched.
    Completed,
    /// A fatal step error stopped the machine.
    Failed(RestoreStep),
}

impl RestoreState {
    /// Returns the state name as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running(step) => step.as_str(),
            Self::Completed => "completed",
            Self::Failed(_) => "failed",
        }
    }

    /// Returns the next state after the current step succeeds.
    ///
    /// Terminal states and `Idle` map to themselves and to the first step
    /// respectively.
    #[must_use]
    pub fn advance(self) -> Self {
        match self {
            Self::Idle => Self::Running(RestoreStep::StoppingTarget),
            Self::Running(step) => {
                let next = RestoreStep::ORDER
                    .iter()
                    .skip_while(|s| **s != step)
                    .nth(1)
                    .copied();
                next.map_or(Self::Completed, Self::Running)
            }
            terminal => terminal,
        }
    }
}

impl fmt::Display for RestoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
