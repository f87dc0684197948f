//! Process-execution boundary.
//!
//! Backup and restore issue discrete commands (stop engine, remove tree,
//! copy tree, append a config line, start engine) against a named target
//! environment. They depend only on [`CommandExecutor`]: run a command,
//! capture combined output, report the exit status. The transport is a
//! separate concern; [`DockerExecutor`] runs commands with `docker exec`.
//!
//! Invocations carry no timeout. A hung command blocks its caller.

pub mod docker;
#[cfg(test)]
pub(crate) mod fake;

use std::fmt;

use async_trait::async_trait;

use crate::error::PitrError;

pub use docker::DockerExecutor;

/// A command to run inside a target environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    /// Program followed by its arguments.
    pub argv: Vec<String>,
    /// Start the command in the background and return immediately.
    pub detached: bool,
}

impl RemoteCommand {
    /// Creates a foreground command from an argument vector.
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            detached: false,
        }
    }

    /// Creates a `bash -c <script>` command, for globbing and redirection.
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new(["bash".to_string(), "-c".to_string(), script.into()])
    }

    /// Marks the command as detached.
    #[must_use]
    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    /// Returns the program name, or `""` for an empty command.
    #[must_use]
    pub fn program(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv.join(" "))
    }
}

/// Result of one command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or `None` if the process was terminated by a signal.
    pub status: Option<i32>,
    /// Combined stdout and stderr.
    pub output: String,
}

impl CommandOutput {
    /// A successful invocation with the given output.
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            output: output.into(),
        }
    }

    /// Whether the command exited with status 0.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == Some(0)
    }

    /// Converts a non-zero exit into [`PitrError::ExternalProcess`],
    /// returning the captured output otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`PitrError::ExternalProcess`] if the command did not exit
    /// with status 0.
    pub fn into_result(self, command: &RemoteCommand) -> Result<String, PitrError> {
        if self.is_success() {
            Ok(self.output)
        } else {
            Err(PitrError::ExternalProcess {
                command: command.to_string(),
                status: self.status,
                output: self.output,
            })
        }
    }
}

/// Runs commands against named target environments.
///
/// `Err` is reserved for failures to invoke the command at all. A command
/// that ran and exited non-zero is reported through
/// [`CommandOutput::status`].
#[async_trait]
pub trait CommandExecutor: Send + Sync + fmt::Debug {
    /// Runs `command` inside `target`, waiting for it to exit (or, for a
    /// detached command, for it to be launched).
    async fn run(&self, target: &str, command: &RemoteCommand) -> Result<CommandOutput, PitrError>;

    /// Runs `command` and requires a zero exit status.
    ///
    /// # Errors
    ///
    /// Returns [`PitrError::ExternalProcess`] with the captured output on a
    /// non-zero exit, or the invocation error if the command could not run.
    async fn run_checked(&self, target: &str, command: &RemoteCommand) -> Result<String, PitrError> {
        self.run(target, command).await?.into_result(command)
    }
}
