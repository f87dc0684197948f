//! `docker exec` transport.

use async_trait::async_trait;
use tokio::process::Command;

use super::{CommandExecutor, CommandOutput, RemoteCommand};
use crate::error::PitrError;

/// Runs commands inside containers with `docker exec [-d] <target> argv...`.
#[derive(Debug, Clone)]
pub struct DockerExecutor {
    docker_bin: String,
}

impl DockerExecutor {
    /// Creates an executor that invokes `docker` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_binary("docker")
    }

    /// Creates an executor that invokes the given container CLI binary.
    #[must_use]
    pub fn with_binary(docker_bin: impl Into<String>) -> Self {
        Self {
            docker_bin: docker_bin.into(),
        }
    }

    fn build_args(target: &str, command: &RemoteCommand) -> Vec<String> {
        let mut args = Vec::with_capacity(command.argv.len() + 3);
        args.push("exec".to_string());
        if command.detached {
            args.push("-d".to_string());
        }
        args.push(target.to_string());
        args.extend(command.argv.iter().cloned());
        args
    }
}

impl Default for DockerExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandExecutor for DockerExecutor {
    async fn run(&self, target: &str, command: &RemoteCommand) -> Result<CommandOutput, PitrError> {
        let args = Self::build_args(target, command);
        tracing::debug!(target, command = %command, detached = command.detached, "docker exec");

        let output = Command::new(&self.docker_bin)
            .args(&args)
            .output()
            .await
            .map_err(|e| PitrError::io(format!("failed to run {} {}", self.docker_bin, args.join(" ")), e))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(CommandOutput {
            status: output.status.code(),
            output: combined,
        })
    }
}
