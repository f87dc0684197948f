//! Scripted executor for tests.
//!
//! Records every invocation and answers from a list of rules. A command
//! that matches no rule succeeds with empty output.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{CommandExecutor, CommandOutput, RemoteCommand};
use crate::error::PitrError;

type Matcher = Box<dyn Fn(&RemoteCommand) -> bool + Send + Sync>;

struct Rule {
    matcher: Matcher,
    response: CommandOutput,
}

/// Test double recording `(target, command)` pairs.
#[derive(Default)]
pub(crate) struct FakeExecutor {
    calls: Mutex<Vec<(String, RemoteCommand)>>,
    rules: Mutex<Vec<Rule>>,
}

impl std::fmt::Debug for FakeExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeExecutor")
            .field("calls", &self.calls().len())
            .finish_non_exhaustive()
    }
}

impl FakeExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answers commands whose joined text contains `needle` with a failure.
    pub(crate) fn fail_when_contains(&self, needle: &str, status: Option<i32>, output: &str) {
        let needle = needle.to_string();
        self.respond(
            move |cmd| cmd.to_string().contains(&needle),
            CommandOutput {
                status,
                output: output.to_string(),
            },
        );
    }

    pub(crate) fn respond(
        &self,
        matcher: impl Fn(&RemoteCommand) -> bool + Send + Sync + 'static,
        response: CommandOutput,
    ) {
        if let Ok(mut rules) = self.rules.lock() {
            rules.push(Rule {
                matcher: Box::new(matcher),
                response,
            });
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, RemoteCommand)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Joined command lines, in invocation order.
    pub(crate) fn command_lines(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|(_, cmd)| cmd.to_string())
            .collect()
    }
}

#[async_trait]
impl CommandExecutor for FakeExecutor {
    async fn run(&self, target: &str, command: &RemoteCommand) -> Result<CommandOutput, PitrError> {
        self.calls
            .lock()
            .map_err(|_| PitrError::Persistence("fake executor poisoned".to_string()))?
            .push((target.to_string(), command.clone()));

        let rules = self
            .rules
            .lock()
            .map_err(|_| PitrError::Persistence("fake executor poisoned".to_string()))?;
        let response = rules
            .iter()
            .find(|rule| (rule.matcher)(command))
            .map_or_else(|| CommandOutput::success(""), |rule| rule.response.clone());
        Ok(response)
    }
}
