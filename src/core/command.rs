/// External command execution
///
/// Collectors never go through a shell: each command is a fixed argv, so
/// nothing from a request can end up on a command line.

use futures::future::BoxFuture;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use super::error::{CollectError, CollectResult};

/// A fixed program + arguments pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ShellCommand {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal
    pub status_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == Some(0)
    }
}

/// Runs external commands on behalf of the collectors
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &ShellCommand) -> BoxFuture<'static, CollectResult<CommandOutput>>;
}

/// Spawns real processes with `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

impl CommandRunner for TokioCommandRunner {
    fn run(&self, command: &ShellCommand) -> BoxFuture<'static, CollectResult<CommandOutput>> {
        let command = command.clone();
        Box::pin(async move {
            let output = tokio::process::Command::new(&command.program)
                .args(&command.args)
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|source| CollectError::Spawn {
                    command: command.to_string(),
                    source,
                })?;

            Ok(CommandOutput {
                status_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        })
    }
}

/// Run a command with a bounded wait, returning the raw output
///
/// Dropping the timed-out future drops the child, which kills it.
pub async fn run_with_timeout(
    runner: &dyn CommandRunner,
    command: &ShellCommand,
    timeout: Duration,
) -> CollectResult<CommandOutput> {
    debug!(command = %command, "running collector command");

    match tokio::time::timeout(timeout, runner.run(command)).await {
        Ok(result) => result,
        Err(_) => Err(CollectError::Timeout {
            command: command.to_string(),
            after: timeout,
        }),
    }
}

/// Run a command and return its stdout
///
/// A nonzero exit or anything written to stderr counts as failure.
pub async fn run_checked(
    runner: &dyn CommandRunner,
    command: &ShellCommand,
    timeout: Duration,
) -> CollectResult<String> {
    let output = run_with_timeout(runner, command, timeout).await?;
    check_output(command, output)
}

pub(crate) fn check_output(command: &ShellCommand, output: CommandOutput) -> CollectResult<String> {
    let stderr = output.stderr.trim();

    if !output.is_success() {
        let message = if !stderr.is_empty() {
            stderr.to_string()
        } else if !output.stdout.trim().is_empty() {
            output.stdout.trim().to_string()
        } else {
            match output.status_code {
                Some(code) => format!("exited with status {}", code),
                None => "terminated by signal".to_string(),
            }
        };
        return Err(CollectError::CommandFailed {
            command: command.to_string(),
            message,
        });
    }

    if !stderr.is_empty() {
        return Err(CollectError::CommandFailed {
            command: command.to_string(),
            message: stderr.to_string(),
        });
    }

    Ok(output.stdout)
}
