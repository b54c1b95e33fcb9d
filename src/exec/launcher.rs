// src/exec/launcher.rs

//! Child process execution.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::{MpitasksError, Result};
use crate::exec::environment::ExecutionEnvironment;
use crate::launch::LaunchCommand;

/// Log target of the invocation echo, separate from the child's own output.
pub const ECHO_TARGET: &str = "mpitasks::echo";

/// Outcome of a finished child process.
///
/// A child terminated by a signal has no exit code and is reported as `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// One launch, borrowed from the caller for the duration of the call.
#[derive(Debug, Clone, Copy)]
pub struct LaunchRequest<'a> {
    /// Task name, used for logs and in `LaunchFailure`.
    pub task: &'a str,
    pub command: &'a LaunchCommand,
    pub env: &'a ExecutionEnvironment,
    /// Return the result even when the exit code is non-zero.
    pub ignore_exit_value: bool,
    /// Echo environment overlay and tokens before and after running.
    pub echo: bool,
}

/// Trait abstracting how launch commands are executed.
///
/// Production code uses [`ProcessLauncher`]; tests can provide their own
/// implementation that records requests instead of spawning processes.
pub trait Launcher: Send + Sync {
    /// Run the command to completion.
    ///
    /// Implementations must honour the exit-code policy: a non-zero exit is
    /// `LaunchFailure` unless `ignore_exit_value` is set.
    fn launch<'a>(
        &'a self,
        request: LaunchRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<ExecutionResult>> + Send + 'a>>;
}

/// Apply the exit-code policy shared by every [`Launcher`].
pub fn check_exit(request: &LaunchRequest<'_>, result: ExecutionResult) -> Result<ExecutionResult> {
    if result.success() {
        return Ok(result);
    }
    if request.ignore_exit_value {
        warn!(
            task = %request.task,
            exit_code = result.exit_code,
            "non-zero exit ignored (ignore_exit_value = true)"
        );
        return Ok(result);
    }
    Err(MpitasksError::LaunchFailure {
        task: request.task.to_string(),
        code: result.exit_code,
    })
}

/// Human-readable invocation: environment overlay, then the command tokens.
pub fn render_invocation(env: &ExecutionEnvironment, command: &LaunchCommand) -> String {
    if env.is_empty() {
        command.to_string()
    } else {
        format!("{} {}", env.render(), command)
    }
}

/// Spawns real OS processes with `tokio::process`.
///
/// stdin, stdout and stderr are inherited, so the child's output reaches the
/// terminal as it is produced.
#[derive(Debug, Clone, Default)]
pub struct ProcessLauncher {
    working_dir: Option<PathBuf>,
}

impl ProcessLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run children from `dir` instead of the current directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    async fn run(&self, request: LaunchRequest<'_>) -> Result<ExecutionResult> {
        let command = request.command;

        let mut cmd = Command::new(command.program());
        cmd.args(command.args());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in request.env.iter() {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let rendered = request.echo.then(|| render_invocation(request.env, command));
        if let Some(line) = &rendered {
            info!(target: ECHO_TARGET, task = %request.task, "exec: {line}");
        }

        debug!(
            task = %request.task,
            program = %command.program(),
            args = ?command.args(),
            "spawning launcher process"
        );

        let mut child = cmd.spawn().map_err(|source| MpitasksError::Spawn {
            program: command.program().to_string(),
            source,
        })?;

        let status = child.wait().await?;
        let result = ExecutionResult {
            exit_code: status.code().unwrap_or(-1),
        };

        info!(
            task = %request.task,
            exit_code = result.exit_code,
            success = status.success(),
            "launcher process exited"
        );
        if let Some(line) = &rendered {
            info!(
                target: ECHO_TARGET,
                task = %request.task,
                exit_code = result.exit_code,
                "done: {line}"
            );
        }

        check_exit(&request, result)
    }
}

impl Launcher for ProcessLauncher {
    fn launch<'a>(
        &'a self,
        request: LaunchRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<ExecutionResult>> + Send + 'a>> {
        Box::pin(self.run(request))
    }
}
