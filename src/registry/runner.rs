// src/registry/runner.rs

//! Invocation of registered tasks: compile, build the command, launch.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::compile::{CompileGate, CompileStatus};
use crate::config::ConfigFile;
use crate::errors::Result;
use crate::exec::{ExecutionEnvironment, ExecutionResult, LaunchRequest, Launcher, ProcessLauncher};
use crate::fs::FileSystem;
use crate::launch::{LaunchCommand, LaunchContext, LaunchSpecBuilder};
use crate::registry::task::{Task, TaskState};
use crate::types::{LaunchOptions, LaunchOverrides};

/// Everything needed to turn a registered task into a finished process.
///
/// Shared by reference: several tasks may be invoked concurrently, each
/// call blocks only its own caller until the child exits.
pub struct TaskRunner<L: Launcher> {
    builder: LaunchSpecBuilder,
    env: ExecutionEnvironment,
    compile: CompileGate,
    launcher: L,
}

impl<L: Launcher> std::fmt::Debug for TaskRunner<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRunner")
            .field("context", self.builder.context())
            .field("env", &self.env)
            .field("compile", &self.compile)
            .finish_non_exhaustive()
    }
}

impl TaskRunner<ProcessLauncher> {
    /// Production runner for a validated config; children run from the
    /// project root.
    pub fn from_config(cfg: &ConfigFile, fs: Arc<dyn FileSystem>) -> Self {
        let env = ExecutionEnvironment::from_config(cfg);
        let compile = CompileGate::from_config(cfg, fs, env.clone());
        let launcher = ProcessLauncher::new().with_working_dir(cfg.root_dir());
        debug!(compile = compile.is_configured(), root = ?cfg.root_dir(), "task runner ready");
        Self::new(LaunchSpecBuilder::new(LaunchContext::from_config(cfg)), env, compile, launcher)
    }
}

impl<L: Launcher> TaskRunner<L> {
    pub fn new(
        builder: LaunchSpecBuilder,
        env: ExecutionEnvironment,
        compile: CompileGate,
        launcher: L,
    ) -> Self {
        Self {
            builder,
            env,
            compile,
            launcher,
        }
    }

    pub fn environment(&self) -> &ExecutionEnvironment {
        &self.env
    }

    /// Effective options plus the command a task would run, without running it.
    pub fn prepare(
        &self,
        task: &Task,
        overrides: &LaunchOverrides,
    ) -> Result<(LaunchOptions, LaunchCommand)> {
        let options = overrides.apply(task.options());
        let command = self.builder.build(task.program(), &options, task.args())?;
        Ok((options, command))
    }

    /// Run a task with its registered options.
    pub async fn invoke(&self, task: &Task) -> Result<ExecutionResult> {
        self.invoke_with(task, &LaunchOverrides::default()).await
    }

    /// Run a task: compile, build its command, launch it.
    ///
    /// The task ends in `Succeeded` or `Failed`; a compile failure never
    /// reaches the launcher.
    pub async fn invoke_with(
        &self,
        task: &Task,
        overrides: &LaunchOverrides,
    ) -> Result<ExecutionResult> {
        match self.compile.ensure_compiled(&self.launcher).await {
            Ok(CompileStatus::Compiled) => info!(task = %task.name(), "compile step finished"),
            Ok(_) => {}
            Err(e) => {
                error!(task = %task.name(), error = %e, "compile step failed; not launching");
                task.set_state(TaskState::Failed);
                return Err(e);
            }
        }

        task.set_state(TaskState::Running);
        let outcome = self.launch(task, overrides).await;
        task.set_state(match &outcome {
            Ok(_) => TaskState::Succeeded,
            Err(_) => TaskState::Failed,
        });
        outcome
    }

    async fn launch(&self, task: &Task, overrides: &LaunchOverrides) -> Result<ExecutionResult> {
        let (options, command) = self.prepare(task, overrides)?;

        info!(
            task = %task.name(),
            program = %task.program(),
            np = options.process_count,
            bind = %options.bind_policy,
            debug = options.debug,
            "launching task"
        );

        let request = LaunchRequest {
            task: task.name(),
            command: &command,
            env: &self.env,
            ignore_exit_value: options.ignore_exit_value,
            echo: options.debug,
        };
        self.launcher.launch(request).await
    }
}
