// src/lib.rs

pub mod cli;
pub mod compile;
pub mod config;
pub mod discover;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod launch;
pub mod logging;
pub mod registry;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::loader::load_and_validate;
use crate::exec::{render_invocation, Launcher};
use crate::fs::RealFileSystem;
use crate::registry::{TaskRegistry, TaskRunner};
use crate::types::LaunchOverrides;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - program discovery and task registration
/// - the compile gate and process launcher
/// - the requested subcommand
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    info!(config = ?config_path, root = ?cfg.root_dir(), "config loaded");

    let fs: Arc<dyn crate::fs::FileSystem> = Arc::new(RealFileSystem);
    let registry = TaskRegistry::from_config(&cfg, fs.as_ref())?;
    if registry.is_empty() {
        warn!("no programs found; nothing to run");
    }

    let runner = TaskRunner::from_config(&cfg, fs);

    match args.command {
        Command::List => {
            print_task_list(&registry);
            Ok(())
        }
        Command::Show { task, overrides } => {
            print_invocation(&registry, &runner, &task, &overrides.to_overrides())?;
            Ok(())
        }
        Command::Run {
            tasks,
            all,
            keep_going,
            overrides,
        } => {
            let names: Vec<String> = if all {
                registry.names().map(str::to_string).collect()
            } else {
                tasks
            };
            run_tasks(&registry, &runner, &names, &overrides.to_overrides(), keep_going).await
        }
    }
}

/// Run the named tasks one after another.
///
/// Each task's outcome is independent; without `keep_going` the first
/// failure stops the sequence.
pub async fn run_tasks<L: Launcher>(
    registry: &TaskRegistry,
    runner: &TaskRunner<L>,
    names: &[String],
    overrides: &LaunchOverrides,
    keep_going: bool,
) -> Result<()> {
    // Resolve every name first so a typo fails before anything runs.
    let tasks = names
        .iter()
        .map(|name| registry.task(name))
        .collect::<crate::errors::Result<Vec<_>>>()?;

    let mut failed: Vec<&str> = Vec::new();
    for task in tasks {
        match runner.invoke_with(task, overrides).await {
            Ok(result) => {
                info!(task = %task.name(), exit_code = result.exit_code, "task finished");
            }
            Err(err) if keep_going => {
                error!(
                    task = %task.name(),
                    exit_code = ?err.exit_code(),
                    error = %err,
                    "task failed; continuing"
                );
                failed.push(task.name());
            }
            Err(err) => return Err(err.into()),
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} task(s) failed: {}", failed.len(), failed.join(", "))
    }
}

/// Print tasks, programs and options.
fn print_task_list(registry: &TaskRegistry) {
    println!("tasks ({}):", registry.len());
    for task in registry.tasks() {
        let o = task.options();
        println!("  - {}", task.name());
        println!("      program: {}", task.program());
        println!("      np: {}", o.process_count);
        if o.bind_policy != types::BindPolicy::Unset {
            println!("      bind_to: {}", o.bind_policy);
        }
        if o.debug {
            println!("      debug: true");
        }
        if o.ignore_exit_value {
            println!("      ignore_exit_value: true");
        }
        if !task.args().is_empty() {
            println!("      args: {:?}", task.args());
        }
    }
}

/// Print the exact invocation of one task.
fn print_invocation<L: Launcher>(
    registry: &TaskRegistry,
    runner: &TaskRunner<L>,
    name: &str,
    overrides: &LaunchOverrides,
) -> crate::errors::Result<()> {
    let task = registry.task(name)?;
    let (_, command) = runner.prepare(task, overrides)?;
    println!("{}", render_invocation(runner.environment(), &command));
    Ok(())
}
