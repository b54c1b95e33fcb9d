// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::loader::DEFAULT_CONFIG_FILE;
use crate::types::{BindPolicy, LaunchOverrides};

/// Command-line arguments for `mpitasks`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mpitasks",
    version,
    about = "Discover MPI programs and launch each one through mpirun.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Mpitasks.toml` in the current working directory.
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MPITASKS_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List registered tasks with their program and options.
    List,

    /// Print the environment and command line of a task without running it.
    Show {
        /// Task name, e.g. `runBlocking`.
        #[arg(value_name = "TASK")]
        task: String,

        #[command(flatten)]
        overrides: OverrideArgs,
    },

    /// Compile if needed, then launch one or more tasks in order.
    Run {
        /// Task names, e.g. `runBlocking runCross`.
        #[arg(value_name = "TASK", required_unless_present = "all")]
        tasks: Vec<String>,

        /// Run every registered task.
        #[arg(long, conflicts_with = "tasks")]
        all: bool,

        /// Continue with the remaining tasks after a failure.
        #[arg(long)]
        keep_going: bool,

        #[command(flatten)]
        overrides: OverrideArgs,
    },
}

/// Invocation-time overrides of the registered launch options.
#[derive(Debug, Clone, Default, Args)]
pub struct OverrideArgs {
    /// Number of processes (`-np`).
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub np: Option<u32>,

    /// Binding policy: `unset`, `none`, or a launcher target such as `core`.
    #[arg(long, value_name = "POLICY")]
    pub bind_to: Option<BindPolicy>,

    /// Request a binding report and echo the full invocation.
    #[arg(long)]
    pub debug: bool,

    /// Report success even if the program exits non-zero.
    #[arg(long)]
    pub ignore_exit_value: bool,
}

impl OverrideArgs {
    pub fn to_overrides(&self) -> LaunchOverrides {
        LaunchOverrides {
            process_count: self.np,
            bind_policy: self.bind_to.clone(),
            debug: self.debug.then_some(true),
            ignore_exit_value: self.ignore_exit_value.then_some(true),
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
