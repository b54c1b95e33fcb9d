// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`environment`] holds the variables overlaid on the inherited
//!   environment (library search path plus `[env]`).
//! - [`launcher`] provides the [`Launcher`] trait, the exit-code policy and
//!   the real [`ProcessLauncher`] built on `tokio::process::Command`.

pub mod environment;
pub mod launcher;

pub use environment::ExecutionEnvironment;
pub use launcher::{
    check_exit, render_invocation, ExecutionResult, LaunchRequest, Launcher, ProcessLauncher,
    ECHO_TARGET,
};
