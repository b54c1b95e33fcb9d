// src/launch/builder.rs

//! Launch command assembly.
//!
//! Token grammar, in order:
//!
//! ```text
//! <launcher> [<bind_flag> <policy>] [<report_bindings_flag>] <extra launcher args>
//!     <np_flag> <N> <runtime> <runtime args> <classpath_flag> <classpath>
//!     <entry point> <program args>
//! ```
//!
//! Everything here is pure: no filesystem or process access.

use std::path::PathBuf;

use crate::config::ConfigFile;
use crate::discover::ProgramIdentifier;
use crate::errors::{MpitasksError, Result};
use crate::launch::command::LaunchCommand;
use crate::types::LaunchOptions;

/// Flag spellings understood by the rank-parallel launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherFlags {
    pub np: String,
    pub bind_to: String,
    pub report_bindings: String,
    pub classpath: String,
}

impl Default for LauncherFlags {
    fn default() -> Self {
        Self {
            np: "-np".to_string(),
            bind_to: "--bind-to".to_string(),
            report_bindings: "--report-bindings".to_string(),
            classpath: "-cp".to_string(),
        }
    }
}

/// Everything the builder needs besides the program and its options.
#[derive(Debug, Clone)]
pub struct LaunchContext {
    pub launcher: PathBuf,
    pub runtime: String,
    pub runtime_args: Vec<String>,
    pub launcher_args: Vec<String>,
    /// Resolved classpath entries; preferred when non-empty.
    pub classpath: Vec<String>,
    /// Compiler output directory used when `classpath` is empty.
    pub output_dir: PathBuf,
    pub namespace_prefix: String,
    pub flags: LauncherFlags,
}

impl LaunchContext {
    /// Minimal context; everything else takes its default.
    pub fn new(launcher: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            launcher: launcher.into(),
            runtime: "java".to_string(),
            runtime_args: Vec::new(),
            launcher_args: Vec::new(),
            classpath: Vec::new(),
            output_dir: output_dir.into(),
            namespace_prefix: String::new(),
            flags: LauncherFlags::default(),
        }
    }

    /// Context for a validated config, with paths resolved against its root.
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let c = &cfg.config;
        let l = &cfg.launcher;
        Self {
            launcher: cfg.launcher_path(),
            runtime: c.runtime.clone(),
            runtime_args: c.runtime_args.clone(),
            launcher_args: l.extra_args.clone(),
            classpath: c
                .classpath
                .iter()
                .map(|entry| cfg.resolve(entry).to_string_lossy().into_owned())
                .collect(),
            output_dir: cfg.resolve(&c.output_dir),
            namespace_prefix: c.namespace_prefix.clone(),
            flags: LauncherFlags {
                np: l.np_flag.clone(),
                bind_to: l.bind_flag.clone(),
                report_bindings: l.report_bindings_flag.clone(),
                classpath: l.classpath_flag.clone(),
            },
        }
    }

    pub fn with_classpath<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classpath = entries.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_namespace_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.namespace_prefix = prefix.into();
        self
    }

    /// Classpath value placed after the classpath flag.
    pub fn classpath_value(&self) -> String {
        if self.classpath.is_empty() {
            self.output_dir.to_string_lossy().into_owned()
        } else {
            let sep = if cfg!(windows) { ";" } else { ":" };
            self.classpath.join(sep)
        }
    }
}

/// Turns a program identifier plus options into a [`LaunchCommand`].
#[derive(Debug, Clone)]
pub struct LaunchSpecBuilder {
    ctx: LaunchContext,
}

impl LaunchSpecBuilder {
    pub fn new(ctx: LaunchContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &LaunchContext {
        &self.ctx
    }

    /// Build the command for `program`.
    ///
    /// Fails with a configuration error if `process_count` is zero or the
    /// classpath value is empty.
    pub fn build(
        &self,
        program: &ProgramIdentifier,
        options: &LaunchOptions,
        program_args: &[String],
    ) -> Result<LaunchCommand> {
        if options.process_count < 1 {
            return Err(MpitasksError::Configuration(format!(
                "process count for '{program}' must be >= 1 (got {})",
                options.process_count
            )));
        }
        let classpath = self.ctx.classpath_value();
        if classpath.trim().is_empty() {
            return Err(MpitasksError::Configuration(format!(
                "classpath for '{program}' is empty"
            )));
        }

        let flags = &self.ctx.flags;
        let mut tokens: Vec<String> = Vec::with_capacity(12 + program_args.len());

        tokens.push(self.ctx.launcher.to_string_lossy().into_owned());

        if let Some(policy) = options.bind_policy.launcher_value() {
            tokens.push(flags.bind_to.clone());
            tokens.push(policy.to_string());
        }
        if options.debug {
            tokens.push(flags.report_bindings.clone());
        }
        tokens.extend(self.ctx.launcher_args.iter().cloned());

        tokens.push(flags.np.clone());
        tokens.push(options.process_count.to_string());

        tokens.push(self.ctx.runtime.clone());
        tokens.extend(self.ctx.runtime_args.iter().cloned());
        tokens.push(flags.classpath.clone());
        tokens.push(classpath);
        tokens.push(program.qualified(&self.ctx.namespace_prefix));

        tokens.extend(program_args.iter().cloned());

        Ok(LaunchCommand::from_tokens(tokens))
    }
}
