// src/compile/mod.rs

//! The compile step every launch task depends on.
//!
//! The compiler itself is external: the gate only runs the configured argv
//! and remembers the fingerprint of the inputs it last compiled
//! successfully, so invoking several tasks in one process compiles once.

pub mod fingerprint;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::discover::{collect_sources, DiscoverySpec};
use crate::errors::{MpitasksError, Result};
use crate::exec::{ExecutionEnvironment, LaunchRequest, Launcher};
use crate::fs::FileSystem;
use crate::launch::LaunchCommand;

/// What the gate did for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileStatus {
    /// No `[compile]` command configured.
    NotConfigured,
    /// Inputs unchanged since the last successful compile.
    UpToDate,
    Compiled,
}

/// Runs the compile command when its inputs changed.
pub struct CompileGate {
    command: Option<LaunchCommand>,
    env: ExecutionEnvironment,
    fs: Arc<dyn FileSystem>,
    sources: Option<DiscoverySpec>,
    last_success: Mutex<Option<String>>,
}

impl std::fmt::Debug for CompileGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileGate")
            .field("command", &self.command)
            .field("sources", &self.sources.as_ref().map(|s| &s.root))
            .finish_non_exhaustive()
    }
}

impl CompileGate {
    /// A gate that always succeeds without running anything.
    pub fn disabled(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            command: None,
            env: ExecutionEnvironment::new(),
            fs,
            sources: None,
            last_success: Mutex::new(None),
        }
    }

    pub fn new(
        command: LaunchCommand,
        env: ExecutionEnvironment,
        fs: Arc<dyn FileSystem>,
        sources: Option<DiscoverySpec>,
    ) -> Self {
        Self {
            command: Some(command),
            env,
            fs,
            sources,
            last_success: Mutex::new(None),
        }
    }

    /// Gate for a validated config. Sources are the `[discover]` tree (all
    /// files with the extension, helpers included).
    pub fn from_config(cfg: &ConfigFile, fs: Arc<dyn FileSystem>, env: ExecutionEnvironment) -> Self {
        let command = cfg
            .compile
            .as_ref()
            .and_then(|c| LaunchCommand::from_argv(c.cmd.iter().cloned()));
        let Some(command) = command else {
            return Self::disabled(fs);
        };
        let sources = cfg
            .discover
            .as_ref()
            .map(|d| DiscoverySpec::new(cfg.resolve(&d.root), d.extension.clone()));
        Self::new(command, env, fs, sources)
    }

    pub fn is_configured(&self) -> bool {
        self.command.is_some()
    }

    /// Make sure the sources are compiled.
    ///
    /// Concurrent callers are serialised; the second one sees the first
    /// one's fingerprint and skips.
    pub async fn ensure_compiled(&self, launcher: &dyn Launcher) -> Result<CompileStatus> {
        let Some(command) = &self.command else {
            return Ok(CompileStatus::NotConfigured);
        };

        let mut last = self.last_success.lock().await;

        let sources = match &self.sources {
            Some(spec) => collect_sources(self.fs.as_ref(), spec)?,
            None => Vec::new(),
        };
        let fingerprint =
            fingerprint::compute_fingerprint(self.fs.as_ref(), command.tokens(), &sources)?;

        if last.as_deref() == Some(fingerprint.as_str()) {
            debug!(%fingerprint, "compile inputs unchanged; skipping");
            return Ok(CompileStatus::UpToDate);
        }

        info!(cmd = %command, sources = sources.len(), "running compile step");
        let request = LaunchRequest {
            task: "compile",
            command,
            env: &self.env,
            ignore_exit_value: true,
            echo: false,
        };
        let result = launcher.launch(request).await?;
        if !result.success() {
            return Err(MpitasksError::CompileFailure(result.exit_code));
        }

        *last = Some(fingerprint);
        Ok(CompileStatus::Compiled)
    }
}
