// src/errors.rs

//! Crate-wide error type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MpitasksError {
    /// The discovery root is missing or cannot be listed.
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Invalid options, empty classpath, ambiguous task names, bad config values.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The launched program exited non-zero and failures were not ignored.
    #[error("Task '{task}' failed with exit code {code}")]
    LaunchFailure { task: String, code: i32 },

    /// The launcher binary could not be found or executed.
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The compile dependency exited non-zero.
    #[error("Compile step failed with exit code {0}")]
    CompileFailure(i32),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MpitasksError {
    /// Exit code carried by a launch failure, if this is one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            MpitasksError::LaunchFailure { code, .. } => Some(*code),
            MpitasksError::CompileFailure(code) => Some(*code),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, MpitasksError>;
