// src/config/mod.rs

//! Configuration loading and validation for mpitasks.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate invariants such as process counts and patterns (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_from_str};
pub use model::{
    CompileSection, ConfigFile, ConfigSection, DefaultSection, DiscoverSection,
    LauncherSection, ProgramConfig, RawConfigFile,
};
pub use validate::validate_config;
