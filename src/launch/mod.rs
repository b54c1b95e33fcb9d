// src/launch/mod.rs

//! Launch command construction.
//!
//! - [`command`] holds the [`LaunchCommand`] token sequence.
//! - [`builder`] turns a program identifier and its options into one.

pub mod builder;
pub mod command;

pub use builder::{LaunchContext, LaunchSpecBuilder, LauncherFlags};
pub use command::LaunchCommand;
