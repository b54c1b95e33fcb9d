// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Default config file name, looked up in the current working directory.
pub const DEFAULT_CONFIG_FILE: &str = "Mpitasks.toml";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    load_from_str(&contents)
}

/// Parse a configuration from TOML text.
pub fn load_from_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// Relative paths inside the file are resolved against the directory that
/// contains it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let config = ConfigFile::try_from(raw_config)?.with_root_dir(config_root_dir(path)?);
    Ok(config)
}

/// Figure out the project root for a config path.
///
/// - If the config path has a non-empty parent (e.g. "demo/Mpitasks.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Mpitasks.toml" (parent = ""),
///   we fall back to the current working directory.
///
/// The result is always absolute: children are spawned with the root as
/// their working directory, so a relative root would be applied twice.
pub fn config_root_dir(config_path: &Path) -> Result<PathBuf> {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(std::path::absolute(parent)?),
        _ => Ok(std::env::current_dir()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_dir_is_parent_of_config() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(
            config_root_dir(Path::new("demo/Mpitasks.toml")).unwrap(),
            cwd.join("demo")
        );
        assert_eq!(config_root_dir(Path::new("Mpitasks.toml")).unwrap(), cwd);
        let absolute = cwd.join("proj").join("Mpitasks.toml");
        assert_eq!(config_root_dir(&absolute).unwrap(), cwd.join("proj"));
    }
}
