// src/exec/environment.rs

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::ConfigFile;
use crate::launch::command::shell_quote;

/// Variables overlaid on the inherited environment of a launched process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionEnvironment {
    vars: BTreeMap<String, String>,
}

impl ExecutionEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment with only the dynamic library search variable set.
    pub fn with_library_path(var: impl Into<String>, lib_dir: &Path) -> Self {
        let mut env = Self::new();
        env.set(var, lib_dir.to_string_lossy());
        env
    }

    /// Library path from the config plus its `[env]` table on top.
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let mut env = Self::with_library_path(cfg.config.library_path_var.clone(), &cfg.lib_dir());
        for (key, value) in &cfg.env {
            env.set(key.clone(), value.clone());
        }
        env
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `KEY=value` pairs, sorted by key and shell-quoted.
    pub fn render(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{k}={}", shell_quote(v)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_values_replace_earlier_ones() {
        let mut env = ExecutionEnvironment::with_library_path("LD_LIBRARY_PATH", Path::new("/ompi/lib"));
        env.set("OMPI_MCA_rmaps_base_oversubscribe", "1");
        env.set("LD_LIBRARY_PATH", "/other/lib");

        assert_eq!(env.get("LD_LIBRARY_PATH"), Some("/other/lib"));
        assert_eq!(
            env.render(),
            "LD_LIBRARY_PATH=/other/lib OMPI_MCA_rmaps_base_oversubscribe=1"
        );
    }
}
