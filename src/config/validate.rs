// src/config/validate.rs

use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::discover::{build_globset, ProgramIdentifier};
use crate::errors::{MpitasksError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = MpitasksError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

/// Check every invariant the rest of the crate relies on.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_programs(cfg)?;
    validate_global_config(cfg)?;
    validate_launcher_flags(cfg)?;
    validate_defaults(cfg)?;
    validate_discover(cfg)?;
    validate_compile(cfg)?;
    validate_env(cfg)?;
    validate_programs(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> MpitasksError {
    MpitasksError::Configuration(msg.into())
}

fn ensure_has_programs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.discover.is_none() && cfg.program.is_empty() {
        return Err(config_error(
            "config must contain a [discover] section or at least one [program.<name>] section",
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    let c = &cfg.config;

    if c.runtime.trim().is_empty() {
        return Err(config_error("[config].runtime must not be empty"));
    }
    if c.task_prefix.chars().any(|ch| !ch.is_alphanumeric() && ch != '_' && ch != '-') {
        return Err(config_error(format!(
            "[config].task_prefix '{}' may only contain letters, digits, '_' and '-'",
            c.task_prefix
        )));
    }
    if c.library_path_var.is_empty()
        || c.library_path_var.contains('=')
        || c.library_path_var.contains('\0')
    {
        return Err(config_error(format!(
            "[config].library_path_var '{}' is not a valid variable name",
            c.library_path_var
        )));
    }
    if !c.namespace_prefix.is_empty() {
        ProgramIdentifier::new(c.namespace_prefix.trim_end_matches(ProgramIdentifier::SEPARATOR))
            .map_err(|_| {
                config_error(format!(
                    "[config].namespace_prefix '{}' is not a dotted namespace",
                    c.namespace_prefix
                ))
            })?;
    }
    if c.classpath.iter().any(|entry| entry.trim().is_empty()) {
        return Err(config_error("[config].classpath entries must not be empty"));
    }
    if c.classpath.is_empty() && c.output_dir.as_os_str().is_empty() {
        return Err(config_error(
            "either [config].classpath or [config].output_dir must be set",
        ));
    }
    Ok(())
}

fn validate_launcher_flags(cfg: &RawConfigFile) -> Result<()> {
    let l = &cfg.launcher;
    for (name, value) in [
        ("np_flag", &l.np_flag),
        ("bind_flag", &l.bind_flag),
        ("report_bindings_flag", &l.report_bindings_flag),
        ("classpath_flag", &l.classpath_flag),
    ] {
        if value.trim().is_empty() {
            return Err(config_error(format!("[launcher].{name} must not be empty")));
        }
    }
    Ok(())
}

fn validate_defaults(cfg: &RawConfigFile) -> Result<()> {
    if cfg.default.np == 0 {
        return Err(config_error("[default].np must be >= 1 (got 0)"));
    }
    Ok(())
}

fn validate_discover(cfg: &RawConfigFile) -> Result<()> {
    let Some(discover) = &cfg.discover else {
        return Ok(());
    };

    if discover.root.as_os_str().is_empty() {
        return Err(config_error("[discover].root must not be empty"));
    }
    let ext = discover.extension.trim_start_matches('.');
    if ext.is_empty() || ext.contains('/') || ext.contains('\\') {
        return Err(config_error(format!(
            "[discover].extension '{}' is not a file extension",
            discover.extension
        )));
    }
    build_globset(&discover.exclude)
        .map_err(|e| config_error(format!("[discover].exclude: {e:#}")))?;
    if let Some(marker) = &discover.entry_marker {
        Regex::new(marker)
            .map_err(|e| config_error(format!("[discover].entry_marker: {e}")))?;
    }
    Ok(())
}

fn validate_compile(cfg: &RawConfigFile) -> Result<()> {
    if let Some(compile) = &cfg.compile {
        match compile.cmd.first() {
            Some(program) if !program.trim().is_empty() => {}
            _ => return Err(config_error("[compile].cmd must name a program")),
        }
    }
    Ok(())
}

fn validate_env(cfg: &RawConfigFile) -> Result<()> {
    for key in cfg.env.keys() {
        if key.is_empty() || key.contains('=') || key.contains('\0') {
            return Err(config_error(format!("[env] key '{key}' is not a valid variable name")));
        }
    }
    Ok(())
}

fn validate_programs(cfg: &RawConfigFile) -> Result<()> {
    for (name, program) in cfg.program.iter() {
        ProgramIdentifier::new(name.as_str())
            .map_err(|_| config_error(format!("[program.\"{name}\"] is not a valid identifier")))?;
        if program.np == Some(0) {
            return Err(config_error(format!(
                "[program.\"{name}\"].np must be >= 1 (got 0)"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::load_from_str;

    fn validate_str(toml: &str) -> Result<ConfigFile> {
        ConfigFile::try_from(load_from_str(toml)?)
    }

    #[test]
    fn accepts_minimal_static_program() {
        let cfg = validate_str("[program.Blocking]\nnp = 6\n").unwrap();
        assert_eq!(cfg.program["Blocking"].np, Some(6));
        assert_eq!(cfg.config.task_prefix, "run");
    }

    #[test]
    fn rejects_config_without_programs() {
        let err = validate_str("[default]\nnp = 2\n").unwrap_err();
        assert!(matches!(err, MpitasksError::Configuration(_)));
    }

    #[test]
    fn rejects_zero_process_count() {
        let err = validate_str("[default]\nnp = 0\n[program.A]\n").unwrap_err();
        assert!(err.to_string().contains("np must be >= 1"));

        let err = validate_str("[program.A]\nnp = 0\n").unwrap_err();
        assert!(err.to_string().contains("np must be >= 1"));
    }

    #[test]
    fn rejects_bad_glob_and_regex() {
        let err = validate_str("[discover]\nroot = \"src\"\nexclude = [\"[\"]\n").unwrap_err();
        assert!(err.to_string().contains("[discover].exclude"));

        let err = validate_str("[discover]\nroot = \"src\"\nentry_marker = \"(\"\n").unwrap_err();
        assert!(err.to_string().contains("[discover].entry_marker"));
    }

    #[test]
    fn rejects_invalid_bind_policy_at_parse_time() {
        let err = validate_str("[default]\nbind_to = \"to core\"\n[program.A]\n").unwrap_err();
        assert!(matches!(err, MpitasksError::TomlError(_)));
    }

    #[test]
    fn rejects_empty_compile_command() {
        let err = validate_str("[compile]\ncmd = []\n[program.A]\n").unwrap_err();
        assert!(err.to_string().contains("[compile].cmd"));
    }

    #[test]
    fn rejects_bad_program_identifier() {
        let err = validate_str("[program.\"a..b\"]\n").unwrap_err();
        assert!(matches!(err, MpitasksError::Configuration(_)));
    }
}
