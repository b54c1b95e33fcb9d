use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// How the launcher should pin ranks to hardware resources.
///
/// - `Unset`: no binding flags are emitted; the launcher uses its default.
/// - `None`: explicitly disable binding (`--bind-to none`).
/// - `To(target)`: bind to any other launcher-understood target, e.g. `core`
///   or `socket`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum BindPolicy {
    #[default]
    Unset,
    None,
    To(String),
}

impl BindPolicy {
    /// Value placed after the bind flag, or `None` if no flag should be emitted.
    pub fn launcher_value(&self) -> Option<&str> {
        match self {
            BindPolicy::Unset => None,
            BindPolicy::None => Some("none"),
            BindPolicy::To(target) => Some(target.as_str()),
        }
    }
}

impl FromStr for BindPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "" => Err("bind policy must not be empty (use \"unset\" to omit it)".to_string()),
            "unset" => Ok(BindPolicy::Unset),
            "none" => Ok(BindPolicy::None),
            _ if trimmed.chars().any(char::is_whitespace) => Err(format!(
                "invalid bind policy: {trimmed:?} (expected a single word such as \"none\" or \"core\")"
            )),
            _ => Ok(BindPolicy::To(trimmed.to_string())),
        }
    }
}

impl TryFrom<String> for BindPolicy {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for BindPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindPolicy::Unset => f.write_str("unset"),
            BindPolicy::None => f.write_str("none"),
            BindPolicy::To(target) => f.write_str(target),
        }
    }
}

/// Per-task launch parameters, fixed at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Number of ranks passed to the launcher (`-np`). Must be >= 1.
    pub process_count: u32,
    pub bind_policy: BindPolicy,
    /// Ask the launcher for a binding report and echo the full invocation.
    pub debug: bool,
    /// Treat a non-zero exit as success while still exposing the code.
    pub ignore_exit_value: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            process_count: 1,
            bind_policy: BindPolicy::Unset,
            debug: false,
            ignore_exit_value: false,
        }
    }
}

/// Invocation-time overrides layered over the registered [`LaunchOptions`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOverrides {
    pub process_count: Option<u32>,
    pub bind_policy: Option<BindPolicy>,
    pub debug: Option<bool>,
    pub ignore_exit_value: Option<bool>,
}

impl LaunchOverrides {
    pub fn is_empty(&self) -> bool {
        self == &LaunchOverrides::default()
    }

    /// Apply the overrides on top of `base`, returning the effective options.
    pub fn apply(&self, base: &LaunchOptions) -> LaunchOptions {
        LaunchOptions {
            process_count: self.process_count.unwrap_or(base.process_count),
            bind_policy: self
                .bind_policy
                .clone()
                .unwrap_or_else(|| base.bind_policy.clone()),
            debug: self.debug.unwrap_or(base.debug),
            ignore_exit_value: self.ignore_exit_value.unwrap_or(base.ignore_exit_value),
        }
    }
}
