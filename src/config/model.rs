// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::{BindPolicy, LaunchOptions};

/// Top-level configuration as read from `Mpitasks.toml`.
///
/// ```toml
/// [config]
/// mpi_home = "libs/ompi"
/// classpath = ["build/classes/java/main", "libs/ompi/lib/mpi.jar"]
/// namespace_prefix = "jromp.mpi.examples"
///
/// [default]
/// np = 4
/// bind_to = "none"
///
/// [discover]
/// root = "src/main/java/jromp/mpi/examples"
/// exclude = ["Utils.java"]
///
/// [compile]
/// cmd = ["./gradlew", "classes"]
///
/// [program.Blocking]
/// np = 6
/// ```
///
/// All sections are optional; a file with neither `[discover]` nor any
/// `[program.*]` entry is rejected during validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Flag spellings of the rank-parallel launcher.
    #[serde(default)]
    pub launcher: LauncherSection,

    /// Launch options applied to every program unless overridden.
    #[serde(default)]
    pub default: DefaultSection,

    #[serde(default)]
    pub discover: Option<DiscoverSection>,

    #[serde(default)]
    pub compile: Option<CompileSection>,

    /// Extra environment variables layered over the library path variable.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Statically declared programs, keyed by dotted identifier.
    #[serde(default)]
    pub program: BTreeMap<String, ProgramConfig>,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// holders can rely on the invariants checked there. `root_dir` is the
/// directory relative paths are resolved against.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub launcher: LauncherSection,
    pub default: DefaultSection,
    pub discover: Option<DiscoverSection>,
    pub compile: Option<CompileSection>,
    pub env: BTreeMap<String, String>,
    pub program: BTreeMap<String, ProgramConfig>,
    root_dir: PathBuf,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            launcher: raw.launcher,
            default: raw.default,
            discover: raw.discover,
            compile: raw.compile,
            env: raw.env,
            program: raw.program,
            root_dir: PathBuf::from("."),
        }
    }

    /// Set the directory relative paths are resolved against.
    pub fn with_root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = root_dir.into();
        self
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Resolve a configured path against the project root.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_dir.join(path)
        }
    }

    /// Path of the rank-parallel launcher binary.
    pub fn launcher_path(&self) -> PathBuf {
        match &self.config.launcher {
            Some(launcher) => self.resolve(launcher),
            None => self.resolve(self.config.mpi_home.join("bin").join("mpirun")),
        }
    }

    /// Directory holding the native libraries of the MPI bindings.
    pub fn lib_dir(&self) -> PathBuf {
        match &self.config.lib_dir {
            Some(dir) => self.resolve(dir),
            None => self.resolve(self.config.mpi_home.join("lib")),
        }
    }

    /// Launch options from `[default]`.
    pub fn default_options(&self) -> LaunchOptions {
        LaunchOptions {
            process_count: self.default.np,
            bind_policy: self.default.bind_to.clone(),
            debug: self.default.debug,
            ignore_exit_value: self.default.ignore_exit_value,
        }
    }
}

/// `[config]` section: where the launcher lives and how programs are named.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Root of the MPI installation (`bin/mpirun`, `lib/`).
    #[serde(default = "default_mpi_home")]
    pub mpi_home: PathBuf,

    /// Explicit launcher path; overrides `<mpi_home>/bin/mpirun`.
    #[serde(default)]
    pub launcher: Option<PathBuf>,

    /// Explicit library directory; overrides `<mpi_home>/lib`.
    #[serde(default)]
    pub lib_dir: Option<PathBuf>,

    /// Runtime binary started by the launcher for every rank.
    #[serde(default = "default_runtime")]
    pub runtime: String,

    /// Extra arguments for the runtime, placed before the classpath flag.
    #[serde(default)]
    pub runtime_args: Vec<String>,

    /// Fully resolved classpath entries. Preferred over `output_dir` when
    /// non-empty.
    #[serde(default)]
    pub classpath: Vec<String>,

    /// Compiler output directory, used as classpath when `classpath` is empty.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Namespace prepended to every identifier to form the entry point.
    #[serde(default)]
    pub namespace_prefix: String,

    /// Prefix of generated task names (`run` → `runBlocking`).
    #[serde(default = "default_task_prefix")]
    pub task_prefix: String,

    /// Dynamic library search variable set to `lib_dir`.
    #[serde(default = "default_library_path_var")]
    pub library_path_var: String,
}

fn default_mpi_home() -> PathBuf {
    PathBuf::from("libs/ompi")
}

fn default_runtime() -> String {
    "java".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("build/classes/java/main")
}

fn default_task_prefix() -> String {
    "run".to_string()
}

fn default_library_path_var() -> String {
    "LD_LIBRARY_PATH".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            mpi_home: default_mpi_home(),
            launcher: None,
            lib_dir: None,
            runtime: default_runtime(),
            runtime_args: Vec::new(),
            classpath: Vec::new(),
            output_dir: default_output_dir(),
            namespace_prefix: String::new(),
            task_prefix: default_task_prefix(),
            library_path_var: default_library_path_var(),
        }
    }
}

/// `[launcher]` section: flag spellings, Open MPI's by default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LauncherSection {
    #[serde(default = "default_np_flag")]
    pub np_flag: String,
    #[serde(default = "default_bind_flag")]
    pub bind_flag: String,
    #[serde(default = "default_report_bindings_flag")]
    pub report_bindings_flag: String,
    #[serde(default = "default_classpath_flag")]
    pub classpath_flag: String,
    /// Extra launcher flags placed before the process count.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_np_flag() -> String {
    "-np".to_string()
}

fn default_bind_flag() -> String {
    "--bind-to".to_string()
}

fn default_report_bindings_flag() -> String {
    "--report-bindings".to_string()
}

fn default_classpath_flag() -> String {
    "-cp".to_string()
}

impl Default for LauncherSection {
    fn default() -> Self {
        Self {
            np_flag: default_np_flag(),
            bind_flag: default_bind_flag(),
            report_bindings_flag: default_report_bindings_flag(),
            classpath_flag: default_classpath_flag(),
            extra_args: Vec::new(),
        }
    }
}

/// `[default]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultSection {
    /// Process count (`-np`).
    #[serde(default = "default_np")]
    pub np: u32,

    /// `"unset"`, `"none"` or any other launcher binding target.
    #[serde(default)]
    pub bind_to: BindPolicy,

    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub ignore_exit_value: bool,
}

fn default_np() -> u32 {
    1
}

impl Default for DefaultSection {
    fn default() -> Self {
        Self {
            np: default_np(),
            bind_to: BindPolicy::Unset,
            debug: false,
            ignore_exit_value: false,
        }
    }
}

/// `[discover]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoverSection {
    /// Directory scanned for programs; its layout forms the identifiers.
    pub root: PathBuf,

    #[serde(default = "default_extension")]
    pub extension: String,

    /// Glob patterns relative to `root` that are never programs.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Regex a source file must match to count as runnable.
    #[serde(default)]
    pub entry_marker: Option<String>,
}

fn default_extension() -> String {
    "java".to_string()
}

/// `[compile]` section: the external step every task depends on.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompileSection {
    /// Program and arguments, run from the project root.
    pub cmd: Vec<String>,
}

/// `[program.<identifier>]` section.
///
/// Declares a program that discovery may not find (or overrides the options
/// of one it does).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ProgramConfig {
    #[serde(default)]
    pub np: Option<u32>,

    #[serde(default)]
    pub bind_to: Option<BindPolicy>,

    #[serde(default)]
    pub debug: Option<bool>,

    #[serde(default)]
    pub ignore_exit_value: Option<bool>,

    /// Arguments passed to the program after the entry point.
    #[serde(default)]
    pub args: Vec<String>,
}

impl ProgramConfig {
    /// Effective options given the `[default]` ones.
    pub fn effective_options(&self, defaults: &LaunchOptions) -> LaunchOptions {
        LaunchOptions {
            process_count: self.np.unwrap_or(defaults.process_count),
            bind_policy: self
                .bind_to
                .clone()
                .unwrap_or_else(|| defaults.bind_policy.clone()),
            debug: self.debug.unwrap_or(defaults.debug),
            ignore_exit_value: self.ignore_exit_value.unwrap_or(defaults.ignore_exit_value),
        }
    }
}
