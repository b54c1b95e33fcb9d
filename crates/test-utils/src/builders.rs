use std::collections::BTreeMap;
use std::path::Path;

use mpitasks::config::{
    CompileSection, ConfigFile, ConfigSection, DefaultSection, DiscoverSection, LauncherSection,
    ProgramConfig, RawConfigFile,
};
use mpitasks::types::BindPolicy;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                launcher: LauncherSection::default(),
                default: DefaultSection::default(),
                discover: None,
                compile: None,
                env: BTreeMap::new(),
                program: BTreeMap::new(),
            },
        }
    }

    pub fn with_program(mut self, id: &str, program: ProgramConfig) -> Self {
        self.config.program.insert(id.to_string(), program);
        self
    }

    pub fn discover(mut self, root: impl AsRef<Path>, extension: &str) -> Self {
        self.config.discover = Some(DiscoverSection {
            root: root.as_ref().to_path_buf(),
            extension: extension.to_string(),
            exclude: Vec::new(),
            entry_marker: None,
        });
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        if let Some(d) = self.config.discover.as_mut() {
            d.exclude.push(pattern.to_string());
        }
        self
    }

    pub fn entry_marker(mut self, regex: &str) -> Self {
        if let Some(d) = self.config.discover.as_mut() {
            d.entry_marker = Some(regex.to_string());
        }
        self
    }

    pub fn launcher(mut self, path: impl AsRef<Path>) -> Self {
        self.config.config.launcher = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn lib_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.config.config.lib_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn classpath(mut self, entry: &str) -> Self {
        self.config.config.classpath.push(entry.to_string());
        self
    }

    pub fn namespace_prefix(mut self, prefix: &str) -> Self {
        self.config.config.namespace_prefix = prefix.to_string();
        self
    }

    pub fn task_prefix(mut self, prefix: &str) -> Self {
        self.config.config.task_prefix = prefix.to_string();
        self
    }

    pub fn default_np(mut self, np: u32) -> Self {
        self.config.default.np = np;
        self
    }

    pub fn default_bind_to(mut self, policy: BindPolicy) -> Self {
        self.config.default.bind_to = policy;
        self
    }

    pub fn compile_cmd(mut self, argv: &[&str]) -> Self {
        self.config.compile = Some(CompileSection {
            cmd: argv.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.config.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Raw config, for tests that exercise validation themselves.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    /// Validated config with relative paths resolved against `root`.
    pub fn build_in(self, root: impl AsRef<Path>) -> ConfigFile {
        self.build().with_root_dir(root.as_ref())
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ProgramConfig`.
#[derive(Default)]
pub struct ProgramConfigBuilder {
    program: ProgramConfig,
}

impl ProgramConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn np(mut self, np: u32) -> Self {
        self.program.np = Some(np);
        self
    }

    pub fn bind_to(mut self, policy: BindPolicy) -> Self {
        self.program.bind_to = Some(policy);
        self
    }

    pub fn debug(mut self, val: bool) -> Self {
        self.program.debug = Some(val);
        self
    }

    pub fn ignore_exit_value(mut self, val: bool) -> Self {
        self.program.ignore_exit_value = Some(val);
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.program.args.push(arg.to_string());
        self
    }

    pub fn build(self) -> ProgramConfig {
        self.program
    }
}
