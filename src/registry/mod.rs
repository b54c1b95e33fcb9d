// src/registry/mod.rs

//! Task registry.
//!
//! Registration is explicit and two-phase: first the program definitions
//! are enumerated (discovery plus `[program.*]` entries, see
//! [`definitions_from_config`]), then [`TaskRegistry::register_all`] derives
//! one task name per program and stores the tasks in a map. The
//! [`runner`] module invokes registered tasks.

pub mod runner;
pub mod task;

use std::collections::{BTreeMap, HashMap};

use regex::Regex;
use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::discover::{build_globset, discover, DiscoverySpec, ProgramIdentifier};
use crate::errors::{MpitasksError, Result};
use crate::fs::FileSystem;

pub use runner::TaskRunner;
pub use task::{ProgramDefinition, Task, TaskState};

/// Name → task map.
#[derive(Debug)]
pub struct TaskRegistry {
    task_prefix: String,
    tasks: BTreeMap<String, Task>,
}

impl TaskRegistry {
    pub fn new(task_prefix: impl Into<String>) -> Self {
        Self {
            task_prefix: task_prefix.into(),
            tasks: BTreeMap::new(),
        }
    }

    /// Derived task name: prefix plus the identifier without separators.
    pub fn task_name_for(&self, program: &ProgramIdentifier) -> String {
        format!("{}{}", self.task_prefix, program.collapsed())
    }

    /// Register one task per definition.
    ///
    /// All-or-nothing: if two definitions (or a definition and an already
    /// registered task) collapse to the same task name, nothing from this
    /// batch is registered and a configuration error is returned.
    pub fn register_all<I>(&mut self, definitions: I) -> Result<()>
    where
        I: IntoIterator<Item = ProgramDefinition>,
    {
        let mut batch: BTreeMap<String, ProgramDefinition> = BTreeMap::new();

        for def in definitions {
            let name = self.task_name_for(&def.program);
            if let Some(existing) = self.tasks.get(&name) {
                return Err(ambiguous(&name, existing.program(), &def.program));
            }
            if let Some(previous) = batch.get(&name) {
                return Err(ambiguous(&name, &previous.program, &def.program));
            }
            batch.insert(name, def);
        }

        for (name, def) in batch {
            debug!(task = %name, program = %def.program, np = def.options.process_count, "registered task");
            self.tasks.insert(name.clone(), Task::new(name, def));
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    /// Look up a task, failing with `TaskNotFound`.
    pub fn task(&self, name: &str) -> Result<&Task> {
        self.get(name)
            .ok_or_else(|| MpitasksError::TaskNotFound(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Enumerate and register every program of a validated config.
    pub fn from_config(cfg: &ConfigFile, fs: &dyn FileSystem) -> Result<Self> {
        let definitions = definitions_from_config(cfg, fs)?;
        let mut registry = Self::new(cfg.config.task_prefix.clone());
        registry.register_all(definitions)?;
        info!(tasks = registry.len(), "task registry ready");
        Ok(registry)
    }
}

fn ambiguous(name: &str, a: &ProgramIdentifier, b: &ProgramIdentifier) -> MpitasksError {
    MpitasksError::Configuration(format!(
        "ambiguous task name '{name}': both '{a}' and '{b}' map to it"
    ))
}

/// Discovery spec for the `[discover]` section, paths resolved.
pub fn discovery_spec(cfg: &ConfigFile) -> Result<Option<DiscoverySpec>> {
    let Some(d) = &cfg.discover else {
        return Ok(None);
    };

    let mut spec = DiscoverySpec::new(cfg.resolve(&d.root), d.extension.clone());
    if !d.exclude.is_empty() {
        let set = build_globset(&d.exclude)
            .map_err(|e| MpitasksError::Configuration(format!("[discover].exclude: {e:#}")))?;
        spec = spec.with_exclude(set);
    }
    if let Some(marker) = &d.entry_marker {
        let re = Regex::new(marker)
            .map_err(|e| MpitasksError::Configuration(format!("[discover].entry_marker: {e}")))?;
        spec = spec.with_entry_marker(re);
    }
    Ok(Some(spec))
}

/// Enumerate the programs of a config.
///
/// Discovered programs come first, in discovery order, followed by
/// `[program.*]` entries discovery did not find. A `[program.*]` entry for a
/// discovered identifier only overrides its options and arguments.
pub fn definitions_from_config(
    cfg: &ConfigFile,
    fs: &dyn FileSystem,
) -> Result<Vec<ProgramDefinition>> {
    let defaults = cfg.default_options();

    let mut statics: HashMap<ProgramIdentifier, &crate::config::ProgramConfig> = HashMap::new();
    let mut static_order = Vec::new();
    for (name, program) in cfg.program.iter() {
        let id = ProgramIdentifier::new(name.as_str())?;
        static_order.push(id.clone());
        statics.insert(id, program);
    }

    let mut definitions = Vec::new();

    if let Some(spec) = discovery_spec(cfg)? {
        for id in discover(fs, &spec)? {
            let id = id?;
            let def = match statics.remove(&id) {
                Some(program) => ProgramDefinition::new(id, program.effective_options(&defaults))
                    .with_args(program.args.clone()),
                None => ProgramDefinition::new(id, defaults.clone()),
            };
            definitions.push(def);
        }
        debug!(discovered = definitions.len(), root = ?spec.root, "discovery finished");
    }

    for id in static_order {
        if let Some(program) = statics.remove(&id) {
            definitions.push(
                ProgramDefinition::new(id, program.effective_options(&defaults))
                    .with_args(program.args.clone()),
            );
        }
    }

    Ok(definitions)
}
