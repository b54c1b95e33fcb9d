// src/registry/task.rs

//! Registered tasks and their run state.

use std::sync::{Mutex, MutexGuard};

use crate::discover::ProgramIdentifier;
use crate::types::LaunchOptions;

/// Life cycle of a task.
///
/// `Registered → Running → Succeeded | Failed`. A failed compile step moves a
/// task straight to `Failed` without passing through `Running`. A task can be
/// invoked again from any terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Registered,
    Running,
    Succeeded,
    Failed,
}

/// A program to register, before its task name is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramDefinition {
    pub program: ProgramIdentifier,
    pub options: LaunchOptions,
    /// Arguments passed to the program after its entry point.
    pub args: Vec<String>,
}

impl ProgramDefinition {
    pub fn new(program: ProgramIdentifier, options: LaunchOptions) -> Self {
        Self {
            program,
            options,
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

/// One addressable launch task.
#[derive(Debug)]
pub struct Task {
    name: String,
    definition: ProgramDefinition,
    state: Mutex<TaskState>,
}

impl Task {
    pub(crate) fn new(name: String, definition: ProgramDefinition) -> Self {
        Self {
            name,
            definition,
            state: Mutex::new(TaskState::Registered),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> &ProgramIdentifier {
        &self.definition.program
    }

    pub fn options(&self) -> &LaunchOptions {
        &self.definition.options
    }

    pub fn args(&self) -> &[String] {
        &self.definition.args
    }

    pub fn state(&self) -> TaskState {
        *self.lock_state()
    }

    pub(crate) fn set_state(&self, state: TaskState) {
        *self.lock_state() = state;
    }

    fn lock_state(&self) -> MutexGuard<'_, TaskState> {
        // The state is a plain Copy value; a poisoned lock still holds a valid one.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
