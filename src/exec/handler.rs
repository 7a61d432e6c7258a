// src/exec/handler.rs

use std::collections::BTreeMap;

use serde_json::Value;

use crate::context::Context;
use crate::engine::TaskName;
use crate::events::EventContext;
use crate::memory::SharedMemory;

/// Everything a handler receives for one invocation.
#[derive(Debug, Clone)]
pub struct TaskInput {
    /// Name of the task being run.
    pub task: TaskName,
    /// Wave index (starting at 1).
    pub wave: usize,
    /// Results of every task completed before this wave, plus the seed.
    /// Siblings running in the same wave are not visible here.
    pub context: Context,
    /// The run's shared memory.
    pub memory: SharedMemory,
    /// Context forked from the run's root, scoped to this task.
    pub events: EventContext,
}

/// What a handler returns.
///
/// `value` is stored in the run context under the task's own name; `entries`
/// are merged in as additional keys. `activations` name optional tasks that
/// become eligible once this wave is merged, and `halt` stops the run after
/// the current wave.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskOutput {
    pub value: Value,
    pub entries: BTreeMap<String, Value>,
    pub activations: Vec<TaskName>,
    pub halt: Option<Value>,
}

impl TaskOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Mark an optional task eligible to run.
    pub fn activate(mut self, task: impl Into<TaskName>) -> Self {
        self.activations.push(task.into());
        self
    }

    /// Stop the run after the current wave; `value` becomes the run result.
    pub fn halt(mut self, value: impl Into<Value>) -> Self {
        self.halt = Some(value.into());
        self
    }

    pub fn is_halt(&self) -> bool {
        self.halt.is_some()
    }
}

/// A unit of work registered on a task graph.
///
/// Closures `Fn(TaskInput) -> anyhow::Result<TaskOutput>` implement this
/// trait directly. Handlers may block (e.g. on
/// [`SharedMemory::wait_for`]); an `Err` or a panic aborts the run.
pub trait TaskHandler: Send + Sync + 'static {
    fn call(&self, input: TaskInput) -> anyhow::Result<TaskOutput>;
}

impl<F> TaskHandler for F
where
    F: Fn(TaskInput) -> anyhow::Result<TaskOutput> + Send + Sync + 'static,
{
    fn call(&self, input: TaskInput) -> anyhow::Result<TaskOutput> {
        self(input)
    }
}
