// src/engine/mod.rs

//! Orchestration engine.
//!
//! This module ties together:
//! - the task graph and its per-run state
//! - the executor backend that runs one wave of handlers
//! - the run context that completed handlers feed
//! - the lifecycle events published while a run progresses
//!
//! The pure core state machine lives in [`core`]; the driver that feeds it
//! completions and dispatches waves is [`scheduler::Scheduler`].

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::context::{Context, TaskRecord};
use crate::dag::TaskRunState;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// The task whose output stopped a run, and the value it stopped with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Halt {
    pub task: TaskName,
    pub value: Value,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Seed plus every merged task result.
    pub context: Context,
    /// Final state of every task.
    pub states: BTreeMap<TaskName, TaskRunState>,
    /// Merged results in completion order.
    pub completed: Vec<TaskRecord>,
    /// Number of waves dispatched.
    pub waves: usize,
    pub halt: Option<Halt>,
}

impl RunOutcome {
    /// The run result: the halt value when halted, otherwise the context.
    pub fn result(&self) -> Value {
        match &self.halt {
            Some(halt) => halt.value.clone(),
            None => serde_json::to_value(&self.context).unwrap_or(Value::Null),
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halt.is_some()
    }

    pub fn state_of(&self, task: &str) -> Option<TaskRunState> {
        self.states.get(task).copied()
    }

    /// Whether the task's handler ran to completion and was merged.
    pub fn ran(&self, task: &str) -> bool {
        self.completed.iter().any(|r| r.task == task)
    }
}

pub mod core;
pub mod scheduler;
pub mod step;

pub use core::CoreRuntime;
pub use scheduler::Scheduler;
pub use step::{CoreCommand, CoreStep};
