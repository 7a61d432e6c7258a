// src/engine/step.rs

//! Commands produced by the core for the driver.

use crate::dag::ScheduledTask;
use crate::engine::{Halt, TaskName};

/// Command produced by the pure core, to be executed by the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreCommand {
    /// Run these tasks as the next wave.
    DispatchWave(Vec<ScheduledTask>),
    /// An optional task became eligible because of `by`'s output.
    Activated { task: TaskName, by: TaskName },
    /// A task will not run in this run.
    Skipped(TaskName),
    /// A task's output stopped the run.
    Halted(Halt),
    /// Nothing is ready or running; the run is over.
    Finish,
}

/// Decision returned by the core after starting a run or merging a wave.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the driver should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the driver should keep dispatching.
    pub keep_running: bool,
}

impl CoreStep {
    /// The wave to dispatch next, if any.
    pub fn next_wave(&self) -> Option<&[ScheduledTask]> {
        self.commands.iter().find_map(|c| match c {
            CoreCommand::DispatchWave(tasks) => Some(tasks.as_slice()),
            _ => None,
        })
    }
}
