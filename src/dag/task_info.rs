// src/dag/task_info.rs

//! Per-run task state and scheduled task types.

use serde::Serialize;

use crate::dag::DependsOn;
use crate::engine::TaskName;

/// Where a task stands within one run.
///
/// `Pending -> Running -> Completed` is the normal path. A task that never
/// became ready ends as `Skipped`; the task whose output stopped the run ends
/// as `Halted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskRunState {
    Pending,
    Running,
    Completed,
    Skipped,
    Halted,
}

impl TaskRunState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskRunState::Completed | TaskRunState::Skipped | TaskRunState::Halted
        )
    }
}

/// Static task information plus its state in the current run.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: TaskName,
    pub depends_on: DependsOn,
    pub state: TaskRunState,
    /// Wave in which the task was dispatched, if it was.
    pub wave: Option<usize>,
}

impl TaskInfo {
    pub fn new(name: TaskName, depends_on: DependsOn) -> Self {
        Self {
            name,
            depends_on,
            state: TaskRunState::Pending,
            wave: None,
        }
    }
}

/// A task the scheduler wants the executor to run now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub name: TaskName,
    /// Wave index, starting at 1.
    pub wave: usize,
}
