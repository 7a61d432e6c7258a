// src/dag/state_manager.rs

//! Per-run state transitions for tasks.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::dag::task_info::{ScheduledTask, TaskInfo, TaskRunState};
use crate::dag::DependsOn;
use crate::engine::TaskName;

/// Mutable view over the task table of one run.
pub struct StateManager<'a> {
    tasks: &'a mut BTreeMap<TaskName, TaskInfo>,
}

impl<'a> StateManager<'a> {
    pub fn new(tasks: &'a mut BTreeMap<TaskName, TaskInfo>) -> Self {
        Self { tasks }
    }

    /// Whether a pending task may be dispatched, given what has completed
    /// and which optional tasks were activated so far.
    pub fn is_ready(&self, info: &TaskInfo, activated: &BTreeSet<TaskName>) -> bool {
        if info.state != TaskRunState::Pending {
            return false;
        }
        match &info.depends_on {
            DependsOn::None => true,
            DependsOn::Required(deps) => deps.iter().all(|dep| {
                self.tasks
                    .get(dep)
                    .is_some_and(|d| d.state == TaskRunState::Completed)
            }),
            DependsOn::Optional => activated.contains(&info.name),
        }
    }

    /// Collect every ready task, mark it `Running` for `wave`, and return
    /// them in name order.
    pub fn collect_ready(
        &mut self,
        activated: &BTreeSet<TaskName>,
        wave: usize,
    ) -> Vec<ScheduledTask> {
        // Decide first, then mutate to avoid borrowing issues.
        let candidates: Vec<TaskName> = self
            .tasks
            .values()
            .filter(|info| self.is_ready(info, activated))
            .map(|info| info.name.clone())
            .collect();

        let mut ready = Vec::with_capacity(candidates.len());
        for name in candidates {
            if let Some(info) = self.tasks.get_mut(&name) {
                debug!(task = %name, wave, "dependencies satisfied; marking Running");
                info.state = TaskRunState::Running;
                info.wave = Some(wave);
                ready.push(ScheduledTask { name, wave });
            }
        }
        ready
    }

    pub fn set_state(&mut self, task: &str, state: TaskRunState) {
        if let Some(info) = self.tasks.get_mut(task) {
            info.state = state;
        }
    }

    /// Mark every task that has not finished as `Skipped`, returning their
    /// names.
    pub fn skip_remaining(&mut self) -> Vec<TaskName> {
        let mut skipped = Vec::new();
        for info in self.tasks.values_mut() {
            if !info.state.is_terminal() {
                debug!(task = %info.name, "task did not run; marking Skipped");
                info.state = TaskRunState::Skipped;
                skipped.push(info.name.clone());
            }
        }
        skipped
    }
}
