// src/engine/core.rs

//! Pure core run state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" for one
//! run. It consumes wave completions and produces:
//! - an updated run state (context, activations, per-task states)
//! - a list of commands describing what the driver should do next
//!
//! The driver ([`crate::engine::Scheduler`]) is responsible for:
//! - preparing handler inputs and sending waves to an executor backend
//! - publishing lifecycle events
//!
//! The core is intended to be extensively unit tested without threads,
//! runtimes, or handlers.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::context::{Context, TaskRecord};
use crate::dag::state_manager::StateManager;
use crate::dag::{ScheduledTask, TaskGraph, TaskInfo, TaskRunState};
use crate::engine::step::{CoreCommand, CoreStep};
use crate::engine::{Halt, RunOutcome, TaskName};
use crate::errors::{FlowError, Result};
use crate::exec::{Completion, TaskOutput};

/// State shared by every wave of one run.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub context: Context,
    /// Optional tasks activated so far.
    pub activated: BTreeSet<TaskName>,
    pub halt: Option<Halt>,
}

impl RunState {
    pub fn is_halted(&self) -> bool {
        self.halt.is_some()
    }
}

/// Pure per-run state.
///
/// It has **no** threads, no Tokio types, and never calls a handler.
#[derive(Debug)]
pub struct CoreRuntime<'g> {
    graph: &'g TaskGraph,
    tasks: BTreeMap<TaskName, TaskInfo>,
    run: RunState,
    wave: usize,
    in_flight: Vec<ScheduledTask>,
    completed: Vec<TaskRecord>,
}

impl<'g> CoreRuntime<'g> {
    pub fn new(graph: &'g TaskGraph, initial: Context) -> Self {
        let tasks = graph
            .nodes()
            .map(|n| (n.name.clone(), TaskInfo::new(n.name.clone(), n.depends_on.clone())))
            .collect();

        Self {
            graph,
            tasks,
            run: RunState {
                context: initial,
                ..RunState::default()
            },
            wave: 0,
            in_flight: Vec::new(),
            completed: Vec::new(),
        }
    }

    pub fn context(&self) -> &Context {
        &self.run.context
    }

    pub fn run_state(&self) -> &RunState {
        &self.run
    }

    pub fn state_of(&self, task: &str) -> Option<TaskRunState> {
        self.tasks.get(task).map(|info| info.state)
    }

    pub fn wave(&self) -> usize {
        self.wave
    }

    /// Schedule the first wave: every task without dependencies.
    pub fn start(&mut self) -> CoreStep {
        info!(tasks = self.tasks.len(), "starting run");
        self.schedule_next(Vec::new())
    }

    /// Merge the completions of the wave in flight and schedule the next one.
    ///
    /// - Any failed completion aborts the run with
    ///   [`FlowError::Execution`], even if another task halted.
    /// - Otherwise the first halting completion (in dispatch order) stops
    ///   the run; no result of this wave is merged.
    /// - Otherwise every output is merged in dispatch order and its
    ///   activations are recorded.
    pub fn apply_wave(&mut self, completions: Vec<Completion>) -> Result<CoreStep> {
        let in_flight = std::mem::take(&mut self.in_flight);
        let mut commands = Vec::new();

        let mut outputs: Vec<(TaskName, usize, TaskOutput)> = Vec::with_capacity(completions.len());
        for completion in completions {
            match completion.result {
                Ok(output) => outputs.push((completion.task, completion.wave, output)),
                Err(err) => {
                    warn!(task = %completion.task, wave = completion.wave, "aborting run after handler failure");
                    return Err(FlowError::execution(completion.task, err));
                }
            }
        }

        // Tasks the executor never started.
        for scheduled in &in_flight {
            if !outputs.iter().any(|(name, _, _)| name == &scheduled.name) {
                debug!(task = %scheduled.name, "task was not started in this wave");
                StateManager::new(&mut self.tasks).set_state(&scheduled.name, TaskRunState::Skipped);
                commands.push(CoreCommand::Skipped(scheduled.name.clone()));
            }
        }

        if let Some(index) = outputs.iter().position(|(_, _, out)| out.is_halt()) {
            let mut manager = StateManager::new(&mut self.tasks);
            for (i, (name, _, _)) in outputs.iter().enumerate() {
                let state = if i == index {
                    TaskRunState::Halted
                } else {
                    TaskRunState::Completed
                };
                manager.set_state(name, state);
            }

            let (task, _, output) = outputs.swap_remove(index);
            let halt = Halt {
                task,
                value: output.halt.unwrap_or_default(),
            };
            info!(task = %halt.task, wave = self.wave, "run halted; discarding wave results");
            commands.push(CoreCommand::Halted(halt.clone()));
            self.run.halt = Some(halt);
            return Ok(self.schedule_next(commands));
        }

        for (task, wave, output) in outputs {
            self.merge_output(task, wave, output, &mut commands);
        }

        Ok(self.schedule_next(commands))
    }

    /// Consume the core and produce the run's outcome.
    pub fn finish(self) -> RunOutcome {
        RunOutcome {
            states: self
                .tasks
                .into_iter()
                .map(|(name, info)| (name, info.state))
                .collect(),
            context: self.run.context,
            completed: self.completed,
            waves: self.wave,
            halt: self.run.halt,
        }
    }

    fn merge_output(
        &mut self,
        task: TaskName,
        wave: usize,
        output: TaskOutput,
        commands: &mut Vec<CoreCommand>,
    ) {
        let TaskOutput {
            value,
            entries,
            activations,
            ..
        } = output;

        StateManager::new(&mut self.tasks).set_state(&task, TaskRunState::Completed);
        self.run.context.set(task.clone(), value.clone());
        self.run.context.extend(entries);

        for name in activations {
            match self.graph.depends_on(&name) {
                None => {
                    warn!(task = %task, activation = %name, "activation names an unknown task; ignoring");
                }
                Some(dep) if !dep.is_optional() => {
                    debug!(task = %task, activation = %name, "activation of a non-optional task; ignoring");
                }
                Some(_) => {
                    if self.run.activated.insert(name.clone()) {
                        debug!(task = %task, activation = %name, "optional task activated");
                        commands.push(CoreCommand::Activated {
                            task: name,
                            by: task.clone(),
                        });
                    }
                }
            }
        }

        self.completed.push(TaskRecord { task, value, wave });
    }

    fn schedule_next(&mut self, mut commands: Vec<CoreCommand>) -> CoreStep {
        let mut manager = StateManager::new(&mut self.tasks);

        if !self.run.is_halted() {
            let ready = manager.collect_ready(&self.run.activated, self.wave + 1);
            if !ready.is_empty() {
                self.wave += 1;
                debug!(wave = self.wave, tasks = ready.len(), "scheduling wave");
                self.in_flight = ready.clone();
                commands.push(CoreCommand::DispatchWave(ready));
                return CoreStep {
                    commands,
                    keep_running: true,
                };
            }
        }

        for name in manager.skip_remaining() {
            commands.push(CoreCommand::Skipped(name));
        }
        info!(waves = self.wave, halted = self.run.is_halted(), "run finished");
        commands.push(CoreCommand::Finish);

        CoreStep {
            commands,
            keep_running: false,
        }
    }
}
