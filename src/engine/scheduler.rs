// src/engine/scheduler.rs

use std::fmt;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use crate::config::{FlowConfig, SchedulerConfig};
use crate::context::Context;
use crate::dag::{ScheduledTask, TaskGraph};
use crate::engine::core::CoreRuntime;
use crate::engine::step::{CoreCommand, CoreStep};
use crate::engine::RunOutcome;
use crate::errors::{FlowError, Result};
use crate::events::{EventContext, EventSink, EventType};
use crate::exec::{
    async_rt, AsyncExecutor, Dispatch, ExecutorBackend, SerialExecutor, TaskInput,
    ThreadPoolExecutor,
};
use crate::memory::SharedMemory;
use crate::types::ConcurrencyMode;

/// Runs a [`TaskGraph`] wave by wave.
///
/// This is the IO shell around [`CoreRuntime`], which contains all the run
/// semantics. The scheduler prepares handler inputs, hands each wave to an
/// [`ExecutorBackend`] and publishes lifecycle events on its root
/// [`EventContext`]. Every handler receives a child context scoped to its
/// task name.
///
/// A scheduler can be run any number of times; each run starts from the
/// context it is given. The shared memory is not cleared between runs.
pub struct Scheduler {
    graph: TaskGraph,
    config: SchedulerConfig,
    memory: SharedMemory,
    events: EventContext,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("tasks", &self.graph.len())
            .field("config", &self.config)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Scheduler with default settings, a fresh shared memory and no event
    /// sink.
    pub fn new(graph: TaskGraph) -> Self {
        Self {
            graph,
            config: SchedulerConfig::default(),
            memory: SharedMemory::new(),
            events: EventContext::detached(),
        }
    }

    /// Scheduler wired from a validated [`FlowConfig`].
    pub fn from_config(graph: TaskGraph, config: &FlowConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            graph,
            config: config.scheduler.clone(),
            memory: SharedMemory::with_config(config.memory.clone()),
            events: EventContext::with_config(sink, &config.events),
        }
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_mode(mut self, mode: ConcurrencyMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn with_memory(mut self, memory: SharedMemory) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_events(mut self, events: EventContext) -> Self {
        self.events = events;
        self
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn mode(&self) -> ConcurrencyMode {
        self.config.mode
    }

    pub fn memory(&self) -> &SharedMemory {
        &self.memory
    }

    pub fn events(&self) -> &EventContext {
        &self.events
    }

    /// Run the graph to completion using the backend for the configured mode.
    ///
    /// In [`ConcurrencyMode::Async`] this builds its own current-thread
    /// runtime, so it must not be called from inside a Tokio runtime; use
    /// [`run_async`](Self::run_async) there.
    pub fn run(&self, initial: Context) -> Result<RunOutcome> {
        match self.config.mode {
            ConcurrencyMode::Serial => self.run_with(&mut SerialExecutor::new(), initial),
            ConcurrencyMode::Threads => {
                let mut executor = ThreadPoolExecutor::new(self.config.max_workers)?;
                self.run_with(&mut executor, initial)
            }
            ConcurrencyMode::Async => {
                let mut executor = AsyncExecutor::new()?;
                self.run_with(&mut executor, initial)
            }
        }
    }

    /// Run the graph on a caller-supplied backend.
    pub fn run_with<E>(&self, executor: &mut E, initial: Context) -> Result<RunOutcome>
    where
        E: ExecutorBackend + ?Sized,
    {
        let mut core = CoreRuntime::new(&self.graph, initial);
        self.publish_run_started(executor.name());

        let mut step = core.start();
        while let Some(tasks) = self.execute_commands(step) {
            let dispatches = self.prepare_wave(&core, tasks);
            let completions = executor.run_wave(dispatches);
            step = core
                .apply_wave(completions)
                .map_err(|err| self.abort_run(err))?;
        }

        Ok(self.finish_run(core))
    }

    /// Run the graph on the ambient Tokio runtime.
    ///
    /// Handlers run on Tokio's blocking pool, so they may block on shared
    /// memory without stalling the runtime.
    pub async fn run_async(&self, initial: Context) -> Result<RunOutcome> {
        let mut core = CoreRuntime::new(&self.graph, initial);
        self.publish_run_started("async");

        let mut step = core.start();
        while let Some(tasks) = self.execute_commands(step) {
            let dispatches = self.prepare_wave(&core, tasks);
            let completions = async_rt::run_wave(dispatches).await;
            step = core
                .apply_wave(completions)
                .map_err(|err| self.abort_run(err))?;
        }

        Ok(self.finish_run(core))
    }

    /// Publish events for the core's commands and return the wave to
    /// dispatch, if any.
    fn execute_commands(&self, step: CoreStep) -> Option<Vec<ScheduledTask>> {
        let mut next = None;

        for command in step.commands {
            match command {
                CoreCommand::DispatchWave(tasks) => {
                    let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
                    debug!(?names, "dispatching wave");
                    next = Some(tasks);
                }
                CoreCommand::Activated { task, by } => {
                    self.events.publish(
                        EventType::TaskActivated,
                        json!({ "task": task, "by": by }),
                    );
                }
                CoreCommand::Skipped(task) => {
                    self.events
                        .publish(EventType::TaskSkipped, json!({ "task": task }));
                }
                CoreCommand::Halted(halt) => {
                    self.events.publish(
                        EventType::RunHalted,
                        json!({ "task": halt.task, "value": halt.value }),
                    );
                }
                CoreCommand::Finish => {}
            }
        }

        if step.keep_running { next } else { None }
    }

    fn prepare_wave(&self, core: &CoreRuntime<'_>, tasks: Vec<ScheduledTask>) -> Vec<Dispatch> {
        tasks
            .into_iter()
            .filter_map(|scheduled| {
                let node = self.graph.node(&scheduled.name)?;
                let input = TaskInput {
                    task: scheduled.name.clone(),
                    wave: scheduled.wave,
                    context: core.context().clone(),
                    memory: self.memory.clone(),
                    events: self.events.child(scheduled.name.as_str()),
                };
                Some(Dispatch {
                    task: scheduled.name,
                    wave: scheduled.wave,
                    handler: Arc::clone(&node.handler),
                    input,
                })
            })
            .collect()
    }

    fn publish_run_started(&self, backend: &str) {
        info!(
            tasks = self.graph.len(),
            backend,
            run_id = %self.events.run_id(),
            "run started"
        );
        self.events.publish(
            EventType::RunStarted,
            json!({
                "tasks": self.graph.tasks().collect::<Vec<_>>(),
                "backend": backend,
            }),
        );
    }

    fn finish_run(&self, core: CoreRuntime<'_>) -> RunOutcome {
        let outcome = core.finish();
        let status = if outcome.is_halted() { "halted" } else { "completed" };
        info!(status, waves = outcome.waves, completed = outcome.completed.len(), "run finished");
        self.events.publish(
            EventType::RunFinished,
            json!({
                "status": status,
                "waves": outcome.waves,
                "completed": outcome.completed.iter().map(|r| r.task.as_str()).collect::<Vec<_>>(),
            }),
        );
        outcome
    }

    fn abort_run(&self, err: FlowError) -> FlowError {
        self.events.publish(
            EventType::RunFinished,
            json!({
                "status": "failed",
                "task": err.failed_task(),
                "error": err.to_string(),
            }),
        );
        err
    }
}
