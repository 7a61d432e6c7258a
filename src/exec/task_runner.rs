// src/exec/task_runner.rs

//! Individual handler invocation.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use serde_json::json;
use tracing::{debug, warn};

use crate::engine::TaskName;
use crate::events::EventType;
use crate::exec::handler::{TaskHandler, TaskInput, TaskOutput};
use crate::memory::WriterGuard;
use crate::utils::panic_message;

/// A handler ready to be invoked, with its prepared input.
pub struct Dispatch {
    pub task: TaskName,
    pub wave: usize,
    pub handler: Arc<dyn TaskHandler>,
    pub input: TaskInput,
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("task", &self.task)
            .field("wave", &self.wave)
            .finish_non_exhaustive()
    }
}

/// Result of one handler invocation.
#[derive(Debug)]
pub struct Completion {
    pub task: TaskName,
    pub wave: usize,
    pub result: anyhow::Result<TaskOutput>,
    pub started_at: Instant,
    pub finished_at: Instant,
}

impl Completion {
    /// Completion for a handler that could not be run or joined at all.
    pub fn failed(task: TaskName, wave: usize, err: anyhow::Error) -> Self {
        let now = Instant::now();
        Self {
            task,
            wave,
            result: Err(err),
            started_at: now,
            finished_at: now,
        }
    }

    /// Whether this completion aborts the run.
    ///
    /// A halt does not: the rest of its wave still runs.
    pub fn aborts_run(&self) -> bool {
        self.result.is_err()
    }
}

/// Run one handler on the current thread.
///
/// - Sets the thread's current memory writer to the task name.
/// - Converts a handler panic into an error completion.
/// - Publishes `task_started` and `task_completed` / `task_failed` through the
///   task's own event context.
pub fn run_dispatch(dispatch: Dispatch) -> Completion {
    let Dispatch {
        task,
        wave,
        handler,
        input,
    } = dispatch;
    let events = input.events.clone();

    debug!(task = %task, wave, "starting task handler");
    events.publish(EventType::TaskStarted, json!({ "task": task, "wave": wave }));

    let started_at = Instant::now();
    let result = {
        let _writer = WriterGuard::set(&task);
        match panic::catch_unwind(AssertUnwindSafe(|| handler.call(input))) {
            Ok(result) => result,
            Err(payload) => Err(anyhow!(
                "handler panicked: {}",
                panic_message(payload.as_ref())
            )),
        }
    };
    let finished_at = Instant::now();
    let elapsed_ms = finished_at.duration_since(started_at).as_millis() as u64;

    match &result {
        Ok(output) => {
            debug!(
                task = %task,
                wave,
                elapsed_ms,
                activations = ?output.activations,
                halt = output.is_halt(),
                "task handler finished"
            );
            events.publish(
                EventType::TaskCompleted,
                json!({
                    "task": task,
                    "wave": wave,
                    "elapsed_ms": elapsed_ms,
                    "halt": output.is_halt(),
                }),
            );
        }
        Err(err) => {
            warn!(task = %task, wave, elapsed_ms, error = %err, "task handler failed");
            events.publish(
                EventType::TaskFailed,
                json!({ "task": task, "wave": wave, "error": format!("{err:#}") }),
            );
        }
    }

    Completion {
        task,
        wave,
        result,
        started_at,
        finished_at,
    }
}
