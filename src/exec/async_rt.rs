// src/exec/async_rt.rs

//! Cooperative async execution on Tokio.
//!
//! The wave is orchestrated by futures on a single thread; each handler is
//! moved to Tokio's blocking pool because handlers are allowed to block on
//! shared memory.

use std::collections::HashMap;

use anyhow::anyhow;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::engine::TaskName;
use crate::errors::{FlowError, Result};
use crate::exec::backend::ExecutorBackend;
use crate::exec::task_runner::{Completion, Dispatch, run_dispatch};

/// Run one wave on the ambient Tokio runtime and wait for every handler.
pub async fn run_wave(wave: Vec<Dispatch>) -> Vec<Completion> {
    let mut names: HashMap<usize, (TaskName, usize)> = HashMap::with_capacity(wave.len());
    let mut set = JoinSet::new();

    for (index, dispatch) in wave.into_iter().enumerate() {
        names.insert(index, (dispatch.task.clone(), dispatch.wave));
        set.spawn_blocking(move || (index, run_dispatch(dispatch)));
    }

    let mut completions = Vec::with_capacity(names.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(pair) => {
                names.remove(&pair.0);
                completions.push(pair);
            }
            Err(err) => {
                error!(error = %err, "handler join failed");
            }
        }
    }

    // Handlers whose join failed still need a completion so the run aborts.
    for (index, (task, wave)) in names {
        completions.push((
            index,
            Completion::failed(task, wave, anyhow!("handler could not be joined")),
        ));
    }

    completions.sort_by_key(|(index, _)| *index);
    completions.into_iter().map(|(_, c)| c).collect()
}

/// Backend that owns a current-thread Tokio runtime and blocks on it for
/// each wave.
///
/// Must not be used from inside another Tokio runtime; use
/// [`crate::Scheduler::run_async`] there instead.
pub struct AsyncExecutor {
    runtime: Runtime,
}

impl std::fmt::Debug for AsyncExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncExecutor").finish_non_exhaustive()
    }
}

impl AsyncExecutor {
    pub fn new() -> Result<Self> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(FlowError::Runtime(
                "async mode cannot block inside a Tokio runtime; use Scheduler::run_async".into(),
            ));
        }

        let runtime = Builder::new_current_thread()
            .enable_all()
            .thread_name("agentflow-async")
            .build()?;
        Ok(Self { runtime })
    }
}

impl ExecutorBackend for AsyncExecutor {
    fn name(&self) -> &'static str {
        "async"
    }

    fn run_wave(&mut self, wave: Vec<Dispatch>) -> Vec<Completion> {
        debug!(total = wave.len(), "dispatching wave on async runtime");
        self.runtime.block_on(run_wave(wave))
    }
}
