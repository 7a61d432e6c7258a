// src/exec/pool.rs

use std::sync::mpsc::channel;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::errors::{FlowError, Result};
use crate::exec::backend::ExecutorBackend;
use crate::exec::task_runner::{Completion, Dispatch, run_dispatch};

/// Runs every handler of a wave concurrently on a bounded Rayon pool.
///
/// A handler that blocks on shared memory keeps its worker busy while it
/// waits. If a wave holds more mutually waiting handlers than workers, the
/// waiters can only make progress through their own timeouts.
pub struct ThreadPoolExecutor {
    pool: ThreadPool,
    max_workers: usize,
}

impl std::fmt::Debug for ThreadPoolExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPoolExecutor")
            .field("max_workers", &self.max_workers)
            .finish_non_exhaustive()
    }
}

impl ThreadPoolExecutor {
    pub fn new(max_workers: usize) -> Result<Self> {
        let max_workers = max_workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(max_workers)
            .thread_name(|i| format!("agentflow-worker-{i}"))
            .build()
            .map_err(|e| FlowError::Runtime(format!("failed to build worker pool: {e}")))?;

        Ok(Self { pool, max_workers })
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }
}

impl ExecutorBackend for ThreadPoolExecutor {
    fn name(&self) -> &'static str {
        "threads"
    }

    fn run_wave(&mut self, wave: Vec<Dispatch>) -> Vec<Completion> {
        let total = wave.len();
        debug!(total, max_workers = self.max_workers, "dispatching wave to worker pool");

        // Tasks are distributed by Rayon; results come back over a channel
        // tagged with their dispatch index.
        let (result_sender, result_receiver) = channel::<(usize, Completion)>();

        self.pool.scope(|s| {
            for (index, dispatch) in wave.into_iter().enumerate() {
                let sender = result_sender.clone();
                s.spawn(move |_| {
                    // The receiver outlives the scope.
                    let _ = sender.send((index, run_dispatch(dispatch)));
                });
            }
        });
        drop(result_sender);

        let mut completions: Vec<(usize, Completion)> = result_receiver.into_iter().collect();
        completions.sort_by_key(|(index, _)| *index);
        completions.into_iter().map(|(_, c)| c).collect()
    }
}
