// src/exec/serial.rs

use tracing::debug;

use crate::exec::backend::ExecutorBackend;
use crate::exec::task_runner::{Completion, Dispatch, run_dispatch};

/// Runs handlers one at a time on the calling thread.
///
/// Stops starting further handlers of the wave as soon as one fails;
/// those are reported back as never started. A halting handler lets the
/// rest of its wave run, like the concurrent backends do.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialExecutor;

impl SerialExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl ExecutorBackend for SerialExecutor {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn run_wave(&mut self, wave: Vec<Dispatch>) -> Vec<Completion> {
        let total = wave.len();
        let mut completions = Vec::with_capacity(total);

        for dispatch in wave {
            let completion = run_dispatch(dispatch);
            let stop = completion.aborts_run();
            completions.push(completion);
            if stop {
                debug!(
                    started = completions.len(),
                    total, "serial executor stopping wave early"
                );
                break;
            }
        }

        completions
    }
}
