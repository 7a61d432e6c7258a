use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use agentflow::exec::{Completion, Dispatch};
use agentflow::{ExecutorBackend, TaskOutput};

/// A fake executor that:
/// - records which tasks were "run", wave by wave
/// - never calls the real handlers
/// - completes each task with its scripted output (or an empty one)
#[derive(Debug, Clone, Default)]
pub struct FakeExecutor {
    outputs: HashMap<String, TaskOutput>,
    failures: HashMap<String, String>,
    waves: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, task: &str, output: TaskOutput) -> Self {
        self.outputs.insert(task.to_string(), output);
        self
    }

    pub fn with_failure(mut self, task: &str, message: &str) -> Self {
        self.failures.insert(task.to_string(), message.to_string());
        self
    }

    /// Task names per dispatched wave.
    pub fn waves(&self) -> Vec<Vec<String>> {
        self.waves.lock().unwrap().clone()
    }

    pub fn executed(&self) -> Vec<String> {
        self.waves().into_iter().flatten().collect()
    }
}

impl ExecutorBackend for FakeExecutor {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn run_wave(&mut self, wave: Vec<Dispatch>) -> Vec<Completion> {
        self.waves
            .lock()
            .unwrap()
            .push(wave.iter().map(|d| d.task.clone()).collect());

        wave.into_iter()
            .map(|dispatch| {
                let now = Instant::now();
                let result = match self.failures.get(&dispatch.task) {
                    Some(message) => Err(anyhow::anyhow!(message.clone())),
                    None => Ok(self
                        .outputs
                        .get(&dispatch.task)
                        .cloned()
                        .unwrap_or_default()),
                };
                Completion {
                    task: dispatch.task,
                    wave: dispatch.wave,
                    result,
                    started_at: now,
                    finished_at: now,
                }
            })
            .collect()
    }
}
