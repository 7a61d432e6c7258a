#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use agentflow::{DependsOn, TaskGraph, TaskInput, TaskOutput};
use serde_json::Value;

/// One observed handler invocation.
#[derive(Debug, Clone)]
pub struct TaskRun {
    pub task: String,
    pub wave: usize,
    pub started: Instant,
    pub finished: Instant,
    /// Keys of the context the handler was given.
    pub saw: Vec<String>,
}

/// Shared log of handler invocations, in finish order.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    runs: Arc<Mutex<Vec<TaskRun>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, run: TaskRun) {
        self.runs.lock().unwrap().push(run);
    }

    pub fn runs(&self) -> Vec<TaskRun> {
        self.runs.lock().unwrap().clone()
    }

    /// Task names in finish order.
    pub fn names(&self) -> Vec<String> {
        self.runs().into_iter().map(|r| r.task).collect()
    }

    pub fn count(&self, task: &str) -> usize {
        self.runs().iter().filter(|r| r.task == task).count()
    }

    pub fn run_of(&self, task: &str) -> Option<TaskRun> {
        self.runs().into_iter().find(|r| r.task == task)
    }
}

/// Wrap `output` in a handler that records every call in `recorder`.
pub fn recording_handler(
    recorder: &Recorder,
    task: &str,
    output: TaskOutput,
) -> impl Fn(TaskInput) -> anyhow::Result<TaskOutput> + Send + Sync + 'static {
    let recorder = recorder.clone();
    let task = task.to_string();
    move |input: TaskInput| {
        let started = Instant::now();
        let saw = input.context.keys().map(str::to_string).collect();
        recorder.record(TaskRun {
            task: task.clone(),
            wave: input.wave,
            started,
            finished: Instant::now(),
            saw,
        });
        Ok(output.clone())
    }
}

enum Behaviour {
    Output(TaskOutput),
    Fail(String),
}

/// Declarative graph for scheduler tests.
///
/// Every task records its invocation in the fixture's [`Recorder`].
///
/// ```ignore
/// let fixture = GraphFixture::new()
///     .root("a")
///     .after("b", &["a"])
///     .optional("c")
///     .activating("a", &["c"]);
/// let graph = fixture.build();
/// ```
pub struct GraphFixture {
    recorder: Recorder,
    tasks: BTreeMap<String, (DependsOn, Behaviour)>,
}

impl Default for GraphFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphFixture {
    pub fn new() -> Self {
        Self {
            recorder: Recorder::new(),
            tasks: BTreeMap::new(),
        }
    }

    pub fn recorder(&self) -> Recorder {
        self.recorder.clone()
    }

    pub fn root(self, name: &str) -> Self {
        self.with(name, DependsOn::None)
    }

    pub fn after(self, name: &str, deps: &[&str]) -> Self {
        self.with(name, DependsOn::required(deps.iter().copied()))
    }

    pub fn optional(self, name: &str) -> Self {
        self.with(name, DependsOn::Optional)
    }

    pub fn with(mut self, name: &str, depends_on: DependsOn) -> Self {
        self.tasks.insert(
            name.to_string(),
            (depends_on, Behaviour::Output(TaskOutput::from_value(name))),
        );
        self
    }

    /// Make `name` activate the given optional tasks.
    pub fn activating(mut self, name: &str, targets: &[&str]) -> Self {
        if let Some((_, Behaviour::Output(out))) = self.tasks.get_mut(name) {
            for target in targets {
                *out = out.clone().activate(*target);
            }
        }
        self
    }

    /// Make `name` halt the run with `value`.
    pub fn halting(mut self, name: &str, value: impl Into<Value>) -> Self {
        if let Some((_, Behaviour::Output(out))) = self.tasks.get_mut(name) {
            *out = out.clone().halt(value);
        }
        self
    }

    /// Make `name` return an error.
    pub fn failing(mut self, name: &str, message: &str) -> Self {
        if let Some((_, behaviour)) = self.tasks.get_mut(name) {
            *behaviour = Behaviour::Fail(message.to_string());
        }
        self
    }

    pub fn build(&self) -> TaskGraph {
        let mut builder = TaskGraph::builder();
        for (name, (depends_on, behaviour)) in &self.tasks {
            builder = match behaviour {
                Behaviour::Output(out) => builder.task(
                    name.as_str(),
                    depends_on.clone(),
                    recording_handler(&self.recorder, name, out.clone()),
                ),
                Behaviour::Fail(message) => {
                    let record = recording_handler(&self.recorder, name, TaskOutput::new());
                    let message = message.clone();
                    builder.task(name.as_str(), depends_on.clone(), move |input| {
                        record(input)?;
                        Err(anyhow::anyhow!(message.clone()))
                    })
                }
            };
        }
        builder.build().expect("fixture graph should be valid")
    }
}
