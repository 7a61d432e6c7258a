// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::engine::TaskName;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Duplicate task name: {0}")]
    DuplicateTask(TaskName),

    #[error("task '{task}' has unknown dependency '{dependency}'")]
    UnknownDependency {
        task: TaskName,
        dependency: TaskName,
    },

    #[error("task '{0}' cannot depend on itself")]
    SelfDependency(TaskName),

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("task graph must contain at least one task")]
    EmptyGraph,

    /// A task handler returned an error (or panicked). The run was aborted.
    #[error("task '{task}' failed: {source}")]
    Execution {
        task: TaskName,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlowError {
    /// Wrap a handler failure with the name of the task that produced it.
    pub fn execution(task: impl Into<TaskName>, err: anyhow::Error) -> Self {
        FlowError::Execution {
            task: task.into(),
            source: err.into(),
        }
    }

    /// Whether this error was raised while building a graph or loading
    /// configuration, i.e. before any run started.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FlowError::ConfigError(_)
                | FlowError::DuplicateTask(_)
                | FlowError::UnknownDependency { .. }
                | FlowError::SelfDependency(_)
                | FlowError::DagCycle(_)
                | FlowError::EmptyGraph
        )
    }

    /// Name of the task whose handler failed, for [`FlowError::Execution`].
    pub fn failed_task(&self) -> Option<&str> {
        match self {
            FlowError::Execution { task, .. } => Some(task.as_str()),
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, FlowError>;
