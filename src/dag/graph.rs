// src/dag/graph.rs

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::dag::validate::validate_nodes;
use crate::engine::TaskName;
use crate::errors::{FlowError, Result};
use crate::exec::{TaskHandler, TaskInput, TaskOutput};

/// How a task becomes eligible to run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DependsOn {
    /// Ready in the first wave.
    #[default]
    None,
    /// Ready once every listed task has completed.
    Required(Vec<TaskName>),
    /// Ready only once some completed task activates it. Runs at most once.
    Optional,
}

impl DependsOn {
    pub fn required<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        DependsOn::Required(names.into_iter().map(Into::into).collect())
    }

    /// Tasks this one is ordered after (empty unless `Required`).
    pub fn dependencies(&self) -> &[TaskName] {
        match self {
            DependsOn::Required(deps) => deps.as_slice(),
            DependsOn::None | DependsOn::Optional => &[],
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, DependsOn::Optional)
    }
}

/// A named handler plus its dependency declaration.
#[derive(Clone)]
pub struct TaskNode {
    pub name: TaskName,
    pub depends_on: DependsOn,
    pub handler: Arc<dyn TaskHandler>,
}

impl fmt::Debug for TaskNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskNode")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}

/// Validated, immutable set of task nodes.
///
/// Construction goes through [`TaskGraphBuilder`], which rejects duplicate
/// names, unknown or self dependencies, and cycles among `Required` edges.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: BTreeMap<TaskName, TaskNode>,
    topo_order: Vec<TaskName>,
}

impl TaskGraph {
    pub fn builder() -> TaskGraphBuilder {
        TaskGraphBuilder::new()
    }

    /// All task names, sorted.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn node(&self, name: &str) -> Option<&TaskNode> {
        self.nodes.get(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TaskNode> {
        self.nodes.values()
    }

    pub fn depends_on(&self, name: &str) -> Option<&DependsOn> {
        self.nodes.get(name).map(|n| &n.depends_on)
    }

    /// Immediate `Required` dependencies of a task.
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.depends_on.dependencies())
            .unwrap_or(&[])
    }

    /// A topological order of `Required` edges, fixed at build time.
    pub fn topological_order(&self) -> &[TaskName] {
        &self.topo_order
    }
}

/// Collects task nodes and validates them into a [`TaskGraph`].
///
/// Chaining methods ([`task`](Self::task), [`handler`](Self::handler))
/// defer every check to [`build`](Self::build); [`add_task`](Self::add_task)
/// reports a duplicate name immediately.
#[derive(Debug, Default)]
pub struct TaskGraphBuilder {
    nodes: Vec<TaskNode>,
}

impl TaskGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a closure task.
    pub fn task<F>(self, name: impl Into<TaskName>, depends_on: DependsOn, handler: F) -> Self
    where
        F: Fn(TaskInput) -> anyhow::Result<TaskOutput> + Send + Sync + 'static,
    {
        self.handler(name, depends_on, Arc::new(handler))
    }

    /// Add a task backed by a shared handler object.
    pub fn handler(
        mut self,
        name: impl Into<TaskName>,
        depends_on: DependsOn,
        handler: Arc<dyn TaskHandler>,
    ) -> Self {
        self.nodes.push(TaskNode {
            name: name.into(),
            depends_on,
            handler,
        });
        self
    }

    /// Add a task in place, failing if the name is already taken.
    ///
    /// Dependencies may name tasks added later, so they are only checked by
    /// [`build`](Self::build).
    pub fn add_task<F>(
        &mut self,
        name: impl Into<TaskName>,
        depends_on: DependsOn,
        handler: F,
    ) -> Result<&mut Self>
    where
        F: Fn(TaskInput) -> anyhow::Result<TaskOutput> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.nodes.iter().any(|n| n.name == name) {
            return Err(FlowError::DuplicateTask(name));
        }
        self.nodes.push(TaskNode {
            name,
            depends_on,
            handler: Arc::new(handler),
        });
        Ok(self)
    }

    pub fn build(self) -> Result<TaskGraph> {
        let topo_order = validate_nodes(&self.nodes)?;

        let nodes: BTreeMap<TaskName, TaskNode> = self
            .nodes
            .into_iter()
            .map(|n| (n.name.clone(), n))
            .collect();

        debug!(tasks = nodes.len(), ?topo_order, "task graph built");

        Ok(TaskGraph { nodes, topo_order })
    }
}
