// src/dag/validate.rs

use std::collections::BTreeSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::graph::TaskNode;
use crate::engine::TaskName;
use crate::errors::{FlowError, Result};

/// Validate a set of nodes and return a topological order of their names.
///
/// This checks:
/// - there is at least one task
/// - names are unique
/// - every `Required` dependency names an existing task other than itself
/// - `Required` edges contain no cycle
pub fn validate_nodes(nodes: &[TaskNode]) -> Result<Vec<TaskName>> {
    if nodes.is_empty() {
        return Err(FlowError::EmptyGraph);
    }

    let names = ensure_unique(nodes)?;
    validate_dependencies(nodes, &names)?;
    topological_order(nodes)
}

fn ensure_unique(nodes: &[TaskNode]) -> Result<BTreeSet<&str>> {
    let mut names = BTreeSet::new();
    for node in nodes {
        if !names.insert(node.name.as_str()) {
            return Err(FlowError::DuplicateTask(node.name.clone()));
        }
    }
    Ok(names)
}

fn validate_dependencies(nodes: &[TaskNode], names: &BTreeSet<&str>) -> Result<()> {
    for node in nodes {
        for dep in node.depends_on.dependencies() {
            if dep == &node.name {
                return Err(FlowError::SelfDependency(node.name.clone()));
            }
            if !names.contains(dep.as_str()) {
                return Err(FlowError::UnknownDependency {
                    task: node.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }
    Ok(())
}

fn topological_order(nodes: &[TaskNode]) -> Result<Vec<TaskName>> {
    // Edge direction: dependency -> dependent.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    // Sorted insertion makes the order independent of registration order.
    let mut sorted: Vec<&TaskNode> = nodes.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    for node in &sorted {
        graph.add_node(node.name.as_str());
    }
    for node in &sorted {
        for dep in node.depends_on.dependencies() {
            graph.add_edge(dep.as_str(), node.name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => Err(FlowError::DagCycle(format!(
            "cycle detected in task graph involving task '{}'",
            cycle.node_id()
        ))),
    }
}
