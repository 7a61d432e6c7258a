// src/dag/mod.rs

//! Task graph representation and per-run state.
//!
//! - [`graph`] holds the validated, immutable graph of task nodes and its
//!   builder.
//! - [`validate`] checks names and dependencies and computes a topological
//!   order (cycle detection).
//! - [`task_info`] provides per-run task metadata and scheduled task types.
//! - [`state_manager`] decides readiness and manages per-run state
//!   transitions.

pub mod graph;
pub mod state_manager;
pub mod task_info;
pub mod validate;

pub use graph::{DependsOn, TaskGraph, TaskGraphBuilder, TaskNode};
pub use task_info::{ScheduledTask, TaskInfo, TaskRunState};
