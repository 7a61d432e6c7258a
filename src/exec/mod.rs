// src/exec/mod.rs

//! Handler execution layer.
//!
//! This module is responsible for actually invoking task handlers for one
//! wave and reporting their completions back to the scheduler.
//!
//! - [`handler`] defines the handler contract ([`TaskHandler`], its input
//!   and output).
//! - [`task_runner`] runs a single dispatched handler: writer attribution,
//!   panic containment, lifecycle events.
//! - [`backend`] provides the [`ExecutorBackend`] trait the scheduler talks
//!   to, so tests can swap in a fake implementation.
//! - [`serial`], [`pool`] and [`async_rt`] are the three production
//!   backends, one per [`crate::ConcurrencyMode`].

pub mod async_rt;
pub mod backend;
pub mod handler;
pub mod pool;
pub mod serial;
pub mod task_runner;

pub use async_rt::AsyncExecutor;
pub use backend::ExecutorBackend;
pub use handler::{TaskHandler, TaskInput, TaskOutput};
pub use pool::ThreadPoolExecutor;
pub use serial::SerialExecutor;
pub use task_runner::{Completion, Dispatch, run_dispatch};
