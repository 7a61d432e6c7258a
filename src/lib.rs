// src/lib.rs

//! Coordination of dependent work units ("tasks") that share state and
//! stream ordered progress events.
//!
//! - [`dag`] describes the task graph and validates it.
//! - [`engine`] runs a graph wave by wave ([`Scheduler`]).
//! - [`exec`] holds the handler contract and the executor backends.
//! - [`memory`] is the namespaced, blocking [`SharedMemory`] store.
//! - [`events`] builds globally sequenced [`StreamEvent`]s and delivers them
//!   to an [`EventSink`].
//!
//! ```no_run
//! use agentflow::{Context, DependsOn, Scheduler, TaskGraph, TaskOutput};
//!
//! # fn main() -> agentflow::Result<()> {
//! let graph = TaskGraph::builder()
//!     .task("plan", DependsOn::None, |_| {
//!         Ok(TaskOutput::from_value("outline").activate("review"))
//!     })
//!     .task("write", DependsOn::required(["plan"]), |input| {
//!         let plan = input.context.get("plan").cloned().unwrap_or_default();
//!         Ok(TaskOutput::from_value(format!("draft from {plan}")))
//!     })
//!     .task("review", DependsOn::Optional, |_| Ok(TaskOutput::from_value("ok")))
//!     .build()?;
//!
//! let outcome = Scheduler::new(graph).run(Context::new())?;
//! assert!(outcome.context.contains("review"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod events;
pub mod exec;
pub mod logging;
pub mod memory;
pub mod persist;
pub mod types;
mod utils;

pub use crate::config::FlowConfig;
pub use crate::context::{Context, TaskRecord};
pub use crate::dag::{DependsOn, TaskGraph, TaskGraphBuilder, TaskRunState};
pub use crate::engine::{Halt, RunOutcome, Scheduler, TaskName};
pub use crate::errors::{FlowError, Result};
pub use crate::events::{EventContext, EventSink, EventType, Sequencer, StreamEvent};
pub use crate::exec::{ExecutorBackend, TaskHandler, TaskInput, TaskOutput};
pub use crate::memory::{Change, SharedMemory, Wait};
pub use crate::persist::{InMemoryResultStore, ResultStore};
pub use crate::types::{ConcurrencyMode, LogLevel};
