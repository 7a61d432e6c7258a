// src/config/mod.rs

//! Configuration for agentflow.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like worker counts (`validate.rs`).
//!
//! Every section can also be built in code; constructors such as
//! [`crate::SharedMemory::with_config`] take these values explicitly and
//! nothing reads process-wide state.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_and_validate};
pub use model::{EventConfig, FlowConfig, MemoryConfig, RawFlowConfig, SchedulerConfig};
