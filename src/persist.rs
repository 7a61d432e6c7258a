// src/persist.rs

//! Boundary to an external persistence collaborator.
//!
//! The core never stores anything durably. A driver that wants to resume
//! from earlier runs loads [`TaskRecord`]s through a [`ResultStore`], seeds
//! the initial context with them, and saves the records of the new run.

use std::sync::{Mutex, PoisonError};

use anyhow::Result;

use crate::context::{Context, TaskRecord};

/// Storage for completed task results.
pub trait ResultStore: Send + Sync {
    /// Previously saved records, oldest first.
    fn load(&self) -> Result<Vec<TaskRecord>>;

    /// Append the records of a finished run, in completion order.
    fn save(&self, records: &[TaskRecord]) -> Result<()>;
}

/// Build an initial context from whatever the store holds.
pub fn seed_context(store: &dyn ResultStore) -> Result<Context> {
    Ok(Context::from_records(&store.load()?))
}

/// Volatile store, mostly useful in tests and examples.
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    records: Mutex<Vec<TaskRecord>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStore for InMemoryResultStore {
    fn load(&self) -> Result<Vec<TaskRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, records: &[TaskRecord]) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(records);
        Ok(())
    }
}
