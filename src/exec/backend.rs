// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The scheduler hands each wave to an `ExecutorBackend` and merges whatever
//! completions come back. This makes it easy to swap in a fake executor in
//! tests while keeping the production backends in [`super::serial`],
//! [`super::pool`] and [`super::async_rt`].

use crate::exec::task_runner::{Completion, Dispatch};

/// Trait abstracting how the handlers of one wave are executed.
pub trait ExecutorBackend {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Run the given dispatches and wait for them.
    ///
    /// Implementations return one completion per dispatch they started, in
    /// dispatch order. A backend may stop starting new dispatches once a
    /// completion [aborts the run](Completion::aborts_run); dispatches it
    /// never started are simply omitted. A halt must not cut the wave short.
    fn run_wave(&mut self, wave: Vec<Dispatch>) -> Vec<Completion>;
}

impl<E: ExecutorBackend + ?Sized> ExecutorBackend for Box<E> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn run_wave(&mut self, wave: Vec<Dispatch>) -> Vec<Completion> {
        (**self).run_wave(wave)
    }
}
