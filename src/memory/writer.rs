// src/memory/writer.rs

//! Thread-local "current writer" used to attribute writes.
//!
//! The scheduler sets the current writer to the task name while a handler
//! runs, so plain `set` calls from a handler are attributed to its task.
//! This is best effort only: writes made from threads the handler spawns
//! itself carry no writer, and code that swaps the value by hand can race
//! with other writers on the same thread. Pass an explicit writer to
//! [`crate::SharedMemory::set_as`] when attribution matters.

use std::cell::RefCell;

thread_local! {
    static CURRENT_WRITER: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Writer attributed to `set` calls on this thread, if any.
pub fn current_writer() -> Option<String> {
    CURRENT_WRITER.with(|w| w.borrow().clone())
}

/// Replace the current writer, returning the previous one.
pub fn set_current_writer(writer: Option<String>) -> Option<String> {
    CURRENT_WRITER.with(|w| w.replace(writer))
}

/// Run `f` with `writer` as the current writer, restoring the previous one
/// afterwards (also on panic).
pub fn with_writer<R>(writer: &str, f: impl FnOnce() -> R) -> R {
    let _guard = WriterGuard::set(writer);
    f()
}

/// Restores the previous current writer when dropped.
#[derive(Debug)]
pub struct WriterGuard {
    previous: Option<String>,
}

impl WriterGuard {
    pub fn set(writer: &str) -> Self {
        Self {
            previous: set_current_writer(Some(writer.to_string())),
        }
    }
}

impl Drop for WriterGuard {
    fn drop(&mut self) {
        set_current_writer(self.previous.take());
    }
}
