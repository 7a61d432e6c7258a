// src/memory/mod.rs

//! Namespaced, blocking, in-process key/value store shared by task handlers.
//!
//! - [`store`] holds [`SharedMemory`] and its scoped views.
//! - [`entry`] defines stored entries, change notifications and stats.
//! - [`pattern`] compiles literal and glob key patterns.
//! - [`subscription`] keeps registered change callbacks.
//! - [`writer`] manages the thread-local "current writer" used for
//!   best-effort attribution.
//!
//! Nothing here is durable; an external collaborator may snapshot the store
//! through [`SharedMemory::snapshot`].

pub mod entry;
pub mod pattern;
pub mod store;
pub mod subscription;
pub mod writer;

pub use entry::{Change, MemoryEntry, MemoryStats};
pub use pattern::KeyPattern;
pub use store::{SharedMemory, Wait};
pub use subscription::SubscriptionId;
pub use writer::{WriterGuard, current_writer, with_writer};
