// src/memory/entry.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// One stored value with its metadata.
///
/// Identity is `(namespace, key)`. `writer` is best-effort attribution (see
/// [`crate::memory::writer`]).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryEntry {
    pub namespace: String,
    pub key: String,
    pub value: Value,
    pub writer: Option<String>,
    pub updated_at: DateTime<Utc>,
    /// Number of successful reads since the entry was created.
    pub access_count: u64,
}

/// Notification delivered to subscribers after a `set`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    /// Fully qualified key, including every namespace prefix.
    pub key: String,
    pub namespace: String,
    pub value: Value,
    pub writer: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate counts over a store or a scope of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MemoryStats {
    pub entries: usize,
    pub namespaces: usize,
    pub subscriptions: usize,
}
