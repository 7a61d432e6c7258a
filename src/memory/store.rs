// src/memory/store.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::MemoryConfig;
use crate::errors::Result;
use crate::memory::entry::{Change, MemoryEntry, MemoryStats};
use crate::memory::pattern::KeyPattern;
use crate::memory::subscription::{self, SubscriptionId, SubscriptionRegistry};
use crate::memory::writer;

/// How long a read may block when the key is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Wait {
    /// Return `None` immediately.
    #[default]
    No,
    /// Block until the key is set.
    Forever,
    /// Block until the key is set or the timeout elapses.
    Timeout(Duration),
}

impl From<Duration> for Wait {
    fn from(d: Duration) -> Self {
        Wait::Timeout(d)
    }
}

impl From<bool> for Wait {
    fn from(wait: bool) -> Self {
        if wait { Wait::Forever } else { Wait::No }
    }
}

struct Inner {
    config: MemoryConfig,
    entries: Mutex<BTreeMap<String, MemoryEntry>>,
    /// Signalled on every `set`; paired with `entries`.
    changed: Condvar,
    subscriptions: Mutex<SubscriptionRegistry>,
}

/// Thread-safe key/value store shared by reference between task handlers.
///
/// Cloning is cheap and yields a handle to the same store. A handle carries
/// a namespace prefix: the root handle has none, [`scoped`](Self::scoped)
/// returns a handle whose keys are prefixed with `namespace` plus the
/// configured separator. Scoped handles use the same map, lock and condition
/// variable as the root, so `scoped("shared").set("status", ..)` is visible
/// to a root `get("shared:status")`.
///
/// Keys written outside any scope belong to the configured default
/// namespace. The root handle *is* that namespace: `scoped(default)` on the
/// root returns the root view, and a root key spelled `default:key` names the
/// same entry as `key`.
#[derive(Clone)]
pub struct SharedMemory {
    inner: Arc<Inner>,
    prefix: String,
}

impl fmt::Debug for SharedMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedMemory")
            .field("prefix", &self.prefix)
            .field("entries", &self.lock_entries().len())
            .finish_non_exhaustive()
    }
}

impl Default for SharedMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedMemory {
    pub fn new() -> Self {
        Self::with_config(MemoryConfig::default())
    }

    pub fn with_config(config: MemoryConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                entries: Mutex::new(BTreeMap::new()),
                changed: Condvar::new(),
                subscriptions: Mutex::new(SubscriptionRegistry::default()),
            }),
            prefix: String::new(),
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.inner.config
    }

    /// View whose keys live under `namespace`. Scoping a scoped view nests
    /// the prefixes.
    pub fn scoped(&self, namespace: &str) -> SharedMemory {
        let prefix = if self.prefix.is_empty() && namespace == self.inner.config.default_namespace
        {
            String::new()
        } else {
            format!("{}{}{}", self.prefix, namespace, self.inner.config.separator)
        };
        SharedMemory {
            inner: Arc::clone(&self.inner),
            prefix,
        }
    }

    /// Namespace of this view (`None` for the root handle).
    pub fn namespace(&self) -> Option<&str> {
        self.prefix
            .strip_suffix(self.inner.config.separator.as_str())
            .filter(|ns| !ns.is_empty())
    }

    /// Store `value` under `key`, attributed to the thread's current writer.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        self.write(key, value.into(), writer::current_writer());
    }

    /// Store `value` under `key` with an explicit writer.
    pub fn set_as(&self, key: &str, value: impl Into<Value>, writer: &str) {
        self.write(key, value.into(), Some(writer.to_string()));
    }

    /// Non-blocking read.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_with(key, Wait::No)
    }

    /// Read blocking for at most `timeout`. Returns `None` on expiry.
    pub fn wait_for(&self, key: &str, timeout: Duration) -> Option<Value> {
        self.get_with(key, Wait::Timeout(timeout))
    }

    /// Read with an explicit waiting policy.
    ///
    /// A present key is returned immediately. Otherwise the calling thread
    /// blocks on the store's condition variable, re-checking the key after
    /// every wakeup, until the key appears or the wait expires.
    pub fn get_with(&self, key: &str, wait: impl Into<Wait>) -> Option<Value> {
        let full = self.full_key(key);
        let wait = wait.into();
        let mut entries = self.lock_entries();

        if let Some(value) = touch(&mut entries, &full) {
            return Some(value);
        }

        let deadline = match wait {
            Wait::No => return None,
            Wait::Forever => {
                debug!(key = %full, "blocking until key is set");
                None
            }
            Wait::Timeout(timeout) => {
                debug!(key = %full, ?timeout, "blocking until key is set or timeout");
                // Too far in the future to represent: wait as if unbounded.
                Instant::now().checked_add(timeout)
            }
        };

        loop {
            entries = match deadline {
                None => self
                    .inner
                    .changed
                    .wait(entries)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        debug!(key = %full, "wait for key timed out");
                        return None;
                    }
                    self.inner
                        .changed
                        .wait_timeout(entries, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
            if let Some(value) = touch(&mut entries, &full) {
                return Some(value);
            }
        }
    }

    pub fn exists(&self, key: &str) -> bool {
        self.lock_entries().contains_key(&self.full_key(key))
    }

    /// Remove `key`, returning its value. Subscribers are not notified.
    pub fn forget(&self, key: &str) -> Option<Value> {
        let full = self.full_key(key);
        let removed = self.lock_entries().remove(&full).map(|e| e.value);
        if removed.is_some() {
            trace!(key = %full, "forgot key");
        }
        removed
    }

    /// Metadata snapshot of one entry. Does not count as an access.
    pub fn entry(&self, key: &str) -> Option<MemoryEntry> {
        self.lock_entries().get(&self.full_key(key)).cloned()
    }

    /// Keys in this scope, relative to it, in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let entries = self.lock_entries();
        self.in_scope(&entries)
            .map(|(k, _)| self.relative(k).to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        let entries = self.lock_entries();
        self.in_scope(&entries).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every value in this scope, keyed relative to it.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        let entries = self.lock_entries();
        self.in_scope(&entries)
            .map(|(k, e)| (self.relative(k).to_string(), e.value.clone()))
            .collect()
    }

    /// Entries of this scope whose relative key matches `pattern` (a literal
    /// key or a glob such as `agent_*`).
    pub fn search(&self, pattern: &str) -> Result<Vec<(String, Value)>> {
        let pattern = KeyPattern::new(&self.prefix, self.pattern_source(pattern))?;
        let entries = self.lock_entries();
        Ok(self
            .in_scope(&entries)
            .filter(|(k, _)| pattern.matches(k))
            .map(|(k, e)| (self.relative(k).to_string(), e.value.clone()))
            .collect())
    }

    /// Register `callback` for every `set` whose key matches one of
    /// `patterns` (relative to this scope).
    ///
    /// The callback runs once per matching `set`, synchronously on the
    /// writer's thread, after the value is stored and the store is unlocked.
    pub fn subscribe<F>(&self, patterns: &[&str], callback: F) -> Result<SubscriptionId>
    where
        F: Fn(&Change) + Send + Sync + 'static,
    {
        let compiled = patterns
            .iter()
            .map(|p| KeyPattern::new(&self.prefix, self.pattern_source(p)))
            .collect::<Result<Vec<_>>>()?;

        let id = self.lock_subscriptions().add(compiled, Arc::new(callback));
        debug!(subscription = %id, ?patterns, scope = %self.prefix, "registered memory subscription");
        Ok(id)
    }

    /// Cancel a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.lock_subscriptions().remove(id)
    }

    /// Counts for this scope; the root handle covers the whole store.
    pub fn stats(&self) -> MemoryStats {
        let entries = self.lock_entries();
        let mut namespaces = BTreeSet::new();
        let mut count = 0;
        for (_, entry) in self.in_scope(&entries) {
            count += 1;
            namespaces.insert(entry.namespace.as_str());
        }
        MemoryStats {
            entries: count,
            namespaces: namespaces.len(),
            subscriptions: self.lock_subscriptions().len(),
        }
    }

    /// Remove every entry in this scope. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.lock_entries();
        let before = entries.len();
        let prefix = self.prefix.as_str();
        entries.retain(|k, _| !k.starts_with(prefix));
        let removed = before - entries.len();
        debug!(scope = %self.prefix, removed, "cleared memory scope");
        removed
    }

    /// Remove every entry of the whole store, regardless of scope.
    pub fn clear_all(&self) -> usize {
        let mut entries = self.lock_entries();
        let removed = entries.len();
        entries.clear();
        debug!(removed, "cleared all memory");
        removed
    }

    fn write(&self, key: &str, value: Value, writer: Option<String>) {
        let full = self.full_key(key);
        let (namespace, local) = self.split(&full);
        let now = Utc::now();

        {
            let mut entries = self.lock_entries();
            match entries.get_mut(&full) {
                Some(entry) => {
                    entry.value = value.clone();
                    entry.writer = writer.clone();
                    entry.updated_at = now;
                }
                None => {
                    entries.insert(
                        full.clone(),
                        MemoryEntry {
                            namespace: namespace.clone(),
                            key: local,
                            value: value.clone(),
                            writer: writer.clone(),
                            updated_at: now,
                            access_count: 0,
                        },
                    );
                }
            }
        }
        self.inner.changed.notify_all();
        trace!(key = %full, writer = writer.as_deref().unwrap_or("-"), "stored value");

        let callbacks = self.lock_subscriptions().matching(&full);
        if callbacks.is_empty() {
            return;
        }

        let change = Change {
            key: full,
            namespace,
            value,
            writer,
            timestamp: now,
        };
        subscription::dispatch(callbacks, &change);
    }

    /// Stored form of `key` in this view. Entries of the default namespace
    /// are stored unqualified, so `(namespace, key)` maps to one stored key.
    fn full_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            self.unqualified(key).to_string()
        } else {
            format!("{}{}", self.prefix, key)
        }
    }

    /// Strip an explicit default namespace from a root-level key or pattern.
    fn unqualified<'k>(&self, key: &'k str) -> &'k str {
        let sep = self.inner.config.separator.as_str();
        key.strip_prefix(self.inner.config.default_namespace.as_str())
            .and_then(|rest| rest.strip_prefix(sep))
            .filter(|rest| !rest.contains(sep))
            .unwrap_or(key)
    }

    fn pattern_source<'p>(&self, pattern: &'p str) -> &'p str {
        if self.prefix.is_empty() {
            self.unqualified(pattern)
        } else {
            pattern
        }
    }

    fn relative<'k>(&self, full_key: &'k str) -> &'k str {
        full_key.strip_prefix(self.prefix.as_str()).unwrap_or(full_key)
    }

    /// Split a fully qualified key into `(namespace, key)` at the last
    /// separator.
    fn split(&self, full_key: &str) -> (String, String) {
        let sep = self.inner.config.separator.as_str();
        match full_key.rsplit_once(sep) {
            Some((ns, key)) if !ns.is_empty() => (ns.to_string(), key.to_string()),
            _ => (
                self.inner.config.default_namespace.clone(),
                full_key.to_string(),
            ),
        }
    }

    fn in_scope<'a>(
        &'a self,
        entries: &'a BTreeMap<String, MemoryEntry>,
    ) -> impl Iterator<Item = (&'a String, &'a MemoryEntry)> + 'a {
        let prefix = self.prefix.as_str();
        entries
            .range::<str, _>((std::ops::Bound::Included(prefix), std::ops::Bound::Unbounded))
            .take_while(move |(k, _)| k.starts_with(prefix))
    }

    fn lock_entries(&self) -> MutexGuard<'_, BTreeMap<String, MemoryEntry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_subscriptions(&self) -> MutexGuard<'_, SubscriptionRegistry> {
        self.inner
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read a value, counting the access.
fn touch(entries: &mut BTreeMap<String, MemoryEntry>, full_key: &str) -> Option<Value> {
    entries.get_mut(full_key).map(|entry| {
        entry.access_count += 1;
        entry.value.clone()
    })
}
