// src/context.rs

//! The run context: completed task results keyed by name.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::TaskName;

/// Ordered map from name to JSON value.
///
/// Handlers receive a snapshot of the context holding every result completed
/// before their wave started; the scheduler is the only writer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    entries: BTreeMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a context from previously persisted results.
    ///
    /// Later records win when the same task appears more than once.
    pub fn from_records(records: &[TaskRecord]) -> Self {
        records
            .iter()
            .map(|r| (r.task.clone(), r.value.clone()))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Deserialize an entry into `T`. Returns `None` if the key is missing or
    /// the value has a different shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?;
        serde_json::from_value(value.clone()).ok()
    }

    /// Insert or replace an entry, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.entries
    }
}

impl Extend<(String, Value)> for Context {
    fn extend<I: IntoIterator<Item = (String, Value)>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl FromIterator<(String, Value)> for Context {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<String, Value>> for Context {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Self { entries }
    }
}

impl<'a> IntoIterator for &'a Context {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// One completed task result, in the order the scheduler merged it.
///
/// This is the unit exchanged with a [`crate::persist::ResultStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task: TaskName,
    pub value: Value,
    /// Index of the wave (starting at 1) in which the task ran.
    pub wave: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_get_and_typed_access() {
        let mut ctx = Context::new();
        assert_eq!(ctx.set("count", 3), None);
        assert_eq!(ctx.set("count", 4), Some(json!(3)));
        assert_eq!(ctx.get_as::<u32>("count"), Some(4));
        assert_eq!(ctx.get_as::<String>("count"), None);
        assert_eq!(ctx.keys().collect::<Vec<_>>(), vec!["count"]);
    }

    #[test]
    fn later_records_win_when_seeding() {
        let records = vec![
            TaskRecord { task: "a".into(), value: json!(1), wave: 1 },
            TaskRecord { task: "a".into(), value: json!(2), wave: 2 },
        ];
        let ctx = Context::from_records(&records);
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.get("a"), Some(&json!(2)));
    }

    #[test]
    fn serializes_as_plain_object() {
        let mut ctx = Context::new();
        ctx.set("a", "x");
        assert_eq!(serde_json::to_value(&ctx).unwrap(), json!({"a": "x"}));
    }
}
