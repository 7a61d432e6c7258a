// src/memory/subscription.rs

//! Change subscriptions.
//!
//! Callbacks run synchronously on the writer's thread, after the value is
//! stored and every store lock has been released, so a callback may read or
//! write the store again. A panicking callback is logged and does not affect
//! the writer or other subscribers.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::warn;

use crate::memory::entry::Change;
use crate::memory::pattern::KeyPattern;
use crate::utils::panic_message;

/// Handle returned by `subscribe`, used to cancel the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

pub(crate) type Callback = Arc<dyn Fn(&Change) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    patterns: Vec<KeyPattern>,
    callback: Callback,
}

impl Subscription {
    fn matches(&self, full_key: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(full_key))
    }
}

#[derive(Default)]
pub(crate) struct SubscriptionRegistry {
    next_id: u64,
    subs: Vec<Subscription>,
}

impl SubscriptionRegistry {
    pub(crate) fn add(&mut self, patterns: Vec<KeyPattern>, callback: Callback) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subs.push(Subscription {
            id,
            patterns,
            callback,
        });
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.subs.len();
        self.subs.retain(|s| s.id != id);
        self.subs.len() != before
    }

    /// Callbacks interested in `full_key`, in registration order.
    pub(crate) fn matching(&self, full_key: &str) -> Vec<(SubscriptionId, Callback)> {
        self.subs
            .iter()
            .filter(|s| s.matches(full_key))
            .map(|s| (s.id, Arc::clone(&s.callback)))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.subs.len()
    }
}

/// Invoke each callback with `change`, containing panics.
pub(crate) fn dispatch(callbacks: Vec<(SubscriptionId, Callback)>, change: &Change) {
    for (id, callback) in callbacks {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(change))) {
            warn!(
                subscription = %id,
                key = %change.key,
                panic = %panic_message(payload.as_ref()),
                "memory subscription callback panicked"
            );
        }
    }
}
