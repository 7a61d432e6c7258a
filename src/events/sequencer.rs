// src/events/sequencer.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared monotonic counter.
///
/// Clones share the same counter. `next` never hands out the same value
/// twice, even to concurrent callers; the first value issued is `1`.
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    counter: Arc<AtomicU64>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a counter whose last issued value was `last`.
    pub fn starting_after(last: u64) -> Self {
        Self {
            counter: Arc::new(AtomicU64::new(last)),
        }
    }

    /// Issue the next value.
    pub fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Last issued value, or `0` if nothing was issued yet.
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn current_does_not_advance() {
        let seq = Sequencer::new();
        assert_eq!(seq.current(), 0);
        assert_eq!(seq.next(), 1);
        assert_eq!(seq.current(), 1);
        assert_eq!(seq.current(), 1);
        assert_eq!(seq.next(), 2);
    }

    #[test]
    fn clones_share_the_counter() {
        let a = Sequencer::starting_after(10);
        let b = a.clone();
        assert_eq!(a.next(), 11);
        assert_eq!(b.next(), 12);
        assert_eq!(a.current(), 12);
    }

    #[test]
    fn concurrent_callers_never_collide() {
        let seq = Sequencer::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let seq = seq.clone();
                thread::spawn(move || (0..500).map(|_| seq.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for h in handles {
            for v in h.join().unwrap() {
                assert!(seen.insert(v), "value {v} issued twice");
            }
        }
        assert_eq!(seen.len(), 4000);
        assert_eq!(seq.current(), 4000);
    }
}
