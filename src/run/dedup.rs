//! Run-key deduplication.
//!
//! The store is explicit, injectable state passed to the sensor (and used by
//! the engine as its admission ledger) rather than ambient framework context.
//! `register` is the whole consistency story: the check-then-set is a single
//! critical section, so concurrent polls cannot double-register a key.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt::Debug;

/// A growing set of previously seen run keys.
pub trait DedupStore: Send + Sync + Debug {
    /// Atomically records `key`. Returns true when the key was newly
    /// inserted, false when it was already present.
    fn register(&self, key: &str) -> bool;

    /// Whether `key` has been recorded.
    fn contains(&self, key: &str) -> bool;

    /// Recorded keys, sorted lexicographically.
    fn keys(&self) -> Vec<String>;

    /// Number of recorded keys.
    fn len(&self) -> usize;

    /// Returns true if nothing has been recorded.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory dedup store scoped to the process lifetime.
#[derive(Debug, Default)]
pub struct InMemoryDedupStore {
    seen: Mutex<HashSet<String>>,
}

impl InMemoryDedupStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with keys, for tests and recovery.
    #[must_use]
    pub fn with_keys(keys: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            seen: Mutex::new(keys.into_iter().map(Into::into).collect()),
        }
    }
}

impl DedupStore for InMemoryDedupStore {
    fn register(&self, key: &str) -> bool {
        self.seen.lock().insert(key.to_string())
    }

    fn contains(&self, key: &str) -> bool {
        self.seen.lock().contains(key)
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.seen.lock().iter().cloned().collect();
        keys.sort_unstable();
        keys
    }

    fn len(&self) -> usize {
        self.seen.lock().len()
    }
}
