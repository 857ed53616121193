//! In-memory collaborator implementations for tests and local profiles.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use super::{KeyValueStore, ObjectStorage};
use crate::core::Aggregation;
use crate::errors::StockflowError;

/// In-memory object storage keyed by object key.
///
/// `get` serves seeded record rows; `put` records written aggregations so
/// tests can assert on them. Listing ignores the bucket argument.
#[derive(Debug, Default)]
pub struct InMemoryObjectStorage {
    records: Mutex<HashMap<String, Vec<Vec<String>>>>,
    written: Mutex<HashMap<String, Aggregation>>,
}

impl InMemoryObjectStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds record rows under an object key.
    pub fn seed(&self, key: impl Into<String>, rows: Vec<Vec<String>>) {
        self.records.lock().insert(key.into(), rows);
    }

    /// Aggregations written via `put`, keyed by object key.
    #[must_use]
    pub fn written(&self) -> HashMap<String, Aggregation> {
        self.written.lock().clone()
    }
}

#[async_trait]
impl ObjectStorage for InMemoryObjectStorage {
    async fn get(&self, key: &str) -> Result<Vec<Vec<String>>, StockflowError> {
        self.records
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| StockflowError::transient("get", format!("no object at '{key}'")))
    }

    async fn put(&self, key: &str, value: &Aggregation) -> Result<(), StockflowError> {
        self.written.lock().insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn list_keys(
        &self,
        _bucket: &str,
        prefix: &str,
    ) -> Result<Vec<String>, StockflowError> {
        let keys = self
            .records
            .lock()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        Ok(keys)
    }
}

/// In-memory key-value store.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a value back, for assertions.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn put(&self, key: &str, value: &str) -> Result<(), StockflowError> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
