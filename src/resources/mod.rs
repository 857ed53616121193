//! External collaborator interfaces.
//!
//! The object storage and key-value store clients are specified only at
//! their interface; any failure they surface is a [`StockflowError`] the
//! caller maps to a stage or poll failure.

mod memory;

pub use memory::{InMemoryKeyValueStore, InMemoryObjectStorage};

use async_trait::async_trait;

use crate::core::Aggregation;
use crate::errors::StockflowError;

/// Client for the object storage collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Fetches the raw record rows stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<Vec<String>>, StockflowError>;

    /// Writes an aggregation under `key`.
    async fn put(&self, key: &str, value: &Aggregation) -> Result<(), StockflowError>;

    /// Lists object keys under `prefix` in `bucket`. Used only by the sensor.
    async fn list_keys(&self, bucket: &str, prefix: &str)
        -> Result<Vec<String>, StockflowError>;
}

/// Client for the key-value store collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Writes a string value under `key`.
    async fn put(&self, key: &str, value: &str) -> Result<(), StockflowError>;
}
