//! Static partition sets.
//!
//! A partition set is a fixed, ordered list of keys known at definition time.
//! Each key maps deterministically to an input location via the
//! `{prefix}/stock_{key}.csv` naming convention, and partitions are
//! materialized into run configurations lazily.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{ResourceSettings, RunConfig};
use crate::errors::ConfigError;

/// Opaque identifier for one unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionKey(String);

impl PartitionKey {
    /// Creates a partition key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartitionKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// A fixed, enumerable set of partitions sharing one resource configuration.
#[derive(Debug, Clone)]
pub struct PartitionSet {
    keys: Vec<PartitionKey>,
    prefix: String,
    settings: ResourceSettings,
}

impl PartitionSet {
    /// Creates a partition set from explicit keys.
    #[must_use]
    pub fn new(
        keys: impl IntoIterator<Item = PartitionKey>,
        prefix: impl Into<String>,
        settings: ResourceSettings,
    ) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            prefix: prefix.into(),
            settings,
        }
    }

    /// Creates a set with numeric keys covering an inclusive range,
    /// e.g. `1..=10` gives keys "1" through "10".
    #[must_use]
    pub fn numeric(
        range: std::ops::RangeInclusive<u32>,
        prefix: impl Into<String>,
        settings: ResourceSettings,
    ) -> Self {
        Self::new(
            range.map(|n| PartitionKey::new(n.to_string())),
            prefix,
            settings,
        )
    }

    /// The partition keys, in definition order.
    #[must_use]
    pub fn keys(&self) -> &[PartitionKey] {
        &self.keys
    }

    /// The resource settings shared by every partition.
    #[must_use]
    pub fn settings(&self) -> &ResourceSettings {
        &self.settings
    }

    /// The input key a partition maps to.
    #[must_use]
    pub fn input_key_for(&self, key: &PartitionKey) -> String {
        format!("{}/stock_{}.csv", self.prefix, key)
    }

    /// Materializes the run configuration for one partition.
    ///
    /// Fails for keys outside the set and for malformed resource settings.
    pub fn config_for(&self, key: &PartitionKey) -> Result<RunConfig, ConfigError> {
        if !self.keys.contains(key) {
            return Err(ConfigError::new(format!("unknown partition key '{key}'")));
        }
        RunConfig::build(self.input_key_for(key), &self.settings)
    }
}
