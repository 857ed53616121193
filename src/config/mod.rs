//! Resource settings, named environment profiles, and run configuration.
//!
//! All triggers draw storage settings from one resolved [`ResourceSettings`]
//! value, so a sensor can never drift from the pipeline it feeds. Profiles
//! are resolved by name at startup and validated once.

mod run_config;

pub use run_config::{ExtractParams, RunConfig, StageParams};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::ConfigError;

/// Connection settings for the object storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Bucket holding the stock files.
    pub bucket: String,
    /// Access key for the storage endpoint.
    pub access_key: String,
    /// Secret key for the storage endpoint.
    pub secret_key: String,
    /// Endpoint URL.
    pub endpoint_url: String,
}

/// Connection settings for the key-value store collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvSettings {
    /// Key-value store host.
    pub host: String,
    /// Key-value store port.
    pub port: u16,
}

/// The full set of resource settings a run needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSettings {
    /// Object storage settings.
    pub storage: StorageSettings,
    /// Key-value store settings.
    pub kv: KvSettings,
}

impl ResourceSettings {
    /// Settings for local development against in-memory collaborators.
    #[must_use]
    pub fn local() -> Self {
        Self {
            storage: StorageSettings {
                bucket: "stockflow".to_string(),
                access_key: "test".to_string(),
                secret_key: "test".to_string(),
                endpoint_url: "http://localhost:4566".to_string(),
            },
            kv: KvSettings {
                host: "localhost".to_string(),
                port: 6379,
            },
        }
    }

    /// Settings for the containerized deployment.
    #[must_use]
    pub fn docker() -> Self {
        Self {
            storage: StorageSettings {
                bucket: "stockflow".to_string(),
                access_key: "test".to_string(),
                secret_key: "test".to_string(),
                endpoint_url: "http://localstack:4566".to_string(),
            },
            kv: KvSettings {
                host: "redis".to_string(),
                port: 6379,
            },
        }
    }

    /// Validates the settings. Every field must be populated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty("storage.bucket", &self.storage.bucket)?;
        require_non_empty("storage.access_key", &self.storage.access_key)?;
        require_non_empty("storage.secret_key", &self.storage.secret_key)?;
        require_non_empty("storage.endpoint_url", &self.storage.endpoint_url)?;
        require_non_empty("kv.host", &self.kv.host)?;
        if self.kv.port == 0 {
            return Err(ConfigError::for_field("kv.port", "port must be non-zero"));
        }
        Ok(())
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::for_field(
            field,
            format!("{field} must not be empty"),
        ));
    }
    Ok(())
}

/// Named environment profiles resolved at startup.
///
/// Replaces ad hoc per-environment dictionary merging with a single schema
/// validated at resolution time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profiles {
    profiles: HashMap<String, ResourceSettings>,
}

impl Profiles {
    /// Creates an empty profile registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the `local` and `docker` profiles.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new()
            .with_profile("local", ResourceSettings::local())
            .with_profile("docker", ResourceSettings::docker())
    }

    /// Adds or replaces a named profile.
    #[must_use]
    pub fn with_profile(mut self, name: impl Into<String>, settings: ResourceSettings) -> Self {
        self.profiles.insert(name.into(), settings);
        self
    }

    /// Resolves and validates a profile by name.
    pub fn resolve(&self, name: &str) -> Result<ResourceSettings, ConfigError> {
        let settings = self
            .profiles
            .get(name)
            .ok_or_else(|| ConfigError::new(format!("unknown profile '{name}'")))?;
        settings.validate()?;
        Ok(settings.clone())
    }

    /// Profile names in the registry.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
