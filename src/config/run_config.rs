//! Run configuration and its builder.
//!
//! A [`RunConfig`] is an immutable value fully determined by an input key and
//! a set of resource settings. Both triggers build configs through the same
//! function, so a scheduled run and a sensor-triggered run produce identical
//! shapes at the trigger-to-engine boundary.

use serde::{Deserialize, Serialize};

use super::ResourceSettings;
use crate::errors::ConfigError;

/// Parameters for the extract stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractParams {
    /// Object storage key of the input file.
    pub input_key: String,
}

/// Per-stage parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageParams {
    /// Extract stage parameters.
    pub extract: ExtractParams,
}

/// Complete configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Resource settings shared by every stage.
    pub resources: ResourceSettings,
    /// Per-stage parameters.
    pub stage_params: StageParams,
}

impl RunConfig {
    /// Builds a run configuration from an input key and resource settings.
    ///
    /// Pure and deterministic: repeated calls with the same arguments yield
    /// identical configs. Fails only on malformed resource settings.
    pub fn build(
        input_key: impl Into<String>,
        settings: &ResourceSettings,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            resources: settings.clone(),
            stage_params: StageParams {
                extract: ExtractParams {
                    input_key: input_key.into(),
                },
            },
        })
    }

    /// The object storage key this run will extract from.
    #[must_use]
    pub fn input_key(&self) -> &str {
        &self.stage_params.extract.input_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_is_deterministic() {
        let settings = ResourceSettings::docker();
        let a = RunConfig::build("prefix/stock_9.csv", &settings).unwrap();
        let b = RunConfig::build("prefix/stock_9.csv", &settings).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.input_key(), "prefix/stock_9.csv");
    }

    #[test]
    fn test_build_rejects_malformed_settings() {
        let mut settings = ResourceSettings::docker();
        settings.storage.endpoint_url = String::new();

        assert!(RunConfig::build("prefix/stock_1.csv", &settings).is_err());
    }

    #[test]
    fn test_serialized_shape_is_uniform() {
        let settings = ResourceSettings::docker();
        let scheduled = RunConfig::build("prefix/stock_4.csv", &settings).unwrap();
        let sensed = RunConfig::build("prefix/stock_4.csv", &settings).unwrap();

        let a = serde_json::to_value(&scheduled).unwrap();
        let b = serde_json::to_value(&sensed).unwrap();
        assert_eq!(a, b);
        assert!(a.pointer("/stage_params/extract/input_key").is_some());
        assert!(a.pointer("/resources/storage/bucket").is_some());
    }
}
