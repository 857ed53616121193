//! Time-triggered scheduling.
//!
//! On each clock tick matching the cron expression the scheduler emits
//! exactly one untagged run request. Ticks missed while the process is down
//! are not backfilled; there are no catch-up semantics.

use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;

use crate::config::{ResourceSettings, RunConfig};
use crate::errors::{ConfigError, StockflowError};
use crate::partitions::{PartitionKey, PartitionSet};
use crate::run::{Engine, RunRequest};

/// Cron-driven trigger emitting one run request per matching tick.
#[derive(Debug, Clone)]
pub struct CronScheduler {
    name: String,
    schedule: Schedule,
    input_key: String,
    settings: ResourceSettings,
}

impl CronScheduler {
    /// Creates a scheduler from a cron expression and a fixed input key.
    ///
    /// Standard 5-field expressions are accepted and evaluated at second
    /// zero; 6-field expressions carry their own seconds field. An
    /// unparseable expression is a configuration error.
    pub fn new(
        name: impl Into<String>,
        expression: &str,
        input_key: impl Into<String>,
        settings: ResourceSettings,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let normalized = normalize_expression(expression);
        let schedule = Schedule::from_str(&normalized).map_err(|e| {
            ConfigError::new(format!("invalid cron expression '{expression}': {e}"))
        })?;
        Ok(Self {
            name: name.into(),
            schedule,
            input_key: input_key.into(),
            settings,
        })
    }

    /// Creates a scheduler whose configuration is derived from one partition,
    /// using the partition set's naming convention and settings.
    pub fn for_partition(
        name: impl Into<String>,
        expression: &str,
        partitions: &PartitionSet,
        key: &PartitionKey,
    ) -> Result<Self, ConfigError> {
        if !partitions.keys().contains(key) {
            return Err(ConfigError::new(format!("unknown partition key '{key}'")));
        }
        Self::new(
            name,
            expression,
            partitions.input_key_for(key),
            partitions.settings().clone(),
        )
    }

    /// The scheduler name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a tick matches the cron expression.
    #[must_use]
    pub fn matches(&self, tick: DateTime<Utc>) -> bool {
        self.schedule.includes(tick)
    }

    /// The next matching tick strictly after `after`.
    #[must_use]
    pub fn next_tick(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }

    /// Evaluates one clock tick.
    ///
    /// Emits exactly one request for a matching tick, `None` otherwise. A
    /// builder failure propagates to the caller and schedules nothing; the
    /// next tick is unaffected.
    pub fn evaluate_tick(
        &self,
        tick: DateTime<Utc>,
    ) -> Result<Option<RunRequest>, StockflowError> {
        if !self.matches(tick) {
            return Ok(None);
        }
        let config = RunConfig::build(&self.input_key, &self.settings)?;
        tracing::info!(scheduler = %self.name, tick = %tick, "cron tick fired");
        Ok(Some(RunRequest::new(config)))
    }

    /// Drives the schedule against an engine, sleeping until each upcoming
    /// tick. A failed tick is logged and the loop moves on to the next one.
    pub async fn run(&self, engine: &Engine) {
        loop {
            let Some(next) = self.next_tick(Utc::now()) else {
                tracing::info!(scheduler = %self.name, "schedule exhausted");
                return;
            };
            let wait = (next - Utc::now()).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            match self.evaluate_tick(next) {
                Ok(Some(request)) => {
                    let outcome = engine.submit(request).await;
                    tracing::debug!(scheduler = %self.name, ?outcome, "scheduled run finished");
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(scheduler = %self.name, error = %e, "tick failed");
                }
            }
        }
    }
}

/// Prepends a zero seconds field to classic 5-field cron expressions.
fn normalize_expression(expression: &str) -> String {
    if expression.split_whitespace().count() == 5 {
        format!("0 {expression}")
    } else {
        expression.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn scheduler(expression: &str) -> CronScheduler {
        CronScheduler::new(
            "stock_schedule",
            expression,
            "prefix/stock_9.csv",
            ResourceSettings::docker(),
        )
        .unwrap()
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_matching_tick_emits_one_request() {
        let scheduler = scheduler("*/15 * * * *");

        let request = scheduler.evaluate_tick(at(0, 15, 0)).unwrap().unwrap();
        assert_eq!(request.run_key, None);
        assert_eq!(request.run_config.input_key(), "prefix/stock_9.csv");
    }

    #[test]
    fn test_non_matching_tick_emits_nothing() {
        let scheduler = scheduler("*/15 * * * *");

        assert!(scheduler.evaluate_tick(at(0, 7, 0)).unwrap().is_none());
        assert!(scheduler.evaluate_tick(at(0, 15, 30)).unwrap().is_none());
    }

    #[test]
    fn test_hourly_expression() {
        let scheduler = scheduler("0 * * * *");

        assert!(scheduler.matches(at(3, 0, 0)));
        assert!(!scheduler.matches(at(3, 1, 0)));
    }

    #[test]
    fn test_next_tick() {
        let scheduler = scheduler("0 * * * *");
        assert_eq!(scheduler.next_tick(at(3, 20, 0)), Some(at(4, 0, 0)));
    }

    #[test]
    fn test_invalid_expression_is_config_error() {
        let err = CronScheduler::new(
            "bad",
            "not a cron line",
            "prefix/stock_1.csv",
            ResourceSettings::docker(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid cron expression"));
    }

    #[test]
    fn test_partition_derived_config_matches_sensor_shape() {
        let partitions = PartitionSet::numeric(1..=10, "prefix", ResourceSettings::docker());
        let scheduler = CronScheduler::for_partition(
            "stock_schedule",
            "0 * * * *",
            &partitions,
            &PartitionKey::from("4"),
        )
        .unwrap();

        let request = scheduler.evaluate_tick(at(5, 0, 0)).unwrap().unwrap();

        // Identical shape to what the sensor would build for the same key.
        let sensed =
            RunConfig::build("prefix/stock_4.csv", &ResourceSettings::docker()).unwrap();
        assert_eq!(
            serde_json::to_value(&request.run_config).unwrap(),
            serde_json::to_value(&sensed).unwrap()
        );
    }

    #[test]
    fn test_for_partition_rejects_unknown_key() {
        let partitions = PartitionSet::numeric(1..=10, "prefix", ResourceSettings::docker());
        assert!(CronScheduler::for_partition(
            "stock_schedule",
            "0 * * * *",
            &partitions,
            &PartitionKey::from("42"),
        )
        .is_err());
    }
}
