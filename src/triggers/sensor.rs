//! Event-triggered sensing of new storage objects.
//!
//! The sensor polls object storage at a bounded minimum interval, filters
//! out keys already recorded in its dedup cursor, and emits one run request
//! per new key, tagged with the key as its deduplication token. Keys are
//! registered at emission time, not on successful execution: a slow run must
//! not be re-triggered by the next poll, and a run that fails outright is
//! recovered by the pipeline's stage-level retry policy, never by
//! re-triggering.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{ResourceSettings, RunConfig};
use crate::errors::{ConfigError, StockflowError};
use crate::resources::ObjectStorage;
use crate::run::{DedupStore, Engine, RunRequest};

/// The result of one sensor poll.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvaluation {
    /// Nothing to trigger; carries a human-readable reason.
    Skip(String),
    /// One request per newly discovered key, in lexicographic order.
    Requests(Vec<RunRequest>),
}

impl SensorEvaluation {
    /// Returns true when the poll produced no requests.
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip(_))
    }
}

/// Polling sensor over an object storage prefix.
///
/// Storage settings come from the same [`ResourceSettings`] the pipeline
/// runs with, so the sensor cannot drift from the job it feeds.
pub struct PollingSensor {
    name: String,
    storage: Arc<dyn ObjectStorage>,
    settings: ResourceSettings,
    prefix: String,
    cursor: Arc<dyn DedupStore>,
    minimum_interval: Duration,
    last_poll: parking_lot::Mutex<Option<Instant>>,
    poll_guard: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for PollingSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingSensor")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("minimum_interval", &self.minimum_interval)
            .finish_non_exhaustive()
    }
}

impl PollingSensor {
    /// Creates a sensor. Settings are validated once, up front.
    pub fn new(
        name: impl Into<String>,
        storage: Arc<dyn ObjectStorage>,
        settings: ResourceSettings,
        prefix: impl Into<String>,
        cursor: Arc<dyn DedupStore>,
        minimum_interval: Duration,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self {
            name: name.into(),
            storage,
            settings,
            prefix: prefix.into(),
            cursor,
            minimum_interval,
            last_poll: parking_lot::Mutex::new(None),
            poll_guard: tokio::sync::Mutex::new(()),
        })
    }

    /// The sensor name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The dedup cursor in use.
    #[must_use]
    pub fn cursor(&self) -> &Arc<dyn DedupStore> {
        &self.cursor
    }

    /// Runs one poll cycle.
    ///
    /// At most one poll is in flight at a time, and the minimum interval is
    /// a hard floor: a call arriving early skips without querying storage. A
    /// storage listing failure surfaces as a transient error, leaves the
    /// cursor unchanged, and the sensor stays pollable.
    pub async fn evaluate(&self) -> Result<SensorEvaluation, StockflowError> {
        let _in_flight = self.poll_guard.lock().await;

        {
            let mut last_poll = self.last_poll.lock();
            if let Some(last) = *last_poll {
                if last.elapsed() < self.minimum_interval {
                    return Ok(SensorEvaluation::Skip(format!(
                        "minimum interval of {}s has not elapsed since the last poll",
                        self.minimum_interval.as_secs_f64()
                    )));
                }
            }
            // A failed poll still counts towards the interval floor.
            *last_poll = Some(Instant::now());
        }

        let bucket = &self.settings.storage.bucket;
        let discovered = self.storage.list_keys(bucket, &self.prefix).await?;

        let mut new_keys: Vec<String> = discovered
            .into_iter()
            .filter(|key| !self.cursor.contains(key))
            .collect();
        // Discovery order is not guaranteed; emit lexicographically.
        new_keys.sort_unstable();

        let mut requests = Vec::with_capacity(new_keys.len());
        for key in new_keys {
            let config = RunConfig::build(&key, &self.settings)?;
            if self.cursor.register(&key) {
                requests.push(RunRequest::with_run_key(key, config));
            }
        }

        if requests.is_empty() {
            let reason = format!("No new files found under {bucket}/{}.", self.prefix);
            tracing::debug!(sensor = %self.name, reason = %reason, "poll skipped");
            return Ok(SensorEvaluation::Skip(reason));
        }

        tracing::info!(sensor = %self.name, count = requests.len(), "emitting run requests");
        Ok(SensorEvaluation::Requests(requests))
    }

    /// Drives the sensor against an engine, polling at the minimum interval.
    /// Transient poll failures are logged; the next interval proceeds as
    /// usual.
    pub async fn run(&self, engine: &Engine) {
        loop {
            match self.evaluate().await {
                Ok(SensorEvaluation::Requests(requests)) => {
                    for request in requests {
                        let outcome = engine.submit(request).await;
                        tracing::debug!(sensor = %self.name, ?outcome, "sensor run finished");
                    }
                }
                Ok(SensorEvaluation::Skip(reason)) => {
                    tracing::info!(sensor = %self.name, reason = %reason, "nothing to trigger");
                }
                Err(e) => {
                    tracing::warn!(sensor = %self.name, error = %e, "poll failed");
                }
            }
            tokio::time::sleep(self.minimum_interval).await;
        }
    }
}
