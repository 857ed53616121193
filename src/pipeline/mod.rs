//! The fixed stock pipeline graph and its executor.
//!
//! Every run executes the same DAG:
//!
//! ```text
//! extract -> aggregate -> { persist_kv, persist_storage }
//! ```
//!
//! The two persist stages fan out from aggregate and run concurrently. Each
//! stage runs under the pipeline's [`RetryPolicy`]; only transient failures
//! are retried.

mod retry;

pub use retry::{execute_with_retry, RetryPolicy};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::config::RunConfig;
use crate::core::{Aggregation, Stock};
use crate::errors::StockflowError;
use crate::resources::{KeyValueStore, ObjectStorage};

/// Name of the extract stage.
pub const STAGE_EXTRACT: &str = "extract";
/// Name of the aggregate stage.
pub const STAGE_AGGREGATE: &str = "aggregate";
/// Name of the key-value persist stage.
pub const STAGE_PERSIST_KV: &str = "persist_kv";
/// Name of the object storage persist stage.
pub const STAGE_PERSIST_STORAGE: &str = "persist_storage";

/// Reduces a sequence of stock records to the aggregation with the maximum
/// `high`. Ties break to the first occurrence.
pub fn aggregate(stocks: &[Stock]) -> Result<Aggregation, StockflowError> {
    let mut best: Option<&Stock> = None;
    for stock in stocks {
        match best {
            Some(current) if stock.high <= current.high => {}
            _ => best = Some(stock),
        }
    }
    best.map(Aggregation::of).ok_or(StockflowError::EmptyInput)
}

/// Record of one completed (or failed) run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique ID for this run.
    pub run_id: Uuid,
    /// Attempts made per stage, keyed by stage name.
    pub attempts: HashMap<String, u32>,
    /// The derived aggregation, when the run got that far.
    pub aggregation: Option<Aggregation>,
    /// Total execution time in milliseconds.
    pub duration_ms: f64,
    /// Whether the run reached the success terminal state.
    pub success: bool,
    /// Error message for failed runs.
    pub error: Option<String>,
}

/// The fixed three-stage pipeline definition.
///
/// Holds the collaborators and the retry policy; one instance serves both
/// scheduled and sensor-triggered runs.
pub struct StockPipeline {
    name: String,
    storage: Arc<dyn ObjectStorage>,
    kv: Arc<dyn KeyValueStore>,
    retry_policy: RetryPolicy,
}

impl std::fmt::Debug for StockPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockPipeline")
            .field("name", &self.name)
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}

impl StockPipeline {
    /// Creates a pipeline definition with no retries.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        storage: Arc<dyn ObjectStorage>,
        kv: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            name: name.into(),
            storage,
            kv,
            retry_policy: RetryPolicy::none(),
        }
    }

    /// Attaches a retry policy. Never mutated afterwards.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// The pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The attached retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Executes one run of the graph with the given configuration.
    ///
    /// Stage failures are captured in the summary rather than returned, so a
    /// failed run still reports its per-stage attempt counts.
    pub async fn execute(&self, config: &RunConfig) -> RunSummary {
        let run_id = Uuid::new_v4();
        let start = Instant::now();
        let mut attempts = HashMap::new();
        let input_key = config.input_key();

        tracing::info!(pipeline = %self.name, run_id = %run_id, input_key, "run started");

        // extract: fetch raw rows and parse them into stock records
        let (extracted, n) =
            execute_with_retry(STAGE_EXTRACT, &self.retry_policy, || async move {
                let rows = self.storage.get(input_key).await?;
                rows.iter()
                    .map(|row| Stock::from_record(row))
                    .collect::<Result<Vec<Stock>, _>>()
            })
            .await;
        attempts.insert(STAGE_EXTRACT.to_string(), n);
        let stocks = match extracted {
            Ok(stocks) => stocks,
            Err(e) => return Self::failed(run_id, attempts, None, start, &e),
        };

        // aggregate: pure reduction, deterministic, so a retry loop adds
        // nothing beyond the single attempt
        attempts.insert(STAGE_AGGREGATE.to_string(), 1);
        let aggregation = match aggregate(&stocks) {
            Ok(aggregation) => aggregation,
            Err(e) => return Self::failed(run_id, attempts, None, start, &e),
        };

        // fan-out: persist to the key-value store and back to object storage
        let date_key = aggregation.date.to_string();
        let high_value = aggregation.high.to_string();
        let (date_key, high_value, derived) =
            (date_key.as_str(), high_value.as_str(), &aggregation);

        let kv_stage =
            execute_with_retry(STAGE_PERSIST_KV, &self.retry_policy, || async move {
                self.kv.put(date_key, high_value).await
            });
        let storage_stage =
            execute_with_retry(STAGE_PERSIST_STORAGE, &self.retry_policy, || async move {
                self.storage.put(date_key, derived).await
            });
        let ((kv_result, kv_n), (storage_result, storage_n)) =
            tokio::join!(kv_stage, storage_stage);
        attempts.insert(STAGE_PERSIST_KV.to_string(), kv_n);
        attempts.insert(STAGE_PERSIST_STORAGE.to_string(), storage_n);

        for result in [kv_result, storage_result] {
            if let Err(e) = result {
                return Self::failed(run_id, attempts, Some(aggregation), start, &e);
            }
        }

        tracing::info!(
            pipeline = %self.name,
            run_id = %run_id,
            date = %aggregation.date,
            high = aggregation.high,
            "run succeeded"
        );

        RunSummary {
            run_id,
            attempts,
            aggregation: Some(aggregation),
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
            success: true,
            error: None,
        }
    }

    fn failed(
        run_id: Uuid,
        attempts: HashMap<String, u32>,
        aggregation: Option<Aggregation>,
        start: Instant,
        error: &StockflowError,
    ) -> RunSummary {
        tracing::warn!(run_id = %run_id, error = %error, "run failed");
        RunSummary {
            run_id,
            attempts,
            aggregation,
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
            success: false,
            error: Some(error.to_string()),
        }
    }
}
