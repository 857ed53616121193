//! Run requests, run outcomes, and the trigger-to-engine boundary.

mod dedup;

pub use dedup::{DedupStore, InMemoryDedupStore};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::RunConfig;
use crate::pipeline::{RunSummary, StockPipeline};

/// A request to start one run, created by a trigger.
///
/// Consumed at most once meaningfully by the engine: a repeated `run_key` is
/// a no-op for the engine, though the trigger still logically emits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Deduplication token. `None` for scheduled runs.
    pub run_key: Option<String>,
    /// The configuration the run executes with.
    pub run_config: RunConfig,
}

impl RunRequest {
    /// Creates an untagged request (scheduled runs).
    #[must_use]
    pub fn new(run_config: RunConfig) -> Self {
        Self {
            run_key: None,
            run_config,
        }
    }

    /// Creates a request tagged with a deduplication token (sensor runs).
    #[must_use]
    pub fn with_run_key(run_key: impl Into<String>, run_config: RunConfig) -> Self {
        Self {
            run_key: Some(run_key.into()),
            run_config,
        }
    }
}

/// Engine-owned outcome of a submitted run request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunOutcome {
    /// The run reached the success terminal state.
    Success(RunSummary),
    /// The run failed after exhausting its retry policy.
    Failed(RunSummary),
    /// The request repeated an already-admitted run key. Documented no-op,
    /// not an error.
    DuplicateSuppressed {
        /// The repeated key.
        run_key: String,
    },
}

impl RunOutcome {
    /// Returns true for successful runs.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The run summary, when an execution actually happened.
    #[must_use]
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            Self::Success(summary) | Self::Failed(summary) => Some(summary),
            Self::DuplicateSuppressed { .. } => None,
        }
    }
}

/// The execution engine boundary both triggers submit to.
///
/// Keeps its own admission ledger for run keys, distinct from the sensor's
/// cursor: the sensor registers keys at emission time, so sharing one store
/// would suppress every sensor-issued request.
pub struct Engine {
    pipeline: Arc<StockPipeline>,
    admitted: Arc<dyn DedupStore>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("pipeline", &self.pipeline)
            .field("admitted", &self.admitted)
            .finish()
    }
}

impl Engine {
    /// Creates an engine with a fresh in-memory admission ledger.
    #[must_use]
    pub fn new(pipeline: StockPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            admitted: Arc::new(InMemoryDedupStore::new()),
        }
    }

    /// Replaces the admission ledger.
    #[must_use]
    pub fn with_admission_ledger(mut self, ledger: Arc<dyn DedupStore>) -> Self {
        self.admitted = ledger;
        self
    }

    /// The pipeline this engine runs.
    #[must_use]
    pub fn pipeline(&self) -> &StockPipeline {
        &self.pipeline
    }

    /// Submits a run request.
    ///
    /// Requests carrying a run key are admitted at most once; repeats are
    /// suppressed without touching the pipeline.
    pub async fn submit(&self, request: RunRequest) -> RunOutcome {
        if let Some(run_key) = &request.run_key {
            if !self.admitted.register(run_key) {
                tracing::debug!(run_key = %run_key, "duplicate run request suppressed");
                return RunOutcome::DuplicateSuppressed {
                    run_key: run_key.clone(),
                };
            }
        }

        let summary = self.pipeline.execute(&request.run_config).await;
        if summary.success {
            RunOutcome::Success(summary)
        } else {
            RunOutcome::Failed(summary)
        }
    }
}
