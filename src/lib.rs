//! # Stockflow
//!
//! Orchestration core for a small stock-aggregation batch pipeline.
//!
//! Every run executes a fixed three-stage graph (extract stock records from
//! object storage, aggregate to the single highest `high`, persist the result
//! to a key-value store and back to object storage). The interesting part is
//! the control logic layered over it:
//!
//! - **Partitioned configuration**: a fixed partition set materializes one
//!   [`config::RunConfig`] per partition key on demand
//! - **Cron scheduling**: one run request per matching clock tick, never
//!   backfilled
//! - **Event-driven sensing**: a polling sensor discovers new storage keys and
//!   guarantees at-most-once triggering per key via an injectable dedup store
//! - **Retry policy**: declarative per-pipeline retry consulted by the run
//!   engine on transient stage failures
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stockflow::prelude::*;
//!
//! let settings = Profiles::builtin().resolve("local")?;
//! let pipeline = StockPipeline::new("stock_pipeline", storage.clone(), kv)
//!     .with_retry_policy(RetryPolicy::new(2, Duration::from_secs(1)));
//! let engine = Engine::new(pipeline);
//!
//! let sensor = PollingSensor::new("stock_sensor", storage, settings, "prefix", cursor, interval)?;
//! if let SensorEvaluation::Requests(requests) = sensor.evaluate().await? {
//!     for request in requests {
//!         engine.submit(request).await;
//!     }
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod observability;
pub mod partitions;
pub mod pipeline;
pub mod resources;
pub mod run;
pub mod triggers;

#[cfg(test)]
mod integration_tests;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        ExtractParams, KvSettings, Profiles, ResourceSettings, RunConfig, StageParams,
        StorageSettings,
    };
    pub use crate::core::{Aggregation, Stock};
    pub use crate::errors::{ConfigError, StockflowError};
    pub use crate::partitions::{PartitionKey, PartitionSet};
    pub use crate::pipeline::{aggregate, RetryPolicy, RunSummary, StockPipeline};
    pub use crate::resources::{
        InMemoryKeyValueStore, InMemoryObjectStorage, KeyValueStore, ObjectStorage,
    };
    pub use crate::run::{DedupStore, Engine, InMemoryDedupStore, RunOutcome, RunRequest};
    pub use crate::triggers::{CronScheduler, PollingSensor, SensorEvaluation};
}
