//! End-to-end tests wiring both triggers to the engine over in-memory
//! collaborators.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

use crate::config::{Profiles, RunConfig};
use crate::partitions::{PartitionKey, PartitionSet};
use crate::pipeline::{RetryPolicy, StockPipeline};
use crate::resources::{InMemoryKeyValueStore, InMemoryObjectStorage};
use crate::run::{DedupStore, Engine, InMemoryDedupStore, RunOutcome};
use crate::triggers::{CronScheduler, PollingSensor, SensorEvaluation};

fn row(date: &str, high: f64) -> Vec<String> {
    vec![
        date.to_string(),
        "1.0".to_string(),
        high.to_string(),
        "1.0".to_string(),
        "1.0".to_string(),
        "100".to_string(),
    ]
}

struct Harness {
    storage: Arc<InMemoryObjectStorage>,
    kv: Arc<InMemoryKeyValueStore>,
    cursor: Arc<InMemoryDedupStore>,
    engine: Engine,
    sensor: PollingSensor,
}

fn harness() -> Harness {
    let settings = Profiles::builtin().resolve("local").unwrap();
    let storage = Arc::new(InMemoryObjectStorage::new());
    let kv = Arc::new(InMemoryKeyValueStore::new());
    let cursor = Arc::new(InMemoryDedupStore::new());

    let pipeline = StockPipeline::new("stock_pipeline", storage.clone(), kv.clone())
        .with_retry_policy(RetryPolicy::new(2, Duration::from_millis(1)));
    let engine = Engine::new(pipeline);

    let sensor = PollingSensor::new(
        "stock_sensor",
        storage.clone(),
        settings,
        "prefix",
        cursor.clone(),
        Duration::ZERO,
    )
    .unwrap();

    Harness {
        storage,
        kv,
        cursor,
        engine,
        sensor,
    }
}

#[tokio::test]
async fn sensor_discovers_runs_and_persists_results() {
    let h = harness();
    h.storage.seed(
        "prefix/stock_1.csv",
        vec![row("2022-01-03", 10.0), row("2022-01-04", 25.0)],
    );

    let requests = match h.sensor.evaluate().await.unwrap() {
        SensorEvaluation::Requests(requests) => requests,
        SensorEvaluation::Skip(reason) => panic!("unexpected skip: {reason}"),
    };
    assert_eq!(requests.len(), 1);

    for request in requests {
        let outcome = h.engine.submit(request).await;
        assert!(outcome.is_success());
    }

    assert_eq!(h.kv.get("2022-01-04").as_deref(), Some("25"));
    assert!(h.storage.written().contains_key("2022-01-04"));

    // Unchanged storage: the second poll triggers nothing.
    assert!(h.sensor.evaluate().await.unwrap().is_skip());
}

#[tokio::test]
async fn resubmitting_a_sensor_request_is_suppressed() {
    let h = harness();
    h.storage.seed("prefix/stock_1.csv", vec![row("2022-01-03", 10.0)]);

    let requests = match h.sensor.evaluate().await.unwrap() {
        SensorEvaluation::Requests(requests) => requests,
        SensorEvaluation::Skip(reason) => panic!("unexpected skip: {reason}"),
    };
    let request = requests.into_iter().next().unwrap();

    assert!(h.engine.submit(request.clone()).await.is_success());
    assert!(matches!(
        h.engine.submit(request).await,
        RunOutcome::DuplicateSuppressed { .. }
    ));
}

#[tokio::test]
async fn new_files_between_polls_trigger_only_the_new_keys() {
    let h = harness();
    h.storage.seed("prefix/stock_1.csv", vec![row("2022-01-03", 10.0)]);
    h.sensor.evaluate().await.unwrap();

    h.storage.seed("prefix/stock_2.csv", vec![row("2022-01-05", 30.0)]);
    match h.sensor.evaluate().await.unwrap() {
        SensorEvaluation::Requests(requests) => {
            assert_eq!(requests.len(), 1);
            assert_eq!(requests[0].run_key.as_deref(), Some("prefix/stock_2.csv"));
        }
        SensorEvaluation::Skip(reason) => panic!("unexpected skip: {reason}"),
    }
    assert_eq!(h.cursor.len(), 2);
}

#[tokio::test]
async fn scheduled_and_sensed_configs_share_one_shape() {
    let settings = Profiles::builtin().resolve("docker").unwrap();
    let partitions = PartitionSet::numeric(1..=10, "prefix", settings.clone());

    let scheduler = CronScheduler::for_partition(
        "stock_schedule",
        "0 * * * *",
        &partitions,
        &PartitionKey::from("4"),
    )
    .unwrap();

    let tick = Utc.with_ymd_and_hms(2022, 1, 1, 2, 0, 0).unwrap();
    let scheduled = scheduler.evaluate_tick(tick).unwrap().unwrap();

    let sensed = RunConfig::build("prefix/stock_4.csv", &settings).unwrap();
    assert_eq!(scheduled.run_config, sensed);
}

#[tokio::test]
async fn scheduled_run_executes_through_the_engine() {
    let h = harness();
    h.storage.seed("prefix/stock_9.csv", vec![row("2022-01-07", 42.0)]);

    let settings = Profiles::builtin().resolve("local").unwrap();
    let scheduler =
        CronScheduler::new("stock_schedule", "*/15 * * * *", "prefix/stock_9.csv", settings)
            .unwrap();

    let tick = Utc.with_ymd_and_hms(2022, 1, 1, 0, 15, 0).unwrap();
    let request = scheduler.evaluate_tick(tick).unwrap().unwrap();

    let outcome = h.engine.submit(request).await;
    let summary = outcome.summary().unwrap();
    assert!(summary.success);
    assert_eq!(h.kv.get("2022-01-07").as_deref(), Some("42"));

    // Scheduled requests carry no dedup token; a repeat tick runs again.
    let repeat = scheduler.evaluate_tick(tick).unwrap().unwrap();
    assert!(h.engine.submit(repeat).await.is_success());
}
