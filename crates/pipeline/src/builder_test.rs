//! Tests for pipeline construction and supervision

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use super::*;
use crate::channel::Channel;
use crate::stage::Constructor;
use crate::test_stages::{self, collected};

fn new_other_channel(capacity: usize) -> ChannelRef {
    Arc::new(Channel::<u8>::new("OtherChan", capacity))
}

fn emitter(count: i64, out: &str) -> StageConfig {
    StageConfig::new("Emitter")
        .with_output(out)
        .with_option("count", count)
}

fn collector(sink: &str, input: &str) -> StageConfig {
    StageConfig::new("Collector")
        .with_input(input)
        .with_option("sink", sink)
}

async fn run_to_end(pipeline: Pipeline) -> Result<()> {
    timeout(Duration::from_secs(5), pipeline.wait())
        .await
        .expect("pipeline did not finish")
}

#[tokio::test]
async fn test_linear_pipeline_delivers_in_order() {
    let registry = test_stages::registry();
    let stages = vec![
        emitter(5, "flat RecordChan"),
        collector("linear", "flat RecordChan"),
    ];

    let pipeline = PipelineBuilder::new(&registry)
        .with_default_capacity(2)
        .build(&stages)
        .await
        .unwrap();
    assert_eq!(pipeline.len(), 2);
    assert_eq!(pipeline.channel_count(), 1);
    assert_eq!(pipeline.stage_names(), vec!["Emitter", "Collector"]);

    run_to_end(pipeline).await.unwrap();
    assert_eq!(collected("linear"), vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn test_handler_stage() {
    let registry = test_stages::registry();
    let stages = vec![
        StageConfig::new("Ticker")
            .with_handler("Relay")
            .with_output("flat RecordChan")
            .with_option("count", 4i64),
        collector("handler", "flat RecordChan"),
    ];

    let pipeline = PipelineBuilder::new(&registry).build(&stages).await.unwrap();
    assert_eq!(pipeline.stage_names(), vec!["Ticker/Relay", "Collector"]);

    run_to_end(pipeline).await.unwrap();
    assert_eq!(collected("handler"), vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn test_fan_out_shares_named_channels() {
    let registry = test_stages::registry();
    let stages = vec![
        StageConfig::new("Emitter")
            .with_output("a RecordChan")
            .with_output("b RecordChan")
            .with_option("count", 2i64),
        collector("fan-a", "a RecordChan"),
        collector("fan-b", "b RecordChan"),
    ];

    let pipeline = PipelineBuilder::new(&registry).build(&stages).await.unwrap();
    assert_eq!(pipeline.channel_count(), 2);

    run_to_end(pipeline).await.unwrap();
    assert_eq!(collected("fan-a"), vec![0, 1]);
    assert_eq!(collected("fan-b"), vec![0, 1]);
}

#[tokio::test]
async fn test_malformed_channel_spec_fails_before_start() {
    let registry = test_stages::registry();
    let stages = vec![
        emitter(3, "flat RecordChan"),
        collector("malformed", "flat"),
    ];

    let err = PipelineBuilder::new(&registry)
        .build(&stages)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidChannelSpec { .. }));

    // nothing ran, so nothing was collected
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(collected("malformed").is_empty());
}

#[tokio::test]
async fn test_output_without_consumer_fails_before_start() {
    let registry = test_stages::registry();
    let stages = vec![
        StageConfig::new("Emitter")
            .with_output("a RecordChan")
            .with_output("typo RecordChan")
            .with_option("count", -1i64),
        collector("orphan", "a RecordChan"),
    ];

    let err = PipelineBuilder::new(&registry)
        .with_default_capacity(1)
        .build(&stages)
        .await
        .unwrap_err();
    match err {
        PipelineError::UnconsumedChannel { name } => assert_eq!(name, "typo"),
        other => panic!("unexpected error: {other:?}"),
    }

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(collected("orphan").is_empty());
}

#[tokio::test]
async fn test_unknown_processor_without_module() {
    let registry = test_stages::registry();
    let stages = vec![StageConfig::new("Dedup").with_input("flat RecordChan")];

    let err = PipelineBuilder::new(&registry)
        .build(&stages)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnknownComponent { kind: "processor", .. }));
}

#[tokio::test]
async fn test_unknown_processor_with_missing_module() {
    let registry = test_stages::registry();
    let stages = vec![
        StageConfig::new("Dedup")
            .with_module("/nonexistent/libdedup.so")
            .with_input("flat RecordChan"),
    ];

    let err = PipelineBuilder::new(&registry)
        .build(&stages)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Extension(_)));
}

#[tokio::test]
async fn test_handler_flag_mismatch_fails() {
    let registry = test_stages::registry();
    let stages = vec![
        StageConfig::new("Emitter")
            .with_handler("Relay")
            .with_output("flat RecordChan"),
    ];

    let err = PipelineBuilder::new(&registry)
        .build(&stages)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::ConstructorMismatch { .. }));
}

#[tokio::test]
async fn test_channel_type_conflict() {
    let mut registry = test_stages::registry();
    registry.register("OtherChan", Constructor::Channel(new_other_channel));
    let stages = vec![
        emitter(1, "flat RecordChan"),
        collector("conflict", "flat OtherChan"),
    ];

    let err = PipelineBuilder::new(&registry)
        .build(&stages)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::ChannelTypeMismatch { .. }));
}

#[tokio::test]
async fn test_second_consumer_fails() {
    let registry = test_stages::registry();
    let stages = vec![
        emitter(1, "flat RecordChan"),
        collector("first", "flat RecordChan"),
        collector("second", "flat RecordChan"),
    ];

    let err = PipelineBuilder::new(&registry)
        .build(&stages)
        .await
        .unwrap_err();
    match err {
        PipelineError::Stage { stage, source } => {
            assert_eq!(stage, "Collector");
            assert!(source.to_string().contains("already has a consumer"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_init_failure_is_construction_error() {
    let registry = test_stages::registry();
    let stages = vec![StageConfig::new("BadInit")];

    let err = PipelineBuilder::new(&registry)
        .build(&stages)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Stage {
            source: StageError::Config(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_stage_without_outputs_rejects_them() {
    let registry = test_stages::registry();
    let stages = vec![StageConfig::new("Failing").with_output("flat RecordChan")];

    let err = PipelineBuilder::new(&registry)
        .build(&stages)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Stage {
            source: StageError::Channel(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_failed_stage_reported() {
    let registry = test_stages::registry();
    let stages = vec![
        emitter(-1, "flat RecordChan"),
        collector("failed", "flat RecordChan"),
        StageConfig::new("Failing"),
    ];

    let pipeline = PipelineBuilder::new(&registry).build(&stages).await.unwrap();
    let err = run_to_end(pipeline).await.unwrap_err();
    match err {
        PipelineError::StagesFailed(names) => assert_eq!(names, vec!["Failing".to_string()]),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_shutdown_cascades() {
    let registry = test_stages::registry();
    let cancel = CancellationToken::new();
    let stages = vec![
        emitter(-1, "flat RecordChan"),
        collector("shutdown", "flat RecordChan"),
    ];

    let pipeline = PipelineBuilder::new(&registry)
        .with_cancel_token(cancel.clone())
        .build(&stages)
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    pipeline.shutdown();
    assert!(cancel.is_cancelled());

    run_to_end(pipeline).await.unwrap();
    let seen = collected("shutdown");
    // FIFO without gaps
    assert!(seen.iter().enumerate().all(|(i, ts)| *ts == i as i64));
}

#[test]
fn test_validate_plan() {
    let registry = test_stages::registry();
    let stages = vec![
        StageConfig::new("Ticker")
            .with_handler("Relay")
            .with_output("flat RecordChan"),
        collector("unused", "flat RecordChan"),
    ];

    let plan = PipelineBuilder::new(&registry).validate(&stages).unwrap();
    assert_eq!(plan.stages, vec!["Ticker/Relay", "Collector"]);
    assert_eq!(plan.channels.get("flat").map(String::as_str), Some("RecordChan"));
}

#[test]
fn test_validate_rejects() {
    let registry = test_stages::registry();
    let builder = PipelineBuilder::new(&registry);

    let err = builder
        .validate(&[emitter(1, "flat RecordChan extra")])
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidChannelSpec { .. }));

    let err = builder
        .validate(&[emitter(1, "flat RawChan")])
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnknownComponent { kind: "channel type", .. }));

    let err = builder
        .validate(&[
            emitter(1, "flat RecordChan"),
            collector("x", "flat RecordChan"),
            collector("y", "flat RecordChan"),
        ])
        .unwrap_err();
    assert!(matches!(err, PipelineError::Stage { .. }));

    let err = builder
        .validate(&[StageConfig::new("Ticker").with_handler("Missing")])
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnknownComponent { kind: "handler", .. }));

    let err = builder
        .validate(&[
            StageConfig::new("Emitter")
                .with_output("a RecordChan")
                .with_output("typo RecordChan"),
            collector("z", "a RecordChan"),
        ])
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnconsumedChannel { ref name } if name == "typo"));
}
