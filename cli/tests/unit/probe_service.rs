//! Unit tests for the connection-test flow.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use pocket_cli::application::services::cleanup::ResourceRegistry;
use pocket_cli::application::services::probe::{ProbeRequest, run_probe};
use pocket_cli::domain::{LifecyclePhase, PocketError, ProbeVerdict};
use pocket_common::{Backend, ConnectionTarget};
use tokio_util::sync::CancellationToken;

use crate::mocks::{FakeCluster, RecordingReporter};

fn request(backend: Backend, conn: &str) -> ProbeRequest {
    ProbeRequest {
        target: ConnectionTarget::parse(backend, conn).unwrap(),
        namespace: "default".to_string(),
        image: backend.default_image().to_string(),
        timeout: Duration::from_secs(30),
        poll_interval: Duration::from_secs(1),
        cleanup_timeout: Duration::from_secs(10),
    }
}

#[tokio::test(start_paused = true)]
async fn successful_probe_reports_output_and_deletes_pod() {
    let api = Arc::new(
        FakeCluster::new()
            .with_phases([LifecyclePhase::Pending, LifecyclePhase::Succeeded])
            .with_logs("PONG\n"),
    );
    let registry = Arc::new(ResourceRegistry::new());
    let reporter = RecordingReporter::default();

    let outcome = run_probe(
        Arc::clone(&api),
        Arc::clone(&registry),
        &request(Backend::Redis, "redis://:s3cret@redis-svc:6380"),
        &reporter,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.verdict, ProbeVerdict::Success);
    assert_eq!(outcome.report.output, "PONG");
    assert_eq!(outcome.report.target, "redis-svc:6380");

    let created = api.created();
    assert_eq!(created.len(), 1);
    assert!(created[0].name.starts_with("pocket-redis-"));
    assert_eq!(created[0].args, vec!["-h", "redis-svc", "-p", "6380", "PING"]);
    assert_eq!(api.deleted(), vec![created[0].name.clone()]);
    assert!(registry.outstanding().is_empty());
    assert!(!reporter.events().iter().any(|e| e.contains("s3cret")));
}

#[tokio::test(start_paused = true)]
async fn output_without_marker_is_a_failed_verdict() {
    let api = Arc::new(
        FakeCluster::new()
            .with_phases([LifecyclePhase::Succeeded])
            .with_logs("ERROR: auth failed"),
    );

    let outcome = run_probe(
        Arc::clone(&api),
        Arc::new(ResourceRegistry::new()),
        &request(Backend::Redis, "redis-svc"),
        &RecordingReporter::default(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.verdict, ProbeVerdict::MarkerMissing("PONG"));
    assert!(!outcome.report.success);
    assert_eq!(api.deleted().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_pod_is_a_failed_verdict() {
    let api = Arc::new(
        FakeCluster::new()
            .with_phases([LifecyclePhase::Failed])
            .with_logs("psql: error: connection refused"),
    );

    let outcome = run_probe(
        Arc::clone(&api),
        Arc::new(ResourceRegistry::new()),
        &request(Backend::Postgres, "postgres://app@pg-svc/app"),
        &RecordingReporter::default(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.verdict, ProbeVerdict::PhaseFailed(LifecyclePhase::Failed));
    assert_eq!(outcome.report.phase, LifecyclePhase::Failed);
}

#[tokio::test(start_paused = true)]
async fn timeout_still_deletes_the_pod() {
    let api = Arc::new(FakeCluster::new().with_phases([LifecyclePhase::Pending]));
    let mut req = request(Backend::Mongo, "mongodb://mongo-svc:27017");
    req.timeout = Duration::from_secs(3);

    let err = run_probe(
        Arc::clone(&api),
        Arc::new(ResourceRegistry::new()),
        &req,
        &RecordingReporter::default(),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PocketError>(),
        Some(PocketError::Timeout { .. })
    ));
    assert_eq!(api.deleted().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn log_failure_still_deletes_the_pod() {
    let api = Arc::new(
        FakeCluster::new()
            .with_phases([LifecyclePhase::Succeeded])
            .with_log_error("container not found"),
    );

    let err = run_probe(
        Arc::clone(&api),
        Arc::new(ResourceRegistry::new()),
        &request(Backend::Redis, "redis-svc"),
        &RecordingReporter::default(),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PocketError>(),
        Some(PocketError::LogRetrieval { .. })
    ));
    assert_eq!(api.deleted().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn stalled_log_stream_times_out_and_deletes_the_pod() {
    let api = Arc::new(
        FakeCluster::new()
            .with_phases([LifecyclePhase::Succeeded])
            .with_hanging_logs(),
    );
    let started = tokio::time::Instant::now();

    let err = run_probe(
        Arc::clone(&api),
        Arc::new(ResourceRegistry::new()),
        &request(Backend::Redis, "redis-svc"),
        &RecordingReporter::default(),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    match err.downcast_ref::<PocketError>() {
        Some(PocketError::LogRetrieval { reason, .. }) => {
            assert_eq!(reason, "timed out after 30s");
        }
        other => panic!("expected LogRetrieval, got {other:?}"),
    }
    assert!(started.elapsed() >= Duration::from_secs(30));
    assert_eq!(api.deleted().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn rejected_create_deletes_nothing() {
    let api = Arc::new(FakeCluster::new().with_create_error("exceeded quota"));

    let err = run_probe(
        Arc::clone(&api),
        Arc::new(ResourceRegistry::new()),
        &request(Backend::Redis, "redis-svc"),
        &RecordingReporter::default(),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("exceeded quota"));
    assert!(api.deleted().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cleanup_failure_does_not_change_the_outcome() {
    let api = Arc::new(
        FakeCluster::new()
            .with_phases([LifecyclePhase::Succeeded])
            .with_logs("PONG")
            .with_delete_error("forbidden"),
    );
    let reporter = RecordingReporter::default();

    let outcome = run_probe(
        Arc::clone(&api),
        Arc::new(ResourceRegistry::new()),
        &request(Backend::Redis, "redis-svc"),
        &reporter,
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(outcome.verdict.is_success());
    assert!(reporter.has("warn:", "forbidden"));
}

#[tokio::test(start_paused = true)]
async fn interrupt_while_waiting_deletes_the_pod() {
    let api = Arc::new(FakeCluster::new().with_phases([LifecyclePhase::Pending]));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        trigger.cancel();
    });

    let err = run_probe(
        Arc::clone(&api),
        Arc::new(ResourceRegistry::new()),
        &request(Backend::Redis, "redis-svc"),
        &RecordingReporter::default(),
        &cancel,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PocketError>(),
        Some(PocketError::Interrupted)
    ));
    assert_eq!(api.deleted().len(), 1);
}
