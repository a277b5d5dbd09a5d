// ABOUTME: Integration tests for the multi-region orchestrator.
// ABOUTME: Verifies ordering, failure isolation and the shared artifact across regions.

mod support;

use lambdeploy::deploy::deploy;
use lambdeploy::desired::{DesiredState, EventSourceBinding};
use lambdeploy::platform::{ClientSettings, Credentials, InMemoryConnector, Operation};
use lambdeploy::reconcile::{FunctionChange, ReconcileError};
use lambdeploy::types::{FunctionName, Region};
use support::{descriptor, init_tracing, region};

fn regions() -> Vec<Region> {
    vec![region("us-east-1"), region("eu-west-1"), region("ap-southeast-2")]
}

fn desired() -> DesiredState {
    DesiredState {
        event_sources: vec![EventSourceBinding::new("arn:aws:sqs:us-east-1:1:jobs")],
        schedules: Vec::new(),
    }
}

/// Test: one region failing at probe leaves the others complete.
#[tokio::test]
async fn probe_failure_in_one_region_is_isolated() {
    init_tracing();
    let connector = InMemoryConnector::new();
    connector
        .platform(&region("eu-west-1"))
        .fail_on(Operation::GetFunction);

    let summary = deploy(
        &connector,
        &regions(),
        &Credentials::Default,
        ClientSettings::default(),
        descriptor("api", b"artifact"),
        &desired(),
    )
    .await;

    assert_eq!(summary.total(), 3);
    assert_eq!(summary.failed(), 1);
    assert!(!summary.is_success());

    let failed = &summary.regions[1];
    assert_eq!(failed.region, region("eu-west-1"));
    assert!(matches!(failed.error, Some(ReconcileError::Platform(_))));

    for ok in [&summary.regions[0], &summary.regions[2]] {
        assert!(ok.error.is_none());
        assert_eq!(ok.function_change, Some(FunctionChange::Created));
        assert_eq!(ok.event_sources.len(), 1);
    }
}

/// Test: results come back in the requested region order.
#[tokio::test]
async fn results_follow_requested_order() {
    let connector = InMemoryConnector::new();

    let summary = deploy(
        &connector,
        &regions(),
        &Credentials::Default,
        ClientSettings::default(),
        descriptor("api", b"artifact"),
        &DesiredState::default(),
    )
    .await;

    let order: Vec<_> = summary.regions.iter().map(|r| r.region.clone()).collect();
    assert_eq!(order, regions());
}

/// Test: a region that cannot be reached reports a connection error only for itself.
#[tokio::test]
async fn connection_failure_is_a_region_error() {
    let connector = InMemoryConnector::new();
    connector.set_unreachable(&region("ap-southeast-2"));

    let summary = deploy(
        &connector,
        &regions(),
        &Credentials::Default,
        ClientSettings::default(),
        descriptor("api", b"artifact"),
        &desired(),
    )
    .await;

    assert_eq!(summary.failed(), 1);
    assert!(matches!(
        summary.regions[2].error,
        Some(ReconcileError::Connect(_))
    ));
    assert!(summary.regions[0].error.is_none());
}

/// Test: every region receives the same artifact bytes.
#[tokio::test]
async fn every_region_gets_the_same_artifact() {
    let connector = InMemoryConnector::new();
    let name = FunctionName::new("api").unwrap();

    deploy(
        &connector,
        &regions(),
        &Credentials::Default,
        ClientSettings::default(),
        descriptor("api", b"same-bytes"),
        &DesiredState::default(),
    )
    .await;

    for region in regions() {
        let stored = connector.platform(&region).function(&name).unwrap();
        assert_eq!(stored.code_size, b"same-bytes".len());
        assert!(stored.arn.as_str().contains(region.as_str()));
    }
}

/// Test: a deploy that created functions is not a no-op.
#[tokio::test]
async fn summary_with_function_changes_is_not_noop() {
    let connector = InMemoryConnector::new();

    let summary = deploy(
        &connector,
        &regions(),
        &Credentials::Default,
        ClientSettings::default(),
        descriptor("api", b"artifact"),
        &DesiredState::default(),
    )
    .await;

    assert!(summary.is_success());
    assert!(!summary.is_noop());
}
