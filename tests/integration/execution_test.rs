//! Execution client integration tests against the mock service.

use athena_glance::athena::{
    ColumnInfo, MockQueryService, QueryState, ResultSet, ServiceError,
};
use athena_glance::error::QueryError;
use athena_glance::query::{DistributionPercentageQueryBuilder, QueryBuilder};
use tokio_test::{assert_err, assert_ok};

use super::common::mock_client;

fn distribution_result() -> ResultSet {
    ResultSet::with_data(
        vec![
            ColumnInfo::new("vehicle_type", "varchar"),
            ColumnInfo::new("range_0_10", "double"),
        ],
        vec![
            vec![Some("vehicle_type".into()), Some("range_0_10".into())],
            vec![Some("car".into()), Some("87.5".into())],
            vec![Some("truck".into()), None],
        ],
    )
}

#[tokio::test]
async fn test_run_distribution_query_end_to_end() {
    let mock = MockQueryService::new()
        .with_execution_id("exec-42")
        .with_states([QueryState::Queued, QueryState::Running, QueryState::Succeeded])
        .with_result_set(distribution_result());
    let client = mock_client(mock, 10);

    let mut builder =
        DistributionPercentageQueryBuilder::new("distance_detection", "vehicle_type", "detection", "distance");
    builder.add_distribution_range(0, 10).unwrap();

    let outcome = assert_ok!(client.run_builder(&builder).await);

    assert!(outcome.succeeded());
    assert_eq!(outcome.execution.execution_id, "exec-42");
    assert_eq!(outcome.result_set.data_rows().len(), 2);
    assert_eq!(client.service().status_checks(), 3);
    assert_eq!(client.service().fetches(), 1);

    let submitted = client.service().submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].query_text, builder.build().unwrap());
    assert_eq!(submitted[0].database, "detection_db");
    assert_eq!(submitted[0].output_location, "s3://me-interview/results/");
}

#[tokio::test]
async fn test_failed_query_is_reported_not_raised() {
    let mock = MockQueryService::new()
        .with_final_state(QueryState::Failed)
        .with_state_change_reason("COLUMN_NOT_FOUND: line 1:8")
        .with_result_set(ResultSet::default());
    let client = mock_client(mock, 5);

    let outcome = assert_ok!(client.run("SELECT nope FROM t").await);
    assert_eq!(outcome.execution.state, QueryState::Failed);
    assert_eq!(
        outcome.execution.state_change_reason.as_deref(),
        Some("COLUMN_NOT_FOUND: line 1:8")
    );
}

#[tokio::test]
async fn test_stage_failures_abort_run() {
    let client = mock_client(
        MockQueryService::new().failing_submission(ServiceError::transport("connection refused")),
        5,
    );
    let err = assert_err!(client.run("SELECT 1").await);
    assert_eq!(err.category(), "Submission Error");

    let client = mock_client(
        MockQueryService::new().failing_fetch(ServiceError::api("InvalidRequestException", "gone")),
        5,
    );
    let err = assert_err!(client.run("SELECT 1").await);
    assert!(matches!(err, QueryError::Fetch(ref m) if m.contains("gone")));
}

#[tokio::test]
async fn test_exhaustion_makes_exactly_max_attempts() {
    let mut mock = MockQueryService::new();
    for i in 0..10 {
        mock = mock.with_status_error(ServiceError::transport(format!("reset {i}")));
    }
    let client = mock_client(mock, 3);

    let err = assert_err!(client.run("SELECT 1").await);
    assert!(matches!(err, QueryError::PollingExhausted { attempts: 3, .. }));
    assert!(err.to_string().contains("reset 2"));
    assert_eq!(client.service().status_checks(), 3);
    assert_eq!(client.service().fetches(), 0);
}

#[tokio::test]
async fn test_sequential_runs_share_one_client() {
    let client = mock_client(MockQueryService::new(), 2);

    let first = assert_ok!(client.run("SELECT 1").await);
    let second = assert_ok!(client.run("SELECT 2").await);

    assert_eq!(first.execution.execution_id, "mock-execution-1");
    assert_eq!(second.execution.execution_id, "mock-execution-2");
    assert_eq!(
        second.result_set.data_rows()[0][0].as_deref(),
        Some("Mock result for: SELECT 2")
    );
}

#[tokio::test]
async fn test_client_over_boxed_service() {
    use athena_glance::athena::{QueryService, ResultLocation};
    use athena_glance::query::{PollPolicy, QueryExecutionClient};
    use std::time::Duration;

    let service: Box<dyn QueryService> =
        Box::new(MockQueryService::new().with_states([QueryState::Running]));
    let client = QueryExecutionClient::new(service, "detection_db", ResultLocation::new("bucket", ""))
        .with_poll_policy(PollPolicy::new(2, Duration::ZERO).unwrap());

    let outcome = assert_ok!(client.run("SELECT 1").await);
    assert!(outcome.succeeded());
}
