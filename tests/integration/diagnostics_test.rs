//! Checks the diagnostics the execution client emits, using a scoped subscriber.

use athena_glance::athena::{MockQueryService, QueryState, ServiceError};
use tracing::info_span;

use super::common::{capture_logs, mock_client};

#[tokio::test]
async fn test_each_failed_status_check_is_logged() {
    let (logs, _guard) = capture_logs();
    let mock = MockQueryService::new()
        .with_status_error(ServiceError::transport("reset"))
        .with_status_error(ServiceError::api("ThrottlingException", "Rate exceeded"));
    let client = mock_client(mock, 5);

    client.poll("q-1").await.unwrap();

    let output = logs.contents();
    assert!(output.contains("Status check error (attempt 1): transport error: reset"));
    assert!(output.contains("Status check error (attempt 2): ThrottlingException: Rate exceeded"));
    assert!(!output.contains("attempt 3)"));
    assert!(output.contains("Query reached terminal state"));
}

#[tokio::test]
async fn test_diagnostics_carry_client_span() {
    let (logs, _guard) = capture_logs();
    let client = mock_client(MockQueryService::new(), 2);

    client.run("SELECT 1").await.unwrap();

    let output = logs.contents();
    assert!(output.contains("query_client{database=detection_db}"));
    assert!(output.contains("Query submitted"));
}

#[tokio::test]
async fn test_injected_span_replaces_default() {
    let (logs, _guard) = capture_logs();
    let client = mock_client(MockQueryService::new().with_final_state(QueryState::Cancelled), 2)
        .with_span(info_span!("nightly_report"));

    client.run("SELECT 1").await.unwrap();

    let output = logs.contents();
    assert!(output.contains("nightly_report"));
    assert!(!output.contains("query_client{"));
    assert!(output.contains("Query did not succeed; fetching results anyway"));
}

#[tokio::test]
async fn test_logs_are_scoped_to_the_subscriber() {
    let (logs, guard) = capture_logs();
    drop(guard);

    let client = mock_client(MockQueryService::new(), 2);
    client.run("SELECT 1").await.unwrap();

    assert!(logs.contents().is_empty());
}
