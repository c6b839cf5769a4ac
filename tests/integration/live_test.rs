//! Live Athena tests.
//!
//! These tests require a real Athena database. Set ATHENA_TEST_DATABASE,
//! ATHENA_TEST_BUCKET and the usual AWS_* credential variables to run them.

use athena_glance::athena::QueryState;
use athena_glance::config::Config;
use athena_glance::query::{QueryBuilder, QueryExecutionClient, SelectQueryBuilder};

/// Helper to build a live client from the environment.
fn get_test_client() -> Option<QueryExecutionClient<athena_glance::athena::AthenaHttpClient>> {
    let mut config = Config::default();
    config.athena.database = std::env::var("ATHENA_TEST_DATABASE").ok();
    config.athena.output_bucket = std::env::var("ATHENA_TEST_BUCKET").ok();
    config.athena.output_folder = Some("athena-glance-tests".to_string());
    config.polling.poll_interval_secs = 1;
    config.apply_env_defaults();

    let settings = config.resolve().ok()?;
    QueryExecutionClient::from_settings(&settings).ok()
}

#[tokio::test]
async fn test_live_select_literal() {
    let Some(client) = get_test_client() else {
        eprintln!("Skipping test: ATHENA_TEST_DATABASE not set");
        return;
    };

    let outcome = client.run("SELECT 1 AS num, 'hello' AS greeting").await.unwrap();

    assert_eq!(outcome.execution.state, QueryState::Succeeded);
    assert_eq!(outcome.result_set.columns.len(), 2);
    assert_eq!(outcome.result_set.columns[0].name, "num");
    assert_eq!(outcome.result_set.data_rows().len(), 1);
}

#[tokio::test]
async fn test_live_missing_table_fails_remotely() {
    let Some(client) = get_test_client() else {
        eprintln!("Skipping test: ATHENA_TEST_DATABASE not set");
        return;
    };

    let mut builder = SelectQueryBuilder::new("athena_glance_table_that_does_not_exist");
    builder.add_column("x");

    let execution_id = client.submit(&builder.build().unwrap()).await;
    match execution_id {
        // Some engines reject at submission, others fail the execution.
        Err(e) => assert_eq!(e.category(), "Submission Error"),
        Ok(id) => {
            let execution = client.poll(&id).await.unwrap();
            assert_eq!(execution.state, QueryState::Failed);
        }
    }
}
