//! Query execution against the remote query service.
//!
//! Drives the submit → poll → fetch lifecycle of one job at a time. Polling
//! waits between status checks without blocking the runtime and can be
//! aborted with a cancellation token.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};

use super::QueryBuilder;
use crate::athena::{
    AthenaHttpClient, AthenaHttpConfig, QueryExecution, QueryService, QueryState, ResultLocation,
    ResultSet, StartQueryRequest,
};
use crate::config::AthenaSettings;
use crate::error::{QueryError, Result};

/// Default number of status checks before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Default pause between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Bounds the polling loop: at most `max_attempts` status checks, spaced by
/// `poll_interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub poll_interval: Duration,
}

impl PollPolicy {
    pub fn new(max_attempts: u32, poll_interval: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(QueryError::config("max_attempts must be at least 1"));
        }
        Ok(Self {
            max_attempts,
            poll_interval,
        })
    }

    /// Longest time `poll` can spend waiting between checks.
    pub fn max_wait(&self) -> Duration {
        self.poll_interval * self.max_attempts.saturating_sub(1)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Outcome of a complete `run`.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// The job as last observed by polling; `state` is always terminal.
    pub execution: QueryExecution,
    /// First page of results, fetched regardless of the terminal state.
    pub result_set: ResultSet,
    /// Wall-clock time from submission to fetched results.
    pub elapsed: Duration,
}

impl QueryOutcome {
    pub fn succeeded(&self) -> bool {
        self.execution.state == QueryState::Succeeded
    }
}

/// Client that submits queries, waits for them and fetches their results.
///
/// The client reports remote outcomes; a FAILED or CANCELLED job is not an
/// error here, callers inspect the returned state.
pub struct QueryExecutionClient<S> {
    service: S,
    database: String,
    output_location: ResultLocation,
    workgroup: Option<String>,
    policy: PollPolicy,
    span: Span,
}

impl QueryExecutionClient<AthenaHttpClient> {
    /// Creates a client talking to Athena with validated settings.
    pub fn from_settings(settings: &AthenaSettings) -> Result<Self> {
        let mut http = AthenaHttpConfig::new(&settings.region, settings.credentials.clone());
        if let Some(endpoint) = &settings.endpoint {
            http = http.with_endpoint(endpoint);
        }
        let service = AthenaHttpClient::new(http)?;

        let mut client = Self::new(
            service,
            &settings.database,
            ResultLocation::new(&settings.output_bucket, &settings.output_folder),
        )
        .with_poll_policy(settings.poll_policy);
        if let Some(workgroup) = &settings.workgroup {
            client = client.with_workgroup(workgroup);
        }
        Ok(client)
    }
}

impl<S: QueryService> QueryExecutionClient<S> {
    /// Creates a client with the default poll policy.
    pub fn new(service: S, database: impl Into<String>, output_location: ResultLocation) -> Self {
        let database = database.into();
        let span = info_span!("query_client", database = %database);
        Self {
            service,
            database,
            output_location,
            workgroup: None,
            policy: PollPolicy::default(),
            span,
        }
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_workgroup(mut self, workgroup: impl Into<String>) -> Self {
        self.workgroup = Some(workgroup.into());
        self
    }

    /// Replaces the span all diagnostics of this client are recorded in.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Submits query text and returns the execution id. Not retried.
    pub async fn submit(&self, query_text: &str) -> Result<String> {
        async {
            let request = StartQueryRequest {
                query_text: query_text.to_string(),
                database: self.database.clone(),
                output_location: self.output_location.uri(),
                workgroup: self.workgroup.clone(),
            };

            let execution_id = self
                .service
                .start_query_execution(&request)
                .await
                .map_err(|e| {
                    error!("Error starting query execution: {e}");
                    QueryError::submission(e.to_string())
                })?;

            if execution_id.is_empty() {
                error!("Query service returned an empty execution id");
                return Err(QueryError::submission("service returned no execution id"));
            }

            info!(execution_id = %execution_id, output = %request.output_location, "Query submitted");
            Ok(execution_id)
        }
        .instrument(self.span.clone())
        .await
    }

    /// Waits until the execution reaches a terminal state.
    pub async fn poll(&self, execution_id: &str) -> Result<QueryExecution> {
        self.poll_with_cancel(execution_id, &CancellationToken::new())
            .await
    }

    /// Waits until the execution reaches a terminal state or `cancel` fires.
    ///
    /// Performs at most `max_attempts` status checks, sleeping
    /// `poll_interval` between consecutive checks. Failed checks are logged
    /// and retried. Errors:
    /// - `PollingExhausted` when the final check failed,
    /// - `PollTimeout` when the final check still saw a running job,
    /// - `Cancelled` when the token fired, even mid-check; the job is asked to stop.
    pub async fn poll_with_cancel(
        &self,
        execution_id: &str,
        cancel: &CancellationToken,
    ) -> Result<QueryExecution> {
        async {
            let max_attempts = self.policy.max_attempts;
            let mut last_error: Option<String> = None;
            debug!(
                execution_id,
                max_attempts,
                max_wait = ?self.policy.max_wait(),
                "Polling query status"
            );

            for attempt in 1..=max_attempts {
                if attempt > 1 {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(self.abandon(execution_id).await),
                        _ = tokio::time::sleep(self.policy.poll_interval) => {}
                    }
                }

                let checked = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(self.abandon(execution_id).await),
                    checked = self.service.get_query_execution(execution_id) => checked,
                };

                match checked {
                    Ok(execution) if execution.state.is_terminal() => {
                        info!(
                            execution_id,
                            attempt,
                            state = %execution.state,
                            "Query reached terminal state"
                        );
                        return Ok(execution);
                    }
                    Ok(execution) => {
                        debug!(execution_id, attempt, state = %execution.state, "Query still in progress");
                        last_error = None;
                    }
                    Err(e) => {
                        let err = QueryError::status_check(attempt, e.to_string());
                        warn!(execution_id, "{err}");
                        last_error = Some(e.to_string());
                    }
                }
            }

            match last_error {
                Some(message) => {
                    error!(execution_id, "Giving up after {max_attempts} failed status checks");
                    Err(QueryError::PollingExhausted {
                        attempts: max_attempts,
                        message,
                    })
                }
                None => {
                    error!(execution_id, "Query still running after {max_attempts} status checks");
                    Err(QueryError::PollTimeout {
                        attempts: max_attempts,
                    })
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    /// Fetches the first page of results. Not retried.
    pub async fn fetch_results(&self, execution_id: &str) -> Result<ResultSet> {
        async {
            let result_set = self
                .service
                .get_query_results(execution_id)
                .await
                .map_err(|e| {
                    error!("Error getting query results: {e}");
                    QueryError::fetch(e.to_string())
                })?;

            debug!(execution_id, rows = result_set.row_count(), "Fetched query results");
            Ok(result_set)
        }
        .instrument(self.span.clone())
        .await
    }

    /// Submits, polls and fetches in sequence; the first failure aborts.
    pub async fn run(&self, query_text: &str) -> Result<QueryOutcome> {
        self.run_with_cancel(query_text, &CancellationToken::new())
            .await
    }

    /// Like [`run`](Self::run), with a cancellation token for the polling phase.
    pub async fn run_with_cancel(
        &self,
        query_text: &str,
        cancel: &CancellationToken,
    ) -> Result<QueryOutcome> {
        let start = Instant::now();
        let result = self.run_stages(query_text, cancel).await;

        match result {
            Ok((execution, result_set)) => Ok(QueryOutcome {
                execution,
                result_set,
                elapsed: start.elapsed(),
            }),
            Err(e) => {
                error!(parent: &self.span, "Error running query: {e}");
                Err(e)
            }
        }
    }

    /// Builds the query text of `builder` and runs it.
    pub async fn run_builder(&self, builder: &dyn QueryBuilder) -> Result<QueryOutcome> {
        let query_text = builder.build()?;
        info!(parent: &self.span, "About to run the following query: {query_text}");
        self.run(&query_text).await
    }

    async fn run_stages(
        &self,
        query_text: &str,
        cancel: &CancellationToken,
    ) -> Result<(QueryExecution, ResultSet)> {
        let execution_id = self.submit(query_text).await?;
        let execution = self.poll_with_cancel(&execution_id, cancel).await?;

        if execution.state != QueryState::Succeeded {
            warn!(
                parent: &self.span,
                execution_id = %execution_id,
                state = %execution.state,
                reason = execution.state_change_reason.as_deref().unwrap_or("none"),
                "Query did not succeed; fetching results anyway"
            );
        }

        let result_set = self.fetch_results(&execution_id).await?;
        Ok((execution, result_set))
    }

    /// Requests a stop after cancellation and returns the error to report.
    async fn abandon(&self, execution_id: &str) -> QueryError {
        info!(execution_id, "Polling cancelled, stopping query");
        if let Err(e) = self.service.stop_query_execution(execution_id).await {
            warn!("Failed to stop query {execution_id}: {e}");
        }
        QueryError::Cancelled(execution_id.to_string())
    }
}
