//! Mock query service for testing.
//!
//! Provides a scripted, in-memory implementation for tests and `--mock` runs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{
    ColumnInfo, QueryExecution, QueryService, QueryState, ResultSet, ServiceError, ServiceResult,
    StartQueryRequest,
};

/// A mock query service that replays scripted status responses.
///
/// Status checks consume the script front to back; once it is empty every
/// further check reports the final state (SUCCEEDED unless overridden).
#[derive(Debug)]
pub struct MockQueryService {
    execution_id: Option<String>,
    submit_error: Option<ServiceError>,
    script: Mutex<VecDeque<ServiceResult<QueryState>>>,
    final_state: QueryState,
    state_change_reason: Option<String>,
    result_set: Option<ResultSet>,
    fetch_error: Option<ServiceError>,
    submitted: Mutex<Vec<StartQueryRequest>>,
    stopped: Mutex<Vec<String>>,
    status_checks: AtomicU32,
    fetches: AtomicU32,
}

impl MockQueryService {
    /// Creates a mock whose queries succeed on the first status check.
    pub fn new() -> Self {
        Self {
            execution_id: None,
            submit_error: None,
            script: Mutex::new(VecDeque::new()),
            final_state: QueryState::Succeeded,
            state_change_reason: None,
            result_set: None,
            fetch_error: None,
            submitted: Mutex::new(Vec::new()),
            stopped: Mutex::new(Vec::new()),
            status_checks: AtomicU32::new(0),
            fetches: AtomicU32::new(0),
        }
    }

    /// Uses a fixed execution id instead of generated ones.
    pub fn with_execution_id(mut self, id: impl Into<String>) -> Self {
        self.execution_id = Some(id.into());
        self
    }

    /// Appends states to the status script.
    pub fn with_states(self, states: impl IntoIterator<Item = QueryState>) -> Self {
        lock(&self.script).extend(states.into_iter().map(Ok));
        self
    }

    /// Appends a failing status check to the script.
    pub fn with_status_error(self, error: ServiceError) -> Self {
        lock(&self.script).push_back(Err(error));
        self
    }

    /// Sets the state reported once the script is exhausted.
    pub fn with_final_state(mut self, state: QueryState) -> Self {
        self.final_state = state;
        self
    }

    /// Sets the reason reported alongside terminal states.
    pub fn with_state_change_reason(mut self, reason: impl Into<String>) -> Self {
        self.state_change_reason = Some(reason.into());
        self
    }

    /// Sets the result set returned by fetches.
    pub fn with_result_set(mut self, result_set: ResultSet) -> Self {
        self.result_set = Some(result_set);
        self
    }

    /// Makes every submission fail.
    pub fn failing_submission(mut self, error: ServiceError) -> Self {
        self.submit_error = Some(error);
        self
    }

    /// Makes every fetch fail.
    pub fn failing_fetch(mut self, error: ServiceError) -> Self {
        self.fetch_error = Some(error);
        self
    }

    /// Returns the requests submitted so far.
    pub fn submitted(&self) -> Vec<StartQueryRequest> {
        lock(&self.submitted).clone()
    }

    /// Returns the execution ids a stop was requested for.
    pub fn stopped(&self) -> Vec<String> {
        lock(&self.stopped).clone()
    }

    /// Number of status checks received.
    pub fn status_checks(&self) -> u32 {
        self.status_checks.load(Ordering::SeqCst)
    }

    /// Number of result fetches received.
    pub fn fetches(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }

    fn echo_result(&self) -> ResultSet {
        let query = lock(&self.submitted)
            .last()
            .map(|r| r.query_text.clone())
            .unwrap_or_default();

        ResultSet::with_data(
            vec![ColumnInfo::new("result", "varchar")],
            vec![
                vec![Some("result".to_string())],
                vec![Some(format!("Mock result for: {query}"))],
            ],
        )
    }
}

impl Default for MockQueryService {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl QueryService for MockQueryService {
    async fn start_query_execution(&self, request: &StartQueryRequest) -> ServiceResult<String> {
        if let Some(err) = &self.submit_error {
            return Err(err.clone());
        }

        let mut submitted = lock(&self.submitted);
        submitted.push(request.clone());
        Ok(self
            .execution_id
            .clone()
            .unwrap_or_else(|| format!("mock-execution-{}", submitted.len())))
    }

    async fn get_query_execution(&self, execution_id: &str) -> ServiceResult<QueryExecution> {
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        let state = lock(&self.script)
            .pop_front()
            .unwrap_or(Ok(self.final_state))?;

        let mut execution = QueryExecution::new(execution_id, state);
        if state.is_terminal() {
            execution.state_change_reason = self.state_change_reason.clone();
        }
        Ok(execution)
    }

    async fn get_query_results(&self, _execution_id: &str) -> ServiceResult<ResultSet> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.fetch_error {
            return Err(err.clone());
        }
        Ok(self.result_set.clone().unwrap_or_else(|| self.echo_result()))
    }

    async fn stop_query_execution(&self, execution_id: &str) -> ServiceResult<()> {
        lock(&self.stopped).push(execution_id.to_string());
        Ok(())
    }
}
