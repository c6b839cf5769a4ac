//! Remote query service layer.
//!
//! Provides a trait-based interface over the asynchronous query service
//! (submit, check status, fetch results), so the execution client can run
//! against Amazon Athena or an in-memory mock interchangeably.

mod http;
mod mock;
mod signing;
mod types;

pub use http::{AthenaHttpClient, AthenaHttpConfig};
pub use mock::MockQueryService;
pub use signing::{Credentials, SigV4Signer, SignedHeaders, SigningRequest};
pub use types::{
    ColumnInfo, QueryExecution, QueryState, ResultLocation, ResultSet, Row, StartQueryRequest,
};

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a [`QueryService`] call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The request never produced a response (connect failure, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with an error body.
    #[error("{code}: {message}")]
    Api { code: String, message: String },

    /// The service answered with something that could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn api(code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Api {
            code: code.into(),
            message: msg.into(),
        }
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

/// Result type for raw service calls.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Trait defining the remote calls the execution client consumes.
///
/// Implementations only transport requests; retry and polling policy live
/// in the execution client.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Starts a query and returns the execution id assigned by the service.
    async fn start_query_execution(&self, request: &StartQueryRequest) -> ServiceResult<String>;

    /// Returns the current state of an execution.
    async fn get_query_execution(&self, execution_id: &str) -> ServiceResult<QueryExecution>;

    /// Returns the first page of results of an execution.
    async fn get_query_results(&self, execution_id: &str) -> ServiceResult<ResultSet>;

    /// Asks the service to stop an execution.
    async fn stop_query_execution(&self, execution_id: &str) -> ServiceResult<()>;
}

#[async_trait]
impl<T: QueryService + ?Sized> QueryService for Box<T> {
    async fn start_query_execution(&self, request: &StartQueryRequest) -> ServiceResult<String> {
        (**self).start_query_execution(request).await
    }

    async fn get_query_execution(&self, execution_id: &str) -> ServiceResult<QueryExecution> {
        (**self).get_query_execution(execution_id).await
    }

    async fn get_query_results(&self, execution_id: &str) -> ServiceResult<ResultSet> {
        (**self).get_query_results(execution_id).await
    }

    async fn stop_query_execution(&self, execution_id: &str) -> ServiceResult<()> {
        (**self).stop_query_execution(execution_id).await
    }
}

#[async_trait]
impl<T: QueryService + ?Sized> QueryService for Arc<T> {
    async fn start_query_execution(&self, request: &StartQueryRequest) -> ServiceResult<String> {
        (**self).start_query_execution(request).await
    }

    async fn get_query_execution(&self, execution_id: &str) -> ServiceResult<QueryExecution> {
        (**self).get_query_execution(execution_id).await
    }

    async fn get_query_results(&self, execution_id: &str) -> ServiceResult<ResultSet> {
        (**self).get_query_results(execution_id).await
    }

    async fn stop_query_execution(&self, execution_id: &str) -> ServiceResult<()> {
        (**self).stop_query_execution(execution_id).await
    }
}
