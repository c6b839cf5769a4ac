//! Error types for athena-glance.
//!
//! Defines the error enum shared by the query builders and the execution client.

use thiserror::Error;

/// Main error type for query building and execution.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The remote service rejected the query or returned no execution id.
    #[error("Submission error: {0}")]
    Submission(String),

    /// A single status check failed (transport error, throttling, bad response).
    #[error("Status check error (attempt {attempt}): {message}")]
    StatusCheck { attempt: u32, message: String },

    /// Every status check failed; carries the last failure.
    #[error("Polling exhausted after {attempts} attempts: {message}")]
    PollingExhausted { attempts: u32, message: String },

    /// All attempts were spent without observing a terminal state.
    #[error("Query did not reach a terminal state after {attempts} status checks")]
    PollTimeout { attempts: u32 },

    /// Polling was cancelled by the caller.
    #[error("Query polling cancelled for execution {0}")]
    Cancelled(String),

    /// The remote service rejected the results request.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A distribution range outside `0 <= start <= end <= 100`.
    #[error("Invalid distribution range {start}..={end}: start and end must satisfy 0 <= start <= end <= 100")]
    InvalidRange { start: i64, end: i64 },

    /// `build()` was called before any clause was added.
    #[error("Empty query: {0}")]
    EmptyQuery(String),

    /// Configuration errors (missing credentials, invalid config file, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QueryError {
    /// Creates a submission error with the given message.
    pub fn submission(msg: impl Into<String>) -> Self {
        Self::Submission(msg.into())
    }

    /// Creates a status check error for the given attempt.
    pub fn status_check(attempt: u32, msg: impl Into<String>) -> Self {
        Self::StatusCheck {
            attempt,
            message: msg.into(),
        }
    }

    /// Creates a fetch error with the given message.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Creates an empty query error with the given message.
    pub fn empty_query(msg: impl Into<String>) -> Self {
        Self::EmptyQuery(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Submission(_) => "Submission Error",
            Self::StatusCheck { .. } => "Status Check Error",
            Self::PollingExhausted { .. } => "Polling Exhausted",
            Self::PollTimeout { .. } => "Poll Timeout",
            Self::Cancelled(_) => "Cancelled",
            Self::Fetch(_) => "Fetch Error",
            Self::InvalidRange { .. } => "Invalid Range",
            Self::EmptyQuery(_) => "Empty Query",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using QueryError.
pub type Result<T> = std::result::Result<T, QueryError>;
