//! Query execution and result types.
//!
//! Defines the structures used to represent jobs and result sets returned
//! by the remote query service.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QueryError;

/// Lifecycle state of a submitted query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryState {
    /// Accepted but not yet running.
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl QueryState {
    /// Returns true once no further transitions can occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    /// Returns the state as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for QueryState {
    type Err = QueryError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "QUEUED" => Ok(Self::Queued),
            "RUNNING" => Ok(Self::Running),
            "SUCCEEDED" => Ok(Self::Succeeded),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(QueryError::internal(format!("Unknown query state: {s}"))),
        }
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submitted job, as last observed from the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryExecution {
    /// Identifier assigned by the service at submission time.
    pub execution_id: String,

    pub state: QueryState,

    /// Service supplied explanation, typically set for FAILED/CANCELLED.
    #[serde(default)]
    pub state_change_reason: Option<String>,
}

impl QueryExecution {
    pub fn new(execution_id: impl Into<String>, state: QueryState) -> Self {
        Self {
            execution_id: execution_id.into(),
            state,
            state_change_reason: None,
        }
    }
}

/// Where the service writes result files: `s3://<bucket>/<folder>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLocation {
    bucket: String,
    folder: String,
}

impl ResultLocation {
    pub fn new(bucket: impl Into<String>, folder: impl Into<String>) -> Self {
        let bucket: String = bucket.into();
        let folder: String = folder.into();
        Self {
            bucket: bucket.trim_matches('/').to_string(),
            folder: folder.trim_matches('/').to_string(),
        }
    }

    /// Returns the composed destination URI.
    pub fn uri(&self) -> String {
        if self.folder.is_empty() {
            format!("s3://{}/", self.bucket)
        } else {
            format!("s3://{}/{}/", self.bucket, self.folder)
        }
    }
}

impl fmt::Display for ResultLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

/// Parameters of a single `StartQueryExecution` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartQueryRequest {
    pub query_text: String,
    pub database: String,
    pub output_location: String,
    pub workgroup: Option<String>,
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Column data type as reported by the service (e.g. `varchar`, `double`).
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A row of data; `None` marks SQL NULL.
pub type Row = Vec<Option<String>>;

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Column metadata for the result set.
    pub columns: Vec<ColumnInfo>,

    /// Rows as returned by the service, including the header row it echoes
    /// for SELECT statements.
    pub rows: Vec<Row>,

    /// Continuation token when more pages are available.
    #[serde(default)]
    pub next_token: Option<String>,
}

impl ResultSet {
    /// Creates a result set with the given columns and rows.
    pub fn with_data(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            next_token: None,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no rows besides a header echo.
    pub fn is_empty(&self) -> bool {
        self.data_rows().is_empty()
    }

    /// Returns the rows without the leading header row, if one is present.
    pub fn data_rows(&self) -> &[Row] {
        match self.rows.first() {
            Some(first) if self.is_header(first) => &self.rows[1..],
            _ => &self.rows,
        }
    }

    fn is_header(&self, row: &Row) -> bool {
        !self.columns.is_empty()
            && row.len() == self.columns.len()
            && row
                .iter()
                .zip(&self.columns)
                .all(|(cell, col)| cell.as_deref() == Some(col.name.as_str()))
    }
}

impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        writeln!(f, "{}", header.join(" | "))?;
        for row in self.data_rows() {
            let cells: Vec<&str> = row
                .iter()
                .map(|cell| cell.as_deref().unwrap_or("NULL"))
                .collect();
            writeln!(f, "{}", cells.join(" | "))?;
        }
        write!(f, "({} rows)", self.data_rows().len())
    }
}
