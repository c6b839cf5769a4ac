//! Plain column selection query builder.

use super::clause::{render_select_list, Clause};
use super::QueryBuilder;
use crate::error::{QueryError, Result};

/// Row cap applied to every select query.
pub const SELECT_ROW_LIMIT: usize = 10;

/// Builder for `SELECT <columns> FROM <table> LIMIT 10` queries.
///
/// Column names are emitted verbatim; nothing is quoted or escaped.
#[derive(Debug, Clone)]
pub struct SelectQueryBuilder {
    table: String,
    clauses: Vec<Clause>,
}

impl SelectQueryBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            clauses: Vec::new(),
        }
    }

    /// Appends a column to the select list.
    pub fn add_column(&mut self, name: impl Into<String>) -> &mut Self {
        self.clauses.push(Clause::column(name));
        self
    }
}

impl QueryBuilder for SelectQueryBuilder {
    fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    fn build(&self) -> Result<String> {
        if self.clauses.is_empty() {
            return Err(QueryError::empty_query(
                "No columns added. Use add_column before building the query.",
            ));
        }

        Ok(format!(
            "SELECT {} FROM {} LIMIT {SELECT_ROW_LIMIT}",
            render_select_list(&self.clauses),
            self.table
        ))
    }
}
