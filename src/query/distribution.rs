//! Distribution percentage query builder.
//!
//! Produces one percentage column per range bucket, grouped by a
//! distribution variable:
//!
//! ```text
//! SELECT vehicle_type, 100.0 * AVG(CASE WHEN distance BETWEEN 0 AND 10 AND detection THEN 1 ELSE 0 END) AS range_0_10
//! FROM distance_detection GROUP BY vehicle_type
//! ```

use tracing::debug;

use super::clause::{render_select_list, Clause, DistributionRange};
use super::QueryBuilder;
use crate::error::{QueryError, Result};

/// Builder for distribution percentage queries.
#[derive(Debug, Clone)]
pub struct DistributionPercentageQueryBuilder {
    table: String,
    distribution_field: String,
    comparison_field: String,
    range_field: String,
    clauses: Vec<Clause>,
}

impl DistributionPercentageQueryBuilder {
    /// Creates a builder.
    ///
    /// - `distribution_variable` groups the output rows.
    /// - `comparison_variable` must be a boolean column; it is the numerator predicate.
    /// - `range_field` decides bucket membership.
    pub fn new(
        table: impl Into<String>,
        distribution_variable: impl Into<String>,
        comparison_variable: impl Into<String>,
        range_field: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            distribution_field: distribution_variable.into(),
            comparison_field: comparison_variable.into(),
            range_field: range_field.into(),
            clauses: Vec::new(),
        }
    }

    /// Adds one percentage column for the bucket `[start, end]`.
    ///
    /// Overlapping and duplicate ranges are accepted as-is.
    pub fn add_distribution_range(&mut self, start: i64, end: i64) -> Result<&mut Self> {
        let range = DistributionRange::new(start, end)?;
        debug!(alias = %range.alias(), "Adding distribution range");
        self.clauses.push(Clause::range_percentage(
            &self.range_field,
            &self.comparison_field,
            range,
        ));
        Ok(self)
    }
}

impl QueryBuilder for DistributionPercentageQueryBuilder {
    fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    fn build(&self) -> Result<String> {
        if self.clauses.is_empty() {
            return Err(QueryError::empty_query(
                "No distribution ranges added. Use add_distribution_range before building the query.",
            ));
        }

        Ok(format!(
            "SELECT {field}, {columns} FROM {table} GROUP BY {field}",
            field = self.distribution_field,
            columns = render_select_list(&self.clauses),
            table = self.table,
        ))
    }
}
