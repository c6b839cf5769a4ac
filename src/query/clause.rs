//! Structured clause model shared by the query builders.
//!
//! Builders accumulate [`Clause`] values and render them through one
//! formatter, so each query shape only decides how clauses are framed.

use std::fmt;

use crate::error::{QueryError, Result};

/// Upper bound (inclusive) of a distribution range, in percent.
const MAX_RANGE_BOUND: i64 = 100;

/// One bucket of a distribution query.
///
/// Always satisfies `0 <= start <= end <= 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DistributionRange {
    start: u8,
    end: u8,
}

impl DistributionRange {
    /// Validates and creates a range.
    pub fn new(start: i64, end: i64) -> Result<Self> {
        if !(0..=MAX_RANGE_BOUND).contains(&start)
            || !(0..=MAX_RANGE_BOUND).contains(&end)
            || start > end
        {
            return Err(QueryError::InvalidRange { start, end });
        }

        Ok(Self {
            start: start as u8,
            end: end as u8,
        })
    }

    pub fn start(&self) -> u8 {
        self.start
    }

    pub fn end(&self) -> u8 {
        self.end
    }

    /// Column alias of the rendered aggregate, e.g. `range_0_10`.
    pub fn alias(&self) -> String {
        format!("range_{}_{}", self.start, self.end)
    }
}

/// A single rendered fragment of a select list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// A bare column reference, emitted verbatim.
    Column { name: String },

    /// Percentage of rows whose `range_field` falls in `range` and whose
    /// boolean `comparison_field` holds.
    RangePercentage {
        range_field: String,
        comparison_field: String,
        range: DistributionRange,
    },
}

impl Clause {
    /// Creates a column clause.
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column { name: name.into() }
    }

    /// Creates a range percentage clause.
    pub fn range_percentage(
        range_field: impl Into<String>,
        comparison_field: impl Into<String>,
        range: DistributionRange,
    ) -> Self {
        Self::RangePercentage {
            range_field: range_field.into(),
            comparison_field: comparison_field.into(),
            range,
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column { name } => f.write_str(name),
            Self::RangePercentage {
                range_field,
                comparison_field,
                range,
            } => write!(
                f,
                "100.0 * AVG(CASE WHEN {range_field} BETWEEN {} AND {} AND {comparison_field} THEN 1 ELSE 0 END) AS {}",
                range.start(),
                range.end(),
                range.alias()
            ),
        }
    }
}

/// Renders clauses as a comma separated select list, in insertion order.
pub fn render_select_list(clauses: &[Clause]) -> String {
    clauses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
