//! Query construction and execution.
//!
//! Builders accumulate clauses and render query text; the execution client
//! only ever consumes that text, so new query shapes need no client changes.

pub mod clause;
pub mod distribution;
pub mod executor;
pub mod select;

pub use clause::{Clause, DistributionRange};
pub use distribution::DistributionPercentageQueryBuilder;
pub use executor::{PollPolicy, QueryExecutionClient, QueryOutcome};
pub use select::{SelectQueryBuilder, SELECT_ROW_LIMIT};

use crate::error::Result;

/// Shared contract of all query builders: accumulate clauses, then render.
///
/// Builders are single-use accumulators. `build` does not reset state, so
/// calling it twice without further additions returns the same text.
pub trait QueryBuilder {
    /// Clauses added so far, in insertion order.
    fn clauses(&self) -> &[Clause];

    /// Number of clauses added so far.
    fn clause_count(&self) -> usize {
        self.clauses().len()
    }

    /// Renders the query text. Fails with `EmptyQuery` if no clause was added.
    fn build(&self) -> Result<String>;
}
