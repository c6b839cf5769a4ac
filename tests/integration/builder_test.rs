//! Query builder integration tests.
//!
//! Checks rendered text against the documented shapes and that it parses as SQL.

use athena_glance::error::QueryError;
use athena_glance::query::{
    DistributionPercentageQueryBuilder, QueryBuilder, SelectQueryBuilder,
};
use pretty_assertions::assert_eq;
use sqlparser::ast::{SetExpr, Statement};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// Parses `sql` as a single SELECT and returns its projection width.
fn projection_len(sql: &str) -> usize {
    let statements = Parser::parse_sql(&GenericDialect {}, sql).unwrap();
    assert_eq!(statements.len(), 1);
    match &statements[0] {
        Statement::Query(query) => match query.body.as_ref() {
            SetExpr::Select(select) => select.projection.len(),
            other => panic!("Expected SELECT, got {other:?}"),
        },
        other => panic!("Expected query, got {other:?}"),
    }
}

fn distribution_builder() -> DistributionPercentageQueryBuilder {
    DistributionPercentageQueryBuilder::new(
        "test_table",
        "test_distribution",
        "test_comparison",
        "test_range",
    )
}

#[test]
fn test_distribution_query_shape() {
    let mut builder = distribution_builder();
    builder.add_distribution_range(0, 10).unwrap();
    builder.add_distribution_range(10, 20).unwrap();
    let sql = builder.build().unwrap();

    assert!(sql.contains("SELECT test_distribution"));
    assert!(sql.contains("range_0_10"));
    assert!(sql.contains("range_10_20"));
    assert!(sql.ends_with("GROUP BY test_distribution"));
    assert_eq!(projection_len(&sql), 3);
}

#[test]
fn test_distribution_query_parses_with_many_ranges() {
    let mut builder = distribution_builder();
    for (start, end) in [(0, 10), (10, 20), (20, 100), (0, 100), (50, 50)] {
        builder.add_distribution_range(start, end).unwrap();
    }
    assert_eq!(projection_len(&builder.build().unwrap()), 6);
}

#[test]
fn test_invalid_ranges_leave_builder_unchanged() {
    let mut builder = distribution_builder();
    for (start, end) in [(10, 5), (-1, 0), (0, 101), (101, 200), (-10, -5)] {
        let err = builder.add_distribution_range(start, end).unwrap_err();
        assert!(matches!(err, QueryError::InvalidRange { .. }));
    }
    assert_eq!(builder.clause_count(), 0);
    assert!(matches!(builder.build(), Err(QueryError::EmptyQuery(_))));
}

#[test]
fn test_select_query_exact_text() {
    let mut builder = SelectQueryBuilder::new("t");
    for column in ["clip_name", "frame_id"] {
        builder.add_column(column);
    }
    let sql = builder.build().unwrap();

    assert_eq!(sql, "SELECT clip_name, frame_id FROM t LIMIT 10");
    assert_eq!(projection_len(&sql), 2);
}

#[test]
fn test_build_is_repeatable() {
    let mut select = SelectQueryBuilder::new("distance_detection");
    select.add_column("vehicle_type");
    let mut distribution = distribution_builder();
    distribution.add_distribution_range(20, 100).unwrap();

    let builders: [&dyn QueryBuilder; 2] = [&select, &distribution];
    for builder in builders {
        assert_eq!(builder.build().unwrap(), builder.build().unwrap());
        assert_eq!(builder.clause_count(), 1);
    }
}
