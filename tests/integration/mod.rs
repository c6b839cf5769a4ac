//! Integration tests for athena-glance.

pub mod builder_test;
pub mod common;
pub mod diagnostics_test;
pub mod execution_test;
pub mod live_test;
