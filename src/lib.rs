//! athena-glance - submit, poll and fetch Amazon Athena queries.
//!
//! Query text is assembled by small builders (`query`) and executed by a
//! client (`query::QueryExecutionClient`) over a pluggable remote service
//! (`athena`).

pub mod athena;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod query;
