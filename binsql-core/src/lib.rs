//! Equal-width histograms computed inside PostgreSQL.
//!
//! The statement produced by [`QueryBuilder`] asks the database to bucket a
//! numeric field with `width_bucket`; [`fetch`] maps the grouped rows back to
//! [`Bin`]s. Only non-empty buckets are returned, ordered by bucket id.

pub mod connection;
pub mod dataset;
pub mod export;
pub mod histogram;
pub mod pg;
pub mod quote;

pub use binsql_common::{HistogramError, Result};
pub use connection::{
    assert_supported, is_supported_adapter, Connection, Dialect, PostgresDialect, Row, Value,
};
pub use dataset::{Dataset, Field, RawQuery, Table};
pub use export::{export_csv, export_json, print_bins, write_csv, write_json, write_table};
pub use histogram::{
    fetch, histogram, Bin, Histogram, HistogramOptions, HistogramSummary, QueryBuilder,
};
pub use pg::PgConnection;
