pub mod bin;
pub mod query;
pub mod request;

pub use bin::{Bin, HistogramSummary};
pub use query::{validate_bins_count, HistogramOptions, QueryBuilder, VALUE_ALIAS};
pub use request::{fetch, histogram, Histogram};
