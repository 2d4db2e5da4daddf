pub mod config;
pub use config::{Config, DatabaseConfig, ExportConfig, HistogramConfig};

use thiserror::Error;

/// Adapter names whose SQL dialect provides `width_bucket`.
pub const SUPPORTED_ADAPTERS: &[&str] = &["postgresql", "postgis"];

#[derive(Error, Debug)]
pub enum HistogramError {
    #[error("unsupported adapter '{adapter}' (supported: postgresql, postgis)")]
    UnsupportedAdapter { adapter: String },
    #[error("bins count must be a positive integer, got {0}")]
    InvalidBinsCount(i64),
    #[error("invalid bounds: {0}")]
    InvalidBounds(String),
    #[error("cannot map column '{column}': {reason}")]
    Mapping { column: String, reason: String },
    #[error("query failed: {0}")]
    Query(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("{0}")]
    Other(String),
}

impl HistogramError {
    pub fn mapping(column: &str, reason: impl Into<String>) -> Self {
        HistogramError::Mapping { column: column.into(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, HistogramError>;
