use binsql_common::{HistogramError, Result};
use serde::{Deserialize, Serialize};

use crate::connection::{Row, Value};

/// One non-empty equal-width bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub id: i64,   // 1-based bucket index
    pub size: u64, // non-null values in the bucket, always >= 1
    pub inf: f64,
    pub sup: f64,
    pub min: f64, // observed, inside [inf, sup]
    pub max: f64,
}

impl Bin {
    pub const COLUMNS: [&'static str; 6] = ["id", "size", "inf", "sup", "min", "max"];

    /// Builds a bin from a result row by column name.
    pub fn from_row(row: &Row) -> Result<Self> {
        let id = int_column(row, "id")?;
        if id < 1 {
            let reason = format!("bucket index must be >= 1, got {id}");
            return Err(HistogramError::mapping("id", reason));
        }
        let size = int_column(row, "size")?;
        if size < 1 {
            let reason = format!("bucket size must be >= 1, got {size}");
            return Err(HistogramError::mapping("size", reason));
        }
        Ok(Bin {
            id,
            size: size as u64,
            inf: float_column(row, "inf")?,
            sup: float_column(row, "sup")?,
            min: float_column(row, "min")?,
            max: float_column(row, "max")?,
        })
    }

    pub fn width(&self) -> f64 {
        self.sup - self.inf
    }
}

fn column<'a>(row: &'a Row, name: &str) -> Result<&'a Value> {
    match row.get(name) {
        None => {
            let found = row.column_names().collect::<Vec<_>>().join(", ");
            Err(HistogramError::mapping(name, format!("column missing from result (got: {found})")))
        }
        Some(Value::Null) => Err(HistogramError::mapping(name, "unexpected NULL")),
        Some(v) => Ok(v),
    }
}

fn int_column(row: &Row, name: &str) -> Result<i64> {
    match column(row, name)? {
        Value::Int(i) => Ok(*i),
        Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Ok(*f as i64),
        Value::Text(s) => {
            let s = s.trim();
            // numeric text may carry a zero fraction, e.g. "4.0"
            let whole = |f: &f64| f.fract() == 0.0 && f.is_finite();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(whole).map(|f| f as i64))
                .ok_or_else(|| HistogramError::mapping(name, format!("not an integer: '{s}'")))
        }
        other => Err(HistogramError::mapping(name, format!("not an integer: {other:?}"))),
    }
}

fn float_column(row: &Row, name: &str) -> Result<f64> {
    match column(row, name)? {
        Value::Float(f) => Ok(*f),
        Value::Int(i) => Ok(*i as f64),
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| HistogramError::mapping(name, format!("not a number: '{s}'"))),
        Value::Null => Err(HistogramError::mapping(name, "unexpected NULL")),
    }
}

// --- summary over a result set ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSummary {
    pub non_empty_bins: usize,
    pub total_count: u64,
    pub range_start: Option<f64>,
    pub range_end: Option<f64>,
    pub bin_width: Option<f64>,
}

impl HistogramSummary {
    pub fn from_bins(bins: &[Bin]) -> Self {
        HistogramSummary {
            non_empty_bins: bins.len(),
            total_count: bins.iter().map(|b| b.size).sum(),
            range_start: bins.first().map(|b| b.inf),
            range_end: bins.last().map(|b| b.sup),
            bin_width: bins.first().map(Bin::width),
        }
    }
}
