use std::cell::OnceCell;

use binsql_common::{HistogramError, Result};
use serde::{Deserialize, Serialize};

use crate::connection::Dialect;
use crate::dataset::{Dataset, Field};

/// Alias of the single projected column inside the `subquery` stage.
pub const VALUE_ALIAS: &str = "value";

/// Optional explicit range. Both bounds must be set for them to replace the min/max scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramOptions {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl HistogramOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn with_bounds(self, min: f64, max: f64) -> Self {
        self.with_min(min).with_max(max)
    }

    /// Both bounds, if both were given.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.min.zip(self.max)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, bound) in [("min", self.min), ("max", self.max)] {
            if let Some(v) = bound {
                if !v.is_finite() {
                    let reason = format!("{name} must be finite, got {v}");
                    return Err(HistogramError::InvalidBounds(reason));
                }
            }
        }
        if let Some((min, max)) = self.bounds() {
            if min > max {
                let reason = format!("min {min} is greater than max {max}");
                return Err(HistogramError::InvalidBounds(reason));
            }
            // bucket boundaries are interpolated inside [min, max] in float8
            if !(max - min).is_finite() {
                let reason = format!("range {min}..{max} does not fit in a float8");
                return Err(HistogramError::InvalidBounds(reason));
            }
        }
        Ok(())
    }
}

pub fn validate_bins_count(bins_count: i64) -> Result<i64> {
    if bins_count < 1 || bins_count > i32::MAX as i64 {
        // width_bucket takes an int4 count
        return Err(HistogramError::InvalidBinsCount(bins_count));
    }
    Ok(bins_count)
}

/// Composes the three-stage histogram statement. The string is rendered once per builder.
#[derive(Debug)]
pub struct QueryBuilder {
    subquery: String,
    bins_count: i64,
    bounds: Option<(String, String)>, // quoted literals
    sql: OnceCell<String>,
}

impl QueryBuilder {
    pub fn new<D, S>(
        dialect: &D,
        dataset: &S,
        field: &Field,
        bins_count: i64,
        options: &HistogramOptions,
    ) -> Result<Self>
    where
        D: Dialect + ?Sized,
        S: Dataset + ?Sized,
    {
        let bins_count = validate_bins_count(bins_count)?;
        options.validate()?;
        let subquery = dataset.select(&field.to_sql(dialect), VALUE_ALIAS);
        let bounds = options
            .bounds()
            .map(|(min, max)| (dialect.quote(min), dialect.quote(max)));
        Ok(QueryBuilder { subquery, bins_count, bounds, sql: OnceCell::new() })
    }

    pub fn bins_count(&self) -> i64 {
        self.bins_count
    }

    /// True when explicit bounds replace the aggregate min/max scan.
    pub fn uses_explicit_bounds(&self) -> bool {
        self.bounds.is_some()
    }

    pub fn build(&self) -> &str {
        self.sql.get_or_init(|| {
            let sql = self.render();
            tracing::debug!(bins = self.bins_count, %sql, "built histogram query");
            sql
        })
    }

    fn render(&self) -> String {
        let n = self.bins_count;
        let bounds = match &self.bounds {
            Some((min, max)) => format!("SELECT {min} AS min_value, {max} AS max_value"),
            None => "SELECT min(value)::float8 AS min_value, max(value)::float8 AS max_value \
                     FROM subquery WHERE value IS NOT NULL"
                .to_owned(),
        };
        // explicit bounds need not cover the data; outliers fall in no bucket
        let range_filter = if self.bounds.is_some() {
            " AND value::float8 BETWEEN min_value AND max_value"
        } else {
            ""
        };
        // width_bucket only guesses the bucket. Its rounding can disagree with the
        // reported boundaries, so the guess moves by one to keep
        // boundary(id - 1) <= value < boundary(id)
        format!(
            "WITH subquery AS ({subquery}), \
             min_max AS (\
             SELECT min_value, max_value, max_value / {n} - min_value / {n} AS step \
             FROM ({bounds}) AS bounds), \
             histogram AS (\
             SELECT id, count(*) AS size, min(value) AS min, max(value) AS max \
             FROM (\
             SELECT value, CASE WHEN min_value = max_value THEN 1 \
             WHEN value < {guess_inf} THEN guess - 1 \
             WHEN guess < {n} AND value >= {guess_sup} THEN guess + 1 \
             ELSE guess END AS id \
             FROM (\
             SELECT value::float8 AS value, CASE WHEN min_value = max_value THEN 1 \
             ELSE least(width_bucket(value::float8, min_value, max_value, {n}), {n}) \
             END AS guess \
             FROM subquery, min_max \
             WHERE value IS NOT NULL{range_filter}) AS guessed, min_max) AS bucketed \
             GROUP BY id) \
             SELECT id::bigint AS id, size::bigint AS size, {inf} AS inf, \
             CASE WHEN id = {n} THEN max_value ELSE {sup} END AS sup, \
             min, max \
             FROM histogram, min_max \
             ORDER BY id",
            subquery = self.subquery,
            guess_inf = boundary("(guess - 1)"),
            guess_sup = boundary("guess"),
            inf = boundary("(id - 1)"),
            sup = boundary("id"),
        )
    }
}

/// Lower edge of bucket `k + 1`. `step` is `max/n - min/n`, which stays finite
/// whenever both bounds are.
fn boundary(k: &str) -> String {
    format!("min_value + step * {k}")
}
