use binsql_common::Result;

use super::bin::Bin;
use super::query::{HistogramOptions, QueryBuilder};
use crate::connection::{assert_supported, Connection};
use crate::dataset::{Dataset, Field};

/// Runs `sql` on `connection` and maps every row to a [`Bin`].
/// A failure anywhere yields no bins at all.
pub fn fetch<C: Connection + ?Sized>(connection: &mut C, sql: &str) -> Result<Vec<Bin>> {
    assert_supported(&*connection)?;
    let rows = connection.execute(sql)?;
    let bins = rows.iter().map(Bin::from_row).collect::<Result<Vec<_>>>()?;
    tracing::info!(adapter = connection.adapter_name(), bins = bins.len(), "fetched histogram");
    Ok(bins)
}

/// A validated histogram request bound to one connection.
///
/// The adapter is checked once in [`Histogram::new`]; afterwards the statement
/// is rendered at most once and executed at most once, however often
/// [`Histogram::to_sql`] and [`Histogram::bins`] are called.
pub struct Histogram<C> {
    connection: C,
    query: QueryBuilder,
    bins: Option<Vec<Bin>>,
}

impl<C: Connection> Histogram<C> {
    pub fn new<S: Dataset + ?Sized>(
        connection: C,
        dataset: &S,
        field: &Field,
        bins_count: i64,
        options: HistogramOptions,
    ) -> Result<Self> {
        assert_supported(&connection)?;
        let query = QueryBuilder::new(&connection, dataset, field, bins_count, &options)?;
        Ok(Histogram { connection, query, bins: None })
    }

    pub fn bins_count(&self) -> i64 {
        self.query.bins_count()
    }

    pub fn to_sql(&self) -> &str {
        self.query.build()
    }

    pub fn bins(&mut self) -> Result<&[Bin]> {
        let bins = match self.bins.take() {
            Some(bins) => bins,
            None => fetch(&mut self.connection, self.query.build())?,
        };
        Ok(self.bins.insert(bins).as_slice())
    }

    pub fn into_bins(mut self) -> Result<Vec<Bin>> {
        self.bins()?;
        Ok(self.bins.unwrap_or_default())
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn into_connection(self) -> C {
        self.connection
    }
}

/// One-shot entry point: validate the adapter, build the statement, fetch the bins.
pub fn histogram<C, S>(
    connection: &mut C,
    dataset: &S,
    field: &Field,
    bins_count: i64,
    options: HistogramOptions,
) -> Result<Vec<Bin>>
where
    C: Connection + ?Sized,
    S: Dataset + ?Sized,
{
    Histogram::new(connection, dataset, field, bins_count, options)?.into_bins()
}
