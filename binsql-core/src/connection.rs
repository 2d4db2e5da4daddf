use binsql_common::{HistogramError, Result, SUPPORTED_ADAPTERS};
use serde::{Deserialize, Serialize};

use crate::quote;

// --- row values ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// One result row; columns keep the order the statement produced them in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: &str, value: Value) {
        self.columns.push((name.to_owned(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Row { columns: iter.into_iter().collect() }
    }
}

// --- dialect and connection seams ---

/// Quoting rules and adapter identity of a SQL engine.
pub trait Dialect {
    fn adapter_name(&self) -> &str;

    fn quote(&self, value: f64) -> String {
        quote::literal(value)
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote::identifier(name)
    }
}

/// A live session able to run one statement and hand back named rows.
pub trait Connection: Dialect {
    fn execute(&mut self, sql: &str) -> Result<Vec<Row>>;
}

impl<D: Dialect + ?Sized> Dialect for &D {
    fn adapter_name(&self) -> &str {
        (**self).adapter_name()
    }
    fn quote(&self, value: f64) -> String {
        (**self).quote(value)
    }
    fn quote_identifier(&self, name: &str) -> String {
        (**self).quote_identifier(name)
    }
}

impl<D: Dialect + ?Sized> Dialect for &mut D {
    fn adapter_name(&self) -> &str {
        (**self).adapter_name()
    }
    fn quote(&self, value: f64) -> String {
        (**self).quote(value)
    }
    fn quote_identifier(&self, name: &str) -> String {
        (**self).quote_identifier(name)
    }
}

impl<C: Connection + ?Sized> Connection for &mut C {
    fn execute(&mut self, sql: &str) -> Result<Vec<Row>> {
        (**self).execute(sql)
    }
}

/// PostgreSQL quoting without a server, for rendering statements offline.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn adapter_name(&self) -> &str {
        "postgresql"
    }
}

pub fn is_supported_adapter(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    SUPPORTED_ADAPTERS.contains(&lower.as_str())
}

pub fn assert_supported<D: Dialect + ?Sized>(dialect: &D) -> Result<()> {
    let adapter = dialect.adapter_name();
    if is_supported_adapter(adapter) {
        Ok(())
    } else {
        tracing::warn!(adapter, "rejecting connection without width_bucket support");
        Err(HistogramError::UnsupportedAdapter { adapter: adapter.to_owned() })
    }
}
