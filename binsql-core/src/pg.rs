use binsql_common::{HistogramError, Result};
use postgres::{Client, NoTls, SimpleQueryMessage};

use crate::connection::{Connection, Dialect, Row, Value};

/// A live PostgreSQL (or PostGIS) session.
pub struct PgConnection {
    client: Client,
    adapter: String,
}

impl std::fmt::Debug for PgConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgConnection")
            .field("adapter", &self.adapter)
            .field("closed", &self.client.is_closed())
            .finish()
    }
}

impl PgConnection {
    pub const DEFAULT_ADAPTER: &'static str = "postgresql";

    /// Connects with a libpq-style URL or key/value string, without TLS.
    pub fn connect(params: &str) -> Result<Self> {
        let client = Client::connect(params, NoTls).map_err(query_error)?;
        tracing::debug!("connected to postgres");
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        PgConnection { client, adapter: Self::DEFAULT_ADAPTER.to_owned() }
    }

    /// Declared adapter name, e.g. `postgis`; checked against the supported set on use.
    pub fn with_adapter_name(mut self, adapter: &str) -> Self {
        self.adapter = adapter.to_owned();
        self
    }

    pub fn client(&mut self) -> &mut Client {
        &mut self.client
    }
}

fn query_error(err: postgres::Error) -> HistogramError {
    HistogramError::Query(Box::new(err))
}

impl Dialect for PgConnection {
    fn adapter_name(&self) -> &str {
        &self.adapter
    }
}

impl Connection for PgConnection {
    /// Simple-query protocol: every cell arrives as text, coercion is left to the caller.
    fn execute(&mut self, sql: &str) -> Result<Vec<Row>> {
        let messages = self.client.simple_query(sql).map_err(query_error)?;
        let mut rows = Vec::new();
        for message in messages {
            if let SimpleQueryMessage::Row(row) = message {
                let mut out = Row::new();
                for (idx, col) in row.columns().iter().enumerate() {
                    let value = match row.try_get(idx).map_err(query_error)? {
                        Some(text) => Value::Text(text.to_owned()),
                        None => Value::Null,
                    };
                    out.push(col.name(), value);
                }
                rows.push(out);
            }
        }
        tracing::debug!(rows = rows.len(), "statement executed");
        Ok(rows)
    }
}
