//! Request plumbing over a scripted connection: statement dispatch, row
//! mapping and error propagation. Bucketing itself is exercised against a
//! server in `postgres_test.rs`.

use binsql_core::{
    fetch, histogram, Bin, Connection, Dialect, Field, Histogram, HistogramError, HistogramOptions,
    RawQuery, Result, Row, Table, Value,
};

/// Hands back canned rows and records every statement it is asked to run.
struct ScriptedConnection {
    adapter: &'static str,
    rows: Vec<Row>,
    fail: bool,
    executed: Vec<String>,
}

impl ScriptedConnection {
    fn postgres(rows: Vec<Row>) -> Self {
        ScriptedConnection { adapter: "postgresql", rows, fail: false, executed: Vec::new() }
    }
}

impl Dialect for ScriptedConnection {
    fn adapter_name(&self) -> &str {
        self.adapter
    }
}

impl Connection for ScriptedConnection {
    fn execute(&mut self, sql: &str) -> Result<Vec<Row>> {
        self.executed.push(sql.to_owned());
        if self.fail {
            let err = std::io::Error::other("column \"nope\" does not exist");
            return Err(HistogramError::Query(Box::new(err)));
        }
        Ok(self.rows.clone())
    }
}

/// A row the way the simple-query protocol delivers it: all text.
fn text_row(id: i64, size: u64, inf: f64, sup: f64, min: f64, max: f64) -> Row {
    Row::new()
        .with("id", Value::Text(id.to_string()))
        .with("size", Value::Text(size.to_string()))
        .with("inf", Value::Text(inf.to_string()))
        .with("sup", Value::Text(sup.to_string()))
        .with("min", Value::Text(min.to_string()))
        .with("max", Value::Text(max.to_string()))
}

fn canned_rows() -> Vec<Row> {
    vec![
        text_row(1, 4, 1.0, 20.8, 1.0, 4.0),
        text_row(5, 1, 80.2, 100.0, 100.0, 100.0),
    ]
}

fn readings() -> Table {
    Table::new("readings")
}

#[test]
fn text_rows_map_to_bins_in_statement_order() {
    let mut conn = ScriptedConnection::postgres(canned_rows());
    let bins = histogram(&mut conn, &readings(), &Field::from("v"), 5, HistogramOptions::new())
        .unwrap();
    assert_eq!(
        bins,
        vec![
            Bin { id: 1, size: 4, inf: 1.0, sup: 20.8, min: 1.0, max: 4.0 },
            Bin { id: 5, size: 1, inf: 80.2, sup: 100.0, min: 100.0, max: 100.0 },
        ]
    );
    assert_eq!(conn.executed.len(), 1);
    assert!(conn.executed[0].contains("FROM \"readings\""));
}

#[test]
fn explicit_bounds_reach_the_statement_as_literals() {
    let mut conn = ScriptedConnection::postgres(Vec::new());
    let opts = HistogramOptions::new().with_bounds(0.0, 100.0);
    histogram(&mut conn, &readings(), &Field::from("v"), 2, opts).unwrap();
    let sql = &conn.executed[0];
    assert!(sql.contains("'0.0'::float8 AS min_value, '100.0'::float8 AS max_value"));
    assert!(!sql.contains("min(value)::float8 AS min_value"));
}

#[test]
fn unsupported_adapter_rejected_before_any_statement() {
    let mut conn =
        ScriptedConnection { adapter: "sqlite3", ..ScriptedConnection::postgres(canned_rows()) };
    let err = Histogram::new(&mut conn, &readings(), &Field::from("v"), 5, HistogramOptions::new())
        .err();
    assert!(matches!(
        err,
        Some(HistogramError::UnsupportedAdapter { ref adapter }) if adapter == "sqlite3"
    ));
    assert!(conn.executed.is_empty());
}

#[test]
fn fetch_checks_adapter_too() {
    let mut conn =
        ScriptedConnection { adapter: "mysql2", ..ScriptedConnection::postgres(Vec::new()) };
    let err = fetch(&mut conn, "SELECT 1").unwrap_err();
    assert!(matches!(err, HistogramError::UnsupportedAdapter { .. }));
    assert!(conn.executed.is_empty());
}

#[test]
fn invalid_bins_count_rejected_before_any_statement() {
    let mut conn = ScriptedConnection::postgres(canned_rows());
    let err = Histogram::new(&mut conn, &readings(), &Field::from("v"), 0, HistogramOptions::new())
        .err();
    assert!(matches!(err, Some(HistogramError::InvalidBinsCount(0))));
    assert!(conn.executed.is_empty());
}

#[test]
fn overflowing_bounds_rejected_before_any_statement() {
    let mut conn = ScriptedConnection::postgres(canned_rows());
    let opts = HistogramOptions::new().with_bounds(-1e308, 1e308);
    let err = histogram(&mut conn, &readings(), &Field::from("v"), 4, opts).unwrap_err();
    assert!(matches!(err, HistogramError::InvalidBounds(_)));
    assert!(conn.executed.is_empty());
}

#[test]
fn bins_are_memoized_per_request() {
    let mut conn = ScriptedConnection::postgres(canned_rows());
    {
        let mut h =
            Histogram::new(&mut conn, &readings(), &Field::from("v"), 5, HistogramOptions::new())
                .unwrap();
        let sql_a = h.to_sql().to_owned();
        let first = h.bins().unwrap().to_vec();
        let second = h.bins().unwrap().to_vec();
        assert_eq!(first, second);
        assert_eq!(h.to_sql(), sql_a);
    }
    assert_eq!(conn.executed.len(), 1);

    // a fresh request queries again
    histogram(&mut conn, &readings(), &Field::from("v"), 5, HistogramOptions::new()).unwrap();
    assert_eq!(conn.executed.len(), 2);
}

#[test]
fn query_errors_pass_through() {
    let mut conn = ScriptedConnection { fail: true, ..ScriptedConnection::postgres(canned_rows()) };
    let err = histogram(&mut conn, &readings(), &Field::from("nope"), 5, HistogramOptions::new())
        .unwrap_err();
    match err {
        HistogramError::Query(source) => assert!(source.to_string().contains("does not exist")),
        other => panic!("expected Query error, got {other:?}"),
    }
}

#[test]
fn one_bad_row_fails_the_whole_result() {
    let mut rows = canned_rows();
    rows.push(Row::new().with("id", Value::Int(6)).with("size", Value::Int(1)));
    let mut conn = ScriptedConnection::postgres(rows);
    let err = histogram(&mut conn, &readings(), &Field::from("v"), 5, HistogramOptions::new())
        .unwrap_err();
    assert!(matches!(err, HistogramError::Mapping { ref column, .. } if column == "inf"));
}

#[test]
fn no_rows_means_no_bins() {
    let mut conn = ScriptedConnection::postgres(Vec::new());
    let ds = RawQuery::new("SELECT v FROM readings WHERE false");
    let bins = histogram(&mut conn, &ds, &Field::from("v"), 5, HistogramOptions::new()).unwrap();
    assert!(bins.is_empty());
}

#[test]
fn request_owns_its_connection() {
    let conn = ScriptedConnection::postgres(canned_rows());
    let mut h =
        Histogram::new(conn, &readings(), &Field::from("v"), 5, HistogramOptions::new()).unwrap();
    assert_eq!(h.bins_count(), 5);
    assert_eq!(h.bins().unwrap().len(), 2);
    assert_eq!(h.connection().executed.len(), 1);
    let conn = h.into_connection();
    assert_eq!(conn.executed.len(), 1);
}
