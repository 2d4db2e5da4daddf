//! PostgreSQL quoting rules for literals and identifiers.

/// Quoted `float8` literal. Callers reject non-finite values first.
pub fn literal(value: f64) -> String {
    // `{:?}` keeps a decimal point and full precision, e.g. 100.0 or 0.1
    format!("'{value:?}'::float8")
}

pub fn identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `schema.table` quoted segment by segment.
pub fn qualified_identifier(name: &str) -> String {
    name.split('.').map(identifier).collect::<Vec<_>>().join(".")
}

pub fn string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
