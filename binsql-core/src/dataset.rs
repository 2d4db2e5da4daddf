use crate::connection::Dialect;
use crate::quote;

/// A filtered row source that can stand in as a sub-select.
pub trait Dataset {
    fn to_sql(&self) -> String;

    /// Statement projecting the dataset down to `projection AS alias`.
    fn select(&self, projection: &str, alias: &str) -> String {
        format!("SELECT {projection} AS {alias} FROM ({}) AS dataset", self.to_sql())
    }
}

impl<T: Dataset + ?Sized> Dataset for &T {
    fn to_sql(&self) -> String {
        (**self).to_sql()
    }
    fn select(&self, projection: &str, alias: &str) -> String {
        (**self).select(projection, alias)
    }
}

// --- table with optional filters ---

#[derive(Debug, Clone)]
pub struct Table {
    name: String, // already quoted
    conditions: Vec<String>,
}

impl Table {
    /// `name` may be schema-qualified (`public.orders`); each segment is quoted.
    pub fn new(name: &str) -> Self {
        Table { name: quote::qualified_identifier(name), conditions: Vec::new() }
    }

    /// Adds a raw SQL condition; multiple conditions are AND-ed.
    pub fn filter(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    /// `column = 'value'` with both sides quoted.
    pub fn filter_eq(self, column: &str, value: &str) -> Self {
        let cond = format!("{} = {}", quote::identifier(column), quote::string(value));
        self.filter(cond)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            return String::new();
        }
        let joined = self
            .conditions
            .iter()
            .map(|c| format!("({c})"))
            .collect::<Vec<_>>()
            .join(" AND ");
        format!(" WHERE {joined}")
    }
}

impl Dataset for Table {
    fn to_sql(&self) -> String {
        format!("SELECT * FROM {}{}", self.name, self.where_clause())
    }

    fn select(&self, projection: &str, alias: &str) -> String {
        // project straight from the table, no derived table needed
        format!("SELECT {projection} AS {alias} FROM {}{}", self.name, self.where_clause())
    }
}

// --- arbitrary caller query ---

#[derive(Debug, Clone)]
pub struct RawQuery(String);

impl RawQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        let sql: String = sql.into();
        RawQuery(sql.trim().trim_end_matches(';').to_owned())
    }
}

impl Dataset for RawQuery {
    fn to_sql(&self) -> String {
        self.0.clone()
    }
}

// --- field reference ---

#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Column name, quoted through the dialect.
    Column(String),
    /// SQL expression inserted verbatim, e.g. `price * quantity`.
    Expression(String),
}

impl Field {
    pub fn column(name: impl Into<String>) -> Self {
        Field::Column(name.into())
    }

    pub fn expression(sql: impl Into<String>) -> Self {
        Field::Expression(sql.into())
    }

    pub fn to_sql<D: Dialect + ?Sized>(&self, dialect: &D) -> String {
        match self {
            Field::Column(name) => dialect.quote_identifier(name),
            Field::Expression(sql) => format!("({sql})"),
        }
    }
}

impl From<&str> for Field {
    fn from(name: &str) -> Self {
        Field::Column(name.to_owned())
    }
}
