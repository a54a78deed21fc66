//! Scalar values, rows and statement outcomes

use std::fmt;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::Value;

/// A scalar bound to a positional placeholder or read back from a column.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Text(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl Serialize for SqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Float(n) => serializer.serialize_f64(*n),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Any JSON value is accepted: scalars bind as themselves, booleans as 0/1,
/// and arrays or objects as their JSON text.
impl<'de> Deserialize<'de> for SqlValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from)
    }
}

impl From<Value> for SqlValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Int(i64::from(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or_else(|| Self::Text(n.to_string()), Self::Float),
            },
            Value::String(s) => Self::Text(s),
            other => Self::Text(other.to_string()),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Int(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i32> for SqlValue {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<i64> for SqlValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for SqlValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One result row: column names in select order, each with its value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column push, used by adapters and fakes.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<SqlValue>) {
        self.columns.push((name.into(), value.into()));
    }

    /// Value of the first column with this name.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }
}

/// What a successfully executed statement produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutcome {
    /// Result set of a query, in store order.
    Rows(Vec<Row>),
    /// Effect of a mutation. `last_insert_id` is set for inserts into an
    /// auto-increment table.
    Mutation {
        affected_rows: u64,
        last_insert_id: Option<i64>,
    },
}

impl ExecOutcome {
    pub fn rows(self) -> Option<Vec<Row>> {
        match self {
            Self::Rows(rows) => Some(rows),
            Self::Mutation { .. } => None,
        }
    }

    pub fn affected_rows(&self) -> Option<u64> {
        match self {
            Self::Mutation { affected_rows, .. } => Some(*affected_rows),
            Self::Rows(_) => None,
        }
    }

    pub fn last_insert_id(&self) -> Option<i64> {
        match self {
            Self::Mutation { last_insert_id, .. } => *last_insert_id,
            Self::Rows(_) => None,
        }
    }
}

/// How a statement template should be run: fetch rows, or count effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Query,
    Mutation,
}

impl StatementKind {
    /// Decided by the leading keyword of the template.
    pub fn of(template: &str) -> Self {
        let keyword = template
            .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
            .split(|c: char| !c.is_ascii_alphabetic())
            .next()
            .unwrap_or_default();

        const QUERY_KEYWORDS: [&str; 6] = ["SELECT", "WITH", "SHOW", "VALUES", "EXPLAIN", "PRAGMA"];
        if QUERY_KEYWORDS
            .iter()
            .any(|k| k.eq_ignore_ascii_case(keyword))
        {
            Self::Query
        } else {
            Self::Mutation
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_kind_from_leading_keyword() {
        assert_eq!(StatementKind::of("SELECT * FROM users"), StatementKind::Query);
        assert_eq!(StatementKind::of("  select 1 + 1 AS solution"), StatementKind::Query);
        assert_eq!(StatementKind::of("(SELECT 1)"), StatementKind::Query);
        assert_eq!(
            StatementKind::of("INSERT INTO users (username, email) VALUES (?, ?)"),
            StatementKind::Mutation
        );
        assert_eq!(StatementKind::of("DELETE FROM users WHERE id = ?"), StatementKind::Mutation);
        assert_eq!(StatementKind::of(""), StatementKind::Mutation);
    }

    #[test]
    fn option_none_binds_null() {
        let absent: Option<String> = None;
        assert_eq!(SqlValue::from(absent), SqlValue::Null);
        assert_eq!(SqlValue::from(Some("bob")), SqlValue::Text("bob".into()));
    }

    #[test]
    fn row_lookup_by_column_name() {
        let row = Row::new().with("id", 3).with("username", "carol");
        assert_eq!(row.get("id").and_then(SqlValue::as_i64), Some(3));
        assert_eq!(row.get("username"), Some(&SqlValue::Text("carol".into())));
        assert!(row.get("email").is_none());
    }

    #[test]
    fn json_scalars_bind_as_themselves() {
        let values: Vec<SqlValue> =
            serde_json::from_str(r#"[123, 1.5, "bob", null, true, ["a"]]"#).unwrap();
        assert_eq!(
            values,
            vec![
                SqlValue::Int(123),
                SqlValue::Float(1.5),
                SqlValue::Text("bob".into()),
                SqlValue::Null,
                SqlValue::Int(1),
                SqlValue::Text(r#"["a"]"#.into()),
            ]
        );
    }

    #[test]
    fn display_renders_bare_values() {
        assert_eq!(SqlValue::Int(2).to_string(), "2");
        assert_eq!(SqlValue::Text("bob".into()).to_string(), "bob");
        assert_eq!(SqlValue::Null.to_string(), "NULL");
    }
}
