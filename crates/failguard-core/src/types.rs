//! Core types for failguard

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A database value that can represent any SQL type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value
    Null,
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    /// Decimal/Numeric (stored as string for precision)
    Decimal(String),
    /// UTF-8 string
    String(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    /// DateTime without timezone
    DateTime(NaiveDateTime),
    /// DateTime with timezone (UTC)
    DateTimeUtc(DateTime<Utc>),
    Json(serde_json::Value),
    Array(Vec<Value>),
}

impl Value {
    /// Try to get as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Decimal(v) | Value::String(v) => write!(f, "{}", v),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::Uuid(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v),
            Value::Time(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v),
            Value::DateTimeUtc(v) => write!(f, "{}", v),
            Value::Json(v) => write!(f, "{}", v),
            Value::Array(v) => write!(f, "[{} items]", v.len()),
        }
    }
}

/// A row from a query result; values are in [`QueryResult::columns`] order
#[derive(Debug, Clone)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Get a value by column index
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

/// Column metadata
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ColumnMeta {
    #[serde(default)]
    pub name: String,
    /// Data type (database-specific string)
    #[serde(default)]
    pub data_type: String,
    #[serde(default)]
    pub nullable: bool,
    /// Column ordinal position (0-based)
    #[serde(default)]
    pub ordinal: usize,
}

/// Query result
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Unique query ID
    pub id: Uuid,
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Row>,
    /// Rows affected (for DML statements)
    pub affected_rows: u64,
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Create a new empty query result
    pub fn empty() -> Self {
        Self {
            id: Uuid::new_v4(),
            columns: Vec::new(),
            rows: Vec::new(),
            affected_rows: 0,
            execution_time_ms: 0,
        }
    }

    /// Build a result from column names and row values, typing every column as text.
    ///
    /// Handy for drivers that only speak the simple query protocol and for test doubles.
    pub fn from_rows(column_names: &[&str], rows: Vec<Vec<Value>>) -> Self {
        let columns = column_names
            .iter()
            .enumerate()
            .map(|(ordinal, name)| ColumnMeta {
                name: name.to_string(),
                data_type: "text".to_string(),
                nullable: true,
                ordinal,
            })
            .collect();
        let rows = rows.into_iter().map(Row::new).collect();

        Self {
            columns,
            rows,
            ..Self::empty()
        }
    }

    pub fn has_rows(&self) -> bool {
        !self.rows.is_empty()
    }

    /// First column of the first row, if any
    pub fn first_value(&self) -> Option<&Value> {
        self.rows.first().and_then(|row| row.get(0))
    }
}

/// Result of a statement that does not return rows
#[derive(Debug, Clone)]
pub struct StatementResult {
    /// Whether this was a query (SELECT) or a command (INSERT/UPDATE/DELETE)
    pub is_query: bool,
    /// Query result (if is_query is true)
    pub result: Option<QueryResult>,
    /// Rows affected (if is_query is false)
    pub affected_rows: u64,
    /// Error message (if execution failed)
    pub error: Option<String>,
}
