//! Scalar values carried in table rows.

use std::collections::BTreeMap;
use std::fmt;

/// One row of a table: column name to scalar value.
///
/// Ordered map so that row rendering in errors and logs is deterministic.
pub type Record = BTreeMap<String, Value>;

/// A scalar value as read from, or written to, the table store.
///
/// Calendar types travel as their underlying integers (`date` in days,
/// `datetime` in seconds, `timestamp` in microseconds — all unsigned;
/// `interval` as signed microseconds); the column type decides the
/// interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value (nullable column).
    Null,
    /// Signed integer of any width up to 64 bits.
    Int64(i64),
    /// Unsigned integer of any width up to 64 bits.
    Uint64(u64),
    /// IEEE-754 double (also carries `float32` values).
    Float(f64),
    /// Boolean.
    Boolean(bool),
    /// UTF-8 text.
    String(String),
    /// Raw octets.
    Bytes(Vec<u8>),
    /// Arbitrary value in the store's tagged-data notation.
    Any(serde_json::Value),
}

impl Value {
    /// Short tag for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int64(_) => "int64",
            Value::Uint64(_) => "uint64",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Any(_) => "any",
        }
    }

    /// True for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("#null"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Uint64(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
            Value::Bytes(v) => write!(f, "{}", String::from_utf8_lossy(v)),
            Value::Any(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Int64(-64).to_string(), "-64");
        assert_eq!(Value::Uint64(64).to_string(), "64");
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(Value::Null.to_string(), "#null");
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(Value::Float(1.5).kind(), "float");
        assert_eq!(Value::Any(serde_json::json!({"a": 1})).kind(), "any");
    }
}
