//! Column types, columns, and schemas.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Semantic type of a schema column.
///
/// The canonical set is closed; [`ColumnType::Other`] carries tokens the
/// store may emit beyond it, so that reading a schema never fails and the
/// exporter can degrade those cells to an `UNSUPPORTED` marker instead.
/// Strict parsing (schema inference, type rows) goes through [`FromStr`],
/// which rejects unknown tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 8-bit unsigned integer.
    Uint8,
    /// 16-bit unsigned integer.
    Uint16,
    /// 32-bit unsigned integer.
    Uint32,
    /// 64-bit unsigned integer.
    Uint64,
    /// 32-bit IEEE-754 float.
    Float32,
    /// 64-bit IEEE-754 float.
    Float64,
    /// Boolean.
    Boolean,
    /// UTF-8 text.
    String,
    /// Raw octets.
    Bytes,
    /// Arbitrary value in the store's tagged-data notation.
    Any,
    /// Days since 1970-01-01, unsigned.
    Date,
    /// Seconds since 1970-01-01, unsigned.
    Datetime,
    /// Microseconds since 1970-01-01, unsigned.
    Timestamp,
    /// Signed microsecond duration.
    Interval,
    /// A type token outside the canonical set, preserved verbatim.
    Other(String),
}

/// Error returned when a type token is not in the canonical set.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown column type {0:?}")]
pub struct UnknownTypeToken(pub String);

impl ColumnType {
    /// Canonical token for this type, as written in schemas and type rows.
    pub fn as_str(&self) -> &str {
        match self {
            ColumnType::Int8 => "int8",
            ColumnType::Int16 => "int16",
            ColumnType::Int32 => "int32",
            ColumnType::Int64 => "int64",
            ColumnType::Uint8 => "uint8",
            ColumnType::Uint16 => "uint16",
            ColumnType::Uint32 => "uint32",
            ColumnType::Uint64 => "uint64",
            ColumnType::Float32 => "float32",
            ColumnType::Float64 => "float64",
            ColumnType::Boolean => "boolean",
            ColumnType::String => "string",
            ColumnType::Bytes => "bytes",
            ColumnType::Any => "any",
            ColumnType::Date => "date",
            ColumnType::Datetime => "datetime",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Interval => "interval",
            ColumnType::Other(token) => token,
        }
    }

    /// Parses a token, mapping anything outside the canonical set to
    /// [`ColumnType::Other`] instead of failing. Used when decoding schemas
    /// read back from the store.
    pub fn parse_lenient(token: &str) -> ColumnType {
        token
            .parse()
            .unwrap_or_else(|_| ColumnType::Other(token.to_string()))
    }
}

impl FromStr for ColumnType {
    type Err = UnknownTypeToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = match s {
            "int8" => ColumnType::Int8,
            "int16" => ColumnType::Int16,
            "int32" => ColumnType::Int32,
            "int64" => ColumnType::Int64,
            "uint8" => ColumnType::Uint8,
            "uint16" => ColumnType::Uint16,
            "uint32" => ColumnType::Uint32,
            "uint64" => ColumnType::Uint64,
            "float32" => ColumnType::Float32,
            "float64" => ColumnType::Float64,
            "boolean" => ColumnType::Boolean,
            "string" => ColumnType::String,
            "bytes" => ColumnType::Bytes,
            "any" => ColumnType::Any,
            "date" => ColumnType::Date,
            "datetime" => ColumnType::Datetime,
            "timestamp" => ColumnType::Timestamp,
            "interval" => ColumnType::Interval,
            other => return Err(UnknownTypeToken(other.to_string())),
        };
        Ok(t)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ColumnType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        if token.is_empty() {
            return Err(D::Error::custom("column type token is empty"));
        }
        Ok(ColumnType::parse_lenient(&token))
    }
}

/// One column of a table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, unique within the schema.
    pub name: String,
    /// Semantic type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether null/absent values are rejected on write.
    #[serde(default)]
    pub required: bool,
}

impl Column {
    /// Creates an optional column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Column {
            name: name.into(),
            column_type,
            required: false,
        }
    }

    /// Marks the column as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Ordered table schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Columns in declaration order.
    pub columns: Vec<Column>,
}

impl Schema {
    /// Creates a schema from a list of columns.
    pub fn new(columns: Vec<Column>) -> Self {
        Schema { columns }
    }

    /// Names of all columns in declaration order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}
