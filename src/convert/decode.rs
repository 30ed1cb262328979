//! Upload direction: raw cell text → typed store value.

use thiserror::Error;

use crate::config::{EPOCH_SHIFT_DAYS, MICROS_PER_DAY, SECONDS_PER_DAY};
use crate::schema::{Column, ColumnType, Value};

/// Failure to decode one cell.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The cell is empty and the column is optional; the caller skips the
    /// field instead of writing a value.
    #[error("optional field is empty")]
    OptionalEmpty,

    /// The text does not parse as the target type.
    #[error("unable to parse {value:?} as {target}: {reason}")]
    Parse {
        /// Offending cell text.
        value: String,
        /// Target column type token.
        target: String,
        /// Human-readable parse failure.
        reason: String,
    },

    /// The column carries a type outside the canonical set.
    #[error("unexpected type {0}")]
    UnsupportedType(String),
}

fn parse_err(value: &str, target: &ColumnType, reason: impl ToString) -> DecodeError {
    DecodeError::Parse {
        value: value.to_string(),
        target: target.to_string(),
        reason: reason.to_string(),
    }
}

/// Decodes raw cell text into a value of the column's type.
///
/// Empty text in an optional column signals [`DecodeError::OptionalEmpty`];
/// empty text in a required column is a plain parse failure.
pub fn decode(column: &Column, raw: &str) -> Result<Value, DecodeError> {
    if raw.is_empty() && !column.required {
        return Err(DecodeError::OptionalEmpty);
    }

    let t = &column.column_type;
    match t {
        ColumnType::Int8 => parse_int::<i8>(raw, t),
        ColumnType::Int16 => parse_int::<i16>(raw, t),
        ColumnType::Int32 => parse_int::<i32>(raw, t),
        ColumnType::Int64 => parse_int::<i64>(raw, t),
        ColumnType::Uint8 => parse_uint::<u8>(raw, t),
        ColumnType::Uint16 => parse_uint::<u16>(raw, t),
        ColumnType::Uint32 => parse_uint::<u32>(raw, t),
        ColumnType::Uint64 => parse_uint::<u64>(raw, t),
        ColumnType::Float32 => raw
            .parse::<f32>()
            .map(|v| Value::Float(v.into()))
            .map_err(|e| parse_err(raw, t, e)),
        ColumnType::Float64 => raw
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| parse_err(raw, t, e)),
        ColumnType::Boolean => parse_bool(raw)
            .map(Value::Boolean)
            .ok_or_else(|| parse_err(raw, t, "not a boolean literal")),
        ColumnType::String => Ok(Value::String(raw.to_string())),
        ColumnType::Bytes => Ok(Value::Bytes(raw.as_bytes().to_vec())),
        // Unparseable tagged-data text deliberately passes through as raw
        // octets instead of failing the upload.
        ColumnType::Any => Ok(serde_json::from_str(raw)
            .map(Value::Any)
            .unwrap_or_else(|_| Value::Bytes(raw.as_bytes().to_vec()))),
        ColumnType::Date => decode_date(raw, t),
        ColumnType::Datetime => decode_serial(raw, t, SECONDS_PER_DAY),
        ColumnType::Timestamp => decode_serial(raw, t, MICROS_PER_DAY),
        ColumnType::Interval => parse_int::<i64>(raw, t),
        ColumnType::Other(token) => Err(DecodeError::UnsupportedType(token.clone())),
    }
}

fn parse_int<T>(raw: &str, t: &ColumnType) -> Result<Value, DecodeError>
where
    T: std::str::FromStr<Err = std::num::ParseIntError> + Into<i64>,
{
    raw.parse::<T>()
        .map(|v| Value::Int64(v.into()))
        .map_err(|e| parse_err(raw, t, e))
}

fn parse_uint<T>(raw: &str, t: &ColumnType) -> Result<Value, DecodeError>
where
    T: std::str::FromStr<Err = std::num::ParseIntError> + Into<u64>,
{
    raw.parse::<T>()
        .map(|v| Value::Uint64(v.into()))
        .map_err(|e| parse_err(raw, t, e))
}

/// Parses the boolean literals spreadsheets commonly hold, including the
/// `1`/`0` that raw boolean cells store.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// XLSX dates are whole days since the 1900-01-00 origin.
fn decode_date(raw: &str, t: &ColumnType) -> Result<Value, DecodeError> {
    let serial = raw.parse::<u64>().map_err(|e| parse_err(raw, t, e))?;
    let days = serial
        .checked_sub(EPOCH_SHIFT_DAYS)
        .ok_or_else(|| parse_err(raw, t, "dates before 1970-01-01 are not supported"))?;
    Ok(Value::Uint64(days))
}

/// XLSX datetimes and timestamps are fractional days since the serial
/// origin; `units_per_day` selects seconds or microseconds resolution.
fn decode_serial(raw: &str, t: &ColumnType, units_per_day: u64) -> Result<Value, DecodeError> {
    let serial = raw.parse::<f64>().map_err(|e| parse_err(raw, t, e))?;
    if serial < 0.0 {
        return Err(parse_err(raw, t, "serial value must be positive"));
    }
    let units = (serial * units_per_day as f64).round() as u64;
    let since_epoch = units
        .checked_sub(EPOCH_SHIFT_DAYS * units_per_day)
        .ok_or_else(|| parse_err(raw, t, "values before 1970-01-01 are not supported"))?;
    Ok(Value::Uint64(since_epoch))
}
