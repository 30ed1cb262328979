//! Export direction: store value → XLSX cell.

use chrono::DateTime;
use thiserror::Error;

use crate::config::{EPOCH_SHIFT_DAYS, MAX_CELL_TEXT_LEN, MICROS_PER_DAY, SECONDS_PER_DAY};
use crate::schema::{ColumnType, Value};
use crate::workbook::{Cell, CellValue};

use super::styles::CellStyles;
use super::NumberPrecisionMode;

/// Failure to encode one value.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The value does not fit in an XLSX number and the precision mode
    /// forbids degrading it.
    #[error("can not fit {value} in an excel number; use another number precision mode")]
    PrecisionLoss {
        /// Decimal form of the offending value.
        value: String,
    },

    /// The value's runtime kind does not match the column type. Points at
    /// a corrupted row or a schema drift, not at the request.
    #[error("unexpected {got} value in a {column_type} column")]
    ValueMismatch {
        /// Declared column type token.
        column_type: String,
        /// Kind of the value actually found.
        got: &'static str,
    },

    /// The value lies outside the representable calendar range.
    #[error("value {0} is outside the representable time range")]
    OutOfRange(u64),

    /// Tagged-data serialization failed.
    #[error("error encoding value to tagged notation: {0}")]
    Tagged(#[from] serde_json::Error),
}

impl EncodeError {
    fn mismatch(column_type: &ColumnType, value: &Value) -> Self {
        EncodeError::ValueMismatch {
            column_type: column_type.to_string(),
            got: value.kind(),
        }
    }
}

/// Encodes a typed store value into a cell.
///
/// `value` must not be [`Value::Null`]; the caller skips null cells.
pub fn encode(
    column_type: &ColumnType,
    value: &Value,
    mode: NumberPrecisionMode,
    styles: &CellStyles,
) -> Result<Cell, EncodeError> {
    match column_type {
        ColumnType::Int8 | ColumnType::Int16 | ColumnType::Int32 => match value {
            Value::Int64(v) => Ok(Cell::styled(CellValue::Int(*v), styles.number)),
            other => Err(EncodeError::mismatch(column_type, other)),
        },
        ColumnType::Uint8 | ColumnType::Uint16 | ColumnType::Uint32 => match value {
            Value::Uint64(v) => Ok(Cell::styled(CellValue::Uint(*v), styles.number)),
            other => Err(EncodeError::mismatch(column_type, other)),
        },
        ColumnType::Int64 => match value {
            Value::Int64(v) => encode_large_int(CellValue::Int(*v), fits_i64(*v), mode, styles),
            other => Err(EncodeError::mismatch(column_type, other)),
        },
        ColumnType::Uint64 => match value {
            Value::Uint64(v) => encode_large_int(CellValue::Uint(*v), fits_u64(*v), mode, styles),
            other => Err(EncodeError::mismatch(column_type, other)),
        },
        ColumnType::Float32 | ColumnType::Float64 => match value {
            Value::Float(v) => encode_float(*v, mode),
            other => Err(EncodeError::mismatch(column_type, other)),
        },
        ColumnType::Boolean => match value {
            Value::Boolean(v) => Ok(Cell::plain(CellValue::Bool(*v))),
            other => Err(EncodeError::mismatch(column_type, other)),
        },
        ColumnType::String => match value {
            Value::String(v) => Ok(Cell::text(clip_text(v))),
            Value::Bytes(v) => Ok(Cell::text(clip_bytes(v))),
            other => Err(EncodeError::mismatch(column_type, other)),
        },
        ColumnType::Bytes => match value {
            Value::Bytes(v) => Ok(Cell::text(clip_bytes(v))),
            Value::String(v) => Ok(Cell::text(clip_bytes(v.as_bytes()))),
            other => Err(EncodeError::mismatch(column_type, other)),
        },
        ColumnType::Any => {
            let text = serde_json::to_string(&value_as_tagged(value))?;
            Ok(Cell::text(clip_text(&text)))
        }
        ColumnType::Date => match value {
            Value::Uint64(days) => {
                let serial = days
                    .checked_add(EPOCH_SHIFT_DAYS)
                    .ok_or(EncodeError::OutOfRange(*days))?;
                Ok(Cell::styled(CellValue::Uint(serial), styles.date))
            }
            other => Err(EncodeError::mismatch(column_type, other)),
        },
        ColumnType::Datetime => match value {
            Value::Uint64(seconds) => {
                let shifted = seconds
                    .checked_add(EPOCH_SHIFT_DAYS * SECONDS_PER_DAY)
                    .ok_or(EncodeError::OutOfRange(*seconds))?;
                let serial = shifted as f64 / SECONDS_PER_DAY as f64;
                Ok(Cell::styled(CellValue::Float(serial), styles.datetime))
            }
            other => Err(EncodeError::mismatch(column_type, other)),
        },
        ColumnType::Timestamp => match value {
            Value::Uint64(micros) => encode_timestamp(*micros, styles),
            other => Err(EncodeError::mismatch(column_type, other)),
        },
        ColumnType::Interval => match value {
            Value::Int64(v) => encode_large_int(CellValue::Int(*v), fits_i64(*v), mode, styles),
            other => Err(EncodeError::mismatch(column_type, other)),
        },
        ColumnType::Other(_) => Ok(Cell::text("UNSUPPORTED")),
    }
}

fn encode_large_int(
    cell: CellValue,
    fits: bool,
    mode: NumberPrecisionMode,
    styles: &CellStyles,
) -> Result<Cell, EncodeError> {
    if fits {
        return Ok(Cell::styled(cell, styles.number));
    }
    match mode {
        NumberPrecisionMode::Error => Err(EncodeError::PrecisionLoss {
            value: cell.raw_text(),
        }),
        NumberPrecisionMode::String => Ok(Cell::text(cell.raw_text())),
        NumberPrecisionMode::Lose => Ok(Cell::styled(cell, styles.number)),
    }
}

fn encode_float(v: f64, mode: NumberPrecisionMode) -> Result<Cell, EncodeError> {
    if fits_f64(v) {
        return Ok(Cell::plain(CellValue::Float(v)));
    }
    match mode {
        NumberPrecisionMode::Error => Err(EncodeError::PrecisionLoss {
            value: v.to_string(),
        }),
        NumberPrecisionMode::String => Ok(Cell::text(v.to_string())),
        NumberPrecisionMode::Lose => Ok(Cell::plain(CellValue::Float(v))),
    }
}

/// XLSX stores millisecond time at best. Timestamps on a millisecond
/// boundary become serial numbers; anything finer is written as ISO-8601
/// text so no precision is lost.
fn encode_timestamp(micros: u64, styles: &CellStyles) -> Result<Cell, EncodeError> {
    if micros % 1000 == 0 {
        let shifted = micros
            .checked_add(EPOCH_SHIFT_DAYS * MICROS_PER_DAY)
            .ok_or(EncodeError::OutOfRange(micros))?;
        let serial = shifted as f64 / MICROS_PER_DAY as f64;
        return Ok(Cell::styled(CellValue::Float(serial), styles.timestamp));
    }

    let secs = (micros / 1_000_000) as i64;
    let nanos = (micros % 1_000_000) as u32 * 1000;
    let t = DateTime::from_timestamp(secs, nanos).ok_or(EncodeError::OutOfRange(micros))?;
    Ok(Cell::text(t.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()))
}

fn value_as_tagged(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Int64(v) => serde_json::Value::from(*v),
        Value::Uint64(v) => serde_json::Value::from(*v),
        Value::Float(v) => {
            serde_json::Number::from_f64(*v).map_or(serde_json::Value::Null, serde_json::Value::Number)
        }
        Value::Boolean(v) => serde_json::Value::from(*v),
        Value::String(v) => serde_json::Value::from(v.clone()),
        Value::Bytes(v) => serde_json::Value::from(String::from_utf8_lossy(v).into_owned()),
        Value::Any(v) => v.clone(),
    }
}

fn clip_text(s: &str) -> String {
    match s.char_indices().nth(MAX_CELL_TEXT_LEN) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}

fn clip_bytes(b: &[u8]) -> String {
    let clipped = if b.len() > MAX_CELL_TEXT_LEN {
        &b[..MAX_CELL_TEXT_LEN]
    } else {
        b
    };
    String::from_utf8_lossy(clipped).into_owned()
}

fn fits_i64(v: i64) -> bool {
    significant_digits(&v.unsigned_abs().to_string()) <= 15
}

fn fits_u64(v: u64) -> bool {
    significant_digits(&v.to_string()) <= 15
}

/// An XLSX number is an IEEE-754 double: ~15 significant decimal digits.
/// The mantissa of the shortest scientific form carries exactly the
/// significant digits of the value.
fn fits_f64(v: f64) -> bool {
    let formatted = format!("{v:e}");
    let mantissa = formatted.split('e').next().unwrap_or(&formatted);
    significant_digits(mantissa) <= 15
}

fn significant_digits(s: &str) -> usize {
    s.trim_start_matches('-')
        .trim_start_matches('0')
        .replace('.', "")
        .trim_end_matches('0')
        .len()
}
