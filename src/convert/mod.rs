//! Type conversion between store scalars and XLSX cells.
//!
//! [`encode`] turns a typed store value into a cell (export direction),
//! [`decode`] turns raw cell text into a typed store value (upload
//! direction). Both switch on the closed [`crate::schema::ColumnType`] set;
//! calendar types shift between the unix epoch and the XLSX serial-date
//! origin, and numbers wider than an IEEE-754 double's 15 significant
//! digits go through the request's [`NumberPrecisionMode`].

mod decode;
mod encode;
mod styles;

pub use decode::{decode, parse_bool, DecodeError};
pub use encode::{encode, EncodeError};
pub use styles::CellStyles;

use crate::error_handling::BridgeError;

/// Policy for numbers that cannot survive the round-trip through an XLSX
/// number (an IEEE-754 double with 15 significant decimal digits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberPrecisionMode {
    /// Fail the whole operation, naming the offending value.
    Error,
    /// Emit the exact decimal text instead of a number.
    #[default]
    String,
    /// Emit the number anyway and accept the rounding.
    Lose,
}

impl NumberPrecisionMode {
    /// Token used in requests.
    pub fn as_str(self) -> &'static str {
        match self {
            NumberPrecisionMode::Error => "error",
            NumberPrecisionMode::String => "string",
            NumberPrecisionMode::Lose => "lose",
        }
    }

    /// Parses the request parameter. An absent/empty parameter means
    /// [`NumberPrecisionMode::String`].
    pub fn from_param(s: &str) -> Result<Self, BridgeError> {
        match s {
            "" => Ok(NumberPrecisionMode::String),
            "error" => Ok(NumberPrecisionMode::Error),
            "string" => Ok(NumberPrecisionMode::String),
            "lose" => Ok(NumberPrecisionMode::Lose),
            other => Err(BridgeError::bad_request(format!(
                "unexpected number precision mode {other:?}; expected one of \"error\", \"string\", \"lose\""
            ))),
        }
    }
}

impl std::fmt::Display for NumberPrecisionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
