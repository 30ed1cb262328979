//! Table schema and scalar value model.
//!
//! A schema is an ordered list of named, typed columns; rows are records
//! mapping column names to scalar [`Value`]s. The type set mirrors the
//! store's scalar types, not XLSX's — translating between the two is the
//! job of the [`crate::convert`] module.

mod types;
mod value;

pub use types::{Column, ColumnType, Schema};
pub use value::{Record, Value};
