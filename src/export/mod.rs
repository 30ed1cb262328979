//! Export engine: table store → XLSX workbook.
//!
//! The engine streams rows through the conversion substrate into a
//! single-sheet workbook: row 1 carries column names, row 2 the type
//! tokens, data starts at row 3. A running per-row weight bounds the
//! output size before any bytes reach the caller.

mod engine;
mod request;

pub use engine::{export, export_query_result, ExportOptions, ExportResponse};
pub use request::{ExportQueryResultRequest, ExportRequest};
