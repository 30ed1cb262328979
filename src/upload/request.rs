//! Upload request construction and normalization.

use std::fmt;

use crate::config::EXCEL_MAX_ROW_COUNT;
use crate::error_handling::BridgeError;
use crate::mapping::ColumnMapping;
use crate::path;
use crate::store::TablePath;
use crate::workbook::{column_number, WorkbookReader};

/// Which spreadsheet rows an upload ingests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowBounds {
    /// Every row of the sheet.
    All,
    /// Rows `[start_row, start_row + row_count)`, 1-based.
    Range {
        /// First spreadsheet row to ingest (1-based).
        start_row: i64,
        /// Number of rows to ingest.
        row_count: i64,
    },
}

/// Raw upload parameters, as they arrive from the boundary layer.
#[derive(Debug, Clone, Default)]
pub struct UploadParams {
    /// Destination path expression.
    pub path: String,
    /// First spreadsheet row to ingest; `0` means unset.
    pub start_row: i64,
    /// Number of rows to ingest; `0` means unset.
    pub row_count: i64,
    /// Sheet to read; the first visible sheet when absent.
    pub sheet: Option<String>,
    /// Whether the first row carries column names.
    pub header: bool,
    /// Whether a type row follows (second row with `header`, first
    /// without).
    pub types: bool,
    /// Explicit schema-column → spreadsheet-letter mapping.
    pub column_mapping: ColumnMapping,
    /// Append to the destination instead of overwriting it.
    pub append: bool,
    /// Create the destination with a schema inferred from the workbook.
    pub create: bool,
}

/// A validated, normalized upload request.
///
/// Immutable after construction except for attaching the opened workbook
/// handle, which lives exactly as long as the operation.
pub struct UploadRequest {
    /// Destination table.
    pub path: TablePath,
    /// Sheet to read; the first visible sheet when absent.
    pub sheet: Option<String>,
    /// Whether the first row carries column names.
    pub header: bool,
    /// Whether a type row is present.
    pub types: bool,
    /// Explicit column mapping; empty means "resolve at upload time".
    pub column_mapping: ColumnMapping,
    /// Normalized row bounds.
    pub row_bounds: RowBounds,
    /// Append to the destination instead of overwriting it.
    pub append: bool,
    /// Create the destination with an inferred schema.
    pub create: bool,
    /// The opened workbook.
    pub workbook: Option<Box<dyn WorkbookReader>>,
}

impl UploadRequest {
    /// Validates and normalizes raw parameters.
    ///
    /// Normalization makes the data range deterministic: an unset range
    /// stays "all rows" unless `header`/`types` are requested, in which
    /// case it becomes an explicit range starting past the metadata rows.
    pub fn new(params: UploadParams) -> Result<Self, BridgeError> {
        let parsed = path::parse(&params.path)?;

        if params.header && !params.column_mapping.is_empty() {
            return Err(BridgeError::bad_request(
                "unable to use header=true together with column mapping",
            ));
        }

        let mut start_row = params.start_row;
        let mut row_count = params.row_count;
        let mut all_rows = start_row == 0 && row_count == 0;

        if !all_rows {
            if start_row == 0 {
                start_row = 1;
            }
            if row_count == 0 {
                row_count = EXCEL_MAX_ROW_COUNT;
            }
        } else {
            let mut data_start = 1i64;
            if params.header {
                data_start += 1;
            }
            if params.types {
                data_start += 1;
            }
            if data_start >= 2 {
                all_rows = false;
                start_row = data_start;
                row_count = EXCEL_MAX_ROW_COUNT;
            }
        }

        if start_row < 0 {
            return Err(BridgeError::bad_request(format!(
                "start row cannot be negative; got {start_row}"
            )));
        }
        if row_count > EXCEL_MAX_ROW_COUNT {
            return Err(BridgeError::bad_request(format!(
                "too many rows to upload; max is {EXCEL_MAX_ROW_COUNT}"
            )));
        }

        for letter in params.column_mapping.values() {
            column_number(letter)
                .map_err(|e| BridgeError::bad_request(format!("invalid column name: {e}")))?;
        }

        Ok(UploadRequest {
            path: TablePath::new(parsed.path),
            sheet: params.sheet,
            header: params.header,
            types: params.types,
            column_mapping: params.column_mapping,
            row_bounds: if all_rows {
                RowBounds::All
            } else {
                RowBounds::Range {
                    start_row,
                    row_count,
                }
            },
            append: params.append,
            create: params.create,
            workbook: None,
        })
    }

    /// Attaches the opened workbook handle.
    pub fn with_workbook(mut self, workbook: Box<dyn WorkbookReader>) -> Self {
        self.workbook = Some(workbook);
        self
    }

    /// Resolves the sheet to read: the explicit request sheet, or the
    /// first visible sheet in declaration order.
    pub(crate) fn sheet_name(&self, workbook: &dyn WorkbookReader) -> Result<String, BridgeError> {
        if let Some(sheet) = &self.sheet {
            return Ok(sheet.clone());
        }
        workbook
            .sheet_names()
            .into_iter()
            .find(|name| workbook.sheet_visible(name))
            .ok_or_else(|| BridgeError::bad_request("workbook has no visible sheet"))
    }
}

impl fmt::Display for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start_row, row_count) = match self.row_bounds {
            RowBounds::All => (0, 0),
            RowBounds::Range {
                start_row,
                row_count,
            } => (start_row, row_count),
        };
        write!(
            f,
            "Path: {}, Columns: {:?}, StartRow: {}, RowCount: {}, Append: {}",
            self.path, self.column_mapping, start_row, row_count, self.append
        )
    }
}
