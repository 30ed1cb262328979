//! XLSX codec contract.
//!
//! The engines never touch workbook bytes directly: export produces cells
//! through [`WorkbookBuilder`], upload consumes raw cell text through
//! [`WorkbookReader`]. [`MemoryWorkbook`] implements both and serializes
//! through `rust_xlsxwriter`.
//!
//! Coordinates are 1-based in both axes, matching spreadsheet notation
//! (`A1` is column 1, row 1).

mod cell;
mod column;
mod memory;

use thiserror::Error;

pub use cell::{Cell, CellValue, StyleId};
pub use column::{column_letter, column_number, InvalidColumnLetter};
pub use memory::MemoryWorkbook;

/// Codec-level failure.
#[derive(Debug, Error)]
pub enum WorkbookError {
    /// The requested sheet does not exist.
    #[error("sheet {0:?} not found")]
    SheetNotFound(String),

    /// Serialization failed in the XLSX backend.
    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

/// Write side of the codec: a single-sheet workbook under construction.
pub trait WorkbookBuilder: Send {
    /// Registers a custom number format, returning its style id.
    /// Registering the same format twice yields the same id.
    fn register_number_format(&mut self, num_format: &str) -> StyleId;

    /// Places a cell at (`col`, `row`), both 1-based.
    fn set_cell(&mut self, col: u32, row: u32, cell: Cell);

    /// Serializes the workbook to XLSX bytes.
    fn save_to_buffer(&self) -> Result<Vec<u8>, WorkbookError>;
}

/// Read side of the codec: an opened workbook.
pub trait WorkbookReader: Send + Sync {
    /// Sheet names in declaration order.
    fn sheet_names(&self) -> Vec<String>;

    /// Whether the named sheet is visible. Unknown sheets are not.
    fn sheet_visible(&self, name: &str) -> bool;

    /// Iterates rows of a sheet as raw cell text (no number formatting
    /// applied). Row `i` of the iterator is spreadsheet row `i + 1`; rows
    /// with no cells yield an empty vector. Trailing empty rows are not
    /// yielded.
    fn rows(
        &self,
        sheet: &str,
    ) -> Result<Box<dyn Iterator<Item = Vec<String>> + Send + '_>, WorkbookError>;
}

/// Reads the `n`-th row (1-based) of a sheet as raw text, or `None` when
/// the sheet has fewer rows.
pub fn nth_row<R: WorkbookReader + ?Sized>(
    reader: &R,
    sheet: &str,
    n: usize,
) -> Result<Option<Vec<String>>, WorkbookError> {
    debug_assert!(n >= 1, "row numbers are 1-based");
    Ok(reader.rows(sheet)?.nth(n - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nth_row() {
        let mut wb = MemoryWorkbook::new();
        wb.set_sheet_cell("Sheet1", 1, 1, Cell::text("a"));
        wb.set_sheet_cell("Sheet1", 1, 2, Cell::text("b"));

        assert_eq!(
            nth_row(&wb, "Sheet1", 1).expect("read"),
            Some(vec!["a".to_string()])
        );
        assert_eq!(
            nth_row(&wb, "Sheet1", 2).expect("read"),
            Some(vec!["b".to_string()])
        );
        assert_eq!(nth_row(&wb, "Sheet1", 3).expect("read"), None);
    }
}
