//! In-memory workbook implementing both sides of the codec contract.

use std::collections::BTreeMap;

use rust_xlsxwriter::{Format, Workbook};

use crate::config::SHEET_NAME;

use super::cell::{Cell, CellValue, StyleId};
use super::{WorkbookBuilder, WorkbookError, WorkbookReader};

#[derive(Debug, Clone)]
struct MemorySheet {
    name: String,
    visible: bool,
    // Keyed (row, col), 1-based, so iteration is already row-major.
    cells: BTreeMap<(u32, u32), Cell>,
}

impl MemorySheet {
    fn max_row(&self) -> u32 {
        self.cells.keys().last().map(|(r, _)| *r).unwrap_or(0)
    }
}

/// A workbook held entirely in memory.
///
/// The export engine writes into it through [`WorkbookBuilder`] (always on
/// the single sheet [`SHEET_NAME`]); the upload engine and the tests read
/// it back through [`WorkbookReader`]. [`MemoryWorkbook::save_to_buffer`]
/// produces real XLSX bytes via `rust_xlsxwriter`.
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<MemorySheet>,
    number_formats: Vec<String>,
}

impl MemoryWorkbook {
    /// Creates an empty workbook with no sheets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sheet. No-op if a sheet with that name already exists.
    pub fn add_sheet(&mut self, name: &str, visible: bool) {
        if self.sheet_index(name).is_none() {
            self.sheets.push(MemorySheet {
                name: name.to_string(),
                visible,
                cells: BTreeMap::new(),
            });
        }
    }

    /// Places a cell on a named sheet, creating the sheet (visible) if
    /// needed. Coordinates are 1-based.
    pub fn set_sheet_cell(&mut self, sheet: &str, col: u32, row: u32, cell: Cell) {
        self.add_sheet(sheet, true);
        let idx = self.sheet_index(sheet).expect("sheet just ensured");
        self.sheets[idx].cells.insert((row, col), cell);
    }

    /// Cell at (`col`, `row`) of a named sheet, if set.
    pub fn cell(&self, sheet: &str, col: u32, row: u32) -> Option<&Cell> {
        let idx = self.sheet_index(sheet)?;
        self.sheets[idx].cells.get(&(row, col))
    }

    /// Number-format string behind a style id, if registered.
    pub fn number_format(&self, style: StyleId) -> Option<&str> {
        self.number_formats.get(style.0 as usize).map(|s| s.as_str())
    }

    fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name == name)
    }
}

impl WorkbookBuilder for MemoryWorkbook {
    fn register_number_format(&mut self, num_format: &str) -> StyleId {
        if let Some(idx) = self.number_formats.iter().position(|f| f == num_format) {
            return StyleId(idx as u32);
        }
        self.number_formats.push(num_format.to_string());
        StyleId((self.number_formats.len() - 1) as u32)
    }

    fn set_cell(&mut self, col: u32, row: u32, cell: Cell) {
        self.set_sheet_cell(SHEET_NAME, col, row, cell);
    }

    fn save_to_buffer(&self) -> Result<Vec<u8>, WorkbookError> {
        let formats: Vec<Format> = self
            .number_formats
            .iter()
            .map(|f| Format::new().set_num_format(f))
            .collect();

        let mut workbook = Workbook::new();
        if self.sheets.is_empty() {
            workbook.add_worksheet().set_name(SHEET_NAME)?;
        }
        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name)?;
            if !sheet.visible {
                worksheet.set_hidden(true);
            }
            for (&(row, col), cell) in &sheet.cells {
                let (r, c) = (row - 1, (col - 1) as u16);
                let format = cell.style.and_then(|s| formats.get(s.0 as usize));
                match (&cell.value, format) {
                    (CellValue::Int(v), Some(f)) => {
                        worksheet.write_number_with_format(r, c, *v as f64, f)?;
                    }
                    (CellValue::Int(v), None) => {
                        worksheet.write_number(r, c, *v as f64)?;
                    }
                    (CellValue::Uint(v), Some(f)) => {
                        worksheet.write_number_with_format(r, c, *v as f64, f)?;
                    }
                    (CellValue::Uint(v), None) => {
                        worksheet.write_number(r, c, *v as f64)?;
                    }
                    (CellValue::Float(v), Some(f)) => {
                        worksheet.write_number_with_format(r, c, *v, f)?;
                    }
                    (CellValue::Float(v), None) => {
                        worksheet.write_number(r, c, *v)?;
                    }
                    (CellValue::Bool(v), Some(f)) => {
                        worksheet.write_boolean_with_format(r, c, *v, f)?;
                    }
                    (CellValue::Bool(v), None) => {
                        worksheet.write_boolean(r, c, *v)?;
                    }
                    (CellValue::Text(v), Some(f)) => {
                        worksheet.write_string_with_format(r, c, v, f)?;
                    }
                    (CellValue::Text(v), None) => {
                        worksheet.write_string(r, c, v)?;
                    }
                }
            }
        }
        Ok(workbook.save_to_buffer()?)
    }
}

impl WorkbookReader for MemoryWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn sheet_visible(&self, name: &str) -> bool {
        self.sheet_index(name)
            .map(|i| self.sheets[i].visible)
            .unwrap_or(false)
    }

    fn rows(
        &self,
        sheet: &str,
    ) -> Result<Box<dyn Iterator<Item = Vec<String>> + Send + '_>, WorkbookError> {
        let idx = self
            .sheet_index(sheet)
            .ok_or_else(|| WorkbookError::SheetNotFound(sheet.to_string()))?;
        let sheet = &self.sheets[idx];
        let max_row = sheet.max_row();
        Ok(Box::new((1..=max_row).map(move |row| {
            let max_col = sheet
                .cells
                .range((row, 0)..=(row, u32::MAX))
                .map(|((_, c), _)| *c)
                .max()
                .unwrap_or(0);
            (1..=max_col)
                .map(|col| {
                    sheet
                        .cells
                        .get(&(row, col))
                        .map(|cell| cell.value.raw_text())
                        .unwrap_or_default()
                })
                .collect()
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_writes_to_sheet1() {
        let mut wb = MemoryWorkbook::new();
        let style = wb.register_number_format("0");
        wb.set_cell(1, 1, Cell::text("id"));
        wb.set_cell(1, 3, Cell::styled(CellValue::Int(42), style));

        assert_eq!(wb.sheet_names(), vec![SHEET_NAME.to_string()]);
        assert_eq!(
            wb.cell(SHEET_NAME, 1, 3),
            Some(&Cell::styled(CellValue::Int(42), style))
        );
        assert_eq!(wb.number_format(style), Some("0"));
    }

    #[test]
    fn test_register_number_format_is_idempotent() {
        let mut wb = MemoryWorkbook::new();
        let a = wb.register_number_format("yyyy-mm-dd");
        let b = wb.register_number_format("yyyy-mm-dd");
        let c = wb.register_number_format("0");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_rows_yield_raw_text_and_gaps() {
        let mut wb = MemoryWorkbook::new();
        wb.set_sheet_cell("Data", 1, 1, Cell::text("a"));
        wb.set_sheet_cell("Data", 3, 1, Cell::plain(CellValue::Int(7)));
        // Row 2 left empty on purpose.
        wb.set_sheet_cell("Data", 1, 3, Cell::plain(CellValue::Bool(true)));

        let rows: Vec<Vec<String>> = wb.rows("Data").expect("sheet exists").collect();
        assert_eq!(
            rows,
            vec![
                vec!["a".to_string(), String::new(), "7".to_string()],
                Vec::<String>::new(),
                vec!["1".to_string()],
            ]
        );
    }

    #[test]
    fn test_rows_missing_sheet() {
        let wb = MemoryWorkbook::new();
        assert!(matches!(
            wb.rows("nope"),
            Err(WorkbookError::SheetNotFound(_))
        ));
    }

    #[test]
    fn test_save_to_buffer_produces_xlsx_bytes() {
        let mut wb = MemoryWorkbook::new();
        let date = wb.register_number_format("yyyy-mm-dd");
        wb.set_cell(1, 1, Cell::text("d"));
        wb.set_cell(1, 3, Cell::styled(CellValue::Uint(25_569), date));

        let bytes = wb.save_to_buffer().expect("serialize");
        // XLSX files are zip archives; check the magic.
        assert_eq!(&bytes[..2], b"PK");
    }
}
