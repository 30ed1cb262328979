//! Shared helpers for the integration tests.

#![allow(dead_code)]

use excel_bridge::schema::{Column, ColumnType, Record, Schema, Value};
use excel_bridge::store::memory::MemoryStore;
use excel_bridge::workbook::{Cell, MemoryWorkbook};

/// Initializes test logging; safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Builds a schema from `(name, type, required)` triples.
pub fn schema(columns: &[(&str, ColumnType, bool)]) -> Schema {
    Schema::new(
        columns
            .iter()
            .map(|(name, t, required)| {
                let col = Column::new(*name, t.clone());
                if *required {
                    col.required()
                } else {
                    col
                }
            })
            .collect(),
    )
}

/// Builds a record from `(name, value)` pairs.
pub fn record(fields: &[(&str, Value)]) -> Record {
    fields
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// A store with one table at `path`.
pub fn store_with_table(path: &str, schema: Schema, rows: Vec<Record>) -> MemoryStore {
    let store = MemoryStore::new();
    store.add_table(path, schema, rows);
    store
}

/// A workbook whose `Sheet1` holds the given raw text rows; empty strings
/// leave the cell unset.
pub fn workbook_from_rows(rows: &[&[&str]]) -> MemoryWorkbook {
    let mut wb = MemoryWorkbook::new();
    wb.add_sheet("Sheet1", true);
    for (r, row) in rows.iter().enumerate() {
        for (c, text) in row.iter().enumerate() {
            if !text.is_empty() {
                wb.set_sheet_cell("Sheet1", c as u32 + 1, r as u32 + 1, Cell::text(*text));
            }
        }
    }
    wb
}
