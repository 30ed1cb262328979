//! Schema inference for upload-with-create.
//!
//! Column names come from the explicit mapping, the header row, or the
//! spreadsheet column letters, in that order of preference. Types default
//! to `any` unless a type row is present; unknown type tokens fail the
//! upload before anything is created.

use std::collections::HashMap;

use crate::error_handling::BridgeError;
use crate::mapping::ColumnMapping;
use crate::schema::{Column, ColumnType, Schema};
use crate::workbook::{column_letter, column_number, nth_row, WorkbookReader};

/// Infers the destination schema from the workbook.
///
/// `mapping` is the request's explicit column mapping (possibly empty);
/// `header` and `types` are the request flags. Schema columns are emitted
/// in ascending spreadsheet-column order.
pub fn infer_schema(
    workbook: &dyn WorkbookReader,
    sheet: &str,
    header: bool,
    types: bool,
    mapping: &ColumnMapping,
) -> Result<Schema, BridgeError> {
    let mut columns: Vec<Column> = Vec::new();
    let mut names_by_letter: HashMap<String, Vec<String>> = HashMap::new();

    if !mapping.is_empty() {
        let mut named: Vec<(u32, &String, &String)> = Vec::with_capacity(mapping.len());
        for (name, letter) in mapping {
            let number = column_number(letter)
                .map_err(|e| BridgeError::bad_request(e.to_string()))?;
            named.push((number, name, letter));
        }
        // Ascending spreadsheet-column order; ties (shared columns) break
        // by name to keep the emitted schema deterministic.
        named.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        for (_, name, letter) in named {
            columns.push(Column::new(name.clone(), ColumnType::Any));
            names_by_letter
                .entry(letter.clone())
                .or_default()
                .push(name.clone());
        }
    } else {
        let first_row = read_row(workbook, sheet, 1)?;
        for (i, cell) in first_row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let letter = column_letter(i as u32 + 1);
            let name = if header { cell.clone() } else { letter.clone() };
            columns.push(Column::new(name.clone(), ColumnType::Any));
            names_by_letter.entry(letter).or_default().push(name);
        }
    }

    if types {
        let type_row_index = if header { 2 } else { 1 };
        let type_row = read_row(workbook, sheet, type_row_index)?;
        let mut type_by_name: HashMap<String, ColumnType> = HashMap::new();
        for (i, token) in type_row.iter().enumerate() {
            let letter = column_letter(i as u32 + 1);
            let Some(names) = names_by_letter.get(&letter) else {
                // Cells past the defined columns carry no destination.
                continue;
            };
            let column_type: ColumnType = token.trim().parse().map_err(|_| {
                BridgeError::bad_request(format!("unable to read column type from {token:?}"))
            })?;
            for name in names {
                type_by_name.insert(name.clone(), column_type.clone());
            }
        }
        for column in &mut columns {
            if let Some(t) = type_by_name.get(&column.name) {
                column.column_type = t.clone();
            }
        }
    }

    Ok(Schema::new(columns))
}

fn read_row(
    workbook: &dyn WorkbookReader,
    sheet: &str,
    n: usize,
) -> Result<Vec<String>, BridgeError> {
    let ordinal = if n == 1 { "first" } else { "second" };
    nth_row(workbook, sheet, n)
        .map_err(|e| BridgeError::bad_request(format!("unable to read rows of sheet {sheet:?}: {e}")))?
        .ok_or_else(|| {
            BridgeError::bad_request(format!("unable to read {ordinal} row of sheet {sheet:?}"))
        })
}
