//! Column-mapping resolution.
//!
//! Export side: project schema columns onto output sheet positions.
//! Upload side: relate schema columns to spreadsheet column letters, via an
//! explicit mapping, a header row, or by position. After resolution the
//! mapping must cover the schema exactly; several schema columns may share
//! one spreadsheet column (the value is broadcast on upload).

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::EXCEL_MAX_COLUMN_COUNT;
use crate::error_handling::BridgeError;
use crate::schema::{Column, Schema};
use crate::workbook::column_letter;

/// Schema column paired with its 1-based output sheet position.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedColumn {
    /// 1-based position in the output sheet.
    pub index: u32,
    /// The schema column.
    pub column: Column,
}

/// Mapping from schema column name to spreadsheet column letter.
pub type ColumnMapping = BTreeMap<String, String>;

/// Resolves the export projection: positions are assigned by walking the
/// schema in declaration order, skipping columns not in `requested`.
/// Requested names absent from the schema are ignored.
pub fn export_projection(requested: &[String], schema: &Schema) -> HashMap<String, IndexedColumn> {
    let requested: HashSet<&str> = requested.iter().map(|s| s.as_str()).collect();

    let mut header = HashMap::new();
    let mut index = 0;
    for column in &schema.columns {
        if !requested.contains(column.name.as_str()) {
            continue;
        }
        index += 1;
        header.insert(
            column.name.clone(),
            IndexedColumn {
                index,
                column: column.clone(),
            },
        );
    }
    header
}

/// Builds the upload mapping from a header row: each non-empty cell whose
/// text names a schema column maps that column to the cell's position.
/// Cells that do not name a schema column are discarded.
pub fn mapping_from_header(header_row: &[String], schema: &Schema) -> ColumnMapping {
    let known: HashSet<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();

    let mut mapping = ColumnMapping::new();
    for (i, cell) in header_row.iter().enumerate() {
        if known.contains(cell.as_str()) {
            mapping.insert(cell.clone(), column_letter(i as u32 + 1));
        }
    }
    mapping
}

/// Builds the positional upload mapping: first schema column → `A`,
/// second → `B`, and so on.
pub fn positional_mapping(schema: &Schema) -> ColumnMapping {
    schema
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name.clone(), column_letter(i as u32 + 1)))
        .collect()
}

/// Enforces the post-resolution invariants: the mapping covers the schema
/// exactly and stays within the XLSX column cap.
pub fn validate_mapping(mapping: &ColumnMapping, schema: &Schema) -> Result<(), BridgeError> {
    if mapping.len() != schema.columns.len() {
        return Err(BridgeError::bad_request(format!(
            "schema has {} column(s), request has {}",
            schema.columns.len(),
            mapping.len()
        )));
    }
    if mapping.len() > EXCEL_MAX_COLUMN_COUNT {
        return Err(BridgeError::bad_request(format!(
            "exceeding max number of excel columns {EXCEL_MAX_COLUMN_COUNT}"
        )));
    }
    Ok(())
}

/// Inverts a mapping for the upload row loop: spreadsheet column letter to
/// the schema column indices it feeds. Mapping entries that name columns
/// missing from the schema are rejected.
pub fn mapping_by_letter(
    mapping: &ColumnMapping,
    schema: &Schema,
) -> Result<HashMap<String, Vec<usize>>, BridgeError> {
    let index_by_name: HashMap<&str, usize> = schema
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.name.as_str(), i))
        .collect();

    let mut by_letter: HashMap<String, Vec<usize>> = HashMap::new();
    for (name, letter) in mapping {
        let index = index_by_name.get(name.as_str()).ok_or_else(|| {
            BridgeError::bad_request(format!("mapping references unknown column {name:?}"))
        })?;
        by_letter.entry(letter.clone()).or_default().push(*index);
    }
    Ok(by_letter)
}
