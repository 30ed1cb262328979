//! Export request types, validation, and file-name derivation.

use std::fmt;

use crate::config::{MAX_FILE_NAME_LEN, MAX_ROW_COUNT};
use crate::convert::NumberPrecisionMode;
use crate::error_handling::{classify_store_error, BridgeError};
use crate::path::{self, RowRange};
use crate::store::{ReadSpec, StoreClient, TablePath, ATTR_FILE_NAME, ATTR_ROW_COUNT};
use crate::utils::{random_suffix, replace_non_alphanumeric};

const XLSX_EXT: &str = ".xlsx";

/// Request to export a static table.
///
/// Immutable after construction; the engine derives the effective row
/// range and the final file name without touching the request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    /// Explicit download name. Derived when absent.
    pub file_name: Option<String>,
    /// Source table.
    pub path: TablePath,
    /// Column projection; empty means all columns.
    pub columns: Vec<String>,
    /// Row range; `None` means all rows.
    pub row_range: Option<RowRange>,
    /// Policy for numbers wider than XLSX can hold.
    pub precision_mode: NumberPrecisionMode,
}

impl ExportRequest {
    /// Parses a path expression into a request.
    ///
    /// Example inputs:
    ///
    /// ```text
    /// //home/example{"col1","col2"}[#10:#999]
    /// //home/example{"col1","col2"}
    /// <file_name=data.xlsx>//home/example
    /// //home/example
    /// ```
    pub fn parse(expr: &str, precision_mode: NumberPrecisionMode) -> Result<Self, BridgeError> {
        let parsed = path::parse(expr)?;

        if parsed.ranges.len() > 1 {
            return Err(BridgeError::bad_request(
                "multiple ranges are not supported",
            ));
        }

        Ok(ExportRequest {
            file_name: parsed.file_name,
            path: TablePath::new(parsed.path),
            columns: parsed.columns,
            row_range: parsed.ranges.first().copied(),
            precision_mode,
        })
    }

    /// Builds the read spec for the resolved row range.
    pub(crate) fn read_spec(&self, range: RowRange) -> ReadSpec {
        ReadSpec {
            path: self.path.clone(),
            columns: self.columns.clone(),
            lower_row: range.lower,
            upper_row: range.upper,
        }
    }

    /// Derives the generated file name: `yt` + sanitized path, plus the
    /// sanitized column list and the row range when present, plus
    /// `suffix`, truncated to the name cap before `.xlsx` is appended.
    pub(crate) fn make_file_name(&self, suffix: &str) -> String {
        let mut name = format!("yt{}", replace_non_alphanumeric(self.path.as_str()));

        if !self.columns.is_empty() {
            name.push_str("__");
            name.push_str(&replace_non_alphanumeric(&self.columns.join("_")));
        }

        if let Some(range) = self.row_range {
            name.push_str(&format!("__{}_{}__", range.lower, range.upper));
        }

        name.push_str(suffix);
        ensure_xlsx(truncate_chars(&name, MAX_FILE_NAME_LEN))
    }
}

impl fmt::Display for ExportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        if !self.columns.is_empty() {
            write!(f, "{{{}}}", self.columns.join(","))?;
        }
        if let Some(range) = self.row_range {
            write!(f, "[#{}:#{}]", range.lower, range.upper)?;
        }
        Ok(())
    }
}

/// Request to export one query-tracker result.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportQueryResultRequest {
    /// Explicit download name. Derived when absent.
    pub file_name: Option<String>,
    /// Query identifier.
    pub query_id: String,
    /// Index of the result within the query.
    pub result_index: i64,
    /// Optional first row index (inclusive).
    pub lower_row_index: Option<i64>,
    /// Optional last row index (exclusive).
    pub upper_row_index: Option<i64>,
    /// Column projection; empty means all columns.
    pub columns: Vec<String>,
    /// Policy for numbers wider than XLSX can hold.
    pub precision_mode: NumberPrecisionMode,
}

impl ExportQueryResultRequest {
    pub(crate) fn make_file_name(&self) -> String {
        ensure_xlsx(format!(
            "yt_query_result__{}__{}",
            replace_non_alphanumeric(&self.query_id),
            self.result_index
        ))
    }

    pub(crate) fn resolve_file_name(&self) -> String {
        match &self.file_name {
            Some(name) => ensure_xlsx(name.clone()),
            None => self.make_file_name(),
        }
    }
}

/// Resolves the effective row range, reading the table's row count when
/// the request does not pin one. Tables larger than the XLSX data-row cap
/// are rejected up front.
pub(crate) async fn effective_range<C: StoreClient + ?Sized>(
    client: &C,
    req: &ExportRequest,
) -> Result<RowRange, BridgeError> {
    let (start, count) = match req.row_range {
        Some(range) => (range.lower, range.upper - range.lower),
        None => (0, 0),
    };

    if start < 0 {
        return Err(BridgeError::bad_request(format!(
            "start row cannot be negative; got {start}"
        )));
    }
    if count > MAX_ROW_COUNT {
        return Err(BridgeError::bad_request(format!(
            "too many rows to export; max is {MAX_ROW_COUNT}"
        )));
    }

    if count > 0 {
        return Ok(RowRange {
            lower: start,
            upper: start + count,
        });
    }

    let table_row_count = read_row_count(client, &req.path).await?;
    if table_row_count > MAX_ROW_COUNT {
        return Err(BridgeError::bad_request(format!(
            "too many rows to export; max is {MAX_ROW_COUNT}"
        )));
    }

    Ok(RowRange {
        lower: start,
        upper: start + MAX_ROW_COUNT,
    })
}

async fn read_row_count<C: StoreClient + ?Sized>(
    client: &C,
    path: &TablePath,
) -> Result<i64, BridgeError> {
    let value = client
        .get_attribute(path, ATTR_ROW_COUNT)
        .await
        .map_err(|e| classify_store_error("error reading table row count", e))?;
    value
        .as_i64()
        .ok_or_else(|| BridgeError::internal(format!("malformed row count attribute: {value}")))
}

/// Resolves the final download name: the explicit request name wins, then
/// a non-empty `file_name` attribute on the table, then the generated
/// name with a random suffix. The result always ends in `.xlsx`.
pub(crate) async fn resolve_file_name<C: StoreClient + ?Sized>(
    client: &C,
    req: &ExportRequest,
) -> String {
    if let Some(name) = &req.file_name {
        return ensure_xlsx(name.clone());
    }

    if let Ok(value) = client.get_attribute(&req.path, ATTR_FILE_NAME).await {
        if let Some(name) = value.as_str() {
            if !name.is_empty() {
                return ensure_xlsx(name.to_string());
            }
        }
    }

    req.make_file_name(&random_suffix())
}

fn ensure_xlsx(mut name: String) -> String {
    if !name.ends_with(XLSX_EXT) {
        name.push_str(XLSX_EXT);
    }
    name
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
