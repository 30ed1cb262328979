//! Path expressions for export requests.
//!
//! Grammar: `[<attrs>]path[{col,col,...}][[#lower:#upper]]`, e.g.
//!
//! ```text
//! //home/example
//! //home/example{"col1","col2"}
//! //home/example{"col1","col2"}[#10:#999]
//! <file_name=data.xlsx>//home/example
//! ```
//!
//! The only attribute the bridge recognizes is `file_name`; others are
//! accepted and ignored. Row limits are zero-based, half-open, and must be
//! row indices (`#N`) on both bounds.

use crate::error_handling::BridgeError;

/// Half-open row range `[lower, upper)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    /// First row index, inclusive.
    pub lower: i64,
    /// Last row index, exclusive.
    pub upper: i64,
}

/// A parsed path expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RichPath {
    /// `file_name` attribute, if present.
    pub file_name: Option<String>,
    /// The table path itself.
    pub path: String,
    /// Requested columns; empty means all.
    pub columns: Vec<String>,
    /// Requested row ranges. More than one is rejected downstream.
    pub ranges: Vec<RowRange>,
}

/// Parses a path expression.
pub fn parse(expr: &str) -> Result<RichPath, BridgeError> {
    let mut rest = expr.trim();
    let mut parsed = RichPath::default();

    if let Some(tail) = rest.strip_prefix('<') {
        let end = tail
            .find('>')
            .ok_or_else(|| BridgeError::bad_request(format!("unterminated attributes in {expr:?}")))?;
        for pair in tail[..end].split(';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                BridgeError::bad_request(format!("malformed attribute {pair:?} in {expr:?}"))
            })?;
            if key.trim() == "file_name" {
                parsed.file_name = Some(unquote(value).to_string());
            }
        }
        rest = &tail[end + 1..];
    }

    let path_end = rest
        .find(['{', '['])
        .unwrap_or(rest.len());
    parsed.path = rest[..path_end].trim().to_string();
    if parsed.path.is_empty() {
        return Err(BridgeError::bad_request(format!("empty path in {expr:?}")));
    }
    rest = &rest[path_end..];

    if let Some(tail) = rest.strip_prefix('{') {
        let end = tail
            .find('}')
            .ok_or_else(|| BridgeError::bad_request(format!("unterminated column list in {expr:?}")))?;
        parsed.columns = tail[..end]
            .split(',')
            .map(|c| unquote(c.trim()).to_string())
            .filter(|c| !c.is_empty())
            .collect();
        rest = &tail[end + 1..];
    }

    while let Some(tail) = rest.strip_prefix('[') {
        let end = tail
            .find(']')
            .ok_or_else(|| BridgeError::bad_request(format!("unterminated range in {expr:?}")))?;
        for range in tail[..end].split(',') {
            parsed.ranges.push(parse_range(range.trim())?);
        }
        rest = &tail[end + 1..];
    }

    if !rest.trim().is_empty() {
        return Err(BridgeError::bad_request(format!(
            "unexpected trailing characters {:?} in {expr:?}",
            rest.trim()
        )));
    }

    Ok(parsed)
}

fn parse_range(range: &str) -> Result<RowRange, BridgeError> {
    let (lower, upper) = range
        .split_once(':')
        .ok_or_else(|| BridgeError::bad_request(format!("unsupported range limit {range:?}")))?;
    let parsed = RowRange {
        lower: parse_row_index(lower)?,
        upper: parse_row_index(upper)?,
    };
    if parsed.upper < parsed.lower {
        return Err(BridgeError::bad_request(format!(
            "invalid range {range:?}: upper bound precedes lower bound"
        )));
    }
    Ok(parsed)
}

fn parse_row_index(limit: &str) -> Result<i64, BridgeError> {
    let digits = limit
        .trim()
        .strip_prefix('#')
        .ok_or_else(|| BridgeError::bad_request(format!("unsupported range limit {limit:?}")))?;
    digits
        .parse::<i64>()
        .map_err(|e| BridgeError::bad_request(format!("bad row index {limit:?}: {e}")))
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
}
