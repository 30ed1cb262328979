//! Format limits and product defaults.

use std::time::Duration;

/// Name of the single sheet every exported workbook contains.
pub const SHEET_NAME: &str = "Sheet1";

/// Hard XLSX row cap (2^20 rows per sheet).
pub const EXCEL_MAX_ROW_COUNT: i64 = 1_048_576;

/// Hard XLSX column cap (2^14 columns, `A`..`XFD`).
pub const EXCEL_MAX_COLUMN_COUNT: usize = 16_384;

/// Maximum number of data rows a single export can carry.
/// Two rows are reserved for the column-name and type-name headers.
pub const MAX_ROW_COUNT: i64 = EXCEL_MAX_ROW_COUNT - 2;

/// Hard XLSX cap on the length of a single cell's text.
pub const MAX_CELL_TEXT_LEN: usize = 32_767;

/// Days between the XLSX serial-date origin (1900-01-00) and the unix
/// epoch, counting the extra day Excel inserts before 1900-03-01.
pub const EPOCH_SHIFT_DAYS: u64 = 25_569;

/// Seconds in a day, for serial-date arithmetic.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Microseconds in a day, for serial-timestamp arithmetic.
pub const MICROS_PER_DAY: u64 = SECONDS_PER_DAY * 1_000_000;

/// Longest file path Excel itself will open.
const EXCEL_MAX_FILEPATH_LEN: usize = 218;

/// Maximum length of a generated file name (before the `.xlsx` extension),
/// leaving headroom for the download directory within Excel's path cap.
pub const MAX_FILE_NAME_LEN: usize = EXCEL_MAX_FILEPATH_LEN - 60;

/// Default cap on the accumulated row weight of one exported workbook.
pub const DEFAULT_MAX_EXCEL_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Ceiling on the wall-clock time of a single export or upload request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
