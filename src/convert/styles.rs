//! Cell styles registered once per exported workbook.

use crate::workbook::{StyleId, WorkbookBuilder};

/// Style ids of the four typed number formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellStyles {
    /// Plain integer format (`0`).
    pub number: StyleId,
    /// Calendar date (`yyyy-mm-dd`).
    pub date: StyleId,
    /// Second-resolution timestamp (`yyyy-mm-ddThh:mm:ssZ`).
    pub datetime: StyleId,
    /// Millisecond-resolution timestamp (`yyyy-mm-ddThh:mm:ss.000Z`).
    pub timestamp: StyleId,
}

impl CellStyles {
    /// Registers the four formats with a workbook under construction.
    pub fn register<W: WorkbookBuilder + ?Sized>(workbook: &mut W) -> Self {
        CellStyles {
            number: workbook.register_number_format("0"),
            date: workbook.register_number_format("yyyy-mm-dd"),
            datetime: workbook.register_number_format("yyyy-mm-ddThh:mm:ssZ"),
            timestamp: workbook.register_number_format("yyyy-mm-ddThh:mm:ss.000Z"),
        }
    }
}
