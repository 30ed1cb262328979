//! Operational constants and limits.
//!
//! Everything here is either an XLSX format limit or a product-level
//! default; nothing is tunable per request except through the explicit
//! option structs of the engines.

mod constants;

pub use constants::*;
