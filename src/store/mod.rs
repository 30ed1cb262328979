//! Narrow contract of the table-store client.
//!
//! The engines never talk to a concrete store; they consume the traits in
//! this module. A production deployment implements them over the real
//! store's RPC client, the test suite uses [`memory::MemoryStore`].
//!
//! Error classification relies on [`StoreError`] carrying a chain of
//! [`StoreErrorCode`]s: the engines inspect the chain (never the message
//! text) to distinguish resolve and authorization failures from generic
//! transport errors.

pub mod memory;

mod error;
mod traits;
mod types;

pub use error::{StoreError, StoreErrorCode};
pub use traits::{QueryResult, RowReader, RowWriter, StoreClient, StoreTransaction};
pub use types::{QueryReadOptions, ReadSpec, TablePath};

/// Name of the node attribute holding the table schema.
pub const ATTR_SCHEMA: &str = "schema";
/// Name of the node attribute holding a preferred download file name.
pub const ATTR_FILE_NAME: &str = "file_name";
/// Name of the node attribute holding the table's row count.
pub const ATTR_ROW_COUNT: &str = "row_count";
