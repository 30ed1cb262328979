//! Async contracts of the store client.

use async_trait::async_trait;

use crate::schema::{Record, Schema};

use super::error::StoreError;
use super::types::{QueryReadOptions, ReadSpec, TablePath};

/// Streaming reader over table or query-result rows.
///
/// Dropping the reader closes the underlying stream.
#[async_trait]
pub trait RowReader: Send {
    /// Next row, or `None` once the range is exhausted.
    async fn next_row(&mut self) -> Result<Option<Record>, StoreError>;
}

/// Streaming writer into a table.
///
/// Rows become visible only after [`RowWriter::commit`]; on any failure the
/// caller must [`RowWriter::rollback`] before aborting the enclosing
/// transaction.
#[async_trait]
pub trait RowWriter: Send {
    /// Appends one record to the write stream.
    async fn write(&mut self, record: Record) -> Result<(), StoreError>;

    /// Flushes and seals the write stream.
    async fn commit(&mut self) -> Result<(), StoreError>;

    /// Discards everything written so far.
    async fn rollback(&mut self) -> Result<(), StoreError>;
}

/// One query-tracker result, as returned by
/// [`StoreClient::get_query_result`].
#[derive(Debug, Clone)]
pub struct QueryResult {
    /// Schema of the result rows.
    pub schema: Schema,
}

/// A store transaction. All destination writes of an upload — table
/// creation included — happen through one transaction, which either
/// commits or aborts.
#[async_trait]
pub trait StoreTransaction: Send + Sync {
    /// Reads a node attribute, observing this transaction's own writes.
    async fn get_attribute(
        &self,
        path: &TablePath,
        name: &str,
    ) -> Result<serde_json::Value, StoreError>;

    /// Creates a table with the given schema.
    async fn create_table(&self, path: &TablePath, schema: &Schema) -> Result<(), StoreError>;

    /// Opens a row writer. `append == false` overwrites existing rows.
    async fn write_table(
        &self,
        path: &TablePath,
        append: bool,
    ) -> Result<Box<dyn RowWriter>, StoreError>;

    /// Commits the transaction.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Aborts the transaction, discarding all its writes.
    async fn abort(self: Box<Self>) -> Result<(), StoreError>;
}

/// Authenticated handle to the table store.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Reads a node attribute (`schema`, `file_name`, `row_count`, ...).
    async fn get_attribute(
        &self,
        path: &TablePath,
        name: &str,
    ) -> Result<serde_json::Value, StoreError>;

    /// Begins a transaction.
    async fn begin_transaction(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;

    /// Opens a streaming reader over the given projection and row range.
    async fn read_table(&self, spec: &ReadSpec) -> Result<Box<dyn RowReader>, StoreError>;

    /// Fetches metadata of one query-tracker result.
    async fn get_query_result(
        &self,
        query_id: &str,
        result_index: i64,
    ) -> Result<QueryResult, StoreError>;

    /// Opens a streaming reader over one query-tracker result.
    async fn read_query_result(
        &self,
        query_id: &str,
        result_index: i64,
        opts: &QueryReadOptions,
    ) -> Result<Box<dyn RowReader>, StoreError>;
}
