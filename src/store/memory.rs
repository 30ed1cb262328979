//! In-memory store backend.
//!
//! Backs the integration tests and small self-contained deployments.
//! Transactions take a snapshot of the whole state at begin and swap it
//! back in on commit (last writer wins); that is enough to exercise the
//! engines' transactional discipline, not a serious concurrency model.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use std::vec::IntoIter;

use async_trait::async_trait;

use crate::schema::{Record, Schema};

use super::error::StoreError;
use super::traits::{QueryResult, RowReader, RowWriter, StoreClient, StoreTransaction};
use super::types::{QueryReadOptions, ReadSpec, TablePath};
use super::{ATTR_ROW_COUNT, ATTR_SCHEMA};

#[derive(Debug, Clone, Default)]
struct TableNode {
    schema: Schema,
    rows: Vec<Record>,
    attributes: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default)]
struct QueryNode {
    schema: Schema,
    rows: Vec<Record>,
}

#[derive(Debug, Clone, Default)]
struct State {
    tables: HashMap<String, TableNode>,
    query_results: HashMap<(String, i64), QueryNode>,
}

/// Failure injection switches, shared by the store and its transactions.
#[derive(Debug, Default)]
struct Faults {
    denied_paths: HashSet<String>,
    fail_commit_authorization: bool,
    operation_delay: Option<Duration>,
}

/// In-memory [`StoreClient`] implementation.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    faults: Arc<Mutex<Faults>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("store state poisoned")
    }

    fn faults(&self) -> MutexGuard<'_, Faults> {
        self.faults.lock().expect("store faults poisoned")
    }

    /// Creates a table with the given schema and rows.
    pub fn add_table(&self, path: &str, schema: Schema, rows: Vec<Record>) {
        self.state().tables.insert(
            path.to_string(),
            TableNode {
                schema,
                rows,
                attributes: HashMap::new(),
            },
        );
    }

    /// Sets a node attribute on an existing table.
    pub fn set_attribute(&self, path: &str, name: &str, value: serde_json::Value) {
        if let Some(node) = self.state().tables.get_mut(path) {
            node.attributes.insert(name.to_string(), value);
        }
    }

    /// Registers a query-tracker result.
    pub fn add_query_result(&self, query_id: &str, index: i64, schema: Schema, rows: Vec<Record>) {
        self.state()
            .query_results
            .insert((query_id.to_string(), index), QueryNode { schema, rows });
    }

    /// Marks a path as forbidden for create/write operations.
    pub fn deny_path(&self, path: &str) {
        self.faults().denied_paths.insert(path.to_string());
    }

    /// Makes every transaction commit fail with a nested authorization
    /// error, for exercising commit-time classification.
    pub fn fail_commits_with_authorization(&self) {
        self.faults().fail_commit_authorization = true;
    }

    /// Delays every streaming read and write by `delay`, for exercising
    /// the engines' request ceiling against a blocked store.
    pub fn delay_operations(&self, delay: Duration) {
        self.faults().operation_delay = Some(delay);
    }

    /// True if the table exists.
    pub fn table_exists(&self, path: &str) -> bool {
        self.state().tables.contains_key(path)
    }

    /// Committed rows of a table, if it exists.
    pub fn table_rows(&self, path: &str) -> Option<Vec<Record>> {
        self.state().tables.get(path).map(|t| t.rows.clone())
    }

    /// Schema of a table, if it exists.
    pub fn table_schema(&self, path: &str) -> Option<Schema> {
        self.state().tables.get(path).map(|t| t.schema.clone())
    }

    fn check_allowed(&self, path: &TablePath, op: &str) -> Result<(), StoreError> {
        if self.faults().denied_paths.contains(path.as_str()) {
            return Err(StoreError::authorization(format!(
                "access denied: {op} on {path}"
            )));
        }
        Ok(())
    }
}

fn node_attribute(
    node: &TableNode,
    path: &TablePath,
    name: &str,
) -> Result<serde_json::Value, StoreError> {
    match name {
        ATTR_SCHEMA => serde_json::to_value(&node.schema)
            .map_err(|e| StoreError::generic(format!("schema encode failed: {e}"))),
        ATTR_ROW_COUNT => Ok(serde_json::Value::from(node.rows.len() as i64)),
        other => node.attributes.get(other).cloned().ok_or_else(|| {
            StoreError::resolve(format!("attribute {other:?} not found on {path}"))
        }),
    }
}

fn project(record: &Record, columns: &[String]) -> Record {
    if columns.is_empty() {
        return record.clone();
    }
    record
        .iter()
        .filter(|(name, _)| columns.iter().any(|c| c == *name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

struct VecRowReader {
    rows: IntoIter<Record>,
    delay: Option<Duration>,
}

#[async_trait]
impl RowReader for VecRowReader {
    async fn next_row(&mut self) -> Result<Option<Record>, StoreError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.rows.next())
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    async fn get_attribute(
        &self,
        path: &TablePath,
        name: &str,
    ) -> Result<serde_json::Value, StoreError> {
        let state = self.state();
        let node = state
            .tables
            .get(path.as_str())
            .ok_or_else(|| StoreError::resolve(format!("node {path} not found")))?;
        node_attribute(node, path, name)
    }

    async fn begin_transaction(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let snapshot = self.state().clone();
        Ok(Box::new(MemoryTransaction {
            store: self.clone(),
            snapshot: Arc::new(Mutex::new(snapshot)),
        }))
    }

    async fn read_table(&self, spec: &ReadSpec) -> Result<Box<dyn RowReader>, StoreError> {
        let state = self.state();
        let node = state
            .tables
            .get(spec.path.as_str())
            .ok_or_else(|| StoreError::resolve(format!("node {} not found", spec.path)))?;

        let lower = spec.lower_row.max(0) as usize;
        let upper = (spec.upper_row.max(0) as usize).min(node.rows.len());
        let rows: Vec<Record> = node
            .rows
            .get(lower..upper.max(lower))
            .unwrap_or(&[])
            .iter()
            .map(|r| project(r, &spec.columns))
            .collect();

        Ok(Box::new(VecRowReader {
            rows: rows.into_iter(),
            delay: self.faults().operation_delay,
        }))
    }

    async fn get_query_result(
        &self,
        query_id: &str,
        result_index: i64,
    ) -> Result<QueryResult, StoreError> {
        let state = self.state();
        let node = state
            .query_results
            .get(&(query_id.to_string(), result_index))
            .ok_or_else(|| {
                StoreError::resolve(format!(
                    "query result {query_id}/{result_index} not found"
                ))
            })?;
        Ok(QueryResult {
            schema: node.schema.clone(),
        })
    }

    async fn read_query_result(
        &self,
        query_id: &str,
        result_index: i64,
        opts: &QueryReadOptions,
    ) -> Result<Box<dyn RowReader>, StoreError> {
        let state = self.state();
        let node = state
            .query_results
            .get(&(query_id.to_string(), result_index))
            .ok_or_else(|| {
                StoreError::resolve(format!(
                    "query result {query_id}/{result_index} not found"
                ))
            })?;

        let lower = opts.lower_row_index.unwrap_or(0).max(0) as usize;
        let upper = opts
            .upper_row_index
            .map(|u| (u.max(0) as usize).min(node.rows.len()))
            .unwrap_or(node.rows.len());
        let rows: Vec<Record> = node
            .rows
            .get(lower..upper.max(lower))
            .unwrap_or(&[])
            .iter()
            .map(|r| project(r, &opts.columns))
            .collect();

        Ok(Box::new(VecRowReader {
            rows: rows.into_iter(),
            delay: self.faults().operation_delay,
        }))
    }
}

struct MemoryTransaction {
    store: MemoryStore,
    snapshot: Arc<Mutex<State>>,
}

impl MemoryTransaction {
    fn snapshot(&self) -> MutexGuard<'_, State> {
        self.snapshot.lock().expect("transaction snapshot poisoned")
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn get_attribute(
        &self,
        path: &TablePath,
        name: &str,
    ) -> Result<serde_json::Value, StoreError> {
        let snapshot = self.snapshot();
        let node = snapshot
            .tables
            .get(path.as_str())
            .ok_or_else(|| StoreError::resolve(format!("node {path} not found")))?;
        node_attribute(node, path, name)
    }

    async fn create_table(&self, path: &TablePath, schema: &Schema) -> Result<(), StoreError> {
        self.store.check_allowed(path, "create")?;
        self.snapshot().tables.insert(
            path.as_str().to_string(),
            TableNode {
                schema: schema.clone(),
                rows: Vec::new(),
                attributes: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn write_table(
        &self,
        path: &TablePath,
        append: bool,
    ) -> Result<Box<dyn RowWriter>, StoreError> {
        self.store.check_allowed(path, "write")?;
        if !self.snapshot().tables.contains_key(path.as_str()) {
            return Err(StoreError::resolve(format!("node {path} not found")));
        }
        Ok(Box::new(MemoryRowWriter {
            snapshot: Arc::clone(&self.snapshot),
            path: path.clone(),
            append,
            buffer: Vec::new(),
            closed: false,
            delay: self.store.faults().operation_delay,
        }))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        if self.store.faults().fail_commit_authorization {
            return Err(StoreError::generic("transaction commit failed")
                .wrap(StoreError::authorization("commit permission denied")));
        }
        let snapshot = self.snapshot().clone();
        *self.store.state() = snapshot;
        Ok(())
    }

    async fn abort(self: Box<Self>) -> Result<(), StoreError> {
        // Snapshot is simply dropped; the shared state never saw it.
        Ok(())
    }
}

struct MemoryRowWriter {
    snapshot: Arc<Mutex<State>>,
    path: TablePath,
    append: bool,
    buffer: Vec<Record>,
    closed: bool,
    delay: Option<Duration>,
}

#[async_trait]
impl RowWriter for MemoryRowWriter {
    async fn write(&mut self, record: Record) -> Result<(), StoreError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.closed {
            return Err(StoreError::generic("writer is closed"));
        }
        self.buffer.push(record);
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        if self.closed {
            return Err(StoreError::generic("writer is closed"));
        }
        self.closed = true;

        let mut snapshot = self.snapshot.lock().expect("transaction snapshot poisoned");
        let node = snapshot
            .tables
            .get_mut(self.path.as_str())
            .ok_or_else(|| StoreError::resolve(format!("node {} not found", self.path)))?;
        if !self.append {
            node.rows.clear();
        }
        node.rows.append(&mut self.buffer);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.closed = true;
        self.buffer.clear();
        Ok(())
    }
}
