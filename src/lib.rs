//! excel-bridge: conversion engines between a strictly-schemaed table store
//! and XLSX workbooks.
//!
//! The crate exposes two engines sharing one type-conversion substrate:
//!
//! - [`export::export`] streams rows out of a table (or a query result) and
//!   builds a single-sheet workbook, applying typed cell formats, precision
//!   safeguards for numbers wider than XLSX can hold, and a running size
//!   budget.
//! - [`upload::upload`] ingests a workbook into a strictly-schemaed table
//!   inside one store transaction, optionally creating the destination with
//!   a schema inferred from the workbook.
//!
//! The table store and the XLSX codec are consumed through narrow contracts
//! ([`store::StoreClient`], [`workbook::WorkbookReader`] /
//! [`workbook::WorkbookBuilder`]); in-memory implementations back the test
//! suite and small deployments.
//!
//! # Example
//!
//! ```no_run
//! use excel_bridge::convert::NumberPrecisionMode;
//! use excel_bridge::export::{export, ExportOptions, ExportRequest};
//! use excel_bridge::store::memory::MemoryStore;
//! use excel_bridge::workbook::{MemoryWorkbook, WorkbookBuilder};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), excel_bridge::BridgeError> {
//! let store = MemoryStore::new();
//! let req = ExportRequest::parse("//home/example{id,name}[#0:#100]",
//!                                NumberPrecisionMode::String)?;
//! // The default options bound the call to the two-minute request
//! // ceiling; override it via `ExportOptions::timeout`.
//! let rsp = export::<_, MemoryWorkbook>(
//!     &store, &req, &ExportOptions::default(), &CancellationToken::new(),
//! ).await?;
//! let bytes = rsp.workbook.save_to_buffer().expect("save workbook");
//! # let _ = (rsp.file_name, bytes);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! The engines are async and require a Tokio runtime. Each request should
//! run on its own task; the engines keep no shared mutable state. Every
//! engine call is bounded by a wall-clock ceiling
//! ([`config::DEFAULT_REQUEST_TIMEOUT`] unless the options override it);
//! exceeding it cancels the request, aborts any open transaction, and
//! surfaces [`BridgeError::Cancelled`].

#![warn(missing_docs)]

pub mod config;
pub mod convert;
pub mod error_handling;
pub mod export;
pub mod infer;
pub mod mapping;
pub mod path;
pub mod schema;
pub mod store;
pub mod upload;
pub mod utils;
pub mod workbook;

// Re-export the public API surface.
pub use convert::NumberPrecisionMode;
pub use error_handling::{BridgeError, ErrorKind};
pub use export::{export, export_query_result, ExportOptions, ExportRequest, ExportResponse};
pub use schema::{Column, ColumnType, Record, Schema, Value};
pub use upload::{upload, UploadOptions, UploadRequest};
