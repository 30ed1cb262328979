//! The transactional upload engine.

use std::time::Duration;

use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::convert::{decode, DecodeError};
use crate::error_handling::{classify_store_error, classify_tx_commit_error, BridgeError};
use crate::infer::infer_schema;
use crate::mapping::{
    mapping_by_letter, mapping_from_header, positional_mapping, validate_mapping, ColumnMapping,
};
use crate::schema::{Record, Schema};
use crate::store::{RowWriter, StoreClient, StoreTransaction, ATTR_SCHEMA};
use crate::utils::with_request_timeout;
use crate::workbook::{column_letter, nth_row, WorkbookReader};

use super::request::{RowBounds, UploadRequest};

/// Upload engine options.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Ceiling on the request's wall-clock time; `None` applies
    /// [`crate::config::DEFAULT_REQUEST_TIMEOUT`].
    pub timeout: Option<Duration>,
}

/// Ingests the request's workbook into the destination table.
///
/// All writes happen inside one store transaction; on any failure the row
/// writer is rolled back, then the transaction aborts, leaving the
/// destination untouched (or absent, in create mode). The request ceiling
/// in `opts` bounds the streaming body: when it expires the writer is
/// dropped, the transaction still aborts, and
/// [`BridgeError::Cancelled`] surfaces.
pub async fn upload<C: StoreClient + ?Sized>(
    client: &C,
    req: &UploadRequest,
    opts: &UploadOptions,
    cancel: &CancellationToken,
) -> Result<(), BridgeError> {
    info!("uploading {req}");

    let workbook = req
        .workbook
        .as_deref()
        .ok_or_else(|| BridgeError::internal("upload request has no workbook attached"))?;
    let sheet = req.sheet_name(workbook)?;

    let tx = client
        .begin_transaction()
        .await
        .map_err(|e| classify_store_error("unable to start upload transaction", e))?;

    // The ceiling wraps the streaming body only: the transaction handle
    // must outlive it so the abort below still runs when time is up.
    let staged = with_request_timeout(
        opts.timeout,
        upload_in_tx(tx.as_ref(), req, workbook, &sheet, cancel),
    )
    .await;

    match staged {
        Ok(()) => {
            tx.commit().await.map_err(classify_tx_commit_error)?;
            info!("upload of {} committed", req.path);
            Ok(())
        }
        Err(e) => {
            if let Err(abort_err) = tx.abort().await {
                warn!("failed to abort upload transaction: {abort_err}");
            }
            Err(e)
        }
    }
}

async fn upload_in_tx(
    tx: &dyn StoreTransaction,
    req: &UploadRequest,
    workbook: &dyn WorkbookReader,
    sheet: &str,
    cancel: &CancellationToken,
) -> Result<(), BridgeError> {
    let schema = prepare_destination(tx, req, workbook, sheet).await?;

    let mapping = resolve_mapping(req, workbook, sheet, &schema)?;
    validate_mapping(&mapping, &schema)?;
    let by_letter = mapping_by_letter(&mapping, &schema)?;

    let mut writer = tx
        .write_table(&req.path, req.append)
        .await
        .map_err(|e| classify_store_error("error creating table writer", e))?;

    let rows = workbook.rows(sheet).map_err(|e| {
        BridgeError::bad_request(format!("unable to read rows of sheet {sheet:?}: {e}"))
    })?;

    for (i, row) in (1i64..).zip(rows) {
        if cancel.is_cancelled() {
            rollback(writer.as_mut()).await;
            return Err(BridgeError::Cancelled);
        }

        if row.is_empty() {
            continue;
        }

        if let RowBounds::Range {
            start_row,
            row_count,
        } = req.row_bounds
        {
            if i < start_row {
                continue;
            }
            if i >= start_row + row_count {
                break;
            }
        }

        let record = match build_record(&row, &by_letter, &schema) {
            Ok(record) => record,
            Err(e) => {
                rollback(writer.as_mut()).await;
                return Err(e);
            }
        };

        if let Err(e) = writer.write(record).await {
            rollback(writer.as_mut()).await;
            return Err(classify_store_error("error writing row", e));
        }
    }

    if let Err(e) = writer.commit().await {
        rollback(writer.as_mut()).await;
        return Err(classify_store_error("error committing writer", e));
    }
    Ok(())
}

/// Creates the destination when requested, then reads its schema inside
/// the transaction (so a just-created table is visible).
async fn prepare_destination(
    tx: &dyn StoreTransaction,
    req: &UploadRequest,
    workbook: &dyn WorkbookReader,
    sheet: &str,
) -> Result<Schema, BridgeError> {
    if req.create {
        let inferred = infer_schema(workbook, sheet, req.header, req.types, &req.column_mapping)
            .map_err(|e| match e {
                BridgeError::BadRequest(m) => BridgeError::BadRequest(format!(
                    "error inferring schema from excel table: {m}"
                )),
                other => other,
            })?;
        tx.create_table(&req.path, &inferred)
            .await
            .map_err(|e| classify_store_error("unable to create table", e))?;
    }

    let value = tx.get_attribute(&req.path, ATTR_SCHEMA).await.map_err(|e| {
        classify_store_error(&format!("error reading schema for {:?}", req.path.as_str()), e)
    })?;
    serde_json::from_value(value)
        .map_err(|e| BridgeError::internal(format!("malformed schema attribute: {e}")))
}

fn resolve_mapping(
    req: &UploadRequest,
    workbook: &dyn WorkbookReader,
    sheet: &str,
    schema: &Schema,
) -> Result<ColumnMapping, BridgeError> {
    if !req.column_mapping.is_empty() {
        return Ok(req.column_mapping.clone());
    }
    if req.header {
        let first_row = nth_row(workbook, sheet, 1)
            .map_err(|e| {
                BridgeError::bad_request(format!("unable to read rows of sheet {sheet:?}: {e}"))
            })?
            .ok_or_else(|| {
                BridgeError::bad_request(format!("unable to read first row of sheet {sheet:?}"))
            })?;
        return Ok(mapping_from_header(&first_row, schema));
    }
    Ok(positional_mapping(schema))
}

fn build_record(
    row: &[String],
    by_letter: &std::collections::HashMap<String, Vec<usize>>,
    schema: &Schema,
) -> Result<Record, BridgeError> {
    let mut record = Record::new();
    for (j, raw) in row.iter().enumerate() {
        let letter = column_letter(j as u32 + 1);
        let Some(indices) = by_letter.get(&letter) else {
            continue;
        };
        for &index in indices {
            let column = &schema.columns[index];
            match decode(column, raw) {
                Ok(value) => {
                    record.insert(column.name.clone(), value);
                }
                Err(DecodeError::OptionalEmpty) => continue,
                Err(e) => {
                    return Err(BridgeError::bad_request(format!(
                        "unable to convert {raw:?} (column {letter:?}) of {row:?} to {}: {e}",
                        column.column_type
                    )));
                }
            }
        }
    }
    Ok(record)
}

async fn rollback(writer: &mut dyn RowWriter) {
    if let Err(e) = writer.rollback().await {
        warn!("failed to roll back row writer: {e}");
    }
}
