//! The export engine.

use std::time::Duration;

use log::{debug, info};
use tokio_util::sync::CancellationToken;

use crate::config::{DEFAULT_MAX_EXCEL_FILE_SIZE, EXCEL_MAX_COLUMN_COUNT};
use crate::convert::{encode, CellStyles, EncodeError, NumberPrecisionMode};
use crate::error_handling::{classify_store_error, BridgeError};
use crate::mapping::export_projection;
use crate::schema::Schema;
use crate::store::{QueryReadOptions, RowReader, StoreClient, ATTR_SCHEMA};
use crate::utils::{human_bytes, with_request_timeout};
use crate::workbook::{Cell, WorkbookBuilder};

/// Export engine options.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Cap on the accumulated row weight of the output workbook.
    pub max_excel_file_size: usize,
    /// Ceiling on the request's wall-clock time; `None` applies
    /// [`crate::config::DEFAULT_REQUEST_TIMEOUT`].
    pub timeout: Option<Duration>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            max_excel_file_size: DEFAULT_MAX_EXCEL_FILE_SIZE,
            timeout: None,
        }
    }
}

/// Outcome of an export: the download name and the built workbook.
#[derive(Debug)]
pub struct ExportResponse<W> {
    /// Name the caller should serve the bytes under.
    pub file_name: String,
    /// The built workbook, ready to serialize.
    pub workbook: W,
}

/// Exports a static table to a workbook.
///
/// The call is bounded by the request ceiling in `opts`; when it expires
/// the reader is dropped and [`BridgeError::Cancelled`] surfaces without a
/// partial workbook.
pub async fn export<C, W>(
    client: &C,
    req: &super::ExportRequest,
    opts: &ExportOptions,
    cancel: &CancellationToken,
) -> Result<ExportResponse<W>, BridgeError>
where
    C: StoreClient + ?Sized,
    W: WorkbookBuilder + Default,
{
    with_request_timeout(opts.timeout, export_inner(client, req, opts, cancel)).await
}

async fn export_inner<C, W>(
    client: &C,
    req: &super::ExportRequest,
    opts: &ExportOptions,
    cancel: &CancellationToken,
) -> Result<ExportResponse<W>, BridgeError>
where
    C: StoreClient + ?Sized,
    W: WorkbookBuilder + Default,
{
    info!("exporting {req}");

    let schema = read_schema(client, req).await?;
    let file_name = super::request::resolve_file_name(client, req).await;
    check_column_cap(req.columns.len(), schema.columns.len())?;

    let range = super::request::effective_range(client, req).await?;
    let mut reader = client
        .read_table(&req.read_spec(range))
        .await
        .map_err(|e| classify_store_error("error creating reader", e))?;

    let columns = if req.columns.is_empty() {
        schema.column_names()
    } else {
        req.columns.clone()
    };

    let workbook = convert_rows(
        reader.as_mut(),
        &columns,
        &schema,
        req.precision_mode,
        opts,
        cancel,
    )
    .await
    .map_err(|e| e.with_context(&format!("error converting {req}")))?;

    debug!("export of {req} finished");
    Ok(ExportResponse {
        file_name,
        workbook,
    })
}

/// Exports one query-tracker result to a workbook.
///
/// Bounded by the same request ceiling as [`export`].
pub async fn export_query_result<C, W>(
    client: &C,
    req: &super::ExportQueryResultRequest,
    opts: &ExportOptions,
    cancel: &CancellationToken,
) -> Result<ExportResponse<W>, BridgeError>
where
    C: StoreClient + ?Sized,
    W: WorkbookBuilder + Default,
{
    with_request_timeout(opts.timeout, export_query_result_inner(client, req, opts, cancel)).await
}

async fn export_query_result_inner<C, W>(
    client: &C,
    req: &super::ExportQueryResultRequest,
    opts: &ExportOptions,
    cancel: &CancellationToken,
) -> Result<ExportResponse<W>, BridgeError>
where
    C: StoreClient + ?Sized,
    W: WorkbookBuilder + Default,
{
    info!(
        "exporting query result {}/{}",
        req.query_id, req.result_index
    );

    if let Some(lower) = req.lower_row_index {
        if lower < 0 {
            return Err(BridgeError::bad_request(format!(
                "start row cannot be negative; got {lower}"
            )));
        }
    }

    let qr = client
        .get_query_result(req.query_id.as_str(), req.result_index)
        .await
        .map_err(|e| {
            BridgeError::bad_request(format!(
                "error getting query result by id {:?}: {e}",
                req.query_id
            ))
        })?;

    let file_name = req.resolve_file_name();
    check_column_cap(req.columns.len(), qr.schema.columns.len())?;

    let read_opts = QueryReadOptions {
        columns: req.columns.clone(),
        lower_row_index: req.lower_row_index,
        upper_row_index: req.upper_row_index,
    };
    let mut reader = client
        .read_query_result(req.query_id.as_str(), req.result_index, &read_opts)
        .await
        .map_err(|e| BridgeError::bad_request(format!("error opening query result reader: {e}")))?;

    let columns = if req.columns.is_empty() {
        qr.schema.column_names()
    } else {
        req.columns.clone()
    };

    let workbook = convert_rows(
        reader.as_mut(),
        &columns,
        &qr.schema,
        req.precision_mode,
        opts,
        cancel,
    )
    .await
    .map_err(|e| e.with_context(&format!("error converting {:?}", req.query_id)))?;

    Ok(ExportResponse {
        file_name,
        workbook,
    })
}

async fn read_schema<C: StoreClient + ?Sized>(
    client: &C,
    req: &super::ExportRequest,
) -> Result<Schema, BridgeError> {
    let value = client
        .get_attribute(&req.path, ATTR_SCHEMA)
        .await
        .map_err(|e| classify_store_error(&format!("error reading schema for {:?}", req.path.as_str()), e))?;
    serde_json::from_value(value)
        .map_err(|e| BridgeError::internal(format!("malformed schema attribute: {e}")))
}

fn check_column_cap(requested: usize, in_schema: usize) -> Result<(), BridgeError> {
    if requested > EXCEL_MAX_COLUMN_COUNT || (requested == 0 && in_schema > EXCEL_MAX_COLUMN_COUNT)
    {
        return Err(BridgeError::bad_request(format!(
            "exceeding max number of excel columns {EXCEL_MAX_COLUMN_COUNT}"
        )));
    }
    Ok(())
}

/// Streams rows into a fresh workbook: header on rows 1-2, data from row 3,
/// weight accounting after every data row.
async fn convert_rows<W>(
    reader: &mut dyn RowReader,
    columns: &[String],
    schema: &Schema,
    mode: NumberPrecisionMode,
    opts: &ExportOptions,
    cancel: &CancellationToken,
) -> Result<W, BridgeError>
where
    W: WorkbookBuilder + Default,
{
    let mut workbook = W::default();
    let styles = CellStyles::register(&mut workbook);

    let header = export_projection(columns, schema);
    for (name, col) in &header {
        workbook.set_cell(col.index, 1, Cell::text(name.clone()));
        workbook.set_cell(col.index, 2, Cell::text(col.column.column_type.as_str()));
    }

    let mut total_row_weight = 0usize;
    let mut excel_row: u32 = 3;

    loop {
        if cancel.is_cancelled() {
            return Err(BridgeError::Cancelled);
        }

        let row = match reader.next_row().await {
            Ok(Some(row)) => row,
            Ok(None) => break,
            Err(e) => return Err(classify_store_error("error reading data", e)),
        };

        let mut row_weight = 0usize;
        for (name, value) in &row {
            let col = header.get(name).ok_or_else(|| {
                BridgeError::internal(format!("unable to find column {name:?} in schema"))
            })?;

            if value.is_null() {
                continue;
            }

            let cell = encode(&col.column.column_type, value, mode, &styles)
                .map_err(|e| encode_failure(name, excel_row - 3, e))?;
            row_weight += cell.value.weight();
            workbook.set_cell(col.index, excel_row, cell);
        }

        total_row_weight += row_weight;
        if total_row_weight >= opts.max_excel_file_size {
            return Err(BridgeError::bad_request(format!(
                "max total row weight exceeded: {} >= {}; \
                 try specifying a smaller range of rows or exclude unneeded columns",
                human_bytes(total_row_weight),
                human_bytes(opts.max_excel_file_size)
            )));
        }

        excel_row += 1;
    }

    Ok(workbook)
}

fn encode_failure(column: &str, data_row: u32, err: EncodeError) -> BridgeError {
    let message = format!("error converting value from column {column:?} and row {data_row}: {err}");
    match err {
        EncodeError::PrecisionLoss { .. } => BridgeError::bad_request(message),
        _ => BridgeError::internal(message),
    }
}

impl BridgeError {
    /// Prefixes the message with an operation context, keeping the kind.
    fn with_context(self, context: &str) -> BridgeError {
        match self {
            BridgeError::BadRequest(m) => BridgeError::BadRequest(format!("{context}: {m}")),
            BridgeError::Unauthorized(m) => BridgeError::Unauthorized(format!("{context}: {m}")),
            BridgeError::Internal(m) => BridgeError::Internal(format!("{context}: {m}")),
            other => other,
        }
    }
}
