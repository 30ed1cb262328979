//! End-to-end export tests against the in-memory store.

mod helpers;

use std::time::Duration;

use excel_bridge::config::SHEET_NAME;
use excel_bridge::convert::NumberPrecisionMode;
use excel_bridge::export::{
    export, export_query_result, ExportOptions, ExportQueryResultRequest, ExportRequest,
};
use excel_bridge::path::RowRange;
use excel_bridge::schema::{ColumnType, Value};
use excel_bridge::workbook::{CellValue, MemoryWorkbook};
use excel_bridge::{BridgeError, ErrorKind};
use tokio_util::sync::CancellationToken;

use helpers::{record, schema, store_with_table};

fn request(expr: &str) -> ExportRequest {
    ExportRequest::parse(expr, NumberPrecisionMode::String).expect("request parses")
}

async fn run_export(
    store: &excel_bridge::store::memory::MemoryStore,
    req: &ExportRequest,
) -> Result<(String, MemoryWorkbook), BridgeError> {
    helpers::init_logging();
    let rsp = export::<_, MemoryWorkbook>(
        store,
        req,
        &ExportOptions::default(),
        &CancellationToken::new(),
    )
    .await?;
    Ok((rsp.file_name, rsp.workbook))
}

#[tokio::test]
async fn test_export_epoch_zeros() {
    let store = store_with_table(
        "//tmp/epochs",
        schema(&[
            ("d", ColumnType::Date, false),
            ("dt", ColumnType::Datetime, false),
            ("ts", ColumnType::Timestamp, false),
        ]),
        vec![record(&[
            ("d", Value::Uint64(0)),
            ("dt", Value::Uint64(0)),
            ("ts", Value::Uint64(0)),
        ])],
    );

    let (_, wb) = run_export(&store, &request("//tmp/epochs")).await.expect("export");

    // Header rows: names on row 1, canonical type tokens on row 2.
    assert_eq!(wb.cell(SHEET_NAME, 1, 1).unwrap().value, CellValue::Text("d".into()));
    assert_eq!(wb.cell(SHEET_NAME, 2, 1).unwrap().value, CellValue::Text("dt".into()));
    assert_eq!(wb.cell(SHEET_NAME, 3, 1).unwrap().value, CellValue::Text("ts".into()));
    assert_eq!(wb.cell(SHEET_NAME, 1, 2).unwrap().value, CellValue::Text("date".into()));
    assert_eq!(
        wb.cell(SHEET_NAME, 2, 2).unwrap().value,
        CellValue::Text("datetime".into())
    );
    assert_eq!(
        wb.cell(SHEET_NAME, 3, 2).unwrap().value,
        CellValue::Text("timestamp".into())
    );

    // 1970-01-01 lands on serial 25569 in all three encodings.
    let d = wb.cell(SHEET_NAME, 1, 3).expect("A3 set");
    assert_eq!(d.value, CellValue::Uint(25_569));
    assert_eq!(wb.number_format(d.style.expect("date style")), Some("yyyy-mm-dd"));

    let dt = wb.cell(SHEET_NAME, 2, 3).expect("B3 set");
    assert_eq!(dt.value, CellValue::Float(25_569.0));
    assert_eq!(
        wb.number_format(dt.style.expect("datetime style")),
        Some("yyyy-mm-ddThh:mm:ssZ")
    );

    let ts = wb.cell(SHEET_NAME, 3, 3).expect("C3 set");
    assert_eq!(ts.value, CellValue::Float(25_569.0));
    assert_eq!(
        wb.number_format(ts.style.expect("timestamp style")),
        Some("yyyy-mm-ddThh:mm:ss.000Z")
    );
}

#[tokio::test]
async fn test_export_large_integer_string_mode() {
    let store = store_with_table(
        "//tmp/large",
        schema(&[("n", ColumnType::Int64, false)]),
        vec![record(&[("n", Value::Int64(4_291_747_199_999_999))])],
    );

    let (_, wb) = run_export(&store, &request("//tmp/large")).await.expect("export");

    let cell = wb.cell(SHEET_NAME, 1, 3).expect("A3 set");
    assert_eq!(cell.value, CellValue::Text("4291747199999999".into()));
    assert_eq!(cell.style, None, "degraded numbers carry no style");
}

#[tokio::test]
async fn test_export_large_integer_error_mode() {
    let store = store_with_table(
        "//tmp/large",
        schema(&[("n", ColumnType::Int64, false)]),
        vec![record(&[("n", Value::Int64(4_291_747_199_999_999))])],
    );

    let req = ExportRequest::parse("//tmp/large", NumberPrecisionMode::Error).expect("parses");
    let err = run_export(&store, &req).await.expect_err("must refuse");
    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(
        err.to_string().contains("4291747199999999"),
        "error must cite the value: {err}"
    );
}

#[tokio::test]
async fn test_export_sub_millisecond_timestamp_as_text() {
    // 2000-12-12T10:22:17.302001Z in microseconds since the unix epoch.
    let micros: u64 = 976_616_537 * 1_000_000 + 302_001;
    let store = store_with_table(
        "//tmp/ts",
        schema(&[("t", ColumnType::Timestamp, false)]),
        vec![record(&[("t", Value::Uint64(micros))])],
    );

    let (_, wb) = run_export(&store, &request("//tmp/ts")).await.expect("export");

    let cell = wb.cell(SHEET_NAME, 1, 3).expect("A3 set");
    assert_eq!(
        cell.value,
        CellValue::Text("2000-12-12T10:22:17.302001Z".into())
    );
    assert_eq!(cell.style, None);
}

#[tokio::test]
async fn test_export_row_weight_cap() {
    let store = store_with_table(
        "//tmp/big",
        schema(&[("s", ColumnType::String, false)]),
        vec![
            record(&[("s", Value::from("x".repeat(64)))]),
            record(&[("s", Value::from("y".repeat(64)))]),
        ],
    );

    let opts = ExportOptions {
        max_excel_file_size: 100,
        ..ExportOptions::default()
    };
    let err = export::<_, MemoryWorkbook>(
        &store,
        &request("//tmp/big"),
        &opts,
        &CancellationToken::new(),
    )
    .await
    .expect_err("output over the cap must fail");

    assert_eq!(err.kind(), ErrorKind::BadRequest);
    let msg = err.to_string();
    assert!(msg.contains("max total row weight exceeded"), "{msg}");
    assert!(msg.contains("128 B") && msg.contains("100 B"), "both sizes: {msg}");
}

#[tokio::test]
async fn test_export_projection_and_column_order() {
    let store = store_with_table(
        "//tmp/wide",
        schema(&[
            ("id", ColumnType::Int64, false),
            ("name", ColumnType::String, false),
            ("age", ColumnType::Int32, false),
        ]),
        vec![record(&[
            ("id", Value::Int64(1)),
            ("name", Value::from("ada")),
            ("age", Value::Int64(36)),
        ])],
    );

    // "ghost" is silently ignored; schema order decides output order.
    let (_, wb) = run_export(&store, &request(r#"//tmp/wide{"age","ghost","name"}"#))
        .await
        .expect("export");

    assert_eq!(
        wb.cell(SHEET_NAME, 1, 1).unwrap().value,
        CellValue::Text("name".into())
    );
    assert_eq!(
        wb.cell(SHEET_NAME, 2, 1).unwrap().value,
        CellValue::Text("age".into())
    );
    assert!(wb.cell(SHEET_NAME, 3, 1).is_none(), "only two columns exported");
    assert_eq!(
        wb.cell(SHEET_NAME, 1, 3).unwrap().value,
        CellValue::Text("ada".into())
    );
    assert_eq!(wb.cell(SHEET_NAME, 2, 3).unwrap().value, CellValue::Int(36));
}

#[tokio::test]
async fn test_export_row_range() {
    let rows = (0..10)
        .map(|i| record(&[("id", Value::Int64(i))]))
        .collect();
    let store = store_with_table("//tmp/r", schema(&[("id", ColumnType::Int64, false)]), rows);

    let (_, wb) = run_export(&store, &request("//tmp/r[#2:#4]")).await.expect("export");

    assert_eq!(wb.cell(SHEET_NAME, 1, 3).unwrap().value, CellValue::Int(2));
    assert_eq!(wb.cell(SHEET_NAME, 1, 4).unwrap().value, CellValue::Int(3));
    assert!(wb.cell(SHEET_NAME, 1, 5).is_none());
}

#[tokio::test]
async fn test_export_file_name_resolution() {
    let store = store_with_table(
        "//tmp/named",
        schema(&[("id", ColumnType::Int64, false)]),
        vec![],
    );
    store.set_attribute("//tmp/named", "file_name", serde_json::json!("report"));

    let (name, _) = run_export(&store, &request("//tmp/named")).await.expect("export");
    assert_eq!(name, "report.xlsx");

    let (name, _) = run_export(&store, &request("<file_name=custom.xlsx>//tmp/named"))
        .await
        .expect("export");
    assert_eq!(name, "custom.xlsx");
}

#[tokio::test]
async fn test_export_generated_file_name() {
    let store = store_with_table(
        "//tmp/plain",
        schema(&[("id", ColumnType::Int64, false)]),
        vec![],
    );

    let (name, _) = run_export(&store, &request("//tmp/plain")).await.expect("export");
    assert!(name.starts_with("yt__tmp_plain"), "generated name: {name}");
    assert!(name.ends_with(".xlsx"));
    assert_eq!(name.matches(".xlsx").count(), 1);
}

#[tokio::test]
async fn test_export_missing_table_is_bad_request() {
    let store = excel_bridge::store::memory::MemoryStore::new();
    let err = run_export(&store, &request("//tmp/absent"))
        .await
        .expect_err("missing table");
    assert_eq!(err.kind(), ErrorKind::BadRequest);
}

#[tokio::test]
async fn test_export_row_count_validation() {
    let store = store_with_table(
        "//tmp/r",
        schema(&[("id", ColumnType::Int64, false)]),
        vec![],
    );

    let mut req = request("//tmp/r");
    req.row_range = Some(RowRange {
        lower: 0,
        upper: 1_048_575,
    });
    let err = run_export(&store, &req).await.expect_err("over the row cap");
    assert!(err.to_string().contains("too many rows"), "{err}");
}

#[tokio::test]
async fn test_export_cancellation() {
    let store = store_with_table(
        "//tmp/c",
        schema(&[("id", ColumnType::Int64, false)]),
        vec![record(&[("id", Value::Int64(1))])],
    );

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = export::<_, MemoryWorkbook>(
        &store,
        &request("//tmp/c"),
        &ExportOptions::default(),
        &cancel,
    )
    .await
    .expect_err("cancelled request must not produce a workbook");
    assert!(matches!(err, BridgeError::Cancelled));
}

#[tokio::test]
async fn test_export_ceiling_cancels_blocked_read() {
    let store = store_with_table(
        "//tmp/slow",
        schema(&[("id", ColumnType::Int64, false)]),
        vec![record(&[("id", Value::Int64(1))])],
    );
    store.delay_operations(Duration::from_secs(600));

    let opts = ExportOptions {
        timeout: Some(Duration::from_millis(50)),
        ..ExportOptions::default()
    };
    let err = export::<_, MemoryWorkbook>(
        &store,
        &request("//tmp/slow"),
        &opts,
        &CancellationToken::new(),
    )
    .await
    .expect_err("a blocked reader must hit the ceiling, not hang");
    assert!(matches!(err, BridgeError::Cancelled));
}

#[tokio::test]
async fn test_export_query_result() {
    let store = excel_bridge::store::memory::MemoryStore::new();
    store.add_query_result(
        "abc-123",
        0,
        schema(&[
            ("id", ColumnType::Int64, false),
            ("word", ColumnType::String, false),
        ]),
        vec![
            record(&[("id", Value::Int64(1)), ("word", Value::from("alpha"))]),
            record(&[("id", Value::Int64(2)), ("word", Value::from("beta"))]),
        ],
    );

    let req = ExportQueryResultRequest {
        file_name: None,
        query_id: "abc-123".to_string(),
        result_index: 0,
        lower_row_index: Some(1),
        upper_row_index: None,
        columns: Vec::new(),
        precision_mode: NumberPrecisionMode::String,
    };
    let rsp = export_query_result::<_, MemoryWorkbook>(
        &store,
        &req,
        &ExportOptions::default(),
        &CancellationToken::new(),
    )
    .await
    .expect("export");

    assert_eq!(rsp.file_name, "yt_query_result__abc_123__0.xlsx");
    let wb = rsp.workbook;
    // Only the second result row survives the lower bound.
    assert_eq!(wb.cell(SHEET_NAME, 1, 3).unwrap().value, CellValue::Int(2));
    assert_eq!(
        wb.cell(SHEET_NAME, 2, 3).unwrap().value,
        CellValue::Text("beta".into())
    );
    assert!(wb.cell(SHEET_NAME, 1, 4).is_none());
}

#[tokio::test]
async fn test_export_query_result_unknown_id() {
    let store = excel_bridge::store::memory::MemoryStore::new();
    let req = ExportQueryResultRequest {
        file_name: None,
        query_id: "missing".to_string(),
        result_index: 0,
        lower_row_index: None,
        upper_row_index: None,
        columns: Vec::new(),
        precision_mode: NumberPrecisionMode::String,
    };
    let err = export_query_result::<_, MemoryWorkbook>(
        &store,
        &req,
        &ExportOptions::default(),
        &CancellationToken::new(),
    )
    .await
    .expect_err("unknown query id");
    assert_eq!(err.kind(), ErrorKind::BadRequest);
}

#[tokio::test]
async fn test_export_null_cells_are_left_empty() {
    let store = store_with_table(
        "//tmp/nulls",
        schema(&[
            ("id", ColumnType::Int64, false),
            ("note", ColumnType::String, false),
        ]),
        vec![record(&[("id", Value::Int64(7)), ("note", Value::Null)])],
    );

    let (_, wb) = run_export(&store, &request("//tmp/nulls")).await.expect("export");
    assert_eq!(wb.cell(SHEET_NAME, 1, 3).unwrap().value, CellValue::Int(7));
    assert!(wb.cell(SHEET_NAME, 2, 3).is_none(), "null cells stay unset");
}
