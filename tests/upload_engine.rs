//! End-to-end upload tests against the in-memory store.

mod helpers;

use std::time::Duration;

use excel_bridge::mapping::ColumnMapping;
use excel_bridge::schema::{ColumnType, Value};
use excel_bridge::store::memory::MemoryStore;
use excel_bridge::upload::{upload, UploadOptions, UploadParams, UploadRequest};
use excel_bridge::workbook::MemoryWorkbook;
use excel_bridge::{BridgeError, ErrorKind};
use tokio_util::sync::CancellationToken;

use helpers::{record, schema, store_with_table, workbook_from_rows};

fn params(path: &str) -> UploadParams {
    UploadParams {
        path: path.to_string(),
        ..UploadParams::default()
    }
}

async fn run_upload(
    store: &MemoryStore,
    params: UploadParams,
    workbook: MemoryWorkbook,
) -> Result<(), BridgeError> {
    helpers::init_logging();
    let req = UploadRequest::new(params)?.with_workbook(Box::new(workbook));
    upload(store, &req, &UploadOptions::default(), &CancellationToken::new()).await
}

#[tokio::test]
async fn test_upload_header_types_create() {
    let store = MemoryStore::new();
    let wb = workbook_from_rows(&[
        &["ui_64", "i_64"],
        &["uint64", "int64"],
        &["1", "-64"],
    ]);

    run_upload(
        &store,
        UploadParams {
            header: true,
            types: true,
            create: true,
            ..params("/t")
        },
        wb,
    )
    .await
    .expect("upload");

    let created = store.table_schema("/t").expect("table created");
    assert_eq!(created.columns.len(), 2);
    assert_eq!(created.columns[0].name, "ui_64");
    assert_eq!(created.columns[0].column_type, ColumnType::Uint64);
    assert_eq!(created.columns[1].name, "i_64");
    assert_eq!(created.columns[1].column_type, ColumnType::Int64);

    assert_eq!(
        store.table_rows("/t").expect("rows"),
        vec![record(&[
            ("ui_64", Value::Uint64(1)),
            ("i_64", Value::Int64(-64)),
        ])]
    );
}

#[tokio::test]
async fn test_upload_positional_mapping_parse_error_aborts() {
    let store = store_with_table(
        "//tmp/t",
        schema(&[
            ("a", ColumnType::Int64, true),
            ("b", ColumnType::Int64, true),
        ]),
        vec![record(&[("a", Value::Int64(0)), ("b", Value::Int64(0))])],
    );

    let wb = workbook_from_rows(&[&["x", "2"]]);
    let err = run_upload(&store, params("//tmp/t"), wb)
        .await
        .expect_err("unparseable required cell must fail");

    assert_eq!(err.kind(), ErrorKind::BadRequest);
    let msg = err.to_string();
    assert!(msg.contains("\"x\""), "quotes the value: {msg}");
    assert!(msg.contains("\"A\""), "quotes the cell letter: {msg}");
    assert!(msg.contains("int64"), "names the target type: {msg}");
    assert!(msg.contains("\"2\""), "quotes the row content: {msg}");

    // Transaction aborted: the destination is untouched.
    assert_eq!(
        store.table_rows("//tmp/t").expect("rows"),
        vec![record(&[("a", Value::Int64(0)), ("b", Value::Int64(0))])]
    );
}

#[tokio::test]
async fn test_upload_reused_spreadsheet_column_broadcasts() {
    let store = store_with_table(
        "//tmp/t",
        schema(&[
            ("a", ColumnType::Int64, false),
            ("b", ColumnType::Int64, false),
        ]),
        vec![],
    );

    let wb = workbook_from_rows(&[&["7"], &["8"]]);
    run_upload(
        &store,
        UploadParams {
            column_mapping: ColumnMapping::from([
                ("a".to_string(), "A".to_string()),
                ("b".to_string(), "A".to_string()),
            ]),
            ..params("//tmp/t")
        },
        wb,
    )
    .await
    .expect("upload");

    assert_eq!(
        store.table_rows("//tmp/t").expect("rows"),
        vec![
            record(&[("a", Value::Int64(7)), ("b", Value::Int64(7))]),
            record(&[("a", Value::Int64(8)), ("b", Value::Int64(8))]),
        ]
    );
}

#[tokio::test]
async fn test_upload_mapping_size_mismatch() {
    let store = store_with_table(
        "//tmp/t",
        schema(&[
            ("a", ColumnType::Int64, false),
            ("b", ColumnType::Int64, false),
        ]),
        vec![record(&[("a", Value::Int64(1)), ("b", Value::Int64(2))])],
    );

    let wb = workbook_from_rows(&[&["7"]]);
    let err = run_upload(
        &store,
        UploadParams {
            column_mapping: ColumnMapping::from([("a".to_string(), "A".to_string())]),
            ..params("//tmp/t")
        },
        wb,
    )
    .await
    .expect_err("short mapping must fail");

    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(
        err.to_string()
            .contains("schema has 2 column(s), request has 1"),
        "{err}"
    );
    assert_eq!(
        store.table_rows("//tmp/t").expect("rows").len(),
        1,
        "destination untouched"
    );
}

#[tokio::test]
async fn test_upload_create_failure_leaves_table_absent() {
    let store = MemoryStore::new();
    let wb = workbook_from_rows(&[&["a"], &["varchar"], &["1"]]);

    let err = run_upload(
        &store,
        UploadParams {
            header: true,
            types: true,
            create: true,
            ..params("//tmp/new")
        },
        wb,
    )
    .await
    .expect_err("unknown type token must fail");

    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert!(!store.table_exists("//tmp/new"), "nothing may be created");
}

#[tokio::test]
async fn test_upload_overwrite_and_append() {
    let schema_ = schema(&[("id", ColumnType::Int64, false)]);
    let store = store_with_table(
        "//tmp/t",
        schema_.clone(),
        vec![record(&[("id", Value::Int64(100))])],
    );

    // Overwrite replaces the existing row.
    run_upload(&store, params("//tmp/t"), workbook_from_rows(&[&["1"]]))
        .await
        .expect("overwrite upload");
    assert_eq!(
        store.table_rows("//tmp/t").expect("rows"),
        vec![record(&[("id", Value::Int64(1))])]
    );

    // Append keeps it.
    run_upload(
        &store,
        UploadParams {
            append: true,
            ..params("//tmp/t")
        },
        workbook_from_rows(&[&["2"]]),
    )
    .await
    .expect("append upload");
    assert_eq!(
        store.table_rows("//tmp/t").expect("rows"),
        vec![
            record(&[("id", Value::Int64(1))]),
            record(&[("id", Value::Int64(2))]),
        ]
    );
}

#[tokio::test]
async fn test_upload_row_range_and_empty_rows() {
    let store = store_with_table(
        "//tmp/t",
        schema(&[("id", ColumnType::Int64, false)]),
        vec![],
    );

    // Row 2 is physically empty; the row index still advances past it.
    let wb = workbook_from_rows(&[&["1"], &[], &["3"], &["4"], &["5"]]);
    run_upload(
        &store,
        UploadParams {
            start_row: 3,
            row_count: 2,
            ..params("//tmp/t")
        },
        wb,
    )
    .await
    .expect("upload");

    assert_eq!(
        store.table_rows("//tmp/t").expect("rows"),
        vec![
            record(&[("id", Value::Int64(3))]),
            record(&[("id", Value::Int64(4))]),
        ]
    );
}

#[tokio::test]
async fn test_upload_optional_empty_cells_are_skipped() {
    let store = store_with_table(
        "//tmp/t",
        schema(&[
            ("id", ColumnType::Int64, true),
            ("note", ColumnType::String, false),
        ]),
        vec![],
    );

    let wb = workbook_from_rows(&[&["1", ""]]);
    run_upload(&store, params("//tmp/t"), wb).await.expect("upload");

    assert_eq!(
        store.table_rows("//tmp/t").expect("rows"),
        vec![record(&[("id", Value::Int64(1))])],
        "the empty optional field is absent from the record"
    );
}

#[tokio::test]
async fn test_upload_picks_first_visible_sheet() {
    let store = store_with_table(
        "//tmp/t",
        schema(&[("id", ColumnType::Int64, false)]),
        vec![],
    );

    let mut wb = MemoryWorkbook::new();
    wb.add_sheet("Hidden", false);
    wb.set_sheet_cell(
        "Hidden",
        1,
        1,
        excel_bridge::workbook::Cell::text("999"),
    );
    wb.set_sheet_cell(
        "Visible",
        1,
        1,
        excel_bridge::workbook::Cell::text("42"),
    );

    run_upload(&store, params("//tmp/t"), wb).await.expect("upload");
    assert_eq!(
        store.table_rows("//tmp/t").expect("rows"),
        vec![record(&[("id", Value::Int64(42))])]
    );
}

#[tokio::test]
async fn test_upload_missing_sheet_is_bad_request() {
    let store = store_with_table(
        "//tmp/t",
        schema(&[("id", ColumnType::Int64, false)]),
        vec![],
    );

    let err = run_upload(
        &store,
        UploadParams {
            sheet: Some("Nope".to_string()),
            ..params("//tmp/t")
        },
        workbook_from_rows(&[&["1"]]),
    )
    .await
    .expect_err("unknown sheet");
    assert_eq!(err.kind(), ErrorKind::BadRequest);
}

#[tokio::test]
async fn test_upload_denied_write_is_unauthorized() {
    let store = store_with_table(
        "//tmp/locked",
        schema(&[("id", ColumnType::Int64, false)]),
        vec![],
    );
    store.deny_path("//tmp/locked");

    let err = run_upload(&store, params("//tmp/locked"), workbook_from_rows(&[&["1"]]))
        .await
        .expect_err("denied destination");
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn test_upload_denied_create_is_unauthorized() {
    let store = MemoryStore::new();
    store.deny_path("//tmp/new");

    let err = run_upload(
        &store,
        UploadParams {
            create: true,
            ..params("//tmp/new")
        },
        workbook_from_rows(&[&["1"]]),
    )
    .await
    .expect_err("denied create");
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert!(!store.table_exists("//tmp/new"));
}

#[tokio::test]
async fn test_upload_commit_authorization_failure() {
    let store = store_with_table(
        "//tmp/t",
        schema(&[("id", ColumnType::Int64, false)]),
        vec![],
    );
    store.fail_commits_with_authorization();

    let err = run_upload(&store, params("//tmp/t"), workbook_from_rows(&[&["1"]]))
        .await
        .expect_err("commit denied");
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(
        store.table_rows("//tmp/t").expect("rows").len(),
        0,
        "nothing committed"
    );
}

#[tokio::test]
async fn test_upload_cancellation_aborts() {
    let store = store_with_table(
        "//tmp/t",
        schema(&[("id", ColumnType::Int64, false)]),
        vec![],
    );

    let req = UploadRequest::new(params("//tmp/t"))
        .expect("valid")
        .with_workbook(Box::new(workbook_from_rows(&[&["1"]])));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = upload(&store, &req, &UploadOptions::default(), &cancel)
        .await
        .expect_err("cancelled");
    assert!(matches!(err, BridgeError::Cancelled));
    assert_eq!(store.table_rows("//tmp/t").expect("rows").len(), 0);
}

#[tokio::test]
async fn test_upload_without_workbook_is_internal() {
    let store = store_with_table(
        "//tmp/t",
        schema(&[("id", ColumnType::Int64, false)]),
        vec![],
    );

    let req = UploadRequest::new(params("//tmp/t")).expect("valid");
    let err = upload(&store, &req, &UploadOptions::default(), &CancellationToken::new())
        .await
        .expect_err("no workbook attached");
    assert_eq!(err.kind(), ErrorKind::Internal);
}

#[tokio::test]
async fn test_upload_ceiling_cancels_blocked_write() {
    let store = store_with_table(
        "//tmp/t",
        schema(&[("id", ColumnType::Int64, false)]),
        vec![],
    );
    store.delay_operations(Duration::from_secs(600));

    let req = UploadRequest::new(params("//tmp/t"))
        .expect("valid")
        .with_workbook(Box::new(workbook_from_rows(&[&["1"]])));
    let opts = UploadOptions {
        timeout: Some(Duration::from_millis(50)),
    };

    let err = upload(&store, &req, &opts, &CancellationToken::new())
        .await
        .expect_err("blocked writer must hit the ceiling");
    assert!(matches!(err, BridgeError::Cancelled));
    assert_eq!(
        store.table_rows("//tmp/t").expect("rows").len(),
        0,
        "the aborted transaction must leave the destination untouched"
    );
}
