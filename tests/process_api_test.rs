// ==========================================
// ProcessApi 端到端测试
// ==========================================
// 测试目标: 文件 → 四张报表落盘 → 按名称下载;失败时不落盘
// ==========================================


use stock_cover::api::ApiError;
use stock_cover::config::ConfigOverrides;
use stock_cover::logging;
use stock_cover::repository::MANIFEST_FILE_NAME;
use stock_cover::{EngineConfig, ReportKind};
use tempfile::tempdir;
use test_helpers::{create_test_api, write_file};

const SALES_CSV: &str = "SKU,Quantity,Date\n\
                         A,300,2025-03-10\n\
                         C,30,2025-03-12\n";

const STOCK_CSV: &str = "SKU,Warehouse Id,Quantity,Live on Website\n\
                         A,W1,100,Yes\n\
                         B,W1,500,Yes\n";

#[tokio::test]
async fn test_process_files_persists_four_reports() {
    logging::init_test();

    let input_dir = tempdir().unwrap();
    let output_dir = tempdir().unwrap();
    let sales = write_file(input_dir.path(), "sales.csv", SALES_CSV);
    let stock = write_file(input_dir.path(), "stock.csv", STOCK_CSV);

    let api = create_test_api(output_dir.path(), EngineConfig::default());
    let response = api.process_files(&sales, &stock).await.unwrap();

    assert_eq!(response.status, "success");
    assert_eq!(
        response.files,
        vec![
            "stock_cover_summary.csv",
            "warehouse_level_stock.csv",
            "refill_recommendations.csv",
            "excess_stock.csv",
        ]
    );
    assert_eq!(response.overview.summary_count, 3);
    assert_eq!(response.overview.refill_count, 2);
    assert_eq!(response.overview.excess_count, 1);
    assert_eq!(response.overview.top_refill[0].sku, "A");

    for file in &response.files {
        assert!(output_dir.path().join(file).exists(), "{} missing", file);
    }
    assert!(output_dir.path().join(MANIFEST_FILE_NAME).exists());

    let manifest = api.latest_manifest().await.unwrap();
    assert_eq!(manifest.run_id, response.run_id);
    assert_eq!(manifest.artifacts.len(), 4);
}

#[tokio::test]
async fn test_download_by_name() {
    logging::init_test();

    let input_dir = tempdir().unwrap();
    let output_dir = tempdir().unwrap();
    let sales = write_file(input_dir.path(), "sales.csv", SALES_CSV);
    let stock = write_file(input_dir.path(), "stock.csv", STOCK_CSV);

    let api = create_test_api(output_dir.path(), EngineConfig::default());
    api.process_files(&sales, &stock).await.unwrap();

    let report = api.download("refill_recommendations").await.unwrap();
    assert_eq!(report.kind, ReportKind::RefillRecommendations);
    assert_eq!(report.file_name, "refill_recommendations.csv");

    let text = String::from_utf8(report.content.clone()).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("SKU,Total Sales,DRR,30day_requirement,Total FBF Stock,Required Qty to reach 30d,Recommended Warehouse")
    );
    assert_eq!(lines.next(), Some("A,300,10.00,300,100,200,W1"));
    assert_eq!(lines.next(), Some("C,30,1.00,30,0,30,UNRESOLVED"));

    // 带后缀的名称同样可下载
    let same = api.download("refill_recommendations.csv").await.unwrap();
    assert_eq!(same.content, report.content);

    let summary = api.download("stock_cover_summary").await.unwrap();
    let summary_text = String::from_utf8(summary.content).unwrap();
    assert!(summary_text.contains("B,0,0.00,0,500,∞"));
}

#[tokio::test]
async fn test_download_unknown_name_is_not_found() {
    logging::init_test();

    let output_dir = tempdir().unwrap();
    let api = create_test_api(output_dir.path(), EngineConfig::default());

    let err = api.download("inventory_dump").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(err.code(), "NOT_FOUND");

    // 合法名称但尚未运行
    let err = api.download("excess_stock").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_all_rejected_source_fails_without_artifacts() {
    logging::init_test();

    let input_dir = tempdir().unwrap();
    let output_dir = tempdir().unwrap();
    let sales = write_file(
        input_dir.path(),
        "sales.csv",
        "SKU,Quantity,Date\nA,-1,2025-03-10\nB,x,2025-03-10\n",
    );
    let stock = write_file(input_dir.path(), "stock.csv", STOCK_CSV);

    let api = create_test_api(output_dir.path(), EngineConfig::default());
    let err = api.process_files(&sales, &stock).await.unwrap_err();

    assert_eq!(err.code(), "SOURCE_EMPTY");
    let response = err.to_response();
    assert_eq!(response.status, "error");

    assert!(!output_dir.path().join(MANIFEST_FILE_NAME).exists());
    for kind in ReportKind::ALL {
        assert!(!output_dir.path().join(kind.file_name()).exists());
    }
}

#[tokio::test]
async fn test_invalid_override_is_config_invalid() {
    logging::init_test();

    let input_dir = tempdir().unwrap();
    let output_dir = tempdir().unwrap();
    let sales = write_file(input_dir.path(), "sales.csv", SALES_CSV);
    let stock = write_file(input_dir.path(), "stock.csv", STOCK_CSV);

    let api = create_test_api(output_dir.path(), EngineConfig::default()).with_overrides(
        ConfigOverrides {
            refill_threshold_days: Some(-5.0),
            ..ConfigOverrides::default()
        },
    );

    let err = api.process_files(&sales, &stock).await.unwrap_err();
    assert_eq!(err.code(), "CONFIG_INVALID");
    assert!(!output_dir.path().join(MANIFEST_FILE_NAME).exists());
}

#[tokio::test]
async fn test_unsupported_file_is_import_error() {
    logging::init_test();

    let input_dir = tempdir().unwrap();
    let output_dir = tempdir().unwrap();
    let sales = write_file(input_dir.path(), "sales.json", "{}");
    let stock = write_file(input_dir.path(), "stock.csv", STOCK_CSV);

    let api = create_test_api(output_dir.path(), EngineConfig::default());
    let err = api.process_files(&sales, &stock).await.unwrap_err();
    assert_eq!(err.code(), "IMPORT_FAILED");
}

#[tokio::test]
async fn test_rerun_replaces_previous_artifacts() {
    logging::init_test();

    let input_dir = tempdir().unwrap();
    let output_dir = tempdir().unwrap();
    let sales = write_file(input_dir.path(), "sales.csv", SALES_CSV);
    let stock = write_file(input_dir.path(), "stock.csv", STOCK_CSV);

    let api = create_test_api(output_dir.path(), EngineConfig::default());
    let first = api.process_files(&sales, &stock).await.unwrap();
    let first_refill = api.download("refill_recommendations").await.unwrap();

    let second = api.process_files(&sales, &stock).await.unwrap();
    let second_refill = api.download("refill_recommendations").await.unwrap();

    assert_ne!(first.run_id, second.run_id);
    assert_eq!(first_refill.content, second_refill.content);
    assert_eq!(api.latest_manifest().await.unwrap().run_id, second.run_id);
}

#[tokio::test]
async fn test_download_requires_committed_manifest() {
    logging::init_test();

    let input_dir = tempdir().unwrap();
    let output_dir = tempdir().unwrap();
    let sales = write_file(input_dir.path(), "sales.csv", SALES_CSV);
    let stock = write_file(input_dir.path(), "stock.csv", STOCK_CSV);

    let api = create_test_api(output_dir.path(), EngineConfig::default());
    api.process_files(&sales, &stock).await.unwrap();
    assert!(api.download("excess_stock").await.is_ok());

    // 报表文件仍在,但清单缺失时视为未提交
    std::fs::remove_file(output_dir.path().join(MANIFEST_FILE_NAME)).unwrap();
    assert!(output_dir.path().join("excess_stock.csv").exists());

    let err = api.download("excess_stock").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
