// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: config_kv 文件库 → 运行配置 → 流水线
// ==========================================


use chrono::NaiveDate;
use std::sync::Arc;
use stock_cover::api::ProcessApi;
use stock_cover::app::AppState;
use stock_cover::config::{config_keys, ConfigError, ConfigOverrides};
use stock_cover::engine::EngineError;
use stock_cover::logging;
use stock_cover::repository::FsReportRepository;
use stock_cover::{ConfigManager, EngineConfigReader, StockCoverPipeline};
use tempfile::tempdir;
use test_helpers::{create_test_db, write_file, SalesTableBuilder, StockTableBuilder};

#[tokio::test]
async fn test_values_persist_across_instances() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().unwrap();

    {
        let manager = ConfigManager::new(&db_path).unwrap();
        manager
            .set_config_value(config_keys::LOOKBACK_DAYS, "14")
            .unwrap();
        manager
            .set_config_value(config_keys::AS_OF, "2025-03-31")
            .unwrap();
    }

    let manager = ConfigManager::new(&db_path).unwrap();
    let config = manager.load_engine_config().await.unwrap();
    assert_eq!(config.lookback_days, 14);
    assert_eq!(config.as_of, NaiveDate::from_ymd_opt(2025, 3, 31));
    assert_eq!(config.refill_threshold_days, 30.0);
    assert_eq!(config.excess_threshold_days, 60.0);

    let stored = manager.list_configs().unwrap();
    assert_eq!(stored.len(), 2);
    assert!(manager
        .get_config_snapshot()
        .unwrap()
        .contains("\"lookback_days\":\"14\""));
}

#[tokio::test]
async fn test_unknown_key_and_bad_format_are_rejected() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().unwrap();
    let manager = ConfigManager::new(&db_path).unwrap();

    assert!(matches!(
        manager.set_config_value("max_days", "5"),
        Err(ConfigError::UnknownKey(_))
    ));
    assert!(matches!(
        manager.set_config_value(config_keys::REFILL_THRESHOLD_DAYS, "thirty"),
        Err(ConfigError::ParseError { .. })
    ));
    assert!(manager.list_configs().unwrap().is_empty());
}

#[tokio::test]
async fn test_stored_non_positive_threshold_fails_pipeline_creation() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().unwrap();
    let manager = ConfigManager::new(&db_path).unwrap();
    manager
        .set_config_value(config_keys::EXCESS_THRESHOLD_DAYS, "0")
        .unwrap();

    let result = StockCoverPipeline::from_reader(&manager, &ConfigOverrides::default()).await;
    match result {
        Err(EngineError::ConfigInvalid { key, .. }) => {
            assert_eq!(key, config_keys::EXCESS_THRESHOLD_DAYS)
        }
        Err(other) => panic!("expected ConfigInvalid, got {}", other),
        Ok(_) => panic!("expected ConfigInvalid"),
    }

    // 覆写可以修正存储值
    let overrides = ConfigOverrides {
        excess_threshold_days: Some(90.0),
        ..ConfigOverrides::default()
    };
    let pipeline = StockCoverPipeline::from_reader(&manager, &overrides)
        .await
        .unwrap();
    assert_eq!(pipeline.config().excess_threshold_days, 90.0);
}

#[tokio::test]
async fn test_stored_thresholds_drive_classification() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().unwrap();
    let manager = ConfigManager::new(&db_path).unwrap();
    manager
        .set_config_value(config_keys::REFILL_THRESHOLD_DAYS, "5")
        .unwrap();
    manager
        .set_config_value(config_keys::DECIMAL_PLACES, "1")
        .unwrap();

    let pipeline = StockCoverPipeline::from_reader(&manager, &ConfigOverrides::default())
        .await
        .unwrap();

    let sales = SalesTableBuilder::new().sale("A", 300.0, "2025-03-10").build();
    let stock = StockTableBuilder::new().stock("A", "W1", 100.0).build();
    let output = pipeline.run(sales, stock).unwrap();

    // 覆盖 10 天,高于补货阈值 5 天
    assert!(output.classification.refill.is_empty());
    assert_eq!(output.reports.summary.rows[0][2], "10.0");
    assert_eq!(output.config.refill_threshold_days, 5.0);
}

#[tokio::test]
async fn test_app_state_uses_stored_config() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().unwrap();
    let input_dir = tempdir().unwrap();
    let output_dir = tempdir().unwrap();

    let state = AppState::new(
        db_path.clone(),
        output_dir.path().to_path_buf(),
        ConfigOverrides::default(),
    )
    .unwrap();
    state
        .config_manager
        .set_config_value(config_keys::LOOKBACK_DAYS, "10")
        .unwrap();

    let sales = write_file(input_dir.path(), "sales.csv", "SKU,Quantity,Date\nA,100,2025-03-10\n");
    let stock = write_file(
        input_dir.path(),
        "stock.csv",
        "SKU,Warehouse Id,Quantity\nA,W1,1000\n",
    );

    let response = state.process_api.process_files(&sales, &stock).await.unwrap();
    assert_eq!(response.config.lookback_days, 10);
    assert!((response.summary[0].drr - 10.0).abs() < 1e-9);

    // 同一配置库也可供独立组装的 API 使用
    let api = ProcessApi::new(
        Arc::new(ConfigManager::new(&db_path).unwrap()),
        Arc::new(FsReportRepository::new(output_dir.path())),
    );
    let downloaded = api.download("stock_cover_summary").await.unwrap();
    assert!(!downloaded.content.is_empty());
}
