// ==========================================
// 导入层集成测试
// ==========================================
// 测试目标: 文件解析 → 列别名解析 → 清洗 → 拒绝统计
// ==========================================


use chrono::NaiveDate;
use stock_cover::importer::{ImportError, RecordNormalizer, UniversalFileParser};
use stock_cover::logging;
use stock_cover::{SalesRecord, StockRecord};
use tempfile::tempdir;
use test_helpers::write_file;

#[test]
fn test_sales_csv_with_alias_headers() {
    logging::init_test();

    let dir = tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "sales.csv",
        "\u{feff}Seller SKU,Order Date,Units Sold,FC\n\
         A-100,2025-03-01,\"1,200\",W1\n\
         A-100,20250302,3,\n\
         B-200,2025/03/03,0,W2\n",
    );

    let table = UniversalFileParser.parse(&path).unwrap();
    assert_eq!(table.len(), 3);

    let mut records = RecordNormalizer.sales(table);
    let parsed: Vec<SalesRecord> = records.by_ref().collect();
    let report = records.rejection_report();

    assert_eq!(report.accepted, 3);
    assert_eq!(report.rejected, 0);

    assert_eq!(parsed[0].sku, "A-100");
    assert_eq!(parsed[0].quantity, 1200.0);
    assert_eq!(parsed[0].warehouse_id.as_deref(), Some("W1"));
    assert_eq!(parsed[1].date, NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
    assert_eq!(parsed[1].warehouse_id, None);
    assert_eq!(parsed[2].quantity, 0.0);
}

#[test]
fn test_sales_rejections_are_counted_not_fatal() {
    logging::init_test();

    let dir = tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "sales.csv",
        "SKU,Quantity,Date\n\
         A,10,2025-03-01\n\
         ,5,2025-03-01\n\
         A,-3,2025-03-01\n\
         A,abc,2025-03-01\n\
         A,7,not-a-date\n\
         B,2,2025-03-02\n",
    );

    let table = UniversalFileParser.parse(&path).unwrap();
    let mut records = RecordNormalizer.sales(table);
    let parsed: Vec<SalesRecord> = records.by_ref().collect();
    let report = records.rejection_report();

    assert_eq!(parsed.len(), 2);
    assert_eq!(report.total_rows, 6);
    assert_eq!(report.accepted, 2);
    assert_eq!(report.rejected, 4);
    assert!(!report.all_rejected());

    let rejected_rows: Vec<usize> = report.samples.iter().map(|s| s.row_number).collect();
    assert_eq!(rejected_rows, vec![2, 3, 4, 5]);
}

#[test]
fn test_stock_csv_live_flags() {
    logging::init_test();

    let dir = tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "stock.csv",
        "SKU,Warehouse,Available Qty,Live\n\
         A,W1,40,Yes\n\
         A,W2,60,no\n\
         B,W1,5,\n",
    );

    let table = UniversalFileParser.parse(&path).unwrap();
    let records: Vec<StockRecord> = RecordNormalizer.stock(table).collect();

    assert_eq!(records.len(), 3);
    assert!(records[0].live_on_website);
    assert!(!records[1].live_on_website);
    // 空上架标记默认上架
    assert!(records[2].live_on_website);
    assert_eq!(records[1].quantity, 60.0);
}

#[test]
fn test_stock_numeric_live_column_without_quantity() {
    logging::init_test();

    let dir = tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "stock.csv",
        "SKU,Warehouse Id,Live on Website\n\
         A,W1,25\n\
         A,W2,0\n",
    );

    let table = UniversalFileParser.parse(&path).unwrap();
    let records: Vec<StockRecord> = RecordNormalizer.stock(table).collect();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].quantity, 25.0);
    assert!(records[0].live_on_website);
    assert_eq!(records[1].quantity, 0.0);
    assert!(!records[1].live_on_website);
}

#[test]
fn test_stock_missing_warehouse_rejects_every_row() {
    logging::init_test();

    let dir = tempdir().unwrap();
    let path = write_file(dir.path(), "stock.csv", "SKU,Quantity\nA,10\nB,20\n");

    let table = UniversalFileParser.parse(&path).unwrap();
    let mut records = RecordNormalizer.stock(table);
    assert_eq!(records.by_ref().count(), 0);
    assert!(records.rejection_report().all_rejected());
}

#[test]
fn test_unsupported_and_missing_files() {
    logging::init_test();

    let dir = tempdir().unwrap();
    let txt = write_file(dir.path(), "sales.txt", "SKU,Quantity,Date\n");

    assert!(matches!(
        UniversalFileParser.parse(&txt),
        Err(ImportError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        UniversalFileParser.parse(dir.path().join("missing.csv")),
        Err(ImportError::FileNotFound(_))
    ));
}

#[test]
fn test_blank_lines_are_skipped() {
    logging::init_test();

    let dir = tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "sales.csv",
        "SKU,Quantity,Date\nA,1,2025-03-01\n,,\nB,2,2025-03-01\n",
    );

    let table = UniversalFileParser.parse(&path).unwrap();
    assert_eq!(table.len(), 2);
}
