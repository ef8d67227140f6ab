// ==========================================
// 库存覆盖分析引擎 - 聚合结果
// ==========================================
// 红线: drr = total_sales / lookback_days（固定窗口,不按观测跨度）
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// SKU × 仓库 联合键
pub type SkuWarehouseKey = (String, String);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuSalesAggregate {
    pub sku: String,
    pub total_sales: f64,
    pub drr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuWarehouseSalesAggregate {
    pub sku: String,
    pub warehouse_id: String,
    pub total_sales: f64,
    pub drr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuStockAggregate {
    pub sku: String,
    pub total_stock: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuWarehouseStockAggregate {
    pub sku: String,
    pub warehouse_id: String,
    pub stock_qty: f64,

    /// 同一 SKU×仓库 任一行上架即视为上架
    pub live_on_website: bool,
}

// ==========================================
// SalesWindow - 回看窗口
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesWindow {
    /// 窗口起始日（含）
    pub start: NaiveDate,

    /// 窗口结束日（含，即 as_of）
    pub end: NaiveDate,

    pub lookback_days: i64,
}

impl SalesWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

// ==========================================
// SalesAggregation - 销售聚合输出
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesAggregation {
    pub by_sku: BTreeMap<String, SkuSalesAggregate>,

    /// 仅当销售源带仓库归属时非空
    pub by_warehouse: BTreeMap<SkuWarehouseKey, SkuWarehouseSalesAggregate>,

    /// 销售源是否带仓库归属（至少一条记录）
    pub has_warehouse_attribution: bool,

    /// 至少有一条带仓库销售记录的 SKU
    pub attributed_skus: BTreeSet<String>,

    /// 实际使用的窗口（无销售记录且未配置 as_of 时为 None）
    pub window: Option<SalesWindow>,

    pub records_seen: usize,

    /// 落在窗口外的记录数（不计入销量,但 SKU 仍登记）
    pub out_of_window_rows: usize,
}

impl SalesAggregation {
    /// 该 SKU 是否使用仓库级 DRR
    pub fn is_attributed(&self, sku: &str) -> bool {
        self.attributed_skus.contains(sku)
    }
}

// ==========================================
// StockAggregation - 库存聚合输出
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockAggregation {
    pub by_sku: BTreeMap<String, SkuStockAggregate>,
    pub by_warehouse: BTreeMap<SkuWarehouseKey, SkuWarehouseStockAggregate>,
    pub records_seen: usize,
}
