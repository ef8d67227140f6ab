// ==========================================
// 库存覆盖分析引擎 - 指标与分类结果
// ==========================================
// 红线: requirement_30d = drr * 30
// 红线: required_qty = max(0, requirement_30d - total_stock)
// 红线: excess_qty = stock_qty - drr * 60,且 > 0
// ==========================================

use crate::domain::types::{CoverDays, DrrSource, RecommendedWarehouse};
use serde::{Deserialize, Serialize};

/// 需求测算周期（天）
pub const REQUIREMENT_HORIZON_DAYS: f64 = 30.0;

// ==========================================
// SkuMetrics - SKU 级指标
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuMetrics {
    pub sku: String,
    pub total_sales: f64,
    pub drr: f64,
    pub requirement_30d: f64,
    pub total_stock: f64,
    pub cover_days: CoverDays,
}

// ==========================================
// WarehouseMetrics - SKU×仓库 级指标
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseMetrics {
    pub sku: String,
    pub warehouse_id: String,
    pub stock_qty: f64,
    pub live_on_website: bool,
    pub drr: f64,
    pub drr_source: DrrSource,
    pub cover_days: CoverDays,
}

// ==========================================
// RefillCandidate - 补货候选
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefillCandidate {
    pub sku: String,
    pub total_sales: f64,
    pub drr: f64,
    pub requirement_30d: f64,
    pub total_stock: f64,

    /// 判定时的 SKU 级覆盖天数
    pub cover_days: CoverDays,

    pub required_qty: f64,
    pub recommended_warehouse: RecommendedWarehouse,
}

// ==========================================
// ExcessEntry - 积压条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcessEntry {
    pub sku: String,
    pub warehouse_id: String,
    pub stock_qty: f64,
    pub live_on_website: bool,
    pub drr: f64,
    pub cover_days: CoverDays,
    pub excess_qty: f64,
}
