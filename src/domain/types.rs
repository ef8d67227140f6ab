// ==========================================
// 库存覆盖分析引擎 - 领域类型定义
// ==========================================
// 红线: 零需求的覆盖天数是"无穷",不是浮点 inf
// 红线: 无仓库持有库存时不猜测推荐仓库
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 覆盖天数 (Stock Cover Days)
// ==========================================
// DRR = 0 时库存按本模型永不耗尽 → Infinite
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "days", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoverDays {
    Finite(f64),
    Infinite,
}

impl CoverDays {
    /// 由库存与日均销量计算覆盖天数
    ///
    /// # 规则
    /// - drr > 0: stock / drr
    /// - drr <= 0: Infinite（不抛异常、不产生 NaN）
    pub fn from_stock_and_drr(stock: f64, drr: f64) -> Self {
        if drr > 0.0 {
            CoverDays::Finite(stock / drr)
        } else {
            CoverDays::Infinite
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, CoverDays::Infinite)
    }

    /// 覆盖天数是否严格低于阈值（Infinite 永远不低于）
    pub fn is_below(&self, threshold_days: f64) -> bool {
        match self {
            CoverDays::Finite(days) => *days < threshold_days,
            CoverDays::Infinite => false,
        }
    }

    /// 覆盖天数是否严格高于阈值（Infinite 永远高于）
    pub fn exceeds(&self, threshold_days: f64) -> bool {
        match self {
            CoverDays::Finite(days) => *days > threshold_days,
            CoverDays::Infinite => true,
        }
    }

    pub fn finite_value(&self) -> Option<f64> {
        match self {
            CoverDays::Finite(days) => Some(*days),
            CoverDays::Infinite => None,
        }
    }
}

// ==========================================
// 推荐补货仓库 (Recommended Warehouse)
// ==========================================
// 无任何仓库持有该 SKU 库存时为 Unresolved，由调用方决定策略
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "warehouse_id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendedWarehouse {
    Warehouse(String),
    Unresolved,
}

impl RecommendedWarehouse {
    pub fn warehouse_id(&self) -> Option<&str> {
        match self {
            RecommendedWarehouse::Warehouse(id) => Some(id.as_str()),
            RecommendedWarehouse::Unresolved => None,
        }
    }
}

impl fmt::Display for RecommendedWarehouse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendedWarehouse::Warehouse(id) => write!(f, "{}", id),
            RecommendedWarehouse::Unresolved => write!(f, "UNRESOLVED"),
        }
    }
}

// ==========================================
// 仓库级 DRR 来源
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrrSource {
    Warehouse, // 销售数据带仓库归属
    Sku,       // 回退到 SKU 级 DRR
}

// ==========================================
// 数据源 (Data Source)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSource {
    Sales,
    Stock,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Sales => write!(f, "sales"),
            DataSource::Stock => write!(f, "stock"),
        }
    }
}

// ==========================================
// 报表类型 (Report Kind)
// ==========================================
// 名称与表头为外部报表契约，顺序固定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    StockCoverSummary,
    WarehouseLevelStock,
    RefillRecommendations,
    ExcessStock,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::StockCoverSummary,
        ReportKind::WarehouseLevelStock,
        ReportKind::RefillRecommendations,
        ReportKind::ExcessStock,
    ];

    /// 数据集名称
    pub fn dataset_name(&self) -> &'static str {
        match self {
            ReportKind::StockCoverSummary => "stock_cover_summary",
            ReportKind::WarehouseLevelStock => "warehouse_level_stock",
            ReportKind::RefillRecommendations => "refill_recommendations",
            ReportKind::ExcessStock => "excess_stock",
        }
    }

    /// 落盘文件名
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.dataset_name())
    }

    /// 固定表头
    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            ReportKind::StockCoverSummary => &[
                "SKU",
                "Total Sales",
                "DRR",
                "30day_requirement",
                "Total FBF Stock",
                "Stock Cover Days (SKU level)",
            ],
            ReportKind::WarehouseLevelStock => &[
                "SKU",
                "Warehouse Id",
                "Live on Website",
                "DRR",
                "Stock Cover Days (Warehouse)",
            ],
            ReportKind::RefillRecommendations => &[
                "SKU",
                "Total Sales",
                "DRR",
                "30day_requirement",
                "Total FBF Stock",
                "Required Qty to reach 30d",
                "Recommended Warehouse",
            ],
            ReportKind::ExcessStock => &[
                "SKU",
                "Warehouse Id",
                "Live on Website",
                "DRR",
                "Stock Cover Days (Warehouse)",
                "Excess Qty (if >60 days)",
            ],
        }
    }

    /// 按数据集名称解析（允许带 .csv 后缀，大小写不敏感）
    pub fn from_dataset_name(name: &str) -> Option<Self> {
        let trimmed = name.trim().to_lowercase();
        let stem = trimmed.strip_suffix(".csv").unwrap_or(&trimmed);
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.dataset_name() == stem)
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dataset_name())
    }
}
