// ==========================================
// 库存覆盖分析引擎 - 领域层
// ==========================================
// 职责: 记录、聚合、指标的数据结构
// 红线: 每次运行新建,运行结束即丢弃,不跨运行共享
// ==========================================

pub mod aggregate;
pub mod metrics;
pub mod record;
pub mod types;

pub use aggregate::{
    SalesAggregation, SalesWindow, SkuSalesAggregate, SkuStockAggregate, SkuWarehouseKey,
    SkuWarehouseSalesAggregate, SkuWarehouseStockAggregate, StockAggregation,
};
pub use metrics::{
    ExcessEntry, RefillCandidate, SkuMetrics, WarehouseMetrics, REQUIREMENT_HORIZON_DAYS,
};
pub use record::{RawRow, RawTable, SalesRecord, StockRecord};
pub use types::{CoverDays, DataSource, DrrSource, RecommendedWarehouse, ReportKind};
