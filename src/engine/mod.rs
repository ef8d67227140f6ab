// ==========================================
// 库存覆盖分析引擎 - 引擎层
// ==========================================
// 流程: 销售聚合 / 库存聚合 → 指标 → 分类 → 报表
// 红线: 引擎不做 I/O,每个阶段是输入的纯变换
// ==========================================

pub mod classifier;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod report_builder;
pub mod sales_aggregator;
pub mod stock_aggregator;

// 重导出核心引擎
pub use classifier::{select_refill_warehouse, Classification, Classifier};
pub use error::{EngineError, EngineResult};
pub use metrics::{MetricsEngine, MetricsSnapshot};
pub use orchestrator::{PipelineOutput, RunDiagnostics, StockCoverPipeline};
pub use report_builder::{
    format_cover_days, format_decimal, format_quantity, ReportBuilder, ReportOverview,
    ReportSet, ReportTable, TopRefillItem, INFINITE_COVER_SENTINEL,
};
pub use sales_aggregator::SalesAggregator;
pub use stock_aggregator::StockAggregator;
