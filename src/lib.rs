// ==========================================
// 库存覆盖分析引擎 - 核心库
// ==========================================
// 输入: 销售流水 + 仓库库存快照
// 输出: SKU 汇总 / 仓库级库存 / 补货建议 / 积压库存 四张报表
// 系统定位: 决策支持（补货与积压判断由人工最终确认）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 记录、聚合、指标
pub mod domain;

// 导入层 - 外部数据
pub mod importer;

// 引擎层 - 聚合与分类规则
pub mod engine;

// 配置层 - 运行配置
pub mod config;

// 数据仓储层 - 报表产物
pub mod repository;

// API 层 - 处理与下载
pub mod api;

// 应用层 - 状态组装与默认路径
pub mod app;

// 数据库基础设施（连接初始化/配置表）
pub mod db;

// 日志系统
pub mod logging;

// 阶段耗时统计
pub mod perf;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CoverDays, DataSource, DrrSource, RecommendedWarehouse, ReportKind};

// 领域实体
pub use domain::{
    ExcessEntry, RawTable, RefillCandidate, SalesRecord, SkuMetrics, StockRecord,
    WarehouseMetrics,
};

// 引擎
pub use engine::{
    Classifier, EngineError, MetricsEngine, PipelineOutput, ReportBuilder, ReportSet,
    SalesAggregator, StockAggregator, StockCoverPipeline,
};

// 配置
pub use config::{ConfigManager, EngineConfig, EngineConfigReader};

// API
pub use api::{ApiError, ProcessApi, ProcessResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "库存覆盖分析引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
