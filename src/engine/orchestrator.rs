// ==========================================
// 库存覆盖分析引擎 - 流水线编排器
// ==========================================
// 流程: 标准化 → {销售聚合, 库存聚合} → 指标 → 分类 → 报表
// 红线: 每个阶段是输入的纯变换,不回写上游
// 红线: 源级/配置级失败中止整次运行,不返回部分报表
// 红线: 每次运行独立,不共享可变状态
// ==========================================

use crate::config::engine_config::{ConfigOverrides, EngineConfig};
use crate::config::engine_config_trait::EngineConfigReader;
use crate::domain::aggregate::SalesWindow;
use crate::domain::record::RawTable;
use crate::domain::types::DataSource;
use crate::engine::classifier::{Classification, Classifier};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::metrics::{MetricsEngine, MetricsSnapshot};
use crate::engine::report_builder::{ReportBuilder, ReportOverview, ReportSet};
use crate::engine::sales_aggregator::SalesAggregator;
use crate::engine::stock_aggregator::StockAggregator;
use crate::importer::normalizer::{RecordNormalizer, RejectionReport};
use crate::perf::PerfGuard;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// RunDiagnostics - 运行诊断
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    pub sales: RejectionReport,
    pub stock: RejectionReport,

    /// 实际使用的回看窗口
    pub window: Option<SalesWindow>,

    /// 窗口外销售记录数（SKU 已登记,销量未计入）
    pub out_of_window_rows: usize,

    /// 销售源是否带仓库归属
    pub warehouse_attribution: bool,
}

// ==========================================
// PipelineOutput - 单次运行结果
// ==========================================
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub run_id: String,
    pub config: EngineConfig,
    pub snapshot: MetricsSnapshot,
    pub classification: Classification,
    pub reports: ReportSet,
    pub overview: ReportOverview,
    pub diagnostics: RunDiagnostics,
}

// ==========================================
// StockCoverPipeline - 流水线
// ==========================================
pub struct StockCoverPipeline {
    config: EngineConfig,
}

impl StockCoverPipeline {
    /// 创建流水线（处理开始前校验配置）
    ///
    /// # 返回
    /// - Err(EngineError::ConfigInvalid): 回看天数/阈值非正
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 从配置读取器创建（覆写优先）
    pub async fn from_reader<R>(reader: &R, overrides: &ConfigOverrides) -> EngineResult<Self>
    where
        R: EngineConfigReader + ?Sized,
    {
        let config = reader.load_engine_config().await?.with_overrides(overrides);
        debug!(?config, "运行配置已加载");
        Self::new(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 执行完整流水线
    ///
    /// # 参数
    /// - sales: 销售原始表格
    /// - stock: 库存原始表格
    ///
    /// # 返回
    /// - Ok(PipelineOutput): 四张报表 + 概览 + 诊断
    /// - Err(EngineError::SourceEmpty): 数据源有行但全部被拒绝,或两个数据源均无可用记录
    #[instrument(skip_all, fields(
        run_id = tracing::field::Empty,
        sales_rows = sales.len(),
        stock_rows = stock.len()
    ))]
    pub fn run(&self, sales: RawTable, stock: RawTable) -> EngineResult<PipelineOutput> {
        let _perf = PerfGuard::new("stock_cover_pipeline");
        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());

        info!(
            lookback_days = self.config.lookback_days,
            refill_threshold_days = self.config.refill_threshold_days,
            excess_threshold_days = self.config.excess_threshold_days,
            "开始处理"
        );

        // ==========================================
        // 步骤1-2: 标准化 + 聚合（每个序列只被一个聚合器消费）
        // ==========================================
        let normalizer = RecordNormalizer;

        let mut sales_records = normalizer.sales(sales);
        let sales_agg = {
            let _perf = PerfGuard::new("sales_aggregation");
            SalesAggregator::new(self.config.lookback_days, self.config.as_of)
                .aggregate(sales_records.by_ref())
        };
        let sales_report = sales_records.rejection_report();

        let mut stock_records = normalizer.stock(stock);
        let stock_agg = {
            let _perf = PerfGuard::new("stock_aggregation");
            StockAggregator::new().aggregate(stock_records.by_ref())
        };
        let stock_report = stock_records.rejection_report();

        check_sources(&sales_report, &stock_report)?;

        // ==========================================
        // 步骤3: 指标（连接完成后才进入分类）
        // ==========================================
        let snapshot = {
            let _perf = PerfGuard::new("metrics");
            MetricsEngine::new().compute(&sales_agg, &stock_agg)
        };

        // ==========================================
        // 步骤4: 分类
        // ==========================================
        let classification = Classifier::new(
            self.config.refill_threshold_days,
            self.config.excess_threshold_days,
        )
        .classify(&snapshot);

        // ==========================================
        // 步骤5: 报表
        // ==========================================
        let builder = ReportBuilder::new(self.config.decimal_places);
        let reports = builder.build(&snapshot, &classification);
        let overview = builder.overview(&snapshot, &classification, self.config.top_refill_limit);

        let diagnostics = RunDiagnostics {
            sales: sales_report,
            stock: stock_report,
            window: sales_agg.window,
            out_of_window_rows: sales_agg.out_of_window_rows,
            warehouse_attribution: sales_agg.has_warehouse_attribution,
        };

        info!(
            summary = overview.summary_count,
            warehouse = overview.warehouse_count,
            refill = overview.refill_count,
            excess = overview.excess_count,
            sales_rejected = diagnostics.sales.rejected,
            stock_rejected = diagnostics.stock.rejected,
            "处理完成"
        );

        Ok(PipelineOutput {
            run_id,
            config: self.config.clone(),
            snapshot,
            classification,
            reports,
            overview,
            diagnostics,
        })
    }
}

/// 数据源可用性检查
///
/// # 规则
/// - 有数据行但全部被拒绝 → SourceEmpty
/// - 两个数据源均无可用记录 → SourceEmpty
/// - 单个数据源本身为空是合法输入
fn check_sources(sales: &RejectionReport, stock: &RejectionReport) -> EngineResult<()> {
    for report in [sales, stock] {
        if report.all_rejected() {
            warn!(
                source = %report.source,
                total_rows = report.total_rows,
                "数据源全部行被拒绝"
            );
            return Err(EngineError::SourceEmpty {
                data_source: report.source,
                message: format!(
                    "{} 行数据全部被拒绝{}",
                    report.total_rows,
                    report
                        .samples
                        .first()
                        .map(|s| format!("（首条: 第{}行 {}）", s.row_number, s.reason))
                        .unwrap_or_default()
                ),
            });
        }
    }

    if sales.accepted == 0 && stock.accepted == 0 {
        return Err(EngineError::SourceEmpty {
            data_source: DataSource::Sales,
            message: "销售与库存数据源均无可用记录".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::RawRow;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let rows = rows
            .iter()
            .map(|values| {
                headers
                    .iter()
                    .cloned()
                    .zip(values.iter().map(|v| v.to_string()))
                    .collect::<RawRow>()
            })
            .collect();
        RawTable::new(headers, rows)
    }

    #[test]
    fn test_invalid_config_fails_before_processing() {
        let config = EngineConfig {
            lookback_days: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            StockCoverPipeline::new(config),
            Err(EngineError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn test_oversized_lookback_is_config_invalid() {
        let config = EngineConfig {
            lookback_days: 100_000_000,
            ..EngineConfig::default()
        };
        match StockCoverPipeline::new(config) {
            Err(EngineError::ConfigInvalid { key, .. }) => assert_eq!(key, "lookback_days"),
            Err(other) => panic!("expected ConfigInvalid, got {}", other),
            Ok(_) => panic!("expected ConfigInvalid"),
        }
    }

    #[test]
    fn test_all_rows_rejected_is_source_empty() {
        let pipeline = StockCoverPipeline::new(EngineConfig::default()).unwrap();
        let sales = table(&["SKU", "Quantity", "Date"], &[&["A", "-5", "2025-01-01"]]);
        let stock = table(&["SKU", "Warehouse Id", "Quantity"], &[&["A", "W1", "10"]]);

        match pipeline.run(sales, stock) {
            Err(EngineError::SourceEmpty { data_source, .. }) => {
                assert_eq!(data_source, DataSource::Sales)
            }
            other => panic!("expected SourceEmpty, got {:?}", other.map(|o| o.run_id)),
        }
    }

    #[test]
    fn test_both_sources_empty_is_source_empty() {
        let pipeline = StockCoverPipeline::new(EngineConfig::default()).unwrap();
        let result = pipeline.run(RawTable::default(), RawTable::default());
        assert!(matches!(result, Err(EngineError::SourceEmpty { .. })));
    }

    #[test]
    fn test_partial_rejection_continues() {
        let pipeline = StockCoverPipeline::new(EngineConfig::default()).unwrap();
        let sales = table(
            &["sku", "qty", "order date"],
            &[&["A", "300", "2025-01-15"], &["A", "abc", "2025-01-15"]],
        );
        let stock = table(&["SKU", "Warehouse", "Stock"], &[&["A", "W1", "100"]]);

        let output = pipeline.run(sales, stock).unwrap();
        assert_eq!(output.diagnostics.sales.rejected, 1);
        assert_eq!(output.overview.refill_count, 1);
        assert_eq!(output.reports.refill.rows[0][5], "200");
        assert!(!output.run_id.is_empty());
    }

    #[tokio::test]
    async fn test_from_reader_applies_overrides() {
        let overrides = ConfigOverrides {
            lookback_days: Some(7),
            ..ConfigOverrides::default()
        };
        let pipeline = StockCoverPipeline::from_reader(&EngineConfig::default(), &overrides)
            .await
            .unwrap();
        assert_eq!(pipeline.config().lookback_days, 7);
    }
}
