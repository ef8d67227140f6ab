// ==========================================
// 库存覆盖分析引擎 - 处理 API
// ==========================================
// 职责: 两份上传文件 → 四张报表（整体成功或整体失败）,按名称下载报表
// 流程: 并发解析 → 流水线（阻塞任务）→ 产物落盘 → 结构化响应
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::engine_config::{ConfigOverrides, EngineConfig};
use crate::config::engine_config_trait::EngineConfigReader;
use crate::domain::metrics::{ExcessEntry, RefillCandidate, SkuMetrics, WarehouseMetrics};
use crate::domain::record::RawTable;
use crate::domain::types::{DataSource, ReportKind};
use crate::engine::error::EngineError;
use crate::engine::orchestrator::{PipelineOutput, RunDiagnostics, StockCoverPipeline};
use crate::engine::report_builder::ReportOverview;
use crate::importer::file_parser::UniversalFileParser;
use crate::repository::report_repo::{ArtifactManifest, ReportArtifact, ReportRepository};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};

/// 处理成功响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    /// 固定为 "success"
    pub status: String,
    pub run_id: String,
    /// 可下载的报表文件名（固定顺序）
    pub files: Vec<String>,
    pub overview: ReportOverview,
    pub diagnostics: RunDiagnostics,
    /// 本次运行实际使用的配置
    pub config: EngineConfig,
    pub summary: Vec<SkuMetrics>,
    pub warehouse: Vec<WarehouseMetrics>,
    pub refill: Vec<RefillCandidate>,
    pub excess: Vec<ExcessEntry>,
    /// 处理耗时（毫秒）
    pub elapsed_ms: i64,
}

/// 报表下载结果
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedReport {
    pub kind: ReportKind,
    pub file_name: String,
    pub content: Vec<u8>,
}

/// 处理 API
pub struct ProcessApi {
    config: Arc<dyn EngineConfigReader>,
    repository: Arc<dyn ReportRepository>,
    overrides: ConfigOverrides,
}

impl ProcessApi {
    /// 创建新的 ProcessApi 实例
    ///
    /// # 参数
    /// - config: 配置读取器（ConfigManager 或静态 EngineConfig）
    /// - repository: 报表产物仓储
    pub fn new(config: Arc<dyn EngineConfigReader>, repository: Arc<dyn ReportRepository>) -> Self {
        Self {
            config,
            repository,
            overrides: ConfigOverrides::default(),
        }
    }

    /// 设置运行时覆写（优先于存储配置）
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// 处理两份文件
    ///
    /// # 参数
    /// - sales_path: 销售流水文件（.csv/.xlsx/.xls）
    /// - stock_path: 仓库库存文件（.csv/.xlsx/.xls）
    ///
    /// # 返回
    /// - Ok(ProcessResponse): 四张报表均已落盘
    /// - Err(ApiError): 文件/数据源/配置/存储失败（不落盘任何部分结果）
    #[instrument(skip(self), fields(
        sales = %sales_path.display(),
        stock = %stock_path.display()
    ))]
    pub async fn process_files(
        &self,
        sales_path: &Path,
        stock_path: &Path,
    ) -> ApiResult<ProcessResponse> {
        let (sales, stock) = futures::try_join!(
            parse_source(DataSource::Sales, sales_path.to_path_buf()),
            parse_source(DataSource::Stock, stock_path.to_path_buf()),
        )?;

        self.process_tables(sales, stock).await
    }

    /// 处理已解析的原始表格
    pub async fn process_tables(&self, sales: RawTable, stock: RawTable) -> ApiResult<ProcessResponse> {
        let start = Instant::now();

        // 配置校验在处理开始前完成
        let pipeline = StockCoverPipeline::from_reader(self.config.as_ref(), &self.overrides).await?;

        let output = tokio::task::spawn_blocking(move || pipeline.run(sales, stock))
            .await
            .map_err(|e| ApiError::InternalError(format!("处理任务异常终止: {}", e)))?
            .map_err(|e| {
                error!(error = %e, "处理失败");
                ApiError::from(e)
            })?;

        let manifest = self.persist(&output).await?;
        let elapsed_ms = start.elapsed().as_millis() as i64;

        info!(
            run_id = %output.run_id,
            elapsed_ms,
            refill = output.overview.refill_count,
            excess = output.overview.excess_count,
            "处理成功"
        );

        let PipelineOutput {
            run_id,
            config,
            snapshot,
            classification,
            overview,
            diagnostics,
            ..
        } = output;

        Ok(ProcessResponse {
            status: "success".to_string(),
            run_id,
            files: manifest.artifacts.into_iter().map(|a| a.file_name).collect(),
            overview,
            diagnostics,
            config,
            summary: snapshot.sku_metrics,
            warehouse: snapshot.warehouse_metrics,
            refill: classification.refill,
            excess: classification.excess,
            elapsed_ms,
        })
    }

    /// 按名称下载报表
    ///
    /// # 参数
    /// - name: 数据集名称,可带 .csv 后缀（如 "refill_recommendations.csv"）
    ///
    /// # 返回
    /// - Err(ApiError::NotFound): 名称未知或尚无产物
    pub async fn download(&self, name: &str) -> ApiResult<DownloadedReport> {
        let kind = ReportKind::from_dataset_name(name)
            .ok_or_else(|| ApiError::NotFound(format!("未知报表: {}", name)))?;

        let content = self.repository.load_artifact(kind).await?;
        Ok(DownloadedReport {
            kind,
            file_name: kind.file_name(),
            content,
        })
    }

    /// 最近一次运行清单
    pub async fn latest_manifest(&self) -> ApiResult<ArtifactManifest> {
        Ok(self.repository.load_manifest().await?)
    }

    async fn persist(&self, output: &PipelineOutput) -> ApiResult<ArtifactManifest> {
        let artifacts = output
            .reports
            .tables()
            .map(|table| {
                Ok(ReportArtifact {
                    kind: table.kind,
                    content: table.to_csv_bytes()?,
                })
            })
            .collect::<Result<Vec<_>, EngineError>>()?;

        Ok(self
            .repository
            .save_artifacts(&output.run_id, artifacts)
            .await?)
    }
}

/// 在阻塞线程池中解析单个文件
async fn parse_source(source: DataSource, path: PathBuf) -> ApiResult<RawTable> {
    let table = tokio::task::spawn_blocking(move || UniversalFileParser.parse(&path))
        .await
        .map_err(|e| ApiError::InternalError(format!("解析任务异常终止: {}", e)))?
        .map_err(|error| EngineError::Import {
            data_source: source,
            error,
        })?;

    info!(source = %source, rows = table.len(), columns = table.headers.len(), "文件解析完成");
    Ok(table)
}
