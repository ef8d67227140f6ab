// ==========================================
// 库存覆盖分析引擎 - 报表构建器
// ==========================================
// 职责: 指标/分类结果 → 四张固定表头的报表 + 概览
// 红线: 列顺序与表头为外部契约,不可调整
// 红线: 行顺序稳定（SKU 升序,再按仓库升序）,相同输入字节级可复现
// 红线: 无穷覆盖天数渲染为 "∞",不输出数值字面量
// ==========================================

use crate::domain::metrics::{ExcessEntry, RefillCandidate, SkuMetrics, WarehouseMetrics};
use crate::domain::types::{CoverDays, RecommendedWarehouse, ReportKind};
use crate::engine::classifier::Classification;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::metrics::MetricsSnapshot;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// 无穷覆盖天数哨兵
pub const INFINITE_COVER_SENTINEL: &str = "∞";

// ==========================================
// 数值格式化
// ==========================================

/// 定点小数
pub fn format_decimal(value: f64, decimal_places: usize) -> String {
    // -0.0 统一为 0
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{:.*}", decimal_places, value)
}

/// 数量: 整数值不带小数部分
pub fn format_quantity(value: f64, decimal_places: usize) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format_decimal(value, decimal_places)
    }
}

/// 覆盖天数
pub fn format_cover_days(cover: &CoverDays, decimal_places: usize) -> String {
    match cover {
        CoverDays::Finite(days) => format_decimal(*days, decimal_places),
        CoverDays::Infinite => INFINITE_COVER_SENTINEL.to_string(),
    }
}

// ==========================================
// ReportTable - 单张报表
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTable {
    pub kind: ReportKind,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    pub fn new(kind: ReportKind) -> Self {
        Self {
            kind,
            headers: kind.headers().iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 序列化为 CSV 字节（表头 + 数据行）
    pub fn to_csv_bytes(&self) -> EngineResult<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.headers)
            .map_err(|e| EngineError::Internal(format!("CSV写入失败: {}", e)))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| EngineError::Internal(format!("CSV写入失败: {}", e)))?;
        }
        writer
            .into_inner()
            .map_err(|e| EngineError::Internal(format!("CSV刷新失败: {}", e)))
    }
}

// ==========================================
// ReportSet - 四张报表（整体交付）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSet {
    pub summary: ReportTable,
    pub warehouse: ReportTable,
    pub refill: ReportTable,
    pub excess: ReportTable,
}

impl ReportSet {
    pub fn get(&self, kind: ReportKind) -> &ReportTable {
        match kind {
            ReportKind::StockCoverSummary => &self.summary,
            ReportKind::WarehouseLevelStock => &self.warehouse,
            ReportKind::RefillRecommendations => &self.refill,
            ReportKind::ExcessStock => &self.excess,
        }
    }

    /// 固定顺序遍历
    pub fn tables(&self) -> impl Iterator<Item = &ReportTable> {
        ReportKind::ALL.into_iter().map(move |kind| self.get(kind))
    }
}

// ==========================================
// ReportOverview - 概览（卡片 + 补货 Top N）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopRefillItem {
    pub sku: String,
    pub required_qty: f64,
    pub recommended_warehouse: RecommendedWarehouse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOverview {
    pub summary_count: usize,
    pub warehouse_count: usize,
    pub refill_count: usize,
    pub excess_count: usize,

    /// 覆盖天数为无穷的 SKU 数
    pub infinite_cover_count: usize,

    /// 无仓库可推荐的补货 SKU 数
    pub unresolved_refill_count: usize,

    /// 按补货量降序,并列按 SKU 升序
    pub top_refill: Vec<TopRefillItem>,
}

// ==========================================
// ReportBuilder - 报表构建器
// ==========================================
pub struct ReportBuilder {
    decimal_places: usize,
}

impl ReportBuilder {
    /// # 参数
    /// - decimal_places: DRR / 覆盖天数 小数位
    pub fn new(decimal_places: usize) -> Self {
        Self { decimal_places }
    }

    /// 构建四张报表
    #[instrument(skip_all, fields(decimal_places = self.decimal_places))]
    pub fn build(&self, snapshot: &MetricsSnapshot, classification: &Classification) -> ReportSet {
        let set = ReportSet {
            summary: self.table(
                ReportKind::StockCoverSummary,
                snapshot.sku_metrics.iter().map(|m| self.summary_row(m)),
            ),
            warehouse: self.table(
                ReportKind::WarehouseLevelStock,
                snapshot.warehouse_metrics.iter().map(|m| self.warehouse_row(m)),
            ),
            refill: self.table(
                ReportKind::RefillRecommendations,
                classification.refill.iter().map(|c| self.refill_row(c)),
            ),
            excess: self.table(
                ReportKind::ExcessStock,
                classification.excess.iter().map(|e| self.excess_row(e)),
            ),
        };

        debug!(
            summary_rows = set.summary.len(),
            warehouse_rows = set.warehouse.len(),
            refill_rows = set.refill.len(),
            excess_rows = set.excess.len(),
            "报表构建完成"
        );

        set
    }

    /// 构建概览
    pub fn overview(
        &self,
        snapshot: &MetricsSnapshot,
        classification: &Classification,
        top_refill_limit: usize,
    ) -> ReportOverview {
        let mut ranked: Vec<&RefillCandidate> = classification.refill.iter().collect();
        ranked.sort_by(|a, b| {
            b.required_qty
                .total_cmp(&a.required_qty)
                .then_with(|| a.sku.cmp(&b.sku))
        });

        ReportOverview {
            summary_count: snapshot.sku_metrics.len(),
            warehouse_count: snapshot.warehouse_metrics.len(),
            refill_count: classification.refill.len(),
            excess_count: classification.excess.len(),
            infinite_cover_count: snapshot
                .sku_metrics
                .iter()
                .filter(|m| m.cover_days.is_infinite())
                .count(),
            unresolved_refill_count: classification
                .refill
                .iter()
                .filter(|c| c.recommended_warehouse == RecommendedWarehouse::Unresolved)
                .count(),
            top_refill: ranked
                .into_iter()
                .take(top_refill_limit)
                .map(|c| TopRefillItem {
                    sku: c.sku.clone(),
                    required_qty: c.required_qty,
                    recommended_warehouse: c.recommended_warehouse.clone(),
                })
                .collect(),
        }
    }

    fn table<I>(&self, kind: ReportKind, rows: I) -> ReportTable
    where
        I: Iterator<Item = Vec<String>>,
    {
        let mut table = ReportTable::new(kind);
        table.rows = rows.collect();
        table
    }

    fn summary_row(&self, m: &SkuMetrics) -> Vec<String> {
        vec![
            m.sku.clone(),
            self.qty(m.total_sales),
            self.dec(m.drr),
            self.qty(m.requirement_30d),
            self.qty(m.total_stock),
            format_cover_days(&m.cover_days, self.decimal_places),
        ]
    }

    // "Live on Website" 列输出该仓库在库数量
    fn warehouse_row(&self, m: &WarehouseMetrics) -> Vec<String> {
        vec![
            m.sku.clone(),
            m.warehouse_id.clone(),
            self.qty(m.stock_qty),
            self.dec(m.drr),
            format_cover_days(&m.cover_days, self.decimal_places),
        ]
    }

    fn refill_row(&self, c: &RefillCandidate) -> Vec<String> {
        vec![
            c.sku.clone(),
            self.qty(c.total_sales),
            self.dec(c.drr),
            self.qty(c.requirement_30d),
            self.qty(c.total_stock),
            self.qty(c.required_qty),
            c.recommended_warehouse.to_string(),
        ]
    }

    fn excess_row(&self, e: &ExcessEntry) -> Vec<String> {
        vec![
            e.sku.clone(),
            e.warehouse_id.clone(),
            self.qty(e.stock_qty),
            self.dec(e.drr),
            format_cover_days(&e.cover_days, self.decimal_places),
            self.qty(e.excess_qty),
        ]
    }

    fn dec(&self, value: f64) -> String {
        format_decimal(value, self.decimal_places)
    }

    fn qty(&self, value: f64) -> String {
        format_quantity(value, self.decimal_places)
    }
}
