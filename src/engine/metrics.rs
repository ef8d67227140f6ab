// ==========================================
// 库存覆盖分析引擎 - 指标引擎
// ==========================================
// 职责: 销售聚合 ⋈ 库存聚合（全外连接）→ SKU / SKU×仓库 指标
// 红线: 只出现在一侧的 SKU 不是错误,缺失侧按 0 处理
// 红线: DRR = 0 的覆盖天数为 Infinite,不抛异常、不产生 NaN
// ==========================================

use crate::domain::aggregate::{SalesAggregation, SkuWarehouseKey, StockAggregation};
use crate::domain::metrics::{SkuMetrics, WarehouseMetrics, REQUIREMENT_HORIZON_DAYS};
use crate::domain::types::{CoverDays, DrrSource};
use std::collections::BTreeSet;
use tracing::{info, instrument};

// ==========================================
// MetricsSnapshot - 指标快照
// ==========================================
// 两个列表均按 (SKU, 仓库) 升序,写入后只读
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub sku_metrics: Vec<SkuMetrics>,
    pub warehouse_metrics: Vec<WarehouseMetrics>,
}

impl MetricsSnapshot {
    /// 指定 SKU 的仓库级指标（依赖排序,连续区间）
    pub fn warehouses_of<'a>(&'a self, sku: &'a str) -> impl Iterator<Item = &'a WarehouseMetrics> {
        self.warehouse_metrics
            .iter()
            .skip_while(move |m| m.sku.as_str() < sku)
            .take_while(move |m| m.sku == sku)
    }
}

// ==========================================
// MetricsEngine - 指标引擎（无状态）
// ==========================================
pub struct MetricsEngine;

impl MetricsEngine {
    pub fn new() -> Self {
        Self
    }

    /// 计算 SKU 级与仓库级指标
    #[instrument(skip_all)]
    pub fn compute(&self, sales: &SalesAggregation, stock: &StockAggregation) -> MetricsSnapshot {
        let sku_metrics = self.compute_sku_metrics(sales, stock);
        let warehouse_metrics = self.compute_warehouse_metrics(sales, stock);

        info!(
            sku_count = sku_metrics.len(),
            warehouse_row_count = warehouse_metrics.len(),
            infinite_cover_skus = sku_metrics.iter().filter(|m| m.cover_days.is_infinite()).count(),
            "指标计算完成"
        );

        MetricsSnapshot {
            sku_metrics,
            warehouse_metrics,
        }
    }

    /// SKU 级全外连接
    pub fn compute_sku_metrics(
        &self,
        sales: &SalesAggregation,
        stock: &StockAggregation,
    ) -> Vec<SkuMetrics> {
        let skus: BTreeSet<&String> = sales.by_sku.keys().chain(stock.by_sku.keys()).collect();

        skus.into_iter()
            .map(|sku| {
                let (total_sales, drr) = sales
                    .by_sku
                    .get(sku)
                    .map_or((0.0, 0.0), |s| (s.total_sales, s.drr));
                let total_stock = stock.by_sku.get(sku).map_or(0.0, |s| s.total_stock);

                SkuMetrics {
                    sku: sku.clone(),
                    total_sales,
                    drr,
                    requirement_30d: drr * REQUIREMENT_HORIZON_DAYS,
                    total_stock,
                    cover_days: CoverDays::from_stock_and_drr(total_stock, drr),
                }
            })
            .collect()
    }

    /// SKU×仓库 级全外连接
    ///
    /// # 规则
    /// - 按 SKU 判定: 该 SKU 至少一条销售带仓库时,每个组合使用自身 DRR（无销售则 0）
    /// - 该 SKU 的销售均不带仓库: 回退到 SKU 级 DRR
    /// - 销售侧独有组合以库存 0 出现
    pub fn compute_warehouse_metrics(
        &self,
        sales: &SalesAggregation,
        stock: &StockAggregation,
    ) -> Vec<WarehouseMetrics> {
        // by_warehouse 只含带仓库的销售组合
        let keys: BTreeSet<&SkuWarehouseKey> = stock
            .by_warehouse
            .keys()
            .chain(sales.by_warehouse.keys())
            .collect();

        keys.into_iter()
            .map(|key| {
                let (stock_qty, live_on_website) = stock
                    .by_warehouse
                    .get(key)
                    .map_or((0.0, false), |s| (s.stock_qty, s.live_on_website));

                let (drr, drr_source) = if sales.is_attributed(&key.0) {
                    let drr = sales.by_warehouse.get(key).map_or(0.0, |s| s.drr);
                    (drr, DrrSource::Warehouse)
                } else {
                    let drr = sales.by_sku.get(&key.0).map_or(0.0, |s| s.drr);
                    (drr, DrrSource::Sku)
                };

                WarehouseMetrics {
                    sku: key.0.clone(),
                    warehouse_id: key.1.clone(),
                    stock_qty,
                    live_on_website,
                    drr,
                    drr_source,
                    cover_days: CoverDays::from_stock_and_drr(stock_qty, drr),
                }
            })
            .collect()
    }
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new()
    }
}
