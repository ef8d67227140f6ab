// ==========================================
// 库存覆盖分析引擎 - 分类器
// ==========================================
// 职责: 阈值规则 → 补货候选 / 积压条目,补货仓库选择
// 红线: 两条规则相互独立,均为指标的纯函数,不修改上游输出
// 红线: 无仓库持有库存时不猜测推荐仓库（Unresolved）
// ==========================================

use crate::domain::metrics::{
    ExcessEntry, RefillCandidate, SkuMetrics, WarehouseMetrics,
};
use crate::domain::types::RecommendedWarehouse;
use crate::engine::metrics::MetricsSnapshot;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

// ==========================================
// Classification - 分类结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// 按 SKU 升序
    pub refill: Vec<RefillCandidate>,

    /// 按 (SKU, 仓库) 升序
    pub excess: Vec<ExcessEntry>,
}

// ==========================================
// Classifier - 分类器
// ==========================================
pub struct Classifier {
    refill_threshold_days: f64,
    excess_threshold_days: f64,
}

impl Classifier {
    /// 创建分类器
    ///
    /// # 参数
    /// - refill_threshold_days: SKU 覆盖天数 < 该值 → 补货
    /// - excess_threshold_days: 仓库覆盖天数 > 该值 → 积压
    pub fn new(refill_threshold_days: f64, excess_threshold_days: f64) -> Self {
        Self {
            refill_threshold_days,
            excess_threshold_days,
        }
    }

    #[instrument(skip_all, fields(
        refill_threshold_days = self.refill_threshold_days,
        excess_threshold_days = self.excess_threshold_days
    ))]
    pub fn classify(&self, snapshot: &MetricsSnapshot) -> Classification {
        let refill: Vec<RefillCandidate> = snapshot
            .sku_metrics
            .iter()
            .filter_map(|m| self.evaluate_refill(m, snapshot.warehouses_of(&m.sku)))
            .collect();

        let excess: Vec<ExcessEntry> = snapshot
            .warehouse_metrics
            .iter()
            .filter_map(|m| self.evaluate_excess(m))
            .collect();

        info!(
            refill_count = refill.len(),
            unresolved_count = refill
                .iter()
                .filter(|c| c.recommended_warehouse == RecommendedWarehouse::Unresolved)
                .count(),
            excess_count = excess.len(),
            "分类完成"
        );

        Classification { refill, excess }
    }

    /// 补货规则（SKU 级）
    ///
    /// # 返回
    /// - Some: cover_days < 补货阈值
    /// - None: 不需要补货（含 Infinite）
    pub fn evaluate_refill<'a, W>(&self, metrics: &SkuMetrics, warehouses: W) -> Option<RefillCandidate>
    where
        W: IntoIterator<Item = &'a WarehouseMetrics>,
    {
        if !metrics.cover_days.is_below(self.refill_threshold_days) {
            return None;
        }

        let required_qty = (metrics.requirement_30d - metrics.total_stock).max(0.0);
        let recommended_warehouse = select_refill_warehouse(warehouses);

        debug!(
            sku = %metrics.sku,
            required_qty,
            recommended_warehouse = %recommended_warehouse,
            "补货候选"
        );

        Some(RefillCandidate {
            sku: metrics.sku.clone(),
            total_sales: metrics.total_sales,
            drr: metrics.drr,
            requirement_30d: metrics.requirement_30d,
            total_stock: metrics.total_stock,
            cover_days: metrics.cover_days,
            required_qty,
            recommended_warehouse,
        })
    }

    /// 积压规则（SKU×仓库 级）
    ///
    /// # 规则
    /// - cover_days > 积压阈值 且 stock_qty > 0
    /// - excess_qty = stock_qty - drr * 积压阈值,仅保留 > 0
    pub fn evaluate_excess(&self, metrics: &WarehouseMetrics) -> Option<ExcessEntry> {
        if metrics.stock_qty <= 0.0 || !metrics.cover_days.exceeds(self.excess_threshold_days) {
            return None;
        }

        let excess_qty = metrics.stock_qty - metrics.drr * self.excess_threshold_days;
        if excess_qty <= 0.0 {
            return None;
        }

        Some(ExcessEntry {
            sku: metrics.sku.clone(),
            warehouse_id: metrics.warehouse_id.clone(),
            stock_qty: metrics.stock_qty,
            live_on_website: metrics.live_on_website,
            drr: metrics.drr,
            cover_days: metrics.cover_days,
            excess_qty,
        })
    }
}

/// 补货仓库选择
///
/// # 规则
/// - 候选: stock_qty > 0 的仓库
/// - 取 stock_qty 最小者（最缺货的仓库优先补）,并列时取仓库ID字典序最小
/// - 无候选: Unresolved
pub fn select_refill_warehouse<'a, W>(warehouses: W) -> RecommendedWarehouse
where
    W: IntoIterator<Item = &'a WarehouseMetrics>,
{
    warehouses
        .into_iter()
        .filter(|w| w.stock_qty > 0.0)
        .min_by(|a, b| {
            a.stock_qty
                .total_cmp(&b.stock_qty)
                .then_with(|| a.warehouse_id.cmp(&b.warehouse_id))
        })
        .map_or(RecommendedWarehouse::Unresolved, |w| {
            RecommendedWarehouse::Warehouse(w.warehouse_id.clone())
        })
}
