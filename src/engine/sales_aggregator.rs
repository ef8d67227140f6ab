// ==========================================
// 库存覆盖分析引擎 - 销售聚合器
// ==========================================
// 职责: 按 SKU（及 SKU×仓库）汇总回看窗口内销量,计算 DRR
// 红线: drr = total_sales / lookback_days（固定窗口,稀疏数据不抬高 DRR）
// 红线: 窗口外记录不计销量,但 SKU 仍登记
// ==========================================
// 输入: SalesRecord 序列（只消费一次）
// 输出: SalesAggregation
// ==========================================

use crate::domain::aggregate::{
    SalesAggregation, SalesWindow, SkuSalesAggregate, SkuWarehouseKey,
    SkuWarehouseSalesAggregate,
};
use crate::domain::record::SalesRecord;
use chrono::{Days, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument};

/// 单日缓冲
#[derive(Debug, Clone, Copy, Default)]
struct DailyBucket {
    quantity: f64,
    rows: usize,
}

/// 日销量缓冲（日期 → 当日合计）
type DailyQuantities = BTreeMap<NaiveDate, DailyBucket>;

// ==========================================
// SalesAggregator - 销售聚合器
// ==========================================
pub struct SalesAggregator {
    lookback_days: i64,
    as_of: Option<NaiveDate>,
}

impl SalesAggregator {
    /// 创建销售聚合器
    ///
    /// # 参数
    /// - lookback_days: 回看天数（调用方已校验为正）
    /// - as_of: 窗口结束日（None 时取数据中最新日期）
    pub fn new(lookback_days: i64, as_of: Option<NaiveDate>) -> Self {
        Self {
            lookback_days,
            as_of,
        }
    }

    /// 计算回看窗口
    ///
    /// # 返回
    /// - None: 未配置 as_of 且无任何销售记录
    pub fn resolve_window(&self, latest_sale: Option<NaiveDate>) -> Option<SalesWindow> {
        let end = self.as_of.or(latest_sale)?;
        let span = u64::try_from(self.lookback_days.saturating_sub(1)).unwrap_or(0);
        // 超出日期范围时窗口从最早可表示日期开始
        let start = end.checked_sub_days(Days::new(span)).unwrap_or(NaiveDate::MIN);
        Some(SalesWindow {
            start,
            end,
            lookback_days: self.lookback_days,
        })
    }

    /// 聚合销售记录（单遍消费）
    ///
    /// 窗口结束日可能依赖最新日期,因此先按日缓冲,消费完毕后再按窗口求和
    #[instrument(skip(self, records), fields(lookback_days = self.lookback_days))]
    pub fn aggregate<I>(&self, records: I) -> SalesAggregation
    where
        I: IntoIterator<Item = SalesRecord>,
    {
        let mut by_sku_daily: BTreeMap<String, DailyQuantities> = BTreeMap::new();
        let mut by_warehouse_daily: BTreeMap<SkuWarehouseKey, DailyQuantities> = BTreeMap::new();
        let mut latest_sale: Option<NaiveDate> = None;
        let mut records_seen = 0usize;

        for record in records {
            records_seen += 1;
            latest_sale = Some(latest_sale.map_or(record.date, |d| d.max(record.date)));

            let bucket = by_sku_daily
                .entry(record.sku.clone())
                .or_default()
                .entry(record.date)
                .or_default();
            bucket.quantity += record.quantity;
            bucket.rows += 1;

            if let Some(warehouse_id) = record.warehouse_id {
                let bucket = by_warehouse_daily
                    .entry((record.sku, warehouse_id))
                    .or_default()
                    .entry(record.date)
                    .or_default();
                bucket.quantity += record.quantity;
                bucket.rows += 1;
            }
        }

        let window = self.resolve_window(latest_sale);
        let attributed_skus: BTreeSet<String> = by_warehouse_daily
            .keys()
            .map(|(sku, _)| sku.clone())
            .collect();
        let has_warehouse_attribution = !attributed_skus.is_empty();

        let mut out_of_window_rows = 0usize;
        let by_sku: BTreeMap<String, SkuSalesAggregate> = by_sku_daily
            .into_iter()
            .map(|(sku, daily)| {
                let (total_sales, skipped_rows) = sum_in_window(&daily, window.as_ref());
                out_of_window_rows += skipped_rows;
                let aggregate = SkuSalesAggregate {
                    drr: self.daily_run_rate(total_sales),
                    sku: sku.clone(),
                    total_sales,
                };
                (sku, aggregate)
            })
            .collect();

        let by_warehouse: BTreeMap<SkuWarehouseKey, SkuWarehouseSalesAggregate> =
            by_warehouse_daily
                .into_iter()
                .map(|((sku, warehouse_id), daily)| {
                    let (total_sales, _) = sum_in_window(&daily, window.as_ref());
                    let aggregate = SkuWarehouseSalesAggregate {
                        sku: sku.clone(),
                        warehouse_id: warehouse_id.clone(),
                        total_sales,
                        drr: self.daily_run_rate(total_sales),
                    };
                    ((sku, warehouse_id), aggregate)
                })
                .collect();

        if let Some(w) = window.as_ref() {
            debug!(start = %w.start, end = %w.end, "回看窗口已确定");
        }

        info!(
            records_seen,
            sku_count = by_sku.len(),
            sku_warehouse_count = by_warehouse.len(),
            has_warehouse_attribution,
            attributed_sku_count = attributed_skus.len(),
            out_of_window_rows,
            "销售聚合完成"
        );

        SalesAggregation {
            by_sku,
            by_warehouse,
            has_warehouse_attribution,
            attributed_skus,
            window,
            records_seen,
            out_of_window_rows,
        }
    }

    fn daily_run_rate(&self, total_sales: f64) -> f64 {
        total_sales / self.lookback_days as f64
    }
}

/// 窗口内求和
///
/// # 返回
/// (窗口内销量合计, 窗口外的记录数)
fn sum_in_window(daily: &DailyQuantities, window: Option<&SalesWindow>) -> (f64, usize) {
    let Some(window) = window else {
        return (daily.values().map(|b| b.quantity).sum(), 0);
    };

    daily
        .iter()
        .fold((0.0, 0usize), |(total, skipped), (date, bucket)| {
            if window.contains(*date) {
                (total + bucket.quantity, skipped)
            } else {
                (total, skipped + bucket.rows)
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(sku: &str, warehouse: Option<&str>, qty: f64, on: NaiveDate) -> SalesRecord {
        SalesRecord {
            sku: sku.to_string(),
            warehouse_id: warehouse.map(|w| w.to_string()),
            quantity: qty,
            date: on,
            row_number: 0,
        }
    }

    #[test]
    fn test_drr_uses_fixed_window() {
        let aggregator = SalesAggregator::new(30, None);
        let result = aggregator.aggregate(vec![sale("A", None, 300.0, date(2025, 1, 15))]);

        let a = &result.by_sku["A"];
        assert_eq!(a.total_sales, 300.0);
        assert!((a.drr - 10.0).abs() < 1e-9);
        assert!(!result.has_warehouse_attribution);
        assert!(result.by_warehouse.is_empty());
    }

    #[test]
    fn test_window_anchored_on_latest_sale() {
        let aggregator = SalesAggregator::new(7, None);
        let result = aggregator.aggregate(vec![
            sale("A", None, 10.0, date(2025, 1, 10)),
            sale("A", None, 20.0, date(2025, 1, 4)),
            sale("A", None, 99.0, date(2025, 1, 3)),
            sale("B", None, 5.0, date(2024, 12, 1)),
            sale("B", None, 7.0, date(2024, 12, 1)),
        ]);

        let window = result.window.unwrap();
        assert_eq!(window.start, date(2025, 1, 4));
        assert_eq!(window.end, date(2025, 1, 10));

        assert_eq!(result.by_sku["A"].total_sales, 30.0);
        // 窗口外 SKU 仍登记,销量为 0
        assert_eq!(result.by_sku["B"].total_sales, 0.0);
        assert_eq!(result.by_sku["B"].drr, 0.0);
        assert_eq!(result.out_of_window_rows, 3);
    }

    #[test]
    fn test_configured_as_of_excludes_future_sales() {
        let aggregator = SalesAggregator::new(30, Some(date(2025, 1, 31)));
        let result = aggregator.aggregate(vec![
            sale("A", None, 60.0, date(2025, 1, 20)),
            sale("A", None, 40.0, date(2025, 2, 2)),
        ]);

        assert_eq!(result.by_sku["A"].total_sales, 60.0);
        assert!((result.by_sku["A"].drr - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_warehouse_attribution_grouping() {
        let aggregator = SalesAggregator::new(30, None);
        let on = date(2025, 3, 1);
        let result = aggregator.aggregate(vec![
            sale("A", Some("W1"), 30.0, on),
            sale("A", Some("W2"), 60.0, on),
            sale("A", Some("W1"), 30.0, on),
            sale("A", None, 30.0, on),
        ]);

        assert!(result.has_warehouse_attribution);
        assert!(result.is_attributed("A"));
        assert_eq!(result.by_sku["A"].total_sales, 150.0);
        let w1 = &result.by_warehouse[&("A".to_string(), "W1".to_string())];
        assert_eq!(w1.total_sales, 60.0);
        assert!((w1.drr - 2.0).abs() < 1e-9);
        assert_eq!(result.by_warehouse.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let aggregator = SalesAggregator::new(30, None);
        let result = aggregator.aggregate(Vec::new());

        assert!(result.by_sku.is_empty());
        assert!(result.window.is_none());
        assert_eq!(result.records_seen, 0);
    }

    #[test]
    fn test_attribution_tracked_per_sku() {
        let aggregator = SalesAggregator::new(30, None);
        let on = date(2025, 3, 1);
        let result = aggregator.aggregate(vec![
            sale("A", None, 300.0, on),
            sale("B", Some("W1"), 30.0, on),
        ]);

        assert!(result.has_warehouse_attribution);
        assert!(result.is_attributed("B"));
        assert!(!result.is_attributed("A"));
    }

    #[test]
    fn test_window_past_calendar_range_does_not_overflow() {
        let aggregator = SalesAggregator::new(100_000_000, None);
        let window = aggregator.resolve_window(Some(date(2025, 3, 1))).unwrap();
        assert_eq!(window.start, NaiveDate::MIN);
        assert_eq!(window.end, date(2025, 3, 1));

        let result = aggregator.aggregate(vec![sale("A", None, 10.0, date(1900, 1, 1))]);
        assert_eq!(result.by_sku["A"].total_sales, 10.0);
        assert_eq!(result.out_of_window_rows, 0);
    }
}
