// ==========================================
// 库存覆盖分析引擎 - 库存聚合器
// ==========================================
// 职责: 按 SKU、SKU×仓库 汇总在库数量
// 红线: 同一 SKU×仓库 重复行累加,不覆盖
// ==========================================

use crate::domain::aggregate::{
    SkuStockAggregate, SkuWarehouseStockAggregate, StockAggregation,
};
use crate::domain::record::StockRecord;
use tracing::{info, instrument};

// ==========================================
// StockAggregator - 库存聚合器（无状态）
// ==========================================
pub struct StockAggregator;

impl StockAggregator {
    pub fn new() -> Self {
        Self
    }

    /// 聚合库存记录（单遍消费）
    #[instrument(skip(self, records))]
    pub fn aggregate<I>(&self, records: I) -> StockAggregation
    where
        I: IntoIterator<Item = StockRecord>,
    {
        let mut result = StockAggregation::default();

        for record in records {
            result.records_seen += 1;

            result
                .by_sku
                .entry(record.sku.clone())
                .or_insert_with(|| SkuStockAggregate {
                    sku: record.sku.clone(),
                    total_stock: 0.0,
                })
                .total_stock += record.quantity;

            let pair = result
                .by_warehouse
                .entry((record.sku.clone(), record.warehouse_id.clone()))
                .or_insert_with(|| SkuWarehouseStockAggregate {
                    sku: record.sku,
                    warehouse_id: record.warehouse_id,
                    stock_qty: 0.0,
                    live_on_website: false,
                });
            pair.stock_qty += record.quantity;
            pair.live_on_website |= record.live_on_website;
        }

        info!(
            records_seen = result.records_seen,
            sku_count = result.by_sku.len(),
            sku_warehouse_count = result.by_warehouse.len(),
            "库存聚合完成"
        );

        result
    }
}

impl Default for StockAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(sku: &str, warehouse: &str, qty: f64, live: bool) -> StockRecord {
        StockRecord {
            sku: sku.to_string(),
            warehouse_id: warehouse.to_string(),
            quantity: qty,
            live_on_website: live,
            row_number: 0,
        }
    }

    #[test]
    fn test_duplicate_pairs_are_summed() {
        let result = StockAggregator::new().aggregate(vec![
            stock("A", "W1", 40.0, false),
            stock("A", "W1", 60.0, true),
            stock("A", "W2", 25.0, false),
            stock("B", "W1", 0.0, false),
        ]);

        assert_eq!(result.records_seen, 4);
        assert_eq!(result.by_sku["A"].total_stock, 125.0);
        assert_eq!(result.by_sku["B"].total_stock, 0.0);

        let a_w1 = &result.by_warehouse[&("A".to_string(), "W1".to_string())];
        assert_eq!(a_w1.stock_qty, 100.0);
        assert!(a_w1.live_on_website);

        let a_w2 = &result.by_warehouse[&("A".to_string(), "W2".to_string())];
        assert!(!a_w2.live_on_website);
    }

    #[test]
    fn test_sku_total_matches_warehouse_sum() {
        let result = StockAggregator::new().aggregate(vec![
            stock("A", "W1", 10.0, true),
            stock("A", "W2", 15.5, true),
            stock("A", "W3", 4.5, true),
        ]);

        let warehouse_sum: f64 = result
            .by_warehouse
            .values()
            .filter(|p| p.sku == "A")
            .map(|p| p.stock_qty)
            .sum();
        assert_eq!(result.by_sku["A"].total_stock, warehouse_sum);
    }
}
