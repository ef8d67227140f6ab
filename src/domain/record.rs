// ==========================================
// 库存覆盖分析引擎 - 输入记录
// ==========================================
// 职责: 原始表格行 + 标准化后的强类型记录
// 红线: 记录创建后不可变,仅由对应的聚合器消费
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// 原始行（列名 → 原始值）
pub type RawRow = HashMap<String, String>;

// ==========================================
// RawTable - 原始表格
// ==========================================
// 文件解析器输出，表头顺序与源文件一致
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// 表头（已 TRIM）
    pub headers: Vec<String>,

    /// 数据行（已跳过完全空白行）
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self { headers, rows }
    }

    /// 由行集合构造（表头取所有行键的并集，按字典序）
    pub fn from_rows(rows: Vec<RawRow>) -> Self {
        let headers: BTreeSet<String> = rows
            .iter()
            .flat_map(|row| row.keys().cloned())
            .collect();

        Self {
            headers: headers.into_iter().collect(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ==========================================
// SalesRecord - 销售流水记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub sku: String,

    /// 仓库归属（销售源可能不带）
    pub warehouse_id: Option<String>,

    /// 销量（≥ 0）
    pub quantity: f64,

    pub date: NaiveDate,

    /// 源文件行号（从 1 开始，不含表头）
    pub row_number: usize,
}

// ==========================================
// StockRecord - 仓库库存快照记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub sku: String,
    pub warehouse_id: String,

    /// 在库数量（≥ 0）
    pub quantity: f64,

    /// 是否在网站上架
    pub live_on_website: bool,

    pub row_number: usize,
}
