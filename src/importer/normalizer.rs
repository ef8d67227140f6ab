// ==========================================
// 库存覆盖分析引擎 - 记录标准化器
// ==========================================
// 职责: RawTable → 强类型记录的惰性序列 + 拒绝统计
// 红线: 行级失败只跳过并计数,不中断运行
// 红线: 序列只可消费一次（按值持有原始行）
// ==========================================

use crate::domain::record::{RawRow, RawTable};
use crate::domain::types::DataSource;
use crate::importer::field_mapper::{ColumnMap, SalesFieldMapper, StockFieldMapper};
use crate::importer::importer_trait::RecordMapper;
use serde::{Deserialize, Serialize};
use std::iter::Enumerate;
use std::vec::IntoIter;
use tracing::warn;

/// 拒绝明细保留上限（诊断用,计数不受限）
pub const MAX_REJECTION_SAMPLES: usize = 20;

// ==========================================
// RowRejection - 单行拒绝明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowRejection {
    pub row_number: usize,
    pub reason: String,
}

// ==========================================
// RejectionReport - 数据源拒绝统计
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionReport {
    pub source: DataSource,

    /// 原始数据行数
    pub total_rows: usize,

    /// 已消费且通过的行数
    pub accepted: usize,

    pub rejected: usize,

    /// 前 N 条拒绝明细
    pub samples: Vec<RowRejection>,
}

impl RejectionReport {
    /// 有数据行但全部被拒绝
    pub fn all_rejected(&self) -> bool {
        self.total_rows > 0 && self.accepted == 0 && self.rejected == self.total_rows
    }
}

// ==========================================
// NormalizedRecords - 惰性记录序列
// ==========================================
pub struct NormalizedRecords<M: RecordMapper> {
    source: DataSource,
    mapper: M,
    columns: ColumnMap,
    rows: Enumerate<IntoIter<RawRow>>,
    total_rows: usize,
    accepted: usize,
    rejected: usize,
    samples: Vec<RowRejection>,
}

impl<M: RecordMapper> NormalizedRecords<M> {
    fn new(source: DataSource, mapper: M, table: RawTable) -> Self {
        // 列映射每个数据源只解析一次
        let columns = mapper.resolve_columns(&table.headers);
        let total_rows = table.rows.len();

        Self {
            source,
            mapper,
            columns,
            rows: table.rows.into_iter().enumerate(),
            total_rows,
            accepted: 0,
            rejected: 0,
            samples: Vec::new(),
        }
    }

    pub fn source(&self) -> DataSource {
        self.source
    }

    pub fn columns(&self) -> &ColumnMap {
        &self.columns
    }

    /// 当前拒绝统计（序列耗尽后为最终值）
    pub fn rejection_report(&self) -> RejectionReport {
        RejectionReport {
            source: self.source,
            total_rows: self.total_rows,
            accepted: self.accepted,
            rejected: self.rejected,
            samples: self.samples.clone(),
        }
    }
}

impl<M: RecordMapper> Iterator for NormalizedRecords<M> {
    type Item = M::Record;

    fn next(&mut self) -> Option<Self::Item> {
        for (idx, row) in self.rows.by_ref() {
            let row_number = idx + 1;
            match self.mapper.map_row(&row, &self.columns, row_number) {
                Ok(record) => {
                    self.accepted += 1;
                    return Some(record);
                }
                Err(e) => {
                    warn!(source = %self.source, row_number, error = %e, "行被拒绝");
                    self.rejected += 1;
                    if self.samples.len() < MAX_REJECTION_SAMPLES {
                        self.samples.push(RowRejection {
                            row_number,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.rows.size_hint().1)
    }
}

// ==========================================
// RecordNormalizer - 入口（无状态）
// ==========================================
pub struct RecordNormalizer;

impl RecordNormalizer {
    pub fn sales(&self, table: RawTable) -> NormalizedRecords<SalesFieldMapper> {
        NormalizedRecords::new(DataSource::Sales, SalesFieldMapper::new(), table)
    }

    pub fn stock(&self, table: RawTable) -> NormalizedRecords<StockFieldMapper> {
        NormalizedRecords::new(DataSource::Stock, StockFieldMapper::new(), table)
    }
}

/// 便捷别名
pub type SalesRecords = NormalizedRecords<SalesFieldMapper>;
pub type StockRecords = NormalizedRecords<StockFieldMapper>;
