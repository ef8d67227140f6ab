// ==========================================
// 库存覆盖分析引擎 - 导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 流程: 文件解析 → 列别名解析 → 行映射（类型转换 + 校验）
// ==========================================

use crate::domain::record::{RawRow, RawTable};
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::ColumnMap;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始表格
    ///
    /// # 参数
    /// - file_path: 文件路径
    ///
    /// # 返回
    /// - Ok(RawTable): 表头 + 行记录（已跳过完全空白行）
    /// - Err: 文件不存在、格式错误
    fn parse_to_raw_table(&self, file_path: &Path) -> ImportResult<RawTable>;
}

// ==========================================
// RecordMapper Trait
// ==========================================
// 用途: 行映射接口（阶段 1）
// 实现者: SalesFieldMapper, StockFieldMapper
pub trait RecordMapper: Send + Sync {
    /// 映射产出的强类型记录
    type Record;

    /// 根据表头解析列映射（每个数据源只解析一次）
    fn resolve_columns(&self, headers: &[String]) -> ColumnMap;

    /// 将原始行映射为强类型记录
    ///
    /// # 参数
    /// - row: 原始行
    /// - columns: 已解析的列映射
    /// - row_number: 行号（用于拒绝报告）
    ///
    /// # 返回
    /// - Ok(Record): 映射成功
    /// - Err: 行级错误（字段缺失、类型错误、负数量）
    fn map_row(
        &self,
        row: &RawRow,
        columns: &ColumnMap,
        row_number: usize,
    ) -> ImportResult<Self::Record>;
}
