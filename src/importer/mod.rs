// ==========================================
// 库存覆盖分析引擎 - 导入层
// ==========================================
// 职责: 外部表格 → 强类型销售/库存记录
// 支持: Excel, CSV
// 流程: 解析 → 列别名解析 → 清洗/类型转换 → 拒绝统计
// ==========================================

pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod importer_trait;
pub mod normalizer;

// 重导出核心类型
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use field_mapper::{CanonicalField, ColumnMap, SalesFieldMapper, StockFieldMapper};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use normalizer::{
    NormalizedRecords, RecordNormalizer, RejectionReport, RowRejection, SalesRecords,
    StockRecords,
};

// 重导出 Trait 接口
pub use importer_trait::{FileParser, RecordMapper};
