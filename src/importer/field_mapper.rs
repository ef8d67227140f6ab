// ==========================================
// 库存覆盖分析引擎 - 字段映射器实现
// ==========================================
// 职责: 源列名 → 标准字段（别名表,一次解析）+ 类型转换
// 规则: 列名比较忽略大小写、空格、下划线、连字符、点号
// ==========================================

use crate::domain::record::{RawRow, SalesRecord, StockRecord};
use crate::domain::types::DataSource;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::RecordMapper;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

// ==========================================
// 标准字段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Sku,
    WarehouseId,
    Quantity,
    Date,
    LiveOnWebsite,
}

impl CanonicalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Sku => "sku",
            CanonicalField::WarehouseId => "warehouse_id",
            CanonicalField::Quantity => "quantity",
            CanonicalField::Date => "date",
            CanonicalField::LiveOnWebsite => "live_on_website",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 别名表（已归一化,按优先级排列）
// ==========================================
const SKU_ALIASES: &[&str] = &["sku", "skuid", "productsku", "itemsku", "sellersku"];

const WAREHOUSE_ALIASES: &[&str] = &[
    "warehouseid",
    "warehouse",
    "locationid",
    "location",
    "fcid",
    "fc",
    "fulfillmentcenter",
];

const SALES_QUANTITY_ALIASES: &[&str] = &[
    "quantity",
    "qty",
    "saleqty",
    "salesqty",
    "soldqty",
    "orderqty",
    "units",
    "unitssold",
];

const DATE_ALIASES: &[&str] = &[
    "date",
    "orderdate",
    "saledate",
    "salesdate",
    "transactiondate",
];

const STOCK_QUANTITY_ALIASES: &[&str] = &[
    "quantity",
    "qty",
    "stock",
    "stockqty",
    "available",
    "availableqty",
    "onhand",
    "onhandqty",
    "fbfstock",
];

const LIVE_ALIASES: &[&str] = &["liveonwebsite", "live", "islive", "listed"];

/// 某数据源某字段的别名列表
pub fn aliases_for(source: DataSource, field: CanonicalField) -> &'static [&'static str] {
    match (source, field) {
        (_, CanonicalField::Sku) => SKU_ALIASES,
        (_, CanonicalField::WarehouseId) => WAREHOUSE_ALIASES,
        (DataSource::Sales, CanonicalField::Quantity) => SALES_QUANTITY_ALIASES,
        (DataSource::Stock, CanonicalField::Quantity) => STOCK_QUANTITY_ALIASES,
        (DataSource::Sales, CanonicalField::Date) => DATE_ALIASES,
        (DataSource::Stock, CanonicalField::LiveOnWebsite) => LIVE_ALIASES,
        _ => &[],
    }
}

/// 列名归一化（小写,去除空格/下划线/连字符/点号）
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-' | '.'))
        .flat_map(|c| c.to_lowercase())
        .collect()
}

// ==========================================
// ColumnMap - 已解析的列映射
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColumnMap {
    columns: BTreeMap<CanonicalField, String>,
}

impl ColumnMap {
    /// 按别名表解析表头
    ///
    /// 同一字段多个候选列时,按别名优先级取第一个;同一源列不重复分配
    pub fn resolve(source: DataSource, headers: &[String], fields: &[CanonicalField]) -> Self {
        let normalized: Vec<(String, &String)> = headers
            .iter()
            .map(|h| (normalize_header(h), h))
            .collect();

        let mut columns = BTreeMap::new();
        for field in fields {
            let found = aliases_for(source, *field).iter().find_map(|alias| {
                normalized
                    .iter()
                    .find(|(norm, original)| {
                        norm.as_str() == *alias
                            && !columns.values().any(|used: &String| used == *original)
                    })
                    .map(|(_, original)| (*original).clone())
            });

            if let Some(header) = found {
                columns.insert(*field, header);
            }
        }

        debug!(source = %source, columns = ?columns, "列映射解析完成");
        Self { columns }
    }

    pub fn column(&self, field: CanonicalField) -> Option<&str> {
        self.columns.get(&field).map(|s| s.as_str())
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.columns.contains_key(&field)
    }

    /// 缺失的必填字段
    pub fn missing(&self, required: &[CanonicalField]) -> Vec<CanonicalField> {
        required
            .iter()
            .copied()
            .filter(|f| !self.contains(*f))
            .collect()
    }
}

fn cell<'a>(row: &'a RawRow, columns: &ColumnMap, field: CanonicalField) -> Option<&'a str> {
    columns
        .column(field)
        .and_then(|header| row.get(header))
        .map(|v| v.as_str())
}

fn required_text(
    cleaner: &DataCleaner,
    row: &RawRow,
    columns: &ColumnMap,
    field: CanonicalField,
    row_number: usize,
) -> ImportResult<String> {
    cleaner
        .normalize_null(cell(row, columns, field))
        .ok_or_else(|| ImportError::FieldMissing {
            row: row_number,
            field: field.to_string(),
        })
}

// ==========================================
// SalesFieldMapper - 销售行映射
// ==========================================
pub struct SalesFieldMapper {
    cleaner: DataCleaner,
}

impl SalesFieldMapper {
    pub const REQUIRED: &'static [CanonicalField] = &[
        CanonicalField::Sku,
        CanonicalField::Quantity,
        CanonicalField::Date,
    ];

    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }
}

impl Default for SalesFieldMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordMapper for SalesFieldMapper {
    type Record = SalesRecord;

    fn resolve_columns(&self, headers: &[String]) -> ColumnMap {
        let columns = ColumnMap::resolve(
            DataSource::Sales,
            headers,
            &[
                CanonicalField::Sku,
                CanonicalField::WarehouseId,
                CanonicalField::Quantity,
                CanonicalField::Date,
            ],
        );

        let missing = columns.missing(Self::REQUIRED);
        if !missing.is_empty() {
            warn!(source = "sales", missing = ?missing, "销售数据缺少必填列,相关行将被拒绝");
        }
        columns
    }

    fn map_row(
        &self,
        row: &RawRow,
        columns: &ColumnMap,
        row_number: usize,
    ) -> ImportResult<SalesRecord> {
        let sku = required_text(&self.cleaner, row, columns, CanonicalField::Sku, row_number)?;

        let warehouse_id = self
            .cleaner
            .normalize_null(cell(row, columns, CanonicalField::WarehouseId));

        let quantity_raw = required_text(
            &self.cleaner,
            row,
            columns,
            CanonicalField::Quantity,
            row_number,
        )?;
        let quantity = self
            .cleaner
            .parse_quantity(&quantity_raw, CanonicalField::Quantity.as_str(), row_number)?;

        let date_raw = required_text(&self.cleaner, row, columns, CanonicalField::Date, row_number)?;
        let date = self
            .cleaner
            .parse_date(&date_raw, CanonicalField::Date.as_str(), row_number)?;

        Ok(SalesRecord {
            sku,
            warehouse_id,
            quantity,
            date,
            row_number,
        })
    }
}

// ==========================================
// StockFieldMapper - 库存行映射
// ==========================================
// 兼容: 无数量列但 "Live on Website" 为数值时,该数值即在库数量
pub struct StockFieldMapper {
    cleaner: DataCleaner,
}

impl StockFieldMapper {
    pub const REQUIRED: &'static [CanonicalField] = &[
        CanonicalField::Sku,
        CanonicalField::WarehouseId,
        CanonicalField::Quantity,
    ];

    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }

    fn parse_live_flag(&self, value: &str, row_number: usize) -> ImportResult<bool> {
        if let Some(flag) = self.cleaner.parse_bool_like(value) {
            return Ok(flag);
        }

        // 数值型上架列：大于 0 视为上架
        self.cleaner
            .parse_quantity(value, CanonicalField::LiveOnWebsite.as_str(), row_number)
            .map(|qty| qty > 0.0)
            .map_err(|_| ImportError::TypeConversionError {
                row: row_number,
                field: CanonicalField::LiveOnWebsite.to_string(),
                message: format!("无法识别的上架标记: {}", value),
            })
    }
}

impl Default for StockFieldMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordMapper for StockFieldMapper {
    type Record = StockRecord;

    fn resolve_columns(&self, headers: &[String]) -> ColumnMap {
        let columns = ColumnMap::resolve(
            DataSource::Stock,
            headers,
            &[
                CanonicalField::Sku,
                CanonicalField::WarehouseId,
                CanonicalField::Quantity,
                CanonicalField::LiveOnWebsite,
            ],
        );

        let mut missing = columns.missing(Self::REQUIRED);
        if columns.contains(CanonicalField::LiveOnWebsite) {
            missing.retain(|f| *f != CanonicalField::Quantity);
        }
        if !missing.is_empty() {
            warn!(source = "stock", missing = ?missing, "库存数据缺少必填列,相关行将被拒绝");
        }
        columns
    }

    fn map_row(
        &self,
        row: &RawRow,
        columns: &ColumnMap,
        row_number: usize,
    ) -> ImportResult<StockRecord> {
        let sku = required_text(&self.cleaner, row, columns, CanonicalField::Sku, row_number)?;
        let warehouse_id = required_text(
            &self.cleaner,
            row,
            columns,
            CanonicalField::WarehouseId,
            row_number,
        )?;

        let live_raw = self
            .cleaner
            .normalize_null(cell(row, columns, CanonicalField::LiveOnWebsite));

        let (quantity, live_on_website) = if columns.contains(CanonicalField::Quantity) {
            let quantity_raw = required_text(
                &self.cleaner,
                row,
                columns,
                CanonicalField::Quantity,
                row_number,
            )?;
            let quantity = self.cleaner.parse_quantity(
                &quantity_raw,
                CanonicalField::Quantity.as_str(),
                row_number,
            )?;
            let live = match live_raw {
                Some(value) => self.parse_live_flag(&value, row_number)?,
                None => true,
            };
            (quantity, live)
        } else {
            // 数量取自上架列
            let value = live_raw.ok_or_else(|| ImportError::FieldMissing {
                row: row_number,
                field: CanonicalField::Quantity.to_string(),
            })?;
            let quantity =
                self.cleaner
                    .parse_quantity(&value, CanonicalField::Quantity.as_str(), row_number)?;
            (quantity, quantity > 0.0)
        };

        Ok(StockRecord {
            sku,
            warehouse_id,
            quantity,
            live_on_website,
            row_number,
        })
    }
}
