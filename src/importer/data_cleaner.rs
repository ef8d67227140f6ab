// ==========================================
// 库存覆盖分析引擎 - 数据清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 数量与日期强类型转换 / 布尔标记归一
// 红线: 无法解析的值一律拒绝,不静默置零
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

/// Excel 序列日期的合理区间（约 1954 ~ 2119 年）
const EXCEL_SERIAL_MIN: f64 = 20_000.0;
const EXCEL_SERIAL_MAX: f64 = 80_000.0;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y%m%d%H%M%S",
];

pub struct DataCleaner;

impl DataCleaner {
    /// 标准化 NULL 值（空字符串/空白/NULL 字面量 → None）
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            match trimmed.to_uppercase().as_str() {
                "" | "NULL" | "NAN" | "N/A" | "NONE" => None,
                _ => Some(trimmed.to_string()),
            }
        })
    }

    /// 解析数量（支持千分位,拒绝负数/NaN/无穷）
    pub fn parse_quantity(&self, value: &str, field: &str, row: usize) -> ImportResult<f64> {
        let compact: String = value
            .trim()
            .chars()
            .filter(|c| *c != ',' && *c != '_' && !c.is_whitespace())
            .collect();

        let parsed = compact
            .parse::<f64>()
            .map_err(|_| ImportError::TypeConversionError {
                row,
                field: field.to_string(),
                message: format!("无法解析为数量: {}", value),
            })?;

        if !parsed.is_finite() {
            return Err(ImportError::TypeConversionError {
                row,
                field: field.to_string(),
                message: format!("数量必须为有限数值: {}", value),
            });
        }

        if parsed < 0.0 {
            return Err(ImportError::NegativeQuantity {
                row,
                field: field.to_string(),
                value: parsed,
            });
        }

        // 统一 -0.0
        Ok(parsed + 0.0)
    }

    /// 解析日期
    ///
    /// 支持:
    /// - YYYY-MM-DD / YYYYMMDD / YYYY/MM/DD / DD-MM-YYYY / DD.MM.YYYY
    /// - 带时间部分的常见格式与 RFC 3339（取日期部分）
    /// - Excel 序列日期（未开启 calamine dates 特性时单元格以数字呈现）
    pub fn parse_date(&self, value: &str, field: &str, row: usize) -> ImportResult<NaiveDate> {
        let trimmed = value.trim();

        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                return Ok(date);
            }
        }

        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(dt.date());
            }
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(dt.date_naive());
        }

        if let Some(date) = excel_serial_to_date(trimmed) {
            return Ok(date);
        }

        Err(ImportError::DateFormatError {
            row,
            field: field.to_string(),
            value: value.to_string(),
        })
    }

    /// 解析布尔类标记
    ///
    /// # 返回
    /// - Some(true): 1 / Y / YES / TRUE / LIVE / ACTIVE / T
    /// - Some(false): 0 / N / NO / FALSE / NOT LIVE / INACTIVE / F
    /// - None: 无法识别
    pub fn parse_bool_like(&self, value: &str) -> Option<bool> {
        let normalized = value.trim().to_uppercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "1" | "Y" | "YES" | "TRUE" | "T" | "LIVE" | "ACTIVE" | "ON" => Some(true),
            "0" | "N" | "NO" | "FALSE" | "F" | "NOT LIVE" | "NOTLIVE" | "INACTIVE" | "OFF" => {
                Some(false)
            }
            _ => None,
        }
    }
}

fn excel_serial_to_date(value: &str) -> Option<NaiveDate> {
    let serial = value.parse::<f64>().ok()?;
    if !(EXCEL_SERIAL_MIN..=EXCEL_SERIAL_MAX).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_null() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.normalize_null(Some("  A1 ")), Some("A1".to_string()));
        assert_eq!(cleaner.normalize_null(Some("   ")), None);
        assert_eq!(cleaner.normalize_null(Some("null")), None);
        assert_eq!(cleaner.normalize_null(None), None);
    }

    #[test]
    fn test_parse_quantity_with_thousands_separator() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_quantity("1,200", "quantity", 1).unwrap(), 1200.0);
        assert_eq!(cleaner.parse_quantity(" 3.5 ", "quantity", 1).unwrap(), 3.5);
    }

    #[test]
    fn test_parse_quantity_rejects_negative_and_garbage() {
        let cleaner = DataCleaner;
        assert!(matches!(
            cleaner.parse_quantity("-4", "quantity", 7),
            Err(ImportError::NegativeQuantity { row: 7, .. })
        ));
        assert!(matches!(
            cleaner.parse_quantity("abc", "quantity", 2),
            Err(ImportError::TypeConversionError { row: 2, .. })
        ));
        assert!(cleaner.parse_quantity("inf", "quantity", 3).is_err());
    }

    #[test]
    fn test_parse_quantity_negative_zero_is_zero() {
        let cleaner = DataCleaner;
        let qty = cleaner.parse_quantity("-0", "quantity", 1).unwrap();
        assert_eq!(qty, 0.0);
        assert!(qty.is_sign_positive());
    }

    #[test]
    fn test_parse_date_formats() {
        let cleaner = DataCleaner;
        let expected = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        for value in [
            "2025-01-20",
            "20250120",
            "2025/01/20",
            "20-01-2025",
            "2025-01-20 13:45:00",
            "2025-01-20T13:45:00",
            "2025-01-20T13:45:00+05:30",
        ] {
            assert_eq!(cleaner.parse_date(value, "date", 1).unwrap(), expected, "{}", value);
        }
    }

    #[test]
    fn test_parse_date_excel_serial() {
        let cleaner = DataCleaner;
        // 45677 = 2025-01-20
        assert_eq!(
            cleaner.parse_date("45677", "date", 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 20).unwrap()
        );
    }

    #[test]
    fn test_parse_date_invalid() {
        let cleaner = DataCleaner;
        assert!(matches!(
            cleaner.parse_date("yesterday", "date", 4),
            Err(ImportError::DateFormatError { row: 4, .. })
        ));
    }

    #[test]
    fn test_parse_bool_like() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.parse_bool_like("Yes"), Some(true));
        assert_eq!(cleaner.parse_bool_like("1"), Some(true));
        assert_eq!(cleaner.parse_bool_like("not_live"), Some(false));
        assert_eq!(cleaner.parse_bool_like("FALSE"), Some(false));
        assert_eq!(cleaner.parse_bool_like("maybe"), None);
    }
}
