// ==========================================
// 库存覆盖分析引擎 - 引擎运行配置
// ==========================================
// 默认值: 回看 30 天 / 补货阈值 30 天 / 积压阈值 60 天
// 红线: 回看天数与阈值必须为正,处理开始前校验
// ==========================================

use crate::config::config_manager::config_keys;
use crate::config::error::{ConfigError, ConfigResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;
pub const DEFAULT_REFILL_THRESHOLD_DAYS: f64 = 30.0;
pub const DEFAULT_EXCESS_THRESHOLD_DAYS: f64 = 60.0;
pub const DEFAULT_DECIMAL_PLACES: usize = 2;
pub const DEFAULT_TOP_REFILL_LIMIT: usize = 10;

/// 小数位上限（避免无意义的长尾输出）
pub const MAX_DECIMAL_PLACES: usize = 6;

/// 回看天数上限（约 100 年）
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

// ==========================================
// EngineConfig - 单次运行的配置快照
// ==========================================
// 运行期间只读,不跨运行共享
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// DRR 回看窗口（天）
    pub lookback_days: i64,

    /// 补货阈值: SKU 覆盖天数 < 该值 → 补货候选
    pub refill_threshold_days: f64,

    /// 积压阈值: 仓库覆盖天数 > 该值 → 积压
    pub excess_threshold_days: f64,

    /// DRR / 覆盖天数输出小数位
    pub decimal_places: usize,

    /// 窗口结束日（None 时取销售数据最新日期）
    pub as_of: Option<NaiveDate>,

    /// 概览中补货 Top N
    pub top_refill_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            refill_threshold_days: DEFAULT_REFILL_THRESHOLD_DAYS,
            excess_threshold_days: DEFAULT_EXCESS_THRESHOLD_DAYS,
            decimal_places: DEFAULT_DECIMAL_PLACES,
            as_of: None,
            top_refill_limit: DEFAULT_TOP_REFILL_LIMIT,
        }
    }
}

impl EngineConfig {
    /// 校验配置（处理开始前调用）
    ///
    /// # 返回
    /// - Ok(()): 校验通过
    /// - Err(ConfigError::Invalid): 回看天数/阈值非正,回看天数或小数位超限
    pub fn validate(&self) -> ConfigResult<()> {
        if self.lookback_days <= 0 {
            return Err(invalid(
                config_keys::LOOKBACK_DAYS,
                self.lookback_days.to_string(),
                "回看天数必须为正整数",
            ));
        }

        if self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(invalid(
                config_keys::LOOKBACK_DAYS,
                self.lookback_days.to_string(),
                &format!("回看天数不能超过 {}", MAX_LOOKBACK_DAYS),
            ));
        }

        for (key, value) in [
            (config_keys::REFILL_THRESHOLD_DAYS, self.refill_threshold_days),
            (config_keys::EXCESS_THRESHOLD_DAYS, self.excess_threshold_days),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(key, value.to_string(), "阈值天数必须为正数"));
            }
        }

        if self.decimal_places > MAX_DECIMAL_PLACES {
            return Err(invalid(
                config_keys::DECIMAL_PLACES,
                self.decimal_places.to_string(),
                &format!("小数位不能超过 {}", MAX_DECIMAL_PLACES),
            ));
        }

        // 阈值交叉不阻断,但同一 SKU 可能同时出现在补货与积压中
        if self.refill_threshold_days >= self.excess_threshold_days {
            warn!(
                refill = self.refill_threshold_days,
                excess = self.excess_threshold_days,
                "补货阈值不小于积压阈值"
            );
        }

        Ok(())
    }

    /// 应用覆写（命令行参数优先于存储配置）
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(v) = overrides.lookback_days {
            self.lookback_days = v;
        }
        if let Some(v) = overrides.refill_threshold_days {
            self.refill_threshold_days = v;
        }
        if let Some(v) = overrides.excess_threshold_days {
            self.excess_threshold_days = v;
        }
        if let Some(v) = overrides.decimal_places {
            self.decimal_places = v;
        }
        if let Some(v) = overrides.as_of {
            self.as_of = Some(v);
        }
        if let Some(v) = overrides.top_refill_limit {
            self.top_refill_limit = v;
        }
        self
    }
}

fn invalid(key: &str, value: String, message: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value,
        message: message.to_string(),
    }
}

// ==========================================
// ConfigOverrides - 运行时覆写
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    pub lookback_days: Option<i64>,
    pub refill_threshold_days: Option<f64>,
    pub excess_threshold_days: Option<f64>,
    pub decimal_places: Option<usize>,
    pub as_of: Option<NaiveDate>,
    pub top_refill_limit: Option<usize>,
}
