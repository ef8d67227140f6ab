// ==========================================
// 库存覆盖分析引擎 - 引擎配置读取 Trait
// ==========================================
// 职责: 定义引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::engine_config::EngineConfig;
use crate::config::error::ConfigResult;
use async_trait::async_trait;
use chrono::NaiveDate;

// ==========================================
// EngineConfigReader Trait
// ==========================================
// 实现者: ConfigManager（config_kv 表）、EngineConfig（静态值）
#[async_trait]
pub trait EngineConfigReader: Send + Sync {
    /// 获取 DRR 回看天数
    ///
    /// # 默认值
    /// - 30
    async fn get_lookback_days(&self) -> ConfigResult<i64>;

    /// 获取补货阈值（天）
    ///
    /// # 默认值
    /// - 30
    async fn get_refill_threshold_days(&self) -> ConfigResult<f64>;

    /// 获取积压阈值（天）
    ///
    /// # 默认值
    /// - 60
    async fn get_excess_threshold_days(&self) -> ConfigResult<f64>;

    /// 获取输出小数位
    ///
    /// # 默认值
    /// - 2
    async fn get_decimal_places(&self) -> ConfigResult<usize>;

    /// 获取窗口结束日
    ///
    /// # 返回
    /// - None: 取销售数据最新日期
    async fn get_as_of(&self) -> ConfigResult<Option<NaiveDate>>;

    /// 获取补货 Top N 数量
    ///
    /// # 默认值
    /// - 10
    async fn get_top_refill_limit(&self) -> ConfigResult<usize>;

    /// 组装完整运行配置（未校验）
    async fn load_engine_config(&self) -> ConfigResult<EngineConfig> {
        Ok(EngineConfig {
            lookback_days: self.get_lookback_days().await?,
            refill_threshold_days: self.get_refill_threshold_days().await?,
            excess_threshold_days: self.get_excess_threshold_days().await?,
            decimal_places: self.get_decimal_places().await?,
            as_of: self.get_as_of().await?,
            top_refill_limit: self.get_top_refill_limit().await?,
        })
    }
}

// 静态配置直接作为读取器（测试与命令行场景）
#[async_trait]
impl EngineConfigReader for EngineConfig {
    async fn get_lookback_days(&self) -> ConfigResult<i64> {
        Ok(self.lookback_days)
    }

    async fn get_refill_threshold_days(&self) -> ConfigResult<f64> {
        Ok(self.refill_threshold_days)
    }

    async fn get_excess_threshold_days(&self) -> ConfigResult<f64> {
        Ok(self.excess_threshold_days)
    }

    async fn get_decimal_places(&self) -> ConfigResult<usize> {
        Ok(self.decimal_places)
    }

    async fn get_as_of(&self) -> ConfigResult<Option<NaiveDate>> {
        Ok(self.as_of)
    }

    async fn get_top_refill_limit(&self) -> ConfigResult<usize> {
        Ok(self.top_refill_limit)
    }
}
