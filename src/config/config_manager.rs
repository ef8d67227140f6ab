// ==========================================
// 库存覆盖分析引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入、快照
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::engine_config::{
    DEFAULT_DECIMAL_PLACES, DEFAULT_EXCESS_THRESHOLD_DAYS, DEFAULT_LOOKBACK_DAYS,
    DEFAULT_REFILL_THRESHOLD_DAYS, DEFAULT_TOP_REFILL_LIMIT,
};
use crate::config::engine_config_trait::EngineConfigReader;
use crate::config::error::{ConfigError, ConfigResult};
use crate::db::{configure_sqlite_connection, ensure_config_schema, open_sqlite_connection, GLOBAL_SCOPE};
use crate::importer::DataCleaner;
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    pub const LOOKBACK_DAYS: &str = "lookback_days";
    pub const REFILL_THRESHOLD_DAYS: &str = "refill_threshold_days";
    pub const EXCESS_THRESHOLD_DAYS: &str = "excess_threshold_days";
    pub const DECIMAL_PLACES: &str = "decimal_places";
    pub const AS_OF: &str = "as_of";
    pub const TOP_REFILL_LIMIT: &str = "top_refill_limit";

    pub const ALL: &[&str] = &[
        LOOKBACK_DAYS,
        REFILL_THRESHOLD_DAYS,
        EXCESS_THRESHOLD_DAYS,
        DECIMAL_PLACES,
        AS_OF,
        TOP_REFILL_LIMIT,
    ];
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在时自动创建并建表）
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        info!(db_path = %db_path, "配置库已打开");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA 与建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ConfigError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            ensure_config_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 写入配置值（UPSERT）
    ///
    /// # 说明
    /// - 仅接受已知配置键
    /// - 值在写入前按目标类型校验格式（不校验业务约束）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        if !config_keys::ALL.contains(&key) {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }
        check_format(key, value)?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value.trim()],
        )?;

        info!(key = %key, value = %value, "配置已更新");
        Ok(())
    }

    /// 删除配置值（恢复默认）
    pub fn remove_config_value(&self, key: &str) -> ConfigResult<bool> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;

        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
        )?;
        Ok(affected > 0)
    }

    /// 列出 global scope 的全部配置
    pub fn list_configs(&self) -> ConfigResult<BTreeMap<String, String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut configs = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            configs.insert(key, value);
        }
        Ok(configs)
    }

    /// 获取所有配置的快照（JSON格式,键有序）
    ///
    /// # 用途
    /// - 随处理结果记录本次运行所用配置
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let configs = self.list_configs()?;
        Ok(serde_json::to_string(&configs)?)
    }

    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => parse_value(key, &raw),
        }
    }
}

fn parse_value<T>(key: &str, raw: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::ParseError {
            key: key.to_string(),
            value: raw.to_string(),
            message: e.to_string(),
        })
}

fn parse_as_of(raw: &str) -> ConfigResult<Option<NaiveDate>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    DataCleaner
        .parse_date(trimmed, config_keys::AS_OF, 0)
        .map(Some)
        .map_err(|e| ConfigError::ParseError {
            key: config_keys::AS_OF.to_string(),
            value: raw.to_string(),
            message: e.to_string(),
        })
}

fn check_format(key: &str, value: &str) -> ConfigResult<()> {
    match key {
        config_keys::LOOKBACK_DAYS => parse_value::<i64>(key, value).map(|_| ()),
        config_keys::REFILL_THRESHOLD_DAYS | config_keys::EXCESS_THRESHOLD_DAYS => {
            parse_value::<f64>(key, value).map(|_| ())
        }
        config_keys::DECIMAL_PLACES | config_keys::TOP_REFILL_LIMIT => {
            parse_value::<usize>(key, value).map(|_| ())
        }
        config_keys::AS_OF => parse_as_of(value).map(|_| ()),
        _ => Err(ConfigError::UnknownKey(key.to_string())),
    }
}

// ==========================================
// EngineConfigReader Trait 实现
// ==========================================
#[async_trait]
impl EngineConfigReader for ConfigManager {
    async fn get_lookback_days(&self) -> ConfigResult<i64> {
        self.get_parsed_or_default(config_keys::LOOKBACK_DAYS, DEFAULT_LOOKBACK_DAYS)
    }

    async fn get_refill_threshold_days(&self) -> ConfigResult<f64> {
        self.get_parsed_or_default(
            config_keys::REFILL_THRESHOLD_DAYS,
            DEFAULT_REFILL_THRESHOLD_DAYS,
        )
    }

    async fn get_excess_threshold_days(&self) -> ConfigResult<f64> {
        self.get_parsed_or_default(
            config_keys::EXCESS_THRESHOLD_DAYS,
            DEFAULT_EXCESS_THRESHOLD_DAYS,
        )
    }

    async fn get_decimal_places(&self) -> ConfigResult<usize> {
        self.get_parsed_or_default(config_keys::DECIMAL_PLACES, DEFAULT_DECIMAL_PLACES)
    }

    async fn get_as_of(&self) -> ConfigResult<Option<NaiveDate>> {
        match self.get_config_value(config_keys::AS_OF)? {
            None => Ok(None),
            Some(raw) => {
                debug!(raw = %raw, "读取 as_of 配置");
                parse_as_of(&raw)
            }
        }
    }

    async fn get_top_refill_limit(&self) -> ConfigResult<usize> {
        self.get_parsed_or_default(config_keys::TOP_REFILL_LIMIT, DEFAULT_TOP_REFILL_LIMIT)
    }
}
