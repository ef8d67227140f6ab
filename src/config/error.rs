// ==========================================
// 库存覆盖分析引擎 - 配置层错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置值合法但不满足业务约束（如非正数）
    #[error("配置值无效 (key: {key}, value: {value}): {message}")]
    Invalid {
        key: String,
        value: String,
        message: String,
    },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ParseError {
        key: String,
        value: String,
        message: String,
    },

    #[error("未知配置键: {0}")]
    UnknownKey(String),

    #[error("配置存储访问失败: {0}")]
    StorageError(String),

    #[error("锁获取失败: {0}")]
    LockError(String),
}

impl From<rusqlite::Error> for ConfigError {
    fn from(err: rusqlite::Error) -> Self {
        ConfigError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::StorageError(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
