// ==========================================
// 库存覆盖分析引擎 - API层错误类型
// ==========================================
// 职责: 汇总各层错误,转换为调用方可读的结构化错误
// 红线: 失败时不返回部分报表
// ==========================================

use crate::config::error::ConfigError;
use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("数据源无可用记录: {0}")]
    SourceEmpty(String),

    #[error("配置无效: {0}")]
    ConfigInvalid(String),

    #[error("配置读取失败: {0}")]
    ConfigError(String),

    #[error("产物存储失败: {0}")]
    StorageError(String),

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 稳定错误码（供调用方分支处理）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::ImportError(_) => "IMPORT_FAILED",
            ApiError::SourceEmpty(_) => "SOURCE_EMPTY",
            ApiError::ConfigInvalid(_) => "CONFIG_INVALID",
            ApiError::ConfigError(_) => "CONFIG_ERROR",
            ApiError::StorageError(_) => "STORAGE_ERROR",
            ApiError::InternalError(_) | ApiError::Other(_) => "INTERNAL_ERROR",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            status: "error".to_string(),
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

/// 结构化错误响应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub code: String,
    pub message: String,
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::SourceEmpty {
                data_source,
                message,
            } => ApiError::SourceEmpty(format!("{}: {}", data_source, message)),
            EngineError::ConfigInvalid {
                key,
                value,
                message,
            } => ApiError::ConfigInvalid(format!("{}={}: {}", key, value, message)),
            EngineError::Config(e) => ApiError::from(e),
            EngineError::Import { data_source, error } => {
                ApiError::ImportError(format!("{}: {}", data_source, error))
            }
            EngineError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

// ==========================================
// 从 ConfigError 转换
// ==========================================
impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Invalid { .. } => ApiError::ConfigInvalid(err.to_string()),
            ConfigError::ParseError { .. } | ConfigError::UnknownKey(_) => {
                ApiError::InvalidInput(err.to_string())
            }
            ConfigError::StorageError(_) | ConfigError::LockError(_) => {
                ApiError::ConfigError(err.to_string())
            }
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::IoError { .. } | RepositoryError::SerializationError(_) => {
                ApiError::StorageError(err.to_string())
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
