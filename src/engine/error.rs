// ==========================================
// 库存覆盖分析引擎 - 引擎层错误类型
// ==========================================
// 行级失败在导入层吸收,这里只有中止整次运行的错误
// ==========================================

use crate::config::error::ConfigError;
use crate::domain::types::DataSource;
use crate::importer::error::ImportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// 数据源标准化后无可用行
    #[error("数据源无可用记录 (source: {data_source}): {message}")]
    SourceEmpty {
        data_source: DataSource,
        message: String,
    },

    /// 回看天数/阈值等配置非法（处理开始前判定）
    #[error("配置无效 (key: {key}, value: {value}): {message}")]
    ConfigInvalid {
        key: String,
        value: String,
        message: String,
    },

    #[error("配置读取失败: {0}")]
    Config(ConfigError),

    #[error("文件导入失败 (source: {data_source}): {error}")]
    Import {
        data_source: DataSource,
        #[source]
        error: ImportError,
    },

    #[error("内部错误: {0}")]
    Internal(String),
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Invalid {
                key,
                value,
                message,
            } => EngineError::ConfigInvalid {
                key,
                value,
                message,
            },
            other => EngineError::Config(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
