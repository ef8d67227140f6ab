// ==========================================
// 库存覆盖分析引擎 - 配置层
// ==========================================
// 职责: 运行配置定义、校验、持久化读取
// 存储: config_kv 表
// 优先级: 命令行覆写 > config_kv > 默认值
// ==========================================

pub mod config_manager;
pub mod engine_config;
pub mod engine_config_trait;
pub mod error;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use engine_config::{ConfigOverrides, EngineConfig};
pub use engine_config_trait::EngineConfigReader;
pub use error::{ConfigError, ConfigResult};
