// ==========================================
// 库存覆盖分析引擎 - 应用状态
// ==========================================
// 职责: 组装共享资源（配置库、产物仓储、API 实例）,解析默认路径
// ==========================================

use std::path::PathBuf;
use std::sync::Arc;

use crate::api::ProcessApi;
use crate::config::config_manager::ConfigManager;
use crate::config::engine_config::ConfigOverrides;
use crate::config::error::ConfigResult;
use crate::repository::FsReportRepository;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "STOCK_COVER_DB_PATH";

/// 报表输出目录环境变量
pub const OUTPUT_DIR_ENV: &str = "STOCK_COVER_OUTPUT_DIR";

/// 应用状态
pub struct AppState {
    /// 配置库路径
    pub db_path: String,

    /// 报表输出目录
    pub output_dir: PathBuf,

    /// 配置管理器（config_kv 表）
    pub config_manager: Arc<ConfigManager>,

    /// 报表产物仓储
    pub report_repo: Arc<FsReportRepository>,

    /// 处理API
    pub process_api: Arc<ProcessApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 配置库文件路径
    /// - output_dir: 报表输出目录
    /// - overrides: 运行时覆写（命令行参数）
    pub fn new(
        db_path: String,
        output_dir: PathBuf,
        overrides: ConfigOverrides,
    ) -> ConfigResult<Self> {
        tracing::info!(
            db_path = %db_path,
            output_dir = %output_dir.display(),
            "初始化AppState"
        );

        let config_manager = Arc::new(ConfigManager::new(&db_path)?);
        let report_repo = Arc::new(FsReportRepository::new(output_dir.clone()));
        let process_api = Arc::new(
            ProcessApi::new(config_manager.clone(), report_repo.clone()).with_overrides(overrides),
        );

        Ok(Self {
            db_path,
            output_dir,
            config_manager,
            report_repo,
            process_api,
        })
    }
}

/// 应用数据目录（开发环境独立目录,避免污染正式数据）
fn app_data_dir() -> Option<PathBuf> {
    let data_dir = dirs::data_dir()?;

    #[cfg(debug_assertions)]
    let dir = data_dir.join("stock-cover-dev");

    #[cfg(not(debug_assertions))]
    let dir = data_dir.join("stock-cover");

    Some(dir)
}

fn env_override(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 默认配置库路径
///
/// # 优先级
/// 1. STOCK_COVER_DB_PATH
/// 2. 用户数据目录/stock_cover.db
/// 3. ./stock_cover.db
pub fn get_default_db_path() -> String {
    if let Some(path) = env_override(DB_PATH_ENV) {
        return path;
    }

    match app_data_dir() {
        Some(dir) => {
            if let Err(e) = std::fs::create_dir_all(&dir) {
                tracing::warn!(dir = %dir.display(), error = %e, "数据目录创建失败,回退到当前目录");
                return "./stock_cover.db".to_string();
            }
            dir.join("stock_cover.db").to_string_lossy().to_string()
        }
        None => "./stock_cover.db".to_string(),
    }
}

/// 默认报表输出目录
///
/// # 优先级
/// 1. STOCK_COVER_OUTPUT_DIR
/// 2. 用户数据目录/outputs
/// 3. ./outputs
pub fn get_default_output_dir() -> PathBuf {
    if let Some(dir) = env_override(OUTPUT_DIR_ENV) {
        return PathBuf::from(dir);
    }

    app_data_dir()
        .map(|dir| dir.join("outputs"))
        .unwrap_or_else(|| PathBuf::from("./outputs"))
}
