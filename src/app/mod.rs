// ==========================================
// 库存覆盖分析引擎 - 应用层
// ==========================================
// 职责: 共享状态组装与默认路径解析（命令行入口使用）
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, get_default_output_dir, AppState};
