// ==========================================
// 库存覆盖分析引擎 - API层
// ==========================================
// 职责: 对外入口（处理上传、下载报表）,错误统一转换为 ApiError
// ==========================================

pub mod error;
pub mod process_api;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use process_api::{DownloadedReport, ProcessApi, ProcessResponse};
