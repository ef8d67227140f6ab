// ==========================================
// 库存覆盖分析引擎 - 数据仓储层
// ==========================================
// 职责: 报表产物持久化,屏蔽存储细节
// 红线: Repository 不含业务逻辑
// ==========================================

pub mod error;
pub mod report_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use report_repo::{
    ArtifactEntry, ArtifactManifest, FsReportRepository, ReportArtifact, ReportRepository,
    MANIFEST_FILE_NAME,
};
