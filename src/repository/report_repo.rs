// ==========================================
// 库存覆盖分析引擎 - 报表产物仓储
// ==========================================
// 职责: 四张报表的落盘与按名称读取
// 红线: 四个文件整体交付,先写入暂存目录再逐个改名覆盖
// 红线: 清单为提交标记,改名前先撤下旧清单,无清单不读取产物
// 红线: 只按 ReportKind 解析文件名,不拼接外部路径
// ==========================================

use crate::domain::types::ReportKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 运行清单文件名
pub const MANIFEST_FILE_NAME: &str = "run_manifest.json";

// ==========================================
// 产物清单
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub kind: ReportKind,
    pub file_name: String,
    pub bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub artifacts: Vec<ArtifactEntry>,
}

/// 待落盘的单个报表
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub kind: ReportKind,
    pub content: Vec<u8>,
}

// ==========================================
// ReportRepository Trait
// ==========================================
// 实现者: FsReportRepository（本地目录）
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// 整体保存一次运行的全部报表
    ///
    /// # 返回
    /// - Ok(ArtifactManifest): 已落盘的清单
    /// - Err: 写入失败（已存在的旧产物不受影响或已被完整替换）
    async fn save_artifacts(
        &self,
        run_id: &str,
        artifacts: Vec<ReportArtifact>,
    ) -> RepositoryResult<ArtifactManifest>;

    /// 读取指定报表的字节（须列于当前清单）
    async fn load_artifact(&self, kind: ReportKind) -> RepositoryResult<Vec<u8>>;

    /// 读取最近一次运行清单
    async fn load_manifest(&self) -> RepositoryResult<ArtifactManifest>;
}

// ==========================================
// FsReportRepository - 文件系统实现
// ==========================================
pub struct FsReportRepository {
    output_dir: PathBuf,
}

impl FsReportRepository {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn artifact_path(&self, kind: ReportKind) -> PathBuf {
        self.output_dir.join(kind.file_name())
    }

    fn staging_dir(&self, run_id: &str) -> PathBuf {
        self.output_dir.join(format!(".staging-{}", run_id))
    }

    async fn write_file(path: &Path, content: &[u8]) -> RepositoryResult<()> {
        tokio::fs::write(path, content)
            .await
            .map_err(|e| RepositoryError::io(path, e))
    }

    async fn rename(from: &Path, to: &Path) -> RepositoryResult<()> {
        tokio::fs::rename(from, to)
            .await
            .map_err(|e| RepositoryError::io(to, e))
    }

    async fn retract_manifest(&self) -> RepositoryResult<()> {
        let path = self.output_dir.join(MANIFEST_FILE_NAME);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RepositoryError::io(&path, e)),
        }
    }

    async fn stage_and_commit(
        &self,
        staging: &Path,
        run_id: &str,
        artifacts: &[ReportArtifact],
    ) -> RepositoryResult<ArtifactManifest> {
        // 阶段1: 全部写入暂存目录
        let mut entries = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            let file_name = artifact.kind.file_name();
            Self::write_file(&staging.join(&file_name), &artifact.content).await?;
            entries.push(ArtifactEntry {
                kind: artifact.kind,
                file_name,
                bytes: artifact.content.len(),
            });
        }

        let manifest = ArtifactManifest {
            run_id: run_id.to_string(),
            created_at: Utc::now(),
            artifacts: entries,
        };
        let manifest_bytes = serde_json::to_vec_pretty(&manifest)?;
        Self::write_file(&staging.join(MANIFEST_FILE_NAME), &manifest_bytes).await?;

        // 阶段2: 撤下旧清单,逐个改名覆盖,清单最后提交
        self.retract_manifest().await?;
        for entry in &manifest.artifacts {
            Self::rename(
                &staging.join(&entry.file_name),
                &self.output_dir.join(&entry.file_name),
            )
            .await?;
        }
        Self::rename(
            &staging.join(MANIFEST_FILE_NAME),
            &self.output_dir.join(MANIFEST_FILE_NAME),
        )
        .await?;

        Ok(manifest)
    }
}

#[async_trait]
impl ReportRepository for FsReportRepository {
    async fn save_artifacts(
        &self,
        run_id: &str,
        artifacts: Vec<ReportArtifact>,
    ) -> RepositoryResult<ArtifactManifest> {
        let staging = self.staging_dir(run_id);
        tokio::fs::create_dir_all(&staging)
            .await
            .map_err(|e| RepositoryError::io(&staging, e))?;

        let result = self.stage_and_commit(&staging, run_id, &artifacts).await;

        if let Err(e) = tokio::fs::remove_dir_all(&staging).await {
            warn!(path = %staging.display(), error = %e, "暂存目录清理失败");
        }

        let manifest = result?;
        info!(
            run_id = %run_id,
            output_dir = %self.output_dir.display(),
            artifact_count = manifest.artifacts.len(),
            "报表产物已落盘"
        );
        Ok(manifest)
    }

    async fn load_artifact(&self, kind: ReportKind) -> RepositoryResult<Vec<u8>> {
        let not_found = || RepositoryError::NotFound {
            entity: "ReportArtifact".to_string(),
            id: kind.file_name(),
        };

        let manifest = match self.load_manifest().await {
            Ok(manifest) => manifest,
            Err(RepositoryError::NotFound { .. }) => return Err(not_found()),
            Err(e) => return Err(e),
        };
        if !manifest.artifacts.iter().any(|entry| entry.kind == kind) {
            return Err(not_found());
        }

        let path = self.artifact_path(kind);
        debug!(path = %path.display(), run_id = %manifest.run_id, "读取报表产物");

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found()),
            Err(e) => Err(RepositoryError::io(&path, e)),
        }
    }

    async fn load_manifest(&self) -> RepositoryResult<ArtifactManifest> {
        let path = self.output_dir.join(MANIFEST_FILE_NAME);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RepositoryError::NotFound {
                    entity: "ArtifactManifest".to_string(),
                    id: MANIFEST_FILE_NAME.to_string(),
                })
            }
            Err(e) => return Err(RepositoryError::io(&path, e)),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}
