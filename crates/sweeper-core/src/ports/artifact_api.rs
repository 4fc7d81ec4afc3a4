//! ArtifactApi port - CI サービスの artifact API
//!
//! HTTP の詳細（URL、ヘッダ、ステータスコード）は実装側に閉じ込める。
//! lister / deleter はこの trait だけを見る。

use async_trait::async_trait;

use crate::domain::{ApiError, Artifact, ArtifactId};

/// Remote artifact API for one repository.
///
/// # 実装
/// - `GithubClient`: GitHub REST API（本番用）
/// - `InMemoryArtifactApi`: テスト・開発用
#[async_trait]
pub trait ArtifactApi: Send + Sync {
    /// Fetch one 1-based listing page. An empty vec means there is no such page.
    async fn list_page(&self, page: u32) -> Result<Vec<Artifact>, ApiError>;

    /// Delete one artifact. `Ok` only when the service confirmed the deletion.
    async fn delete_artifact(&self, id: ArtifactId) -> Result<(), ApiError>;
}
