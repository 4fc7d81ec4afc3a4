//! Outcome model: what a page fetch or a delete batch produced.
//!
//! ページ取得は「続きがある / 終わり / 失敗」の三値で表す。
//! 空ページと取得失敗を区別できるようにしておき、どう扱うかは呼び出し側が決める。

use serde::Serialize;

use super::{ApiError, Artifact, ArtifactId};

/// Result of fetching one listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// A non-empty page.
    Items(Vec<Artifact>),
    /// An empty page: no more data.
    End,
    /// The page could not be fetched or decoded.
    Failed(ApiError),
}

impl PageOutcome {
    /// Map a raw page result. An empty page means end of data.
    pub fn from_result(result: Result<Vec<Artifact>, ApiError>) -> Self {
        match result {
            Ok(items) if items.is_empty() => PageOutcome::End,
            Ok(items) => PageOutcome::Items(items),
            Err(err) => PageOutcome::Failed(err),
        }
    }
}

/// One artifact that could not be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteFailure {
    pub id: ArtifactId,
    pub name: String,
    pub cause: ApiError,
}

/// What a delete batch did.
///
/// Every input artifact ends up in exactly one of `deleted` (as a count),
/// `failed` or `skipped`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub deleted: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<DeleteFailure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<ArtifactId>,
}

impl DeleteReport {
    /// Number of artifacts that got a delete attempt.
    pub fn attempted(&self) -> usize {
        self.deleted + self.failed.len()
    }

    /// Nothing failed and nothing was skipped.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    /// IDs of failed artifacts, sorted.
    pub fn failed_ids(&self) -> Vec<ArtifactId> {
        let mut ids: Vec<ArtifactId> = self.failed.iter().map(|f| f.id).collect();
        ids.sort();
        ids
    }
}

/// Summary of one purge run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurgeSummary {
    pub repository: String,
    pub found: usize,
    pub dry_run: bool,
    pub report: DeleteReport,
}
