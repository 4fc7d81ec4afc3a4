//! ArtifactLister - ページングで artifact を全件取得
//!
//! # フロー
//! 1. page = 1 から開始
//! 2. fetch_page(page) → PageOutcome
//! 3. Items なら追加して page += 1、End なら終了
//! 4. Failed の扱いは呼び出し方で変わる
//!    - fetch_all: それまでの分を返して終了（lossy-but-available）
//!    - try_fetch_all: エラーを返す
//!
//! ページは 1 件ずつ逐次取得する（並列取得はしない）。

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{Artifact, ListError, PageOutcome};
use crate::ports::ArtifactApi;

pub struct ArtifactLister {
    api: Arc<dyn ArtifactApi>,
}

impl ArtifactLister {
    pub fn new(api: Arc<dyn ArtifactApi>) -> Self {
        Self { api }
    }

    /// Fetch one 1-based page.
    pub async fn fetch_page(&self, page: u32) -> PageOutcome {
        let outcome = PageOutcome::from_result(self.api.list_page(page).await);
        match &outcome {
            PageOutcome::Items(items) => debug!(page, count = items.len(), "fetched page"),
            PageOutcome::End => debug!(page, "empty page, listing exhausted"),
            PageOutcome::Failed(err) => warn!(page, error = %err, "failed to fetch page"),
        }
        outcome
    }

    /// Every artifact, in page order.
    ///
    /// Never fails: a page that cannot be fetched ends the listing and whatever
    /// was accumulated so far is returned.
    pub async fn fetch_all(&self) -> Vec<Artifact> {
        let mut artifacts = Vec::new();
        let mut page = 1;
        loop {
            match self.fetch_page(page).await {
                PageOutcome::Items(items) => artifacts.extend(items),
                PageOutcome::End => break,
                PageOutcome::Failed(_) => {
                    warn!(
                        page,
                        kept = artifacts.len(),
                        "stopping listing early, continuing with partial result"
                    );
                    break;
                }
            }
            page += 1;
        }
        artifacts
    }

    /// Like `fetch_all`, but a failed page aborts the listing.
    pub async fn try_fetch_all(&self) -> Result<Vec<Artifact>, ListError> {
        let mut artifacts = Vec::new();
        let mut page = 1;
        loop {
            match self.fetch_page(page).await {
                PageOutcome::Items(items) => artifacts.extend(items),
                PageOutcome::End => return Ok(artifacts),
                PageOutcome::Failed(source) => return Err(ListError { page, source }),
            }
            page += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ApiError, ArtifactId};
    use crate::impls::InMemoryArtifactApi;
    use rstest::rstest;

    fn lister(api: &Arc<InMemoryArtifactApi>) -> ArtifactLister {
        ArtifactLister::new(api.clone())
    }

    #[rstest]
    #[case::one_per_page(1)]
    #[case::small(3)]
    #[case::github_default(30)]
    #[tokio::test]
    async fn stops_on_first_empty_page(#[case] k: usize) {
        // pages [k, k, 0]
        let api = Arc::new(InMemoryArtifactApi::with_generated(2 * k as u64).with_page_size(k));

        let all = lister(&api).fetch_all().await;

        assert_eq!(all.len(), 2 * k);
        assert_eq!(api.list_calls(), 3);
    }

    #[tokio::test]
    async fn keeps_page_order() {
        let api = Arc::new(InMemoryArtifactApi::with_generated(7).with_page_size(3));

        let ids: Vec<u64> = lister(&api)
            .fetch_all()
            .await
            .into_iter()
            .map(|a| a.id.get())
            .collect();

        assert_eq!(ids, (1..=7).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn empty_repository_makes_one_request() {
        let api = Arc::new(InMemoryArtifactApi::new(vec![]));

        assert!(lister(&api).fetch_all().await.is_empty());
        assert_eq!(api.list_calls(), 1);
    }

    #[tokio::test]
    async fn failed_page_ends_listing_with_partial_result() {
        let api = Arc::new(
            InMemoryArtifactApi::with_generated(6)
                .with_page_size(2)
                .with_page_failure(2, ApiError::Transport("connection reset".to_string())),
        );

        let all = lister(&api).fetch_all().await;

        assert_eq!(
            all.iter().map(|a| a.id).collect::<Vec<_>>(),
            vec![ArtifactId::new(1), ArtifactId::new(2)]
        );
        assert_eq!(api.list_calls(), 2);
    }

    #[tokio::test]
    async fn failure_on_first_page_looks_like_nothing_found() {
        let api = Arc::new(
            InMemoryArtifactApi::with_generated(4).with_page_failure(1, ApiError::Timeout),
        );

        assert!(lister(&api).fetch_all().await.is_empty());
    }

    #[tokio::test]
    async fn strict_listing_surfaces_the_failed_page() {
        let api = Arc::new(
            InMemoryArtifactApi::with_generated(6)
                .with_page_size(2)
                .with_page_failure(2, ApiError::UnexpectedStatus(502)),
        );

        let err = lister(&api).try_fetch_all().await.unwrap_err();

        assert_eq!(
            err,
            ListError {
                page: 2,
                source: ApiError::UnexpectedStatus(502)
            }
        );
    }

    #[tokio::test]
    async fn strict_listing_succeeds_without_failures() {
        let api = Arc::new(InMemoryArtifactApi::with_generated(5).with_page_size(2));

        assert_eq!(lister(&api).try_fetch_all().await.unwrap().len(), 5);
        assert_eq!(api.list_calls(), 4);
    }

    #[tokio::test]
    async fn fetch_page_distinguishes_end_from_failure() {
        let api = Arc::new(
            InMemoryArtifactApi::with_generated(1).with_page_failure(5, ApiError::RateLimited),
        );
        let lister = lister(&api);

        assert!(matches!(lister.fetch_page(1).await, PageOutcome::Items(v) if v.len() == 1));
        assert_eq!(lister.fetch_page(2).await, PageOutcome::End);
        assert_eq!(
            lister.fetch_page(5).await,
            PageOutcome::Failed(ApiError::RateLimited)
        );
    }
}
