//! InMemoryArtifactApi - 開発・テスト用の artifact API
//!
//! # 学習ポイント
//! - std Mutex は await を跨いで保持しない（guard はブロック内で drop）
//! - Semaphore(0) を「手動で開けるゲート」として使い、削除を任意のタイミングまで止める
//! - 同時実行数を AtomicUsize + fetch_max で観測する

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::domain::{ApiError, Artifact, ArtifactId};
use crate::ports::ArtifactApi;

/// GitHub のデフォルトと同じページサイズ
pub const DEFAULT_PAGE_SIZE: usize = 30;

#[derive(Default)]
struct Store {
    artifacts: Vec<Artifact>,
    deleted: Vec<ArtifactId>,
    page_failures: HashMap<u32, ApiError>,
    delete_failures: HashMap<ArtifactId, ApiError>,
    slow_deletes: HashMap<ArtifactId, Duration>,
}

/// In-memory artifact API.
///
/// Pages are slices of the seeded list in insertion order. A successful delete
/// removes the artifact; deleting an unknown ID answers 404 like the real API.
///
/// # 使用例
/// ```ignore
/// let api = InMemoryArtifactApi::new(artifacts)
///     .with_page_size(2)
///     .with_delete_failure(ArtifactId::new(5), ApiError::UnexpectedStatus(500));
/// ```
pub struct InMemoryArtifactApi {
    store: Mutex<Store>,
    page_size: usize,
    delete_delay: Duration,
    /// `Some` のとき、削除は permit が払い出されるまで待つ
    hold: Option<Arc<Semaphore>>,
    list_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl InMemoryArtifactApi {
    pub fn new(artifacts: Vec<Artifact>) -> Self {
        Self {
            store: Mutex::new(Store {
                artifacts,
                ..Store::default()
            }),
            page_size: DEFAULT_PAGE_SIZE,
            delete_delay: Duration::ZERO,
            hold: None,
            list_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// `count` artifacts with IDs `1..=count`.
    pub fn with_generated(count: u64) -> Self {
        Self::new(
            (1..=count)
                .map(|i| Artifact::new(i, format!("artifact-{i}")))
                .collect(),
        )
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Every delete sleeps this long before answering.
    pub fn with_delete_delay(mut self, delay: Duration) -> Self {
        self.delete_delay = delay;
        self
    }

    /// Delete of `id` sleeps `delay` instead of the default delay.
    pub fn with_slow_delete(self, id: ArtifactId, delay: Duration) -> Self {
        self.lock().slow_deletes.insert(id, delay);
        self
    }

    /// Listing `page` fails with `err`.
    pub fn with_page_failure(self, page: u32, err: ApiError) -> Self {
        self.lock().page_failures.insert(page, err);
        self
    }

    /// Deleting `id` fails with `err` (and the artifact stays).
    pub fn with_delete_failure(self, id: ArtifactId, err: ApiError) -> Self {
        self.lock().delete_failures.insert(id, err);
        self
    }

    /// Deletes block until `release_deletes` hands out permits.
    pub fn holding_deletes(mut self) -> Self {
        self.hold = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Let `n` held deletes proceed.
    pub fn release_deletes(&self, n: usize) {
        if let Some(hold) = &self.hold {
            hold.add_permits(n);
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Deletes currently running (including held ones).
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of deletes ever observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Artifacts still stored.
    pub fn remaining(&self) -> Vec<Artifact> {
        self.lock().artifacts.clone()
    }

    /// Successfully deleted IDs, in completion order.
    pub fn deleted_ids(&self) -> Vec<ArtifactId> {
        self.lock().deleted.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        // テスト中の panic で poison されても中身はそのまま使う
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Counts a delete as running for as long as it lives.
struct InFlightGuard<'a> {
    in_flight: &'a AtomicUsize,
}

impl<'a> InFlightGuard<'a> {
    fn enter(in_flight: &'a AtomicUsize, max_in_flight: &AtomicUsize) -> Self {
        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self { in_flight }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ArtifactApi for InMemoryArtifactApi {
    async fn list_page(&self, page: u32) -> Result<Vec<Artifact>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let store = self.lock();
        if let Some(err) = store.page_failures.get(&page) {
            return Err(err.clone());
        }
        if page == 0 {
            return Ok(Vec::new());
        }
        let start = (page as usize - 1).saturating_mul(self.page_size);
        Ok(store
            .artifacts
            .iter()
            .skip(start)
            .take(self.page_size)
            .cloned()
            .collect())
    }

    async fn delete_artifact(&self, id: ArtifactId) -> Result<(), ApiError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlightGuard::enter(&self.in_flight, &self.max_in_flight);

        if let Some(hold) = &self.hold {
            hold.acquire()
                .await
                .map_err(|e| ApiError::Transport(e.to_string()))?
                .forget();
        }

        let delay = {
            let store = self.lock();
            store
                .slow_deletes
                .get(&id)
                .copied()
                .unwrap_or(self.delete_delay)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut store = self.lock();
        if let Some(err) = store.delete_failures.get(&id) {
            return Err(err.clone());
        }
        match store.artifacts.iter().position(|a| a.id == id) {
            Some(idx) => {
                store.artifacts.remove(idx);
                store.deleted.push(id);
                Ok(())
            }
            None => Err(ApiError::UnexpectedStatus(404)),
        }
    }
}
