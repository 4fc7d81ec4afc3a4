//! BoundedDeleter - 同時実行数を制限した一括削除
//!
//! # 設計
//! - gate: `Semaphore(W)`。slot を取ってから spawn するので、dispatch は入力順
//! - permit は spawn したタスクが所有し、成功・失敗どちらでも drop で返却される
//! - 完了バリア: `JoinSet` を最後まで drain する
//! - shutdown（watch）は「まだ dispatch していないもの」だけを止める。
//!   実行中の削除はキャンセルしない

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, watch};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::domain::{ApiError, Artifact, DeleteFailure, DeleteReport, DeleteState};
use crate::ports::ArtifactApi;

pub struct BoundedDeleter {
    api: Arc<dyn ArtifactApi>,
    max_workers: usize,
}

impl BoundedDeleter {
    /// `max_workers` of zero is treated as one.
    pub fn new(api: Arc<dyn ArtifactApi>, max_workers: usize) -> Self {
        Self {
            api,
            max_workers: max_workers.max(1),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// One delete attempt. The error is logged and returned, never retried.
    pub async fn delete_one(&self, artifact: &Artifact) -> Result<(), ApiError> {
        delete_one(self.api.as_ref(), artifact).await
    }

    /// Delete every artifact, at most `max_workers` at a time.
    ///
    /// Returns once every artifact has had exactly one attempt.
    pub async fn delete_all(&self, artifacts: Vec<Artifact>) -> DeleteReport {
        // sender を保持しておけば shutdown は来ない
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        self.delete_all_until(artifacts, shutdown_rx).await
    }

    /// Like `delete_all`, but stops dispatching once `shutdown` turns true.
    ///
    /// Artifacts not yet dispatched at that point are reported as skipped;
    /// deletes already in flight still run to completion.
    pub async fn delete_all_until(
        &self,
        artifacts: Vec<Artifact>,
        mut shutdown: watch::Receiver<bool>,
    ) -> DeleteReport {
        let mut report = DeleteReport::default();
        if artifacts.is_empty() {
            return report;
        }

        let gate = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = JoinSet::new();
        // panic したタスクの artifact を特定するため
        let mut dispatched: HashMap<tokio::task::Id, Artifact> = HashMap::new();

        let mut pending = artifacts.into_iter();
        while let Some(artifact) = pending.next() {
            let Some(permit) = wait_for_slot(&gate, &mut shutdown).await else {
                info!(
                    remaining = pending.len() + 1,
                    "shutdown requested, not dispatching remaining deletes"
                );
                report.skipped.push(artifact.id);
                report.skipped.extend(pending.by_ref().map(|a| a.id));
                break;
            };

            let api = Arc::clone(&self.api);
            let task_artifact = artifact.clone();
            let handle = tasks.spawn(async move {
                let _permit = permit;
                let result = delete_one(api.as_ref(), &task_artifact).await;
                (task_artifact, result)
            });
            dispatched.insert(handle.id(), artifact);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, (_, Ok(())))) => report.deleted += 1,
                Ok((_, (artifact, Err(cause)))) => report.failed.push(DeleteFailure {
                    id: artifact.id,
                    name: artifact.name,
                    cause,
                }),
                Err(join_err) => {
                    let artifact = dispatched.remove(&join_err.id());
                    warn!(error = %join_err, "delete task did not complete");
                    if let Some(artifact) = artifact {
                        report.failed.push(DeleteFailure {
                            id: artifact.id,
                            name: artifact.name,
                            cause: ApiError::Transport(join_err.to_string()),
                        });
                    }
                }
            }
        }

        info!(
            deleted = report.deleted,
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "delete batch finished"
        );
        report
    }
}

async fn delete_one(api: &dyn ArtifactApi, artifact: &Artifact) -> Result<(), ApiError> {
    info!(id = %artifact.id, name = %artifact.name, state = %DeleteState::InFlight, "deleting artifact");
    match api.delete_artifact(artifact.id).await {
        Ok(()) => {
            info!(id = %artifact.id, state = %DeleteState::Deleted, "artifact deleted");
            Ok(())
        }
        Err(err) => {
            warn!(id = %artifact.id, state = %DeleteState::Failed, error = %err, "failed to delete artifact");
            Err(err)
        }
    }
}

/// Wait for a gate slot. `None` once shutdown has been requested.
async fn wait_for_slot(
    gate: &Arc<Semaphore>,
    shutdown: &mut watch::Receiver<bool>,
) -> Option<OwnedSemaphorePermit> {
    loop {
        if *shutdown.borrow_and_update() {
            return None;
        }
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() {
                    // sender が drop された: 以後 shutdown は来ない
                    return Arc::clone(gate).acquire_owned().await.ok();
                }
            }
            permit = Arc::clone(gate).acquire_owned() => return permit.ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ArtifactId;
    use crate::impls::InMemoryArtifactApi;
    use std::time::Duration;
    use tokio::time::{Instant, timeout};

    fn deleter(api: &Arc<InMemoryArtifactApi>, workers: usize) -> BoundedDeleter {
        BoundedDeleter::new(api.clone(), workers)
    }

    /// Failed and skipped IDs, sorted.
    fn not_deleted(report: &DeleteReport) -> Vec<ArtifactId> {
        let mut ids = report.failed_ids();
        ids.extend(report.skipped.iter().copied());
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn empty_input_does_no_network_activity() {
        let api = Arc::new(InMemoryArtifactApi::with_generated(3));

        let report = deleter(&api, 4).delete_all(vec![]).await;

        assert_eq!(report, DeleteReport::default());
        assert_eq!(api.delete_calls(), 0);
    }

    #[tokio::test]
    async fn deletes_everything() {
        let api = Arc::new(InMemoryArtifactApi::with_generated(25));
        let artifacts = api.remaining();

        let report = deleter(&api, 10).delete_all(artifacts).await;

        assert_eq!(report.deleted, 25);
        assert!(report.is_clean());
        assert!(api.remaining().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn never_exceeds_worker_count() {
        let api = Arc::new(InMemoryArtifactApi::with_generated(10).holding_deletes());
        let artifacts = api.remaining();
        let d = deleter(&api, 3);

        let run = tokio::spawn(async move { d.delete_all(artifacts).await });

        // 3 件が gate を通過して止まるまで待つ
        let deadline = Instant::now() + Duration::from_secs(5);
        while api.in_flight() < 3 && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(api.in_flight(), 3);
        assert_eq!(api.delete_calls(), 3);

        // 1 件ずつ開放しても同時実行数は 3 を超えない
        for _ in 0..10 {
            api.release_deletes(1);
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert!(api.in_flight() <= 3);
        }

        let report = timeout(Duration::from_secs(5), run).await.unwrap().unwrap();
        assert_eq!(report.deleted, 10);
        assert_eq!(api.max_in_flight(), 3);
    }

    #[tokio::test]
    async fn waits_for_slow_deletes_even_when_others_fail_fast() {
        let slow = ArtifactId::new(1);
        let mut api = InMemoryArtifactApi::with_generated(6)
            .with_slow_delete(slow, Duration::from_millis(300));
        for id in 2..=6 {
            api = api.with_delete_failure(ArtifactId::new(id), ApiError::UnexpectedStatus(500));
        }
        let api = Arc::new(api);
        let artifacts = api.remaining();

        let started = Instant::now();
        let report = deleter(&api, 6).delete_all(artifacts).await;

        assert!(started.elapsed() >= Duration::from_millis(300));
        assert_eq!(report.deleted, 1);
        assert_eq!(report.failed.len(), 5);
        assert_eq!(api.deleted_ids(), vec![slow]);
        assert_eq!(api.in_flight(), 0);
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_batch() {
        let api = Arc::new(
            InMemoryArtifactApi::with_generated(10)
                .with_delete_failure(ArtifactId::new(5), ApiError::UnexpectedStatus(404)),
        );
        let artifacts = api.remaining();

        let report = deleter(&api, 3).delete_all(artifacts).await;

        assert_eq!(api.delete_calls(), 10);
        assert_eq!(report.deleted, 9);
        assert_eq!(report.attempted(), 10);
        assert_eq!(
            report.failed,
            vec![DeleteFailure {
                id: ArtifactId::new(5),
                name: "artifact-5".to_string(),
                cause: ApiError::UnexpectedStatus(404),
            }]
        );
        assert_eq!(api.remaining(), vec![Artifact::new(5, "artifact-5")]);
    }

    #[tokio::test]
    async fn rate_limited_delete_is_reported_distinctly() {
        let api = Arc::new(
            InMemoryArtifactApi::with_generated(2)
                .with_delete_failure(ArtifactId::new(2), ApiError::RateLimited),
        );
        let artifacts = api.remaining();

        let report = deleter(&api, 2).delete_all(artifacts).await;

        assert_eq!(report.failed[0].cause, ApiError::RateLimited);
        // リトライしない
        assert_eq!(api.delete_calls(), 2);
    }

    #[tokio::test]
    async fn zero_workers_still_makes_progress() {
        let api = Arc::new(InMemoryArtifactApi::with_generated(3));
        let artifacts = api.remaining();

        let d = deleter(&api, 0);
        assert_eq!(d.max_workers(), 1);
        let report = d.delete_all(artifacts).await;

        assert_eq!(report.deleted, 3);
        assert_eq!(api.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn shutdown_before_start_skips_everything() {
        let api = Arc::new(InMemoryArtifactApi::with_generated(4));
        let artifacts = api.remaining();
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let report = deleter(&api, 2).delete_all_until(artifacts, rx).await;

        assert_eq!(api.delete_calls(), 0);
        assert_eq!(report.deleted, 0);
        assert_eq!(not_deleted(&report), (1..=4).map(ArtifactId::new).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn shutdown_mid_batch_lets_in_flight_finish() {
        let api = Arc::new(InMemoryArtifactApi::with_generated(8).holding_deletes());
        let artifacts = api.remaining();
        let (tx, rx) = watch::channel(false);
        let d = deleter(&api, 2);

        let run = tokio::spawn(async move { d.delete_all_until(artifacts, rx).await });

        let deadline = Instant::now() + Duration::from_secs(5);
        while api.in_flight() < 2 && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tx.send(true).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        api.release_deletes(2);

        let report = timeout(Duration::from_secs(5), run).await.unwrap().unwrap();
        assert_eq!(report.deleted, 2);
        assert_eq!(report.skipped.len(), 6);
        assert_eq!(api.delete_calls(), 2);
        assert_eq!(api.remaining().len(), 6);
    }

    #[tokio::test]
    async fn dropped_shutdown_sender_is_not_a_shutdown() {
        let api = Arc::new(InMemoryArtifactApi::with_generated(5));
        let artifacts = api.remaining();
        let (tx, rx) = watch::channel(false);
        drop(tx);

        let report = deleter(&api, 2).delete_all_until(artifacts, rx).await;

        assert_eq!(report.deleted, 5);
        assert!(report.is_clean());
    }
}
