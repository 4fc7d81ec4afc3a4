//! Purger - 一覧取得から一括削除までのパイプライン
//!
//! configuration → ArtifactLister::fetch_all → (空なら終了) → BoundedDeleter::delete_all

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use super::{ArtifactLister, BoundedDeleter};
use crate::config::Config;
use crate::domain::{DeleteReport, PurgeSummary};
use crate::error::SweeperError;
use crate::impls::GithubClient;
use crate::ports::ArtifactApi;

pub struct Purger {
    repository: String,
    lister: ArtifactLister,
    deleter: BoundedDeleter,
    dry_run: bool,
}

impl Purger {
    /// Lister and deleter sharing one `api`.
    pub fn new(api: Arc<dyn ArtifactApi>, config: &Config) -> Self {
        Self {
            repository: config.repository.clone(),
            lister: ArtifactLister::new(Arc::clone(&api)),
            deleter: BoundedDeleter::new(api, config.max_workers),
            dry_run: false,
        }
    }

    /// Purger talking to the GitHub API described by `config`.
    pub fn github(config: &Config) -> Result<Self, SweeperError> {
        let client = GithubClient::new(config)?;
        Ok(Self::new(Arc::new(client), config))
    }

    /// List only; nothing is deleted.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn lister(&self) -> &ArtifactLister {
        &self.lister
    }

    pub fn deleter(&self) -> &BoundedDeleter {
        &self.deleter
    }

    /// Run the pipeline to completion.
    pub async fn run(&self) -> PurgeSummary {
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        self.run_until(shutdown_rx).await
    }

    /// Run the pipeline; `shutdown` stops dispatching further deletes.
    pub async fn run_until(&self, shutdown: watch::Receiver<bool>) -> PurgeSummary {
        info!(repository = %self.repository, "target repository");
        info!(max_workers = self.deleter.max_workers(), "max workers");

        let artifacts = self.lister.fetch_all().await;
        let mut summary = PurgeSummary {
            repository: self.repository.clone(),
            found: artifacts.len(),
            dry_run: self.dry_run,
            report: DeleteReport::default(),
        };

        if artifacts.is_empty() {
            info!("no artifacts found");
            return summary;
        }
        info!(count = artifacts.len(), "found artifacts");

        if self.dry_run {
            for artifact in &artifacts {
                info!(id = %artifact.id, name = %artifact.name, "would delete");
            }
            return summary;
        }

        summary.report = self.deleter.delete_all_until(artifacts, shutdown).await;
        summary
    }
}
