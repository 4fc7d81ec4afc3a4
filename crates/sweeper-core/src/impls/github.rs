//! GithubClient - GitHub REST API 実装
//!
//! reqwest（rustls）で Actions の artifact API を叩く。
//! タイムアウトは Client 単位で設定し、全リクエストに効かせる。

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use tracing::debug;

use crate::config::Config;
use crate::domain::{ApiError, Artifact, ArtifactId, ListingPage};
use crate::error::SweeperError;
use crate::ports::ArtifactApi;

const GITHUB_JSON: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";
// GitHub は User-Agent のないリクエストを拒否する
const USER_AGENT: &str = concat!("artifact-sweeper/", env!("CARGO_PKG_VERSION"));

/// Artifact API client for one repository.
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
    repository: String,
    token: String,
}

impl GithubClient {
    pub fn new(config: &Config) -> Result<Self, SweeperError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SweeperError::Client(e.to_string()))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            repository: config.repository.clone(),
            token: config.token.clone(),
        })
    }

    pub fn artifacts_url(&self) -> String {
        format!("{}/repos/{}/actions/artifacts", self.api_base, self.repository)
    }

    pub fn artifact_url(&self, id: ArtifactId) -> String {
        format!("{}/{}", self.artifacts_url(), id)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.token)
            .header(ACCEPT, GITHUB_JSON)
            .header(API_VERSION_HEADER, API_VERSION)
    }
}

fn classify(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Transport(err.to_string())
    }
}

#[async_trait]
impl ArtifactApi for GithubClient {
    async fn list_page(&self, page: u32) -> Result<Vec<Artifact>, ApiError> {
        let url = self.artifacts_url();
        debug!(%url, page, "GET artifacts page");

        let resp = self
            .request(reqwest::Method::GET, &url)
            .query(&[("page", page)])
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16()));
        }

        let body: ListingPage = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Decode(e.to_string())
            }
        })?;
        Ok(body.artifacts)
    }

    async fn delete_artifact(&self, id: ArtifactId) -> Result<(), ApiError> {
        let url = self.artifact_url(id);
        debug!(%url, "DELETE artifact");

        let resp = self
            .request(reqwest::Method::DELETE, &url)
            .send()
            .await
            .map_err(classify)?;

        match resp.status() {
            StatusCode::NO_CONTENT => Ok(()),
            other => Err(ApiError::from_status(other.as_u16())),
        }
    }
}
