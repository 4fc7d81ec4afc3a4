//! Errors - エラー型と分類
//!
//! どのエラーも lister / deleter の境界を越えて上に伝播しない。
//! 呼び出し側には `PageOutcome` と `DeleteReport` の中身として見える。

use serde::Serialize;
use thiserror::Error;

/// Failure of a single call against the artifact API.
///
/// `Clone + PartialEq` so that reports can carry and compare causes.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("API returned unexpected status {0}")]
    UnexpectedStatus(u16),

    /// HTTP 429. Kept apart from other statuses so it shows up in reports,
    /// but it is not retried.
    #[error("API rate limit hit (429)")]
    RateLimited,

    #[error("failed to decode API response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Classify a non-success status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => ApiError::RateLimited,
            other => ApiError::UnexpectedStatus(other),
        }
    }
}

/// Startup configuration error. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is missing")]
    MissingVar(&'static str),

    #[error("repository must look like owner/name, got {0:?}")]
    InvalidRepository(String),

    #[error("invalid API base URL {0:?}")]
    InvalidApiBase(String),
}

/// Listing aborted on a failed page (strict listing only).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to fetch page {page}: {source}")]
pub struct ListError {
    pub page: u32,
    #[source]
    pub source: ApiError,
}
