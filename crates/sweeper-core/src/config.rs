//! Config - 起動時に一度だけ読み込む設定
//!
//! プロセス全体のグローバル変数にはせず、`Config` を値として各コンポーネントに渡す。
//! 環境変数の読み出しは `lookup` 関数に抽象化してあり、テストでは HashMap を使う。

use std::path::Path;
use std::time::Duration;

use reqwest::Url;

use crate::domain::ConfigError;

pub const ENV_TOKEN: &str = "DA_TOKEN";
pub const ENV_REPO: &str = "DA_REPO";
pub const ENV_MAX_WORKERS: &str = "DA_MAX_WORKERS";
pub const ENV_API_BASE: &str = "DA_API_BASE";
pub const ENV_TIMEOUT_SECS: &str = "DA_TIMEOUT_SECS";

pub const DEFAULT_MAX_WORKERS: usize = 10;
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct Config {
    pub token: String,
    /// `owner/name`
    pub repository: String,
    pub max_workers: usize,
    pub api_base: String,
    pub request_timeout: Duration,
}

// token を Debug 出力に載せない
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("repository", &self.repository)
            .field("max_workers", &self.max_workers)
            .field("api_base", &self.api_base)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Config {
    /// Config with defaults for everything but the two required values.
    pub fn new(token: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            repository: repository.into(),
            max_workers: DEFAULT_MAX_WORKERS,
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup` (key -> value).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = required(&lookup, ENV_TOKEN)?;
        let repository = required(&lookup, ENV_REPO)?;
        validate_repository(&repository)?;

        let api_base = lookup(ENV_API_BASE)
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        if Url::parse(&api_base).is_err() {
            return Err(ConfigError::InvalidApiBase(api_base));
        }

        Ok(Self {
            token,
            repository,
            max_workers: parse_max_workers(lookup(ENV_MAX_WORKERS).as_deref()),
            api_base,
            request_timeout: parse_timeout(lookup(ENV_TIMEOUT_SECS).as_deref()),
        })
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(key))
}

fn validate_repository(repository: &str) -> Result<(), ConfigError> {
    match repository.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(())
        }
        _ => Err(ConfigError::InvalidRepository(repository.to_string())),
    }
}

/// Worker count. Unset, unparsable or non-positive values fall back to the default.
pub fn parse_max_workers(raw: Option<&str>) -> usize {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(DEFAULT_MAX_WORKERS)
}

/// Per-request timeout in seconds, same fallback rule as the worker count.
pub fn parse_timeout(raw: Option<&str>) -> Duration {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .map(|n| Duration::from_secs(n.unsigned_abs()))
        .unwrap_or(DEFAULT_TIMEOUT)
}

/// Load a `.env` file into the process environment.
///
/// With no path, `.env` in the working directory is used if it exists. A missing
/// default file is not an error; a missing explicit file is. Variables already
/// set in the environment are not overridden.
pub fn load_dotenv(path: Option<&Path>) -> Result<(), dotenvy::Error> {
    match path {
        Some(path) => dotenvy::from_path(path),
        None => match dotenvy::dotenv() {
            Ok(_) => Ok(()),
            Err(err) if err.not_found() => Ok(()),
            Err(err) => Err(err),
        },
    }
}
