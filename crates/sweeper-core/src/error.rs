use thiserror::Error;

use crate::domain::ConfigError;

/// Errors that stop a purge before it starts.
#[derive(Debug, Error)]
pub enum SweeperError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}
