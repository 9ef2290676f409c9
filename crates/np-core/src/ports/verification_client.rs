use async_trait::async_trait;
use thiserror::Error;

use crate::security::SecretString;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("sync service unreachable: {0}")]
    Unreachable(String),

    #[error("unexpected response from sync service: {0}")]
    Protocol(String),

    #[error("network error: {0}")]
    Other(String),
}

/// One login check against the remote sync service.
///
/// Cancellation is done by aborting the task that awaits `verify`.
#[async_trait]
pub trait VerificationClientPort: Send + Sync {
    /// `Ok(true)` when the service accepted the login, `Ok(false)` when it
    /// rejected it.
    async fn verify(&self, account: &str, secret: &SecretString) -> Result<bool, NetworkError>;
}
