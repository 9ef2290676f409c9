use np_core::EncryptionError;

use crate::usecases::{EditPreferencesError, SyncCredentialsError};

/// Errors returned by [`crate::PreferencesCoordinator`].
///
/// Encryption errors are also reported through `on_encryption_error`; the
/// rest only reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Encryption(#[from] EncryptionError),

    #[error(transparent)]
    Preferences(#[from] EditPreferencesError),

    #[error(transparent)]
    SyncCredentials(#[from] SyncCredentialsError),

    #[error("failed to load store metadata: {0:#}")]
    StoreMetadata(#[source] anyhow::Error),

    #[error("no {control} option at index {index}")]
    InvalidSelection { control: &'static str, index: usize },
}

impl CoordinatorError {
    pub fn as_encryption(&self) -> Option<&EncryptionError> {
        match self {
            CoordinatorError::Encryption(err) => Some(err),
            _ => None,
        }
    }
}
