use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encryption::EncryptionPhase;
use crate::storage::StorageFormat;

/// Outcomes of encryption requests that the caller must see.
///
/// `ConfirmationRequired` and `InvalidCredential` are user-in-the-loop
/// conditions rather than failures; the rest leave the state machine in the
/// phase it reports through `on_encryption_state_changed`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum EncryptionError {
    #[error("disabling encryption rewrites every note as plaintext and must be confirmed")]
    ConfirmationRequired,

    #[error("credential store failure: {0}")]
    CredentialStore(String),

    #[error("failed to rewrite notes as plaintext: {0}")]
    StorageRewriteFailed(String),

    #[error("the current passphrase is incorrect")]
    InvalidCredential,

    #[error("passphrase must not be empty")]
    PassphraseEmpty,

    #[error("failed to record encryption state in store metadata: {0}")]
    MetadataWriteFailed(String),

    #[error("cannot {request} while encryption is {phase}")]
    InvalidTransition {
        phase: EncryptionPhase,
        request: String,
    },

    #[error("{0} cannot hold encrypted notes")]
    FormatUnsupported(StorageFormat),

    #[error("no encryption mismatch is awaiting resolution")]
    NoPendingMismatch,
}

impl EncryptionError {
    pub fn invalid_transition(phase: EncryptionPhase, request: &str) -> Self {
        EncryptionError::InvalidTransition {
            phase,
            request: request.to_string(),
        }
    }

    /// Whether the condition asks the user to act rather than reporting a
    /// failure of the store or keychain.
    pub fn is_user_gate(&self) -> bool {
        matches!(
            self,
            EncryptionError::ConfirmationRequired
                | EncryptionError::InvalidCredential
                | EncryptionError::PassphraseEmpty
        )
    }
}
