use async_trait::async_trait;

use crate::encryption::{EncryptionError, EncryptionMismatch, EncryptionPhase};
use crate::storage::{ConversionFailed, StorageFormat};
use crate::verification::VerificationStatus;

/// Observer hooks towards the preferences UI.
///
/// Every hook is fire-and-forget; implementations must not block.
#[async_trait]
pub trait PreferencesEventPort: Send + Sync {
    async fn on_encryption_state_changed(&self, phase: EncryptionPhase);

    async fn on_encryption_error(&self, error: EncryptionError);

    /// Ask the user how to resolve a mismatch between the advertised
    /// encryption state and the store.
    async fn on_encryption_mismatch(&self, mismatch: EncryptionMismatch);

    async fn on_format_change_result(
        &self,
        target: StorageFormat,
        result: Result<(), ConversionFailed>,
    );

    async fn on_verification_status_changed(&self, status: VerificationStatus);
}
