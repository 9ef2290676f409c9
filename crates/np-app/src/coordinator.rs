//! Preferences coordinator.
//!
//! Composes the encryption orchestrator, the format migration orchestrator,
//! the verification scheduler and the preference use cases, and enforces
//! the encryption/format mismatch gate between them.
//!
//! ## Mismatch gate
//!
//! While a mismatch is recorded the migration queue is held: format
//! changes are parked in the pending slot and nothing converts until the
//! user resolves the mismatch. A failed resolution keeps the gate closed.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, info_span, warn, Instrument};

use np_core::{
    encryption::{
        EncryptionError, EncryptionMismatch, EncryptionPhase, EncryptionState, MismatchKind,
        MismatchResolution,
    },
    ports::{
        CredentialStorePort, DocumentStorePort, FormatConverterPort, PreferencesEventPort,
        PreferencesRepositoryPort, VerificationClientPort,
    },
    prefs::PrefsChange,
    storage::{QueueDecision, StorageFormat},
    verification::RequestId,
    NotationPrefs, SecretString, VerificationStatus,
};

use crate::error::CoordinatorError;
use crate::policy::CoordinatorPolicy;
use crate::usecases::{
    EditPreferences, EncryptionOrchestrator, FormatMigrationOrchestrator, SyncCredentials,
    VerificationScheduler,
};

/// External collaborators of one coordinator.
#[derive(Clone)]
pub struct Collaborators {
    pub credentials: Arc<dyn CredentialStorePort>,
    pub converter: Arc<dyn FormatConverterPort>,
    pub verifier: Arc<dyn VerificationClientPort>,
    pub store: Arc<dyn DocumentStorePort>,
    pub preferences: Arc<dyn PreferencesRepositoryPort>,
    pub events: Arc<dyn PreferencesEventPort>,
}

/// The single contract consumed by the preferences UI. One per document
/// store.
pub struct PreferencesCoordinator {
    encryption: EncryptionOrchestrator,
    migration: FormatMigrationOrchestrator,
    verification: VerificationScheduler,
    edit_preferences: EditPreferences,
    sync_credentials: SyncCredentials,
    events: Arc<dyn PreferencesEventPort>,

    /// Recorded mismatch. Also serializes the checks between encryption
    /// and format requests.
    gate: Mutex<Option<EncryptionMismatch>>,
}

impl PreferencesCoordinator {
    /// Read the store metadata and build a coordinator in the matching
    /// state.
    pub async fn load(
        policy: CoordinatorPolicy,
        collaborators: Collaborators,
    ) -> Result<Self, CoordinatorError> {
        let metadata = collaborators
            .store
            .load_metadata()
            .await
            .map_err(CoordinatorError::StoreMetadata)?;
        info!(
            encryption = %metadata.encryption,
            format = %metadata.format,
            "loaded document store metadata"
        );

        let coordinator = Self {
            encryption: EncryptionOrchestrator::new(
                EncryptionPhase::from(metadata.encryption),
                policy.disable_warning,
                policy.passphrase_account.clone(),
                collaborators.credentials.clone(),
                collaborators.store.clone(),
                collaborators.events.clone(),
            ),
            migration: FormatMigrationOrchestrator::new(
                metadata.format,
                collaborators.converter.clone(),
                collaborators.store.clone(),
                collaborators.events.clone(),
            ),
            verification: VerificationScheduler::new(
                collaborators.verifier.clone(),
                collaborators.events.clone(),
                policy.verification,
            ),
            edit_preferences: EditPreferences::new(collaborators.preferences.clone()),
            sync_credentials: SyncCredentials::new(
                collaborators.credentials.clone(),
                collaborators.preferences.clone(),
            ),
            events: collaborators.events,
            gate: Mutex::new(None),
        };

        if metadata.encryption.is_enabled() && !metadata.format.supports_encryption() {
            warn!(format = %metadata.format, "store is encrypted in a format that cannot hold encrypted notes");
            let mut gate = coordinator.gate.lock().await;
            coordinator
                .record_mismatch(
                    &mut gate,
                    EncryptionMismatch::unsupported_format(metadata.format),
                )
                .await;
        }

        Ok(coordinator)
    }

    // ---- state ----

    pub async fn encryption_phase(&self) -> EncryptionPhase {
        self.encryption.phase().await
    }

    pub async fn storage_format(&self) -> StorageFormat {
        self.migration.current_format().await
    }

    /// Format the store will have once queued conversions finish.
    pub async fn eventual_storage_format(&self) -> StorageFormat {
        self.migration.snapshot().await.eventual_format()
    }

    pub async fn pending_mismatch(&self) -> Option<EncryptionMismatch> {
        *self.gate.lock().await
    }

    pub async fn verification_status(&self) -> VerificationStatus {
        self.verification.status().await
    }

    pub async fn preferences(&self) -> Result<NotationPrefs, CoordinatorError> {
        Ok(self.edit_preferences.current().await?)
    }

    /// Whether the "synced notes are not encrypted" alert should show.
    pub async fn sync_encryption_alert(&self) -> Result<bool, CoordinatorError> {
        let prefs = self.preferences().await?;
        let encrypted = self.encryption_phase().await.state().is_enabled();
        Ok(prefs.sync_encryption_alert(encrypted))
    }

    // ---- encryption ----

    pub async fn enable_encryption(
        &self,
        passphrase: SecretString,
    ) -> Result<EncryptionPhase, CoordinatorError> {
        let _gate = self.gate.lock().await;
        self.ensure_formats_support_encryption().await?;
        Ok(self.encryption.enable(passphrase).await?)
    }

    /// Open the passphrase picker. Follow with [`Self::submit_passphrase`]
    /// or [`Self::cancel_enable_encryption`].
    pub async fn begin_enable_encryption(&self) -> Result<EncryptionPhase, CoordinatorError> {
        let _gate = self.gate.lock().await;
        self.ensure_formats_support_encryption().await?;
        Ok(self.encryption.begin_enable().await?)
    }

    pub async fn submit_passphrase(
        &self,
        passphrase: SecretString,
    ) -> Result<EncryptionPhase, CoordinatorError> {
        Ok(self.encryption.submit_passphrase(passphrase).await?)
    }

    pub async fn cancel_enable_encryption(&self) -> Result<EncryptionPhase, CoordinatorError> {
        Ok(self.encryption.cancel_enable().await?)
    }

    pub async fn disable_encryption(
        &self,
        confirmed: bool,
    ) -> Result<EncryptionPhase, CoordinatorError> {
        // Format requests wait until the plaintext rewrite is done.
        let mut gate = self.gate.lock().await;
        let result = self.encryption.disable(confirmed).await;
        if let Err(err) = &result {
            self.flag_stale_marker(&mut gate, err).await;
        }
        Ok(result?)
    }

    pub async fn change_passphrase(
        &self,
        old: SecretString,
        new: SecretString,
    ) -> Result<EncryptionPhase, CoordinatorError> {
        Ok(self.encryption.change_passphrase(old, new).await?)
    }

    // ---- storage format ----

    /// Queue a storage-format change.
    ///
    /// A target that cannot hold encrypted notes while encryption is on (or
    /// being turned on) records a mismatch and parks the change until
    /// [`Self::resolve_mismatch`].
    pub async fn request_format_change(
        &self,
        target: StorageFormat,
    ) -> Result<QueueDecision, CoordinatorError> {
        let span = info_span!("usecase.coordinator.request_format_change", %target);
        async {
            let mut gate = self.gate.lock().await;
            let phase = self.encryption.phase().await;

            if gate.is_none() && phase.requires_encrypting_format() && !target.supports_encryption()
            {
                warn!(%phase, %target, "format change conflicts with encryption");
                self.record_mismatch(&mut gate, EncryptionMismatch::unsupported_format(target))
                    .await;
            }

            Ok(self.migration.request_change(target).await)
        }
        .instrument(span)
        .await
    }

    /// Resolves once no conversion is running.
    pub async fn wait_for_format_idle(&self) {
        self.migration.wait_until_idle().await;
    }

    // ---- mismatch ----

    /// The document store found its notes in `on_disk` state. Returns the
    /// recorded mismatch, or `None` when it agrees with the current phase.
    pub async fn report_store_mismatch(
        &self,
        on_disk: EncryptionState,
    ) -> Result<Option<EncryptionMismatch>, CoordinatorError> {
        let mut gate = self.gate.lock().await;
        let advertised = self.encryption.phase().await.state();
        if advertised == on_disk {
            return Ok(None);
        }

        let mismatch = EncryptionMismatch::store_reported(advertised, on_disk);
        warn!(advertised = %advertised, on_disk = %on_disk, "store reported encryption mismatch");
        self.record_mismatch(&mut gate, mismatch).await;
        Ok(Some(mismatch))
    }

    pub async fn resolve_mismatch(
        &self,
        resolution: MismatchResolution,
    ) -> Result<EncryptionPhase, CoordinatorError> {
        let span = info_span!("usecase.coordinator.resolve_mismatch", resolution = ?resolution);
        async {
            let mut gate = self.gate.lock().await;
            let Some(mismatch) = *gate else {
                let err = EncryptionError::NoPendingMismatch;
                self.events.on_encryption_error(err.clone()).await;
                return Err(err.into());
            };

            match resolution {
                MismatchResolution::DisableEncryption => {
                    if let Err(err) = self.resolve_by_disabling(mismatch).await {
                        if let Some(encryption_err) = err.as_encryption() {
                            self.flag_stale_marker(&mut gate, encryption_err).await;
                        }
                        return Err(err);
                    }
                }
                MismatchResolution::KeepEncryption => {
                    self.migration.discard_pending().await;
                }
            }

            *gate = None;
            self.migration.release().await;
            let phase = self.encryption.phase().await;
            info!(%phase, "encryption mismatch resolved");
            Ok(phase)
        }
        .instrument(span)
        .await
    }

    // ---- verification ----

    pub async fn schedule_verification(
        &self,
        account: &str,
        secret: SecretString,
    ) -> Option<RequestId> {
        self.verification.schedule(account, secret).await
    }

    pub async fn cancel_verification(&self) {
        self.verification.cancel().await;
    }

    // ---- preferences ----

    pub async fn edit_preferences(
        &self,
        change: PrefsChange,
    ) -> Result<NotationPrefs, CoordinatorError> {
        Ok(self.edit_preferences.execute(change).await?)
    }

    /// Store the sync login and verify it.
    pub async fn commit_sync_credentials(
        &self,
        account: &str,
        password: SecretString,
    ) -> Result<NotationPrefs, CoordinatorError> {
        let prefs = self.sync_credentials.commit(account, &password).await?;
        self.verification.schedule(account, password).await;
        Ok(prefs)
    }

    pub async fn remove_sync_credentials(&self) -> Result<NotationPrefs, CoordinatorError> {
        self.verification.cancel().await;
        Ok(self.sync_credentials.remove().await?)
    }

    pub async fn stored_sync_password(&self) -> Result<Option<SecretString>, CoordinatorError> {
        Ok(self.sync_credentials.stored_password().await?)
    }

    // ---- internals ----

    async fn ensure_formats_support_encryption(&self) -> Result<(), CoordinatorError> {
        let queue = self.migration.snapshot().await;
        let formats = [
            Some(queue.current()),
            queue.active().map(|ticket| ticket.to),
            queue.pending(),
        ];
        if let Some(format) = formats
            .into_iter()
            .flatten()
            .find(|format| !format.supports_encryption())
        {
            let err = EncryptionError::FormatUnsupported(format);
            self.events.on_encryption_error(err.clone()).await;
            return Err(err.into());
        }
        Ok(())
    }

    async fn record_mismatch(
        &self,
        gate: &mut Option<EncryptionMismatch>,
        mismatch: EncryptionMismatch,
    ) {
        *gate = Some(mismatch);
        self.migration.hold(None).await;
        self.events.on_encryption_mismatch(mismatch).await;
    }

    /// A disable that rewrote the notes but could not save the Disabled
    /// marker leaves the store saying Enabled. Keep the gate closed on that
    /// until the marker is rewritten.
    async fn flag_stale_marker(
        &self,
        gate: &mut Option<EncryptionMismatch>,
        err: &EncryptionError,
    ) {
        if !matches!(err, EncryptionError::MetadataWriteFailed(_)) {
            return;
        }
        if self.encryption.phase().await != EncryptionPhase::Disabled {
            return;
        }
        warn!("encryption marker still reads enabled after disabling");
        self.record_mismatch(
            gate,
            EncryptionMismatch::store_reported(EncryptionState::Disabled, EncryptionState::Enabled),
        )
        .await;
    }

    async fn resolve_by_disabling(&self, mismatch: EncryptionMismatch) -> Result<(), CoordinatorError> {
        match self.encryption.phase().await {
            EncryptionPhase::Enabled => {
                self.encryption.disable(true).await?;
            }
            EncryptionPhase::EnablingPending => {
                self.encryption.cancel_enable().await?;
            }
            EncryptionPhase::Disabled => {
                if matches!(
                    mismatch.kind,
                    MismatchKind::StoreReported {
                        on_disk: EncryptionState::Enabled
                    }
                ) {
                    self.encryption.rewrite_plaintext_while_disabled().await?;
                }
            }
            phase @ EncryptionPhase::DisablingPending => {
                let err = EncryptionError::invalid_transition(phase, "resolve the mismatch");
                self.events.on_encryption_error(err.clone()).await;
                return Err(err.into());
            }
        }
        Ok(())
    }
}
