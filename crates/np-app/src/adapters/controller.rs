//! Widget-level adapter over [`PreferencesCoordinator`].
//!
//! Each method corresponds to one control of the notation preferences
//! pane and only translates raw widget values (checkbox state, popup index,
//! stepper value, text fields) into coordinator requests.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use np_core::{
    encryption::{EncryptionPhase, MismatchResolution},
    prefs::{PrefsChange, SyncFrequency},
    storage::{QueueDecision, StorageFormat},
    verification::RequestId,
    NotationPrefs, SecretString,
};

use crate::coordinator::PreferencesCoordinator;
use crate::error::CoordinatorError;

/// Enabled/visible state of the pane's controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlsState {
    pub encryption_checked: bool,
    pub change_passphrase_enabled: bool,
    pub storage_format_index: usize,
    pub separate_file_controls_enabled: bool,
    pub sync_controls_enabled: bool,
    pub sync_encryption_alert_visible: bool,
    pub remove_from_keychain_enabled: bool,
    pub verification_label: String,
    pub mismatch_pending: bool,
}

pub struct PrefsController {
    coordinator: Arc<PreferencesCoordinator>,
}

impl PrefsController {
    pub fn new(coordinator: Arc<PreferencesCoordinator>) -> Self {
        Self { coordinator }
    }

    pub fn coordinator(&self) -> &Arc<PreferencesCoordinator> {
        &self.coordinator
    }

    /// Snapshot used to refresh every control at once.
    pub async fn controls_state(&self) -> Result<ControlsState, CoordinatorError> {
        let phase = self.coordinator.encryption_phase().await;
        let format = self.coordinator.storage_format().await;
        let prefs = self.coordinator.preferences().await?;
        let encrypted = phase.state().is_enabled();

        Ok(ControlsState {
            encryption_checked: matches!(
                phase,
                EncryptionPhase::Enabled | EncryptionPhase::EnablingPending
            ),
            change_passphrase_enabled: phase == EncryptionPhase::Enabled,
            storage_format_index: format.index(),
            separate_file_controls_enabled: format.uses_separate_files(),
            sync_controls_enabled: prefs.sync.enabled,
            sync_encryption_alert_visible: prefs.sync_encryption_alert(encrypted),
            remove_from_keychain_enabled: prefs.has_sync_account(),
            verification_label: self.coordinator.verification_status().await.label(),
            mismatch_pending: self.coordinator.pending_mismatch().await.is_some(),
        })
    }

    // ---- encryption ----

    /// The encryption checkbox was clicked.
    ///
    /// Checking opens the passphrase picker. Unchecking asks for
    /// confirmation first unless the disable warning is turned off; the UI
    /// answers with [`Self::confirmed_disable_encryption`].
    pub async fn toggled_encryption(
        &self,
        checked: bool,
    ) -> Result<EncryptionPhase, CoordinatorError> {
        debug!(checked, "encryption checkbox toggled");
        if checked {
            self.coordinator.begin_enable_encryption().await
        } else {
            self.coordinator.disable_encryption(false).await
        }
    }

    pub async fn confirmed_disable_encryption(&self) -> Result<EncryptionPhase, CoordinatorError> {
        self.coordinator.disable_encryption(true).await
    }

    pub async fn passphrase_picked(
        &self,
        passphrase: String,
    ) -> Result<EncryptionPhase, CoordinatorError> {
        self.coordinator
            .submit_passphrase(SecretString::new(passphrase))
            .await
    }

    pub async fn passphrase_picker_cancelled(&self) -> Result<EncryptionPhase, CoordinatorError> {
        self.coordinator.cancel_enable_encryption().await
    }

    pub async fn change_passphrase(
        &self,
        old: String,
        new: String,
    ) -> Result<EncryptionPhase, CoordinatorError> {
        self.coordinator
            .change_passphrase(SecretString::new(old), SecretString::new(new))
            .await
    }

    /// Answer of the encryption/format mismatch sheet.
    pub async fn mismatch_sheet_ended(
        &self,
        disable_encryption: bool,
    ) -> Result<EncryptionPhase, CoordinatorError> {
        let resolution = if disable_encryption {
            MismatchResolution::DisableEncryption
        } else {
            MismatchResolution::KeepEncryption
        };
        self.coordinator.resolve_mismatch(resolution).await
    }

    // ---- storage format ----

    pub async fn changed_file_storage_format(
        &self,
        index: usize,
    ) -> Result<QueueDecision, CoordinatorError> {
        let target = StorageFormat::from_index(index).ok_or(CoordinatorError::InvalidSelection {
            control: "storage format",
            index,
        })?;
        self.coordinator.request_format_change(target).await
    }

    // ---- file kinds ----

    pub async fn added_extension(&self, raw: String) -> Result<NotationPrefs, CoordinatorError> {
        self.coordinator
            .edit_preferences(PrefsChange::AddExtension(raw))
            .await
    }

    pub async fn removed_extension(&self, raw: String) -> Result<NotationPrefs, CoordinatorError> {
        self.coordinator
            .edit_preferences(PrefsChange::RemoveExtension(raw))
            .await
    }

    pub async fn added_type(&self, raw: String) -> Result<NotationPrefs, CoordinatorError> {
        self.coordinator
            .edit_preferences(PrefsChange::AddFileType(raw))
            .await
    }

    pub async fn removed_type(&self, raw: String) -> Result<NotationPrefs, CoordinatorError> {
        self.coordinator
            .edit_preferences(PrefsChange::RemoveFileType(raw))
            .await
    }

    // ---- misc settings ----

    pub async fn changed_key_length(&self, bits: u32) -> Result<NotationPrefs, CoordinatorError> {
        self.coordinator
            .edit_preferences(PrefsChange::SetKeyLength(bits))
            .await
    }

    pub async fn changed_file_deletion_warning(
        &self,
        checked: bool,
    ) -> Result<NotationPrefs, CoordinatorError> {
        self.coordinator
            .edit_preferences(PrefsChange::SetConfirmNoteDeletion(checked))
            .await
    }

    pub async fn changed_secure_text_entry(
        &self,
        checked: bool,
    ) -> Result<NotationPrefs, CoordinatorError> {
        self.coordinator
            .edit_preferences(PrefsChange::SetSecureTextEntry(checked))
            .await
    }

    // ---- sync ----

    pub async fn toggled_syncing(&self, checked: bool) -> Result<NotationPrefs, CoordinatorError> {
        if !checked {
            self.coordinator.cancel_verification().await;
        }
        self.coordinator
            .edit_preferences(PrefsChange::SetSyncEnabled(checked))
            .await
    }

    pub async fn sync_frequency_changed(
        &self,
        index: usize,
    ) -> Result<NotationPrefs, CoordinatorError> {
        let frequency = SyncFrequency::from_index(index).ok_or(CoordinatorError::InvalidSelection {
            control: "sync frequency",
            index,
        })?;
        self.coordinator
            .edit_preferences(PrefsChange::SetSyncFrequency(frequency))
            .await
    }

    /// The account or password field was edited.
    pub async fn sync_fields_edited(&self, account: &str, password: String) -> Option<RequestId> {
        self.coordinator
            .schedule_verification(account, SecretString::new(password))
            .await
    }

    /// The account or password field lost focus with a final value.
    pub async fn sync_fields_committed(
        &self,
        account: &str,
        password: String,
    ) -> Result<NotationPrefs, CoordinatorError> {
        self.coordinator
            .commit_sync_credentials(account, SecretString::new(password))
            .await
    }

    pub async fn remove_from_keychain(&self) -> Result<NotationPrefs, CoordinatorError> {
        self.coordinator.remove_sync_credentials().await
    }
}
