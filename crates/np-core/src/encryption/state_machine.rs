//! Encryption state machine.
//!
//! Defines a pure transition function for enabling, disabling and re-keying
//! at-rest encryption. Side effects are returned as actions; their results
//! come back as events.

use crate::encryption::{DisableWarningPolicy, EncryptionError, EncryptionPhase, EncryptionState};

/// Events that drive encryption transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptionEvent {
    // User requests
    BeginEnable,
    SubmitPassphrase { empty: bool },
    CancelEnable,
    DisableRequested { confirmed: bool },
    ChangePassphraseRequested { new_empty: bool },

    // Results (from orchestrator)
    CredentialSaved,
    CredentialStoreFailed { reason: String },
    StatePersisted,
    StatePersistFailed { reason: String },
    PlaintextRewritten,
    PlaintextRewriteFailed { reason: String },
    CredentialDeleted,
    CredentialDeleteFailed { reason: String },
    PassphraseReplaced,
    PassphraseRejected,
}

/// Side-effects produced by transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptionAction {
    /// Save the captured passphrase in the credential store.
    SaveCredential,
    /// Write the encryption state into the store's metadata marker.
    PersistState(EncryptionState),
    /// Rewrite every note as plaintext.
    RewritePlaintext,
    /// Delete the passphrase from the credential store.
    DeleteCredential,
    /// Best-effort delete after a failed enable; produces no event.
    DiscardCredential,
    /// Verify the old passphrase against the stored one, then overwrite it.
    ReplaceCredential,
    /// Surface an error to the caller and the observers.
    Report(EncryptionError),
}

pub struct EncryptionStateMachine {
    policy: DisableWarningPolicy,
}

impl EncryptionStateMachine {
    pub fn new(policy: DisableWarningPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DisableWarningPolicy {
        self.policy
    }

    pub fn transition(
        &self,
        phase: EncryptionPhase,
        event: EncryptionEvent,
    ) -> (EncryptionPhase, Vec<EncryptionAction>) {
        use EncryptionAction as A;
        use EncryptionEvent as E;
        use EncryptionPhase as P;

        match (phase, event) {
            // ---- enable ----
            (P::Disabled, E::BeginEnable) => (P::EnablingPending, Vec::new()),
            (P::EnablingPending, E::BeginEnable) => (P::EnablingPending, Vec::new()),
            (P::EnablingPending, E::SubmitPassphrase { empty: true }) => (
                P::EnablingPending,
                vec![A::Report(EncryptionError::PassphraseEmpty)],
            ),
            (P::EnablingPending, E::SubmitPassphrase { empty: false }) => {
                (P::EnablingPending, vec![A::SaveCredential])
            }
            (P::EnablingPending, E::CancelEnable) => (P::Disabled, Vec::new()),
            (P::EnablingPending, E::CredentialSaved) => (
                P::EnablingPending,
                vec![A::PersistState(EncryptionState::Enabled)],
            ),
            (P::EnablingPending, E::CredentialStoreFailed { reason }) => (
                P::Disabled,
                vec![A::Report(EncryptionError::CredentialStore(reason))],
            ),
            (P::EnablingPending, E::StatePersisted) => (P::Enabled, Vec::new()),
            (P::EnablingPending, E::StatePersistFailed { reason }) => (
                P::Disabled,
                vec![
                    A::DiscardCredential,
                    A::Report(EncryptionError::MetadataWriteFailed(reason)),
                ],
            ),

            // ---- disable ----
            (P::Enabled, E::DisableRequested { confirmed }) => {
                if !confirmed && self.policy == DisableWarningPolicy::Always {
                    return (
                        P::Enabled,
                        vec![A::Report(EncryptionError::ConfirmationRequired)],
                    );
                }
                (P::DisablingPending, vec![A::RewritePlaintext])
            }
            (P::DisablingPending, E::PlaintextRewritten) => (
                P::DisablingPending,
                vec![A::PersistState(EncryptionState::Disabled)],
            ),
            (P::DisablingPending, E::PlaintextRewriteFailed { reason }) => (
                P::Enabled,
                vec![A::Report(EncryptionError::StorageRewriteFailed(reason))],
            ),
            // Notes are plaintext but the marker still says Enabled. The
            // phase follows the notes; the stale marker is left to the
            // mismatch resolution.
            (P::DisablingPending, E::StatePersistFailed { reason }) => (
                P::DisablingPending,
                vec![
                    A::Report(EncryptionError::MetadataWriteFailed(reason)),
                    A::DeleteCredential,
                ],
            ),
            (P::DisablingPending, E::StatePersisted) => {
                (P::DisablingPending, vec![A::DeleteCredential])
            }
            (P::DisablingPending, E::CredentialDeleted) => (P::Disabled, Vec::new()),
            // Notes are already plaintext; the phase follows the disk.
            (P::DisablingPending, E::CredentialDeleteFailed { reason }) => (
                P::Disabled,
                vec![A::Report(EncryptionError::CredentialStore(reason))],
            ),

            // ---- change passphrase ----
            (P::Enabled, E::ChangePassphraseRequested { new_empty: true }) => (
                P::Enabled,
                vec![A::Report(EncryptionError::PassphraseEmpty)],
            ),
            (P::Enabled, E::ChangePassphraseRequested { new_empty: false }) => {
                (P::Enabled, vec![A::ReplaceCredential])
            }
            (P::Enabled, E::PassphraseReplaced) => (P::Enabled, Vec::new()),
            (P::Enabled, E::PassphraseRejected) => (
                P::Enabled,
                vec![A::Report(EncryptionError::InvalidCredential)],
            ),
            (P::Enabled, E::CredentialStoreFailed { reason }) => (
                P::Enabled,
                vec![A::Report(EncryptionError::CredentialStore(reason))],
            ),

            // ---- requests in the wrong phase ----
            (phase, E::BeginEnable) => Self::reject(phase, "enable encryption"),
            (phase, E::SubmitPassphrase { .. }) => Self::reject(phase, "submit a passphrase"),
            (phase, E::CancelEnable) => Self::reject(phase, "cancel enabling encryption"),
            (phase, E::DisableRequested { .. }) => Self::reject(phase, "disable encryption"),
            (phase, E::ChangePassphraseRequested { .. }) => {
                Self::reject(phase, "change the passphrase")
            }

            // Results that do not belong to the current phase are ignored.
            (phase, _event) => (phase, Vec::new()),
        }
    }

    fn reject(phase: EncryptionPhase, request: &str) -> (EncryptionPhase, Vec<EncryptionAction>) {
        (
            phase,
            vec![EncryptionAction::Report(EncryptionError::invalid_transition(
                phase, request,
            ))],
        )
    }
}
