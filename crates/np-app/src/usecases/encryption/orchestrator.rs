//! Encryption orchestrator.
//!
//! This module runs the encryption state machine and executes its side
//! effects against the credential store and the document store.

use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};

use np_core::{
    encryption::{
        DisableWarningPolicy, EncryptionAction, EncryptionError, EncryptionEvent, EncryptionPhase,
        EncryptionState, EncryptionStateMachine,
    },
    ports::{CredentialStoreError, CredentialStorePort, DocumentStorePort, PreferencesEventPort},
    SecretString,
};

use crate::usecases::encryption::context::{CapturedSecret, EncryptionContext};

#[derive(Default)]
struct ActionOutcome {
    follow_up: Vec<EncryptionEvent>,
    reported: Vec<EncryptionError>,
}

/// Orchestrator that drives the encryption phase and its side effects.
pub struct EncryptionOrchestrator {
    context: Arc<EncryptionContext>,
    machine: EncryptionStateMachine,
    passphrase_account: String,

    credentials: Arc<dyn CredentialStorePort>,
    store: Arc<dyn DocumentStorePort>,
    events: Arc<dyn PreferencesEventPort>,
}

impl EncryptionOrchestrator {
    pub fn new(
        initial_phase: EncryptionPhase,
        policy: DisableWarningPolicy,
        passphrase_account: String,
        credentials: Arc<dyn CredentialStorePort>,
        store: Arc<dyn DocumentStorePort>,
        events: Arc<dyn PreferencesEventPort>,
    ) -> Self {
        Self {
            context: EncryptionContext::new(initial_phase).arc(),
            machine: EncryptionStateMachine::new(policy),
            passphrase_account,
            credentials,
            store,
            events,
        }
    }

    pub async fn phase(&self) -> EncryptionPhase {
        self.context.get_phase().await
    }

    /// Open the passphrase picker.
    pub async fn begin_enable(&self) -> Result<EncryptionPhase, EncryptionError> {
        self.dispatch(EncryptionEvent::BeginEnable, None).await
    }

    pub async fn submit_passphrase(
        &self,
        passphrase: SecretString,
    ) -> Result<EncryptionPhase, EncryptionError> {
        let event = EncryptionEvent::SubmitPassphrase {
            empty: passphrase.is_empty(),
        };
        self.dispatch(event, Some(CapturedSecret::Passphrase(passphrase)))
            .await
    }

    /// Close the picker without a passphrase.
    pub async fn cancel_enable(&self) -> Result<EncryptionPhase, EncryptionError> {
        self.dispatch(EncryptionEvent::CancelEnable, None).await
    }

    /// `begin_enable` followed by `submit_passphrase`.
    ///
    /// An empty passphrase leaves the phase where it was instead of stranding
    /// it in `EnablingPending`.
    pub async fn enable(&self, passphrase: SecretString) -> Result<EncryptionPhase, EncryptionError> {
        if passphrase.is_empty() {
            self.events
                .on_encryption_error(EncryptionError::PassphraseEmpty)
                .await;
            return Err(EncryptionError::PassphraseEmpty);
        }
        self.begin_enable().await?;
        self.submit_passphrase(passphrase).await
    }

    pub async fn disable(&self, confirmed: bool) -> Result<EncryptionPhase, EncryptionError> {
        self.dispatch(EncryptionEvent::DisableRequested { confirmed }, None)
            .await
    }

    pub async fn change_passphrase(
        &self,
        old: SecretString,
        new: SecretString,
    ) -> Result<EncryptionPhase, EncryptionError> {
        let event = EncryptionEvent::ChangePassphraseRequested {
            new_empty: new.is_empty(),
        };
        self.dispatch(event, Some(CapturedSecret::Replacement { old, new }))
            .await
    }

    /// Rewrite the store as plaintext while the phase is already `Disabled`.
    ///
    /// Used when the store reports encrypted notes that the preferences do
    /// not know about.
    pub async fn rewrite_plaintext_while_disabled(&self) -> Result<(), EncryptionError> {
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;
        let span = info_span!("usecase.encryption_orchestrator.rewrite_plaintext");

        async {
            let phase = self.context.get_phase().await;
            if phase != EncryptionPhase::Disabled {
                let err = EncryptionError::invalid_transition(phase, "rewrite notes as plaintext");
                self.events.on_encryption_error(err.clone()).await;
                return Err(err);
            }

            let result = match self.store.rewrite_plaintext().await {
                Ok(()) => self
                    .store
                    .persist_encryption_state(EncryptionState::Disabled)
                    .await,
                Err(err) => Err(err),
            };

            if let Err(err) = result {
                warn!(error = %err, "plaintext rewrite failed");
                let err = EncryptionError::StorageRewriteFailed(format!("{err:#}"));
                self.events.on_encryption_error(err.clone()).await;
                return Err(err);
            }

            info!("store rewritten as plaintext");
            Ok(())
        }
        .instrument(span)
        .await
    }

    async fn dispatch(
        &self,
        event: EncryptionEvent,
        captured: Option<CapturedSecret>,
    ) -> Result<EncryptionPhase, EncryptionError> {
        // Serialize concurrent dispatch calls so two requests never act on
        // the same phase.
        let _dispatch_guard = self.context.acquire_dispatch_lock().await;
        if let Some(secret) = captured {
            self.context.capture(secret).await;
        }

        let span = info_span!("usecase.encryption_orchestrator.dispatch", event = ?event);
        let result = async {
            let mut current = self.context.get_phase().await;
            let mut pending_events = vec![event];
            let mut reported = Vec::new();

            while let Some(event) = pending_events.pop() {
                let from = current;
                let event_name = format!("{:?}", event);
                let (next, actions) = self.machine.transition(current, event);
                info!(from = %from, to = %next, event = %event_name, "encryption phase transition");

                // The phase is published before its side effects run so that
                // observers see DisablingPending while the rewrite is going.
                self.set_phase_and_emit(from, next).await;
                current = next;

                let outcome = self.execute_actions(actions).await;
                pending_events.extend(outcome.follow_up);
                reported.extend(outcome.reported);
            }

            for err in &reported {
                self.events.on_encryption_error(err.clone()).await;
            }

            match reported.into_iter().next() {
                Some(err) => Err(err),
                None => Ok(current),
            }
        }
        .instrument(span)
        .await;

        self.context.clear_captured().await;
        result
    }

    async fn execute_actions(&self, actions: Vec<EncryptionAction>) -> ActionOutcome {
        let mut outcome = ActionOutcome::default();
        for action in actions {
            debug!(?action, "encryption executing action");
            match action {
                EncryptionAction::SaveCredential => {
                    outcome.follow_up.push(self.save_captured_passphrase().await);
                }
                EncryptionAction::PersistState(state) => {
                    let event = match self.store.persist_encryption_state(state).await {
                        Ok(()) => EncryptionEvent::StatePersisted,
                        Err(err) => {
                            warn!(error = %err, %state, "failed to persist encryption marker");
                            EncryptionEvent::StatePersistFailed {
                                reason: format!("{err:#}"),
                            }
                        }
                    };
                    outcome.follow_up.push(event);
                }
                EncryptionAction::RewritePlaintext => {
                    let event = match self.store.rewrite_plaintext().await {
                        Ok(()) => EncryptionEvent::PlaintextRewritten,
                        Err(err) => {
                            warn!(error = %err, "plaintext rewrite failed");
                            EncryptionEvent::PlaintextRewriteFailed {
                                reason: format!("{err:#}"),
                            }
                        }
                    };
                    outcome.follow_up.push(event);
                }
                EncryptionAction::DeleteCredential => {
                    let event = match self.credentials.delete(&self.passphrase_account).await {
                        Ok(()) => EncryptionEvent::CredentialDeleted,
                        Err(err) => {
                            warn!(error = %err, "failed to delete passphrase");
                            EncryptionEvent::CredentialDeleteFailed {
                                reason: err.to_string(),
                            }
                        }
                    };
                    outcome.follow_up.push(event);
                }
                EncryptionAction::DiscardCredential => {
                    if let Err(err) = self.credentials.delete(&self.passphrase_account).await {
                        warn!(error = %err, "failed to discard passphrase after aborted enable");
                    }
                }
                EncryptionAction::ReplaceCredential => {
                    outcome.follow_up.push(self.replace_passphrase().await);
                }
                EncryptionAction::Report(err) => {
                    outcome.reported.push(err);
                }
            }
        }
        outcome
    }

    async fn save_captured_passphrase(&self) -> EncryptionEvent {
        let passphrase = match self.context.take_captured().await {
            Some(CapturedSecret::Passphrase(passphrase)) => passphrase,
            _ => {
                return EncryptionEvent::CredentialStoreFailed {
                    reason: "no passphrase was captured".to_string(),
                }
            }
        };

        match self
            .credentials
            .save(&self.passphrase_account, &passphrase)
            .await
        {
            Ok(()) => EncryptionEvent::CredentialSaved,
            Err(err) => {
                warn!(error = %err, "failed to save passphrase");
                EncryptionEvent::CredentialStoreFailed {
                    reason: err.to_string(),
                }
            }
        }
    }

    async fn replace_passphrase(&self) -> EncryptionEvent {
        let (old, new) = match self.context.take_captured().await {
            Some(CapturedSecret::Replacement { old, new }) => (old, new),
            _ => {
                return EncryptionEvent::CredentialStoreFailed {
                    reason: "no passphrase change was captured".to_string(),
                }
            }
        };

        let stored = match self.credentials.retrieve(&self.passphrase_account).await {
            Ok(stored) => stored,
            Err(CredentialStoreError::NotFound) => {
                warn!("encryption is enabled but no passphrase is stored");
                return EncryptionEvent::CredentialStoreFailed {
                    reason: CredentialStoreError::NotFound.to_string(),
                };
            }
            Err(err) => {
                return EncryptionEvent::CredentialStoreFailed {
                    reason: err.to_string(),
                }
            }
        };

        if !stored.matches(&old) {
            info!("passphrase change rejected: current passphrase does not match");
            return EncryptionEvent::PassphraseRejected;
        }

        match self.credentials.save(&self.passphrase_account, &new).await {
            Ok(()) => {
                info!("passphrase replaced");
                EncryptionEvent::PassphraseReplaced
            }
            Err(err) => EncryptionEvent::CredentialStoreFailed {
                reason: err.to_string(),
            },
        }
    }

    async fn set_phase_and_emit(&self, from: EncryptionPhase, to: EncryptionPhase) {
        self.context.set_phase(to).await;
        if from != to {
            self.events.on_encryption_state_changed(to).await;
        }
    }
}
