use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use np_core::{
    encryption::{EncryptionError, EncryptionMismatch, EncryptionPhase},
    ports::PreferencesEventPort,
    storage::{ConversionFailed, StorageFormat},
    VerificationStatus,
};

/// Observer notifications in a form the UI can subscribe to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum PreferencesEvent {
    EncryptionStateChanged {
        phase: EncryptionPhase,
    },
    EncryptionError {
        error: EncryptionError,
    },
    EncryptionMismatch {
        mismatch: EncryptionMismatch,
    },
    FormatChangeResult {
        target: StorageFormat,
        result: Result<(), ConversionFailed>,
    },
    VerificationStatusChanged {
        status: VerificationStatus,
    },
}

/// [`PreferencesEventPort`] backed by a broadcast channel.
///
/// Events sent while nobody is subscribed are dropped. A slow subscriber
/// that falls more than `capacity` events behind sees `Lagged`.
#[derive(Clone)]
pub struct ChannelEventPort {
    sender: broadcast::Sender<PreferencesEvent>,
}

impl ChannelEventPort {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PreferencesEvent> {
        self.sender.subscribe()
    }

    fn publish(&self, event: PreferencesEvent) {
        if self.sender.send(event).is_err() {
            debug!("no preferences event subscribers");
        }
    }
}

impl Default for ChannelEventPort {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl PreferencesEventPort for ChannelEventPort {
    async fn on_encryption_state_changed(&self, phase: EncryptionPhase) {
        self.publish(PreferencesEvent::EncryptionStateChanged { phase });
    }

    async fn on_encryption_error(&self, error: EncryptionError) {
        self.publish(PreferencesEvent::EncryptionError { error });
    }

    async fn on_encryption_mismatch(&self, mismatch: EncryptionMismatch) {
        self.publish(PreferencesEvent::EncryptionMismatch { mismatch });
    }

    async fn on_format_change_result(
        &self,
        target: StorageFormat,
        result: Result<(), ConversionFailed>,
    ) {
        self.publish(PreferencesEvent::FormatChangeResult { target, result });
    }

    async fn on_verification_status_changed(&self, status: VerificationStatus) {
        self.publish(PreferencesEvent::VerificationStatusChanged { status });
    }
}
