use std::sync::Arc;

use np_core::{EncryptionPhase, SecretString};
use tokio::sync::Mutex;

/// Secret material captured for the duration of one dispatch.
#[derive(Debug)]
pub enum CapturedSecret {
    /// Passphrase entered in the picker while enabling.
    Passphrase(SecretString),
    /// Old and new passphrase entered in the changer.
    Replacement { old: SecretString, new: SecretString },
}

/// Shared encryption context containing phase, captured secret and dispatch
/// lock.
///
/// ## Lock Ordering
/// When acquiring several locks, acquire `dispatch_lock` first, then
/// `captured`, then `phase`.
/// - `dispatch_lock`: Used only for `dispatch` operations to serialize concurrent calls.
/// - `phase`: Used for both reading (`get_phase`) and writing (during `dispatch`).
pub struct EncryptionContext {
    phase: Mutex<EncryptionPhase>,
    /// Cleared at the end of every dispatch so secrets never outlive the
    /// transition that needed them.
    captured: Mutex<Option<CapturedSecret>>,
    /// Serializes dispatch calls. The whole transition + execute_actions +
    /// phase update runs under this lock.
    dispatch_lock: Mutex<()>,
}

impl EncryptionContext {
    pub fn new(initial_phase: EncryptionPhase) -> Self {
        Self {
            phase: Mutex::new(initial_phase),
            captured: Mutex::new(None),
            dispatch_lock: Mutex::new(()),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Does NOT acquire `dispatch_lock`.
    pub async fn get_phase(&self) -> EncryptionPhase {
        *self.phase.lock().await
    }

    pub async fn acquire_dispatch_lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.dispatch_lock.lock().await
    }

    /// Only call after acquiring `dispatch_lock`.
    pub async fn set_phase(&self, phase: EncryptionPhase) {
        *self.phase.lock().await = phase;
    }

    pub async fn capture(&self, secret: CapturedSecret) {
        *self.captured.lock().await = Some(secret);
    }

    pub async fn take_captured(&self) -> Option<CapturedSecret> {
        self.captured.lock().await.take()
    }

    pub async fn clear_captured(&self) {
        self.captured.lock().await.take();
    }
}
