//! OS keychain credential store.
//!
//! The `keyring` crate is synchronous and may block on the platform
//! keychain (unlock prompts, D-Bus round trips), so every call runs on the
//! blocking pool.

use std::sync::Arc;

use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, warn};

use np_core::{
    ports::{CredentialStoreError, CredentialStorePort},
    SecretString,
};

const SERVICE_NAME: &str = "NotationPrefs";

pub trait KeyringEntryOps {
    fn get_secret(&self) -> Result<Vec<u8>, keyring::Error>;
    fn set_secret(&self, secret: &[u8]) -> Result<(), keyring::Error>;
    fn delete_credential(&self) -> Result<(), keyring::Error>;
}

/// Source of keychain entries. Swapped for an in-memory backend in tests.
pub trait KeyringBackend: Send + Sync + 'static {
    type Entry: KeyringEntryOps;
    fn new_entry(&self, service: &str, account: &str) -> Result<Self::Entry, keyring::Error>;
}

pub struct SystemBackend;

pub struct SystemEntry {
    inner: Entry,
}

impl KeyringEntryOps for SystemEntry {
    fn get_secret(&self) -> Result<Vec<u8>, keyring::Error> {
        self.inner.get_secret()
    }

    fn set_secret(&self, secret: &[u8]) -> Result<(), keyring::Error> {
        self.inner.set_secret(secret)
    }

    fn delete_credential(&self) -> Result<(), keyring::Error> {
        self.inner.delete_credential()
    }
}

impl KeyringBackend for SystemBackend {
    type Entry = SystemEntry;

    fn new_entry(&self, service: &str, account: &str) -> Result<Self::Entry, keyring::Error> {
        Entry::new(service, account).map(|inner| SystemEntry { inner })
    }
}

fn map_keyring_error(context: &str, err: keyring::Error) -> CredentialStoreError {
    match err {
        keyring::Error::NoEntry => CredentialStoreError::NotFound,
        keyring::Error::NoStorageAccess(e) => {
            CredentialStoreError::PermissionDenied(format!("{context}: {e}"))
        }
        keyring::Error::PlatformFailure(e) => {
            CredentialStoreError::Unavailable(format!("{context}: {e}"))
        }
        keyring::Error::BadEncoding(_) => {
            CredentialStoreError::Corrupt(format!("{context}: stored item is not valid UTF-8"))
        }
        other => CredentialStoreError::Other(format!("{context}: {other}")),
    }
}

fn entry_for<B: KeyringBackend>(
    backend: &B,
    service: &str,
    account: &str,
) -> Result<B::Entry, CredentialStoreError> {
    backend
        .new_entry(service, account)
        .map_err(|e| map_keyring_error("failed to access keychain entry", e))
}

fn retrieve_with_backend<B: KeyringBackend>(
    backend: &B,
    service: &str,
    account: &str,
) -> Result<SecretString, CredentialStoreError> {
    let bytes = entry_for(backend, service, account)?
        .get_secret()
        .map_err(|e| map_keyring_error("failed to read keychain item", e))?;
    String::from_utf8(bytes)
        .map(SecretString::new)
        .map_err(|_| CredentialStoreError::Corrupt("keychain item is not valid UTF-8".into()))
}

fn save_with_backend<B: KeyringBackend>(
    backend: &B,
    service: &str,
    account: &str,
    secret: &SecretString,
) -> Result<(), CredentialStoreError> {
    entry_for(backend, service, account)?
        .set_secret(secret.expose().as_bytes())
        .map_err(|e| map_keyring_error("failed to store keychain item", e))
}

fn delete_with_backend<B: KeyringBackend>(
    backend: &B,
    service: &str,
    account: &str,
) -> Result<(), CredentialStoreError> {
    match entry_for(backend, service, account)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(map_keyring_error("failed to delete keychain item", e)),
    }
}

/// [`CredentialStorePort`] backed by the OS keychain.
///
/// 使用系统钥匙串的凭据存储。
pub struct KeyringCredentialStore<B: KeyringBackend = SystemBackend> {
    backend: Arc<B>,
    service: String,
}

impl KeyringCredentialStore<SystemBackend> {
    pub fn new() -> Self {
        Self::with_backend(SystemBackend, SERVICE_NAME)
    }
}

impl Default for KeyringCredentialStore<SystemBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: KeyringBackend> KeyringCredentialStore<B> {
    pub fn with_backend(backend: B, service: impl Into<String>) -> Self {
        Self {
            backend: Arc::new(backend),
            service: service.into(),
        }
    }

    async fn blocking<T, F>(&self, account: &str, op: F) -> Result<T, CredentialStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&B, &str, &str) -> Result<T, CredentialStoreError> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let service = self.service.clone();
        let account = account.to_string();
        tokio::task::spawn_blocking(move || op(&backend, &service, &account))
            .await
            .map_err(|e| {
                warn!(error = %e, "keychain task did not complete");
                CredentialStoreError::Other(format!("keychain task failed: {e}"))
            })?
    }
}

#[async_trait]
impl<B: KeyringBackend> CredentialStorePort for KeyringCredentialStore<B> {
    async fn save(&self, account: &str, secret: &SecretString) -> Result<(), CredentialStoreError> {
        debug!(account, "saving keychain item");
        let secret = secret.duplicate();
        self.blocking(account, move |backend, service, account| {
            save_with_backend(backend, service, account, &secret)
        })
        .await
    }

    async fn retrieve(&self, account: &str) -> Result<SecretString, CredentialStoreError> {
        self.blocking(account, retrieve_with_backend).await
    }

    async fn delete(&self, account: &str) -> Result<(), CredentialStoreError> {
        debug!(account, "deleting keychain item");
        self.blocking(account, delete_with_backend).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryState {
        entries: HashMap<String, Vec<u8>>,
        deny_access: bool,
    }

    #[derive(Default, Clone)]
    struct MemoryBackend {
        state: Arc<Mutex<MemoryState>>,
    }

    struct MemoryEntry {
        key: String,
        state: Arc<Mutex<MemoryState>>,
    }

    impl KeyringEntryOps for MemoryEntry {
        fn get_secret(&self) -> Result<Vec<u8>, keyring::Error> {
            let state = self.state.lock().unwrap();
            if state.deny_access {
                return Err(keyring::Error::NoStorageAccess(Box::new(
                    std::io::Error::other("locked"),
                )));
            }
            state.entries.get(&self.key).cloned().ok_or(keyring::Error::NoEntry)
        }

        fn set_secret(&self, secret: &[u8]) -> Result<(), keyring::Error> {
            self.state
                .lock()
                .unwrap()
                .entries
                .insert(self.key.clone(), secret.to_vec());
            Ok(())
        }

        fn delete_credential(&self) -> Result<(), keyring::Error> {
            self.state
                .lock()
                .unwrap()
                .entries
                .remove(&self.key)
                .map(|_| ())
                .ok_or(keyring::Error::NoEntry)
        }
    }

    impl KeyringBackend for MemoryBackend {
        type Entry = MemoryEntry;

        fn new_entry(&self, service: &str, account: &str) -> Result<Self::Entry, keyring::Error> {
            Ok(MemoryEntry {
                key: format!("{service}/{account}"),
                state: Arc::clone(&self.state),
            })
        }
    }

    fn store() -> (KeyringCredentialStore<MemoryBackend>, MemoryBackend) {
        let backend = MemoryBackend::default();
        (
            KeyringCredentialStore::with_backend(backend.clone(), "test-service"),
            backend,
        )
    }

    #[tokio::test]
    async fn save_then_retrieve_returns_secret() {
        let (store, backend) = store();
        store
            .save("notes-passphrase", &SecretString::from("hunter2"))
            .await
            .unwrap();

        let secret = store.retrieve("notes-passphrase").await.unwrap();
        assert_eq!(secret.expose(), "hunter2");
        assert!(backend
            .state
            .lock()
            .unwrap()
            .entries
            .contains_key("test-service/notes-passphrase"));
    }

    #[tokio::test]
    async fn missing_item_is_not_found() {
        let (store, _) = store();
        let err = store.retrieve("nobody").await.unwrap_err();
        assert_eq!(err, CredentialStoreError::NotFound);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (store, _) = store();
        store.save("a", &SecretString::from("x")).await.unwrap();
        store.delete("a").await.unwrap();
        store.delete("a").await.unwrap();
        assert_eq!(
            store.retrieve("a").await.unwrap_err(),
            CredentialStoreError::NotFound
        );
    }

    #[tokio::test]
    async fn locked_keychain_is_permission_denied() {
        let (store, backend) = store();
        backend.state.lock().unwrap().deny_access = true;
        let err = store.retrieve("a").await.unwrap_err();
        assert!(matches!(err, CredentialStoreError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn non_utf8_item_is_corrupt() {
        let (store, backend) = store();
        backend
            .state
            .lock()
            .unwrap()
            .entries
            .insert("test-service/a".into(), vec![0xff, 0xfe]);
        let err = store.retrieve("a").await.unwrap_err();
        assert!(matches!(err, CredentialStoreError::Corrupt(_)));
    }
}
