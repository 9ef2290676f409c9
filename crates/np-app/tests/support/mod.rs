#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use np_app::{ChannelEventPort, Collaborators, CoordinatorPolicy, PreferencesCoordinator, PreferencesEvent};
use np_core::encryption::EncryptionState;
use np_core::ports::{
    ConversionError, CredentialStoreError, CredentialStorePort, DocumentStorePort,
    FormatConverterPort, NetworkError, PreferencesRepositoryPort, StoreMetadata,
    VerificationClientPort,
};
use np_core::storage::StorageFormat;
use np_core::{NotationPrefs, SecretString};

mockall::mock! {
    pub Verifier {}

    #[async_trait]
    impl VerificationClientPort for Verifier {
        async fn verify(&self, account: &str, secret: &SecretString) -> Result<bool, NetworkError>;
    }
}

#[derive(Default)]
pub struct MockCredentials {
    pub items: Mutex<HashMap<String, String>>,
    pub fail_save: AtomicBool,
}

impl MockCredentials {
    pub fn get(&self, account: &str) -> Option<String> {
        self.items.lock().unwrap().get(account).cloned()
    }
}

#[async_trait]
impl CredentialStorePort for MockCredentials {
    async fn save(&self, account: &str, secret: &SecretString) -> Result<(), CredentialStoreError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(CredentialStoreError::Unavailable("keychain locked".into()));
        }
        self.items
            .lock()
            .unwrap()
            .insert(account.to_string(), secret.expose().to_string());
        Ok(())
    }

    async fn retrieve(&self, account: &str) -> Result<SecretString, CredentialStoreError> {
        self.get(account)
            .map(SecretString::new)
            .ok_or(CredentialStoreError::NotFound)
    }

    async fn delete(&self, account: &str) -> Result<(), CredentialStoreError> {
        self.items.lock().unwrap().remove(account);
        Ok(())
    }
}

pub struct MockStore {
    pub metadata: Mutex<StoreMetadata>,
    pub fail_rewrite: AtomicBool,
    pub fail_marker: AtomicBool,
    pub rewrites: Mutex<usize>,
}

impl MockStore {
    pub fn new(encryption: EncryptionState, format: StorageFormat) -> Self {
        Self {
            metadata: Mutex::new(StoreMetadata { encryption, format }),
            fail_rewrite: AtomicBool::new(false),
            fail_marker: AtomicBool::new(false),
            rewrites: Mutex::new(0),
        }
    }

    pub fn metadata(&self) -> StoreMetadata {
        *self.metadata.lock().unwrap()
    }
}

#[async_trait]
impl DocumentStorePort for MockStore {
    async fn load_metadata(&self) -> anyhow::Result<StoreMetadata> {
        Ok(self.metadata())
    }

    async fn persist_encryption_state(&self, state: EncryptionState) -> anyhow::Result<()> {
        if self.fail_marker.load(Ordering::SeqCst) {
            anyhow::bail!("read-only volume");
        }
        self.metadata.lock().unwrap().encryption = state;
        Ok(())
    }

    async fn persist_storage_format(&self, format: StorageFormat) -> anyhow::Result<()> {
        self.metadata.lock().unwrap().format = format;
        Ok(())
    }

    async fn rewrite_plaintext(&self) -> anyhow::Result<()> {
        if self.fail_rewrite.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        *self.rewrites.lock().unwrap() += 1;
        Ok(())
    }
}

/// Converter that takes `delay` per conversion and records every call.
pub struct MockConverter {
    pub delay: Duration,
    pub calls: Mutex<Vec<(StorageFormat, StorageFormat)>>,
}

impl MockConverter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(StorageFormat, StorageFormat)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FormatConverterPort for MockConverter {
    async fn convert(
        &self,
        current: StorageFormat,
        target: StorageFormat,
    ) -> Result<(), ConversionError> {
        self.calls.lock().unwrap().push((current, target));
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

#[derive(Default)]
pub struct MockPreferences {
    pub prefs: Mutex<NotationPrefs>,
}

#[async_trait]
impl PreferencesRepositoryPort for MockPreferences {
    async fn load(&self) -> anyhow::Result<NotationPrefs> {
        Ok(self.prefs.lock().unwrap().clone())
    }

    async fn save(&self, prefs: &NotationPrefs) -> anyhow::Result<()> {
        *self.prefs.lock().unwrap() = prefs.clone();
        Ok(())
    }
}

pub struct Harness {
    pub coordinator: Arc<PreferencesCoordinator>,
    pub credentials: Arc<MockCredentials>,
    pub store: Arc<MockStore>,
    pub converter: Arc<MockConverter>,
    pub preferences: Arc<MockPreferences>,
    pub events: broadcast::Receiver<PreferencesEvent>,
}

impl Harness {
    /// Every event published so far.
    pub fn drain_events(&mut self) -> Vec<PreferencesEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

pub async fn build(
    encryption: EncryptionState,
    format: StorageFormat,
    verifier: Arc<dyn VerificationClientPort>,
) -> Harness {
    let credentials = Arc::new(MockCredentials::default());
    let store = Arc::new(MockStore::new(encryption, format));
    let converter = Arc::new(MockConverter::new(Duration::from_millis(200)));
    let preferences = Arc::new(MockPreferences::default());
    let channel = Arc::new(ChannelEventPort::new(256));
    let events = channel.subscribe();

    let coordinator = PreferencesCoordinator::load(
        CoordinatorPolicy::default(),
        Collaborators {
            credentials: credentials.clone(),
            converter: converter.clone(),
            verifier,
            store: store.clone(),
            preferences: preferences.clone(),
            events: channel,
        },
    )
    .await
    .expect("load coordinator");

    Harness {
        coordinator: Arc::new(coordinator),
        credentials,
        store,
        converter,
        preferences,
        events,
    }
}

pub fn idle_verifier() -> Arc<dyn VerificationClientPort> {
    let mut verifier = MockVerifier::new();
    verifier.expect_verify().never();
    Arc::new(verifier)
}
