//! # Dependency Injection / 依赖注入模块
//!
//! Assembles platform adapters and host-provided ports into a
//! [`PreferencesCoordinator`]. Only assembly happens here; policy defaults
//! come from [`CoordinatorPolicy::from_config`].
//! 这里只做组装，不做决策。

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use np_app::{Collaborators, CoordinatorError, CoordinatorPolicy, PreferencesCoordinator};
use np_core::ports::{
    CredentialStorePort, DocumentStorePort, FormatConverterPort, PreferencesEventPort,
    VerificationClientPort,
};
use np_core::CoordinatorConfig;
use np_platform::app_dirs::AppDirs;
use np_platform::{FileCredentialStore, FilePreferencesRepository, KeyringCredentialStore};

/// Errors during dependency injection
/// 依赖注入错误
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("unknown credential backend: {0:?} (expected \"keyring\" or \"file\")")]
    UnknownCredentialBackend(String),

    #[error("no local data directory available for {0}")]
    NoDataDir(&'static str),

    #[error("coordinator failed to load: {0}")]
    Coordinator(#[from] CoordinatorError),
}

/// Ports only the host application can provide: the document store it
/// owns, its format converter, the sync service client and the UI event
/// sink.
#[derive(Clone)]
pub struct HostPorts {
    pub store: Arc<dyn DocumentStorePort>,
    pub converter: Arc<dyn FormatConverterPort>,
    pub verifier: Arc<dyn VerificationClientPort>,
    pub events: Arc<dyn PreferencesEventPort>,
}

fn resolve_path(
    configured: &std::path::Path,
    what: &'static str,
    fallback: impl FnOnce(&AppDirs) -> PathBuf,
) -> Result<PathBuf, WiringError> {
    if !configured.as_os_str().is_empty() {
        return Ok(configured.to_path_buf());
    }
    AppDirs::resolve()
        .map(|dirs| fallback(&dirs))
        .ok_or(WiringError::NoDataDir(what))
}

fn credential_store(
    config: &CoordinatorConfig,
) -> Result<Arc<dyn CredentialStorePort>, WiringError> {
    match config.credential_backend.trim() {
        "" | "keyring" => {
            info!("using OS keychain credential store");
            Ok(Arc::new(KeyringCredentialStore::new()))
        }
        "file" => {
            let dir = resolve_path(&config.credential_dir, "credentials", AppDirs::credential_dir)?;
            info!(dir = %dir.display(), "using file credential store");
            Ok(Arc::new(FileCredentialStore::with_base_dir(dir)))
        }
        other => Err(WiringError::UnknownCredentialBackend(other.to_string())),
    }
}

/// Build a loaded coordinator from config plus host ports.
pub async fn build_coordinator(
    config: &CoordinatorConfig,
    host: HostPorts,
) -> Result<PreferencesCoordinator, WiringError> {
    let policy = CoordinatorPolicy::from_config(config);
    let credentials = credential_store(config)?;
    let preferences_path =
        resolve_path(&config.preferences_path, "preferences", AppDirs::preferences_path)?;
    info!(path = %preferences_path.display(), "preferences file");

    let collaborators = Collaborators {
        credentials,
        converter: host.converter,
        verifier: host.verifier,
        store: host.store,
        preferences: Arc::new(FilePreferencesRepository::new(preferences_path)),
        events: host.events,
    };

    Ok(PreferencesCoordinator::load(policy, collaborators).await?)
}
