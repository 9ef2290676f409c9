use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};

use np_core::{
    ports::{CredentialStoreError, CredentialStorePort, PreferencesRepositoryPort},
    NotationPrefs, SecretString,
};

#[derive(Debug, thiserror::Error)]
pub enum SyncCredentialsError {
    #[error("sync account must not be empty")]
    EmptyAccount,

    #[error("credential store failure: {0}")]
    CredentialStore(#[from] CredentialStoreError),

    #[error("preferences repository failed: {0:#}")]
    Repository(#[source] anyhow::Error),
}

/// Credential-store account under which a sync password is kept.
pub fn sync_credential_account(account: &str) -> String {
    format!("sync:{account}")
}

/// Stores the sync account in preferences and its password in the
/// credential store.
pub struct SyncCredentials {
    credentials: Arc<dyn CredentialStorePort>,
    repository: Arc<dyn PreferencesRepositoryPort>,
}

impl SyncCredentials {
    pub fn new(
        credentials: Arc<dyn CredentialStorePort>,
        repository: Arc<dyn PreferencesRepositoryPort>,
    ) -> Self {
        Self {
            credentials,
            repository,
        }
    }

    pub async fn commit(
        &self,
        account: &str,
        password: &SecretString,
    ) -> Result<NotationPrefs, SyncCredentialsError> {
        let account = account.trim();
        if account.is_empty() {
            return Err(SyncCredentialsError::EmptyAccount);
        }

        let span = info_span!("usecase.sync_credentials.commit");
        async {
            let mut prefs = self
                .repository
                .load()
                .await
                .map_err(SyncCredentialsError::Repository)?;

            // Switching accounts leaves no orphaned password behind.
            if let Some(previous) = prefs.sync.account.as_deref() {
                if previous != account {
                    if let Err(err) = self
                        .credentials
                        .delete(&sync_credential_account(previous))
                        .await
                    {
                        warn!(error = %err, "failed to remove password of previous sync account");
                    }
                }
            }

            self.credentials
                .save(&sync_credential_account(account), password)
                .await?;

            prefs.sync.account = Some(account.to_string());
            self.repository
                .save(&prefs)
                .await
                .map_err(SyncCredentialsError::Repository)?;

            info!("sync credentials stored");
            Ok(prefs)
        }
        .instrument(span)
        .await
    }

    /// Delete the stored sync password and forget the account.
    pub async fn remove(&self) -> Result<NotationPrefs, SyncCredentialsError> {
        let span = info_span!("usecase.sync_credentials.remove");
        async {
            let mut prefs = self
                .repository
                .load()
                .await
                .map_err(SyncCredentialsError::Repository)?;

            let Some(account) = prefs.sync.account.take() else {
                info!("no sync account to remove");
                return Ok(prefs);
            };

            self.credentials
                .delete(&sync_credential_account(&account))
                .await?;
            self.repository
                .save(&prefs)
                .await
                .map_err(SyncCredentialsError::Repository)?;

            info!("sync credentials removed");
            Ok(prefs)
        }
        .instrument(span)
        .await
    }

    /// The stored password of the configured account, if any.
    pub async fn stored_password(&self) -> Result<Option<SecretString>, SyncCredentialsError> {
        let prefs = self
            .repository
            .load()
            .await
            .map_err(SyncCredentialsError::Repository)?;
        let Some(account) = prefs.sync.account.as_deref() else {
            return Ok(None);
        };
        match self
            .credentials
            .retrieve(&sync_credential_account(account))
            .await
        {
            Ok(secret) => Ok(Some(secret)),
            Err(CredentialStoreError::NotFound) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
