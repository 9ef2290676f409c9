use async_trait::async_trait;
use thiserror::Error;

use crate::security::SecretString;

/// Credential store errors.
///
/// 凭据存储错误类型。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialStoreError {
    /// No secret is stored under the account.
    ///
    /// 该账户下没有保存的凭据。
    #[error("no credential stored for account")]
    NotFound,

    /// The store is unavailable on this platform.
    ///
    /// 平台不支持或不可用。
    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    /// Access was denied by the platform (permissions/ACL).
    ///
    /// 平台权限或 ACL 拒绝访问。
    #[error("credential store access denied: {0}")]
    PermissionDenied(String),

    /// Stored data is corrupt or invalid.
    ///
    /// 存储数据损坏或无效。
    #[error("credential data corrupt: {0}")]
    Corrupt(String),

    #[error("credential store failed: {0}")]
    Other(String),
}

/// Keychain-like store for secrets, keyed by account name.
///
/// 凭据存储端口：按账户名存取敏感数据。
#[async_trait]
pub trait CredentialStorePort: Send + Sync {
    /// Save a secret, overwriting any existing one.
    ///
    /// Requirements:
    /// - Idempotent (overwrite if exists)
    /// - Atomic at store level
    async fn save(&self, account: &str, secret: &SecretString) -> Result<(), CredentialStoreError>;

    /// Retrieve a secret.
    ///
    /// Error semantics:
    /// - NotFound        : item does not exist
    /// - PermissionDenied: store not accessible
    /// - Corrupt         : data exists but invalid
    async fn retrieve(&self, account: &str) -> Result<SecretString, CredentialStoreError>;

    /// Delete a secret. Deleting a missing secret succeeds.
    async fn delete(&self, account: &str) -> Result<(), CredentialStoreError>;
}

