use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::encryption::EncryptionState;
use crate::storage::StorageFormat;

/// What the document store reports about itself on open.
///
/// 文档存储元数据（加密状态 + 存储格式）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMetadata {
    pub encryption: EncryptionState,
    pub format: StorageFormat,
}

/// Metadata marker and plaintext rewrite of the notes store.
///
/// 文档存储端口：元数据标记读写与明文重写。
#[async_trait]
pub trait DocumentStorePort: Send + Sync {
    async fn load_metadata(&self) -> anyhow::Result<StoreMetadata>;

    async fn persist_encryption_state(&self, state: EncryptionState) -> anyhow::Result<()>;

    async fn persist_storage_format(&self, format: StorageFormat) -> anyhow::Result<()>;

    /// Rewrite every note without encryption.
    ///
    /// On error the store must still be readable with the current key.
    async fn rewrite_plaintext(&self) -> anyhow::Result<()>;
}
