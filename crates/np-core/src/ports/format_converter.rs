use async_trait::async_trait;
use thiserror::Error;

use crate::storage::StorageFormat;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("conversion from {from} to {to} is not supported")]
    Unsupported { from: StorageFormat, to: StorageFormat },

    #[error("conversion I/O failed: {0}")]
    Io(String),

    #[error("conversion failed: {0}")]
    Other(String),
}

/// Rewrites every note of the store from one storage format into another.
///
/// Implementations must leave the store readable in `current` when they
/// return an error.
#[async_trait]
pub trait FormatConverterPort: Send + Sync {
    async fn convert(
        &self,
        current: StorageFormat,
        target: StorageFormat,
    ) -> Result<(), ConversionError>;
}
