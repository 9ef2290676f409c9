//! Storage format domain.

pub mod format;
pub mod migration;

pub use format::StorageFormat;
pub use migration::{
    Completion, ConversionFailed, ConversionId, ConversionTicket, FormatMigrationQueue,
    QueueDecision,
};
