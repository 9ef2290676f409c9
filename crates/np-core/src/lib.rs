//! # np-core
//!
//! Core domain models and pure state machines for the notation preferences
//! coordinator.
//!
//! This crate contains no I/O. Encryption transitions, storage-format
//! migration and login verification are modelled here as pure transition
//! functions; the orchestrators in `np-app` execute their side effects
//! through the traits in [`ports`].

pub mod config;
pub mod encryption;
pub mod ports;
pub mod prefs;
pub mod security;
pub mod storage;
pub mod verification;

// Re-export commonly used types at the crate root
pub use config::CoordinatorConfig;
pub use encryption::{EncryptionError, EncryptionMismatch, EncryptionPhase, EncryptionState};
pub use prefs::NotationPrefs;
pub use security::SecretString;
pub use storage::{ConversionFailed, FormatMigrationQueue, StorageFormat};
pub use verification::{RequestId, VerificationStatus, VerificationTracker};
