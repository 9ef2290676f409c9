//! Orchestrators and use cases.
//!
//! Each orchestrator owns one pure state machine from `np-core` and is the
//! only place that mutates it.

pub mod encryption;
pub mod format_migration;
pub mod preferences;
pub mod verification;

pub use encryption::{EncryptionContext, EncryptionOrchestrator};
pub use format_migration::FormatMigrationOrchestrator;
pub use preferences::{EditPreferences, EditPreferencesError, SyncCredentials, SyncCredentialsError};
pub use verification::{VerificationPolicy, VerificationScheduler};
