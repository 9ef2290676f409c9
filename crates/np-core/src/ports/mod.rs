//! Port interfaces for the application layer.
//!
//! Ports are the contract between the orchestrators in `np-app` and the
//! adapters in `np-platform` (or the host application). The coordinator
//! only ever talks to the outside world through these traits.

pub mod credential_store;
pub mod document_store;
pub mod format_converter;
pub mod preferences;
pub mod prefs_event;
pub mod verification_client;

pub use credential_store::{CredentialStoreError, CredentialStorePort};
pub use document_store::{DocumentStorePort, StoreMetadata};
pub use format_converter::{ConversionError, FormatConverterPort};
pub use preferences::PreferencesRepositoryPort;
pub use prefs_event::PreferencesEventPort;
pub use verification_client::{NetworkError, VerificationClientPort};
