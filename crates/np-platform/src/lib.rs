//! # np-platform
//!
//! Platform implementations of the `np-core` ports that touch the
//! operating system: the OS keychain, a file-backed credential fallback for
//! headless machines, and the JSON preferences file.

pub mod app_dirs;
pub mod file_credential_store;
pub mod keyring;
pub mod preferences_repo;

pub use file_credential_store::FileCredentialStore;
pub use keyring::KeyringCredentialStore;
pub use preferences_repo::FilePreferencesRepository;
