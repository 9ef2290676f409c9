mod edit_preferences;
mod sync_credentials;

pub use edit_preferences::{EditPreferences, EditPreferencesError};
pub use sync_credentials::{sync_credential_account, SyncCredentials, SyncCredentialsError};
