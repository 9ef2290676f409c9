pub mod defaults;
pub mod edit;
pub mod model;

pub use edit::{normalize_extension, normalize_file_type, validate_key_length, PrefsChange, PrefsError};
pub use model::{NotationPrefs, SyncFrequency, SyncSettings, CURRENT_SCHEMA_VERSION};
