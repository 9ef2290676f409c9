//! Use case for editing notation preferences
//! 编辑偏好设置的用例

use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use np_core::{
    ports::PreferencesRepositoryPort,
    prefs::{NotationPrefs, PrefsChange, PrefsError},
};

#[derive(Debug, thiserror::Error)]
pub enum EditPreferencesError {
    #[error("invalid preference change: {0}")]
    Invalid(#[from] PrefsError),

    #[error("preferences repository failed: {0:#}")]
    Repository(#[source] anyhow::Error),
}

/// Use case for applying one preference change.
///
/// ## Behavior / 行为
/// - Loads current preferences
/// - Applies and validates the change
/// - Logs the field that changed with its old/new value
/// - Persists only when something actually changed
pub struct EditPreferences {
    repository: Arc<dyn PreferencesRepositoryPort>,
}

impl EditPreferences {
    pub fn new(repository: Arc<dyn PreferencesRepositoryPort>) -> Self {
        Self { repository }
    }

    pub async fn current(&self) -> Result<NotationPrefs, EditPreferencesError> {
        self.repository
            .load()
            .await
            .map_err(EditPreferencesError::Repository)
    }

    /// Returns the preferences after the change.
    pub async fn execute(&self, change: PrefsChange) -> Result<NotationPrefs, EditPreferencesError> {
        let span = info_span!("usecase.edit_preferences.execute", change = ?change);

        async {
            let old = self.current().await?;
            let mut prefs = old.clone();

            if !prefs.apply(&change)? {
                info!("preference change had no effect");
                return Ok(prefs);
            }

            let diff = PrefsDiff::diff(&old, &prefs);
            info!(changed_fields = %diff, "updating notation preferences");

            self.repository
                .save(&prefs)
                .await
                .map_err(EditPreferencesError::Repository)?;
            Ok(prefs)
        }
        .instrument(span)
        .await
    }
}

/// Fields that differ between two preference snapshots, for logging.
struct PrefsDiff(Vec<String>);

impl PrefsDiff {
    fn diff(old: &NotationPrefs, new: &NotationPrefs) -> Self {
        let mut parts = Vec::new();
        if old.allowed_extensions != new.allowed_extensions {
            parts.push(format!(
                "allowed_extensions: {:?} -> {:?}",
                old.allowed_extensions, new.allowed_extensions
            ));
        }
        if old.allowed_file_types != new.allowed_file_types {
            parts.push(format!(
                "allowed_file_types: {:?} -> {:?}",
                old.allowed_file_types, new.allowed_file_types
            ));
        }
        if old.key_length_bits != new.key_length_bits {
            parts.push(format!(
                "key_length_bits: {} -> {}",
                old.key_length_bits, new.key_length_bits
            ));
        }
        if old.confirm_note_deletion != new.confirm_note_deletion {
            parts.push(format!(
                "confirm_note_deletion: {} -> {}",
                old.confirm_note_deletion, new.confirm_note_deletion
            ));
        }
        if old.secure_text_entry != new.secure_text_entry {
            parts.push(format!(
                "secure_text_entry: {} -> {}",
                old.secure_text_entry, new.secure_text_entry
            ));
        }
        if old.sync.enabled != new.sync.enabled {
            parts.push(format!(
                "sync.enabled: {} -> {}",
                old.sync.enabled, new.sync.enabled
            ));
        }
        if old.sync.frequency != new.sync.frequency {
            parts.push(format!(
                "sync.frequency: {:?} -> {:?}",
                old.sync.frequency, new.sync.frequency
            ));
        }
        if old.sync.account != new.sync.account {
            // Account names stay out of the logs.
            parts.push("sync.account: changed".to_string());
        }
        Self(parts)
    }
}

impl std::fmt::Display for PrefsDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}
