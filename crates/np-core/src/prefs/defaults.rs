use super::model::*;

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            account: None,
            frequency: SyncFrequency::EveryFiveMinutes,
        }
    }
}

impl Default for NotationPrefs {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            allowed_extensions: vec!["txt".to_string(), "text".to_string(), "md".to_string()],
            allowed_file_types: vec!["TEXT".to_string(), "UTF8".to_string()],
            key_length_bits: 256,
            confirm_note_deletion: true,
            secure_text_entry: false,
            sync: SyncSettings::default(),
        }
    }
}
