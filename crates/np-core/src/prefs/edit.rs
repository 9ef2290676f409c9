//! Validated edits of [`NotationPrefs`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prefs::model::{
    NotationPrefs, SyncFrequency, KEY_LENGTH_STEP_BITS, MAX_KEY_LENGTH_BITS, MIN_KEY_LENGTH_BITS,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrefsError {
    #[error("file extension must not be empty")]
    EmptyExtension,

    #[error("file type code must be 1 to 4 characters, got {0:?}")]
    InvalidFileType(String),

    #[error("key length must be 128 to 512 bits in steps of 32, got {0}")]
    InvalidKeyLength(u32),
}

/// A single preference edit coming from the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum PrefsChange {
    AddExtension(String),
    RemoveExtension(String),
    AddFileType(String),
    RemoveFileType(String),
    SetKeyLength(u32),
    SetConfirmNoteDeletion(bool),
    SetSecureTextEntry(bool),
    SetSyncEnabled(bool),
    SetSyncFrequency(SyncFrequency),
}

/// `" .MD "` becomes `"md"`.
pub fn normalize_extension(raw: &str) -> Result<String, PrefsError> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('.').unwrap_or(trimmed).trim();
    if trimmed.is_empty() {
        return Err(PrefsError::EmptyExtension);
    }
    Ok(trimmed.to_lowercase())
}

pub fn normalize_file_type(raw: &str) -> Result<String, PrefsError> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if !(1..=4).contains(&len) {
        return Err(PrefsError::InvalidFileType(raw.to_string()));
    }
    Ok(trimmed.to_uppercase())
}

pub fn validate_key_length(bits: u32) -> Result<u32, PrefsError> {
    if !(MIN_KEY_LENGTH_BITS..=MAX_KEY_LENGTH_BITS).contains(&bits)
        || bits % KEY_LENGTH_STEP_BITS != 0
    {
        return Err(PrefsError::InvalidKeyLength(bits));
    }
    Ok(bits)
}

impl NotationPrefs {
    /// Apply one edit. Returns whether anything changed.
    pub fn apply(&mut self, change: &PrefsChange) -> Result<bool, PrefsError> {
        match change {
            PrefsChange::AddExtension(raw) => {
                let ext = normalize_extension(raw)?;
                Ok(insert_unique(&mut self.allowed_extensions, ext))
            }
            PrefsChange::RemoveExtension(raw) => {
                let ext = normalize_extension(raw)?;
                Ok(remove_value(&mut self.allowed_extensions, &ext))
            }
            PrefsChange::AddFileType(raw) => {
                let code = normalize_file_type(raw)?;
                Ok(insert_unique(&mut self.allowed_file_types, code))
            }
            PrefsChange::RemoveFileType(raw) => {
                let code = normalize_file_type(raw)?;
                Ok(remove_value(&mut self.allowed_file_types, &code))
            }
            PrefsChange::SetKeyLength(bits) => {
                let bits = validate_key_length(*bits)?;
                Ok(replace(&mut self.key_length_bits, bits))
            }
            PrefsChange::SetConfirmNoteDeletion(value) => {
                Ok(replace(&mut self.confirm_note_deletion, *value))
            }
            PrefsChange::SetSecureTextEntry(value) => {
                Ok(replace(&mut self.secure_text_entry, *value))
            }
            PrefsChange::SetSyncEnabled(value) => Ok(replace(&mut self.sync.enabled, *value)),
            PrefsChange::SetSyncFrequency(value) => {
                Ok(replace(&mut self.sync.frequency, *value))
            }
        }
    }
}

fn insert_unique(values: &mut Vec<String>, value: String) -> bool {
    if values.contains(&value) {
        return false;
    }
    values.push(value);
    true
}

fn remove_value(values: &mut Vec<String>, value: &str) -> bool {
    let before = values.len();
    values.retain(|v| v != value);
    values.len() != before
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
