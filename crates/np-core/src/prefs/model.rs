use serde::{Deserialize, Serialize};

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

pub const MIN_KEY_LENGTH_BITS: u32 = 128;
pub const MAX_KEY_LENGTH_BITS: u32 = 512;
pub const KEY_LENGTH_STEP_BITS: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncFrequency {
    Manual,
    EveryFiveMinutes,
    EveryFifteenMinutes,
    Hourly,
}

impl SyncFrequency {
    pub const ALL: [SyncFrequency; 4] = [
        SyncFrequency::Manual,
        SyncFrequency::EveryFiveMinutes,
        SyncFrequency::EveryFifteenMinutes,
        SyncFrequency::Hourly,
    ];

    /// Interval in minutes; `None` for manual syncing.
    pub fn minutes(self) -> Option<u32> {
        match self {
            SyncFrequency::Manual => None,
            SyncFrequency::EveryFiveMinutes => Some(5),
            SyncFrequency::EveryFifteenMinutes => Some(15),
            SyncFrequency::Hourly => Some(60),
        }
    }

    pub fn index(self) -> usize {
        match self {
            SyncFrequency::Manual => 0,
            SyncFrequency::EveryFiveMinutes => 1,
            SyncFrequency::EveryFifteenMinutes => 2,
            SyncFrequency::Hourly => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    pub enabled: bool,

    /// Remote account name. The password lives in the credential store.
    #[serde(default)]
    pub account: Option<String>,

    pub frequency: SyncFrequency,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotationPrefs {
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,

    /// Lowercase file extensions without the leading dot.
    #[serde(default)]
    pub allowed_extensions: Vec<String>,

    /// Uppercase type codes, 1 to 4 characters.
    #[serde(default)]
    pub allowed_file_types: Vec<String>,

    pub key_length_bits: u32,

    pub confirm_note_deletion: bool,

    pub secure_text_entry: bool,

    #[serde(default)]
    pub sync: SyncSettings,
}

fn current_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

impl NotationPrefs {
    /// Whether the "synced notes are not encrypted on the server" alert
    /// applies.
    pub fn sync_encryption_alert(&self, encrypted: bool) -> bool {
        self.sync.enabled && encrypted
    }

    pub fn has_sync_account(&self) -> bool {
        self.sync
            .account
            .as_deref()
            .is_some_and(|account| !account.is_empty())
    }
}
