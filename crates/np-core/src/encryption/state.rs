use std::fmt;

use serde::{Deserialize, Serialize};

use crate::storage::StorageFormat;

/// Encryption state advertised by the document store's metadata marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptionState {
    Disabled,
    Enabled,
}

impl EncryptionState {
    pub fn is_enabled(self) -> bool {
        matches!(self, EncryptionState::Enabled)
    }
}

impl fmt::Display for EncryptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncryptionState::Disabled => f.write_str("disabled"),
            EncryptionState::Enabled => f.write_str("enabled"),
        }
    }
}

/// Phase of the encryption state machine.
///
/// The pending phases exist only while a transition is being executed or,
/// for `EnablingPending`, while a passphrase is being captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptionPhase {
    Disabled,
    EnablingPending,
    Enabled,
    DisablingPending,
}

impl EncryptionPhase {
    /// The state that is true on disk during this phase.
    pub fn state(self) -> EncryptionState {
        match self {
            EncryptionPhase::Disabled | EncryptionPhase::EnablingPending => {
                EncryptionState::Disabled
            }
            EncryptionPhase::Enabled | EncryptionPhase::DisablingPending => {
                EncryptionState::Enabled
            }
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(
            self,
            EncryptionPhase::EnablingPending | EncryptionPhase::DisablingPending
        )
    }

    /// Whether a storage format must be able to hold encrypted notes.
    pub fn requires_encrypting_format(self) -> bool {
        matches!(
            self,
            EncryptionPhase::EnablingPending | EncryptionPhase::Enabled
        )
    }
}

impl From<EncryptionState> for EncryptionPhase {
    fn from(state: EncryptionState) -> Self {
        match state {
            EncryptionState::Disabled => EncryptionPhase::Disabled,
            EncryptionState::Enabled => EncryptionPhase::Enabled,
        }
    }
}

impl fmt::Display for EncryptionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EncryptionPhase::Disabled => "disabled",
            EncryptionPhase::EnablingPending => "being enabled",
            EncryptionPhase::Enabled => "enabled",
            EncryptionPhase::DisablingPending => "being disabled",
        };
        f.write_str(s)
    }
}

/// Disagreement between the advertised encryption state and the storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionMismatch {
    pub advertised: EncryptionState,
    pub kind: MismatchKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    /// The document store found its on-disk notes in a different state.
    StoreReported { on_disk: EncryptionState },
    /// A format change targets a format that cannot hold encrypted notes.
    UnsupportedFormat { requested: StorageFormat },
}

impl EncryptionMismatch {
    pub fn store_reported(advertised: EncryptionState, on_disk: EncryptionState) -> Self {
        Self {
            advertised,
            kind: MismatchKind::StoreReported { on_disk },
        }
    }

    pub fn unsupported_format(requested: StorageFormat) -> Self {
        Self {
            advertised: EncryptionState::Enabled,
            kind: MismatchKind::UnsupportedFormat { requested },
        }
    }
}

/// How the user answered the mismatch dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchResolution {
    /// Write everything as plaintext, then let the held format change run.
    DisableEncryption,
    /// Keep encryption and drop the held format change.
    KeepEncryption,
}

/// Whether disabling encryption needs an explicit confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisableWarningPolicy {
    #[default]
    Always,
    Never,
}

impl DisableWarningPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "always" => Some(DisableWarningPolicy::Always),
            "never" => Some(DisableWarningPolicy::Never),
            _ => None,
        }
    }
}
