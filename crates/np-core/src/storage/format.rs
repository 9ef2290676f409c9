use std::fmt;

use serde::{Deserialize, Serialize};

/// On-disk note storage format.
///
/// The order of the variants is the order of the storage format popup; see
/// [`StorageFormat::from_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageFormat {
    /// All notes in one database file.
    SingleDatabase,
    PlainText,
    RichText,
    Html,
    WordDocument,
}

impl StorageFormat {
    pub const ALL: [StorageFormat; 5] = [
        StorageFormat::SingleDatabase,
        StorageFormat::PlainText,
        StorageFormat::RichText,
        StorageFormat::Html,
        StorageFormat::WordDocument,
    ];

    pub fn index(self) -> usize {
        match self {
            StorageFormat::SingleDatabase => 0,
            StorageFormat::PlainText => 1,
            StorageFormat::RichText => 2,
            StorageFormat::Html => 3,
            StorageFormat::WordDocument => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Only the single database can hold encrypted notes.
    pub fn supports_encryption(self) -> bool {
        matches!(self, StorageFormat::SingleDatabase)
    }

    /// Every format except the database writes one file per note, which is
    /// when the allowed extension and type lists apply.
    pub fn uses_separate_files(self) -> bool {
        !matches!(self, StorageFormat::SingleDatabase)
    }

    /// Default file extension for notes written in this format.
    pub fn file_extension(self) -> Option<&'static str> {
        match self {
            StorageFormat::SingleDatabase => None,
            StorageFormat::PlainText => Some("txt"),
            StorageFormat::RichText => Some("rtf"),
            StorageFormat::Html => Some("html"),
            StorageFormat::WordDocument => Some("doc"),
        }
    }
}

impl fmt::Display for StorageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StorageFormat::SingleDatabase => "single database",
            StorageFormat::PlainText => "plain text files",
            StorageFormat::RichText => "rich text files",
            StorageFormat::Html => "HTML files",
            StorageFormat::WordDocument => "Word documents",
        };
        f.write_str(s)
    }
}
