//! Error types for the local store.

use std::path::PathBuf;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to create the storage directory.
    #[error("Failed to create storage directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Reading or writing a value failed.
    #[error("Storage I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A stored value could not be parsed.
    #[error("Stored data for {key} is corrupt: {source}")]
    Corrupt {
        key: String,
        source: serde_json::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Keys are restricted to ASCII letters, digits, `_` and `-`.
    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("Note text is empty")]
    EmptyNote,

    #[error("No entry {id} under {key}")]
    NotFound { key: String, id: i64 },

    /// The collection already holds the largest possible id.
    #[error("No ids left under {key}")]
    IdsExhausted { key: String },

    /// The value kept changing underneath every write attempt.
    #[error("Concurrent modification of {key}")]
    Conflict { key: String },
}
