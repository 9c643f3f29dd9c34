use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OfflineError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid origin: {0}")]
    InvalidOrigin(String),

    /// Generation names double as file names.
    #[error("Invalid cache generation name: {0:?}")]
    InvalidGeneration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Cache I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cache file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
