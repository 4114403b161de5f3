//! Error types for the meme library.

use thiserror::Error;

use crate::models::MemeId;

/// Result type alias using the meme library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for meme library operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Meme record not found
    #[error("Meme not found: {0}")]
    MemeNotFound(MemeId),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Search attempted before the index was built
    #[error("Search index has not been built")]
    IndexNotReady,

    /// Invalid input (bad parameter shape, type, or range)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Record persistence or media backend failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures of the record store or media backend.
    ///
    /// I/O, serialization and network failures all surface from storage
    /// collaborators, so they classify as storage errors too.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::Storage(_) | Error::Io(_) | Error::Serialization(_) | Error::Request(_)
        )
    }

    /// True when the error means the requested meme or resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::MemeNotFound(_) | Error::NotFound(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
