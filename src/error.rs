//! Error types for memento.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using MementoError.
pub type Result<T> = std::result::Result<T, MementoError>;

#[derive(Debug, Error)]
pub enum MementoError {
    #[error("'{0}' not found in the list")]
    NotFound(String),

    #[error("no words available, add some words first")]
    EmptyStore,

    #[error("invalid quiz size '{0}', please enter a positive number")]
    InvalidSize(String),

    #[error("word must not be empty")]
    EmptyWord,

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("corrupt data in {}: {reason}", path.display())]
    CorruptData { path: PathBuf, reason: String },

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("interrupted by user")]
    Interrupted,
}

impl From<csv::Error> for MementoError {
    fn from(err: csv::Error) -> Self {
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(e) => Self::Io(e),
            _ => Self::MalformedInput(message),
        }
    }
}
