//! Error types raised by repository implementations.

use character_core::{CharacterError, RecordError};
use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("roster lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("corrupted roster line {line}: {reason}")]
    CorruptedData { line: usize, reason: String },

    #[error("row for '{name}' cannot be restored")]
    Record {
        name: String,
        #[source]
        cause: RecordError,
    },
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// Per-character failure during a batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("character '{name}' is not in the roster")]
    NotFound { name: String },

    #[error(transparent)]
    Character(#[from] CharacterError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
