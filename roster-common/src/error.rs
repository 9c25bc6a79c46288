//! Common error types for the roster engine

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Common result type for roster operations
pub type Result<T> = std::result::Result<T, Error>;

/// Entity type a save or delete failure is reported against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Sections,
    Members,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Sections => write!(f, "sections"),
            EntityKind::Members => write!(f, "members"),
        }
    }
}

/// Error types across the roster crates
#[derive(Error, Debug)]
pub enum Error {
    /// Empty or malformed input, rejected before any store call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Id absent from the in-memory registry (or the image library)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Removal has dependents and must be confirmed by the operator first
    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),

    /// A save is already outstanding for this engine
    #[error("Save already in progress")]
    SaveInProgress,

    /// Store rejected an insert, update or delete
    #[error("Failed to save {entity}: {message}")]
    Save { entity: EntityKind, message: String },

    /// Store unreachable during initial fetch or post-save reload
    #[error("Failed to load team data: {0}")]
    Load(String),

    /// Store collaborator returned an unexpected response
    #[error("Store error: {0}")]
    Store(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP client error (wraps reqwest::Error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Wrap a store failure as the user-visible save error for `entity`
    pub fn save(entity: EntityKind, err: Error) -> Self {
        match err {
            Error::Save { .. } => err,
            other => Error::Save {
                entity,
                message: other.to_string(),
            },
        }
    }

    /// Wrap a store failure as a load error
    pub fn load(err: Error) -> Self {
        match err {
            Error::Load(_) => err,
            other => Error::Load(other.to_string()),
        }
    }
}
