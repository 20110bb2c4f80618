//! Error types for corkboard-core

use thiserror::Error;

use crate::models::RecordId;

/// Result type alias using corkboard-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in corkboard-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Remote record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Conditional save rejected because the remote revision moved on
    #[error("Revision conflict on record {0}")]
    Conflict(RecordId),

    /// Conflict retries ran past the configured bound
    #[error("Gave up on record {record} after {attempts} conflicting saves")]
    ConflictExhausted { record: RecordId, attempts: u32 },

    /// Operation needs a remote id the entity does not have yet
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Store unreachable or failed to serve the request
    #[error("Transport error: {0}")]
    Transport(String),

    /// Record is missing fields or carries values of the wrong type
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Board is closed to new members
    #[error("Board {0} is not accepting new members")]
    NotAcceptingMembers(String),

    /// Caller is neither owner nor member
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Board passed its 24 hour window and is export-only
    #[error("Board {0} has expired")]
    BoardExpired(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error is a revision mismatch worth retrying.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
