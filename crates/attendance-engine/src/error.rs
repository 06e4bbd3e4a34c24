//! Error types for the attendance engine.
//!
//! Rule violations (out of range, window closed, duplicate check-in, ...)
//! are not errors: they are [`Rejection`](crate::rejection::Rejection)s
//! returned inside a [`Decision`](crate::rejection::Decision). The variants
//! here cover collaborator and storage failures only. Private key material
//! is never included in error messages.

/// Engine error types covering all fallible operations.
#[derive(Debug, thiserror::Error)]
pub enum AttendanceError {
    /// A collaborator (geolocation, persistence, ledger) could not serve the
    /// request. The message is surfaced to the caller verbatim.
    #[error("{0}")]
    CollaboratorUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Signature verification failed")]
    SignatureInvalid,

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Invalid passphrase")]
    InvalidPassphrase,

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AttendanceError {
    /// True when the failure came from outside the rule engine: a
    /// collaborator, the store, or the filesystem.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            AttendanceError::CollaboratorUnavailable(_)
                | AttendanceError::StorageError(_)
                | AttendanceError::Io(_)
        )
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, AttendanceError>;
