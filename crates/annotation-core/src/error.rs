//! Error types for annotation domain operations

use thiserror::Error;

/// Result type alias for domain operations
pub type ArtifactResult<T> = std::result::Result<T, ArtifactError>;

/// Main error type for domain operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    /// Annotation string is not of the form `key: value`
    #[error("invalid annotation: {0}")]
    MalformedAnnotation(String),

    /// Registry, repository, tag or digest string is not well formed
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// Digest string cannot be parsed
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// Content length does not match the descriptor
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// Content hash does not match the descriptor
    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    /// Serialization/Deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ArtifactError {
    /// Check if this error is a content verification failure
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            ArtifactError::SizeMismatch { .. } | ArtifactError::DigestMismatch { .. }
        )
    }
}

impl From<serde_json::Error> for ArtifactError {
    fn from(err: serde_json::Error) -> Self {
        ArtifactError::Serialization(err.to_string())
    }
}
