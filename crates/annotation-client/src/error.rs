//! Registry client error types
//!
//! This module provides error types for registry operations, including
//! transport errors, authentication failures and unexpected responses.

use annotation_core::ArtifactError;
use thiserror::Error;

/// Result type alias for registry client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Registry client errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Credentials were rejected or the auth handshake failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Manifest does not exist in the repository
    #[error("Manifest not found: {0}")]
    NotFound(String),

    /// Registry answered with an unexpected status code
    #[error("Registry returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Response is missing required headers or carries malformed ones
    #[error("Invalid registry response: {0}")]
    InvalidResponse(String),

    /// Registry-reported digest disagrees with the expected one
    #[error("Content mismatch: {0}")]
    ContentMismatch(String),

    /// Manifest body exceeds the configured limit
    #[error("Manifest exceeds the {limit} byte limit")]
    ManifestTooLarge { limit: u64 },

    /// Network or protocol failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Client could not be constructed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Domain error from core crate
    #[error("{0}")]
    Domain(#[from] ArtifactError),
}

impl ClientError {
    /// Check if this error is an authentication failure
    pub fn is_authentication(&self) -> bool {
        matches!(self, ClientError::Authentication(_))
    }

    /// Check if this error is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    /// Check if this error means received content cannot be trusted
    pub fn is_content_mismatch(&self) -> bool {
        match self {
            ClientError::ContentMismatch(_) => true,
            ClientError::Domain(err) => err.is_verification_failure(),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}
