//! Service-layer error types
//!
//! This module defines the errors reported by the attach pipeline, mapping
//! domain and registry client errors onto what the operator needs to know.
//! Which pipeline step failed decides the mapping of a client error: an auth
//! rejection while resolving the subject is `AuthenticationFailed`, while any
//! failure of the final push is `PushFailed`.

use annotation_client::ClientError;
use annotation_core::ArtifactError;
use thiserror::Error;

/// Result type alias for service operations
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Service-layer error types
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Annotation flag is not of the form `key: value`
    #[error("Malformed annotation: {0}")]
    MalformedAnnotation(String),

    /// Registry, repository, tag or digest is not well formed
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Registry rejected the credentials
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Fetched subject does not match its descriptor
    #[error("Content verification failed: {0}")]
    ContentVerificationFailed(String),

    /// Subject manifest could not be fetched
    #[error("Failed to fetch subject: {0}")]
    SubjectFetchFailed(String),

    /// Registry did not accept the annotation manifest
    #[error("Push failed: {0}")]
    PushFailed(#[source] ClientError),

    /// Internal service error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Map a client error raised while resolving the subject
    pub fn from_fetch(err: ClientError) -> Self {
        match err {
            ClientError::Authentication(msg) => ServiceError::AuthenticationFailed(msg),
            ClientError::Domain(err) => ServiceError::from(err),
            err if err.is_content_mismatch() => {
                ServiceError::ContentVerificationFailed(err.to_string())
            }
            err => ServiceError::SubjectFetchFailed(err.to_string()),
        }
    }

    /// Map a client error raised while pushing the manifest
    pub fn from_push(err: ClientError) -> Self {
        ServiceError::PushFailed(err)
    }

    /// Map a client error raised while constructing the client
    pub fn from_setup(err: ClientError) -> Self {
        match err {
            ClientError::Domain(err) => ServiceError::from(err),
            err => ServiceError::Internal(err.to_string()),
        }
    }
}

impl From<ArtifactError> for ServiceError {
    fn from(err: ArtifactError) -> Self {
        match err {
            ArtifactError::MalformedAnnotation(raw) => ServiceError::MalformedAnnotation(raw),
            ArtifactError::InvalidReference(msg) => ServiceError::InvalidReference(msg),
            ArtifactError::InvalidDigest(msg) => ServiceError::InvalidReference(msg),
            err @ (ArtifactError::SizeMismatch { .. } | ArtifactError::DigestMismatch { .. }) => {
                ServiceError::ContentVerificationFailed(err.to_string())
            }
            ArtifactError::Serialization(msg) => ServiceError::Internal(msg),
        }
    }
}
