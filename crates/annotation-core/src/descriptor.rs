//! Content descriptors

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::digest::Digest;
use crate::error::{ArtifactError, ArtifactResult};

/// Descriptor identifying content by media type, digest and size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Media type of the referenced content
    pub media_type: String,
    /// Digest of the referenced content
    pub digest: Digest,
    /// Size of the referenced content in bytes
    pub size: u64,
}

impl Descriptor {
    /// Create a new descriptor
    pub fn new(media_type: impl Into<String>, digest: Digest, size: u64) -> Self {
        Self {
            media_type: media_type.into(),
            digest,
            size,
        }
    }

    /// Describe `content` with the canonical digest and its exact length
    pub fn for_content(media_type: impl Into<String>, content: &[u8]) -> Self {
        Self::new(media_type, Digest::from_bytes(content), content.len() as u64)
    }

    /// Verify that `content` is exactly what this descriptor claims
    ///
    /// Size is checked before the hash.
    ///
    /// # Errors
    /// Returns `SizeMismatch` or `DigestMismatch`
    pub fn verify(&self, content: &[u8]) -> ArtifactResult<()> {
        let actual_size = content.len() as u64;
        if actual_size != self.size {
            return Err(ArtifactError::SizeMismatch {
                expected: self.size,
                actual: actual_size,
            });
        }

        if !self.digest.verify(content) {
            return Err(ArtifactError::DigestMismatch {
                expected: self.digest.to_string(),
                actual: Digest::compute(self.digest.algorithm(), content).to_string(),
            });
        }

        Ok(())
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {} bytes)", self.digest, self.media_type, self.size)
    }
}
