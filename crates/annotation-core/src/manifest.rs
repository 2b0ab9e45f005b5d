//! Reference manifest document
//!
//! A reference manifest carries no content of its own. Its `subject` points
//! at an existing artifact and its `annotations` hold the metadata being
//! attached, so the subject is never modified.

use serde::{Deserialize, Serialize};

use crate::annotation::Annotations;
use crate::descriptor::Descriptor;
use crate::error::ArtifactResult;

/// Media types understood when fetching and pushing manifests
pub mod media_type {
    /// ORAS artifact manifest
    pub const ARTIFACT_MANIFEST: &str = "application/vnd.cncf.oras.artifact.manifest.v1+json";
    /// OCI image manifest
    pub const OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
    /// OCI image index
    pub const OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";
    /// Docker image manifest, schema 2
    pub const DOCKER_MANIFEST: &str = "application/vnd.docker.distribution.manifest.v2+json";
    /// Docker manifest list
    pub const DOCKER_MANIFEST_LIST: &str =
        "application/vnd.docker.distribution.manifest.list.v2+json";

    /// Everything accepted when resolving a subject
    pub const MANIFEST_TYPES: &[&str] = &[
        OCI_MANIFEST,
        OCI_INDEX,
        DOCKER_MANIFEST,
        DOCKER_MANIFEST_LIST,
        ARTIFACT_MANIFEST,
    ];
}

/// Artifact type recorded on every annotation manifest
pub const ANNOTATIONS_ARTIFACT_TYPE: &str = "annotations/json";

/// Reference manifest pointing at a subject artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceManifest {
    /// Media type of this manifest
    pub media_type: String,
    /// Kind of artifact this manifest represents
    pub artifact_type: String,
    /// The artifact being annotated
    pub subject: Descriptor,
    /// Attached metadata
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
}

/// Serialized manifest together with the descriptor of those exact bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedManifest {
    /// Descriptor computed over `content`
    pub descriptor: Descriptor,
    /// Canonical JSON bytes
    pub content: Vec<u8>,
}

impl ReferenceManifest {
    /// Build an annotation manifest for `subject`
    pub fn new(subject: Descriptor, annotations: Annotations) -> Self {
        Self {
            media_type: media_type::ARTIFACT_MANIFEST.to_string(),
            artifact_type: ANNOTATIONS_ARTIFACT_TYPE.to_string(),
            subject,
            annotations,
        }
    }

    /// Serialize to compact canonical JSON
    ///
    /// # Errors
    /// Returns a serialization error if encoding fails
    pub fn to_canonical_json(&self) -> ArtifactResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Serialize and describe the serialized bytes
    ///
    /// # Errors
    /// Returns a serialization error if encoding fails
    pub fn encode(&self) -> ArtifactResult<EncodedManifest> {
        let content = self.to_canonical_json()?;
        let descriptor = Descriptor::for_content(self.media_type.clone(), &content);
        Ok(EncodedManifest {
            descriptor,
            content,
        })
    }
}
