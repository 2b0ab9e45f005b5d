//! Core domain models and types for OCI annotation manifests
//!
//! This crate contains the data structures shared by the registry client and
//! the attach pipeline: content digests, descriptors, the reference manifest
//! document, annotation parsing, and registry reference parsing.

pub mod annotation;
pub mod descriptor;
pub mod digest;
pub mod error;
pub mod manifest;
pub mod reference;

// Re-exports for convenience
pub use annotation::{parse_annotations, Annotations};
pub use descriptor::Descriptor;
pub use digest::{Digest, DigestAlgorithm};
pub use error::{ArtifactError, ArtifactResult};
pub use manifest::{EncodedManifest, ReferenceManifest};
pub use reference::{RepositoryReference, SubjectReference};
