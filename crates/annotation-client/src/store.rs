//! Manifest store trait abstraction
//!
//! This module defines the `ManifestStore` trait that abstracts the two
//! registry operations the attach pipeline needs, allowing the HTTP client to
//! be swapped for an in-memory or mock implementation.

use annotation_core::{Descriptor, RepositoryReference, SubjectReference};
use async_trait::async_trait;

use crate::error::ClientResult;

/// Manifest as received from a registry, before any verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedManifest {
    /// Descriptor claimed by the registry response
    pub descriptor: Descriptor,

    /// Raw body bytes
    pub content: Vec<u8>,
}

/// Manifest operations against a single repository
#[async_trait]
pub trait ManifestStore: Send + Sync {
    /// Repository this store is bound to
    fn repository(&self) -> &RepositoryReference;

    /// Fetch the manifest named by a tag or digest
    async fn fetch_manifest(&self, reference: &SubjectReference) -> ClientResult<FetchedManifest>;

    /// Push `content` as the manifest described by `descriptor`
    async fn push_manifest(&self, descriptor: &Descriptor, content: &[u8]) -> ClientResult<()>;
}
