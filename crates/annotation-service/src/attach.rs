//! Attach pipeline
//!
//! Attaching annotations is a single forward-only run:
//!
//! ```text
//! Init -> Authenticated -> SubjectResolved -> Pushed -> Done
//!   \__________\_______________\______________\____-> Failed
//! ```
//!
//! Nothing is written to the registry before the final push, so a failure at
//! any stage needs no cleanup and nothing is retried.

use annotation_client::{
    ClientConfig, Credential, FetchedManifest, ManifestStore, RegistryClient, StaticCredentials,
};
use annotation_core::{
    parse_annotations, Annotations, Descriptor, ReferenceManifest, SubjectReference,
};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{ServiceError, ServiceResult};

/// Stage of an attach run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachStage {
    /// Nothing has happened yet
    Init,
    /// Registry accepted the credentials and served the subject
    Authenticated,
    /// Subject descriptor fetched and verified
    SubjectResolved,
    /// Annotation manifest accepted by the registry
    Pushed,
    /// Run finished successfully
    Done,
    /// Run aborted
    Failed,
}

impl fmt::Display for AttachStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Authenticated => write!(f, "authenticated"),
            Self::SubjectResolved => write!(f, "subject_resolved"),
            Self::Pushed => write!(f, "pushed"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Tracks the stage of a run and logs every transition
#[derive(Debug)]
pub struct Progress {
    stage: AttachStage,
}

impl Progress {
    /// Start a new run
    pub fn new() -> Self {
        Self {
            stage: AttachStage::Init,
        }
    }

    /// Current stage
    pub fn stage(&self) -> AttachStage {
        self.stage
    }

    /// Move forward to `next`
    pub fn advance(&mut self, next: AttachStage) {
        debug!(from = %self.stage, to = %next, "Attach stage transition");
        self.stage = next;
    }

    /// Record the end of the run
    pub fn finish<T>(&mut self, result: &ServiceResult<T>) {
        match result {
            Ok(_) => self.advance(AttachStage::Done),
            Err(err) => {
                warn!(failed_at = %self.stage, error = %err, "Attach failed");
                self.stage = AttachStage::Failed;
            }
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything needed for one attach run
///
/// Built once from operator input and never mutated.
#[derive(Debug, Clone)]
pub struct AttachOptions {
    /// Registry host, e.g. `myregistry.example.com`
    pub registry: String,
    /// Repository holding the subject
    pub subject_repository: String,
    /// Tag or digest of the subject
    pub subject_tag_or_digest: String,
    /// Raw `"key: value"` annotation strings
    pub annotations: Vec<String>,
    /// Credential presented to the registry
    pub credential: Credential,
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachOutcome {
    /// Fully qualified reference of the pushed manifest
    pub reference: String,
    /// Descriptor of the pushed manifest
    #[serde(flatten)]
    pub manifest: Descriptor,
    /// Descriptor of the annotated subject
    pub subject: Descriptor,
}

/// Trait for the two registry-facing steps of the pipeline
#[async_trait]
pub trait AttachService: Send + Sync {
    /// Fetch the subject manifest as served by the registry
    async fn fetch_subject(&self, reference: &SubjectReference) -> ServiceResult<FetchedManifest>;

    /// Build the annotation manifest for `subject` and push it
    async fn push_annotations(
        &self,
        subject: &Descriptor,
        annotations: Annotations,
    ) -> ServiceResult<AttachOutcome>;
}

/// Default implementation of AttachService
pub struct DefaultAttachService {
    store: Arc<dyn ManifestStore>,
}

impl DefaultAttachService {
    /// Create a new attach service on top of a manifest store
    pub fn new(store: Arc<dyn ManifestStore>) -> Self {
        Self { store }
    }

    /// Fetch the subject and return its verified descriptor
    pub async fn resolve_subject(&self, reference: &SubjectReference) -> ServiceResult<Descriptor> {
        verify_subject(self.fetch_subject(reference).await?)
    }
}

#[async_trait]
impl AttachService for DefaultAttachService {
    #[instrument(skip(self), fields(repository = %self.store.repository()))]
    async fn fetch_subject(&self, reference: &SubjectReference) -> ServiceResult<FetchedManifest> {
        self.store
            .fetch_manifest(reference)
            .await
            .map_err(ServiceError::from_fetch)
    }

    #[instrument(skip(self, annotations), fields(repository = %self.store.repository(), subject = %subject.digest))]
    async fn push_annotations(
        &self,
        subject: &Descriptor,
        annotations: Annotations,
    ) -> ServiceResult<AttachOutcome> {
        let encoded = ReferenceManifest::new(subject.clone(), annotations).encode()?;
        debug!(digest = %encoded.descriptor.digest, size = encoded.descriptor.size, "Encoded annotation manifest");

        self.store
            .push_manifest(&encoded.descriptor, &encoded.content)
            .await
            .map_err(ServiceError::from_push)?;

        Ok(AttachOutcome {
            reference: format!("{}@{}", self.store.repository(), encoded.descriptor.digest),
            manifest: encoded.descriptor,
            subject: subject.clone(),
        })
    }
}

/// Check a fetched subject against the descriptor the registry claimed
///
/// # Errors
/// Returns `ContentVerificationFailed` on a size or digest mismatch
pub fn verify_subject(fetched: FetchedManifest) -> ServiceResult<Descriptor> {
    fetched.descriptor.verify(&fetched.content)?;

    let claimed = fetched.descriptor;
    Ok(Descriptor::new(claimed.media_type, claimed.digest, claimed.size))
}

/// Resolve the subject and push the annotation manifest
///
/// # Errors
/// Returns the first error of either step; nothing is pushed if resolution
/// fails
pub async fn run_pipeline(
    service: &dyn AttachService,
    subject: &SubjectReference,
    annotations: Annotations,
    progress: &mut Progress,
) -> ServiceResult<AttachOutcome> {
    let fetched = service.fetch_subject(subject).await?;
    progress.advance(AttachStage::Authenticated);

    let descriptor = verify_subject(fetched)?;
    info!(subject = %descriptor, "Resolved subject");
    progress.advance(AttachStage::SubjectResolved);

    let outcome = service.push_annotations(&descriptor, annotations).await?;
    info!(reference = %outcome.reference, "Pushed annotation manifest");
    progress.advance(AttachStage::Pushed);

    Ok(outcome)
}

/// Attach annotations to a subject artifact
///
/// Runs the whole pipeline once: parse annotations, bind a registry client,
/// resolve and verify the subject, then push the annotation manifest.
///
/// # Errors
/// Returns the error of the first failing step
pub async fn attach(options: &AttachOptions, config: ClientConfig) -> ServiceResult<AttachOutcome> {
    let mut progress = Progress::new();
    let result = attach_with_progress(options, config, &mut progress).await;
    progress.finish(&result);
    result
}

async fn attach_with_progress(
    options: &AttachOptions,
    config: ClientConfig,
    progress: &mut Progress,
) -> ServiceResult<AttachOutcome> {
    let annotations = parse_annotations(&options.annotations)?;
    debug!(count = annotations.len(), "Parsed annotations");

    let credentials = Arc::new(StaticCredentials::new(options.credential.clone()));
    let client = RegistryClient::for_repository(
        &options.registry,
        &options.subject_repository,
        credentials,
        config,
    )
    .map_err(ServiceError::from_setup)?;
    let subject: SubjectReference = options.subject_tag_or_digest.parse()?;

    let service = DefaultAttachService::new(Arc::new(client));
    run_pipeline(&service, &subject, annotations, progress).await
}
