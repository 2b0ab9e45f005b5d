//! Service layer for attaching annotations
//!
//! This crate sits between the command line and the registry client. It
//! turns operator input into an annotation manifest and drives it through the
//! registry:
//!
//! - **Annotation parsing**: `"key: value"` flags into an annotation mapping
//! - **Subject resolution**: fetch the subject manifest and verify its size and digest
//! - **Manifest push**: build the reference manifest and push the exact bytes
//!   that were digested
//!
//! # Example
//!
//! ```rust,no_run
//! use annotation_client::{ClientConfig, Credential};
//! use annotation_service::{attach, AttachOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = AttachOptions {
//!     registry: "myregistry.example.com".to_string(),
//!     subject_repository: "team/app".to_string(),
//!     subject_tag_or_digest: "v1.0.0".to_string(),
//!     annotations: vec!["team: platform".to_string()],
//!     credential: Credential::new("ci-bot", "secret"),
//! };
//!
//! let outcome = attach(&options, ClientConfig::new()).await?;
//! println!("{}", outcome.reference);
//! # Ok(())
//! # }
//! ```

pub mod attach;
pub mod error;

// Re-export main types for convenience
pub use attach::{
    attach, run_pipeline, verify_subject, AttachOptions, AttachOutcome, AttachService,
    AttachStage, DefaultAttachService, Progress,
};
pub use error::{ServiceError, ServiceResult};
