//! OCI registry client for annotation manifests
//!
//! This crate talks to OCI-compliant registries on behalf of the attach
//! pipeline:
//! - A `ManifestStore` trait covering manifest fetch and push
//! - An HTTP implementation (`RegistryClient`) built on reqwest
//! - Basic and bearer-token authentication driven by registry challenges
//! - A pluggable `CredentialResolver` supplying username/password pairs
//!
//! # Example
//!
//! ```rust,no_run
//! use annotation_client::{ClientConfig, Credential, ManifestStore, RegistryClient, StaticCredentials};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Arc::new(StaticCredentials::new(Credential::new("ci-bot", "secret")));
//! let client = RegistryClient::for_repository(
//!     "myregistry.example.com",
//!     "team/app",
//!     credentials,
//!     ClientConfig::new(),
//! )?;
//!
//! let manifest = client.fetch_manifest(&"v1.0.0".parse()?).await?;
//! println!("{}", manifest.descriptor);
//! # Ok(())
//! # }
//! ```

// Re-export core domain types for convenience
pub use annotation_core;

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod store;

// Re-exports for convenience
pub use auth::{Challenge, Credential, CredentialResolver, StaticCredentials};
pub use client::RegistryClient;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use store::{FetchedManifest, ManifestStore};
