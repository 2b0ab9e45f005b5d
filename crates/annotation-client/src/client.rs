//! HTTP implementation of [`ManifestStore`]
//!
//! Speaks the manifest endpoints of the OCI distribution API:
//!
//! - `GET /v2/<name>/manifests/<reference>`
//! - `PUT /v2/<name>/manifests/<digest>`
//!
//! Every request is first sent anonymously. A `401` carrying a
//! `WWW-Authenticate` challenge is answered once, either with Basic
//! credentials or with a token obtained from the challenge realm. Tokens are
//! not cached; each request performs its own handshake.

use annotation_core::manifest::media_type;
use annotation_core::{
    ArtifactError, Descriptor, Digest, RepositoryReference, SubjectReference,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE, WWW_AUTHENTICATE};
use reqwest::{RequestBuilder, Response, StatusCode};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::auth::{Challenge, Credential, CredentialResolver, TokenResponse};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::store::{FetchedManifest, ManifestStore};

/// Header carrying the registry's digest of a manifest
pub const DOCKER_CONTENT_DIGEST: &str = "docker-content-digest";

/// Longest registry error body echoed back in an error message
const MAX_ERROR_BODY: usize = 512;

/// Registry client bound to one repository
#[derive(Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    reference: RepositoryReference,
    credentials: Arc<dyn CredentialResolver>,
    config: ClientConfig,
}

impl RegistryClient {
    /// Create a client for an already parsed repository reference
    ///
    /// # Errors
    /// Returns a configuration error if the configuration is invalid or the
    /// HTTP client cannot be built
    pub fn new(
        reference: RepositoryReference,
        credentials: Arc<dyn CredentialResolver>,
        config: ClientConfig,
    ) -> ClientResult<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            reference,
            credentials,
            config,
        })
    }

    /// Create a client for `registry/repository`
    ///
    /// # Errors
    /// Returns a domain `InvalidReference` error if the joined string is not a
    /// well-formed repository reference
    pub fn for_repository(
        registry: &str,
        repository: &str,
        credentials: Arc<dyn CredentialResolver>,
        config: ClientConfig,
    ) -> ClientResult<Self> {
        let reference = RepositoryReference::new(registry, repository)?;
        Self::new(reference, credentials, config)
    }

    fn manifest_url(&self, reference: &str) -> String {
        format!(
            "{}://{}/v2/{}/manifests/{}",
            self.config.scheme(),
            self.reference.registry(),
            self.reference.repository(),
            reference
        )
    }

    /// Send a request, answering at most one authentication challenge
    async fn send_authorized<F>(&self, build: F) -> ClientResult<Response>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let response = build().send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let challenge = header_str(response.headers(), WWW_AUTHENTICATE.as_str())
            .map(Challenge::parse)
            .transpose()?
            .ok_or_else(|| {
                ClientError::Authentication(
                    "registry returned 401 without an authentication challenge".to_string(),
                )
            })?;
        drop(response);

        let credential = self.credentials.resolve(self.reference.registry());
        let request = match challenge {
            Challenge::Basic => {
                debug!("Answering basic challenge");
                build().basic_auth(&credential.username, Some(credential.password()))
            }
            Challenge::Bearer {
                realm,
                service,
                scope,
            } => {
                debug!(realm = %realm, scope = ?scope, "Answering bearer challenge");
                let token = self
                    .fetch_token(&credential, &realm, service.as_deref(), scope.as_deref())
                    .await?;
                build().bearer_auth(token)
            }
        };

        let response = request.send().await?;
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ClientError::Authentication(format!(
                    "{} rejected the credentials for {} ({})",
                    self.reference.registry(),
                    credential.username,
                    response.status()
                )))
            }
            _ => Ok(response),
        }
    }

    /// Exchange Basic credentials for a bearer token
    async fn fetch_token(
        &self,
        credential: &Credential,
        realm: &str,
        service: Option<&str>,
        scope: Option<&str>,
    ) -> ClientResult<String> {
        let realm_url = Url::parse(realm).map_err(|e| {
            ClientError::Authentication(format!("invalid token realm {:?}: {}", realm, e))
        })?;

        let mut query = Vec::new();
        if let Some(service) = service {
            query.push(("service", service));
        }
        if let Some(scope) = scope {
            query.push(("scope", scope));
        }

        let response = self
            .http
            .get(realm_url)
            .query(&query)
            .basic_auth(&credential.username, Some(credential.password()))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Authentication(format!(
                "token service {} returned {}",
                realm,
                response.status()
            )));
        }

        let token: TokenResponse = response.json().await?;
        token.into_token()
    }

    /// Read a response body, refusing to buffer more than the manifest limit
    ///
    /// A connection that closes before `expected` bytes arrived is a size
    /// mismatch, not a transport failure.
    async fn read_body(&self, mut response: Response, expected: u64) -> ClientResult<Vec<u8>> {
        let limit = self.config.max_manifest_bytes;
        let mut content = Vec::new();

        loop {
            let chunk = match response.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(err) if !err.is_timeout() && (content.len() as u64) < expected => {
                    warn!(error = %err, received = content.len(), expected, "Body ended early");
                    return Err(ArtifactError::SizeMismatch {
                        expected,
                        actual: content.len() as u64,
                    }
                    .into());
                }
                Err(err) => return Err(err.into()),
            };
            if (content.len() + chunk.len()) as u64 > limit {
                return Err(ClientError::ManifestTooLarge { limit });
            }
            content.extend_from_slice(&chunk);
        }

        Ok(content)
    }
}

#[async_trait]
impl ManifestStore for RegistryClient {
    fn repository(&self) -> &RepositoryReference {
        &self.reference
    }

    #[instrument(skip(self), fields(repository = %self.reference, reference = %reference))]
    async fn fetch_manifest(&self, reference: &SubjectReference) -> ClientResult<FetchedManifest> {
        let url = self.manifest_url(&reference.to_string());
        let accept = media_type::MANIFEST_TYPES.join(", ");
        debug!("Fetching manifest");

        let response = self
            .send_authorized(|| self.http.get(&url).header(ACCEPT, accept.as_str()))
            .await?;

        if !response.status().is_success() {
            return Err(error_for_status(response, &self.reference.qualify(reference)).await);
        }

        let media_type = header_str(response.headers(), CONTENT_TYPE.as_str())
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ClientError::InvalidResponse("missing Content-Type".to_string()))?;

        let size = response
            .content_length()
            .ok_or_else(|| ClientError::InvalidResponse("missing Content-Length".to_string()))?;
        if size > self.config.max_manifest_bytes {
            return Err(ClientError::ManifestTooLarge {
                limit: self.config.max_manifest_bytes,
            });
        }

        let reported = header_str(response.headers(), DOCKER_CONTENT_DIGEST)
            .map(str::parse::<Digest>)
            .transpose()
            .map_err(|e| {
                ClientError::InvalidResponse(format!("invalid Docker-Content-Digest: {}", e))
            })?;

        let content = self.read_body(response, size).await?;

        let digest = match (reference.digest(), reported) {
            (Some(requested), Some(reported)) if *requested != reported => {
                return Err(ClientError::ContentMismatch(format!(
                    "requested {} but registry reported {}",
                    requested, reported
                )));
            }
            (Some(requested), _) => requested.clone(),
            (None, Some(reported)) => reported,
            (None, None) => {
                warn!("Registry did not report a digest, using digest of received content");
                Digest::from_bytes(&content)
            }
        };

        debug!(digest = %digest, size, media_type = %media_type, "Fetched manifest");

        Ok(FetchedManifest {
            descriptor: Descriptor::new(media_type, digest, size),
            content,
        })
    }

    #[instrument(skip(self, content), fields(repository = %self.reference, digest = %descriptor.digest))]
    async fn push_manifest(&self, descriptor: &Descriptor, content: &[u8]) -> ClientResult<()> {
        let url = self.manifest_url(&descriptor.digest.to_string());
        debug!(size = content.len(), "Pushing manifest");

        let response = self
            .send_authorized(|| {
                self.http
                    .put(&url)
                    .header(CONTENT_TYPE, descriptor.media_type.as_str())
                    .body(content.to_vec())
            })
            .await?;

        if !response.status().is_success() {
            return Err(error_for_status(response, &url).await);
        }

        if let Some(reported) = header_str(response.headers(), DOCKER_CONTENT_DIGEST) {
            if reported.parse::<Digest>().ok().as_ref() != Some(&descriptor.digest) {
                return Err(ClientError::ContentMismatch(format!(
                    "pushed {} but registry stored {}",
                    descriptor.digest, reported
                )));
            }
        }

        info!("Manifest pushed");
        Ok(())
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Convert a non-success response into an error, consuming its body
async fn error_for_status(response: Response, target: &str) -> ClientError {
    let status = response.status();
    let mut message = response.text().await.unwrap_or_default();
    if message.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        message.truncate(end);
    }

    match status {
        StatusCode::NOT_FOUND => ClientError::NotFound(target.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ClientError::Authentication(format!("{} returned {}", target, status))
        }
        _ => ClientError::Status {
            status: status.as_u16(),
            message: message.trim().to_string(),
        },
    }
}
