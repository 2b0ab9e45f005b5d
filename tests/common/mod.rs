//! Common test utilities and helpers
//!
//! This module provides a mock OCI registry built on wiremock plus helpers for
//! building attach options against it.

#![allow(dead_code)]

use annotation_client::{ClientConfig, Credential};
use annotation_core::manifest::media_type;
use annotation_core::Digest;
use annotation_service::AttachOptions;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const REPOSITORY: &str = "team/app";
pub const TAG: &str = "v1.0.0";
pub const USERNAME: &str = "ci-bot";
pub const PASSWORD: &str = "s3cret";
// base64("ci-bot:s3cret")
pub const BASIC_AUTH: &str = "Basic Y2ktYm90OnMzY3JldA==";

/// Subject manifest served by the mock registry
pub const SUBJECT: &[u8] = br#"{"schemaVersion":2,"mediaType":"application/vnd.oci.image.manifest.v1+json","config":{"mediaType":"application/vnd.oci.image.config.v1+json","digest":"sha256:44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a","size":2},"layers":[]}"#;

/// Answers a manifest push the way a registry does, echoing the digest of
/// the received body
pub struct AcceptManifest;

impl Respond for AcceptManifest {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let digest = Digest::from_bytes(&request.body);
        ResponseTemplate::new(201)
            .insert_header("Docker-Content-Digest", digest.to_string().as_str())
            .insert_header(
                "Location",
                format!("/v2/{}/manifests/{}", REPOSITORY, digest).as_str(),
            )
    }
}

/// Mock registry
pub struct MockRegistry {
    pub server: MockServer,
}

impl MockRegistry {
    /// Start a new mock registry
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Registry host as passed on the command line
    pub fn host(&self) -> String {
        self.server.address().to_string()
    }

    /// Digest of the served subject
    pub fn subject_digest() -> Digest {
        Digest::from_bytes(SUBJECT)
    }

    /// Subject response with the headers a registry sets
    pub fn subject_response() -> ResponseTemplate {
        ResponseTemplate::new(200)
            .insert_header("Docker-Content-Digest", Self::subject_digest().to_string().as_str())
            .set_body_raw(SUBJECT, media_type::OCI_MANIFEST)
    }

    /// Serve the subject by tag and digest
    ///
    /// With `authorization`, only requests carrying that header are served.
    pub async fn serve_subject(&self, authorization: Option<&str>) {
        let digest_path = format!("/v2/{}/manifests/{}", REPOSITORY, Self::subject_digest());
        for manifest_path in [format!("/v2/{}/manifests/{}", REPOSITORY, TAG), digest_path] {
            let mut mock = Mock::given(method("GET")).and(path(manifest_path));
            if let Some(authorization) = authorization {
                mock = mock.and(header("authorization", authorization));
            }
            mock.respond_with(Self::subject_response())
                .with_priority(1)
                .mount(&self.server)
                .await;
        }
    }

    /// Accept every manifest push by digest
    ///
    /// With `authorization`, only requests carrying that header are accepted.
    pub async fn accept_pushes(&self, authorization: Option<&str>) {
        let mut mock = Mock::given(method("PUT"))
            .and(path_regex(format!(
                r"^/v2/{}/manifests/sha256:[0-9a-f]{{64}}$",
                REPOSITORY
            )))
            .and(header("content-type", media_type::ARTIFACT_MANIFEST));
        if let Some(authorization) = authorization {
            mock = mock.and(header("authorization", authorization));
        }
        mock.respond_with(AcceptManifest)
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Issue `token` from `/token` in exchange for the test credentials
    pub async fn issue_token(&self, token: &str) {
        Mock::given(method("GET"))
            .and(path("/token"))
            .and(header("authorization", BASIC_AUTH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": token })),
            )
            .mount(&self.server)
            .await;
    }

    /// Bearer challenge pointing at this registry's token endpoint
    pub fn bearer_challenge(&self) -> String {
        format!(
            r#"Bearer realm="{}/token",service="mock-registry",scope="repository:{}:pull,push""#,
            self.server.uri(),
            REPOSITORY
        )
    }

    /// Answer every `/v2/` request no other mock serves with a 401 challenge
    pub async fn challenge(&self, www_authenticate: &str) {
        Mock::given(path_regex(r"^/v2/"))
            .respond_with(
                ResponseTemplate::new(401).insert_header("WWW-Authenticate", www_authenticate),
            )
            .with_priority(10)
            .mount(&self.server)
            .await;
    }

    /// Bodies of all manifest pushes received so far
    pub async fn pushed_manifests(&self) -> Vec<Vec<u8>> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.method.as_str() == "PUT")
            .map(|request| request.body)
            .collect()
    }
}

/// Attach options for the served subject
pub fn options(registry: &MockRegistry, annotations: &[&str]) -> AttachOptions {
    AttachOptions {
        registry: registry.host(),
        subject_repository: REPOSITORY.to_string(),
        subject_tag_or_digest: TAG.to_string(),
        annotations: annotations.iter().map(|s| s.to_string()).collect(),
        credential: Credential::new(USERNAME, PASSWORD),
    }
}

/// Client configuration for talking to the mock registry
pub fn client_config() -> ClientConfig {
    ClientConfig::new().plain_http(true)
}
