//! Registry authentication
//!
//! Credentials are supplied by a [`CredentialResolver`]. Registries announce
//! how they want to be authenticated through a `WWW-Authenticate` challenge on
//! a `401` response: either `Basic`, or `Bearer` with a token service that
//! exchanges Basic credentials for a short-lived token.

use once_cell::sync::Lazy;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

use crate::error::{ClientError, ClientResult};

/// Username/password pair presented to a registry
#[derive(Clone)]
pub struct Credential {
    /// Account name
    pub username: String,
    /// Password or access token
    pub password: SecretString,
}

impl Credential {
    /// Create a new credential
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::new(password.into()),
        }
    }

    /// Expose the password for placing it on the wire
    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Source of credentials for a registry
///
/// Implementations must be pure: the same registry always yields the same
/// credential, and nothing is cached between calls.
pub trait CredentialResolver: Send + Sync {
    /// Credential to present to `registry`
    fn resolve(&self, registry: &str) -> Credential;
}

/// Resolver that answers every registry with one fixed credential
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    credential: Credential,
}

impl StaticCredentials {
    /// Create a resolver around a fixed credential
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }
}

impl CredentialResolver for StaticCredentials {
    fn resolve(&self, _registry: &str) -> Credential {
        self.credential.clone()
    }
}

static CHALLENGE_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z][A-Za-z0-9_-]*)=(?:"([^"]*)"|([^,\s]*))"#)
        .expect("static regex is valid")
});

/// Parsed `WWW-Authenticate` challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Challenge {
    /// HTTP Basic authentication
    Basic,
    /// Token exchange against `realm`
    Bearer {
        /// Token service endpoint
        realm: String,
        /// Service name to request a token for
        service: Option<String>,
        /// Requested scope, e.g. `repository:app:pull,push`
        scope: Option<String>,
    },
}

impl Challenge {
    /// Parse the value of a `WWW-Authenticate` header
    ///
    /// # Errors
    /// Returns an authentication error for unknown schemes or a Bearer
    /// challenge without a realm
    pub fn parse(header: &str) -> ClientResult<Self> {
        let header = header.trim();
        let (scheme, params) = header.split_once(' ').unwrap_or((header, ""));

        match scheme.to_ascii_lowercase().as_str() {
            "basic" => Ok(Challenge::Basic),
            "bearer" => {
                let mut params = parse_params(params);
                let realm = params.remove("realm").ok_or_else(|| {
                    ClientError::Authentication("bearer challenge without realm".to_string())
                })?;
                Ok(Challenge::Bearer {
                    realm,
                    service: params.remove("service"),
                    scope: params.remove("scope"),
                })
            }
            _ => Err(ClientError::Authentication(format!(
                "unsupported authentication scheme: {}",
                scheme
            ))),
        }
    }
}

fn parse_params(params: &str) -> HashMap<String, String> {
    CHALLENGE_PARAM
        .captures_iter(params)
        .filter_map(|caps| {
            let key = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps.get(2).or_else(|| caps.get(3))?.as_str().to_string();
            Some((key, value))
        })
        .collect()
}

/// Token service response
///
/// Registries answer with `token`, `access_token`, or both.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

impl TokenResponse {
    pub(crate) fn into_token(self) -> ClientResult<String> {
        self.token
            .or(self.access_token)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ClientError::Authentication("token service returned no token".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic() {
        assert_eq!(
            Challenge::parse(r#"Basic realm="Registry Realm""#).unwrap(),
            Challenge::Basic
        );
        assert_eq!(Challenge::parse("basic").unwrap(), Challenge::Basic);
    }

    #[test]
    fn test_parse_bearer() {
        let challenge = Challenge::parse(
            r#"Bearer realm="https://auth.example.com/token",service="registry.example.com",scope="repository:team/app:pull,push""#,
        )
        .unwrap();
        assert_eq!(
            challenge,
            Challenge::Bearer {
                realm: "https://auth.example.com/token".to_string(),
                service: Some("registry.example.com".to_string()),
                scope: Some("repository:team/app:pull,push".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_bearer_unquoted_and_spaced() {
        let challenge =
            Challenge::parse("Bearer realm=https://auth.example.com/token, service=reg").unwrap();
        assert_eq!(
            challenge,
            Challenge::Bearer {
                realm: "https://auth.example.com/token".to_string(),
                service: Some("reg".to_string()),
                scope: None,
            }
        );
    }

    #[test]
    fn test_bearer_requires_realm() {
        let err = Challenge::parse(r#"Bearer service="reg""#).unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn test_unknown_scheme() {
        assert!(Challenge::parse("Negotiate abc").is_err());
    }

    #[test]
    fn test_static_credentials_ignore_registry() {
        let resolver = StaticCredentials::new(Credential::new("ci-bot", "s3cret"));
        let a = resolver.resolve("a.example.com");
        let b = resolver.resolve("auth.b.example.com");
        assert_eq!(a.username, "ci-bot");
        assert_eq!(a.password(), "s3cret");
        assert_eq!(b.username, a.username);
        assert_eq!(b.password(), a.password());
    }

    #[test]
    fn test_credential_debug_redacts_password() {
        let debug = format!("{:?}", Credential::new("ci-bot", "s3cret"));
        assert!(debug.contains("ci-bot"));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn test_token_response_fields() {
        let token: TokenResponse = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(token.into_token().unwrap(), "abc");

        let token: TokenResponse =
            serde_json::from_str(r#"{"access_token":"xyz","expires_in":300}"#).unwrap();
        assert_eq!(token.into_token().unwrap(), "xyz");

        let token: TokenResponse = serde_json::from_str("{}").unwrap();
        assert!(token.into_token().is_err());
    }
}
