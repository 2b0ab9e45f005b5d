//! Registry client configuration

use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default upper bound for a fetched manifest (4 MiB)
pub const DEFAULT_MAX_MANIFEST_BYTES: u64 = 4 * 1024 * 1024;

/// Default `User-Agent` header
pub const DEFAULT_USER_AGENT: &str = concat!("annotation/", env!("CARGO_PKG_VERSION"));

/// Configuration for the registry client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Talk plain HTTP instead of HTTPS (local test registries)
    pub plain_http: bool,

    /// Timeout applied to each HTTP request
    pub request_timeout: Duration,

    /// Largest manifest body that will be read into memory
    pub max_manifest_bytes: u64,

    /// `User-Agent` sent with every request
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a configuration with sensible defaults
    pub fn new() -> Self {
        Self {
            plain_http: false,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_manifest_bytes: DEFAULT_MAX_MANIFEST_BYTES,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Use plain HTTP
    pub fn plain_http(mut self, enabled: bool) -> Self {
        self.plain_http = enabled;
        self
    }

    /// Set per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the manifest size limit
    pub fn max_manifest_bytes(mut self, limit: u64) -> Self {
        self.max_manifest_bytes = limit;
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// URL scheme implied by the configuration
    pub fn scheme(&self) -> &'static str {
        if self.plain_http {
            "http"
        } else {
            "https"
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> ClientResult<()> {
        if self.max_manifest_bytes == 0 {
            return Err(ClientError::Configuration(
                "max_manifest_bytes must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ClientError::Configuration(
                "request timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
