//! Command configuration
//!
//! Configuration is loaded from multiple sources, later ones overriding
//! earlier ones:
//! - Configuration file (`<config_dir>/default.toml`, optional)
//! - Environment variables (`ANNOTATION__<SECTION>__<KEY>`)
//! - Command-line flags

use annotation_client::config::{
    DEFAULT_MAX_MANIFEST_BYTES, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
use annotation_client::ClientConfig;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Registry transport settings
    #[serde(default)]
    pub registry: RegistrySettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Registry transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Use plain HTTP instead of HTTPS
    #[serde(default)]
    pub plain_http: bool,

    /// Deadline for the whole attach run in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Timeout for a single HTTP request in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Largest subject manifest that will be fetched
    #[serde(default = "default_max_manifest_bytes")]
    pub max_manifest_bytes: u64,

    /// `User-Agent` header
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout() -> u64 {
    120
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_max_manifest_bytes() -> u64 {
    DEFAULT_MAX_MANIFEST_BYTES
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            plain_http: false,
            timeout_seconds: default_timeout(),
            request_timeout_seconds: default_request_timeout(),
            max_manifest_bytes: default_max_manifest_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON formatting
    #[serde(default)]
    pub json_format: bool,

    /// Include target module
    #[serde(default)]
    pub include_target: bool,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            include_target: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the config directory and environment
    ///
    /// # Errors
    ///
    /// Returns an error if a source exists but cannot be parsed
    pub fn load(config_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let config_dir = config_dir.into();

        let config = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // e.g., ANNOTATION__REGISTRY__PLAIN_HTTP=true
            .add_source(
                Environment::with_prefix("ANNOTATION")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration, falling back to defaults on error
    pub fn load_or_default(config_dir: impl Into<PathBuf>) -> Self {
        Self::load(config_dir).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load configuration: {}", e);
            eprintln!("Using default configuration");
            Self::default()
        })
    }

    /// Registry client configuration derived from these settings
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new()
            .plain_http(self.registry.plain_http)
            .request_timeout(Duration::from_secs(self.registry.request_timeout_seconds))
            .max_manifest_bytes(self.registry.max_manifest_bytes)
            .user_agent(self.registry.user_agent.clone())
    }

    /// End-to-end deadline for an attach run
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.registry.timeout_seconds)
    }
}
