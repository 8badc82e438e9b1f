//! Configuration file format.
//!
//! Every section is optional; anything left out falls back to the
//! defaults the client ships with.
//!
//! ```toml
//! [service]
//! base_url = "http://192.168.1.105:5000"
//!
//! [health]
//! timeout_ms = 5000
//!
//! [analyze]
//! timeout_ms = 30000
//! max_retries = 1
//! backoff_multiplier = 1.0
//!
//! [capture]
//! width = 640
//! height = 480
//! permission = "grant-on-request"
//! source = { kind = "file", path = "face.jpg" }
//!
//! [metrics]
//! port = 9090
//! ```

use crate::capture::CaptureConfig;
use crate::client::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Width or height is zero.
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    /// JPEG quality outside 1-100.
    #[error("invalid JPEG quality {0} (must be 1-100)")]
    InvalidQuality(u8),
    /// Unknown camera source.
    #[error("invalid camera source '{0}' (expected mock, device or file:<path>)")]
    InvalidSource(String),
    /// The service base URL is unusable.
    #[error("invalid service URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
    /// A retry section is out of range.
    #[error("invalid [{section}] retry policy: {reason}")]
    InvalidRetry {
        /// Section name, `health` or `analyze`.
        section: &'static str,
        /// What was out of range.
        reason: String,
    },
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The configuration file is not valid TOML.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Where the analysis service lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL, e.g. `http://192.168.1.105:5000`.
    pub base_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Checks that the base URL parses and uses http or https.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            reason,
        };
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        Ok(())
    }
}

/// Optional overrides for one endpoint's [`RetryPolicy`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    /// First-attempt timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Retries after the first attempt.
    pub max_retries: Option<u32>,
    /// Timeout growth per retry.
    pub backoff_multiplier: Option<f32>,
}

impl RetrySection {
    /// Applies the overrides on top of `base`.
    pub fn resolve(&self, base: RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            initial_timeout_ms: self.timeout_ms.unwrap_or(base.initial_timeout_ms),
            max_retries: self.max_retries.unwrap_or(base.max_retries),
            backoff_multiplier: self.backoff_multiplier.unwrap_or(base.backoff_multiplier),
        }
    }
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Metrics server port (0 to disable).
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { port: 9090 }
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Where the service lives.
    #[serde(default)]
    pub service: ServiceConfig,
    /// Overrides for `GET /health`.
    #[serde(default)]
    pub health: RetrySection,
    /// Overrides for `POST /analyze`.
    #[serde(default)]
    pub analyze: RetrySection,
    /// Camera and encoding settings.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Prometheus exporter settings.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Health check policy after applying overrides.
    pub fn health_policy(&self) -> RetryPolicy {
        self.health.resolve(RetryPolicy::health())
    }

    /// Analyze policy after applying overrides.
    pub fn analyze_policy(&self) -> RetryPolicy {
        self.analyze.resolve(RetryPolicy::analyze())
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.service.validate()?;
        self.capture.validate()?;
        self.health_policy()
            .validate()
            .map_err(|reason| ConfigError::InvalidRetry {
                section: "health",
                reason,
            })?;
        self.analyze_policy()
            .validate()
            .map_err(|reason| ConfigError::InvalidRetry {
                section: "analyze",
                reason,
            })?;
        Ok(())
    }
}
