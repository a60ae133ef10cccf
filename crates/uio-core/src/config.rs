//! Configuration module
//!
//! Storage credentials never live here; they come from the URI or the environment.

use crate::{Error, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use uio_cloud::RetryPolicy;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UioConfig {
    /// HTTP client settings
    pub http: HttpConfig,
    /// Object upload settings
    pub upload: UploadConfig,
    /// Local staging of object writes
    pub staging: StagingConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Upload retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Attempts per upload, including the first
    pub max_attempts: u32,
    /// Wait after the first failed attempt; doubles after each further failure
    pub initial_backoff_ms: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 100,
        }
    }
}

/// Staging file configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Directory for staging files (system temp dir when unset)
    pub dir: Option<PathBuf>,
}

impl UioConfig {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| Error::Config("Unable to determine config directory".to_string()))?;
        Ok(config_dir.join("uio").join("config.toml"))
    }

    /// Load configuration from the default location, using defaults if the file is absent
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from `path`
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&contents)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration or use defaults if loading fails
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Reject settings no opener can work with
    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            return Err(Error::Config("http.timeout_secs must be at least 1".to_string()));
        }
        if self.upload.max_attempts == 0 {
            return Err(Error::Config("upload.max_attempts must be at least 1".to_string()));
        }
        Ok(())
    }

    /// HTTP request timeout
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// Retry policy for staged uploads
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.upload.max_attempts,
            Duration::from_millis(self.upload.initial_backoff_ms),
        )
    }
}
