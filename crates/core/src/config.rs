//! Storage connection configuration
//!
//! Configuration is read from a TOML file. When no file exists the defaults
//! apply and credentials come from the standard AWS environment.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "LAMBO_CONFIG_DIR";

const CONFIG_FILE_NAME: &str = "config.toml";

/// How buckets are addressed in request URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BucketLookup {
    /// Path-style unless the endpoint says otherwise
    #[default]
    Auto,
    /// `https://endpoint/bucket/key`
    Path,
    /// `https://bucket.endpoint/key`
    Dns,
}

impl BucketLookup {
    pub fn force_path_style(self) -> bool {
        matches!(self, BucketLookup::Path | BucketLookup::Auto)
    }
}

/// Connection settings for an S3-compatible service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Custom endpoint URL; `None` uses the AWS endpoint for the region
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    pub region: String,

    /// Static credentials; when absent the default AWS provider chain is used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,

    pub bucket_lookup: BucketLookup,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: "us-east-1".to_string(),
            access_key: None,
            secret_key: None,
            bucket_lookup: BucketLookup::Auto,
        }
    }
}

impl StorageConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: StorageConfig =
            toml::from_str(s).map_err(|e| Error::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("unable to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Load from the default location, falling back to defaults if no file exists
    pub fn load_default() -> Result<Self> {
        let path = default_config_path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Check that the endpoint is a URL and credentials are complete
    pub fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.endpoint {
            let url = url::Url::parse(endpoint)
                .map_err(|e| Error::Config(format!("invalid endpoint '{endpoint}': {e}")))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(Error::Config(format!(
                    "endpoint '{endpoint}' must use http or https"
                )));
            }
        }

        if self.region.trim().is_empty() {
            return Err(Error::Config("region cannot be empty".to_string()));
        }

        match (&self.access_key, &self.secret_key) {
            (Some(_), None) | (None, Some(_)) => Err(Error::Config(
                "access_key and secret_key must be set together".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Whether static credentials are configured
    pub fn has_static_credentials(&self) -> bool {
        self.access_key.is_some() && self.secret_key.is_some()
    }
}

/// Path of the default configuration file
pub fn default_config_path() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
        return Ok(PathBuf::from(dir).join(CONFIG_FILE_NAME));
    }

    dirs::config_dir()
        .map(|dir| dir.join("lambo").join(CONFIG_FILE_NAME))
        .ok_or_else(|| Error::Config("unable to determine config directory".to_string()))
}
