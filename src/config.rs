//! Configuration management for the schema extractor
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (extractor.toml)
//! - Environment variables (EXTRACTOR__*)
//!
//! ## Example config file (extractor.toml):
//! ```toml
//! [registry]
//! url = "http://localhost:8081"
//! username = "metadata"
//! password = "secret"
//! timeout_secs = 30
//!
//! [normalize]
//! max_depth = 64
//! default_cluster = "kafka-schema-registry"
//!
//! [output]
//! format = "json-lines"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::client::{RegistryClient, RegistryConnection};
use crate::error::{ExtractError, Result};
use crate::normalize::{Normalizer, DEFAULT_MAX_DEPTH};
use crate::table::DEFAULT_CLUSTER;

/// Main configuration for the extractor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Registry connection settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Normalization settings
    #[serde(default)]
    pub normalize: NormalizeConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Registry connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URL of the schema registry
    #[serde(default)]
    pub url: Option<String>,

    /// Basic auth user
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Normalization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Nesting limit for schema documents
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Cluster used when a schema has no namespace
    #[serde(default = "default_cluster")]
    pub default_cluster: String,
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// How records are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// One compact JSON document per line
    #[default]
    JsonLines,
    Pretty,
    Compact,
}

// Default value functions
fn default_timeout_secs() -> u64 {
    30
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_cluster() -> String {
    DEFAULT_CLUSTER.to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            default_cluster: default_cluster(),
        }
    }
}

impl ExtractorConfig {
    /// Load configuration from default locations
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = [
            "extractor.toml",
            ".extractor.toml",
            "config/extractor.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "metadata", "schema-extract") {
            let xdg_config = config_dir.config_dir().join("extractor.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (EXTRACTOR__REGISTRY__URL, ...)
        builder = builder.add_source(
            Environment::with_prefix("EXTRACTOR")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Registry connection described by this configuration
    pub fn connection(&self) -> Result<RegistryConnection> {
        let url = self.registry.url.as_deref().ok_or_else(|| {
            ExtractError::Config(ConfigError::NotFound("registry.url".to_string()))
        })?;

        Ok(RegistryConnection::new(url)?
            .with_credentials(self.registry.username.clone(), self.registry.password.clone())
            .with_timeout(Duration::from_secs(self.registry.timeout_secs)))
    }

    /// HTTP client for the configured registry
    pub fn client(&self) -> Result<RegistryClient> {
        RegistryClient::new(self.connection()?)
    }

    /// Normalizer with the configured limits
    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.normalize.max_depth, self.normalize.default_cluster.clone())
    }
}
