//! Error types for the schema extractor

use thiserror::Error;

/// Result type for extractor operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Schema extractor errors
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Cannot reach schema registry at {url}: {message}")]
    Connectivity { url: String, message: String },

    #[error("Schema registry rejected credentials: {0}")]
    Auth(String),

    #[error("Schema registry error {code}: {message}")]
    Registry { code: i64, message: String },

    #[error("Not found: subject {subject} version {version}")]
    NotFound { subject: String, version: String },

    #[error("Malformed schema for subject {subject}: {message}")]
    MalformedSchema { subject: String, message: String },

    #[error("Schema nesting exceeds maximum depth of {max_depth}")]
    SchemaTooDeep { max_depth: usize },

    #[error("Invalid registry URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExtractError {
    /// Build a `MalformedSchema` error for a subject
    pub fn malformed(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedSchema {
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Short, stable label for logs and skip reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connectivity { .. } => "connectivity",
            Self::Auth(_) => "auth",
            Self::Registry { .. } => "registry",
            Self::NotFound { .. } => "not_found",
            Self::MalformedSchema { .. } => "malformed_schema",
            Self::SchemaTooDeep { .. } => "schema_too_deep",
            Self::InvalidUrl { .. } => "invalid_url",
            Self::Http(_) => "http",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }
}
