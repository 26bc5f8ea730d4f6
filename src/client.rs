//! Schema Registry Client
//!
//! Read-only access to a Confluent-compatible registry:
//!
//! ```text
//! GET {base}/subjects                              -> ["orders-value", ...]
//! GET {base}/subjects/{subject}/versions           -> [1, 2, 3]
//! GET {base}/subjects/{subject}/versions/{version} -> {"schema": "<json text>", ...}
//! ```
//!
//! Errors are reported as `{"error_code": 40401, "message": "..."}` bodies.

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ExtractError, Result};
use crate::schema::{SchemaDocument, SchemaNode};
use crate::version::VersionId;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const ERROR_UNAUTHORIZED: i64 = 401;
const ERROR_SUBJECT_NOT_FOUND: i64 = 40401;
const ERROR_VERSION_NOT_FOUND: i64 = 40402;

const REGISTRY_MEDIA_TYPES: &str = "application/vnd.schemaregistry.v1+json, application/json";

/// Read operations the extractor needs from a registry
///
/// Implementors provide the raw calls; maximum-version selection, schema
/// parsing and the connection probe are derived from them.
pub trait RegistryApi {
    /// All subject names, in registry order
    fn list_subjects(&self) -> Result<Vec<String>>;

    /// All version identifiers of a subject, in registry order
    fn list_versions(&self, subject: &str) -> Result<Vec<VersionId>>;

    /// The embedded schema text of a subject version
    fn fetch_schema_text(&self, subject: &str, version: &VersionId) -> Result<String>;

    /// Probe the registry with a subject listing
    fn check_connection(&self) -> Result<()> {
        self.list_subjects().map(|_| ())
    }

    /// Greatest version of a subject
    fn max_version(&self, subject: &str) -> Result<VersionId> {
        VersionId::max_of(self.list_versions(subject)?).ok_or_else(|| ExtractError::NotFound {
            subject: subject.to_string(),
            version: "any".to_string(),
        })
    }

    /// Fetch and parse the schema document of a subject version
    fn fetch_version(&self, subject: &str, version: &VersionId) -> Result<SchemaDocument> {
        let text = self.fetch_schema_text(subject, version)?;
        SchemaNode::parse(subject, &text)
    }
}

/// Where and how to reach the registry
#[derive(Debug, Clone)]
pub struct RegistryConnection {
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
    timeout: Duration,
}

impl RegistryConnection {
    /// Connection to the registry at `url`, without credentials
    pub fn new(url: &str) -> Result<Self> {
        let base_url = Url::parse(url).map_err(|e| ExtractError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if base_url.cannot_be_a_base() {
            return Err(ExtractError::InvalidUrl {
                url: url.to_string(),
                message: "URL cannot carry a path".to_string(),
            });
        }

        Ok(Self {
            base_url,
            username: None,
            password: None,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username;
        self.password = password;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Basic auth pair, only when both halves are configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}

/// The three registry resources the client reads
#[derive(Debug, Clone, PartialEq, Eq)]
enum Endpoint<'a> {
    Subjects,
    Versions { subject: &'a str },
    Version { subject: &'a str, version: &'a VersionId },
}

impl Endpoint<'_> {
    fn url(&self, base: &Url) -> Result<Url> {
        let mut url = base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| ExtractError::InvalidUrl {
                url: base.to_string(),
                message: "URL cannot carry a path".to_string(),
            })?;
            segments.pop_if_empty().push("subjects");
            match self {
                Endpoint::Subjects => {}
                Endpoint::Versions { subject } => {
                    segments.push(subject).push("versions");
                }
                Endpoint::Version { subject, version } => {
                    segments.push(subject).push("versions").push(&version.to_string());
                }
            }
        }
        Ok(url)
    }

    /// Map an error response onto the error taxonomy
    fn error_from(&self, status: u16, body: &str) -> ExtractError {
        let (code, message) = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => (parsed.error_code, parsed.message.unwrap_or_default()),
            Err(_) => (i64::from(status), body.trim().to_string()),
        };

        if status == 401 || code == ERROR_UNAUTHORIZED {
            return ExtractError::Auth(message);
        }

        let not_found = status == 404 || code == ERROR_SUBJECT_NOT_FOUND || code == ERROR_VERSION_NOT_FOUND;
        match self {
            Endpoint::Versions { subject } if not_found => ExtractError::NotFound {
                subject: subject.to_string(),
                version: "any".to_string(),
            },
            Endpoint::Version { subject, version } if not_found => ExtractError::NotFound {
                subject: subject.to_string(),
                version: version.to_string(),
            },
            _ => ExtractError::Registry { code, message },
        }
    }

    /// Error for a success response whose body does not have the expected shape
    fn unexpected_body(&self, status: u16, err: serde_json::Error) -> ExtractError {
        match self {
            Endpoint::Version { subject, .. } => ExtractError::malformed(*subject, err.to_string()),
            _ => ExtractError::Registry {
                code: i64::from(status),
                message: format!("unexpected response body: {}", err),
            },
        }
    }

    fn decode<T: DeserializeOwned>(&self, status: u16, body: &str) -> Result<T> {
        if !(200..300).contains(&status) {
            return Err(self.error_from(status, body));
        }
        // A success status can still carry a registry error body
        serde_json::from_str(body).map_err(|e| match serde_json::from_str::<ErrorBody>(body) {
            Ok(_) => self.error_from(status, body),
            Err(_) => self.unexpected_body(status, e),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error_code: i64,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersionBody {
    schema: String,
}

/// Blocking HTTP client for a schema registry
pub struct RegistryClient {
    connection: RegistryConnection,
    http_client: reqwest::blocking::Client,
}

impl RegistryClient {
    pub fn new(connection: RegistryConnection) -> Result<Self> {
        let http_client = reqwest::blocking::Client::builder()
            .timeout(connection.timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ExtractError::Http(e.to_string()))?;

        Ok(Self {
            connection,
            http_client,
        })
    }

    pub fn connection(&self) -> &RegistryConnection {
        &self.connection
    }

    fn get<T: DeserializeOwned>(&self, endpoint: Endpoint<'_>) -> Result<T> {
        let url = endpoint.url(self.connection.base_url())?;
        debug!(url = %url, "GET");

        let mut request = self.http_client.get(url.clone()).header(ACCEPT, REGISTRY_MEDIA_TYPES);
        if let Some((username, password)) = self.connection.credentials() {
            request = request.basic_auth(username, Some(password));
        }

        let connectivity = |e: reqwest::Error| ExtractError::Connectivity {
            url: url.to_string(),
            message: e.to_string(),
        };
        let response = request.send().map_err(connectivity)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(connectivity)?;

        endpoint.decode(status, &body)
    }
}

impl RegistryApi for RegistryClient {
    fn list_subjects(&self) -> Result<Vec<String>> {
        self.get(Endpoint::Subjects)
    }

    fn list_versions(&self, subject: &str) -> Result<Vec<VersionId>> {
        self.get(Endpoint::Versions { subject })
    }

    fn fetch_schema_text(&self, subject: &str, version: &VersionId) -> Result<String> {
        let body: VersionBody = self.get(Endpoint::Version { subject, version })?;
        Ok(body.schema)
    }
}
