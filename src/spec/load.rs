use super::build::{group_endpoints, sorted_tags, tag_definitions, EndpointGroups};
use super::types::{Endpoint, EndpointId};
use crate::diagnostics::Notice;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Error raised while loading an API document. Every variant is terminal for the load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// No base URL (or file path) was given
    BlankSource,
    /// The HTTP request failed before a response arrived
    Network { url: String, message: String },
    /// No response within the document fetch timeout
    Timeout { url: String, secs: u64 },
    /// The server answered with a non-2xx status
    Status { url: String, status: u16 },
    /// The body is not valid JSON (or YAML for `.yaml`/`.yml` sources)
    Parse {
        source: String,
        message: String,
        /// First characters of the offending content
        snippet: String,
    },
    /// The document parsed but is not an object
    NotAnObject { source: String },
    /// A local file could not be read
    Io { path: String, message: String },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::BlankSource => write!(f, "please enter the API base URL"),
            LoadError::Network { url, message } => {
                write!(f, "network error while loading {url}: {message}")
            }
            LoadError::Timeout { url, secs } => {
                write!(f, "timed out after {secs}s while loading {url}")
            }
            LoadError::Status { url, status } => {
                write!(f, "loading {url} failed with HTTP status {status}")
            }
            LoadError::Parse {
                source,
                message,
                snippet,
            } => write!(
                f,
                "could not parse the API document from {source}: {message}. Content: {snippet}"
            ),
            LoadError::NotAnObject { source } => {
                write!(f, "the API document from {source} is not a JSON object")
            }
            LoadError::Io { path, message } => write!(f, "could not read {path}: {message}"),
        }
    }
}

impl std::error::Error for LoadError {}

/// A loaded API document and everything derived from it
#[derive(Debug, Clone)]
pub struct ApiSpec {
    /// Where the document came from (URL or file path)
    pub source: String,
    /// The raw document; `$ref`s are resolved against it lazily
    pub document: Value,
    pub title: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub tag_definitions: BTreeMap<String, Map<String, Value>>,
    pub groups: EndpointGroups,
    /// Non-fatal problems found while grouping endpoints
    pub notices: Vec<Notice>,
}

impl ApiSpec {
    /// Build from an already parsed document
    pub fn from_value(document: Value, source: impl Into<String>) -> Result<Self, LoadError> {
        let source = source.into();
        if !document.is_object() {
            return Err(LoadError::NotAnObject { source });
        }
        let info_str = |key: &str| {
            document
                .get("info")
                .and_then(|i| i.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        let title = info_str("title");
        let version = info_str("version");
        let description = info_str("description");
        let tag_definitions = tag_definitions(&document);
        let (groups, notices) = group_endpoints(&document);

        info!(
            source = %source,
            title = title.as_deref().unwrap_or("N/A"),
            tags = groups.len(),
            endpoints = groups.values().map(Vec::len).sum::<usize>(),
            "API document loaded"
        );

        Ok(ApiSpec {
            source,
            document,
            title,
            version,
            description,
            tag_definitions,
            groups,
            notices,
        })
    }

    /// Tags in display order
    pub fn tags(&self) -> Vec<String> {
        sorted_tags(&self.groups)
    }

    pub fn tag_description(&self, tag: &str) -> Option<&str> {
        self.tag_definitions
            .get(tag)?
            .get("description")?
            .as_str()
            .filter(|d| !d.is_empty())
    }

    /// All endpoints, tag by tag in display order
    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.tags()
            .into_iter()
            .filter_map(|t| self.groups.get(&t))
            .flatten()
            .collect::<Vec<_>>()
            .into_iter()
    }

    pub fn endpoint(&self, id: &EndpointId) -> Option<&Endpoint> {
        self.groups.values().flatten().find(|e| &e.id == id)
    }

    /// Look an endpoint up by id, `operationId` or `METHOD /path`
    pub fn find_endpoint(&self, selector: &str) -> Option<&Endpoint> {
        self.groups.values().flatten().find(|e| e.matches(selector))
    }

    /// Raw `components.securitySchemes` entries in document order
    pub fn security_schemes(&self) -> Vec<(String, Value)> {
        self.document
            .get("components")
            .and_then(|c| c.get("securitySchemes"))
            .and_then(Value::as_object)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }
}

/// `<base_url>/<json_location>` with exactly one slash between them
pub fn spec_url(base_url: &str, json_location: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim().trim_end_matches('/'),
        json_location.trim().trim_start_matches('/')
    )
}

fn is_yaml(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".yaml") || lower.ends_with(".yml")
}

fn snippet(content: &str) -> String {
    content.chars().take(200).collect()
}

/// Parse document text as JSON, or YAML when `source` names a YAML file
pub fn parse_document(content: &str, source: &str) -> Result<Value, LoadError> {
    let parsed = if is_yaml(source) {
        serde_yaml::from_str::<Value>(content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str::<Value>(content).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| LoadError::Parse {
        source: source.to_string(),
        message,
        snippet: snippet(content),
    })
}

/// GET `<base_url>/<json_location>` and build an [`ApiSpec`] from it
pub fn fetch_spec(
    base_url: &str,
    json_location: &str,
    timeout: Duration,
) -> Result<ApiSpec, LoadError> {
    if base_url.trim().is_empty() {
        warn!("spec load requested without a base URL");
        return Err(LoadError::BlankSource);
    }
    let url = spec_url(base_url, json_location);
    debug!(url = %url, timeout_secs = timeout.as_secs(), "fetching API document");

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LoadError::Network {
            url: url.clone(),
            message: e.to_string(),
        })?;
    let response = client
        .get(&url)
        .header(http::header::ACCEPT, "application/json")
        .send()
        .map_err(|e| {
            if e.is_timeout() {
                LoadError::Timeout {
                    url: url.clone(),
                    secs: timeout.as_secs(),
                }
            } else {
                LoadError::Network {
                    url: url.clone(),
                    message: e.to_string(),
                }
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        warn!(url = %url, status = status.as_u16(), "API document request failed");
        return Err(LoadError::Status {
            url,
            status: status.as_u16(),
        });
    }
    let body = response.text().map_err(|e| LoadError::Network {
        url: url.clone(),
        message: e.to_string(),
    })?;
    let document = parse_document(&body, &url)?;
    ApiSpec::from_value(document, url)
}

/// Read an API document from a local `.json`, `.yaml` or `.yml` file
pub fn load_spec_file(path: &Path) -> Result<ApiSpec, LoadError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: display.clone(),
        message: e.to_string(),
    })?;
    let document = parse_document(&content, &display)?;
    ApiSpec::from_value(document, display)
}

/// Whether a source string should be fetched over HTTP rather than read from disk
pub fn is_remote(source: &str) -> bool {
    let lower = source.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
