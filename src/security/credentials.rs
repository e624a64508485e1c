use super::schemes::{ApiKeyLocation, SchemeInfo, SchemeKind};
use crate::diagnostics::Notice;
use crate::spec::Endpoint;
use base64::Engine;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Keywords in an `operationId` that mark an authentication endpoint
const AUTH_OPERATION_KEYWORDS: [&str; 4] = ["auth", "login", "token", "authorize"];
/// Tags that mark an authentication endpoint
const AUTH_TAGS: [&str; 3] = ["auth", "authentication", "login"];
/// Response keys tried for bearer tokens (plus the lowercased scheme name)
const BEARER_TOKEN_KEYS: [&str; 3] = ["access_token", "accessToken", "token"];

/// Credentials entered or captured during a session, keyed by scheme name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialStore {
    values: BTreeMap<String, String>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a credential; a blank value removes it
    pub fn set(&mut self, scheme: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            self.values.remove(scheme);
        } else {
            self.values.insert(scheme.to_string(), value.to_string());
        }
    }

    pub fn get(&self, scheme: &str) -> Option<&str> {
        self.values.get(scheme).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Scheme names with a stored credential
    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Headers, query pairs and cookies to add to one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthInjection {
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
    /// Schemes whose credentials were applied
    pub applied: Vec<String>,
}

impl AuthInjection {
    fn add(&mut self, scheme: &SchemeInfo, value: &str) {
        match &scheme.kind {
            SchemeKind::ApiKey { name, location } => {
                let pair = (name.clone(), value.to_string());
                match location {
                    ApiKeyLocation::Header => self.headers.push(pair),
                    ApiKeyLocation::Query => self.query.push(pair),
                    ApiKeyLocation::Cookie => self.cookies.push(pair),
                }
            }
            SchemeKind::Basic => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(value);
                self.headers
                    .push(("Authorization".to_string(), format!("Basic {encoded}")));
            }
            SchemeKind::Bearer | SchemeKind::OAuth2 | SchemeKind::OpenIdConnect => {
                self.headers
                    .push(("Authorization".to_string(), format!("Bearer {value}")));
            }
        }
        self.applied.push(scheme.name.clone());
    }
}

/// Work out the credentials for a request.
///
/// `requirements` is the operation's effective security (alternatives of
/// scheme-name sets). The first alternative with at least one stored credential
/// is applied. A protected operation without any usable credential yields a
/// warning listing the schemes it accepts; an empty alternative (`{}`) makes
/// authentication optional and suppresses it.
pub fn injection_for(
    requirements: &[Vec<&str>],
    schemes: &[SchemeInfo],
    credentials: &CredentialStore,
) -> (AuthInjection, Vec<Notice>) {
    let mut injection = AuthInjection::default();
    let mut notices = Vec::new();
    if requirements.is_empty() {
        return (injection, notices);
    }

    for option in requirements {
        for name in option {
            let scheme = schemes.iter().find(|s| s.name == *name);
            if let (Some(scheme), Some(value)) = (scheme, credentials.get(name)) {
                injection.add(scheme, value);
            }
        }
        if !injection.applied.is_empty() {
            debug!(schemes = ?injection.applied, "credentials applied");
            notices.push(Notice::info(
                "auth",
                "credentials_applied",
                format!("applying authorization with scheme(s): {}", injection.applied.join(", ")),
            ));
            return (injection, notices);
        }
    }

    let optional = requirements.iter().any(Vec::is_empty);
    if !optional {
        let mut names: Vec<&str> = requirements.iter().flatten().copied().collect();
        names.sort_unstable();
        names.dedup();
        notices.push(Notice::warning(
            "auth",
            "missing_credentials",
            format!(
                "protected endpoint, but no active credentials for the required schemes: {}",
                names.join(", ")
            ),
        ));
    }
    (injection, notices)
}

/// Whether an endpoint looks like a login/token endpoint.
///
/// Only operations that declare no security of their own qualify; then either
/// the `operationId` contains an auth keyword or a tag is an auth tag.
pub fn is_auth_endpoint(endpoint: &Endpoint) -> bool {
    if endpoint.declares_security() {
        return false;
    }
    let op_id = endpoint.operation_id().unwrap_or_default().to_lowercase();
    AUTH_OPERATION_KEYWORDS.iter().any(|k| op_id.contains(k))
        || endpoint
            .tags()
            .iter()
            .any(|t| AUTH_TAGS.contains(&t.to_lowercase().as_str()))
}

/// A credential found in an authentication response
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedCredential {
    pub scheme: String,
    pub token: String,
    /// The remaining response fields (token keys removed)
    pub user_info: Map<String, Value>,
}

fn token_text(v: &Value) -> Option<String> {
    match v {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Scan a successful authentication response for a token.
///
/// Schemes are tried in document order: API keys by their `name`, bearer schemes
/// by `access_token`/`accessToken`/`token`/lowercased scheme name, OAuth2 by
/// `access_token`. The first hit wins.
pub fn capture_credentials(
    schemes: &[SchemeInfo],
    response: &Map<String, Value>,
) -> Option<CapturedCredential> {
    for scheme in schemes {
        let found = match &scheme.kind {
            SchemeKind::ApiKey { name, .. } => response.get(name).and_then(token_text),
            SchemeKind::Bearer => {
                let lowered = scheme.name.to_lowercase();
                BEARER_TOKEN_KEYS
                    .iter()
                    .copied()
                    .chain(std::iter::once(lowered.as_str()))
                    .find_map(|k| response.get(k).and_then(token_text))
            }
            SchemeKind::OAuth2 => response.get("access_token").and_then(token_text),
            SchemeKind::Basic | SchemeKind::OpenIdConnect => None,
        };
        if let Some(token) = found {
            let mut excluded: Vec<&str> = BEARER_TOKEN_KEYS.to_vec();
            if let SchemeKind::ApiKey { name, .. } = &scheme.kind {
                excluded.push(name);
            }
            let user_info = response
                .iter()
                .filter(|(k, _)| !excluded.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            return Some(CapturedCredential {
                scheme: scheme.name.clone(),
                token,
                user_info,
            });
        }
    }
    None
}
