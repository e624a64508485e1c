use crate::diagnostics::Notice;
use oas3::spec::SecurityScheme;
use serde_json::Value;
use std::fmt;

/// Where an API key travels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyLocation {
    Header,
    Query,
    Cookie,
}

impl ApiKeyLocation {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "header" => Some(ApiKeyLocation::Header),
            "query" => Some(ApiKeyLocation::Query),
            "cookie" => Some(ApiKeyLocation::Cookie),
            _ => None,
        }
    }
}

impl fmt::Display for ApiKeyLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiKeyLocation::Header => write!(f, "header"),
            ApiKeyLocation::Query => write!(f, "query"),
            ApiKeyLocation::Cookie => write!(f, "cookie"),
        }
    }
}

/// How a credential for a scheme is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemeKind {
    ApiKey { name: String, location: ApiKeyLocation },
    /// `Authorization: Bearer <token>`
    Bearer,
    /// `Authorization: Basic <base64(user:password)>`
    Basic,
    /// Access token sent as a bearer token
    OAuth2,
    /// ID/access token sent as a bearer token
    OpenIdConnect,
}

impl SchemeKind {
    /// Classify a typed scheme; `type_name` is the raw `type` for variants this
    /// client does not model field by field
    fn from_scheme(scheme: &SecurityScheme, type_name: &str) -> Option<Self> {
        match scheme {
            SecurityScheme::ApiKey { name, location, .. } => Some(SchemeKind::ApiKey {
                name: name.clone(),
                location: ApiKeyLocation::parse(location)?,
            }),
            SecurityScheme::Http { scheme, .. } if scheme.eq_ignore_ascii_case("bearer") => {
                Some(SchemeKind::Bearer)
            }
            SecurityScheme::Http { scheme, .. } if scheme.eq_ignore_ascii_case("basic") => {
                Some(SchemeKind::Basic)
            }
            SecurityScheme::Http { .. } => None,
            SecurityScheme::OAuth2 { .. } => Some(SchemeKind::OAuth2),
            _ => Self::from_type_name(type_name),
        }
    }

    fn from_type_name(type_name: &str) -> Option<Self> {
        match type_name {
            "oauth2" => Some(SchemeKind::OAuth2),
            "openIdConnect" => Some(SchemeKind::OpenIdConnect),
            _ => None,
        }
    }

    /// Short label for prompts, e.g. "API key (header X-API-Key)"
    pub fn describe(&self) -> String {
        match self {
            SchemeKind::ApiKey { name, location } => format!("API key ({location} {name})"),
            SchemeKind::Bearer => "bearer token".to_string(),
            SchemeKind::Basic => "basic credentials (user:password)".to_string(),
            SchemeKind::OAuth2 => "OAuth2 access token".to_string(),
            SchemeKind::OpenIdConnect => "OpenID Connect token".to_string(),
        }
    }
}

/// One usable entry of `components.securitySchemes`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeInfo {
    pub name: String,
    pub kind: SchemeKind,
    pub description: Option<String>,
}

/// Parse raw scheme definitions, skipping (and reporting) the ones that cannot be used
pub fn parse_schemes(raw: &[(String, Value)]) -> (Vec<SchemeInfo>, Vec<Notice>) {
    let mut schemes = Vec::new();
    let mut notices = Vec::new();

    for (name, def) in raw {
        let type_name = def.get("type").and_then(Value::as_str).unwrap_or_default();
        let kind = match serde_json::from_value::<SecurityScheme>(def.clone()) {
            Ok(scheme) => SchemeKind::from_scheme(&scheme, type_name),
            Err(_) => SchemeKind::from_type_name(type_name),
        };
        match kind {
            Some(kind) => schemes.push(SchemeInfo {
                name: name.clone(),
                kind,
                description: def
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            None => notices.push(Notice::warning(
                format!("securitySchemes.{name}"),
                "unsupported_scheme",
                format!("security scheme '{name}' (type '{type_name}') is not supported for manual entry"),
            )),
        }
    }
    (schemes, notices)
}
