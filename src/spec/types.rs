use super::resolve::resolve_node;
use http::Method;
use serde_json::Value;
use std::fmt;

/// Content type of JSON request bodies
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Content type of form request bodies
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Stable, storage-safe key of one operation.
///
/// Derived from `(tag, method, path)`: slashes become underscores and braces
/// are dropped (`pets_GET__pets_petId`). It namespaces every piece of
/// per-endpoint session state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointId(String);

impl EndpointId {
    /// Derive the id for an operation. Characters outside `[A-Za-z0-9_.-]` are
    /// replaced by `_` so the id can be used as a file name or map key anywhere.
    pub fn derive(tag: &str, method: &Method, path: &str) -> Self {
        let raw = format!(
            "{}_{}_{}",
            tag,
            method.as_str().to_ascii_uppercase(),
            path.replace('/', "_").replace(['{', '}'], "")
        );
        let safe = raw
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        EndpointId(safe)
    }

    pub(crate) fn with_suffix(&self, n: usize) -> Self {
        EndpointId(format!("{}_{}", self.0, n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EndpointId {
    fn from(s: &str) -> Self {
        EndpointId(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(ParameterLocation::Path),
            "query" => Some(ParameterLocation::Query),
            "header" => Some(ParameterLocation::Header),
            "cookie" => Some(ParameterLocation::Cookie),
            _ => None,
        }
    }

    /// The `in` value as written in the document
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "Path"),
            ParameterLocation::Query => write!(f, "Query"),
            ParameterLocation::Header => write!(f, "Header"),
            ParameterLocation::Cookie => write!(f, "Cookie"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMeta {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub description: Option<String>,
    pub schema: Option<Value>,
}

impl ParameterMeta {
    pub fn key(&self) -> ParamKey {
        ParamKey::new(self.location, self.name.as_str())
    }

    /// Declared schema type, `string` when absent
    pub fn type_name(&self) -> &str {
        self.schema
            .as_ref()
            .and_then(|s| s.get("type"))
            .and_then(Value::as_str)
            .unwrap_or("string")
    }
}

/// Storage key of a parameter input.
///
/// A name alone is not unique: the same name may be declared in the path and
/// in the query of one operation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParamKey {
    pub location: ParameterLocation,
    pub name: String,
}

impl ParamKey {
    pub fn new(location: ParameterLocation, name: impl Into<String>) -> Self {
        ParamKey {
            location,
            name: name.into(),
        }
    }

    /// Parse `name` or `location:name`; the location is `None` when not given
    pub fn split_qualified(raw: &str) -> (Option<ParameterLocation>, &str) {
        match raw.split_once(':') {
            Some((location, name)) => match ParameterLocation::parse(location.trim()) {
                Some(location) => (Some(location), name.trim()),
                None => (None, raw.trim()),
            },
            None => (None, raw.trim()),
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.location.as_str(), self.name)
    }
}

/// How a request body is encoded on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    Json,
    FormUrlEncoded,
}

/// The supported request body of an operation, with `$ref`s already resolved
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBodySpec {
    pub encoding: BodyEncoding,
    /// Media type key as declared (`application/json; charset=utf-8`)
    pub content_type: String,
    pub required: bool,
    pub schema: Option<Value>,
}

impl RequestBodySpec {
    /// Top-level `example` of the body schema, used to seed raw JSON input
    pub fn example(&self) -> Option<&Value> {
        self.schema
            .as_ref()
            .and_then(|s| s.get("example"))
            .filter(|v| !v.is_null())
    }
}

/// One operation of the document, grouped under its first tag
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub id: EndpointId,
    pub tag: String,
    pub path: String,
    pub method: Method,
    /// Raw operation object
    pub operation: Value,
    /// Path-level and operation-level parameters, merged and resolved
    pub parameters: Vec<ParameterMeta>,
}

impl Endpoint {
    pub fn operation_id(&self) -> Option<&str> {
        self.operation.get("operationId").and_then(Value::as_str)
    }

    pub fn summary(&self) -> Option<&str> {
        self.operation.get("summary").and_then(Value::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.operation.get("description").and_then(Value::as_str)
    }

    pub fn tags(&self) -> Vec<&str> {
        self.operation
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn has_request_body(&self) -> bool {
        self.operation.get("requestBody").is_some()
    }

    /// `METHOD /path` label
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Whether `selector` names this endpoint: its id, its `operationId`, or `METHOD /path`
    pub fn matches(&self, selector: &str) -> bool {
        let selector = selector.trim();
        if self.id.as_str() == selector || self.operation_id() == Some(selector) {
            return true;
        }
        match selector.split_once(char::is_whitespace) {
            Some((method, path)) => {
                method.eq_ignore_ascii_case(self.method.as_str()) && path.trim() == self.path
            }
            None => false,
        }
    }

    /// Resolve the request body: JSON media types first (exact or parameterized),
    /// then form-urlencoded. Other media types are not supported.
    pub fn request_body(&self, root: &Value) -> Result<Option<RequestBodySpec>, String> {
        let Some(raw) = self.operation.get("requestBody") else {
            return Ok(None);
        };
        let body = resolve_node(root, raw)?;
        let required = body.get("required").and_then(Value::as_bool).unwrap_or(false);
        let Some(content) = body.get("content").and_then(Value::as_object) else {
            return Ok(None);
        };

        let json = content
            .iter()
            .find(|(k, _)| k.as_str() == JSON_CONTENT_TYPE)
            .or_else(|| content.iter().find(|(k, _)| k.starts_with(JSON_CONTENT_TYPE)));
        let (content_type, media, encoding) = match json {
            Some((k, v)) => (k, v, BodyEncoding::Json),
            None => match content.iter().find(|(k, _)| k.starts_with(FORM_CONTENT_TYPE)) {
                Some((k, v)) => (k, v, BodyEncoding::FormUrlEncoded),
                None => return Ok(None),
            },
        };

        let schema = match media.get("schema") {
            Some(s) => Some(resolve_node(root, s)?.clone()),
            None => None,
        };
        Ok(Some(RequestBodySpec {
            encoding,
            content_type: content_type.clone(),
            required,
            schema,
        }))
    }

    /// Effective security requirements: the operation's own list when present
    /// (an empty list disables security), otherwise the document-level list.
    pub fn security<'a>(&'a self, root: &'a Value) -> Vec<Vec<&'a str>> {
        let list = self
            .operation
            .get("security")
            .or_else(|| root.get("security"))
            .and_then(Value::as_array);
        list.map(|options| {
            options
                .iter()
                .filter_map(Value::as_object)
                .map(|req| req.keys().map(String::as_str).collect())
                .collect()
        })
        .unwrap_or_default()
    }

    /// Whether the operation declares its own (non-empty) security
    pub fn declares_security(&self) -> bool {
        self.operation
            .get("security")
            .and_then(Value::as_array)
            .is_some_and(|s| !s.is_empty())
    }
}
