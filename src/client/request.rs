use super::error::PrepareError;
use crate::diagnostics::Notice;
use crate::form::{
    build_endpoint_body, merge_override, option_label, required_names, seed_value, BodyMode,
    EndpointState,
};
use crate::security::{injection_for, is_auth_endpoint, AuthInjection, CredentialStore, SchemeInfo};
use crate::spec::{
    resolve_node, BodyEncoding, Endpoint, ParamKey, ParameterLocation, ParameterMeta,
    RequestBodySpec, FORM_CONTENT_TYPE, JSON_CONTENT_TYPE,
};
use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

/// `{name}` placeholders of a path template
static PATH_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([^{}]+)\}").expect("path placeholder regex should be valid")
});

/// Everything outside the endpoint's own state that shapes a request
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    /// Root API document, for `$ref` resolution and document-level security
    pub document: &'a Value,
    pub base_url: &'a str,
    pub schemes: &'a [SchemeInfo],
    pub credentials: &'a CredentialStore,
    /// Fields captured from the last successful login
    pub user_info: &'a Map<String, Value>,
}

/// Request payload as it will be encoded
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            RequestBody::Empty => None,
            RequestBody::Json(_) => Some(JSON_CONTENT_TYPE),
            RequestBody::Form(_) => Some(FORM_CONTENT_TYPE),
        }
    }

    /// Wire bytes
    pub fn encode(&self) -> Vec<u8> {
        match self {
            RequestBody::Empty => Vec::new(),
            RequestBody::Json(v) => v.to_string().into_bytes(),
            RequestBody::Form(pairs) => url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs)
                .finish()
                .into_bytes(),
        }
    }

    /// Display form: pretty JSON or the encoded form string
    pub fn preview(&self) -> String {
        match self {
            RequestBody::Empty => String::new(),
            RequestBody::Json(v) => serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string()),
            RequestBody::Form(_) => String::from_utf8_lossy(&self.encode()).into_owned(),
        }
    }
}

/// A fully assembled request, ready for a [`super::Transport`]
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    /// Base URL + substituted path + query string
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
    /// Whether the endpoint is a login/token endpoint (credentials not injected)
    pub auth_endpoint: bool,
}

impl PreparedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A prepared request plus the warnings raised while preparing it
#[derive(Debug, Clone, PartialEq)]
pub struct Preparation {
    pub request: PreparedRequest,
    pub notices: Vec<Notice>,
}

/// Body mode in effect: the chosen one, `Fields` by default, `Raw` when the body has no schema
pub fn effective_body_mode(state: Option<&EndpointState>, body: &RequestBodySpec) -> BodyMode {
    if body.schema.is_none() {
        return BodyMode::Raw;
    }
    state.and_then(|s| s.body_mode).unwrap_or_default()
}

/// Initial raw JSON text: the schema's example, else `{}`
pub fn raw_body_seed(body: &RequestBodySpec) -> String {
    body.example()
        .and_then(|e| serde_json::to_string_pretty(e).ok())
        .unwrap_or_else(|| "{}".to_string())
}

/// The literal text a pattern accepts, if it accepts exactly one string
/// (`^password$` is `password`; `^[a-z]+$` is none)
pub fn literal_pattern(pattern: &str) -> Option<String> {
    let inner = pattern.strip_prefix('^').unwrap_or(pattern);
    let inner = inner.strip_suffix('$').unwrap_or(inner);
    (!inner.is_empty() && regex::escape(inner) == inner).then(|| inner.to_string())
}

fn pattern_or_default(prop: &Value) -> Option<String> {
    if let Some(pattern) = prop.get("pattern").and_then(Value::as_str) {
        return Some(literal_pattern(pattern).unwrap_or_else(|| pattern.to_string()));
    }
    prop.get("default").filter(|d| !d.is_null()).map(option_label)
}

/// Initial value of a form-urlencoded field: its `default`, a literal `pattern`,
/// or for `username` the name captured at login
pub fn form_field_seed(name: &str, prop: &Value, user_info: &Map<String, Value>) -> String {
    if let Some(default) = prop.get("default").filter(|d| !d.is_null()) {
        return option_label(default);
    }
    if let Some(literal) = prop
        .get("pattern")
        .and_then(Value::as_str)
        .and_then(literal_pattern)
    {
        return literal;
    }
    if name == "username" {
        if let Some(user) = user_info.get("username").and_then(Value::as_str) {
            return user.to_string();
        }
    }
    String::new()
}

/// Initial value of a parameter: schema `default`, else `example`, else empty
pub fn param_seed(param: &ParameterMeta) -> String {
    param
        .schema
        .as_ref()
        .and_then(seed_value)
        .map(option_label)
        .unwrap_or_default()
}

fn param_value(state: Option<&EndpointState>, param: &ParameterMeta) -> String {
    state
        .and_then(|s| s.params.get(&param.key()))
        .cloned()
        .unwrap_or_else(|| param_seed(param))
        .trim()
        .to_string()
}

/// Assemble the request for an endpoint from its state.
///
/// Path parameters are percent-encoded into the template; an empty required one
/// is an error. Query parameters are sent when non-empty or required, headers and
/// cookies when non-empty. Credentials are injected unless the endpoint is an
/// auth endpoint; injected query pairs and headers replace user-entered ones of
/// the same name.
pub fn prepare_request(
    ctx: &RequestContext<'_>,
    endpoint: &Endpoint,
    state: Option<&EndpointState>,
) -> Result<Preparation, PrepareError> {
    let mut notices = Vec::new();

    let mut path_values: BTreeMap<&str, String> = BTreeMap::new();
    let mut query = Vec::new();
    let mut headers = vec![("Accept".to_string(), JSON_CONTENT_TYPE.to_string())];
    let mut cookies = Vec::new();
    for param in &endpoint.parameters {
        let value = param_value(state, param);
        match param.location {
            ParameterLocation::Path => {
                path_values.insert(param.name.as_str(), value);
            }
            ParameterLocation::Query => {
                if !value.is_empty() || param.required {
                    query.push((param.name.clone(), value));
                }
            }
            ParameterLocation::Header => {
                if !value.is_empty() {
                    headers.push((param.name.clone(), value));
                }
            }
            ParameterLocation::Cookie => {
                if !value.is_empty() {
                    cookies.push((param.name.clone(), value));
                }
            }
        }
    }

    let path = substitute_path(&endpoint.path, &path_values, state)?;
    let mut url = request_url(ctx.base_url, &path)?;

    let auth_endpoint = is_auth_endpoint(endpoint);
    let injection = if auth_endpoint {
        AuthInjection::default()
    } else {
        let requirements = endpoint.security(ctx.document);
        let (injection, auth_notices) = injection_for(&requirements, ctx.schemes, ctx.credentials);
        notices.extend(auth_notices);
        injection
    };

    query.retain(|(k, _)| !injection.query.iter().any(|(a, _)| a == k));
    query.extend(injection.query);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(&query);
    }

    for (name, value) in injection.headers {
        headers.retain(|(h, _)| !h.eq_ignore_ascii_case(&name));
        headers.push((name, value));
    }
    cookies.retain(|(k, _)| !injection.cookies.iter().any(|(a, _)| a == k));
    cookies.extend(injection.cookies);
    if !cookies.is_empty() {
        let joined = cookies
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ");
        headers.push(("Cookie".to_string(), joined));
    }

    let body = prepare_body(ctx, endpoint, state, &mut notices)?;
    if let Some(content_type) = body.content_type() {
        headers.push(("Content-Type".to_string(), content_type.to_string()));
    }
    let body_method = matches!(endpoint.method, Method::POST | Method::PUT | Method::PATCH);
    if body_method && endpoint.has_request_body() && body.is_empty() {
        notices.push(Notice::warning(
            "body",
            "empty_body",
            format!(
                "{} with a declared request body, but no body is sent",
                endpoint.method
            ),
        ));
    }

    debug!(endpoint = %endpoint.id, url = %url, auth_endpoint, "request prepared");
    Ok(Preparation {
        request: PreparedRequest {
            method: endpoint.method.clone(),
            url,
            headers,
            body,
            auth_endpoint,
        },
        notices,
    })
}

fn substitute_path(
    template: &str,
    declared: &BTreeMap<&str, String>,
    state: Option<&EndpointState>,
) -> Result<String, PrepareError> {
    let mut missing = None;
    let path = PATH_PLACEHOLDER.replace_all(template, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        let value = declared
            .get(name)
            .cloned()
            .or_else(|| {
                state
                    .and_then(|s| s.params.get(&ParamKey::new(ParameterLocation::Path, name)))
                    .map(|v| v.trim().to_string())
            })
            .unwrap_or_default();
        if value.is_empty() && missing.is_none() {
            missing = Some(name.to_string());
        }
        urlencoding::encode(&value).into_owned()
    });
    match missing {
        Some(name) => Err(PrepareError::MissingPathParameter { name }),
        None => Ok(path.into_owned()),
    }
}

fn request_url(base_url: &str, path: &str) -> Result<Url, PrepareError> {
    let base = base_url.trim().trim_end_matches('/');
    if base.is_empty() {
        return Err(PrepareError::InvalidUrl {
            url: path.to_string(),
            message: "no base URL configured".to_string(),
        });
    }
    let full = format!("{base}{path}");
    Url::parse(&full).map_err(|e| PrepareError::InvalidUrl {
        url: full.clone(),
        message: e.to_string(),
    })
}

fn prepare_body(
    ctx: &RequestContext<'_>,
    endpoint: &Endpoint,
    state: Option<&EndpointState>,
    notices: &mut Vec<Notice>,
) -> Result<RequestBody, PrepareError> {
    let spec = match endpoint.request_body(ctx.document) {
        Ok(Some(spec)) => spec,
        Ok(None) => {
            if endpoint.has_request_body() {
                notices.push(Notice::warning(
                    "body",
                    "unsupported_media_type",
                    "request body media type is not supported (JSON or form-urlencoded only)",
                ));
            }
            return Ok(RequestBody::Empty);
        }
        Err(reference) => {
            notices.push(Notice::error(
                "body",
                "unresolved_ref",
                format!("could not resolve request body reference {reference}"),
            ));
            return Ok(RequestBody::Empty);
        }
    };
    match spec.encoding {
        BodyEncoding::Json => json_body(ctx, &spec, state, notices),
        BodyEncoding::FormUrlEncoded => Ok(form_body(ctx, &spec, state, notices)),
    }
}

fn is_empty_payload(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Object(m) => m.is_empty(),
        _ => false,
    }
}

fn json_body(
    ctx: &RequestContext<'_>,
    spec: &RequestBodySpec,
    state: Option<&EndpointState>,
    notices: &mut Vec<Notice>,
) -> Result<RequestBody, PrepareError> {
    let schema = match (effective_body_mode(state, spec), spec.schema.as_ref()) {
        (BodyMode::Fields, Some(schema)) => schema,
        _ => {
            let text = state
                .and_then(|s| s.raw_body.clone())
                .unwrap_or_else(|| raw_body_seed(spec));
            if text.trim().is_empty() {
                return Ok(RequestBody::Empty);
            }
            return serde_json::from_str::<Value>(&text)
                .map(RequestBody::Json)
                .map_err(|e| PrepareError::InvalidRawBody {
                    message: e.to_string(),
                });
        }
    };

    let built = build_endpoint_body(state, ctx.document, schema);
    notices.extend(built.notices);
    let mut body = built.value;

    let overlay = state.map(|s| s.override_json.trim()).unwrap_or_default();
    if !overlay.is_empty() && overlay != "{}" {
        match serde_json::from_str::<Value>(overlay) {
            Ok(v) => body = merge_override(body, &v),
            Err(e) => notices.push(Notice::warning(
                "body.override",
                "invalid_override",
                format!("override JSON is invalid and was not applied: {e}"),
            )),
        }
    }

    if is_empty_payload(&body) {
        Ok(RequestBody::Empty)
    } else {
        Ok(RequestBody::Json(body))
    }
}

fn form_body(
    ctx: &RequestContext<'_>,
    spec: &RequestBodySpec,
    state: Option<&EndpointState>,
    notices: &mut Vec<Notice>,
) -> RequestBody {
    let Some(schema) = spec.schema.as_ref() else {
        return RequestBody::Empty;
    };
    let Some(props) = schema.get("properties").and_then(Value::as_object) else {
        return RequestBody::Empty;
    };
    let required = required_names(schema);

    let mut pairs = Vec::new();
    for (name, prop) in props {
        let prop = match resolve_node(ctx.document, prop) {
            Ok(p) => p,
            Err(reference) => {
                notices.push(Notice::error(
                    format!("form.{name}"),
                    "unresolved_ref",
                    format!("could not resolve {reference}"),
                ));
                continue;
            }
        };
        let value = state
            .and_then(|s| s.form_fields.get(name))
            .cloned()
            .unwrap_or_else(|| form_field_seed(name, prop, ctx.user_info));
        let is_required = required.contains(&name.as_str());
        let is_preset = pattern_or_default(prop).is_some_and(|p| p == value);
        if !value.is_empty() || is_required || is_preset {
            pairs.push((name.clone(), value));
        }
    }

    if pairs.is_empty() {
        if !required.is_empty() {
            notices.push(Notice::warning(
                "form",
                "no_form_data",
                format!("required form fields have no values: {}", required.join(", ")),
            ));
        }
        return RequestBody::Empty;
    }
    RequestBody::Form(pairs)
}
