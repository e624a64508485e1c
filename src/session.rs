//! # Session
//!
//! The application shell: one loaded API document, the per-endpoint form state,
//! the credential store and the transport. Every front-end command maps onto a
//! method here, so the terminal shell and one-shot subcommands behave the same.
//!
//! Loading a document resets the whole session first; nothing from a previous
//! API survives a reload.

use crate::client::{
    effective_body_mode, execute_request, form_field_seed, param_seed, prepare_request,
    raw_body_seed, ExecuteError, HttpTransport, PrepareError, Preparation, RequestContext,
    ResponseRecord, Transport,
};
use crate::diagnostics::Notice;
use crate::form::{
    edit_form, render_form, required_names, BodyMode, EditError, FormEdit, FormView, SessionState,
};
use crate::runtime_config::ClientConfig;
use crate::security::{capture_credentials, parse_schemes, CredentialStore, SchemeInfo};
use crate::spec::{
    fetch_spec, is_remote, load_spec_file, resolve_node, ApiSpec, BodyEncoding, Endpoint,
    EndpointId, LoadError, ParamKey, ParameterLocation, ParameterMeta, RequestBodySpec,
};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// A session command that could not be carried out
#[derive(Debug)]
pub enum SessionError {
    /// No API document loaded yet
    NoSpec,
    UnknownEndpoint { selector: String },
    UnknownTag { tag: String },
    /// A command needs an endpoint but none was given or opened
    NoActiveEndpoint,
    UnknownParameter { endpoint: String, name: String },
    /// The name is declared in several locations and needs a `location:` prefix
    AmbiguousParameter {
        endpoint: String,
        name: String,
        locations: Vec<ParameterLocation>,
    },
    UnknownScheme { scheme: String },
    /// The endpoint has no JSON body with a schema, so it has no form
    NoBodySchema { endpoint: String },
    /// The endpoint has no form-urlencoded body
    NotAFormBody { endpoint: String },
    Load(LoadError),
    Edit(EditError),
    Prepare(PrepareError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NoSpec => write!(f, "no API document loaded (use `load`)"),
            SessionError::UnknownEndpoint { selector } => write!(f, "no endpoint matches '{selector}'"),
            SessionError::UnknownTag { tag } => write!(f, "unknown tag '{tag}'"),
            SessionError::NoActiveEndpoint => write!(f, "no endpoint selected (use `open`)"),
            SessionError::UnknownParameter { endpoint, name } => {
                write!(f, "endpoint {endpoint} has no parameter '{name}'")
            }
            SessionError::AmbiguousParameter {
                endpoint,
                name,
                locations,
            } => {
                let qualified: Vec<String> = locations
                    .iter()
                    .map(|l| format!("{}:{name}", l.as_str()))
                    .collect();
                write!(
                    f,
                    "parameter '{name}' of {endpoint} is declared more than once; use one of {}",
                    qualified.join(", ")
                )
            }
            SessionError::UnknownScheme { scheme } => write!(f, "unknown security scheme '{scheme}'"),
            SessionError::NoBodySchema { endpoint } => {
                write!(f, "endpoint {endpoint} has no JSON body schema")
            }
            SessionError::NotAFormBody { endpoint } => {
                write!(f, "endpoint {endpoint} has no form-urlencoded body")
            }
            SessionError::Load(e) => write!(f, "{e}"),
            SessionError::Edit(e) => write!(f, "{e}"),
            SessionError::Prepare(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Load(e) => Some(e),
            SessionError::Edit(e) => Some(e),
            SessionError::Prepare(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LoadError> for SessionError {
    fn from(e: LoadError) -> Self {
        SessionError::Load(e)
    }
}

impl From<EditError> for SessionError {
    fn from(e: EditError) -> Self {
        SessionError::Edit(e)
    }
}

impl From<PrepareError> for SessionError {
    fn from(e: PrepareError) -> Self {
        SessionError::Prepare(e)
    }
}

/// A flat form-urlencoded field with its current value
#[derive(Debug, Clone, PartialEq)]
pub struct FormInput {
    pub name: String,
    pub value: String,
    pub required: bool,
    pub description: Option<String>,
}

/// Everything a front-end shows for one endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct FormScreen {
    pub endpoint: Endpoint,
    /// Parameters with their current values
    pub params: Vec<(ParameterMeta, String)>,
    pub body: Option<RequestBodySpec>,
    /// Body mode of a JSON body; `None` for other bodies
    pub mode: Option<BodyMode>,
    /// Field tree in `Fields` mode
    pub view: Option<FormView>,
    pub form_inputs: Vec<FormInput>,
    pub raw_body: Option<String>,
    pub override_json: String,
    pub notices: Vec<Notice>,
}

/// Result of sending a request
#[derive(Debug, Clone, PartialEq)]
pub struct SendOutcome {
    pub preparation: Preparation,
    pub record: ResponseRecord,
    /// Preparation notices plus the ones raised by the response (auth capture, 401/403)
    pub notices: Vec<Notice>,
}

pub struct Session {
    config: ClientConfig,
    transport: Box<dyn Transport>,
    spec: Option<ApiSpec>,
    base_url: Option<String>,
    state: SessionState,
    schemes: Vec<SchemeInfo>,
    credentials: CredentialStore,
    user_info: Map<String, Value>,
    auth_status: Option<String>,
    active_tag: Option<String>,
    active_endpoint: Option<EndpointId>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("source", &self.spec.as_ref().map(|s| s.source.as_str()))
            .field("base_url", &self.base_url)
            .field("endpoints_with_state", &self.state.len())
            .field("active_tag", &self.active_tag)
            .field("active_endpoint", &self.active_endpoint)
            .finish()
    }
}

/// First absolute `servers[].url` of a document
fn server_url(document: &Value) -> Option<String> {
    document
        .get("servers")?
        .as_array()?
        .iter()
        .filter_map(|s| s.get("url").and_then(Value::as_str))
        .find(|u| is_remote(u))
        .map(|u| u.trim_end_matches('/').to_string())
}

impl Session {
    /// Session over HTTP with the configured request timeout
    pub fn new(config: ClientConfig) -> Result<Self, ExecuteError> {
        let transport = HttpTransport::new(config.request_timeout())?;
        Ok(Self::with_transport(config, Box::new(transport)))
    }

    pub fn with_transport(config: ClientConfig, transport: Box<dyn Transport>) -> Self {
        let base_url = config.base_url.clone();
        Session {
            config,
            transport,
            spec: None,
            base_url,
            state: SessionState::new(),
            schemes: Vec::new(),
            credentials: CredentialStore::new(),
            user_info: Map::new(),
            auth_status: None,
            active_tag: None,
            active_endpoint: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn spec(&self) -> Option<&ApiSpec> {
        self.spec.as_ref()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn schemes(&self) -> &[SchemeInfo] {
        &self.schemes
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn user_info(&self) -> &Map<String, Value> {
        &self.user_info
    }

    pub fn auth_status(&self) -> Option<&str> {
        self.auth_status.as_deref()
    }

    pub fn active_tag(&self) -> Option<&str> {
        self.active_tag.as_deref()
    }

    pub fn active_endpoint(&self) -> Option<&Endpoint> {
        let id = self.active_endpoint.as_ref()?;
        self.spec.as_ref()?.endpoint(id)
    }

    /// Forget the document and everything entered for it
    pub fn reset(&mut self) {
        self.spec = None;
        self.base_url = self.config.base_url.clone();
        self.state.clear();
        self.schemes.clear();
        self.credentials.clear();
        self.user_info.clear();
        self.auth_status = None;
        self.active_tag = None;
        self.active_endpoint = None;
    }

    /// Load an API document, resetting the session first.
    ///
    /// `source` is a base URL (the document is fetched from
    /// `<base>/<json_location>`) or a local `.json`/`.yaml` file. Without it the
    /// configured spec file, then the configured base URL, are used.
    pub fn load(&mut self, source: Option<&str>) -> Result<Vec<Notice>, SessionError> {
        self.reset();
        let source = source.map(str::trim).filter(|s| !s.is_empty());

        let spec = match source {
            Some(src) if is_remote(src) => {
                self.base_url = Some(src.trim_end_matches('/').to_string());
                fetch_spec(src, &self.config.json_location, self.config.spec_timeout())?
            }
            Some(file) => load_spec_file(Path::new(file))?,
            None => match (&self.config.spec_file, &self.config.base_url) {
                (Some(file), _) => load_spec_file(Path::new(file))?,
                (None, Some(base)) => {
                    fetch_spec(base, &self.config.json_location, self.config.spec_timeout())?
                }
                (None, None) => {
                    warn!("load requested without a base URL or spec file");
                    return Err(LoadError::BlankSource.into());
                }
            },
        };

        if self.base_url.is_none() {
            self.base_url = server_url(&spec.document);
        }
        let (schemes, scheme_notices) = parse_schemes(&spec.security_schemes());
        let mut notices = spec.notices.clone();
        notices.extend(scheme_notices);
        if self.base_url.is_none() {
            notices.push(Notice::warning(
                "config",
                "no_base_url",
                "no base URL configured and the document declares no absolute server URL; requests cannot be sent",
            ));
        }

        self.schemes = schemes;
        self.active_tag = spec.tags().into_iter().next();
        info!(
            source = %spec.source,
            base_url = self.base_url.as_deref().unwrap_or("-"),
            schemes = self.schemes.len(),
            "session loaded"
        );
        self.spec = Some(spec);
        Ok(notices)
    }

    fn loaded(&self) -> Result<&ApiSpec, SessionError> {
        self.spec.as_ref().ok_or(SessionError::NoSpec)
    }

    /// Tags in display order
    pub fn tags(&self) -> Result<Vec<String>, SessionError> {
        Ok(self.loaded()?.tags())
    }

    pub fn set_active_tag(&mut self, tag: &str) -> Result<(), SessionError> {
        let spec = self.loaded()?;
        let found = spec
            .tags()
            .into_iter()
            .find(|t| t == tag)
            .or_else(|| spec.tags().into_iter().find(|t| t.eq_ignore_ascii_case(tag)))
            .ok_or_else(|| SessionError::UnknownTag {
                tag: tag.to_string(),
            })?;
        self.active_tag = Some(found);
        Ok(())
    }

    /// Endpoints of `tag`, or of the active tag
    pub fn endpoints(&self, tag: Option<&str>) -> Result<&[Endpoint], SessionError> {
        let spec = self.loaded()?;
        let Some(tag) = tag.or(self.active_tag.as_deref()) else {
            return Ok(&[][..]);
        };
        spec.groups
            .get(tag)
            .map(Vec::as_slice)
            .ok_or_else(|| SessionError::UnknownTag {
                tag: tag.to_string(),
            })
    }

    /// Make an endpoint the active one (and its tag the active tag)
    pub fn open(&mut self, selector: &str) -> Result<Endpoint, SessionError> {
        let endpoint = self.endpoint(Some(selector))?;
        self.active_tag = Some(endpoint.tag.clone());
        self.active_endpoint = Some(endpoint.id.clone());
        Ok(endpoint)
    }

    /// The endpoint named by `selector`, or the active one
    pub fn endpoint(&self, selector: Option<&str>) -> Result<Endpoint, SessionError> {
        let spec = self.loaded()?;
        match selector.map(str::trim).filter(|s| !s.is_empty()) {
            Some(sel) => spec
                .find_endpoint(sel)
                .cloned()
                .ok_or_else(|| SessionError::UnknownEndpoint {
                    selector: sel.to_string(),
                }),
            None => self.active_endpoint().cloned().ok_or(SessionError::NoActiveEndpoint),
        }
    }

    /// Seed the endpoint's state the way the form screen shows it and return the screen
    pub fn form(&mut self, selector: Option<&str>) -> Result<FormScreen, SessionError> {
        let endpoint = self.endpoint(selector)?;
        let max_depth = self.config.max_form_depth;
        let spec = self.spec.as_ref().ok_or(SessionError::NoSpec)?;
        let document = &spec.document;
        let state = self.state.endpoint_mut(&endpoint.id);
        let mut notices = Vec::new();

        let params = endpoint
            .parameters
            .iter()
            .map(|p| {
                let value = state
                    .params
                    .entry(p.key())
                    .or_insert_with(|| param_seed(p))
                    .clone();
                (p.clone(), value)
            })
            .collect();

        let body = match endpoint.request_body(document) {
            Ok(body) => body,
            Err(reference) => {
                notices.push(Notice::error(
                    "body",
                    "unresolved_ref",
                    format!("could not resolve request body reference {reference}"),
                ));
                None
            }
        };

        let mut mode = None;
        let mut view = None;
        let mut form_inputs = Vec::new();
        if let Some(body) = &body {
            match body.encoding {
                BodyEncoding::Json => {
                    let effective = effective_body_mode(Some(&*state), body);
                    state.body_mode = Some(effective);
                    mode = Some(effective);
                    match (effective, body.schema.as_ref()) {
                        (BodyMode::Fields, Some(schema)) => {
                            let walked = render_form(state, document, schema, max_depth);
                            notices.extend(walked.notices.iter().cloned());
                            view = Some(walked);
                        }
                        _ => {
                            if state.raw_body.is_none() {
                                state.raw_body = Some(raw_body_seed(body));
                            }
                        }
                    }
                }
                BodyEncoding::FormUrlEncoded => {
                    if let Some(schema) = &body.schema {
                        let required = required_names(schema);
                        let props = schema.get("properties").and_then(Value::as_object);
                        for (name, prop) in props.into_iter().flatten() {
                            let Ok(prop) = resolve_node(document, prop) else {
                                continue;
                            };
                            let value = state
                                .form_fields
                                .entry(name.clone())
                                .or_insert_with(|| form_field_seed(name, prop, &self.user_info))
                                .clone();
                            form_inputs.push(FormInput {
                                name: name.clone(),
                                value,
                                required: required.contains(&name.as_str()),
                                description: prop
                                    .get("description")
                                    .and_then(Value::as_str)
                                    .map(str::to_string),
                            });
                        }
                    }
                }
            }
        } else if endpoint.has_request_body() {
            notices.push(Notice::warning(
                "body",
                "unsupported_media_type",
                "request body media type is not supported (JSON or form-urlencoded only)",
            ));
        }

        Ok(FormScreen {
            params,
            mode,
            view,
            form_inputs,
            raw_body: state.raw_body.clone(),
            override_json: state.override_json.clone(),
            body,
            endpoint,
            notices,
        })
    }

    /// Apply one form edit to an endpoint's JSON body and return the re-walked form
    pub fn edit(&mut self, selector: Option<&str>, edit: &FormEdit) -> Result<FormView, SessionError> {
        let endpoint = self.endpoint(selector)?;
        let spec = self.spec.as_ref().ok_or(SessionError::NoSpec)?;
        let body = endpoint.request_body(&spec.document).ok().flatten();
        let Some(schema) = body
            .as_ref()
            .filter(|b| b.encoding == BodyEncoding::Json)
            .and_then(|b| b.schema.as_ref())
        else {
            return Err(SessionError::NoBodySchema {
                endpoint: endpoint.id.to_string(),
            });
        };
        let state = self.state.endpoint_mut(&endpoint.id);
        let view = edit_form(state, &spec.document, schema, edit, self.config.max_form_depth)?;
        Ok(view)
    }

    /// Set a path/query/header/cookie parameter.
    ///
    /// `name` may carry a location prefix (`query:id`), which is required when the
    /// operation declares the same name in more than one location.
    pub fn set_param(&mut self, selector: Option<&str>, name: &str, value: &str) -> Result<(), SessionError> {
        let endpoint = self.endpoint(selector)?;
        let key = param_key(&endpoint, name)?;
        self.state.endpoint_mut(&endpoint.id).params.insert(key, value.to_string());
        Ok(())
    }

    /// Set a form-urlencoded field
    pub fn set_form_field(&mut self, selector: Option<&str>, name: &str, value: &str) -> Result<(), SessionError> {
        let endpoint = self.endpoint(selector)?;
        let spec = self.loaded()?;
        let body = endpoint.request_body(&spec.document).ok().flatten();
        let Some(body) = body.filter(|b| b.encoding == BodyEncoding::FormUrlEncoded) else {
            return Err(SessionError::NotAFormBody {
                endpoint: endpoint.id.to_string(),
            });
        };
        let known = body
            .schema
            .as_ref()
            .and_then(|s| s.get("properties"))
            .and_then(Value::as_object)
            .is_some_and(|props| props.contains_key(name));
        if !known {
            return Err(SessionError::UnknownParameter {
                endpoint: endpoint.id.to_string(),
                name: name.to_string(),
            });
        }
        self.state
            .endpoint_mut(&endpoint.id)
            .form_fields
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Switch between schema fields and raw JSON
    pub fn set_body_mode(&mut self, selector: Option<&str>, mode: BodyMode) -> Result<(), SessionError> {
        let endpoint = self.endpoint(selector)?;
        let spec = self.loaded()?;
        let body = endpoint
            .request_body(&spec.document)
            .ok()
            .flatten()
            .filter(|b| b.encoding == BodyEncoding::Json);
        let Some(body) = body else {
            return Err(SessionError::NoBodySchema {
                endpoint: endpoint.id.to_string(),
            });
        };
        if mode == BodyMode::Fields && body.schema.is_none() {
            return Err(SessionError::NoBodySchema {
                endpoint: endpoint.id.to_string(),
            });
        }
        let state = self.state.endpoint_mut(&endpoint.id);
        state.body_mode = Some(mode);
        if mode == BodyMode::Raw && state.raw_body.is_none() {
            state.raw_body = Some(raw_body_seed(&body));
        }
        Ok(())
    }

    /// Store the override JSON merged over the built body. Invalid JSON is kept
    /// (so it can be fixed) and reported.
    pub fn set_override(&mut self, selector: Option<&str>, text: &str) -> Result<Vec<Notice>, SessionError> {
        let endpoint = self.endpoint(selector)?;
        self.state.endpoint_mut(&endpoint.id).override_json = text.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        Ok(match serde_json::from_str::<Value>(trimmed) {
            Ok(_) => Vec::new(),
            Err(e) => vec![Notice::warning(
                "body.override",
                "invalid_override",
                format!("override JSON is invalid and will not be applied: {e}"),
            )],
        })
    }

    /// Store raw JSON body text and switch the endpoint to raw mode
    pub fn set_raw_body(&mut self, selector: Option<&str>, text: &str) -> Result<(), SessionError> {
        let endpoint = self.endpoint(selector)?;
        let state = self.state.endpoint_mut(&endpoint.id);
        state.raw_body = Some(text.to_string());
        state.body_mode = Some(BodyMode::Raw);
        Ok(())
    }

    /// Store a credential for a declared scheme; a blank value removes it
    pub fn set_credential(&mut self, scheme: &str, value: &str) -> Result<(), SessionError> {
        self.loaded()?;
        let Some(info) = self.schemes.iter().find(|s| s.name == scheme) else {
            return Err(SessionError::UnknownScheme {
                scheme: scheme.to_string(),
            });
        };
        self.credentials.set(&info.name, value);
        self.auth_status = if self.credentials.is_empty() {
            None
        } else {
            Some(format!(
                "credentials set for: {}",
                self.credentials.schemes().collect::<Vec<_>>().join(", ")
            ))
        };
        Ok(())
    }

    /// Drop all credentials and login data
    pub fn logout(&mut self) {
        self.credentials.clear();
        self.user_info.clear();
        self.auth_status = None;
    }

    /// Prepare the request without sending it
    pub fn preview(&mut self, selector: Option<&str>) -> Result<Preparation, SessionError> {
        let screen = self.form(selector)?;
        let spec = self.loaded()?;
        let ctx = RequestContext {
            document: &spec.document,
            base_url: self.base_url.as_deref().unwrap_or_default(),
            schemes: &self.schemes,
            credentials: &self.credentials,
            user_info: &self.user_info,
        };
        let mut preparation =
            prepare_request(&ctx, &screen.endpoint, self.state.get(&screen.endpoint.id))?;
        let mut notices = screen.notices;
        notices.retain(|n| !preparation.notices.contains(n));
        notices.append(&mut preparation.notices);
        preparation.notices = notices;
        Ok(preparation)
    }

    /// Prepare and send the request, record the response and run the login flow
    pub fn send(&mut self, selector: Option<&str>) -> Result<SendOutcome, SessionError> {
        let endpoint = self.endpoint(selector)?;
        self.state.endpoint_mut(&endpoint.id).response = None;
        let preparation = self.preview(Some(endpoint.id.as_str()))?;

        info!(endpoint = %endpoint.id, method = %endpoint.method, url = %preparation.request.url, "sending request");
        let record = execute_request(self.transport.as_ref(), &preparation.request);

        let mut notices = preparation.notices.clone();
        if preparation.request.auth_endpoint {
            notices.extend(self.capture_login(&record));
        } else if matches!(record.status(), 401 | 403) {
            notices.push(Notice::warning(
                "auth",
                "unauthorized",
                format!(
                    "request was rejected with status {}; set credentials with `auth <scheme> <value>` or log in first",
                    record.status()
                ),
            ));
        }

        self.state.endpoint_mut(&endpoint.id).response = Some(record.clone());
        Ok(SendOutcome {
            preparation,
            record,
            notices,
        })
    }

    fn capture_login(&mut self, record: &ResponseRecord) -> Vec<Notice> {
        let response = match record {
            ResponseRecord::Failed { error, .. } => {
                self.auth_status = Some(format!("authentication failed: {error}"));
                return Vec::new();
            }
            ResponseRecord::Received(r) => r,
        };
        if !response.is_success() {
            let detail = response.detail();
            self.auth_status = Some(format!("authentication failed: {detail}"));
            return vec![Notice::warning(
                "auth",
                "auth_failed",
                format!("authentication failed with status {}: {detail}", response.status),
            )];
        }
        let captured = response
            .json()
            .and_then(Value::as_object)
            .and_then(|obj| capture_credentials(&self.schemes, obj));
        match captured {
            Some(captured) => {
                self.credentials.set(&captured.scheme, &captured.token);
                self.user_info = captured.user_info;
                self.auth_status = Some(format!("authenticated via {}", captured.scheme));
                info!(scheme = %captured.scheme, "credentials captured from login response");
                vec![Notice::info(
                    "auth",
                    "credentials_captured",
                    format!("login succeeded; token stored for scheme '{}'", captured.scheme),
                )]
            }
            None => vec![Notice::warning(
                "auth",
                "no_token_found",
                "login succeeded but no token matching a security scheme was found in the response",
            )],
        }
    }

    /// Last response of an endpoint
    pub fn response(&self, selector: Option<&str>) -> Result<Option<&ResponseRecord>, SessionError> {
        let endpoint = self.endpoint(selector)?;
        Ok(self.state.get(&endpoint.id).and_then(|s| s.response.as_ref()))
    }

    /// Parameters of an endpoint in a given location
    pub fn parameters_in(&self, selector: Option<&str>, location: ParameterLocation) -> Result<Vec<ParameterMeta>, SessionError> {
        Ok(self
            .endpoint(selector)?
            .parameters
            .into_iter()
            .filter(|p| p.location == location)
            .collect())
    }
}

/// Storage key for a user-given parameter name, qualified or not
fn param_key(endpoint: &Endpoint, raw: &str) -> Result<ParamKey, SessionError> {
    let (location, name) = ParamKey::split_qualified(raw);
    let matches: Vec<ParameterLocation> = endpoint
        .parameters
        .iter()
        .filter(|p| p.name == name && location.is_none_or(|l| l == p.location))
        .map(|p| p.location)
        .collect();
    let in_template = endpoint.path.contains(&format!("{{{name}}}"));
    match (matches.as_slice(), location) {
        ([only], _) => Ok(ParamKey::new(*only, name)),
        ([], Some(ParameterLocation::Path)) | ([], None) if in_template => {
            Ok(ParamKey::new(ParameterLocation::Path, name))
        }
        ([], _) => Err(SessionError::UnknownParameter {
            endpoint: endpoint.id.to_string(),
            name: raw.trim().to_string(),
        }),
        (several, _) => Err(SessionError::AmbiguousParameter {
            endpoint: endpoint.id.to_string(),
            name: name.to_string(),
            locations: several.to_vec(),
        }),
    }
}
