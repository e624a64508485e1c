//! Per-endpoint session state.
//!
//! All user input lives in an explicit [`SessionState`] owned by the caller and
//! keyed by [`EndpointId`], so two endpoints never share a tree and several
//! sessions can coexist in one process.

use crate::client::ResponseRecord;
use crate::spec::{EndpointId, ParamKey};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// How the JSON body of an endpoint is entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyMode {
    /// Schema-driven fields plus an optional override
    #[default]
    Fields,
    /// Free-form JSON text sent as is
    Raw,
}

impl BodyMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fields" | "form" => Some(BodyMode::Fields),
            "raw" | "json" => Some(BodyMode::Raw),
            _ => None,
        }
    }
}

/// Everything the user entered for one endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointState {
    /// Values tree (user-entered leaves, composites as sub-trees)
    pub values: Value,
    /// Includes tree mirroring `values`
    pub includes: Value,
    /// Chosen JSON body strategy; `None` until chosen or first rendered
    pub body_mode: Option<BodyMode>,
    /// Free-form JSON merged over the built body (Fields mode)
    pub override_json: String,
    /// Raw JSON body text (Raw mode); `None` until seeded
    pub raw_body: Option<String>,
    /// Path/query/header/cookie parameter inputs by location and name
    pub params: BTreeMap<ParamKey, String>,
    /// Flat form-urlencoded inputs by field name
    pub form_fields: BTreeMap<String, String>,
    /// Last response (or failure) of this endpoint
    pub response: Option<ResponseRecord>,
}

impl Default for EndpointState {
    fn default() -> Self {
        EndpointState {
            values: Value::Object(Map::new()),
            includes: Value::Object(Map::new()),
            body_mode: None,
            override_json: "{}".to_string(),
            raw_body: None,
            params: BTreeMap::new(),
            form_fields: BTreeMap::new(),
            response: None,
        }
    }
}

impl EndpointState {
    /// Whether the form trees were ever touched
    pub fn has_trees(&self) -> bool {
        let non_empty = |v: &Value| match v {
            Value::Object(m) => !m.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Null => false,
            _ => true,
        };
        non_empty(&self.values) || non_empty(&self.includes)
    }
}

/// All per-endpoint state of one session
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    endpoints: HashMap<EndpointId, EndpointState>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &EndpointId) -> Option<&EndpointState> {
        self.endpoints.get(id)
    }

    /// State of `id`, created on first access
    pub fn endpoint_mut(&mut self, id: &EndpointId) -> &mut EndpointState {
        self.endpoints.entry(id.clone()).or_default()
    }

    pub fn contains(&self, id: &EndpointId) -> bool {
        self.endpoints.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Drop every endpoint's state (used on spec reload)
    pub fn clear(&mut self) {
        self.endpoints.clear();
    }

    /// Drop the last response of every endpoint
    pub fn clear_responses(&mut self) {
        for state in self.endpoints.values_mut() {
            state.response = None;
        }
    }
}
