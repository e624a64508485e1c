use super::error::ExecuteError;
use crate::ids::ExecutionId;
use serde_json::Value;
use std::time::Duration;

/// Parsed response payload
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    /// Declared JSON but did not parse
    InvalidJson { raw: String },
    /// Any other content type
    NotJson { raw: String },
}

/// A response that arrived, whatever its status
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub execution_id: ExecutionId,
    pub status: u16,
    pub content_type: String,
    pub body: ResponseBody,
    pub elapsed: Duration,
}

/// Whether a content type denotes JSON (`application/json`, `application/problem+json`)
pub fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

impl ApiResponse {
    /// Classify raw response text by its content type
    pub fn from_parts(
        execution_id: ExecutionId,
        status: u16,
        content_type: &str,
        raw: String,
        elapsed: Duration,
    ) -> Self {
        let body = if is_json_content_type(content_type) {
            match serde_json::from_str::<Value>(&raw) {
                Ok(v) => ResponseBody::Json(v),
                Err(_) => ResponseBody::InvalidJson { raw },
            }
        } else {
            ResponseBody::NotJson { raw }
        };
        ApiResponse {
            execution_id,
            status,
            content_type: content_type.to_string(),
            body,
            elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Raw text for non-JSON bodies, compact JSON otherwise
    pub fn text(&self) -> String {
        match &self.body {
            ResponseBody::Json(v) => v.to_string(),
            ResponseBody::InvalidJson { raw } | ResponseBody::NotJson { raw } => raw.clone(),
        }
    }

    /// Human readable failure detail: the `detail` field if present, else the body text
    pub fn detail(&self) -> String {
        match self.json().and_then(|v| v.get("detail")) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None if self.text().is_empty() => "unknown error".to_string(),
            None => self.text(),
        }
    }
}

/// Outcome of the last execution of an endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseRecord {
    Received(ApiResponse),
    Failed {
        execution_id: ExecutionId,
        error: ExecuteError,
    },
}

impl ResponseRecord {
    pub fn status(&self) -> u16 {
        match self {
            ResponseRecord::Received(r) => r.status,
            ResponseRecord::Failed { error, .. } => error.status_hint(),
        }
    }

    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            ResponseRecord::Received(r) => Some(r),
            ResponseRecord::Failed { .. } => None,
        }
    }
}
