use super::error::ExecuteError;
use super::request::PreparedRequest;
use super::response::{ApiResponse, ResponseRecord};
use crate::ids::ExecutionId;
use crate::logging::redact_header;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn};

/// Sends prepared requests. Implemented over HTTP by [`HttpTransport`];
/// tests can substitute a canned transport.
pub trait Transport {
    fn execute(&self, id: ExecutionId, request: &PreparedRequest) -> Result<ApiResponse, ExecuteError>;
}

/// Blocking HTTP transport with a fixed per-request timeout
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, ExecuteError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExecuteError::Client {
                message: e.to_string(),
            })?;
        Ok(HttpTransport { client, timeout })
    }
}

impl Transport for HttpTransport {
    fn execute(&self, id: ExecutionId, request: &PreparedRequest) -> Result<ApiResponse, ExecuteError> {
        let url = request.url.to_string();
        let span = info_span!("execute", execution_id = %id, method = %request.method, url = %url);
        let _guard = span.enter();

        let mut builder = self.client.request(request.method.clone(), request.url.clone());
        for (name, value) in &request.headers {
            debug!(header = %name, value = %redact_header(name, value), "request header");
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.encode());
        }

        let started = Instant::now();
        let response = builder.send().map_err(|e| {
            if e.is_timeout() {
                ExecuteError::Timeout {
                    url: url.clone(),
                    secs: self.timeout.as_secs(),
                }
            } else {
                ExecuteError::Transport {
                    url: url.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let text = response.text().map_err(|e| ExecuteError::Read {
            url: url.clone(),
            message: e.to_string(),
        })?;
        let elapsed = started.elapsed();
        info!(
            status,
            content_type = %content_type,
            elapsed_ms = elapsed.as_millis() as u64,
            "response received"
        );
        Ok(ApiResponse::from_parts(id, status, &content_type, text, elapsed))
    }
}

/// Execute once and record the outcome. Failures are recorded, never retried.
pub fn execute_request(transport: &dyn Transport, request: &PreparedRequest) -> ResponseRecord {
    let execution_id = ExecutionId::new();
    match transport.execute(execution_id, request) {
        Ok(response) => ResponseRecord::Received(response),
        Err(error) => {
            warn!(execution_id = %execution_id, error = %error, "request failed");
            ResponseRecord::Failed {
                execution_id,
                error,
            }
        }
    }
}
