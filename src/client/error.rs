use std::fmt;

/// A request could not be prepared; nothing was sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareError {
    /// A required path parameter has no value
    MissingPathParameter { name: String },
    /// Raw body mode with text that is not valid JSON
    InvalidRawBody { message: String },
    /// Base URL and path do not form a valid URL
    InvalidUrl { url: String, message: String },
}

impl fmt::Display for PrepareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrepareError::MissingPathParameter { name } => {
                write!(f, "required path parameter '{name}' is empty")
            }
            PrepareError::InvalidRawBody { message } => {
                write!(f, "raw JSON body is invalid: {message}")
            }
            PrepareError::InvalidUrl { url, message } => {
                write!(f, "invalid request URL '{url}': {message}")
            }
        }
    }
}

impl std::error::Error for PrepareError {}

/// A prepared request failed on the wire. Never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecuteError {
    /// No response within the request timeout
    Timeout { url: String, secs: u64 },
    /// Connection, TLS or protocol failure
    Transport { url: String, message: String },
    /// The response body could not be read
    Read { url: String, message: String },
    /// The HTTP client could not be constructed
    Client { message: String },
}

impl ExecuteError {
    /// Status code recorded for the failure (408 for timeouts, 500 otherwise)
    pub fn status_hint(&self) -> u16 {
        match self {
            ExecuteError::Timeout { .. } => 408,
            _ => 500,
        }
    }
}

impl fmt::Display for ExecuteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecuteError::Timeout { url, secs } => {
                write!(f, "API error: timeout after {secs} seconds ({url})")
            }
            ExecuteError::Transport { url, message } => write!(f, "API error: {message} ({url})"),
            ExecuteError::Read { url, message } => {
                write!(f, "could not read the response from {url}: {message}")
            }
            ExecuteError::Client { message } => write!(f, "could not create HTTP client: {message}"),
        }
    }
}

impl std::error::Error for ExecuteError {}
