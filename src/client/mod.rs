//! # Client Module
//!
//! Turns an endpoint plus its session state into an HTTP request and records
//! what came back.
//!
//! ## Flow
//!
//! 1. [`prepare_request`] assembles URL, headers and body (form engine output,
//!    raw JSON or form-urlencoded fields) and injects credentials
//! 2. a [`Transport`] sends it once ([`HttpTransport`] over blocking reqwest)
//! 3. [`execute_request`] stores the outcome as a [`ResponseRecord`]; timeouts
//!    and transport failures are recorded with status hints 408 and 500
//!
//! Preparation problems that make sending pointless are [`PrepareError`]s;
//! everything else comes back as notices next to the prepared request.

mod error;
mod execute;
mod request;
mod response;

pub use error::{ExecuteError, PrepareError};
pub use execute::{execute_request, HttpTransport, Transport};
pub use request::{
    effective_body_mode, form_field_seed, literal_pattern, param_seed, prepare_request,
    raw_body_seed, Preparation, PreparedRequest, RequestBody, RequestContext,
};
pub use response::{is_json_content_type, ApiResponse, ResponseBody, ResponseRecord};
