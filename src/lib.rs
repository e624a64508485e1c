//! # apiform
//!
//! **apiform** is an interactive OpenAPI client: it loads an API document, groups
//! its operations by tag, renders a form for each request body schema, builds
//! the JSON payload from what was entered and sends the request.
//!
//! ## Architecture
//!
//! - **[`spec`]** - document loading, `$ref` resolution, endpoint grouping
//! - **[`form`]** - the schema-driven form engine (path accessor, walker, edits, body builder, deep merge)
//! - **[`client`]** - request preparation (parameters, body strategies, credentials) and execution
//! - **[`security`]** - security schemes, the credential store and the login flow
//! - **[`session`]** - the application shell every front-end command goes through
//! - **[`cli`]** - clap subcommands, the interactive shell and text rendering
//! - **[`diagnostics`]** - non-fatal, user-visible notices
//! - **[`logging`]** / **[`runtime_config`]** - tracing setup and layered configuration
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant User
//!     participant Session
//!     participant Form as form::walk_form
//!     participant Build as form::build_body
//!     participant Prep as client::prepare_request
//!     participant HTTP as client::HttpTransport
//!
//!     User->>Session: load http://localhost:8000
//!     Session->>Session: reset, fetch, group endpoints
//!     User->>Session: open createPet / set name rex
//!     Session->>Form: walk schema over values + includes
//!     Form-->>Session: FormView (fields, notices)
//!     User->>Session: send
//!     Session->>Prep: parameters, credentials, body mode
//!     Prep->>Build: values + includes
//!     Build-->>Prep: JSON body (override merged)
//!     Prep-->>Session: PreparedRequest + notices
//!     Session->>HTTP: execute once
//!     HTTP-->>Session: ResponseRecord
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use apiform::runtime_config::ClientConfig;
//! use apiform::session::Session;
//! use apiform::form::{FieldPath, FormEdit};
//!
//! let mut session = Session::new(ClientConfig::default())?;
//! session.load(Some("http://localhost:8000"))?;
//! session.open("createPet")?;
//! session.edit(None, &FormEdit::SetValue {
//!     path: FieldPath::parse("name")?,
//!     input: "rex".into(),
//! })?;
//! let outcome = session.send(None)?;
//! println!("{}", outcome.record.status());
//! ```

pub mod cli;
pub mod client;
pub mod diagnostics;
pub mod form;
pub mod ids;
pub mod logging;
pub mod runtime_config;
pub mod security;
pub mod session;
pub mod spec;

pub use client::{prepare_request, PreparedRequest, ResponseRecord};
pub use form::{build_body, deep_merge, get_path, set_path, walk_form, FieldPath, FormEdit};
pub use session::{Session, SessionError};
pub use spec::{resolve_ref, ApiSpec, Endpoint, EndpointId, LoadError};
