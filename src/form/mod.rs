//! Schema-driven form engine.
//!
//! The engine keeps two parallel trees per endpoint (values and includes),
//! re-walks the request body schema over them after every edit, and rebuilds
//! the JSON payload on demand:
//!
//! ```text
//! schema ──walk──▶ FormView (fields to show)
//!    │               ▲
//!    │          apply_edit
//!    ▼               │
//! values / includes ─┘ ──build──▶ JSON body (+ override merge)
//! ```
//!
//! All functions work on plain `serde_json::Value` trees and never panic on
//! malformed input; problems come back as [`crate::diagnostics::Notice`]s.

mod build;
mod coerce;
mod edit;
mod merge;
mod path;
mod schema;
mod state;
mod walker;

pub use build::{build_body, BuiltBody};
pub use coerce::{choose_option, coerce_input, option_label};
pub use edit::{apply_edit, schema_at, EditError, FieldTarget, FormEdit};
pub use merge::{deep_merge, merge_override};
pub use path::{get_or, get_path, get_path_mut, set_path, FieldPath, PathParseError, PathSegment};
pub use schema::{enum_options, required_names, seed_value, SchemaKind};
pub use state::{BodyMode, EndpointState, SessionState};
pub use walker::{is_included, walk_form, Control, FormField, FormView};

use serde_json::Value;

/// Walk the body schema over an endpoint's trees
pub fn render_form(
    state: &mut EndpointState,
    root: &Value,
    schema: &Value,
    max_depth: usize,
) -> FormView {
    walk_form(root, schema, &mut state.values, &mut state.includes, max_depth)
}

/// Apply an edit and re-walk: the "apply edit, then recompute form" step.
///
/// The form is walked once before the edit so include entries exist for the
/// edited path even if the endpoint was never rendered.
pub fn edit_form(
    state: &mut EndpointState,
    root: &Value,
    schema: &Value,
    edit: &FormEdit,
    max_depth: usize,
) -> Result<FormView, EditError> {
    render_form(state, root, schema, max_depth);
    apply_edit(root, schema, &mut state.values, &mut state.includes, edit)?;
    Ok(render_form(state, root, schema, max_depth))
}

/// Build the body for an endpoint's current trees
pub fn build_endpoint_body(state: Option<&EndpointState>, root: &Value, schema: &Value) -> BuiltBody {
    build_body(root, schema, state.map(|s| (&s.values, &s.includes)))
}
