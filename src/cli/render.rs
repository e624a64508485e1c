//! Plain-text rendering of sessions, forms, requests and responses.
//!
//! Every function returns a `String`; callers decide where it goes.

use crate::client::{Preparation, RequestBody, ResponseBody, ResponseRecord};
use crate::diagnostics::Notice;
use crate::form::{get_path, option_label, BodyMode, Control, FieldPath, FormField, FormView};
use crate::logging::redact_header;
use crate::session::{FormScreen, Session};
use serde_json::{Map, Value};

/// Longest table cell before truncation
const MAX_CELL_WIDTH: usize = 40;

fn pretty(v: &Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

pub fn notices(notices: &[Notice]) -> String {
    notices.iter().map(|n| format!("  {n}\n")).collect()
}

/// Document header, tags with descriptions, and their endpoints
pub fn tags(session: &Session) -> String {
    let mut out = String::new();
    let Some(spec) = session.spec() else {
        return "no API document loaded\n".to_string();
    };
    out.push_str(&format!(
        "{} {}\n",
        spec.title.as_deref().unwrap_or("N/A"),
        spec.version.as_deref().unwrap_or("")
    ));
    if let Some(description) = &spec.description {
        out.push_str(&format!("{description}\n"));
    }
    if let Some(base) = session.base_url() {
        out.push_str(&format!("base URL: {base}\n"));
    }
    for tag in spec.tags() {
        let marker = if session.active_tag() == Some(tag.as_str()) { "*" } else { " " };
        match spec.tag_description(&tag) {
            Some(d) => {
                out.push_str(&format!("\n{marker} {tag}: {d}\n"));
            }
            None => {
                out.push_str(&format!("\n{marker} {tag}\n"));
            }
        }
        for endpoint in spec.groups.get(&tag).into_iter().flatten() {
            out.push_str(&format!(
                "    {:<7} {:<40} {}  [{}]\n",
                endpoint.method.as_str(),
                endpoint.path,
                endpoint.summary().unwrap_or_default(),
                endpoint.id
            ));
        }
    }
    out
}

fn field_line(field: &FormField) -> String {
    let indent = "  ".repeat(field.depth);
    let toggle = match field.included {
        Some(true) => "[x] ",
        Some(false) => "[ ] ",
        None => "    ",
    };
    let required = if field.required { "*" } else { "" };
    let value = match &field.control {
        Control::Section => String::new(),
        Control::ObjectArray { len } => format!(" ({len} items)"),
        Control::ArrayItem { .. } => String::new(),
        Control::RawArray { text } => {
            let compact = serde_json::from_str::<Value>(text)
                .map(|v| v.to_string())
                .unwrap_or_else(|_| text.clone());
            format!(" = {compact} (JSON array)")
        }
        Control::Input { kind, value } => {
            format!(" = {} ({})", option_label(value), kind.type_name())
        }
        Control::Choice { options, selected } => {
            let options: Vec<String> = options.iter().map(option_label).collect();
            format!(" = {} {{{}}}", option_label(selected), options.join("|"))
        }
        Control::Omitted { kind } => format!(" ({}, excluded)", kind.type_name()),
    };
    let inactive = if field.active { "" } else { " ~" };
    format!("{indent}{toggle}{}{required}{value}{inactive}  <{}>", field.label, field.path)
}

pub fn form_view(view: &FormView) -> String {
    let mut out = String::new();
    for field in &view.fields {
        out.push_str(&format!("{}\n", field_line(field)));
        if let Some(description) = &field.description {
            out.push_str(&format!("{}      {description}\n", "  ".repeat(field.depth)));
        }
    }
    out
}

/// Parameters, body inputs and notices of one endpoint
pub fn form_screen(screen: &FormScreen) -> String {
    let mut out = String::new();
    let endpoint = &screen.endpoint;
    out.push_str(&format!("{}  [{}]\n", endpoint.label(), endpoint.id));
    if let Some(summary) = endpoint.summary() {
        out.push_str(&format!("{summary}\n"));
    }
    if let Some(description) = endpoint.description() {
        out.push_str(&format!("{description}\n"));
    }

    if !screen.params.is_empty() {
        out.push_str("\nParameters:\n");
        for (param, value) in &screen.params {
            let required = if param.required { "*" } else { "" };
            out.push_str(&format!(
                "  {}{required} ({}, {}) = {value}\n",
                param.name,
                param.location,
                param.type_name()
            ));
        }
    }

    if let Some(body) = &screen.body {
        out.push_str(&format!("\nBody ({}):\n", body.content_type));
        match (screen.mode, &screen.view) {
            (Some(BodyMode::Fields), Some(view)) => {
                out.push_str(&form_view(view));
                if screen.override_json.trim() != "{}" && !screen.override_json.trim().is_empty() {
                    out.push_str(&format!("  override: {}\n", screen.override_json.trim()));
                }
            }
            (Some(BodyMode::Raw), _) => {
                out.push_str("  raw JSON:\n");
                for line in screen.raw_body.as_deref().unwrap_or_default().lines() {
                    out.push_str(&format!("    {line}\n"));
                }
            }
            _ => {
                for input in &screen.form_inputs {
                    let required = if input.required { "*" } else { "" };
                    out.push_str(&format!("  {}{required} = {}\n", input.name, input.value));
                }
            }
        }
    }

    if !screen.notices.is_empty() {
        out.push_str("\nNotices:\n");
        out.push_str(&notices(&screen.notices));
    }
    out
}

/// The request as it would go on the wire (credentials redacted)
pub fn preparation(prep: &Preparation) -> String {
    let mut out = String::new();
    let request = &prep.request;
    out.push_str(&format!("{} {}\n", request.method, request.url));
    for (name, value) in &request.headers {
        out.push_str(&format!("{name}: {}\n", redact_header(name, value)));
    }
    match &request.body {
        RequestBody::Empty => {}
        body => {
            out.push_str(&format!("\n{}\n", body.preview()));
        }
    }
    if !prep.notices.is_empty() {
        out.push_str("\nNotices:\n");
        out.push_str(&notices(&prep.notices));
    }
    out
}

fn cell(v: &Value, key: &str) -> String {
    let text = match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(m) if m.is_empty() => String::new(),
        Value::Array(a) if a.is_empty() => String::new(),
        Value::Object(_) | Value::Array(_) => format!("[{key}]"),
        other => other.to_string(),
    };
    if text.chars().count() > MAX_CELL_WIDTH {
        let head: String = text.chars().take(MAX_CELL_WIDTH - 3).collect();
        format!("{head}...")
    } else {
        text
    }
}

/// Tabulate a list of objects; nested values show as `[key]` detail markers
pub fn table(rows: &[&Map<String, Value>]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|c| row.get(*c).map(|v| cell(v, c)).unwrap_or_default())
                .collect()
        })
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let line = |values: Vec<&str>| -> String {
        let filled = values.iter().rposition(|v| !v.is_empty()).map_or(0, |i| i + 1);
        values[..filled]
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{v:<width$}", width = *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };
    let mut out = String::new();
    out.push_str(&format!("{}\n", line(columns.clone())));
    out.push_str(&format!(
        "{}\n",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-")
    ));
    for row in &cells {
        out.push_str(&format!("{}\n", line(row.iter().map(String::as_str).collect())));
    }
    out
}

fn json_body(v: &Value) -> String {
    match v {
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
            let rows: Vec<&Map<String, Value>> = items.iter().filter_map(Value::as_object).collect();
            table(&rows)
        }
        Value::Object(map) if !map.is_empty() => {
            let mut out = String::new();
            for (key, value) in map {
                let shown = match value {
                    Value::Object(m) if !m.is_empty() => format!("[{key}]"),
                    Value::Array(a) if !a.is_empty() => format!("[{key}]"),
                    other => cell(other, key),
                };
                out.push_str(&format!("{key}: {shown}\n"));
            }
            out
        }
        other => format!("{}\n", pretty(other)),
    }
}

/// Status line plus the body: a table for lists of objects, key/value lines for objects
pub fn record(record: &ResponseRecord) -> String {
    match record {
        ResponseRecord::Failed { execution_id, error } => {
            format!("status {} (no response) [{execution_id}]\n{error}\n", error.status_hint())
        }
        ResponseRecord::Received(response) => {
            let mut out = format!(
                "status {} ({} ms) [{}]\n",
                response.status,
                response.elapsed.as_millis(),
                response.execution_id
            );
            match &response.body {
                ResponseBody::Json(v) => out.push_str(&json_body(v)),
                ResponseBody::InvalidJson { raw } => {
                    out.push_str(&format!("response declared JSON but could not be parsed:\n{raw}\n"));
                }
                ResponseBody::NotJson { raw } => {
                    out.push_str(&format!("content type: {}\n{raw}\n", response.content_type));
                }
            }
            out
        }
    }
}

/// Raw pretty JSON of a response
pub fn raw_json(record: &ResponseRecord) -> Option<String> {
    record.response().and_then(|r| r.json()).map(pretty)
}

/// Pretty JSON of the value at `path` (`0.address`, `[2].tags`) inside a JSON response
pub fn detail(record: &ResponseRecord, path: &str) -> Result<String, String> {
    let Some(body) = record.response().and_then(|r| r.json()) else {
        return Err("the response has no JSON body".to_string());
    };
    let normalized = normalize_detail_path(path);
    let parsed = FieldPath::parse(&normalized).map_err(|e| e.to_string())?;
    get_path(body, &parsed)
        .map(pretty)
        .ok_or_else(|| format!("nothing at '{path}' in the response"))
}

/// Accept bare numeric segments (`0.address`) as array indexes
fn normalize_detail_path(path: &str) -> String {
    path.trim()
        .split('.')
        .filter(|s| !s.is_empty())
        .map(|segment| {
            if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
                format!("[{segment}]")
            } else {
                segment.to_string()
            }
        })
        .fold(String::new(), |mut acc, seg| {
            if !acc.is_empty() && !seg.starts_with('[') {
                acc.push('.');
            }
            acc.push_str(&seg);
            acc
        })
}
