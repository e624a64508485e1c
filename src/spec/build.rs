use super::resolve::resolve_node;
use super::types::{Endpoint, EndpointId, ParameterLocation, ParameterMeta};
use crate::diagnostics::Notice;
use http::Method;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// Tag used for operations without `tags`
pub const DEFAULT_TAG: &str = "default";

/// Path item keys that are operations
pub const METHODS: [&str; 8] = ["get", "post", "put", "delete", "patch", "options", "head", "trace"];

/// Endpoints partitioned by tag; each list is sorted by `(path, method)`
pub type EndpointGroups = BTreeMap<String, Vec<Endpoint>>;

/// Partition every operation under `paths` by its first tag.
///
/// Untagged operations go under [`DEFAULT_TAG`]. Non-operation keys of a path
/// item (`parameters`, `summary`, `x-*`, unknown verbs) are ignored. Ids are
/// unique across the whole document: a collision gets a numeric suffix in
/// `(path, method)` order, so ids do not depend on key order in the document.
///
/// Unresolvable parameter references are reported and the parameter skipped.
pub fn group_endpoints(doc: &Value) -> (EndpointGroups, Vec<Notice>) {
    let mut groups: EndpointGroups = BTreeMap::new();
    let mut notices = Vec::new();
    let mut endpoints = Vec::new();

    let Some(paths) = doc.get("paths").and_then(Value::as_object) else {
        return (groups, notices);
    };

    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        let shared = item.get("parameters");
        for (key, operation) in item {
            let lower = key.to_ascii_lowercase();
            if !METHODS.contains(&lower.as_str()) || !operation.is_object() {
                continue;
            }
            let Ok(method) = Method::from_bytes(lower.to_ascii_uppercase().as_bytes()) else {
                continue;
            };

            let tag = operation
                .get("tags")
                .and_then(Value::as_array)
                .and_then(|tags| tags.first())
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_TAG)
                .to_string();

            let location = format!("{} {}", method, path);
            let parameters =
                collect_parameters(doc, shared, operation.get("parameters"), &location, &mut notices);

            endpoints.push(Endpoint {
                id: EndpointId::derive(&tag, &method, path),
                tag,
                path: path.clone(),
                method,
                operation: operation.clone(),
                parameters,
            });
        }
    }

    endpoints.sort_by(|a, b| {
        (a.path.as_str(), a.method.as_str()).cmp(&(b.path.as_str(), b.method.as_str()))
    });
    let mut seen: HashSet<EndpointId> = HashSet::new();
    for mut endpoint in endpoints {
        let base = endpoint.id.clone();
        let mut n = 2;
        while seen.contains(&endpoint.id) {
            endpoint.id = base.with_suffix(n);
            n += 1;
        }
        seen.insert(endpoint.id.clone());
        groups.entry(endpoint.tag.clone()).or_default().push(endpoint);
    }
    (groups, notices)
}

/// Tags in display order: named tags case-insensitively, `default` last
pub fn sorted_tags(groups: &EndpointGroups) -> Vec<String> {
    let mut tags: Vec<String> = groups.keys().cloned().collect();
    tags.sort_by_key(|t| (t == DEFAULT_TAG, t.to_lowercase()));
    tags
}

/// Top-level `tags` definitions keyed by name; nameless ones as `unknown_tag_<i>`
pub fn tag_definitions(doc: &Value) -> BTreeMap<String, Map<String, Value>> {
    doc.get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .enumerate()
                .filter_map(|(i, def)| {
                    let def = def.as_object()?;
                    let name = def
                        .get("name")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("unknown_tag_{i}"));
                    Some((name, def.clone()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Merge path-level and operation-level parameters; the operation wins on `(name, in)`.
fn collect_parameters(
    doc: &Value,
    shared: Option<&Value>,
    own: Option<&Value>,
    location: &str,
    notices: &mut Vec<Notice>,
) -> Vec<ParameterMeta> {
    let mut out: Vec<ParameterMeta> = Vec::new();
    for list in [shared, own].into_iter().flatten() {
        let Some(list) = list.as_array() else {
            continue;
        };
        for raw in list {
            let param = match resolve_node(doc, raw) {
                Ok(p) => p,
                Err(r) => {
                    notices.push(Notice::error(
                        location,
                        "unresolved_ref",
                        format!("parameter reference {r} could not be resolved"),
                    ));
                    continue;
                }
            };
            let Some(meta) = parameter_meta(doc, param) else {
                continue;
            };
            if let Some(existing) = out
                .iter_mut()
                .find(|p| p.name == meta.name && p.location == meta.location)
            {
                *existing = meta;
            } else {
                out.push(meta);
            }
        }
    }
    out
}

fn parameter_meta(doc: &Value, param: &Value) -> Option<ParameterMeta> {
    let name = param.get("name")?.as_str()?.to_string();
    let location = ParameterLocation::parse(param.get("in")?.as_str()?)?;
    let required = location == ParameterLocation::Path
        || param.get("required").and_then(Value::as_bool).unwrap_or(false);
    let schema = param
        .get("schema")
        .and_then(|s| resolve_node(doc, s).ok())
        .cloned();
    Some(ParameterMeta {
        name,
        location,
        required,
        description: param
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        schema,
    })
}
