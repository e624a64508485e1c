use super::coerce::{choose_option, coerce_input, option_label};
use super::path::{get_path, get_path_mut, set_path, FieldPath, PathSegment};
use super::schema::{enum_options, required_names, SchemaKind};
use super::walker::is_included;
use crate::spec::resolve_node;
use serde_json::{Map, Value};
use std::fmt;

/// One user interaction with a form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEdit {
    /// Type `input` into the field at `path` (coerced to its type)
    SetValue { path: FieldPath, input: String },
    /// Tick or untick the inclusion toggle of a property
    SetIncluded { path: FieldPath, included: bool },
    /// Append an empty element to an object array
    AppendItem { path: FieldPath },
    /// Remove element `index` of an object array
    RemoveItem { path: FieldPath, index: usize },
}

impl FormEdit {
    pub fn path(&self) -> &FieldPath {
        match self {
            FormEdit::SetValue { path, .. }
            | FormEdit::SetIncluded { path, .. }
            | FormEdit::AppendItem { path }
            | FormEdit::RemoveItem { path, .. } => path,
        }
    }
}

/// Rejected form edit. The trees are left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// No field with that path in the schema
    UnknownField { path: String },
    /// The target is an object or object array, not a value
    NotAValue { path: String },
    /// Append/remove on something that is not an array of objects
    NotAnObjectArray { path: String },
    /// Array elements and the root have no inclusion toggle
    NotToggleable { path: String },
    /// Required fields are always included
    RequiredField { path: String },
    /// The target sits below (or is) an excluded field
    NotIncluded { path: String },
    /// Input outside the field's `enum`
    InvalidOption {
        path: String,
        input: String,
        options: Vec<String>,
    },
    IndexOutOfRange { path: String, index: usize, len: usize },
    /// A `$ref` on the way could not be resolved
    UnresolvedRef { path: String, reference: String },
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditError::UnknownField { path } => write!(f, "no field '{path}' in the request body"),
            EditError::NotAValue { path } => {
                write!(f, "'{path}' is a group of fields; set its members instead")
            }
            EditError::NotAnObjectArray { path } => {
                write!(f, "'{path}' is not an array of objects")
            }
            EditError::NotToggleable { path } => {
                write!(f, "'{path}' has no include toggle")
            }
            EditError::RequiredField { path } => {
                write!(f, "'{path}' is required and cannot be excluded")
            }
            EditError::NotIncluded { path } => {
                write!(f, "'{path}' is not included; include it first")
            }
            EditError::InvalidOption {
                path,
                input,
                options,
            } => write!(
                f,
                "'{input}' is not a valid option for '{path}' (expected one of: {})",
                options.join(", ")
            ),
            EditError::IndexOutOfRange { path, index, len } => {
                write!(f, "'{path}' has {len} element(s); index {index} is out of range")
            }
            EditError::UnresolvedRef { path, reference } => {
                write!(f, "reference {reference} at '{path}' could not be resolved")
            }
        }
    }
}

impl std::error::Error for EditError {}

/// Schema information for one field path
#[derive(Debug, Clone)]
pub struct FieldTarget<'a> {
    pub schema: &'a Value,
    pub kind: SchemaKind,
    pub required: bool,
}

/// Find the schema node addressed by `path`, resolving `$ref`s on the way
pub fn schema_at<'a>(
    root: &'a Value,
    body_schema: &'a Value,
    path: &FieldPath,
) -> Result<FieldTarget<'a>, EditError> {
    let unresolved = |reference: String| EditError::UnresolvedRef {
        path: path.to_string(),
        reference,
    };
    let unknown = || EditError::UnknownField {
        path: path.to_string(),
    };

    let mut current = resolve_node(root, body_schema).map_err(unresolved)?;
    let mut required = false;
    for seg in path.segments() {
        let kind = SchemaKind::of(current);
        match (seg, kind) {
            (PathSegment::Key(name), SchemaKind::Object) => {
                let raw = current
                    .get("properties")
                    .and_then(|p| p.get(name))
                    .ok_or_else(unknown)?;
                required = required_names(current).contains(&name.as_str());
                current = resolve_node(root, raw).map_err(unresolved)?;
            }
            (PathSegment::Index(_), SchemaKind::Array) => {
                let raw = current.get("items").ok_or_else(unknown)?;
                required = false;
                current = resolve_node(root, raw).map_err(unresolved)?;
            }
            _ => return Err(unknown()),
        }
    }
    Ok(FieldTarget {
        schema: current,
        kind: SchemaKind::of(current),
        required,
    })
}

fn is_object_array(root: &Value, target: &FieldTarget<'_>) -> bool {
    target.kind == SchemaKind::Array
        && target
            .schema
            .get("items")
            .and_then(|i| resolve_node(root, i).ok())
            .is_some_and(|i| SchemaKind::of(i) == SchemaKind::Object)
}

/// Every ancestor toggle on the way to `path` must be included
fn check_ancestors_included(includes: &Value, path: &FieldPath) -> Result<(), EditError> {
    let segs = path.segments();
    for end in 1..segs.len() {
        let prefix: FieldPath = segs[..end].iter().cloned().collect();
        match get_path(includes, &prefix) {
            Some(entry) if !is_included(entry) => {
                return Err(EditError::NotIncluded {
                    path: prefix.to_string(),
                })
            }
            Some(_) => {}
            None => break,
        }
    }
    Ok(())
}

/// Indices on the way to `path` must address existing array elements
fn check_items_exist(values: &Value, path: &FieldPath) -> Result<(), EditError> {
    let segs = path.segments();
    for (i, seg) in segs.iter().enumerate() {
        if let PathSegment::Index(index) = seg {
            let parent: FieldPath = segs[..i].iter().cloned().collect();
            let len = match get_path(values, &parent) {
                Some(Value::Array(items)) => items.len(),
                _ => 0,
            };
            if *index >= len {
                return Err(EditError::IndexOutOfRange {
                    path: parent.to_string(),
                    index: *index,
                    len,
                });
            }
        }
    }
    Ok(())
}

/// Apply one edit to an endpoint's values and includes trees.
///
/// The trees are expected to have been walked at least once so include
/// entries exist; the caller re-walks afterwards to re-seed and repair.
pub fn apply_edit(
    root: &Value,
    body_schema: &Value,
    values: &mut Value,
    includes: &mut Value,
    edit: &FormEdit,
) -> Result<(), EditError> {
    let path = edit.path();
    let target = schema_at(root, body_schema, path)?;
    let path_str = || path.to_string();

    match edit {
        FormEdit::SetValue { input, .. } => {
            check_items_exist(values, path)?;
            let value = match &target.kind {
                SchemaKind::Object => return Err(EditError::NotAValue { path: path_str() }),
                SchemaKind::Array if is_object_array(root, &target) => {
                    return Err(EditError::NotAValue { path: path_str() })
                }
                SchemaKind::Array => Value::String(input.clone()),
                SchemaKind::String => match enum_options(target.schema) {
                    Some(options) => {
                        choose_option(&options, input).ok_or_else(|| EditError::InvalidOption {
                            path: path_str(),
                            input: input.clone(),
                            options: options.iter().map(option_label).collect(),
                        })?
                    }
                    None => coerce_input(&target.kind, input),
                },
                kind => coerce_input(kind, input),
            };
            set_path(values, path, value);
        }
        FormEdit::SetIncluded { included, .. } => {
            if !matches!(path.last(), Some(PathSegment::Key(_))) {
                return Err(EditError::NotToggleable { path: path_str() });
            }
            if target.required && !included {
                return Err(EditError::RequiredField { path: path_str() });
            }
            check_items_exist(values, path)?;
            check_ancestors_included(includes, path)?;
            let already = get_path(includes, path).is_some_and(is_included);
            // keep an expanded subtree of child flags when re-including
            if already != *included {
                set_path(includes, path, Value::Bool(*included));
            }
        }
        FormEdit::AppendItem { .. } | FormEdit::RemoveItem { .. } => {
            if !is_object_array(root, &target) {
                return Err(EditError::NotAnObjectArray { path: path_str() });
            }
            check_items_exist(values, path)?;
            check_ancestors_included(includes, path)?;
            let own = get_path(includes, path);
            if !path.is_root() && !own.is_some_and(is_included) {
                return Err(EditError::NotIncluded { path: path_str() });
            }
            edit_array(values, includes, path, edit)?;
        }
    }
    Ok(())
}

fn edit_array(
    values: &mut Value,
    includes: &mut Value,
    path: &FieldPath,
    edit: &FormEdit,
) -> Result<(), EditError> {
    let len = match get_path(values, path) {
        Some(Value::Array(items)) => items.len(),
        _ => 0,
    };
    if let FormEdit::RemoveItem { index, .. } = edit {
        if *index >= len {
            return Err(EditError::IndexOutOfRange {
                path: path.to_string(),
                index: *index,
                len,
            });
        }
    }

    if !matches!(get_path(values, path), Some(Value::Array(_))) {
        set_path(values, path, Value::Array(Vec::new()));
    }
    // Bring the includes sequence to the same length before touching either side
    match get_path_mut(includes, path) {
        Some(Value::Array(flags)) => flags.resize_with(len, || Value::Object(Map::new())),
        _ => {
            let flags = (0..len).map(|_| Value::Object(Map::new())).collect();
            set_path(includes, path, Value::Array(flags));
        }
    }

    match edit {
        FormEdit::AppendItem { .. } => {
            for tree in [values, includes] {
                if let Some(Value::Array(items)) = get_path_mut(tree, path) {
                    items.push(Value::Object(Map::new()));
                }
            }
        }
        FormEdit::RemoveItem { index, .. } => {
            for tree in [values, includes] {
                if let Some(Value::Array(items)) = get_path_mut(tree, path) {
                    items.remove(*index);
                }
            }
        }
        _ => {}
    }
    Ok(())
}
