//! Form field tree walker.
//!
//! Visits a (resolved) request body schema together with an endpoint's values
//! and includes trees. The walk seeds defaults, repairs array shapes, enforces
//! required inclusion and returns a flat [`FormView`] describing every field the
//! front-end should show. It is re-run after every edit.

use super::path::{get_path, get_path_mut, set_path, FieldPath};
use super::schema::{enum_options, required_names, seed_value, SchemaKind};
use crate::diagnostics::Notice;
use crate::spec::resolve_node;
use serde_json::{Map, Value};
use tracing::trace;

/// Whether an includes entry means "included".
///
/// `true` and any composite entry (a subtree of child flags) are included;
/// `false`, null and stray scalars are not.
pub fn is_included(entry: &Value) -> bool {
    match entry {
        Value::Bool(b) => *b,
        Value::Object(_) | Value::Array(_) => true,
        _ => false,
    }
}

/// What the front-end renders for one field
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    /// Heading of a nested object
    Section,
    /// Array of objects with `len` elements; supports append and remove
    ObjectArray { len: usize },
    /// One element of an object array
    ArrayItem { index: usize },
    /// Array of non-objects edited as JSON text
    RawArray { text: String },
    /// Scalar input of the given kind holding `value`
    Input { kind: SchemaKind, value: Value },
    /// String restricted to `options`
    Choice { options: Vec<Value>, selected: Value },
    /// Not included; no value is collected
    Omitted { kind: SchemaKind },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub path: FieldPath,
    pub label: String,
    /// Nesting level, 0 for top-level properties
    pub depth: usize,
    pub required: bool,
    /// Inclusion toggle state; `None` for nodes without a toggle (array items, the root)
    pub included: Option<bool>,
    /// False when this field or an ancestor is excluded: nothing here is sent
    pub active: bool,
    pub description: Option<String>,
    pub control: Control,
}

/// Result of one walk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormView {
    pub fields: Vec<FormField>,
    pub notices: Vec<Notice>,
}

impl FormView {
    pub fn field(&self, path: &FieldPath) -> Option<&FormField> {
        self.fields.iter().find(|f| &f.path == path)
    }
}

/// Position of the node being visited
#[derive(Clone)]
struct Cursor {
    data: FieldPath,
    /// Includes path; `None` below an excluded composite, where flags are not persisted
    inc: Option<FieldPath>,
    depth: usize,
    active: bool,
}

struct Walker<'a> {
    root: &'a Value,
    max_depth: usize,
    values: &'a mut Value,
    includes: &'a mut Value,
    view: FormView,
}

/// Walk `schema` (a request body schema, possibly a `$ref`) over the given trees.
///
/// `max_depth` bounds composite nesting; deeper branches are cut with a notice.
pub fn walk_form(
    root: &Value,
    schema: &Value,
    values: &mut Value,
    includes: &mut Value,
    max_depth: usize,
) -> FormView {
    let mut walker = Walker {
        root,
        max_depth,
        values,
        includes,
        view: FormView::default(),
    };

    let node = match resolve_node(root, schema) {
        Ok(node) => node,
        Err(r) => {
            walker.view.notices.push(Notice::error(
                "body",
                "unresolved_ref",
                format!("reference {r} could not be resolved"),
            ));
            return walker.view;
        }
    };

    let kind = SchemaKind::of(node);
    let cursor = Cursor {
        data: FieldPath::root(),
        inc: Some(FieldPath::root()),
        depth: 0,
        active: true,
    };
    match kind {
        SchemaKind::Object => {
            if !walker.values.is_object() {
                *walker.values = Value::Object(Map::new());
            }
            if !walker.includes.is_object() {
                *walker.includes = Value::Object(Map::new());
            }
            walker.walk_object(node, &cursor);
        }
        SchemaKind::Array => walker.walk_array(node, &cursor, "body", false, None, None),
        _ => walker.walk_primitive(node, kind, &cursor, "body", false, None, None),
    }
    trace!(fields = walker.view.fields.len(), "form walked");
    walker.view
}

fn description_of(node: &Value) -> Option<String> {
    node.get("description")
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

impl Walker<'_> {
    fn within_depth(&mut self, cursor: &Cursor) -> bool {
        if cursor.depth <= self.max_depth {
            return true;
        }
        let message = format!(
            "form depth limit ({}) reached; deeper fields are not shown",
            self.max_depth
        );
        // Below an excluded field the cut is expected for recursive schemas
        let notice = if cursor.inc.is_some() {
            Notice::warning(cursor.data.to_string(), "depth_limit", message)
        } else {
            Notice::info(cursor.data.to_string(), "depth_limit", message)
        };
        self.view.notices.push(notice);
        false
    }

    fn walk_object(&mut self, node: &Value, cursor: &Cursor) {
        let Some(props) = node.get("properties").and_then(Value::as_object) else {
            return;
        };
        let required = required_names(node);

        for (name, raw) in props {
            let data = cursor.data.key(name);
            let prop = match resolve_node(self.root, raw) {
                Ok(p) => p,
                Err(r) => {
                    self.view.notices.push(Notice::error(
                        data.to_string(),
                        "unresolved_ref",
                        format!("reference {r} for property '{name}' could not be resolved"),
                    ));
                    continue;
                }
            };
            let kind = SchemaKind::of(prop);
            let is_required = required.contains(&name.as_str());
            let default_include = is_required || (seed_value(prop).is_some() && !kind.is_composite());
            let inc = cursor.inc.as_ref().map(|p| p.key(name));
            let included = match &inc {
                Some(ip) => self.sync_include(ip, is_required, default_include),
                None => default_include,
            };

            let child = Cursor {
                data,
                inc: if included { inc } else { None },
                depth: cursor.depth + 1,
                active: cursor.active && included,
            };
            let description = description_of(prop);

            match kind {
                SchemaKind::Object => {
                    if !self.within_depth(&child) {
                        continue;
                    }
                    self.view.fields.push(FormField {
                        path: child.data.clone(),
                        label: name.clone(),
                        depth: cursor.depth,
                        required: is_required,
                        included: Some(included),
                        active: child.active,
                        description,
                        control: Control::Section,
                    });
                    self.walk_object(prop, &child);
                }
                SchemaKind::Array if included => {
                    self.walk_array(prop, &child, name, is_required, Some(true), description);
                }
                _ if included => {
                    self.walk_primitive(prop, kind, &child, name, is_required, Some(true), description);
                }
                _ => self.view.fields.push(FormField {
                    path: child.data,
                    label: name.clone(),
                    depth: cursor.depth,
                    required: is_required,
                    included: Some(false),
                    active: false,
                    description,
                    control: Control::Omitted { kind },
                }),
            }
        }
    }

    /// Read (and seed or force) the inclusion entry at `ip`
    fn sync_include(&mut self, ip: &FieldPath, required: bool, default_include: bool) -> bool {
        let (included, write) = match get_path(self.includes, ip) {
            Some(Value::Object(_)) | Some(Value::Array(_)) => (true, false),
            Some(Value::Bool(b)) => (*b || required, !*b && required),
            _ => (default_include, true),
        };
        if write {
            set_path(self.includes, ip, Value::Bool(included));
        }
        included
    }

    fn walk_array(
        &mut self,
        node: &Value,
        cursor: &Cursor,
        label: &str,
        required: bool,
        included: Option<bool>,
        description: Option<String>,
    ) {
        if !self.within_depth(cursor) {
            return;
        }
        let items = match node.get("items") {
            Some(raw) => match resolve_node(self.root, raw) {
                Ok(items) => Some(items),
                Err(r) => {
                    self.view.notices.push(Notice::error(
                        cursor.data.to_string(),
                        "unresolved_ref",
                        format!("items reference {r} of '{label}' could not be resolved"),
                    ));
                    return;
                }
            },
            None => None,
        };
        let depth = cursor.depth.saturating_sub(1);

        match items.filter(|i| SchemaKind::of(i) == SchemaKind::Object) {
            Some(item_schema) => {
                let len = self.sync_object_array(cursor);
                self.view.fields.push(FormField {
                    path: cursor.data.clone(),
                    label: label.to_string(),
                    depth,
                    required,
                    included,
                    active: cursor.active,
                    description,
                    control: Control::ObjectArray { len },
                });
                for index in 0..len {
                    let item = Cursor {
                        data: cursor.data.index(index),
                        inc: cursor.inc.as_ref().map(|p| p.index(index)),
                        depth: cursor.depth + 1,
                        active: cursor.active,
                    };
                    if !self.within_depth(&item) {
                        break;
                    }
                    self.view.fields.push(FormField {
                        path: item.data.clone(),
                        label: format!("{label} #{}", index + 1),
                        depth: cursor.depth,
                        required: false,
                        included: None,
                        active: item.active,
                        description: None,
                        control: Control::ArrayItem { index },
                    });
                    self.walk_object(item_schema, &item);
                }
            }
            None => {
                let text = match get_path(self.values, &cursor.data) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Array(a)) => {
                        serde_json::to_string_pretty(a).unwrap_or_else(|_| "[]".to_string())
                    }
                    _ => {
                        let seed = seed_value(node)
                            .cloned()
                            .unwrap_or_else(|| Value::Array(Vec::new()));
                        let text =
                            serde_json::to_string_pretty(&seed).unwrap_or_else(|_| "[]".to_string());
                        set_path(self.values, &cursor.data, Value::String(text.clone()));
                        text
                    }
                };
                self.view.fields.push(FormField {
                    path: cursor.data.clone(),
                    label: label.to_string(),
                    depth,
                    required,
                    included,
                    active: cursor.active,
                    description,
                    control: Control::RawArray { text },
                });
            }
        }
    }

    /// Keep the values and includes sequences of an object array the same length,
    /// with a mapping in every slot. Returns the element count.
    fn sync_object_array(&mut self, cursor: &Cursor) -> usize {
        if !matches!(get_path(self.values, &cursor.data), Some(Value::Array(_))) {
            set_path(self.values, &cursor.data, Value::Array(Vec::new()));
        }
        let len = match get_path_mut(self.values, &cursor.data) {
            Some(Value::Array(items)) => {
                for item in items.iter_mut().filter(|i| !i.is_object()) {
                    *item = Value::Object(Map::new());
                }
                items.len()
            }
            _ => 0,
        };

        if let Some(ip) = &cursor.inc {
            match get_path_mut(self.includes, ip) {
                Some(Value::Array(flags)) => {
                    flags.truncate(len);
                    flags.resize_with(len, || Value::Object(Map::new()));
                    for flag in flags.iter_mut().filter(|f| !f.is_object()) {
                        *flag = Value::Object(Map::new());
                    }
                }
                _ => {
                    let flags = (0..len).map(|_| Value::Object(Map::new())).collect();
                    set_path(self.includes, ip, Value::Array(flags));
                }
            }
        }
        len
    }

    #[allow(clippy::too_many_arguments)]
    fn walk_primitive(
        &mut self,
        node: &Value,
        kind: SchemaKind,
        cursor: &Cursor,
        label: &str,
        required: bool,
        included: Option<bool>,
        description: Option<String>,
    ) {
        let needs_seed = matches!(
            get_path(self.values, &cursor.data),
            None | Some(Value::Null) | Some(Value::Object(_)) | Some(Value::Array(_))
        );
        if needs_seed {
            let seed = seed_value(node)
                .cloned()
                .unwrap_or_else(|| kind.zero_value());
            set_path(self.values, &cursor.data, seed);
        }
        let value = get_path(self.values, &cursor.data)
            .cloned()
            .unwrap_or(Value::Null);

        let control = match enum_options(node).filter(|_| kind == SchemaKind::String) {
            Some(options) => {
                let default = node.get("default");
                let selected = if options.contains(&value) {
                    value
                } else if let Some(d) = default.filter(|d| options.contains(d)) {
                    d.clone()
                } else {
                    options[0].clone()
                };
                if get_path(self.values, &cursor.data) != Some(&selected) {
                    set_path(self.values, &cursor.data, selected.clone());
                }
                Control::Choice { options, selected }
            }
            None => Control::Input { kind, value },
        };

        self.view.fields.push(FormField {
            path: cursor.data.clone(),
            label: label.to_string(),
            depth: cursor.depth.saturating_sub(1),
            required,
            included,
            active: cursor.active,
            description,
            control,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn walk(schema: &Value, values: &mut Value, includes: &mut Value) -> FormView {
        walk_form(&json!({}), schema, values, includes, 10)
    }

    fn p(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    #[test]
    fn test_required_fields_seeded_and_included() {
        let schema = json!({
            "type": "object",
            "required": ["name", "age"],
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "integer"},
                "nickname": {"type": "string"},
                "active": {"type": "boolean", "default": true}
            }
        });
        let (mut values, mut includes) = (json!({}), json!({}));
        let view = walk(&schema, &mut values, &mut includes);
        assert_eq!(values, json!({"name": "", "age": 0, "active": true}));
        assert_eq!(
            includes,
            json!({"name": true, "age": true, "nickname": false, "active": true})
        );
        let nickname = view.field(&p("nickname")).unwrap();
        assert!(matches!(nickname.control, Control::Omitted { .. }));
        assert!(view.notices.is_empty());
    }

    #[test]
    fn test_required_forced_back_to_true() {
        let schema = json!({
            "type": "object",
            "required": ["id"],
            "properties": {"id": {"type": "integer"}}
        });
        let (mut values, mut includes) = (json!({}), json!({"id": false}));
        walk(&schema, &mut values, &mut includes);
        assert_eq!(includes["id"], json!(true));
    }

    #[test]
    fn test_enum_selection_normalized() {
        let schema = json!({
            "type": "object",
            "required": ["status"],
            "properties": {
                "status": {"type": "string", "enum": ["available", "sold"], "default": "sold"}
            }
        });
        let (mut values, mut includes) = (json!({"status": "bogus"}), json!({}));
        let view = walk(&schema, &mut values, &mut includes);
        assert_eq!(values["status"], "sold");
        match &view.field(&p("status")).unwrap().control {
            Control::Choice { selected, options } => {
                assert_eq!(selected, "sold");
                assert_eq!(options.len(), 2);
            }
            other => panic!("unexpected control {other:?}"),
        }
    }

    #[test]
    fn test_object_array_repaired() {
        let schema = json!({
            "type": "object",
            "properties": {
                "items": {
                    "type": "array",
                    "items": {"type": "object", "required": ["sku"], "properties": {"sku": {"type": "string"}}}
                }
            }
        });
        let mut values = json!({"items": [{"sku": "a"}, 5]});
        let mut includes = json!({"items": [{}, {}, {}]});
        let view = walk(&schema, &mut values, &mut includes);
        assert_eq!(values, json!({"items": [{"sku": "a"}, {"sku": ""}]}));
        assert_eq!(includes, json!({"items": [{"sku": true}, {"sku": true}]}));
        assert!(matches!(
            view.field(&p("items")).unwrap().control,
            Control::ObjectArray { len: 2 }
        ));
        assert!(view.field(&p("items[1].sku")).is_some());
    }

    #[test]
    fn test_excluded_array_not_walked() {
        let schema = json!({
            "type": "object",
            "properties": {"tags": {"type": "array", "items": {"type": "string"}}}
        });
        let (mut values, mut includes) = (json!({}), json!({}));
        let view = walk(&schema, &mut values, &mut includes);
        assert_eq!(includes["tags"], json!(false));
        assert!(values.get("tags").is_none());
        assert!(matches!(
            view.field(&p("tags")).unwrap().control,
            Control::Omitted { kind: SchemaKind::Array }
        ));
    }

    #[test]
    fn test_raw_array_seeded_from_example() {
        let schema = json!({
            "type": "object",
            "required": ["tags"],
            "properties": {"tags": {"type": "array", "items": {"type": "string"}, "example": ["a"]}}
        });
        let (mut values, mut includes) = (json!({}), json!({}));
        walk(&schema, &mut values, &mut includes);
        assert_eq!(values["tags"], json!("[\n  \"a\"\n]"));
        assert_eq!(includes["tags"], json!(true));
    }

    #[test]
    fn test_excluded_object_children_walked_detached() {
        let schema = json!({
            "type": "object",
            "properties": {
                "address": {
                    "type": "object",
                    "required": ["city"],
                    "properties": {"city": {"type": "string", "default": "Lima"}}
                }
            }
        });
        let (mut values, mut includes) = (json!({}), json!({}));
        let view = walk(&schema, &mut values, &mut includes);
        // flags stay collapsed under the excluded parent, values are seeded
        assert_eq!(includes, json!({"address": false}));
        assert_eq!(values, json!({"address": {"city": "Lima"}}));
        assert!(!view.field(&p("address.city")).unwrap().active);
    }

    #[test]
    fn test_included_object_flags_expanded() {
        let schema = json!({
            "type": "object",
            "properties": {
                "address": {
                    "type": "object",
                    "properties": {"city": {"type": "string"}, "zip": {"type": "string", "example": "1000"}}
                }
            }
        });
        let (mut values, mut includes) = (json!({}), json!({"address": true}));
        let view = walk(&schema, &mut values, &mut includes);
        assert_eq!(includes, json!({"address": {"city": false, "zip": true}}));
        assert_eq!(values, json!({"address": {"zip": "1000"}}));
        assert!(view.field(&p("address.zip")).unwrap().active);
    }

    #[test]
    fn test_unresolved_property_ref_skipped() {
        let schema = json!({
            "type": "object",
            "properties": {
                "owner": {"$ref": "#/components/schemas/Missing"},
                "name": {"type": "string", "default": "x"}
            }
        });
        let (mut values, mut includes) = (json!({}), json!({}));
        let view = walk(&schema, &mut values, &mut includes);
        assert_eq!(view.notices.len(), 1);
        assert_eq!(view.notices[0].kind, "unresolved_ref");
        assert_eq!(values, json!({"name": "x"}));
    }

    #[test]
    fn test_self_referential_schema_bounded() {
        let root = json!({
            "components": {"schemas": {"Node": {
                "type": "object",
                "properties": {
                    "label": {"type": "string"},
                    "child": {"$ref": "#/components/schemas/Node"}
                }
            }}}
        });
        let schema = json!({"$ref": "#/components/schemas/Node"});
        let (mut values, mut includes) = (json!({}), json!({}));
        let view = walk_form(&root, &schema, &mut values, &mut includes, 3);
        assert!(view.notices.iter().any(|n| n.kind == "depth_limit"));
        assert!(view.fields.iter().all(|f| f.depth <= 3));
    }

    #[test]
    fn test_walk_is_idempotent() {
        let schema = json!({
            "type": "object",
            "required": ["a"],
            "properties": {"a": {"type": "number", "example": 1.5}, "b": {"type": "boolean"}}
        });
        let (mut values, mut includes) = (json!({}), json!({}));
        let first = walk(&schema, &mut values, &mut includes);
        let snapshot = (values.clone(), includes.clone());
        let second = walk(&schema, &mut values, &mut includes);
        assert_eq!(first, second);
        assert_eq!(snapshot, (values, includes));
    }

    #[test]
    fn test_is_included_truthiness() {
        assert!(is_included(&json!(true)));
        assert!(is_included(&json!({})));
        assert!(is_included(&json!([])));
        assert!(!is_included(&json!(false)));
        assert!(!is_included(&json!(null)));
        assert!(!is_included(&json!("yes")));
    }
}
