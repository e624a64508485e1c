//! Body builder: reconstructs the request payload from the values and
//! includes trees, walking them in lockstep with the schema.

use super::schema::SchemaKind;
use super::walker::is_included;
use crate::diagnostics::Notice;
use crate::spec::resolve_node;
use serde_json::{Map, Value};

/// Built payload plus any warnings raised while building it
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltBody {
    pub value: Value,
    pub notices: Vec<Notice>,
}

struct Builder<'a> {
    root: &'a Value,
    notices: Vec<Notice>,
}

/// Build the JSON body for a request body schema.
///
/// `trees` is `None` when the endpoint was never rendered, which yields `{}`.
/// A fully pruned body is also `{}`, never `null`.
pub fn build_body(root: &Value, schema: &Value, trees: Option<(&Value, &Value)>) -> BuiltBody {
    let mut builder = Builder {
        root,
        notices: Vec::new(),
    };
    let value = trees
        .and_then(|(values, includes)| builder.build(values, includes, schema, "body"))
        .unwrap_or_else(|| Value::Object(Map::new()));
    BuiltBody {
        value,
        notices: builder.notices,
    }
}

impl Builder<'_> {
    fn build(&mut self, values: &Value, includes: &Value, schema: &Value, at: &str) -> Option<Value> {
        let schema = match resolve_node(self.root, schema) {
            Ok(s) => s,
            Err(_) => return None,
        };
        match SchemaKind::of(schema) {
            SchemaKind::Object => self.build_object(values, includes, schema, at),
            SchemaKind::Array => Some(self.build_array(values, includes, schema, at)),
            kind => build_primitive(values, &kind),
        }
    }

    fn build_object(&mut self, values: &Value, includes: &Value, schema: &Value, at: &str) -> Option<Value> {
        let (Value::Object(values), Value::Object(includes)) = (values, includes) else {
            return None;
        };
        let props = schema.get("properties").and_then(Value::as_object)?;

        let mut out = Map::new();
        for (key, prop) in props {
            let Some(flag) = includes.get(key).filter(|f| is_included(f)) else {
                continue;
            };
            let Some(value) = values.get(key) else {
                continue;
            };
            let child_includes = if flag.is_object() || flag.is_array() {
                flag.clone()
            } else {
                Value::Bool(true)
            };
            let location = format!("{at}.{key}");
            if let Some(built) = self.build(value, &child_includes, prop, &location) {
                out.insert(key.clone(), built);
            }
        }
        if out.is_empty() {
            None
        } else {
            Some(Value::Object(out))
        }
    }

    fn build_array(&mut self, values: &Value, includes: &Value, schema: &Value, at: &str) -> Value {
        let items = schema
            .get("items")
            .and_then(|i| resolve_node(self.root, i).ok());
        let Some(items) = items else {
            return Value::Array(Vec::new());
        };

        if SchemaKind::of(items) == SchemaKind::Object {
            let (Value::Array(values), Value::Array(flags)) = (values, includes) else {
                return Value::Array(Vec::new());
            };
            let empty = Value::Object(Map::new());
            let built = values
                .iter()
                .enumerate()
                .filter_map(|(i, item)| {
                    let item_flags = flags.get(i).unwrap_or(&empty);
                    self.build(item, item_flags, items, &format!("{at}[{i}]"))
                })
                .collect();
            return Value::Array(built);
        }

        match values {
            Value::String(text) if text.trim().is_empty() => Value::Array(Vec::new()),
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(parsed) => parsed,
                Err(e) => {
                    self.notices.push(Notice::warning(
                        at,
                        "invalid_json",
                        format!("invalid JSON array, sending []: {e}"),
                    ));
                    Value::Array(Vec::new())
                }
            },
            Value::Array(_) => values.clone(),
            _ => Value::Array(Vec::new()),
        }
    }
}

fn build_primitive(value: &Value, kind: &SchemaKind) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() && kind.is_numeric() => None,
        other => Some(other.clone()),
    }
}
