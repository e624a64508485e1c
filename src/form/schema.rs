//! Schema node classification.
//!
//! Every node is classified once into a [`SchemaKind`] and the walker and the
//! body builder match on it exhaustively.

use serde_json::{Map, Value};

/// Rendering category of a (resolved) schema node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaKind {
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
    /// No `type`, or a type this client does not model; rendered as free text
    Unknown(Option<String>),
}

impl SchemaKind {
    /// Classify a node by its `type` keyword.
    ///
    /// A type array (`["string", "null"]`) uses its first non-null member. A node
    /// with `properties` but no `type` is treated as an object, one with `items`
    /// as an array.
    pub fn of(node: &Value) -> Self {
        let declared = match node.get("type") {
            Some(Value::String(s)) => Some(s.as_str()),
            Some(Value::Array(types)) => types
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null"),
            _ => None,
        };
        match declared {
            Some("object") => SchemaKind::Object,
            Some("array") => SchemaKind::Array,
            Some("string") => SchemaKind::String,
            Some("integer") => SchemaKind::Integer,
            Some("number") => SchemaKind::Number,
            Some("boolean") => SchemaKind::Boolean,
            Some(other) => SchemaKind::Unknown(Some(other.to_string())),
            None if node.get("properties").is_some_and(Value::is_object) => SchemaKind::Object,
            None if node.get("items").is_some() => SchemaKind::Array,
            None => SchemaKind::Unknown(None),
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, SchemaKind::Object | SchemaKind::Array)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, SchemaKind::Integer | SchemaKind::Number)
    }

    /// Zero value seeded into a primitive field with no default or example
    pub fn zero_value(&self) -> Value {
        match self {
            SchemaKind::Integer | SchemaKind::Number => Value::from(0),
            SchemaKind::Boolean => Value::Bool(false),
            SchemaKind::Object => Value::Object(Map::new()),
            SchemaKind::Array => Value::Array(Vec::new()),
            SchemaKind::String | SchemaKind::Unknown(_) => Value::String(String::new()),
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            SchemaKind::Object => "object",
            SchemaKind::Array => "array",
            SchemaKind::String => "string",
            SchemaKind::Integer => "integer",
            SchemaKind::Number => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Unknown(Some(t)) => t,
            SchemaKind::Unknown(None) => "any",
        }
    }
}

/// `default`, falling back to `example`; JSON null counts as absent
pub fn seed_value(node: &Value) -> Option<&Value> {
    node.get("default")
        .filter(|v| !v.is_null())
        .or_else(|| node.get("example").filter(|v| !v.is_null()))
}

/// Names listed under `required`
pub fn required_names(node: &Value) -> Vec<&str> {
    node.get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// String options of a non-empty `enum`
pub fn enum_options(node: &Value) -> Option<Vec<Value>> {
    let options = node.get("enum")?.as_array()?;
    if options.is_empty() {
        None
    } else {
        Some(options.clone())
    }
}
