use super::schema::SchemaKind;
use serde_json::Value;

/// Convert user text into a value of the field's declared type.
///
/// Blank input for a numeric field is stored as `""` (cleared; the body builder
/// omits it). Unparseable numbers fall back to zero and unrecognized booleans to
/// `false`. Strings and untyped fields keep the text as is.
pub fn coerce_input(kind: &SchemaKind, input: &str) -> Value {
    let trimmed = input.trim();
    match kind {
        SchemaKind::Integer => {
            if trimmed.is_empty() {
                Value::String(String::new())
            } else {
                Value::from(trimmed.parse::<i64>().unwrap_or(0))
            }
        }
        SchemaKind::Number => {
            if trimmed.is_empty() {
                Value::String(String::new())
            } else if let Ok(i) = trimmed.parse::<i64>() {
                Value::from(i)
            } else {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::from(0))
            }
        }
        SchemaKind::Boolean => Value::Bool(parse_bool(trimmed)),
        SchemaKind::String | SchemaKind::Unknown(_) | SchemaKind::Object | SchemaKind::Array => {
            Value::String(input.to_string())
        }
    }
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "y" | "on"
    )
}

/// Text form of an enum option as typed by a user
pub fn option_label(option: &Value) -> String {
    match option {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The enum member matching `input`, if any
pub fn choose_option(options: &[Value], input: &str) -> Option<Value> {
    options
        .iter()
        .find(|o| option_label(o) == input.trim())
        .cloned()
}
