use serde_json::{Map, Value};

/// Recursively merge `source` into `destination`.
///
/// Object values are merged key by key (the destination sub-object is created
/// when missing or when it held a non-object). Every other source value
/// overwrites the destination value. Destination keys absent from `source`
/// are left alone.
pub fn deep_merge(source: &Map<String, Value>, destination: &mut Map<String, Value>) {
    for (key, value) in source {
        match value {
            Value::Object(src_child) => {
                let slot = destination
                    .entry(key.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !slot.is_object() {
                    *slot = Value::Object(Map::new());
                }
                if let Value::Object(dst_child) = slot {
                    deep_merge(src_child, dst_child);
                }
            }
            other => {
                destination.insert(key.clone(), other.clone());
            }
        }
    }
}

/// Apply an override on top of a built body.
///
/// Two objects are deep-merged with the override winning; any other override
/// shape replaces the body entirely.
pub fn merge_override(body: Value, overlay: &Value) -> Value {
    match (body, overlay) {
        (Value::Object(mut dst), Value::Object(src)) => {
            deep_merge(src, &mut dst);
            Value::Object(dst)
        }
        (_, other) => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_source_wins_on_leaves_and_keeps_other_keys() {
        let source = obj(json!({"a": {"b": 1}}));
        let mut dest = obj(json!({"a": {"b": 2, "c": 3}}));
        deep_merge(&source, &mut dest);
        assert_eq!(Value::Object(dest), json!({"a": {"b": 1, "c": 3}}));
    }

    #[test]
    fn test_creates_missing_submaps() {
        let source = obj(json!({"x": {"y": {"z": true}}}));
        let mut dest = obj(json!({"keep": 1}));
        deep_merge(&source, &mut dest);
        assert_eq!(Value::Object(dest), json!({"keep": 1, "x": {"y": {"z": true}}}));
    }

    #[test]
    fn test_object_replaces_scalar_destination() {
        let source = obj(json!({"a": {"b": 1}}));
        let mut dest = obj(json!({"a": "scalar"}));
        deep_merge(&source, &mut dest);
        assert_eq!(Value::Object(dest), json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_arrays_overwrite_not_merge() {
        let source = obj(json!({"tags": ["x"]}));
        let mut dest = obj(json!({"tags": ["a", "b"]}));
        deep_merge(&source, &mut dest);
        assert_eq!(Value::Object(dest), json!({"tags": ["x"]}));
    }

    #[test]
    fn test_merge_override_non_object_replaces() {
        assert_eq!(merge_override(json!({"a": 1}), &json!([1, 2])), json!([1, 2]));
        assert_eq!(
            merge_override(json!({"a": 1}), &json!({"b": 2})),
            json!({"a": 1, "b": 2})
        );
    }
}
