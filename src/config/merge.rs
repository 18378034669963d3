//! Field-by-field merging of configuration tiers.

use serde_json::Value;

/// Merge `overlay` onto `base`.
///
/// Objects merge key by key; any other overlay value replaces the base. A
/// null overlay means "not specified" and keeps the base.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Fold [`deep_merge`] over tiers, lowest priority first.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_keys_override_individually() {
        let base = json!({"store": {"backend": "sqlite", "root_title": "Main Tasks"}});
        let overlay = json!({"store": {"backend": "kv"}});
        assert_eq!(
            deep_merge(base, overlay),
            json!({"store": {"backend": "kv", "root_title": "Main Tasks"}})
        );
    }

    #[test]
    fn null_overlay_keeps_base() {
        assert_eq!(deep_merge(json!({"a": 1}), Value::Null), json!({"a": 1}));
        assert_eq!(
            deep_merge_all(vec![json!({"a": 1}), Value::Null, json!({"b": 2})]),
            json!({"a": 1, "b": 2})
        );
    }
}
