//! Whitelist filtering and key normalization of request parameters.
//!
//! Unknown keys are dropped silently; filtering never fails.

use heck::{ToLowerCamelCase, ToSnakeCase};
use serde_json::{Map, Value};

/// Copy of `params` holding only the `allowed` keys.
pub fn permit(allowed: &[&str], params: &Map<String, Value>) -> Map<String, Value> {
    params
        .iter()
        .filter(|(key, _)| allowed.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Drops every key of `params` not in `allowed`.
pub fn permit_in_place(allowed: &[&str], params: &mut Map<String, Value>) {
    params.retain(|key, _| allowed.contains(&key.as_str()));
}

/// Like [`permit`], also filtering maps nested at any depth (including maps
/// inside arrays) against the same whitelist.
pub fn permit_recursive(allowed: &[&str], params: &Map<String, Value>) -> Map<String, Value> {
    permit(allowed, params)
        .into_iter()
        .map(|(key, value)| (key, permit_value(allowed, value)))
        .collect()
}

fn permit_value(allowed: &[&str], value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(permit_recursive(allowed, &map)),
        Value::Array(items) => Value::Array(items.into_iter().map(|item| permit_value(allowed, item)).collect()),
        other => other,
    }
}

/// Canonical string form: map keys stay strings (nested maps included),
/// sequence elements become strings, anything else passes through.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| match value {
                    Value::Object(_) => (key, normalize_keys(value)),
                    other => (key, other),
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(|item| Value::String(stringify(item))).collect()),
        other => other,
    }
}

/// Renames every key (recursively) to `snake_case`.
pub fn snake_case_keys(params: &Map<String, Value>) -> Map<String, Value> {
    rename_keys(params, &|key| key.to_snake_case())
}

/// Renames every key (recursively) to `lowerCamelCase`.
pub fn camel_case_keys(params: &Map<String, Value>) -> Map<String, Value> {
    rename_keys(params, &|key| key.to_lower_camel_case())
}

fn rename_keys(params: &Map<String, Value>, rename: &dyn Fn(&str) -> String) -> Map<String, Value> {
    params
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Object(nested) => Value::Object(rename_keys(nested, rename)),
                other => other.clone(),
            };
            (rename(key), value)
        })
        .collect()
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn permit_drops_unknown_keys() {
        let params = map(json!({"a": 1, "b": 2, "c": 3}));
        let filtered = permit(&["a", "b"], &params);
        assert_eq!(filtered, map(json!({"a": 1, "b": 2})));
        assert_eq!(permit(&["a", "b"], &filtered), filtered);
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn permit_in_place_mutates() {
        let mut params = map(json!({"state": "open", "bogus": true}));
        permit_in_place(&["state"], &mut params);
        assert_eq!(params, map(json!({"state": "open"})));
    }

    #[test]
    fn permit_recursive_filters_nested_maps() {
        let params = map(json!({"a": {"a": 1, "x": 2}, "b": [{"b": 1, "y": 2}], "z": 0}));
        let filtered = permit_recursive(&["a", "b"], &params);
        assert_eq!(filtered, map(json!({"a": {"a": 1}, "b": [{"b": 1}]})));
    }

    #[test]
    fn normalize_keys_stringifies_sequences_and_passes_scalars() {
        assert_eq!(normalize_keys(json!(["a", 1, true])), json!(["a", "1", "true"]));
        assert_eq!(normalize_keys(json!(7)), json!(7));
        assert_eq!(normalize_keys(json!({"k": {"n": 1}})), json!({"k": {"n": 1}}));
    }

    #[test]
    fn case_conversion_recurses() {
        let params = map(json!({"perPage": 10, "headRef": {"repoName": "app"}}));
        assert_eq!(snake_case_keys(&params), map(json!({"per_page": 10, "head_ref": {"repo_name": "app"}})));
        assert_eq!(camel_case_keys(&snake_case_keys(&params)), params);
    }
}
