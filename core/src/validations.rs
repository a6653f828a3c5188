//! Fail-fast parameter checks run before any request is sent.

use serde_json::{Map, Value};

use crate::error::{Error, RequiredParamsError, Result, ValidationError};
use crate::params::is_blank;

/// Errors unless every name in `required` is a key of `provided` or of a map
/// nested anywhere inside it.
pub fn assert_required(required: &[&str], provided: &Map<String, Value>) -> Result<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !has_deep_key(provided, name))
        .map(|name| (*name).to_string())
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(RequiredParamsError::new(
        provided.clone(),
        required.iter().map(|name| (*name).to_string()).collect(),
        missing,
    )
    .into())
}

/// Errors with a plain argument error if any positional value is null. A
/// trailing options map is checked with [`assert_values_present`] instead.
pub fn assert_presence(values: &[Value]) -> Result<()> {
    let (positional, options) = match values.split_last() {
        Some((Value::Object(options), rest)) => (rest, Some(options)),
        _ => (values, None),
    };
    if positional.iter().any(Value::is_null) {
        return Err(Error::argument("parameter cannot be nil"));
    }
    match options {
        Some(options) => assert_values_present(options),
        None => Ok(()),
    }
}

/// Errors with a [`ValidationError`] listing every key of `params` whose
/// value is null or empty.
pub fn assert_values_present(params: &Map<String, Value>) -> Result<()> {
    let blank: Vec<String> = params
        .iter()
        .filter(|(_, value)| is_blank(value))
        .map(|(key, _)| key.clone())
        .collect();
    if blank.is_empty() {
        return Ok(());
    }
    Err(ValidationError::missing_values(&blank).into())
}

/// Errors when a present key holds a value outside its permitted set.
/// Arrays are checked element by element.
pub fn assert_valid_values(permitted: &[(&str, &[&str])], params: &Map<String, Value>) -> Result<()> {
    for (key, allowed) in permitted {
        let Some(value) = params.get(*key) else {
            continue;
        };
        let values: Vec<&Value> = match value {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        let accepted = values
            .iter()
            .all(|value| value.as_str().is_some_and(|text| allowed.contains(&text)));
        if !accepted {
            let allowed: Vec<String> = allowed.iter().map(|item| (*item).to_string()).collect();
            return Err(ValidationError::unknown_value(key, value, &allowed).into());
        }
    }
    Ok(())
}

/// Whether `key` is present in `map` or in any map nested in its values.
pub fn has_deep_key(map: &Map<String, Value>, key: &str) -> bool {
    map.contains_key(key)
        || map.values().any(|value| match value {
            Value::Object(nested) => has_deep_key(nested, key),
            _ => false,
        })
}
