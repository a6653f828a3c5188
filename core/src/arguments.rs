//! Variadic call parsing for endpoint methods.
//!
//! # Design
//! Endpoint methods take `&[Value]`: leading positional values for the
//! required names, optionally followed by an options map
//! (`args!["alice", "app", {"state": "open"}]`). [`Arguments::parse`] walks
//! the required names in order, takes positional values first, then keys of
//! the options map, then the owner's defaults. The result is a context object
//! threaded through the rest of the call; the owner is never written to.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::params::{is_blank, ParameterSet};

/// Builds an argument slice from JSON-literal tokens.
///
/// ```
/// use hub_api::args;
///
/// let args = args!["alice", "app", {"state": "open"}];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:tt),* $(,)?) => {
        vec![$($crate::json!($arg)),*]
    };
}

/// Resolved call arguments: required values, request params, leftovers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Arguments {
    required: Map<String, Value>,
    params: Map<String, Value>,
    remaining: Vec<Value>,
}

impl Arguments {
    /// Parses `args` against `required`, with no owner defaults.
    pub fn parse(args: &[Value], required: &[&str]) -> Result<Self> {
        Self::parse_with_defaults(args, required, None)
    }

    /// Parses `args` against `required`. Names the call does not supply are
    /// taken from `defaults` when it holds a non-blank value for them.
    pub fn parse_with_defaults(
        args: &[Value],
        required: &[&str],
        defaults: Option<&ParameterSet>,
    ) -> Result<Self> {
        let default_for = |name: &str| {
            defaults
                .and_then(|set| set.value(name))
                .filter(|value| !is_blank(value))
                .cloned()
        };

        if args.is_empty() && required.iter().any(|name| default_for(name).is_none()) {
            return Err(Error::argument("parameter hash expected"));
        }

        let (maps, positional): (Vec<&Value>, Vec<&Value>) =
            args.iter().partition(|value| value.is_object());
        let mut options = Map::new();
        for map in maps {
            if let Value::Object(entries) = map {
                options.extend(entries.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }

        // Only values ahead of the first options map can fill required names.
        let mut leading = args.iter().take_while(|value| !value.is_object()).count();
        let mut positional = positional.into_iter();
        let mut resolved = Map::new();
        for name in required {
            let value = if leading > 0 {
                leading -= 1;
                positional.next().cloned()
            } else {
                None
            };
            let value = match value {
                Some(value) => value,
                None => match options.get(*name) {
                    Some(value) => value.clone(),
                    None => default_for(name).ok_or_else(|| {
                        Error::argument(format!(
                            "wrong number of arguments: missing `{name}` (expected {})",
                            required.join(", ")
                        ))
                    })?,
                },
            };
            if is_blank(&value) {
                return Err(Error::argument(format!("parameter `{name}` cannot be nil")));
            }
            resolved.insert((*name).to_string(), value);
        }

        options.retain(|key, _| !required.contains(&key.as_str()));

        Ok(Self {
            required: resolved,
            params: options,
            remaining: positional.cloned().collect(),
        })
    }

    /// Required or param value by name, required values first.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.required.get(name).or_else(|| self.params.get(name))
    }

    /// String form of a value, as used in URL paths.
    pub fn str(&self, name: &str) -> Option<String> {
        self.get(name).map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
    }

    pub fn required_values(&self) -> &Map<String, Value> {
        &self.required
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.params
    }

    pub fn into_params(self) -> Map<String, Value> {
        self.params
    }

    pub fn remaining(&self) -> &[Value] {
        &self.remaining
    }
}

impl std::ops::Index<&str> for Arguments {
    type Output = Value;

    fn index(&self, name: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.get(name).unwrap_or(&NULL)
    }
}
