//! Declared per-resource options and their current values.
//!
//! # Design
//! [`ParameterSpecs`] is the type-level registry: the ordered list of option
//! names a resource understands, each with a default and a required flag.
//! A child registry created with [`ParameterSpecs::extend`] sees every
//! parent spec and may redefine any of them once; the parent never sees the
//! child's additions or overrides.
//!
//! [`ParameterSet`] is the instance-level state: exactly one current value per
//! declared name, seeded from the defaults.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// One declared option. Immutable once defined.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    name: String,
    default: Value,
    required: bool,
}

impl ParameterSpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Ordered registry of option specs for one resource type.
#[derive(Debug, Clone, Default)]
pub struct ParameterSpecs {
    specs: Vec<ParameterSpec>,
    own: HashSet<String>,
}

impl ParameterSpecs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name`. Defining the same name twice on one registry is an
    /// argument error; redefining an inherited name replaces it in place.
    pub fn define(&mut self, name: &str, default: impl Into<Value>, required: bool) -> Result<&mut Self> {
        if !self.own.insert(name.to_string()) {
            return Err(Error::argument(format!("parameter `{name}` is already defined")));
        }
        let spec = ParameterSpec {
            name: name.to_string(),
            default: default.into(),
            required,
        };
        match self.specs.iter_mut().find(|existing| existing.name == name) {
            Some(existing) => *existing = spec,
            None => self.specs.push(spec),
        }
        Ok(self)
    }

    /// Child registry inheriting every spec defined so far.
    pub fn extend(&self) -> Self {
        Self {
            specs: self.specs.clone(),
            own: HashSet::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.specs.iter()
    }

    /// Fresh instance state holding every default.
    pub fn instantiate(&self) -> ParameterSet {
        let values = self
            .specs
            .iter()
            .map(|spec| (spec.name.clone(), spec.default.clone()))
            .collect();
        ParameterSet {
            specs: self.clone(),
            values,
        }
    }
}

/// Current option values scoped to one owner instance.
#[derive(Debug, Clone)]
pub struct ParameterSet {
    specs: ParameterSpecs,
    values: Map<String, Value>,
}

impl ParameterSet {
    pub fn specs(&self) -> &ParameterSpecs {
        &self.specs
    }

    /// Current value of a declared option.
    pub fn fetch(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Every declared option with its current value, in declaration order.
    pub fn fetch_all(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Current value when it is set to something other than null.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.fetch(name).filter(|value| !value.is_null())
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(Error::argument(format!("unknown parameter `{name}`"))),
        }
    }

    /// Restores the declared default of `name`.
    pub fn reset(&mut self, name: &str) -> Result<()> {
        let default = self
            .specs
            .get(name)
            .map(|spec| spec.default.clone())
            .ok_or_else(|| Error::argument(format!("unknown parameter `{name}`")))?;
        self.set(name, default)
    }

    /// Required options whose current value is null or empty.
    pub fn missing_required(&self) -> Vec<String> {
        self.specs
            .iter()
            .filter(|spec| spec.required)
            .filter(|spec| self.fetch(&spec.name).map_or(true, is_blank))
            .map(|spec| spec.name.clone())
            .collect()
    }
}

/// Null, empty string, empty array or empty object.
pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Generates a typed getter/setter pair per option, backed by a
/// [`ParameterSet`] field of the owner.
#[macro_export]
macro_rules! parameter_accessors {
    ($field:ident; $($name:ident => $setter:ident),+ $(,)?) => {
        $(
            pub fn $name(&self) -> Option<&str> {
                self.$field
                    .value(stringify!($name))
                    .and_then($crate::Value::as_str)
            }

            pub fn $setter(&mut self, value: impl Into<$crate::Value>) -> $crate::Result<&mut Self> {
                self.$field.set(stringify!($name), value)?;
                Ok(self)
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parent() -> ParameterSpecs {
        let mut specs = ParameterSpecs::new();
        specs.define("user", Value::Null, true).unwrap();
        specs.define("per_page", 30, false).unwrap();
        specs
    }

    #[test]
    fn defining_twice_on_same_registry_fails() {
        let mut specs = parent();
        let err = specs.define("user", "alice", false).unwrap_err();
        assert!(matches!(err, Error::Argument(message) if message.contains("already defined")));
    }

    #[test]
    fn child_override_is_invisible_to_parent() {
        let base = parent();
        let mut child = base.extend();
        child.define("per_page", 100, false).unwrap();
        child.define("repo", "app", false).unwrap();

        assert_eq!(child.get("per_page").unwrap().default_value(), &json!(100));
        assert_eq!(base.get("per_page").unwrap().default_value(), &json!(30));
        assert!(child.contains("user"));
        assert!(!base.contains("repo"));
    }

    #[test]
    fn child_keeps_declaration_order_on_override() {
        let mut child = parent().extend();
        child.define("user", "bob", false).unwrap();
        let names: Vec<_> = child.iter().map(ParameterSpec::name).collect();
        assert_eq!(names, ["user", "per_page"]);
    }

    #[test]
    fn instance_starts_with_defaults_and_tracks_overrides() {
        let mut set = parent().instantiate();
        assert_eq!(set.fetch("per_page"), Some(&json!(30)));
        assert_eq!(set.missing_required(), ["user"]);

        set.set("user", "alice").unwrap();
        assert_eq!(set.value("user"), Some(&json!("alice")));
        assert!(set.missing_required().is_empty());
        assert_eq!(set.fetch_all().len(), 2);

        set.reset("user").unwrap();
        assert_eq!(set.value("user"), None);
    }

    #[test]
    fn setting_undeclared_name_fails() {
        let mut set = parent().instantiate();
        assert!(set.set("token", "x").is_err());
        assert_eq!(set.fetch("token"), None);
    }

    #[derive(Debug)]
    struct Owner {
        params: ParameterSet,
    }

    impl Owner {
        parameter_accessors!(params; user => set_user);
    }

    #[test]
    fn generated_accessors_read_and_write_the_set() {
        let mut owner = Owner {
            params: parent().instantiate(),
        };
        assert_eq!(owner.user(), None);
        owner.set_user("carol").unwrap();
        assert_eq!(owner.user(), Some("carol"));
    }

    #[test]
    fn generated_setter_reports_undeclared_names() {
        let mut owner = Owner {
            params: ParameterSpecs::new().instantiate(),
        };
        let err = owner.set_user("carol").unwrap_err();
        assert!(matches!(err, Error::Argument(message) if message.contains("unknown parameter `user`")));
        assert_eq!(owner.user(), None);
    }
}
