//! Free-form descriptive metadata of a component.

use cf_types::{CfError, CfResult, FromValue, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An open key → value map. Unlike options, properties have no declared
/// type: setting a property replaces both value and type.
///
/// Every component starts with `brief` and `description`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
    entries: IndexMap<String, Value>,
}

impl Properties {
    /// Creates the default property set.
    #[must_use]
    pub fn new() -> Self {
        let mut entries = IndexMap::new();
        entries.insert("brief".to_string(), Value::from(""));
        entries.insert("description".to_string(), Value::from(""));
        Self { entries }
    }

    /// Sets a property, adding it if absent.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    /// Returns a property value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Reads a property as `T`.
    ///
    /// # Errors
    ///
    /// [`CfError::ValueNotFound`] if absent, [`CfError::CastingFailed`] on a
    /// type mismatch.
    pub fn value<T: FromValue>(&self, name: &str) -> CfResult<T> {
        self.entries
            .get(name)
            .ok_or_else(|| CfError::not_found(format!("property '{name}'")))
            .and_then(T::from_value)
    }

    /// Returns `true` if the property exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Removes a property.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries.shift_remove(name)
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Properties {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_present() {
        let props = Properties::new();
        assert_eq!(props.value::<String>("brief").expect("default brief"), "");
        assert!(props.contains("description"));
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn set_replaces_type() {
        let mut props = Properties::new();
        props.set("count", 3i64);
        props.set("count", "three");
        assert_eq!(props.value::<String>("count").expect("string"), "three");
        assert!(matches!(props.value::<i64>("count"), Err(CfError::CastingFailed(_))));
        assert!(matches!(props.value::<i64>("nope"), Err(CfError::ValueNotFound(_))));
    }

    #[test]
    fn serializes_as_a_plain_map() {
        let mut props = Properties::new();
        props.set("count", 3i64);
        let json = serde_json::to_value(&props).expect("serializable");
        let map = json.as_object().expect("transparent map");
        assert_eq!(map.len(), 3);
        assert!(map.contains_key("count"));
        let back: Properties = serde_json::from_value(json).expect("deserializable");
        assert_eq!(back, props);
    }
}
