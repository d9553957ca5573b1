//! Script object representation.

use super::class::ClassId;
use super::value::Value;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

/// Insertion-ordered property table.
pub type PropertyMap = IndexMap<String, Value, FxBuildHasher>;

/// A script object.
///
/// Own properties live here; properties an instance receives from its
/// class are looked up in the [`ClassTree`](super::class::ClassTree) by
/// the interpreter.
#[derive(Debug, Clone, Default)]
pub struct Object {
    /// The class this object was instantiated from, if any
    pub class: Option<ClassId>,
    /// Own properties, in insertion order
    pub properties: PropertyMap,
}

impl Object {
    /// Creates a new empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty instance of `class`.
    pub fn instance_of(class: ClassId) -> Self {
        Self {
            class: Some(class),
            properties: PropertyMap::default(),
        }
    }

    /// Gets an own property value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Sets an own property value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.properties.insert(key.into(), value);
    }

    /// Deletes an own property, preserving the order of the rest.
    pub fn delete(&mut self, key: &str) -> Option<Value> {
        self.properties.shift_remove(key)
    }

    /// Checks if an own property exists.
    pub fn has(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Own property names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Number of own properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns true if there are no own properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let mut obj = Object::new();
        obj.set("a", Value::Number(1.0));
        obj.set("b", Value::Number(2.0));
        assert!(obj.has("a"));
        assert_eq!(obj.get("b"), Some(&Value::Number(2.0)));
        assert_eq!(obj.delete("a"), Some(Value::Number(1.0)));
        assert!(!obj.has("a"));
        assert_eq!(obj.len(), 1);
    }

    #[test]
    fn test_keys_keep_insertion_order() {
        let mut obj = Object::new();
        obj.set("z", Value::Null);
        obj.set("a", Value::Null);
        obj.set("m", Value::Null);
        obj.delete("a");
        assert_eq!(obj.keys().collect::<Vec<_>>(), vec!["z", "m"]);
    }
}
