//! Class descriptors and the subclass tree.
//!
//! Every class lives in a [`ClassTree`] arena and is addressed by a
//! [`ClassId`]. A class owns a flat prototype table: when a class is
//! subclassed, the child receives copies of the parent's current
//! properties, and every later [`ClassTree::implement`] on the parent is
//! pushed down the tree. Each copied slot is flagged `inherited`; a slot
//! the class defined itself is never replaced by a copy coming from above,
//! and such a local override also shields the override's own subclasses.
//!
//! Instantiation (which has to run `init`) lives in the interpreter; this
//! module only keeps the per-class instance cache used for name-based
//! memoization.

use super::object::PropertyMap;
use super::value::{ObjectRef, Value};
use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashMap};

/// Handle to a class in a [`ClassTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(usize);

impl ClassId {
    /// Position of the class in its tree.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A prototype property together with where it came from.
#[derive(Debug, Clone)]
pub struct PropertySlot {
    /// The property value
    pub value: Value,
    /// `true` when copied from a superclass, `false` when defined locally
    pub inherited: bool,
}

/// A single class.
#[derive(Debug)]
pub struct ClassDescriptor {
    id: ClassId,
    name: Option<String>,
    prototype: IndexMap<String, PropertySlot, FxBuildHasher>,
    cache: FxHashMap<String, ObjectRef>,
    sub_classes: Vec<ClassId>,
    super_class: Option<ClassId>,
}

impl ClassDescriptor {
    /// This class's handle.
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// The name the class was first declared under, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Looks up a prototype slot.
    pub fn slot(&self, key: &str) -> Option<&PropertySlot> {
        self.prototype.get(key)
    }

    /// Prototype property names in definition order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.prototype.keys().map(String::as_str)
    }

    /// Direct subclasses, in creation order.
    pub fn sub_classes(&self) -> &[ClassId] {
        &self.sub_classes
    }

    /// The class this one was derived from.
    pub fn super_class(&self) -> Option<ClassId> {
        self.super_class
    }

    /// Number of memoized instances.
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

/// Arena of all classes known to an interpreter.
#[derive(Debug, Default)]
pub struct ClassTree {
    classes: Vec<ClassDescriptor>,
}

impl ClassTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of classes defined so far.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns true if no class was defined yet.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Defines a new root class with an empty prototype.
    pub fn define_class(&mut self) -> ClassId {
        let id = ClassId(self.classes.len());
        self.classes.push(ClassDescriptor {
            id,
            name: None,
            prototype: IndexMap::default(),
            cache: FxHashMap::default(),
            sub_classes: Vec::new(),
            super_class: None,
        });
        id
    }

    /// Derives a class from `parent`.
    ///
    /// The child first receives every current prototype property of the
    /// parent as inherited slots, then `props` as its own definitions, and
    /// is finally registered in the parent's subclass list.
    pub fn sub_class(&mut self, parent: ClassId, props: Vec<(String, Value)>) -> ClassId {
        let child = self.define_class();
        let inherited: Vec<(String, Value)> = self
            .get(parent)
            .prototype
            .iter()
            .map(|(key, slot)| (key.clone(), slot.value.clone()))
            .collect();
        self.implement(child, inherited, true);
        self.implement(child, props, false);

        self.classes[parent.0].sub_classes.push(child);
        self.classes[child.0].super_class = Some(parent);
        child
    }

    /// Merges `props` into the prototype of `class` and its whole subtree.
    ///
    /// Inherited writes skip slots the class defined locally. Only the
    /// properties that were actually written continue down to subclasses,
    /// always as inherited slots.
    pub fn implement(&mut self, class: ClassId, props: Vec<(String, Value)>, inherited: bool) {
        let prototype = &mut self.classes[class.0].prototype;
        let mut applied = Vec::with_capacity(props.len());
        for (key, value) in props {
            let overridden = prototype.get(&key).is_some_and(|slot| !slot.inherited);
            if inherited && overridden {
                continue;
            }
            prototype.insert(
                key.clone(),
                PropertySlot {
                    value: value.clone(),
                    inherited,
                },
            );
            applied.push((key, value));
        }

        if applied.is_empty() {
            return;
        }
        let subs = self.classes[class.0].sub_classes.clone();
        for sub in subs {
            self.implement(sub, applied.clone(), true);
        }
    }

    /// Converts an object's own properties into an `implement` argument.
    pub fn props_from(properties: &PropertyMap) -> Vec<(String, Value)> {
        properties
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Returns the descriptor for `class`.
    pub fn get(&self, class: ClassId) -> &ClassDescriptor {
        &self.classes[class.0]
    }

    /// Resolves a prototype property.
    pub fn lookup(&self, class: ClassId, key: &str) -> Option<Value> {
        self.get(class).slot(key).map(|slot| slot.value.clone())
    }

    /// Names a class unless it already has a name.
    pub fn name_class(&mut self, class: ClassId, name: &str) {
        let descriptor = &mut self.classes[class.0];
        if descriptor.name.is_none() {
            descriptor.name = Some(name.to_string());
        }
    }

    /// Whether `class` is `ancestor` or derives from it.
    pub fn is_subclass_of(&self, class: ClassId, ancestor: ClassId) -> bool {
        let mut current = Some(class);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).super_class;
        }
        false
    }

    /// Returns the memoized instance for `key`.
    pub fn cached_instance(&self, class: ClassId, key: &str) -> Option<ObjectRef> {
        self.get(class).cache.get(key).cloned()
    }

    /// Memoizes `instance` under `key`.
    pub fn cache_instance(&mut self, class: ClassId, key: String, instance: ObjectRef) {
        self.classes[class.0].cache.insert(key, instance);
    }
}

/// Normalizes the argument text of a name-based construction.
pub fn cache_key(text: &str) -> String {
    text.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, f64)]) -> Vec<(String, Value)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::Number(*v)))
            .collect()
    }

    #[test]
    fn test_sub_class_inherits_current_prototype() {
        let mut tree = ClassTree::new();
        let base = tree.define_class();
        tree.implement(base, props(&[("a", 1.0)]), false);
        let sub = tree.sub_class(base, props(&[("b", 2.0)]));

        assert_eq!(tree.lookup(sub, "a"), Some(Value::Number(1.0)));
        assert!(tree.get(sub).slot("a").expect("slot").inherited);
        assert!(!tree.get(sub).slot("b").expect("slot").inherited);
        assert_eq!(tree.lookup(base, "b"), None);
        assert_eq!(tree.get(base).sub_classes(), &[sub]);
        assert_eq!(tree.get(sub).super_class(), Some(base));
    }

    #[test]
    fn test_late_implement_reaches_existing_subclasses() {
        let mut tree = ClassTree::new();
        let base = tree.define_class();
        let sub = tree.sub_class(base, Vec::new());
        let leaf = tree.sub_class(sub, Vec::new());

        tree.implement(base, props(&[("late", 7.0)]), false);

        assert_eq!(tree.lookup(sub, "late"), Some(Value::Number(7.0)));
        assert_eq!(tree.lookup(leaf, "late"), Some(Value::Number(7.0)));
    }

    #[test]
    fn test_override_wins_when_defined_before_base() {
        let mut tree = ClassTree::new();
        let base = tree.define_class();
        let sub = tree.sub_class(base, props(&[("greet", 2.0)]));

        tree.implement(base, props(&[("greet", 1.0)]), false);

        assert_eq!(tree.lookup(base, "greet"), Some(Value::Number(1.0)));
        assert_eq!(tree.lookup(sub, "greet"), Some(Value::Number(2.0)));
    }

    #[test]
    fn test_override_wins_when_defined_after_base() {
        let mut tree = ClassTree::new();
        let base = tree.define_class();
        tree.implement(base, props(&[("greet", 1.0)]), false);
        let sub = tree.sub_class(base, Vec::new());
        tree.implement(sub, props(&[("greet", 2.0)]), false);

        tree.implement(base, props(&[("greet", 3.0)]), false);

        assert_eq!(tree.lookup(sub, "greet"), Some(Value::Number(2.0)));
    }

    #[test]
    fn test_inherited_copies_are_refreshed() {
        let mut tree = ClassTree::new();
        let base = tree.define_class();
        tree.implement(base, props(&[("v", 1.0)]), false);
        let sub = tree.sub_class(base, Vec::new());

        tree.implement(base, props(&[("v", 2.0)]), false);

        assert_eq!(tree.lookup(sub, "v"), Some(Value::Number(2.0)));
    }

    #[test]
    fn test_override_shields_its_subtree() {
        let mut tree = ClassTree::new();
        let base = tree.define_class();
        let middle = tree.sub_class(base, props(&[("v", 10.0)]));
        let leaf = tree.sub_class(middle, Vec::new());

        tree.implement(base, props(&[("v", 1.0)]), false);

        assert_eq!(tree.lookup(middle, "v"), Some(Value::Number(10.0)));
        assert_eq!(tree.lookup(leaf, "v"), Some(Value::Number(10.0)));
    }

    #[test]
    fn test_is_subclass_of_is_reflexive_and_transitive() {
        let mut tree = ClassTree::new();
        let base = tree.define_class();
        let sub = tree.sub_class(base, Vec::new());
        let other = tree.define_class();

        assert!(tree.is_subclass_of(sub, sub));
        assert!(tree.is_subclass_of(sub, base));
        assert!(!tree.is_subclass_of(base, sub));
        assert!(!tree.is_subclass_of(sub, other));
    }

    #[test]
    fn test_name_class_keeps_first_name() {
        let mut tree = ClassTree::new();
        let class = tree.define_class();
        tree.name_class(class, "Widget");
        tree.name_class(class, "Alias");
        assert_eq!(tree.get(class).name(), Some("Widget"));
    }

    #[test]
    fn test_cache_key_is_case_insensitive() {
        assert_eq!(cache_key("App/Main"), cache_key("app/main"));
    }
}
