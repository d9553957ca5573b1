//! Lexical scopes.
//!
//! A scope is either declarative (a table of bindings, as created by a
//! function call or block) or an object scope that resolves names against
//! the properties of an object. Object scopes give module code its view of
//! the private bag, the module itself, its dependencies and the root module
//! without copying any of their properties.

use super::value::Value;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// A binding in a declarative scope.
#[derive(Debug, Clone)]
pub struct Binding {
    /// Current value
    pub value: Value,
    /// `const` bindings reject assignment
    pub mutable: bool,
}

/// What a scope resolves names against.
#[derive(Debug)]
pub enum ScopeKind {
    /// Variables and parameters
    Declarative(RefCell<FxHashMap<String, Binding>>),
    /// Properties of an object (own and class-provided)
    Object(Value),
}

/// A link in the scope chain.
#[derive(Debug)]
pub struct Scope {
    kind: ScopeKind,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    /// Creates an empty top-level declarative scope.
    pub fn global() -> Rc<Self> {
        Rc::new(Self {
            kind: ScopeKind::Declarative(RefCell::new(FxHashMap::default())),
            parent: None,
        })
    }

    /// Creates an empty declarative scope nested in `parent`.
    pub fn declarative(parent: &Rc<Scope>) -> Rc<Self> {
        Rc::new(Self {
            kind: ScopeKind::Declarative(RefCell::new(FxHashMap::default())),
            parent: Some(Rc::clone(parent)),
        })
    }

    /// Creates a scope resolving names on `target`, nested in `parent`.
    pub fn object(target: Value, parent: &Rc<Scope>) -> Rc<Self> {
        Rc::new(Self {
            kind: ScopeKind::Object(target),
            parent: Some(Rc::clone(parent)),
        })
    }

    /// The kind of this scope.
    pub fn kind(&self) -> &ScopeKind {
        &self.kind
    }

    /// The enclosing scope.
    pub fn parent(&self) -> Option<&Rc<Scope>> {
        self.parent.as_ref()
    }

    /// Declares (or redeclares) a binding in this scope.
    ///
    /// Declaring into an object scope sets the property on the object.
    pub fn declare(&self, name: impl Into<String>, value: Value, mutable: bool) {
        match &self.kind {
            ScopeKind::Declarative(bindings) => {
                bindings
                    .borrow_mut()
                    .insert(name.into(), Binding { value, mutable });
            }
            ScopeKind::Object(Value::Object(obj)) => {
                obj.borrow_mut().set(name, value);
            }
            ScopeKind::Object(_) => {}
        }
    }

    /// Looks up a binding declared directly in this declarative scope.
    pub fn binding(&self, name: &str) -> Option<Binding> {
        match &self.kind {
            ScopeKind::Declarative(bindings) => bindings.borrow().get(name).cloned(),
            ScopeKind::Object(_) => None,
        }
    }

    /// Number of links in the chain, including this one.
    pub fn depth(&self) -> usize {
        1 + self.parent.as_ref().map_or(0, |p| p.depth())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::object::Object;

    #[test]
    fn test_declarative_bindings_shadow_by_scope() {
        let global = Scope::global();
        global.declare("x", Value::Number(1.0), true);
        let inner = Scope::declarative(&global);
        inner.declare("x", Value::Number(2.0), false);

        assert_eq!(global.binding("x").map(|b| b.value), Some(Value::Number(1.0)));
        let inner_x = inner.binding("x").expect("declared");
        assert_eq!(inner_x.value, Value::Number(2.0));
        assert!(!inner_x.mutable);
        assert_eq!(inner.depth(), 2);
    }

    #[test]
    fn test_declaring_into_object_scope_sets_property() {
        let target = Value::object(Object::new());
        let scope = Scope::object(target.clone(), &Scope::global());
        scope.declare("y", Value::Boolean(true), true);

        let obj = target.as_object().expect("object");
        assert_eq!(obj.borrow().get("y"), Some(&Value::Boolean(true)));
        assert!(scope.binding("y").is_none());
    }
}
