//! Built-in globals and class members.
//!
//! - `Class` - the root class
//! - `Error` - a subclass of `Class` whose `init` stores `message`
//! - `rpc(fn)` - flags a function as a remote-call callback
//! - `undefined`, `NaN`, `Infinity`
//! - `C.subClass`, `C.implement`, `C.create`, `C.cast`, `C.superClass`

use crate::error::{Error, Result};
use crate::runtime::class::{ClassId, ClassTree};
use crate::runtime::function::{Callable, NativeFn, NativeFunction};
use crate::runtime::scope::Scope;
use crate::runtime::value::Value;
use crate::vm::Interpreter;
use std::rc::Rc;

/// Create a native function value.
pub fn make_native(name: &'static str, func: NativeFn) -> Value {
    Value::Function(Rc::new(Callable::Native(NativeFunction::new(name, func))))
}

/// Defines the `Error` class under `root`.
pub fn define_error_class(classes: &mut ClassTree, root: ClassId) -> ClassId {
    let error = classes.sub_class(
        root,
        vec![
            ("init".to_string(), make_native("init", error_init)),
            ("toString".to_string(), make_native("toString", error_to_string)),
        ],
    );
    classes.name_class(error, "Error");
    error
}

/// Register the global bindings.
pub fn install_globals(globals: &Rc<Scope>, root: ClassId, error: ClassId) {
    globals.declare("Class", Value::Class(root), false);
    globals.declare("Error", Value::Class(error), false);
    globals.declare("rpc", make_native("rpc", rpc), false);
    globals.declare("undefined", Value::Undefined, false);
    globals.declare("NaN", Value::Number(f64::NAN), false);
    globals.declare("Infinity", Value::Number(f64::INFINITY), false);
}

fn error_init(interp: &mut Interpreter, this: &Value, args: &[Value]) -> Result<Value> {
    let message = match args.first() {
        None | Some(Value::Undefined) => String::new(),
        Some(value) => interp.to_string(value)?,
    };
    interp.set_property(this, "message", Value::String(message))?;
    Ok(Value::Undefined)
}

fn error_to_string(interp: &mut Interpreter, this: &Value, _args: &[Value]) -> Result<Value> {
    let message = interp.get_property(this, "message")?;
    let text = match message {
        Value::Undefined | Value::Null => "Error".to_string(),
        Value::String(s) if s.is_empty() => "Error".to_string(),
        other => format!("Error: {}", other),
    };
    Ok(Value::String(text))
}

fn rpc(_interp: &mut Interpreter, _this: &Value, args: &[Value]) -> Result<Value> {
    match args.first() {
        Some(Value::Function(callable)) => {
            Ok(Value::Function(Rc::new(callable.as_rpc_callback())))
        }
        _ => Err(Error::type_error("rpc() expects a function")),
    }
}

/// Resolves a member of a class value.
pub fn class_member(interp: &Interpreter, class: ClassId, key: &str) -> Value {
    let classes = interp.classes();
    match key {
        "subClass" => make_native("subClass", class_sub_class),
        "implement" => make_native("implement", class_implement),
        "create" => make_native("create", class_create),
        "cast" => make_native("cast", class_cast),
        "superClass" => classes
            .get(class)
            .super_class()
            .map(Value::Class)
            .unwrap_or_default(),
        "subClasses" => Value::array(
            classes
                .get(class)
                .sub_classes()
                .iter()
                .map(|id| Value::Class(*id))
                .collect(),
        ),
        "name" => classes
            .get(class)
            .name()
            .map(Value::from)
            .unwrap_or_default(),
        other => classes.lookup(class, other).unwrap_or_default(),
    }
}

fn this_class(this: &Value) -> Result<ClassId> {
    match this {
        Value::Class(class) => Ok(*class),
        other => Err(Error::type_error(format!("{} is not a class", other))),
    }
}

fn own_properties(value: Option<&Value>) -> Vec<(String, Value)> {
    match value {
        Some(Value::Object(obj)) => ClassTree::props_from(&obj.borrow().properties),
        _ => Vec::new(),
    }
}

fn class_sub_class(interp: &mut Interpreter, this: &Value, args: &[Value]) -> Result<Value> {
    let parent = this_class(this)?;
    let props = own_properties(args.first());
    Ok(Value::Class(interp.classes_mut().sub_class(parent, props)))
}

fn class_implement(interp: &mut Interpreter, this: &Value, args: &[Value]) -> Result<Value> {
    let class = this_class(this)?;
    let props = own_properties(args.first());
    let inherited = args.get(1).is_some_and(Value::to_boolean);
    interp.classes_mut().implement(class, props, inherited);
    Ok(this.clone())
}

fn class_create(interp: &mut Interpreter, this: &Value, args: &[Value]) -> Result<Value> {
    let class = this_class(this)?;
    Ok(Value::Object(interp.construct(class, args)?))
}

fn class_cast(interp: &mut Interpreter, this: &Value, args: &[Value]) -> Result<Value> {
    let class = this_class(this)?;
    interp.cast(class, args.first().unwrap_or(&Value::Undefined))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_class_sets_message() {
        let mut interp = Interpreter::new();
        let value = interp.run("var e = new Error('bad'); e.message").expect("run");
        assert_eq!(value, Value::from("bad"));
        assert_eq!(interp.run("'' + e").expect("run"), Value::from("Error: bad"));
        assert_eq!(interp.run("e instanceof Error && e instanceof Class").expect("run"), Value::Boolean(true));
    }

    #[test]
    fn test_thrown_error_message() {
        let err = Interpreter::new().run("throw new Error('boom')").expect_err("throws");
        assert_eq!(err.message(), "boom");
    }

    #[test]
    fn test_rpc_flags_function() {
        let mut interp = Interpreter::new();
        let value = interp.run("rpc(function () { return 1 })").expect("run");
        let Value::Function(callable) = value else {
            panic!("Expected a function");
        };
        assert!(callable.is_rpc_callback());
        assert!(interp.run("rpc(1)").is_err());
    }

    #[test]
    fn test_value_globals() {
        let mut interp = Interpreter::new();
        assert_eq!(interp.run("undefined").expect("run"), Value::Undefined);
        assert_eq!(interp.run("Infinity > 1000000").expect("run"), Value::Boolean(true));
        assert_eq!(interp.run("NaN === NaN").expect("run"), Value::Boolean(false));
    }

    #[test]
    fn test_class_members() {
        let mut interp = Interpreter::new();
        let value = interp
            .run("var A = Class.subClass({ a: 1 }); var B = A.subClass(); B.superClass === A")
            .expect("run");
        assert_eq!(value, Value::Boolean(true));
        assert_eq!(interp.run("A.subClasses.length").expect("run"), Value::Number(1.0));
        assert_eq!(interp.run("B.create().a").expect("run"), Value::Number(1.0));
    }
}
