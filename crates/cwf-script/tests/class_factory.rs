//! Class factory behaviour as seen from script code.

use cwf_script::{Interpreter, Value};

fn run(interp: &mut Interpreter, source: &str) -> Value {
    interp
        .run(source)
        .unwrap_or_else(|e| panic!("{:?} failed: {}", source, e))
}

#[test]
fn test_plain_call_memoizes_case_insensitively() {
    let mut interp = Interpreter::new();
    run(&mut interp, "var Widget = Class.subClass()");

    assert_eq!(run(&mut interp, "Widget('Main') === Widget('main')"), Value::Boolean(true));
    assert_eq!(run(&mut interp, "Widget('a') === Widget('b')"), Value::Boolean(false));
    assert_eq!(run(&mut interp, "new Widget('main') === Widget('main')"), Value::Boolean(false));
    assert_eq!(run(&mut interp, "Widget.create('main') === Widget('MAIN')"), Value::Boolean(false));
}

#[test]
fn test_memo_key_uses_script_to_string() {
    let mut interp = Interpreter::new();
    run(
        &mut interp,
        "var Widget = Class.subClass()
         var key = { toString: function () { return 'Shared' } }",
    );
    assert_eq!(run(&mut interp, "Widget(key) === Widget('shared')"), Value::Boolean(true));
}

#[test]
fn test_init_receives_arguments() {
    let mut interp = Interpreter::new();
    run(
        &mut interp,
        "var Point = Class.subClass({ init: function (x, y) { this.x = x; this.y = y } })",
    );
    assert_eq!(run(&mut interp, "var p = new Point(3, 4); p.x + p.y"), Value::Number(7.0));
}

#[test]
fn test_own_init_is_removed_after_construction() {
    let mut interp = Interpreter::new();
    run(
        &mut interp,
        "var Once = Class.subClass({ init: function () { this.init = 'shadow' } })",
    );
    assert_eq!(run(&mut interp, "typeof new Once().init"), Value::from("function"));
}

#[test]
fn test_missing_init_is_not_an_error() {
    let mut interp = Interpreter::new();
    assert_eq!(
        run(&mut interp, "var Plain = Class.subClass({ v: 1 }); new Plain().v"),
        Value::Number(1.0)
    );
}

#[test]
fn test_late_implement_reaches_subclasses() {
    let mut interp = Interpreter::new();
    run(
        &mut interp,
        "var Base = Class.subClass()
         var Sub = Base.subClass()
         var instance = new Sub()
         Base.implement({ greet: function () { return 'hi' } })",
    );
    assert_eq!(run(&mut interp, "instance.greet()"), Value::from("hi"));
}

#[test]
fn test_override_precedence_in_either_order() {
    let mut interp = Interpreter::new();
    run(
        &mut interp,
        "var Base = Class.subClass()
         var Early = Base.subClass({ greet: function () { return 'early' } })
         Base.implement({ greet: function () { return 'base' } })
         var Late = Base.subClass()
         Late.implement({ greet: function () { return 'late' } })
         Base.implement({ greet: function () { return 'base2' } })",
    );
    assert_eq!(run(&mut interp, "new Early().greet()"), Value::from("early"));
    assert_eq!(run(&mut interp, "new Late().greet()"), Value::from("late"));
    assert_eq!(run(&mut interp, "new Base().greet()"), Value::from("base2"));
}

#[test]
fn test_inherited_implement_keeps_existing() {
    let mut interp = Interpreter::new();
    run(
        &mut interp,
        "var Base = Class.subClass({ a: 1 })
         Base.implement({ a: 2, b: 3 }, true)",
    );
    assert_eq!(run(&mut interp, "var i = new Base(); i.a + i.b"), Value::Number(4.0));
}

#[test]
fn test_cast_copies_properties() {
    let mut interp = Interpreter::new();
    run(&mut interp, "var Shape = Class.subClass({ kind: 'shape' })");
    assert_eq!(
        run(&mut interp, "var s = Shape.cast({ size: 5 }); s.size + s.kind"),
        Value::from("5shape")
    );
    assert_eq!(run(&mut interp, "s instanceof Shape"), Value::Boolean(true));
}

#[test]
fn test_instanceof_walks_the_chain() {
    let mut interp = Interpreter::new();
    run(
        &mut interp,
        "var A = Class.subClass(); var B = A.subClass(); var C = Class.subClass(); var b = new B()",
    );
    assert_eq!(run(&mut interp, "b instanceof A"), Value::Boolean(true));
    assert_eq!(run(&mut interp, "b instanceof C"), Value::Boolean(false));
    assert_eq!(run(&mut interp, "({}) instanceof A"), Value::Boolean(false));
}
