//! Failure traces recorded by traced calls.

use cwf_script::{CallSite, Callable, Interpreter, Value};
use std::rc::Rc;

/// Replaces the global function `name` with a traced wrapper.
fn trace_global(interp: &mut Interpreter, module: &str, name: &str) {
    let Value::Function(target) = interp.run(name).expect("defined") else {
        panic!("{} is not a function", name);
    };
    let traced = Callable::Traced {
        target,
        site: CallSite::new(Some(module.to_string()), name),
    };
    interp.define_global(name, Value::Function(Rc::new(traced)));
}

fn setup() -> Interpreter {
    let mut interp = Interpreter::new();
    interp
        .run(
            "function inner(x) { throw new Error('deep ' + x) }
             function middle(x) { return inner(x + 1) }
             function outer(x) { return middle(x + 1) }",
        )
        .expect("declarations");
    trace_global(&mut interp, "app/core", "inner");
    trace_global(&mut interp, "app/core", "middle");
    trace_global(&mut interp, "app/main", "outer");
    interp
}

#[test]
fn test_entries_are_innermost_first() {
    let mut interp = setup();
    let err = interp.run("outer(1)").expect_err("throws");
    assert_eq!(err.message(), "deep 3");

    let sites: Vec<String> = interp
        .trace()
        .entries()
        .iter()
        .map(|entry| entry.site.to_string())
        .collect();
    assert_eq!(sites, vec!["app/core: inner", "app/core: middle", "app/main: outer"]);
}

#[test]
fn test_entries_capture_arguments() {
    let mut interp = setup();
    interp.run("outer(1)").expect_err("throws");

    let args: Vec<Vec<Value>> = interp
        .trace()
        .entries()
        .iter()
        .map(|entry| entry.args.clone())
        .collect();
    assert_eq!(
        args,
        vec![
            vec![Value::Number(3.0)],
            vec![Value::Number(2.0)],
            vec![Value::Number(1.0)],
        ]
    );
}

#[test]
fn test_entries_capture_context() {
    let mut interp = setup();
    interp
        .run("var holder = { run: outer }")
        .expect("holder");
    let holder = interp.run("holder").expect("holder");
    interp.run("holder.run(0)").expect_err("throws");

    let last = interp.trace().entries().last().expect("outer entry");
    assert_eq!(last.context, holder);
}

#[test]
fn test_caught_failures_leave_no_trace() {
    let mut interp = setup();
    let value = interp
        .run("var r; try { outer(1) } catch (e) { r = e.message } r")
        .expect("caught");
    assert_eq!(value, Value::from("deep 3"));
    assert!(interp.trace().is_empty());
}

#[test]
fn test_successful_calls_record_nothing() {
    let mut interp = Interpreter::new();
    interp.run("function ok() { return 1 }").expect("declare");
    trace_global(&mut interp, "app", "ok");
    assert_eq!(interp.run("ok()").expect("call"), Value::Number(1.0));
    assert!(interp.trace().is_empty());
}
