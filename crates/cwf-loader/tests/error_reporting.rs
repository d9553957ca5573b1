//! Failure attribution and error reports.

mod common;

use common::{CollectingSink, FailingSink};
use cwf_loader::{LoaderConfig, LoaderError, MemorySource, ModuleLoader, pack};

fn loader(source: MemorySource) -> (ModuleLoader, CollectingSink) {
    let sink = CollectingSink::default();
    let loader = ModuleLoader::new(LoaderConfig::default())
        .with_source(source)
        .with_sink(sink.clone());
    (loader, sink)
}

#[test]
fn test_fault_names_the_failing_declaration() {
    let (mut loader, sink) = loader(MemorySource::new());
    let outcome = loader
        .load(&pack("\na=1\nb=throwsError()\nc=3"), "demo", 0)
        .expect("reported");

    let report = outcome.report().expect("failure");
    assert_eq!(report.fault.as_deref(), Some("b"));
    assert_eq!(report.trace_text, "demo: b");
    assert!(report.message.contains("throwsError"));
    assert_eq!(sink.reports(), vec![(report.message.clone(), "demo: b".to_string())]);

    // no declaration after the failure ran, and the marker is gone
    let instance = loader.interpreter_mut().run("Module('demo')").expect("run");
    let instance = instance.as_object().expect("object").borrow().clone();
    assert!(instance.get("a").is_some());
    assert!(instance.get("c").is_none());
    assert!(instance.get("fault").is_none());
}

#[test]
fn test_syntax_errors_are_localized() {
    let (mut loader, _sink) = loader(MemorySource::new());
    let outcome = loader
        .load(&pack("\na=1\nb=(2 +\nc=3"), "demo", 0)
        .expect("reported");

    let report = outcome.report().expect("failure");
    assert_eq!(report.fault.as_deref(), Some("b"));
    assert_eq!(report.trace_text, "demo: b");
    assert!(loader.compiled("demo").is_none());
}

#[test]
fn test_malformed_payload_is_reported() {
    let (mut loader, _sink) = loader(MemorySource::new());
    let outcome = loader.load("nospace", "demo", 0).expect("reported");
    let report = outcome.report().expect("failure");
    assert!(report.message.contains("missing separator"));
    assert_eq!(report.trace_text, "demo");
}

#[test]
fn test_trace_lists_traced_calls_innermost_first() {
    let source = MemorySource::new().with_text(
        "util",
        "\ncheck=function (n) { if (n > 2) throw new Error('too big: ' + n); return n }\nwalk=function (n) { return check(n + 1) }",
    );
    let (mut loader, _sink) = loader(source);
    let outcome = loader
        .load(
            &pack("util\nstart=function (n) { return walk(n + 1) }\nresult=start(1)"),
            "app",
            0,
        )
        .expect("reported");

    let report = outcome.report().expect("failure");
    assert_eq!(report.message, "too big: 3");
    assert_eq!(report.trace_text, "util: check\nutil: walk\napp: start");
    assert_eq!(report.fault.as_deref(), Some("result"));
    assert_eq!(report.trace.len(), 3);
    assert!(loader.interpreter().trace().is_empty());
}

#[test]
fn test_failing_init_is_attributed_to_init() {
    let (mut loader, _sink) = loader(MemorySource::new());
    let outcome = loader
        .load(&pack("\ninit=function () { missing() }"), "demo", 0)
        .expect("reported");
    let report = outcome.report().expect("failure");
    assert_eq!(report.fault.as_deref(), Some("init"));
    assert_eq!(report.trace_text, "demo: init");
}

#[test]
fn test_cycles_are_detected() {
    let source = MemorySource::new()
        .with_text("a", "b\nx=1")
        .with_text("b", "a\ny=2");
    let (mut loader, sink) = loader(source);

    let outcome = loader.require("a").expect("reported");
    let report = outcome.report().expect("failure");
    assert_eq!(report.message, "Circular dependency detected: a -> b -> a");
    assert_eq!(sink.reports().len(), 1);
    assert!(loader.module("a").is_none());
    assert!(loader.module("b").is_none());
}

#[test]
fn test_cycles_hit_the_depth_limit_when_detection_is_off() {
    let source = MemorySource::new()
        .with_text("a", "b\nx=1")
        .with_text("b", "a\ny=2");
    let config = LoaderConfig {
        detect_cycles: false,
        max_load_depth: 5,
        ..LoaderConfig::default()
    };
    let sink = CollectingSink::default();
    let mut loader = ModuleLoader::new(config)
        .with_source(source)
        .with_sink(sink.clone());

    let outcome = loader.require("a").expect("reported");
    let report = outcome.report().expect("failure");
    assert_eq!(report.message, "Module load depth exceeded (5 nested loads)");
    assert_eq!(sink.reports().len(), 1);
}

#[test]
fn test_failing_sink_escalates() {
    let mut loader = ModuleLoader::new(LoaderConfig::default()).with_sink(FailingSink);
    let err = loader
        .load(&pack("\nx=missing()"), "demo", 0)
        .expect_err("sink failure is fatal");
    match err {
        LoaderError::Unreported { message, trace } => {
            assert!(message.contains("missing"));
            assert_eq!(trace, "demo: x");
        }
        other => panic!("Expected Unreported, got {}", other),
    }
}

#[test]
fn test_rejected_name_is_the_fault() {
    let (mut loader, _sink) = loader(MemorySource::new());
    let outcome = loader
        .load(&pack("\n1a=2\nb=(\nc=3"), "demo", 0)
        .expect("reported");

    let report = outcome.report().expect("failure");
    assert!(report.message.contains("Invalid declaration name '1a'"));
    assert_eq!(report.fault.as_deref(), Some("1a"));
    assert_eq!(report.trace_text, "demo: 1a");
}

#[test]
fn test_runaway_recursion_on_small_stack() {
    // spawned threads get the default 2 MiB stack
    let (message, fault, trace_text) = std::thread::spawn(|| {
        let (mut loader, _sink) = loader(MemorySource::new());
        let outcome = loader
            .load(
                &pack("\nf=function (n) { return f(n + 1) }\nr=f(0)"),
                "demo",
                0,
            )
            .expect("reported");
        let report = outcome.report().expect("failure");
        (report.message.clone(), report.fault.clone(), report.trace_text.clone())
    })
    .join()
    .expect("no stack overflow");

    assert_eq!(message, "RangeError: Maximum call stack size exceeded");
    assert_eq!(fault.as_deref(), Some("r"));
    assert!(trace_text.starts_with("demo: f\n"));
}
