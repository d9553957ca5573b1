// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Centralized error reporting.
//!
//! Failures are rendered into a message and a trace text and handed to an
//! [`ErrorSink`]. The trace lists the traced calls that were unwinding when
//! the error surfaced, innermost first, one `module: path` line each.

use cwf_script::{TraceEntry, TraceRecorder};
use thiserror::Error;
use tracing::error;

use crate::error::{LoaderError, Result};

/// Label used when nothing is known about where a failure happened.
pub const ANONYMOUS: &str = "[anonymous]";

/// A sink failed to deliver a report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Error sink failed: {0}")]
pub struct SinkError(pub String);

/// Destination for error reports.
pub trait ErrorSink {
    /// Deliver one report.
    fn report(&self, message: &str, trace_text: &str, trace: &[TraceEntry]) -> std::result::Result<(), SinkError>;
}

impl<S: ErrorSink + ?Sized> ErrorSink for Box<S> {
    fn report(&self, message: &str, trace_text: &str, trace: &[TraceEntry]) -> std::result::Result<(), SinkError> {
        (**self).report(message, trace_text, trace)
    }
}

/// Sink that writes reports to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, message: &str, trace_text: &str, trace: &[TraceEntry]) -> std::result::Result<(), SinkError> {
        error!(depth = trace.len(), trace = trace_text, "{}", message);
        Ok(())
    }
}

/// What the reporter knows about the failing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportContext {
    /// A module load, with the declaration in progress if any
    Module {
        /// Module path
        path: String,
        /// Declaration being written when the failure happened
        fault: Option<String>,
    },
    /// A free-form description of the operation
    Message(String),
    /// Nothing known
    Anonymous,
}

impl ReportContext {
    /// Context for a failure inside `path`.
    pub fn module(path: impl Into<String>, fault: Option<String>) -> Self {
        Self::Module {
            path: path.into(),
            fault,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Module { path, fault: Some(fault) } => format!("{}: {}", path, fault),
            Self::Module { path, fault: None } => path.clone(),
            Self::Message(message) => message.clone(),
            Self::Anonymous => ANONYMOUS.to_string(),
        }
    }
}

/// A delivered error report.
#[derive(Debug, Clone)]
pub struct Report {
    /// The error message
    pub message: String,
    /// One line per trace entry, or the context description
    pub trace_text: String,
    /// The raw trace, innermost first
    pub trace: Vec<TraceEntry>,
    /// Module the failure was attributed to
    pub module: Option<String>,
    /// Declaration the failure was attributed to
    pub fault: Option<String>,
}

/// Renders failures and forwards them to a sink.
pub struct ErrorReporter {
    sink: Box<dyn ErrorSink>,
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new(Box::new(TracingSink))
    }
}

impl std::fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorReporter").finish_non_exhaustive()
    }
}

impl ErrorReporter {
    /// Create a reporter writing to `sink`.
    pub fn new(sink: Box<dyn ErrorSink>) -> Self {
        Self { sink }
    }

    /// Replace the sink.
    pub fn set_sink(&mut self, sink: Box<dyn ErrorSink>) {
        self.sink = sink;
    }

    /// Report `err`, consuming the recorded trace.
    ///
    /// The trace is cleared whether or not the sink succeeds. A failing
    /// sink turns the report into [`LoaderError::Unreported`].
    pub fn report(&self, err: &LoaderError, context: &ReportContext, recorder: &mut TraceRecorder) -> Result<Report> {
        let trace = recorder.take();
        let trace_text = if trace.is_empty() {
            context.describe()
        } else {
            render_trace(&trace)
        };
        let message = err.to_string();

        let (module, fault) = match context {
            ReportContext::Module { path, fault } => (Some(path.clone()), fault.clone()),
            _ => (None, None),
        };

        if let Err(sink_err) = self.sink.report(&message, &trace_text, &trace) {
            error!(error = %sink_err, "error sink failed");
            return Err(LoaderError::Unreported { message, trace: trace_text });
        }

        Ok(Report {
            message,
            trace_text,
            trace,
            module,
            fault,
        })
    }
}

/// One `module: path` line per entry, in recorded order.
pub fn render_trace(trace: &[TraceEntry]) -> String {
    trace
        .iter()
        .map(|entry| entry.site.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cwf_script::{CallSite, Value};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default, Clone)]
    struct Collect(Rc<RefCell<Vec<(String, String)>>>);

    impl ErrorSink for Collect {
        fn report(&self, message: &str, trace_text: &str, _trace: &[TraceEntry]) -> std::result::Result<(), SinkError> {
            self.0.borrow_mut().push((message.to_string(), trace_text.to_string()));
            Ok(())
        }
    }

    struct Broken;

    impl ErrorSink for Broken {
        fn report(&self, _: &str, _: &str, _: &[TraceEntry]) -> std::result::Result<(), SinkError> {
            Err(SinkError("display detached".into()))
        }
    }

    fn entry(module: &str, path: &str) -> TraceEntry {
        TraceEntry {
            context: Value::Undefined,
            args: Vec::new(),
            site: CallSite::new(Some(module.to_string()), path),
        }
    }

    #[test]
    fn test_trace_lines_in_recorded_order() {
        let sink = Collect::default();
        let reporter = ErrorReporter::new(Box::new(sink.clone()));
        let mut recorder = TraceRecorder::new();
        recorder.push(entry("app/core", "inner"));
        recorder.push(entry("app/main", "outer"));

        let err = LoaderError::Script("boom".into());
        let report = reporter
            .report(&err, &ReportContext::Anonymous, &mut recorder)
            .expect("reported");
        assert_eq!(report.trace_text, "app/core: inner\napp/main: outer");
        assert_eq!(report.trace.len(), 2);
        assert!(recorder.is_empty());
        assert_eq!(sink.0.borrow()[0].0, "boom");
    }

    #[test]
    fn test_empty_trace_describes_context() {
        let reporter = ErrorReporter::new(Box::new(Collect::default()));
        let err = LoaderError::Script("boom".into());
        let mut recorder = TraceRecorder::new();
        let describe = |context: ReportContext, recorder: &mut TraceRecorder| {
            reporter.report(&err, &context, recorder).expect("reported").trace_text
        };
        assert_eq!(describe(ReportContext::module("app", Some("b".into())), &mut recorder), "app: b");
        assert_eq!(describe(ReportContext::module("app", None), &mut recorder), "app");
        assert_eq!(describe(ReportContext::Message("startup".into()), &mut recorder), "startup");
        assert_eq!(describe(ReportContext::Anonymous, &mut recorder), ANONYMOUS);
    }

    #[test]
    fn test_failing_sink_escalates() {
        let reporter = ErrorReporter::new(Box::new(Broken));
        let mut recorder = TraceRecorder::new();
        recorder.push(entry("app", "f"));
        let err = LoaderError::Script("boom".into());
        let result = reporter.report(&err, &ReportContext::Anonymous, &mut recorder);
        match result {
            Err(LoaderError::Unreported { message, trace }) => {
                assert_eq!(message, "boom");
                assert_eq!(trace, "app: f");
            }
            other => panic!("Expected Unreported, got {:?}", other),
        }
        assert!(recorder.is_empty());
    }
}
