//! Shared helpers for loader integration tests.

#![allow(dead_code)]

use cwf_loader::{ErrorSink, LoadRegistry, ModuleHandle, SinkError};
use cwf_script::TraceEntry;
use std::cell::RefCell;
use std::rc::Rc;

/// A delivered report: message and trace text.
pub type Delivered = (String, String);

/// Sink that keeps every report it receives.
#[derive(Default, Clone)]
pub struct CollectingSink(pub Rc<RefCell<Vec<Delivered>>>);

impl CollectingSink {
    pub fn reports(&self) -> Vec<Delivered> {
        self.0.borrow().clone()
    }
}

impl ErrorSink for CollectingSink {
    fn report(&self, message: &str, trace_text: &str, _trace: &[TraceEntry]) -> Result<(), SinkError> {
        self.0
            .borrow_mut()
            .push((message.to_string(), trace_text.to_string()));
        Ok(())
    }
}

/// Sink that always fails.
pub struct FailingSink;

impl ErrorSink for FailingSink {
    fn report(&self, _message: &str, _trace_text: &str, _trace: &[TraceEntry]) -> Result<(), SinkError> {
        Err(SinkError("no display attached".into()))
    }
}

/// Registry that records module names in notification order.
#[derive(Default, Clone)]
pub struct RecordingRegistry(pub Rc<RefCell<Vec<String>>>);

impl RecordingRegistry {
    pub fn names(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

impl LoadRegistry for RecordingRegistry {
    fn loaded(&self, module: &ModuleHandle) {
        self.0.borrow_mut().push(module.name().to_string());
    }
}
