// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loaded-module handles and load notifications.

use cwf_script::Value;
use cwf_script::runtime::ObjectRef;
use std::rc::Rc;
use tracing::debug;

/// A loaded module instance.
#[derive(Debug, Clone)]
pub struct ModuleHandle {
    name: String,
    object: ObjectRef,
}

impl ModuleHandle {
    /// Wrap a module instance.
    pub fn new(name: impl Into<String>, object: ObjectRef) -> Self {
        Self {
            name: name.into(),
            object,
        }
    }

    /// Normalized module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module object.
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// The module object as a script value.
    pub fn value(&self) -> Value {
        Value::Object(Rc::clone(&self.object))
    }

    /// An own property of the module.
    pub fn property(&self, key: &str) -> Option<Value> {
        self.object.borrow().get(key).cloned()
    }

    /// Whether both handles refer to the same instance.
    pub fn same_instance(&self, other: &ModuleHandle) -> bool {
        Rc::ptr_eq(&self.object, &other.object)
    }
}

/// Receives one notification per successfully initialized module.
pub trait LoadRegistry {
    /// Called after the module's declarations and `init` have run.
    fn loaded(&self, module: &ModuleHandle);
}

impl<R: LoadRegistry + ?Sized> LoadRegistry for Box<R> {
    fn loaded(&self, module: &ModuleHandle) {
        (**self).loaded(module)
    }
}

/// Registry that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingRegistry;

impl LoadRegistry for LoggingRegistry {
    fn loaded(&self, module: &ModuleHandle) {
        debug!(module = module.name(), "module ready");
    }
}
