// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Compile cache.

use super::compiler::CompiledModule;
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// Compiled modules and their load timestamps, keyed by normalized name.
///
/// Entries live as long as the loader context. Only successful compiles
/// are stored.
#[derive(Debug, Default)]
pub struct CompileCache {
    modules: FxHashMap<String, Rc<CompiledModule>>,
    timestamps: FxHashMap<String, u64>,
}

impl CompileCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The compiled module stored under `name`.
    pub fn get(&self, name: &str) -> Option<Rc<CompiledModule>> {
        self.modules.get(name).cloned()
    }

    /// Store a compiled module and the timestamp it was loaded with.
    pub fn insert(&mut self, module: CompiledModule, timestamp: u64) -> Rc<CompiledModule> {
        let name = module.name.clone();
        let module = Rc::new(module);
        self.modules.insert(name.clone(), Rc::clone(&module));
        self.timestamps.insert(name, timestamp);
        module
    }

    /// Load timestamp recorded for `name`.
    pub fn timestamp(&self, name: &str) -> Option<u64> {
        self.timestamps.get(name).copied()
    }

    /// Whether `name` has been compiled.
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Number of compiled modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether nothing has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Names of all compiled modules, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
