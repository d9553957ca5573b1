// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module compilation and loading.
//!
//! - `compiler` - module text to [`CompiledModule`]
//! - `cache` - compiled modules and timestamps by name
//! - `source` - where packed payloads come from
//! - `registry` - module handles and load notifications
//! - `loader` - dependency resolution and execution

pub mod cache;
pub mod compiler;
pub mod loader;
pub mod registry;
pub mod source;

pub use cache::CompileCache;
pub use compiler::{CompiledModule, Declaration, compile};
pub use loader::{LoaderContext, ModuleLoader, Outcome};
pub use registry::{LoadRegistry, LoggingRegistry, ModuleHandle};
pub use source::{Bundle, BundleSource, DirectorySource, MemorySource, ModuleSource, PackedModule};
