// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # cwf-loader
//!
//! A self-hosting module loader built on `cwf-script`.
//!
//! ## Overview
//!
//! - [`packed`] - the dictionary/back-reference payload format and its packer
//! - [`module_system`] - module compiler, compile cache, sources, loader
//! - [`reporter`] - error reports with a reconstructed call trace
//! - [`config`] - `cwf.toml` and `CWF_*` configuration
//! - [`bootstrap`] - loader construction and the entry module
//!
//! ## Quick Start
//!
//! ```rust
//! use cwf_loader::{LoaderConfig, MemorySource, ModuleLoader, pack};
//! use cwf_script::Value;
//!
//! let source = MemorySource::new().with_text("core", "\nanswer=42");
//! let mut loader = ModuleLoader::new(LoaderConfig::default()).with_source(source);
//!
//! let outcome = loader.load(&pack("core\ndouble=answer * 2"), "app", 0).unwrap();
//! let app = outcome.handle().unwrap();
//! assert_eq!(app.property("double"), Some(Value::Number(84.0)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod module_system;
pub mod packed;
pub mod reporter;

pub use bootstrap::Bootstrap;
pub use config::LoaderConfig;
pub use error::{LoaderError, Result};
pub use module_system::{
    BundleSource, CompiledModule, DirectorySource, LoadRegistry, MemorySource, ModuleHandle,
    ModuleLoader, ModuleSource, Outcome, PackedModule,
};
pub use packed::{decode, pack};
pub use reporter::{ErrorReporter, ErrorSink, Report, ReportContext, SinkError};
