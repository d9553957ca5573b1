// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Startup: build a loader from configuration and load the entry module.

use tracing::info;

use crate::config::LoaderConfig;
use crate::error::{LoaderError, Result};
use crate::module_system::{BundleSource, DirectorySource, LoadRegistry, ModuleLoader, Outcome};
use crate::reporter::ErrorSink;

/// Builds the loader context and loads the entry module.
pub struct Bootstrap {
    config: LoaderConfig,
    sink: Option<Box<dyn ErrorSink>>,
    registry: Option<Box<dyn LoadRegistry>>,
}

/// Whether the configured root names a JSON bundle.
fn is_bundle(config: &LoaderConfig) -> bool {
    config
        .root
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

impl Bootstrap {
    /// Start from `config`.
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            sink: None,
            registry: None,
        }
    }

    /// Deliver error reports to `sink`.
    pub fn with_sink(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Notify `registry` of each initialized module.
    pub fn with_registry(mut self, registry: impl LoadRegistry + 'static) -> Self {
        self.registry = Some(Box::new(registry));
        self
    }

    /// Build the loader without loading anything.
    ///
    /// Returns the loader and the entry module name, if one is known.
    pub fn build(self) -> Result<(ModuleLoader, Option<String>)> {
        let mut config = self.config;
        let loader = if is_bundle(&config) {
            let bundle = BundleSource::from_path(&config.root)?;
            if config.entry.is_none() {
                config.entry = bundle.entry().map(String::from);
            }
            ModuleLoader::new(config.clone()).with_source(bundle)
        } else {
            let source = DirectorySource::new(config.root.clone());
            ModuleLoader::new(config.clone()).with_source(source)
        };

        let loader = match self.sink {
            Some(sink) => loader.with_sink(sink),
            None => loader,
        };
        let loader = match self.registry {
            Some(registry) => loader.with_registry(registry),
            None => loader,
        };
        Ok((loader, config.entry))
    }

    /// Build the loader and load the entry module.
    pub fn start(self) -> Result<(ModuleLoader, Outcome)> {
        let (mut loader, entry) = self.build()?;
        let entry = entry.ok_or_else(|| LoaderError::Config("no entry module configured".into()))?;
        info!(entry = %entry, root = %loader.config().root.display(), "starting");
        let outcome = loader.require(&entry)?;
        Ok((loader, outcome))
    }
}
