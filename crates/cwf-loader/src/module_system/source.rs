// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Where packed module payloads come from.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::debug;

use crate::error::{LoaderError, Result};
use crate::packed::pack;

/// File extension of packed modules in a directory source.
pub const MODULE_EXTENSION: &str = "cwf";

/// A packed module as delivered by a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedModule {
    /// Module name
    pub name: String,
    /// Load timestamp (informational)
    #[serde(default)]
    pub timestamp: u64,
    /// Packed payload
    pub payload: String,
}

/// Supplies packed payloads for dependency resolution.
pub trait ModuleSource {
    /// Fetch the payload for `name`, or `None` if this source lacks it.
    fn fetch(&self, name: &str) -> Result<Option<PackedModule>>;
}

/// Payloads held in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    modules: FxHashMap<String, PackedModule>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a packed module.
    pub fn insert(&mut self, module: PackedModule) {
        self.modules.insert(module.name.clone(), module);
    }

    /// Add a module from plain text, packing it.
    pub fn with_text(mut self, name: &str, text: &str) -> Self {
        self.insert(PackedModule {
            name: name.to_string(),
            timestamp: 0,
            payload: pack(text),
        });
        self
    }
}

impl ModuleSource for MemorySource {
    fn fetch(&self, name: &str) -> Result<Option<PackedModule>> {
        Ok(self.modules.get(name).cloned())
    }
}

/// JSON bundle: `{ "entry": "app/main", "modules": [ { "name", "timestamp", "payload" } ] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bundle {
    /// Module to start with
    #[serde(default)]
    pub entry: Option<String>,
    /// Packed modules
    #[serde(default)]
    pub modules: Vec<PackedModule>,
}

/// Payloads read from a JSON bundle.
#[derive(Debug, Clone)]
pub struct BundleSource {
    entry: Option<String>,
    modules: MemorySource,
}

impl BundleSource {
    /// Parse bundle JSON.
    pub fn parse(json: &str) -> Result<Self> {
        let bundle: Bundle = serde_json::from_str(json)?;
        Ok(Self::from(bundle))
    }

    /// Read a bundle file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// The entry module named by the bundle.
    pub fn entry(&self) -> Option<&str> {
        self.entry.as_deref()
    }
}

impl From<Bundle> for BundleSource {
    fn from(bundle: Bundle) -> Self {
        let mut modules = MemorySource::new();
        for module in bundle.modules {
            modules.insert(module);
        }
        Self {
            entry: bundle.entry,
            modules,
        }
    }
}

impl ModuleSource for BundleSource {
    fn fetch(&self, name: &str) -> Result<Option<PackedModule>> {
        self.modules.fetch(name)
    }
}

/// Payloads read from `<root>/<name>.cwf`.
///
/// Slashes in module names map to subdirectories; the timestamp is the
/// file's modification time in seconds.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path a module is read from. Names must stay below the root: no
    /// `..`, no absolute paths.
    pub fn module_path(&self, name: &str) -> Result<PathBuf> {
        let inside_root = !name.is_empty()
            && Path::new(name)
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !inside_root {
            return Err(LoaderError::InvalidModuleName(name.to_string()));
        }
        Ok(self.root.join(format!("{}.{}", name, MODULE_EXTENSION)))
    }
}

impl ModuleSource for DirectorySource {
    fn fetch(&self, name: &str) -> Result<Option<PackedModule>> {
        let path = self.module_path(name)?;
        if !path.is_file() {
            debug!(path = %path.display(), "module file not found");
            return Ok(None);
        }
        let payload = std::fs::read_to_string(&path)?;
        let timestamp = std::fs::metadata(&path)?
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|age| age.as_secs())
            .unwrap_or(0);
        Ok(Some(PackedModule {
            name: name.to_string(),
            timestamp,
            payload: payload.trim_end_matches(['\r', '\n']).to_string(),
        }))
    }
}
