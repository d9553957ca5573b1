// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loader configuration.
//!
//! Values come from `cwf.toml` in the project directory, then from `CWF_*`
//! environment variables (`CWF_MAX_LOAD_DEPTH=8` sets `max-load-depth`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::Result;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "cwf.toml";

/// Prefix of configuration environment variables.
const ENV_PREFIX: &str = "CWF_";

/// Configuration for a loader context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LoaderConfig {
    /// Module source: a directory of `.cwf` files or a `.json` bundle
    pub root: PathBuf,

    /// Module to load at startup
    pub entry: Option<String>,

    /// Report dependency cycles instead of recursing into them
    pub detect_cycles: bool,

    /// Nesting limit for dependency loads when cycle detection is off
    pub max_load_depth: usize,

    /// Declaration prefix selecting the private bag
    pub private_prefix: String,

    /// Separator in module names that stands for `/`
    pub namespace_separator: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            entry: None,
            detect_cycles: true,
            max_load_depth: 64,
            private_prefix: "_".to_string(),
            namespace_separator: "_".to_string(),
        }
    }
}

impl LoaderConfig {
    /// Load configuration for the project in `dir`.
    ///
    /// A missing `cwf.toml` leaves the defaults in place. A relative `root`
    /// is resolved against `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.load_from_env();
        if config.root.is_relative() {
            config.root = dir.join(&config.root);
        }
        Ok(config)
    }

    /// Parse a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration text in TOML format.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `CWF_*` variables from the process environment.
    pub fn load_from_env(&mut self) {
        self.merge_env(std::env::vars());
    }

    /// Apply `CWF_*` variables from `vars`.
    pub fn merge_env<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            if let Some(config_key) = key.as_ref().strip_prefix(ENV_PREFIX) {
                let config_key = config_key.to_lowercase().replace('_', "-");
                self.set(&config_key, value.as_ref());
            }
        }
    }

    /// Set a configuration value by key.
    pub fn set(&mut self, key: &str, value: &str) {
        match key {
            "root" => self.root = PathBuf::from(value),
            "entry" => self.entry = (!value.is_empty()).then(|| value.to_string()),
            "detect-cycles" => match value.parse() {
                Ok(flag) => self.detect_cycles = flag,
                Err(_) => warn!(key, value, "ignoring non-boolean configuration value"),
            },
            "max-load-depth" => match value.parse() {
                Ok(depth) => self.max_load_depth = depth,
                Err(_) => warn!(key, value, "ignoring non-numeric configuration value"),
            },
            "private-prefix" => self.private_prefix = value.to_string(),
            "namespace-separator" => self.namespace_separator = value.to_string(),
            _ => warn!(key, "unknown configuration key"),
        }
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "root" => Some(self.root.display().to_string()),
            "entry" => self.entry.clone(),
            "detect-cycles" => Some(self.detect_cycles.to_string()),
            "max-load-depth" => Some(self.max_load_depth.to_string()),
            "private-prefix" => Some(self.private_prefix.clone()),
            "namespace-separator" => Some(self.namespace_separator.clone()),
            _ => None,
        }
    }

    /// Rewrite a module name to its canonical slash-separated path.
    pub fn normalize_name(&self, name: &str) -> String {
        if self.namespace_separator.is_empty() {
            name.to_string()
        } else {
            name.replace(self.namespace_separator.as_str(), "/")
        }
    }

    /// Whether a declaration name belongs in the private bag.
    pub fn is_private(&self, name: &str) -> bool {
        !self.private_prefix.is_empty() && name.starts_with(self.private_prefix.as_str())
    }
}
