// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the module loader

use crate::packed::DecodeError;
use thiserror::Error;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Errors that can occur while loading modules
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Malformed packed payload
    #[error("{0}")]
    Decode(#[from] DecodeError),

    /// Compile or evaluation failure inside module script
    #[error("{0}")]
    Script(String),

    /// No source provides the module
    #[error("Cannot find module '{0}'")]
    ModuleNotFound(String),

    /// Module name that cannot be mapped to a file under the source root
    #[error("Invalid module name '{0}'")]
    InvalidModuleName(String),

    /// Circular dependency detected
    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    /// Dependency recursion went deeper than allowed
    #[error("Module load depth exceeded ({0} nested loads)")]
    LoadDepthExceeded(usize),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// cwf.toml parse error
    #[error("Configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Bundle (JSON) parse error
    #[error("Bundle parse error: {0}")]
    Bundle(#[from] serde_json::Error),

    /// File system error
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    /// The error sink itself failed; the report is carried here instead
    #[error("{message}\n\n{trace}")]
    Unreported {
        /// The error message
        message: String,
        /// The rendered trace
        trace: String,
    },
}

impl From<cwf_script::Error> for LoaderError {
    fn from(err: cwf_script::Error) -> Self {
        Self::Script(err.message())
    }
}

impl LoaderError {
    /// Create a module not found error
    pub fn module_not_found(module: impl Into<String>) -> Self {
        Self::ModuleNotFound(module.into())
    }
}
