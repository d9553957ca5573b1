// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # cwf-script
//!
//! The language module declarations are written in.
//!
//! ## Overview
//!
//! This crate provides everything the module loader needs to execute
//! declaration right-hand sides:
//! - Scanner and recursive descent parser for a JavaScript-flavoured subset
//! - Tree-walking interpreter with lexical and object scopes
//! - The class tree: subclassing, property propagation, instance memoization
//! - The failure trace recorded by traced function calls
//!
//! ## Quick Start
//!
//! ```rust
//! use cwf_script::{Interpreter, Value};
//!
//! let mut interp = Interpreter::new();
//! let result = interp.run("var Point = Class.subClass({ x: 1 }); new Point().x + 1").unwrap();
//! assert_eq!(result, Value::Number(2.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod builtins;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod vm;

pub use error::{Error, Result};
pub use parser::Parser;
pub use runtime::class::{ClassId, ClassTree};
pub use runtime::function::{CallSite, Callable};
pub use runtime::trace::{TraceEntry, TraceRecorder};
pub use runtime::value::Value;
pub use vm::Interpreter;
