//! The tree-walking virtual machine.
//!
//! ## Structure
//!
//! - `interpreter` - statement and expression evaluation, calls, classes
//! - `operators` - equality, arithmetic and relational operators
//! - `string_methods` - string method implementations

mod interpreter;

pub mod operators;
pub mod string_methods;

pub use interpreter::{DEFAULT_MAX_CALL_DEPTH, DEFAULT_MAX_STACK_BYTES, Interpreter};
