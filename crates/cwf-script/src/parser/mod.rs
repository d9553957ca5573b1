//! Parser for module script source code.
//!
//! Transforms a stream of tokens into an Abstract Syntax Tree (AST).
//!
//! ## Usage
//!
//! ```rust
//! use cwf_script::parser::Parser;
//!
//! let mut parser = Parser::new("var x = 1 + 2");
//! let program = parser.parse_program().expect("Should parse");
//! assert_eq!(program.body.len(), 1);
//! ```

mod parser;

pub use parser::Parser;
