//! Lexical analysis (tokenization) for module script.
//!
//! The lexer transforms the right-hand side of a module declaration into a
//! stream of tokens that can be consumed by the parser.
//!
//! ## Usage
//!
//! ```rust
//! use cwf_script::lexer::{Scanner, TokenKind};
//!
//! let mut scanner = Scanner::new("function(a) { return a + 1; }");
//!
//! loop {
//!     let token = scanner.next_token();
//!     if matches!(token.kind, TokenKind::Eof) {
//!         break;
//!     }
//!     println!("{:?}", token.kind);
//! }
//! ```

mod scanner;
mod token;

pub use scanner::Scanner;
pub use token::{Span, Token, TokenKind};
