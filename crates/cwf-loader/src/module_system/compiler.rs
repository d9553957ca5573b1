// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module text compiler.
//!
//! Module text is line oriented:
//!
//! ```text
//! core, util
//! greeting='hello'
//! greet=function (name) { return greeting + ' ' + name }
//! _cache={}
//! helpers.format=function (s) { return '[' + s + ']' }
//! ```
//!
//! The first line lists the modules this one depends on. Every other
//! non-blank line declares one property as `name=expression`, split on
//! the first `=`.

use cwf_script::Parser;
use cwf_script::ast::Expression;
use cwf_script::error::{Error, Result};
use std::fmt::Write;

/// One `name=expression` line.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Declared property path (`a` or `a.b.c`)
    pub name: String,
    /// Right-hand side as written
    pub source: String,
    /// Parsed right-hand side
    pub expression: Expression,
    /// 1-based line number in the module text
    pub line: usize,
}

impl Declaration {
    /// Segments of the declared path.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.name.split('.')
    }
}

/// A module compiled from its text.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledModule {
    /// Normalized module name
    pub name: String,
    /// Dependencies, in declaration order
    pub includes: Vec<String>,
    /// Declarations, in declaration order
    pub declarations: Vec<Declaration>,
}

impl CompiledModule {
    /// Renders the program the loader runs for this module.
    pub fn synthesized(&self, private_prefix: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "// {}", self.name);
        if !self.includes.is_empty() {
            let _ = writeln!(out, "// requires {}", self.includes.join(", "));
        }
        out.push_str("function (module, privates) {\n");
        for decl in &self.declarations {
            let target = if !private_prefix.is_empty() && decl.name.starts_with(private_prefix) {
                "privates"
            } else {
                "module"
            };
            let _ = writeln!(out, "    module.fault = '{}';", decl.name);
            let _ = writeln!(out, "    {}.{} = {};", target, decl.name, decl.source);
        }
        out.push_str("    if (typeof module.init == 'function') module.init();\n");
        out.push_str("    delete module.fault;\n");
        out.push('}');
        out
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn is_declaration_name(name: &str) -> bool {
    name.split('.').all(is_identifier)
}

/// Parses a declaration right-hand side.
pub fn parse_expression(source: &str) -> Result<Expression> {
    Parser::new(source).parse_standalone_expression()
}

/// Compiles module text.
///
/// Fails with a syntax error on the first malformed line.
pub fn compile(name: &str, text: &str) -> Result<CompiledModule> {
    let mut lines = text.lines().enumerate();
    let includes = match lines.next() {
        Some((_, header)) => header
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        None => Vec::new(),
    };

    let mut declarations = Vec::new();
    for (index, line) in lines {
        if let Some(declaration) = compile_line(index + 1, line)? {
            declarations.push(declaration);
        }
    }

    Ok(CompiledModule {
        name: name.to_string(),
        includes,
        declarations,
    })
}

/// Compiles one body line; `None` for a blank line.
fn compile_line(line_number: usize, line: &str) -> Result<Option<Declaration>> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    let Some((lhs, rhs)) = line.split_once('=') else {
        return Err(Error::syntax(
            format!("Expected 'name=expression' on line {}", line_number),
            0,
        ));
    };
    let decl_name = lhs.trim();
    if !is_declaration_name(decl_name) {
        return Err(Error::syntax(
            format!("Invalid declaration name '{}' on line {}", decl_name, line_number),
            0,
        ));
    }
    let expression = parse_expression(rhs)?;
    Ok(Some(Declaration {
        name: decl_name.to_string(),
        source: rhs.trim().to_string(),
        expression,
        line: line_number,
    }))
}

/// Names the first body line that fails to compile on its own: the
/// declaration name, or the whole line when it has no `=`.
pub fn localize_syntax_error(text: &str) -> Option<String> {
    text.lines()
        .enumerate()
        .skip(1)
        .find(|(index, line)| compile_line(index + 1, line).is_err())
        .map(|(_, line)| {
            let lhs = line.split_once('=').map_or(line, |(lhs, _)| lhs);
            lhs.trim().to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_header_and_declarations() {
        let module = compile("app/main", "core, util\na=1\n\nb.c='x=y'\n").expect("compiles");
        assert_eq!(module.includes, vec!["core", "util"]);
        assert_eq!(module.declarations.len(), 2);
        assert_eq!(module.declarations[0].name, "a");
        assert_eq!(module.declarations[1].name, "b.c");
        assert_eq!(module.declarations[1].source, "'x=y'");
        assert_eq!(module.declarations[1].line, 4);
        assert_eq!(module.declarations[1].segments().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn test_compile_empty_header() {
        let module = compile("solo", "\na=function () { return 1 }").expect("compiles");
        assert!(module.includes.is_empty());
        assert_eq!(module.declarations.len(), 1);
        assert!(compile("empty", "").expect("compiles").declarations.is_empty());
    }

    #[test]
    fn test_compile_rejects_malformed_lines() {
        assert!(compile("m", "\njust words").is_err_and(|e| e.is_syntax()));
        assert!(compile("m", "\n1a=2").is_err_and(|e| e.is_syntax()));
        assert!(compile("m", "\na=(1").is_err_and(|e| e.is_syntax()));
    }

    #[test]
    fn test_localize_syntax_error() {
        assert_eq!(localize_syntax_error("\na=1\nb=(\nc=)").as_deref(), Some("b"));
        assert_eq!(localize_syntax_error("\na=1\nc=3"), None);
    }

    #[test]
    fn test_localize_agrees_with_compile() {
        assert_eq!(localize_syntax_error("\n1a=2\nb=(\nc=3").as_deref(), Some("1a"));
        assert_eq!(localize_syntax_error("\nstray words\nb=(").as_deref(), Some("stray words"));
        assert_eq!(localize_syntax_error("\n\n  \nb=("), Some("b".to_string()));
    }

    #[test]
    fn test_synthesized_routes_private_names() {
        let module = compile("app", "core\nx=1\n_y=2").expect("compiles");
        let text = module.synthesized("_");
        assert!(text.contains("// requires core"));
        assert!(text.contains("module.x = 1;"));
        assert!(text.contains("privates._y = 2;"));
        assert!(text.contains("module.fault = '_y';"));
    }
}
