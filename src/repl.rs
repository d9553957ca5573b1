// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Interactive REPL for module script.
//!
//! Input runs in the loader's global scope, so `cwf`, `Module`, `Class`
//! and every module loaded with `.load` are reachable.

use cwf_loader::ModuleLoader;
use cwf_script::Value;
use cwf_script::lexer::{Scanner, Span, TokenKind};
use owo_colors::OwoColorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Config, Editor, Helper};
use std::borrow::Cow;
use std::path::PathBuf;

const HISTORY_FILE: &str = ".cwf_history";
const MAX_HISTORY_SIZE: usize = 1000;

const KEYWORDS: &[&str] = &[
    "break", "catch", "const", "continue", "else", "finally", "for", "function", "if",
    "instanceof", "let", "new", "return", "this", "throw", "try", "typeof", "var", "void",
    "while",
];

/// Words that read as values; `true`, `false` and `null` are tokens, the
/// rest are ordinary identifiers.
const LITERALS: &[&str] = &["true", "false", "null", "undefined", "NaN", "Infinity"];

/// Globals installed in every loader context.
const BUILTINS: &[&str] = &["Class", "Error", "Module", "cwf", "rpc"];

/// REPL commands that can be executed with a dot prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Exit,
    Clear,
    Version,
    Load,
    Modules,
    Inspect,
}

impl ReplCommand {
    /// Parse a REPL command from input string
    pub fn parse(input: &str) -> Option<(Self, Option<&str>)> {
        let input = input.trim();
        let rest = input.strip_prefix('.')?;

        let mut parts = rest.splitn(2, char::is_whitespace);
        let cmd = parts.next()?.to_lowercase();
        let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

        match cmd.as_str() {
            "help" | "h" | "?" => Some((ReplCommand::Help, arg)),
            "exit" | "quit" | "q" => Some((ReplCommand::Exit, arg)),
            "clear" | "cls" => Some((ReplCommand::Clear, arg)),
            "version" | "v" => Some((ReplCommand::Version, arg)),
            "load" | "l" => Some((ReplCommand::Load, arg)),
            "modules" | "m" => Some((ReplCommand::Modules, arg)),
            "inspect" | "i" => Some((ReplCommand::Inspect, arg)),
            _ => None,
        }
    }

    /// Get all available commands for help/completion
    pub fn all_commands() -> &'static [(&'static str, &'static str)] {
        &[
            (".help", "Show this help message"),
            (".exit", "Exit the REPL"),
            (".clear", "Clear the screen"),
            (".version", "Show version information"),
            (".load <module>", "Load a module from the configured source"),
            (".modules", "List loaded modules"),
            (".inspect <module>", "Show the program synthesized for a module"),
        ]
    }
}

/// Line-editor helper: completion and hints from a fixed word list,
/// highlighting through the script scanner.
#[derive(Default)]
struct CwfHelper {
    words: Vec<String>,
}

impl CwfHelper {
    fn new() -> Self {
        let commands = ReplCommand::all_commands()
            .iter()
            .filter_map(|(usage, _)| usage.split_whitespace().next());
        let words = KEYWORDS
            .iter()
            .chain(LITERALS)
            .chain(BUILTINS)
            .copied()
            .chain(commands)
            .map(String::from)
            .collect();

        Self { words }
    }

    fn candidates<'s>(&'s self, prefix: &'s str) -> impl Iterator<Item = &'s str> + 's {
        self.words
            .iter()
            .map(String::as_str)
            .filter(move |word| word.len() > prefix.len() && word.starts_with(prefix))
    }
}

/// Byte offset where the word ending at `end` begins. Dots count as word
/// characters so `.load` and `cwf.core` complete as one word.
fn word_start(line: &str, end: usize) -> usize {
    line[..end]
        .rfind(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
        .map_or(0, |i| i + 1)
}

impl Completer for CwfHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let prefix = &line[word_start(line, pos)..pos];
        if prefix.is_empty() {
            return Ok((pos, Vec::new()));
        }

        let pairs = self
            .candidates(prefix)
            .map(|word| Pair {
                display: word.to_string(),
                replacement: word[prefix.len()..].to_string(),
            })
            .collect();

        Ok((pos, pairs))
    }
}

impl Hinter for CwfHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos != line.len() {
            return None;
        }
        let prefix = &line[word_start(line, pos)..];
        if prefix.len() < 2 {
            return None;
        }
        let word = self.candidates(prefix).next()?;
        Some((&word[prefix.len()..]).dimmed().to_string())
    }
}

impl Highlighter for CwfHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if ReplCommand::parse(line).is_some() {
            return Cow::Owned(line.magenta().to_string());
        }

        let mut out = String::with_capacity(line.len() * 2);
        let mut scanner = Scanner::new(line);
        let mut copied = 0;
        loop {
            let token = scanner.next_token();
            if token.kind == TokenKind::Eof {
                break;
            }
            let Span { start, end } = token.span;
            // whitespace and comments between tokens pass through
            out.push_str(&line[copied..start]);
            out.push_str(&paint(&token.kind, &line[start..end]));
            copied = end;
        }
        out.push_str(&line[copied..]);

        Cow::Owned(out)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn paint(kind: &TokenKind, text: &str) -> String {
    match kind {
        TokenKind::Number(_) => text.yellow().to_string(),
        TokenKind::String(_) => text.green().to_string(),
        TokenKind::True | TokenKind::False | TokenKind::Null => text.blue().to_string(),
        TokenKind::Identifier(name) if BUILTINS.contains(&name.as_str()) => text.cyan().to_string(),
        TokenKind::Identifier(name) if LITERALS.contains(&name.as_str()) => text.blue().to_string(),
        TokenKind::Identifier(_) => text.to_string(),
        TokenKind::LeftParen
        | TokenKind::RightParen
        | TokenKind::LeftBracket
        | TokenKind::RightBracket
        | TokenKind::LeftBrace
        | TokenKind::RightBrace => text.yellow().to_string(),
        TokenKind::Invalid => text.red().to_string(),
        kind if kind.is_keyword() => text.magenta().bold().to_string(),
        _ => text.cyan().to_string(),
    }
}

impl Validator for CwfHelper {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        let input = ctx.input();

        if !is_balanced(input) || ends_with_continuation(input) {
            return Ok(ValidationResult::Incomplete);
        }

        Ok(ValidationResult::Valid(None))
    }
}

/// Whether the input ends with a token that needs a right-hand side.
fn ends_with_continuation(input: &str) -> bool {
    input
        .trim_end()
        .ends_with(['\\', '+', '-', '*', '/', '=', ',', '{', '(', '[', '&', '|', '?', ':'])
}

/// Whether every bracket the scanner sees is closed and no string
/// literal runs off the end of the input. A mismatched closer counts as
/// balanced so the parser gets to report it.
fn is_balanced(input: &str) -> bool {
    let mut scanner = Scanner::new(input);
    let mut expected = Vec::new();
    loop {
        let token = scanner.next_token();
        match token.kind {
            TokenKind::Eof => return expected.is_empty(),
            TokenKind::LeftParen => expected.push(TokenKind::RightParen),
            TokenKind::LeftBracket => expected.push(TokenKind::RightBracket),
            TokenKind::LeftBrace => expected.push(TokenKind::RightBrace),
            TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                if expected.pop().as_ref() != Some(&token.kind) {
                    return true;
                }
            }
            TokenKind::Invalid
                if token.span.end == input.len()
                    && input[token.span.start..].starts_with(['"', '\'']) =>
            {
                return false;
            }
            _ => {}
        }
    }
}

impl Helper for CwfHelper {}

/// The interactive REPL
pub struct Repl {
    loader: ModuleLoader,
    editor: Editor<CwfHelper, DefaultHistory>,
    history_path: PathBuf,
}

impl Repl {
    /// Create a REPL evaluating in `loader`'s context
    pub fn new(loader: ModuleLoader) -> rustyline::Result<Self> {
        let config = Config::builder()
            .history_ignore_dups(true)?
            .history_ignore_space(true)
            .max_history_size(MAX_HISTORY_SIZE)?
            .auto_add_history(true)
            .build();

        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(CwfHelper::new()));

        let history_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cwf")
            .join(HISTORY_FILE);

        if let Some(parent) = history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let _ = editor.load_history(&history_path);

        Ok(Self {
            loader,
            editor,
            history_path,
        })
    }

    /// Run the REPL main loop
    pub fn run(&mut self) -> rustyline::Result<()> {
        self.print_banner();

        loop {
            let prompt = format!("{} ", "cwf>".bright_green().bold());

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();

                    if trimmed.is_empty() {
                        continue;
                    }

                    if let Some((cmd, arg)) = ReplCommand::parse(trimmed) {
                        match self.execute_command(cmd, arg) {
                            CommandResult::Continue => continue,
                            CommandResult::Exit => break,
                        }
                    }

                    self.eval_and_print(trimmed);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C".dimmed());
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "^D".dimmed());
                    break;
                }
                Err(err) => {
                    eprintln!("{}: {:?}", "Error".red().bold(), err);
                    break;
                }
            }
        }

        let _ = self.editor.save_history(&self.history_path);
        Ok(())
    }

    fn print_banner(&self) {
        println!(
            "{} {} ({})",
            "cwf".bright_cyan().bold(),
            env!("CARGO_PKG_VERSION").yellow(),
            self.loader.config().root.display().dimmed()
        );
        println!("Type {} for help, {} to exit", ".help".green(), ".exit".green());
        println!();
    }

    fn execute_command(&mut self, cmd: ReplCommand, arg: Option<&str>) -> CommandResult {
        match cmd {
            ReplCommand::Help => self.print_help(),
            ReplCommand::Exit => return CommandResult::Exit,
            ReplCommand::Clear => print!("\x1B[2J\x1B[H"),
            ReplCommand::Version => {
                println!("{}: {}", "cwf".bright_cyan().bold(), env!("CARGO_PKG_VERSION").yellow());
            }
            ReplCommand::Load => match arg {
                Some(name) => self.load_module(name),
                None => missing_argument(".load"),
            },
            ReplCommand::Modules => {
                for name in self.loader.ready_modules() {
                    println!("  {}", name.cyan());
                }
            }
            ReplCommand::Inspect => match arg.and_then(|name| self.loader.compiled(name)) {
                Some(compiled) => println!("{}", compiled.synthesized(&self.loader.config().private_prefix)),
                None if arg.is_none() => missing_argument(".inspect"),
                None => eprintln!("{}: module is not compiled", "Error".red().bold()),
            },
        }
        CommandResult::Continue
    }

    fn print_help(&self) {
        println!();
        println!("{}", "REPL Commands:".white().bold());
        println!();

        for (cmd, desc) in ReplCommand::all_commands() {
            println!("  {:20} {}", cmd.cyan(), desc.dimmed());
        }

        println!();
        println!("{}", "Keyboard Shortcuts:".white().bold());
        println!();
        println!("  {:20} {}", "Ctrl+C".yellow(), "Cancel current input".dimmed());
        println!("  {:20} {}", "Ctrl+D".yellow(), "Exit REPL".dimmed());
        println!("  {:20} {}", "Tab".yellow(), "Autocomplete".dimmed());
        println!();
    }

    fn load_module(&mut self, name: &str) {
        match self.loader.require(name) {
            Ok(outcome) => {
                if let Some(handle) = outcome.handle() {
                    println!("{} {}", "loaded".green(), handle.name().cyan());
                }
            }
            Err(e) => eprintln!("{}: {}", "Error".red().bold(), e),
        }
    }

    fn eval_and_print(&mut self, input: &str) {
        match self.loader.run_script(input) {
            Ok(Ok(value)) => println!("{}", format_value(&value)),
            // already printed by the sink
            Ok(Err(_)) => {}
            Err(e) => eprintln!("{}: {}", "Error".red().bold(), e),
        }
    }
}

/// Result of executing a REPL command
enum CommandResult {
    Continue,
    Exit,
}

fn missing_argument(command: &str) {
    eprintln!(
        "{}: {} {}",
        "Error".red().bold(),
        command.cyan(),
        "requires a module name".dimmed()
    );
}

/// Format a value for display with syntax coloring
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".blue().dimmed().to_string(),
        Value::Null => "null".blue().to_string(),
        Value::Boolean(b) => b.to_string().yellow().to_string(),
        Value::Number(_) => value.to_string().yellow().to_string(),
        Value::String(s) => format!("'{}'", s).green().to_string(),
        Value::Array(_) => format!("[{}]", value),
        Value::Object(_) => value.to_string().cyan().to_string(),
        Value::Function(_) => value.to_string().magenta().to_string(),
        Value::Class(_) => value.to_string().magenta().bold().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repl_command_parse() {
        assert!(matches!(
            ReplCommand::parse(".help"),
            Some((ReplCommand::Help, None))
        ));
        assert!(matches!(
            ReplCommand::parse(".load app_main"),
            Some((ReplCommand::Load, Some("app_main")))
        ));
        assert!(matches!(
            ReplCommand::parse(".inspect   core  "),
            Some((ReplCommand::Inspect, Some("core")))
        ));
        assert!(ReplCommand::parse("not a command").is_none());
        assert!(ReplCommand::parse(".frobnicate").is_none());
    }

    #[test]
    fn test_is_balanced() {
        assert!(is_balanced("(1 + 2)"));
        assert!(is_balanced("{ a: 1 }"));
        assert!(is_balanced("function () { return 1 }"));
        assert!(!is_balanced("(1 + 2"));
        assert!(!is_balanced("{ a: 1"));
        assert!(is_balanced("'string with (unbalanced'"));
        assert!(!is_balanced("var s = 'open"));
        assert!(is_balanced("(]"));
    }

    #[test]
    fn test_continuation() {
        assert!(ends_with_continuation("var x = "));
        assert!(ends_with_continuation("a &&"));
        assert!(!ends_with_continuation("x + 1"));
    }

    #[test]
    fn test_helper_completes_globals_and_commands() {
        let helper = CwfHelper::new();
        assert_eq!(helper.candidates("Mod").collect::<Vec<_>>(), vec!["Module"]);
        assert_eq!(helper.candidates(".insp").collect::<Vec<_>>(), vec![".inspect"]);
        assert_eq!(helper.candidates("Module").count(), 0);
    }

    #[test]
    fn test_word_start() {
        assert_eq!(word_start("var x = cwf.co", 14), 8);
        assert_eq!(word_start(".lo", 3), 0);
        assert_eq!(word_start("f(ab", 4), 2);
    }
}
