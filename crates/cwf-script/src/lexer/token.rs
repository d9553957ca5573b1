//! Tokens of the module script language.

/// Byte range `[start, end)` of a token in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// First byte of the token.
    pub start: usize,
    /// One past the last byte.
    pub end: usize,
}

impl Span {
    /// Span covering `start..end`.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A classified piece of source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What was scanned.
    pub kind: TokenKind,
    /// Where it was scanned.
    pub span: Span,
}

impl Token {
    /// Pairs a kind with its location.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Reserved words, in source spelling. `true`, `false` and `null` are
/// literals but share the table so property names can use them too.
const RESERVED: &[(&str, TokenKind)] = &[
    ("break", TokenKind::Break),
    ("catch", TokenKind::Catch),
    ("const", TokenKind::Const),
    ("continue", TokenKind::Continue),
    ("else", TokenKind::Else),
    ("false", TokenKind::False),
    ("finally", TokenKind::Finally),
    ("for", TokenKind::For),
    ("function", TokenKind::Function),
    ("if", TokenKind::If),
    ("instanceof", TokenKind::Instanceof),
    ("let", TokenKind::Let),
    ("new", TokenKind::New),
    ("null", TokenKind::Null),
    ("return", TokenKind::Return),
    ("this", TokenKind::This),
    ("throw", TokenKind::Throw),
    ("true", TokenKind::True),
    ("try", TokenKind::Try),
    ("typeof", TokenKind::Typeof),
    ("var", TokenKind::Var),
    ("void", TokenKind::Void),
    ("while", TokenKind::While),
];

/// Token classes. Reserved words get one variant each, spelled as in
/// the `RESERVED` table; punctuators are named after their glyphs.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Numeric literal, already converted.
    Number(f64),
    /// String literal with escapes resolved.
    String(String),
    /// Any name that is not a reserved word.
    Identifier(String),
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,

    /// `break`
    Break,
    /// `catch`
    Catch,
    /// `const`
    Const,
    /// `continue`
    Continue,
    /// `else`
    Else,
    /// `finally`
    Finally,
    /// `for`
    For,
    /// `function`
    Function,
    /// `if`
    If,
    /// `instanceof`
    Instanceof,
    /// `let`
    Let,
    /// `new`
    New,
    /// `return`
    Return,
    /// `this`
    This,
    /// `throw`
    Throw,
    /// `try`
    Try,
    /// `typeof`
    Typeof,
    /// `var`
    Var,
    /// `void`
    Void,
    /// `while`
    While,

    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `.`
    Dot,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `?`
    Question,
    /// `:`
    Colon,

    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
    /// `<=`
    LessThanEqual,
    /// `>=`
    GreaterThanEqual,
    /// `==`
    EqualEqual,
    /// `!=`
    NotEqual,
    /// `===`
    StrictEqual,
    /// `!==`
    StrictNotEqual,

    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `!`
    Bang,
    /// `&&`
    AmpersandAmpersand,
    /// `||`
    PipePipe,

    /// `=`
    Equal,
    /// `+=`
    PlusEqual,
    /// `-=`
    MinusEqual,

    /// End of input; repeated on every later call.
    Eof,
    /// Unrecognized input; the parser turns it into a syntax error.
    Invalid,
}

impl TokenKind {
    /// Classifies a scanned word as a reserved word or an identifier.
    pub fn from_word(word: String) -> Self {
        RESERVED
            .iter()
            .find(|(text, _)| *text == word)
            .map(|(_, kind)| kind.clone())
            .unwrap_or(TokenKind::Identifier(word))
    }

    /// Source spelling of a reserved word, for keywords used as property
    /// names (`obj.new`, `{ if: 1 }`).
    pub fn keyword_text(&self) -> Option<&'static str> {
        RESERVED
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(text, _)| *text)
    }

    /// Reserved words other than the literal ones.
    pub fn is_keyword(&self) -> bool {
        self.keyword_text().is_some() && !self.is_literal()
    }

    /// Numbers, strings, `true`, `false` and `null`.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            TokenKind::Number(_)
                | TokenKind::String(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        )
    }
}
