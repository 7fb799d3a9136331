// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Token definitions for the module lexer.

use std::fmt;

/// A span in the source code, representing a range of bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The span in the source code
    pub span: Span,
    /// Whether a line terminator precedes this token (drives semicolon insertion)
    pub newline_before: bool,
}

impl Token {
    /// Creates a new token.
    pub fn new(kind: TokenKind, span: Span, newline_before: bool) -> Self {
        Self {
            kind,
            span,
            newline_before,
        }
    }
}

/// One `${...}` substitution inside a template literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Substitution {
    /// Byte offset of the substitution source
    pub offset: usize,
    /// Raw source text between `${` and `}`
    pub source: String,
}

/// The kinds of tokens a configuration module can contain.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Numeric literal
    Number(f64),
    /// String literal (escapes already processed)
    String(String),
    /// Template literal; `quasis.len() == substitutions.len() + 1`
    Template {
        /// Cooked text chunks
        quasis: Vec<String>,
        /// Embedded expressions
        substitutions: Vec<Substitution>,
    },
    /// Regular expression literal, produced when the parser rescans a `/`
    RegExp {
        /// Source between the slashes
        pattern: String,
        /// Flags after the closing slash
        flags: String,
    },
    /// Identifier (includes contextual keywords like `from`, `as`, `async`)
    Identifier(String),

    // Keywords
    Import,
    Export,
    Default,
    Const,
    Let,
    Var,
    New,
    Typeof,
    Void,
    Throw,
    True,
    False,
    Null,
    Function,
    Class,
    Return,
    This,
    If,
    Else,
    For,
    While,
    In,
    Break,
    Continue,
    Try,
    Catch,
    Finally,

    // Punctuators
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Semicolon,
    Comma,
    Colon,
    Dot,
    Ellipsis,
    Question,
    QuestionDot,
    QuestionQuestion,
    Equal,
    Arrow,
    Bang,
    Less,
    Greater,
    Pipe,
    PipePipe,
    Ampersand,
    AmpAmp,
    EqualEqual,
    EqualEqualEqual,
    BangEqual,
    BangEqualEqual,
    Minus,
    Plus,
    Star,
    StarStar,
    Slash,
    Percent,
    At,
    LessEqual,
    GreaterEqual,
    PlusPlus,
    MinusMinus,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    PipePipeEqual,
    AmpAmpEqual,
    QuestionQuestionEqual,

    /// A lexical error, carrying its message
    Invalid(String),
    /// End of input
    Eof,
}

impl TokenKind {
    /// Maps a reserved word to its keyword token.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "import" => TokenKind::Import,
            "export" => TokenKind::Export,
            "default" => TokenKind::Default,
            "const" => TokenKind::Const,
            "let" => TokenKind::Let,
            "var" => TokenKind::Var,
            "new" => TokenKind::New,
            "typeof" => TokenKind::Typeof,
            "void" => TokenKind::Void,
            "throw" => TokenKind::Throw,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "function" => TokenKind::Function,
            "class" => TokenKind::Class,
            "return" => TokenKind::Return,
            "this" => TokenKind::This,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "for" => TokenKind::For,
            "while" => TokenKind::While,
            "in" => TokenKind::In,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "try" => TokenKind::Try,
            "catch" => TokenKind::Catch,
            "finally" => TokenKind::Finally,
            _ => return None,
        };
        Some(kind)
    }

    /// The source spelling of a keyword token, usable as a property name.
    pub fn keyword_name(&self) -> Option<&'static str> {
        let name = match self {
            TokenKind::Import => "import",
            TokenKind::Export => "export",
            TokenKind::Default => "default",
            TokenKind::Const => "const",
            TokenKind::Let => "let",
            TokenKind::Var => "var",
            TokenKind::New => "new",
            TokenKind::Typeof => "typeof",
            TokenKind::Void => "void",
            TokenKind::Throw => "throw",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::Function => "function",
            TokenKind::Class => "class",
            TokenKind::Return => "return",
            TokenKind::This => "this",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::For => "for",
            TokenKind::While => "while",
            TokenKind::In => "in",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Try => "try",
            TokenKind::Catch => "catch",
            TokenKind::Finally => "finally",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.keyword_name() {
            return write!(f, "'{}'", name);
        }
        let text = match self {
            TokenKind::Number(n) => return write!(f, "number {}", n),
            TokenKind::String(s) => return write!(f, "string '{}'", s),
            TokenKind::Template { .. } => "template literal",
            TokenKind::RegExp { pattern, flags } => {
                return write!(f, "regular expression /{}/{}", pattern, flags);
            }
            TokenKind::Identifier(name) => return write!(f, "identifier '{}'", name),
            TokenKind::LeftBrace => "'{'",
            TokenKind::RightBrace => "'}'",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::Semicolon => "';'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Dot => "'.'",
            TokenKind::Ellipsis => "'...'",
            TokenKind::Question => "'?'",
            TokenKind::QuestionDot => "'?.'",
            TokenKind::QuestionQuestion => "'??'",
            TokenKind::Equal => "'='",
            TokenKind::Arrow => "'=>'",
            TokenKind::Bang => "'!'",
            TokenKind::Less => "'<'",
            TokenKind::Greater => "'>'",
            TokenKind::Pipe => "'|'",
            TokenKind::PipePipe => "'||'",
            TokenKind::Ampersand => "'&'",
            TokenKind::AmpAmp => "'&&'",
            TokenKind::EqualEqual => "'=='",
            TokenKind::EqualEqualEqual => "'==='",
            TokenKind::BangEqual => "'!='",
            TokenKind::BangEqualEqual => "'!=='",
            TokenKind::Minus => "'-'",
            TokenKind::Plus => "'+'",
            TokenKind::Star => "'*'",
            TokenKind::StarStar => "'**'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::At => "'@'",
            TokenKind::LessEqual => "'<='",
            TokenKind::GreaterEqual => "'>='",
            TokenKind::PlusPlus => "'++'",
            TokenKind::MinusMinus => "'--'",
            TokenKind::PlusEqual => "'+='",
            TokenKind::MinusEqual => "'-='",
            TokenKind::StarEqual => "'*='",
            TokenKind::SlashEqual => "'/='",
            TokenKind::PercentEqual => "'%='",
            TokenKind::PipePipeEqual => "'||='",
            TokenKind::AmpAmpEqual => "'&&='",
            TokenKind::QuestionQuestionEqual => "'??='",
            TokenKind::Invalid(msg) => return write!(f, "{}", msg),
            TokenKind::Eof => "end of input",
            _ => "token",
        };
        f.write_str(text)
    }
}
