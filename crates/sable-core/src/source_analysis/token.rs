// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Token types for Sable lexical analysis.
//!
//! This module defines the token types produced by the lexer. Unlike most
//! compilers, whitespace, line terminators, and comments are returned as
//! real tokens rather than skipped: the parser uses their positions for
//! statement-boundary recovery, and IDE tooling uses them for formatting.
//!
//! # Token Structure
//!
//! Each token consists of:
//! - A [`TokenKind`] indicating the type of token
//! - A [`Span`] indicating its location in source
//! - A lexeme slice borrowed from the source text
//! - An optional [`TokenValue`] carrying a parsed literal payload
//!
//! # Identifier Classes
//!
//! Sable identifier kinds are lexical, not semantic: `counter` is an
//! [`TokenKind::Ident`], `Vec2` a [`TokenKind::TypeIdent`], `MAX_DEPTH` a
//! [`TokenKind::ConstIdent`]. Keywords (`fn`, `struct`, `if`, ...) are not
//! reserved; the parser recognizes them by lexeme on `Ident` tokens.

use ecow::EcoString;

use super::Span;

/// The kind of token, not including source location or lexeme.
///
/// This is a closed enumeration of every syntactic element that can appear
/// in Sable source, including trivia. [`TokenKind::Invalid`] marks a lex
/// error; [`TokenKind::Eof`] is the terminal sentinel produced indefinitely
/// after end of source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // === Trivia ===
    /// Spaces, tabs, and carriage returns not followed by a newline.
    Whitespace,
    /// A line terminator: `\n` or `\r\n`.
    Newline,
    /// A line comment: `// ...` (up to but not including the newline).
    LineComment,
    /// A block comment: `/* ... */` (unterminated runs to end of source).
    BlockComment,

    // === Identifiers ===
    /// A lowercase-leading identifier: `foo`, `my_var`, `_tmp`.
    Ident,
    /// An uppercase-leading, mixed-case identifier: `Point`, `Vec2`.
    TypeIdent,
    /// An all-uppercase identifier: `MAX`, `FOO_BAR`.
    ConstIdent,
    /// An `@`-prefixed identifier: `@builtin`.
    AtIdent,
    /// A `#`-prefixed identifier: `#foreach`.
    HashIdent,
    /// A `$`-prefixed identifier: `$typeof`.
    DollarIdent,

    // === Literals ===
    /// An integer literal: `42`, `0xFF`.
    Integer,
    /// A real literal: `3.14`, `2.5e10`.
    Real,
    /// A double-quoted string literal.
    String,
    /// A single-quoted character literal: `'a'`, `'\n'`.
    CharLiteral,

    // === Delimiters ===
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,

    // === Punctuation ===
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `::`
    ColonColon,
    /// `.`
    Dot,
    /// `..`
    DotDot,
    /// `...`
    Ellipsis,
    /// `?`
    Question,
    /// `->`
    Arrow,
    /// `=>`
    FatArrow,

    // === Operators ===
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
    /// `&`
    Amp,
    /// `|`
    Pipe,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `!`
    Bang,
    /// `=`
    Eq,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `==`
    EqEq,
    /// `!=`
    BangEq,
    /// `<=`
    LessEq,
    /// `>=`
    GreaterEq,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `+=`
    PlusEq,
    /// `-=`
    MinusEq,
    /// `*=`
    StarEq,
    /// `/=`
    SlashEq,
    /// `%=`
    PercentEq,
    /// `&=`
    AmpEq,
    /// `|=`
    PipeEq,
    /// `^=`
    CaretEq,
    /// `<<=`
    ShlEq,
    /// `>>=`
    ShrEq,

    // === Special ===
    /// An unrecognized byte sequence (lex error, recovered).
    Invalid,
    /// End of file.
    Eof,
}

impl TokenKind {
    /// Returns `true` if this token is trivia (whitespace, newline, comment).
    #[must_use]
    pub const fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::Whitespace | Self::Newline | Self::LineComment | Self::BlockComment
        )
    }

    /// Returns `true` if this token is trivia other than a newline.
    ///
    /// Used at infix-operator position, where a newline must stay visible
    /// so it can terminate an expression statement.
    #[must_use]
    pub const fn is_horizontal_trivia(self) -> bool {
        matches!(
            self,
            Self::Whitespace | Self::LineComment | Self::BlockComment
        )
    }

    /// Returns `true` if this token is one of the identifier classes.
    #[must_use]
    pub const fn is_identifier(self) -> bool {
        matches!(
            self,
            Self::Ident
                | Self::TypeIdent
                | Self::ConstIdent
                | Self::AtIdent
                | Self::HashIdent
                | Self::DollarIdent
        )
    }

    /// Returns `true` if this token can begin a type: `Ident`, `TypeIdent`,
    /// or `ConstIdent`.
    #[must_use]
    pub const fn is_type_start(self) -> bool {
        matches!(self, Self::Ident | Self::TypeIdent | Self::ConstIdent)
    }

    /// Returns `true` if this token is a literal value.
    #[must_use]
    pub const fn is_literal(self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Real | Self::String | Self::CharLiteral
        )
    }

    /// Returns `true` if this is the end-of-file marker.
    #[must_use]
    pub const fn is_eof(self) -> bool {
        matches!(self, Self::Eof)
    }

    /// Returns `true` if this is an invalid token.
    #[must_use]
    pub const fn is_invalid(self) -> bool {
        matches!(self, Self::Invalid)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Whitespace => "<whitespace>",
            Self::Newline => "<newline>",
            Self::LineComment => "<line comment>",
            Self::BlockComment => "<block comment>",
            Self::Ident => "identifier",
            Self::TypeIdent => "type identifier",
            Self::ConstIdent => "constant identifier",
            Self::AtIdent => "@-identifier",
            Self::HashIdent => "#-identifier",
            Self::DollarIdent => "$-identifier",
            Self::Integer => "integer literal",
            Self::Real => "real literal",
            Self::String => "string literal",
            Self::CharLiteral => "character literal",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Colon => ":",
            Self::ColonColon => "::",
            Self::Dot => ".",
            Self::DotDot => "..",
            Self::Ellipsis => "...",
            Self::Question => "?",
            Self::Arrow => "->",
            Self::FatArrow => "=>",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Amp => "&",
            Self::Pipe => "|",
            Self::Caret => "^",
            Self::Tilde => "~",
            Self::Bang => "!",
            Self::Eq => "=",
            Self::Less => "<",
            Self::Greater => ">",
            Self::EqEq => "==",
            Self::BangEq => "!=",
            Self::LessEq => "<=",
            Self::GreaterEq => ">=",
            Self::AmpAmp => "&&",
            Self::PipePipe => "||",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::PlusPlus => "++",
            Self::MinusMinus => "--",
            Self::PlusEq => "+=",
            Self::MinusEq => "-=",
            Self::StarEq => "*=",
            Self::SlashEq => "/=",
            Self::PercentEq => "%=",
            Self::AmpEq => "&=",
            Self::PipeEq => "|=",
            Self::CaretEq => "^=",
            Self::ShlEq => "<<=",
            Self::ShrEq => ">>=",
            Self::Invalid => "<invalid>",
            Self::Eof => "<eof>",
        };
        write!(f, "{text}")
    }
}

/// A parsed literal payload attached to a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    /// Value of an [`TokenKind::Integer`] token.
    Int(i64),
    /// Value of a [`TokenKind::Real`] token.
    Real(f64),
    /// Unescaped content of a [`TokenKind::String`] token.
    Str(EcoString),
    /// Value of a [`TokenKind::CharLiteral`] token.
    Char(char),
}

/// A token with its source location and lexeme.
///
/// The lexeme is a slice of the source text equal to
/// `&source[span.start()..span.end()]`, so tokens are tied to the lifetime
/// of the text being lexed.
///
/// # Examples
///
/// ```
/// use sable_core::source_analysis::{Lexer, TokenKind};
///
/// let mut lexer = Lexer::new("import std;");
/// let token = lexer.next_token();
/// assert_eq!(token.kind(), TokenKind::Ident);
/// assert_eq!(token.lexeme(), "import");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'src> {
    kind: TokenKind,
    span: Span,
    lexeme: &'src str,
    value: Option<TokenValue>,
}

impl<'src> Token<'src> {
    /// Creates a new token with no literal payload.
    #[must_use]
    pub fn new(kind: TokenKind, span: Span, lexeme: &'src str) -> Self {
        Self {
            kind,
            span,
            lexeme,
            value: None,
        }
    }

    /// Creates a new token carrying a parsed literal payload.
    #[must_use]
    pub fn with_value(kind: TokenKind, span: Span, lexeme: &'src str, value: TokenValue) -> Self {
        Self {
            kind,
            span,
            lexeme,
            value: Some(value),
        }
    }

    /// Returns the kind of this token.
    #[must_use]
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Returns the source span of this token.
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Returns the source text of this token.
    #[must_use]
    pub fn lexeme(&self) -> &'src str {
        self.lexeme
    }

    /// Returns the parsed literal payload, if any.
    #[must_use]
    pub fn value(&self) -> Option<&TokenValue> {
        self.value.as_ref()
    }

    /// Returns `true` if this token is an `Ident` with the given lexeme.
    ///
    /// Sable keywords are not reserved, so this is how the parser checks
    /// for `fn`, `struct`, `return`, and friends.
    #[must_use]
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Ident && self.lexeme == keyword
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_kind_predicates() {
        assert!(TokenKind::Whitespace.is_trivia());
        assert!(TokenKind::Newline.is_trivia());
        assert!(TokenKind::LineComment.is_trivia());
        assert!(!TokenKind::Ident.is_trivia());

        assert!(TokenKind::Whitespace.is_horizontal_trivia());
        assert!(!TokenKind::Newline.is_horizontal_trivia());

        assert!(TokenKind::Ident.is_identifier());
        assert!(TokenKind::TypeIdent.is_identifier());
        assert!(TokenKind::AtIdent.is_identifier());
        assert!(!TokenKind::Integer.is_identifier());

        assert!(TokenKind::Ident.is_type_start());
        assert!(TokenKind::TypeIdent.is_type_start());
        assert!(TokenKind::ConstIdent.is_type_start());
        assert!(!TokenKind::AtIdent.is_type_start());

        assert!(TokenKind::Integer.is_literal());
        assert!(TokenKind::Real.is_literal());
        assert!(!TokenKind::Ident.is_literal());

        assert!(TokenKind::Eof.is_eof());
        assert!(TokenKind::Invalid.is_invalid());
    }

    #[test]
    fn token_kind_display() {
        assert_eq!(TokenKind::ColonColon.to_string(), "::");
        assert_eq!(TokenKind::FatArrow.to_string(), "=>");
        assert_eq!(TokenKind::ShlEq.to_string(), "<<=");
        assert_eq!(TokenKind::Ident.to_string(), "identifier");
        assert_eq!(TokenKind::Eof.to_string(), "<eof>");
    }

    #[test]
    fn token_creation_and_accessors() {
        let token = Token::new(TokenKind::Ident, Span::new(0, 3), "foo");
        assert_eq!(token.kind(), TokenKind::Ident);
        assert_eq!(token.span().start(), 0);
        assert_eq!(token.span().end(), 3);
        assert_eq!(token.lexeme(), "foo");
        assert!(token.value().is_none());
    }

    #[test]
    fn token_with_value() {
        let token = Token::with_value(
            TokenKind::Integer,
            Span::new(0, 2),
            "42",
            TokenValue::Int(42),
        );
        assert_eq!(token.value(), Some(&TokenValue::Int(42)));
    }

    #[test]
    fn keyword_check_is_lexical() {
        let token = Token::new(TokenKind::Ident, Span::new(0, 2), "fn");
        assert!(token.is_keyword("fn"));
        assert!(!token.is_keyword("struct"));

        // Only plain identifiers can be keywords.
        let ty = Token::new(TokenKind::TypeIdent, Span::new(0, 2), "Fn");
        assert!(!ty.is_keyword("Fn"));
    }
}
