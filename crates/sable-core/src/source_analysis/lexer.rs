// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Lexical analysis for Sable source code.
//!
//! This module converts source text into a stream of [`Token`]s. The lexer
//! is hand-written for maximum control over error recovery and IDE features.
//!
//! # Design Principles
//!
//! - **Error recovery**: Never panic on malformed input; emit
//!   [`TokenKind::Invalid`] and keep going
//! - **Trivia as tokens**: Whitespace, newlines, and comments are returned
//!   as real tokens so the parser can reason about their positions
//! - **Precise spans**: Every token carries its exact source location, and
//!   its lexeme is a slice of the source at that span
//!
//! # Example
//!
//! ```
//! use sable_core::source_analysis::{lex, TokenKind};
//!
//! let tokens = lex("x + 1");
//! let kinds: Vec<_> = tokens.iter().map(|t| t.kind()).collect();
//! assert_eq!(
//!     kinds,
//!     vec![
//!         TokenKind::Ident,
//!         TokenKind::Whitespace,
//!         TokenKind::Plus,
//!         TokenKind::Whitespace,
//!         TokenKind::Integer,
//!     ]
//! );
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

use ecow::EcoString;

use super::{FileId, Span, Token, TokenKind, TokenValue};

/// A lexer that tokenizes Sable source code.
///
/// Call [`Lexer::next_token`] repeatedly; after end of source every call
/// returns an [`TokenKind::Eof`] token with the empty span `[len, len)`.
/// The lexer also implements [`Iterator`], yielding tokens up to (but not
/// including) EOF.
///
/// # Error Recovery
///
/// The lexer never fails. Unrecognized byte sequences, unterminated
/// strings, and malformed literals produce [`TokenKind::Invalid`] tokens,
/// allowing parsing to continue.
pub struct Lexer<'src> {
    /// The source text being lexed.
    source: &'src str,
    /// Character iterator with byte positions.
    chars: Peekable<CharIndices<'src>>,
    /// Current byte position in source.
    position: usize,
    /// Owning file for all produced spans.
    file: FileId,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("position", &self.position)
            .field("remaining", &self.source.get(self.position..).unwrap_or(""))
            .finish()
    }
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source text.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self::with_file(source, FileId::UNASSIGNED)
    }

    /// Creates a new lexer whose spans belong to the given file.
    #[must_use]
    pub fn with_file(source: &'src str, file: FileId) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            position: 0,
            file,
        }
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Peeks `n+1` characters ahead without consuming (`n = 0` is the same
    /// as `peek_char`).
    fn peek_char_n(&self, n: usize) -> Option<char> {
        let mut iter = self.chars.clone();
        for _ in 0..n {
            iter.next();
        }
        iter.next().map(|(_, c)| c)
    }

    /// Consumes the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let (pos, c) = self.chars.next()?;
        self.position = pos + c.len_utf8();
        Some(c)
    }

    /// Consumes characters while the predicate is true.
    fn advance_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&predicate) {
            self.advance();
        }
    }

    /// Returns the current byte position.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "token offsets are stored as u32; larger inputs are out of scope"
    )]
    fn current_position(&self) -> u32 {
        self.position as u32
    }

    /// Creates a span from start to current position.
    fn span_from(&self, start: u32) -> Span {
        Span::in_file(self.file, start, self.current_position())
    }

    /// Extracts source text for a span.
    fn text_for(&self, span: Span) -> &'src str {
        &self.source[span.byte_range()]
    }

    /// Lexes the next token. After end of source, returns EOF forever.
    pub fn next_token(&mut self) -> Token<'src> {
        let start = self.current_position();

        let Some(c) = self.peek_char() else {
            let span = Span::in_file(self.file, start, start);
            return Token::new(TokenKind::Eof, span, "");
        };

        match c {
            ' ' | '\t' => {
                self.advance_while(|c| matches!(c, ' ' | '\t'));
                self.token(TokenKind::Whitespace, start)
            }
            '\n' => {
                self.advance();
                self.token(TokenKind::Newline, start)
            }
            '\r' => {
                self.advance();
                if self.peek_char() == Some('\n') {
                    self.advance();
                    self.token(TokenKind::Newline, start)
                } else {
                    self.token(TokenKind::Whitespace, start)
                }
            }
            '/' if self.peek_char_n(1) == Some('/') => self.lex_line_comment(start),
            '/' if self.peek_char_n(1) == Some('*') => self.lex_block_comment(start),
            'a'..='z' | 'A'..='Z' | '_' => self.lex_identifier(start),
            '@' | '#' | '$' => self.lex_prefixed_identifier(c, start),
            '0'..='9' => self.lex_number(start),
            '"' => self.lex_string(start),
            '\'' => self.lex_character(start),
            _ => self.lex_punctuation(c, start),
        }
    }

    /// Builds a token of the given kind spanning from `start`.
    fn token(&self, kind: TokenKind, start: u32) -> Token<'src> {
        let span = self.span_from(start);
        Token::new(kind, span, self.text_for(span))
    }

    /// Builds a token carrying a literal payload.
    fn token_with_value(&self, kind: TokenKind, start: u32, value: TokenValue) -> Token<'src> {
        let span = self.span_from(start);
        Token::with_value(kind, span, self.text_for(span), value)
    }

    /// Lexes a line comment: `// ...` (the newline is a separate token).
    fn lex_line_comment(&mut self, start: u32) -> Token<'src> {
        self.advance(); // /
        self.advance(); // /
        self.advance_while(|c| c != '\n');
        self.token(TokenKind::LineComment, start)
    }

    /// Lexes a block comment: `/* ... */`. Unterminated comments run to end
    /// of source and still produce a comment token.
    fn lex_block_comment(&mut self, start: u32) -> Token<'src> {
        self.advance(); // /
        self.advance(); // *
        loop {
            match self.peek_char() {
                None => break,
                Some('*') if self.peek_char_n(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }
        self.token(TokenKind::BlockComment, start)
    }

    /// Lexes an identifier and classifies it by case.
    fn lex_identifier(&mut self, start: u32) -> Token<'src> {
        self.advance_while(is_identifier_continue);
        let span = self.span_from(start);
        let text = self.text_for(span);
        Token::new(classify_identifier(text), span, text)
    }

    /// Lexes an `@`/`#`/`$`-prefixed identifier. A sigil not followed by an
    /// identifier character is an invalid token.
    fn lex_prefixed_identifier(&mut self, sigil: char, start: u32) -> Token<'src> {
        self.advance(); // sigil
        if self.peek_char().is_some_and(is_identifier_start) {
            self.advance_while(is_identifier_continue);
            let kind = match sigil {
                '@' => TokenKind::AtIdent,
                '#' => TokenKind::HashIdent,
                _ => TokenKind::DollarIdent,
            };
            self.token(kind, start)
        } else {
            self.token(TokenKind::Invalid, start)
        }
    }

    /// Lexes an integer or real literal.
    ///
    /// Supports decimal and `0x` hex integers, and reals with a fractional
    /// part and/or exponent. A `.` is only treated as a fraction when a
    /// digit follows, so `1..10` lexes as integer, `..`, integer.
    fn lex_number(&mut self, start: u32) -> Token<'src> {
        if self.peek_char() == Some('0')
            && matches!(self.peek_char_n(1), Some('x' | 'X'))
            && self.peek_char_n(2).is_some_and(|c| c.is_ascii_hexdigit())
        {
            self.advance(); // 0
            self.advance(); // x
            self.advance_while(|c| c.is_ascii_hexdigit() || c == '_');
            let span = self.span_from(start);
            let text = self.text_for(span);
            let digits: String = text[2..].chars().filter(|&c| c != '_').collect();
            return match i64::from_str_radix(&digits, 16) {
                Ok(value) => {
                    Token::with_value(TokenKind::Integer, span, text, TokenValue::Int(value))
                }
                Err(_) => Token::new(TokenKind::Invalid, span, text),
            };
        }

        self.advance_while(|c| c.is_ascii_digit() || c == '_');

        let mut is_real = false;
        if self.peek_char() == Some('.') && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
        {
            is_real = true;
            self.advance(); // .
            self.advance_while(|c| c.is_ascii_digit() || c == '_');
        }
        if matches!(self.peek_char(), Some('e' | 'E')) {
            let exp_digit_at = match self.peek_char_n(1) {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if self
                .peek_char_n(exp_digit_at)
                .is_some_and(|c| c.is_ascii_digit())
            {
                is_real = true;
                self.advance(); // e
                if matches!(self.peek_char(), Some('+' | '-')) {
                    self.advance();
                }
                self.advance_while(|c| c.is_ascii_digit());
            }
        }

        let span = self.span_from(start);
        let text = self.text_for(span);
        let digits: String = text.chars().filter(|&c| c != '_').collect();
        if is_real {
            match digits.parse::<f64>() {
                Ok(value) => Token::with_value(TokenKind::Real, span, text, TokenValue::Real(value)),
                Err(_) => Token::new(TokenKind::Invalid, span, text),
            }
        } else {
            match digits.parse::<i64>() {
                Ok(value) => {
                    Token::with_value(TokenKind::Integer, span, text, TokenValue::Int(value))
                }
                Err(_) => Token::new(TokenKind::Invalid, span, text),
            }
        }
    }

    /// Lexes a string literal with escape sequences. An unterminated string
    /// produces an invalid token running to the end of the line or source.
    fn lex_string(&mut self, start: u32) -> Token<'src> {
        self.advance(); // "
        let mut content = EcoString::new();
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    return self.token(TokenKind::Invalid, start);
                }
                Some('"') => {
                    self.advance();
                    return self.token_with_value(
                        TokenKind::String,
                        start,
                        TokenValue::Str(content),
                    );
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some(escaped) => content.push(unescape(escaped)),
                        None => return self.token(TokenKind::Invalid, start),
                    }
                }
                Some(c) => {
                    self.advance();
                    content.push(c);
                }
            }
        }
    }

    /// Lexes a character literal: `'a'`, `'\n'`.
    fn lex_character(&mut self, start: u32) -> Token<'src> {
        self.advance(); // '
        let value = match self.peek_char() {
            None | Some('\n' | '\'') => None,
            Some('\\') => {
                self.advance();
                self.advance().map(unescape)
            }
            Some(c) => {
                self.advance();
                Some(c)
            }
        };
        match (value, self.peek_char()) {
            (Some(c), Some('\'')) => {
                self.advance();
                self.token_with_value(TokenKind::CharLiteral, start, TokenValue::Char(c))
            }
            _ => {
                // Skip to the closing quote on this line, if any.
                self.advance_while(|c| c != '\'' && c != '\n');
                if self.peek_char() == Some('\'') {
                    self.advance();
                }
                self.token(TokenKind::Invalid, start)
            }
        }
    }

    /// Lexes punctuation, longest match first.
    fn lex_punctuation(&mut self, c: char, start: u32) -> Token<'src> {
        let next = self.peek_char_n(1);
        let next2 = self.peek_char_n(2);

        // (kind, consumed char count) for the greedy match.
        let (kind, len) = match (c, next, next2) {
            ('<', Some('<'), Some('=')) => (TokenKind::ShlEq, 3),
            ('>', Some('>'), Some('=')) => (TokenKind::ShrEq, 3),
            ('.', Some('.'), Some('.')) => (TokenKind::Ellipsis, 3),
            (':', Some(':'), _) => (TokenKind::ColonColon, 2),
            ('=', Some('='), _) => (TokenKind::EqEq, 2),
            ('=', Some('>'), _) => (TokenKind::FatArrow, 2),
            ('!', Some('='), _) => (TokenKind::BangEq, 2),
            ('<', Some('='), _) => (TokenKind::LessEq, 2),
            ('>', Some('='), _) => (TokenKind::GreaterEq, 2),
            ('<', Some('<'), _) => (TokenKind::Shl, 2),
            ('>', Some('>'), _) => (TokenKind::Shr, 2),
            ('&', Some('&'), _) => (TokenKind::AmpAmp, 2),
            ('|', Some('|'), _) => (TokenKind::PipePipe, 2),
            ('+', Some('+'), _) => (TokenKind::PlusPlus, 2),
            ('-', Some('-'), _) => (TokenKind::MinusMinus, 2),
            ('-', Some('>'), _) => (TokenKind::Arrow, 2),
            ('.', Some('.'), _) => (TokenKind::DotDot, 2),
            ('+', Some('='), _) => (TokenKind::PlusEq, 2),
            ('-', Some('='), _) => (TokenKind::MinusEq, 2),
            ('*', Some('='), _) => (TokenKind::StarEq, 2),
            ('/', Some('='), _) => (TokenKind::SlashEq, 2),
            ('%', Some('='), _) => (TokenKind::PercentEq, 2),
            ('&', Some('='), _) => (TokenKind::AmpEq, 2),
            ('|', Some('='), _) => (TokenKind::PipeEq, 2),
            ('^', Some('='), _) => (TokenKind::CaretEq, 2),
            ('(', _, _) => (TokenKind::LParen, 1),
            (')', _, _) => (TokenKind::RParen, 1),
            ('{', _, _) => (TokenKind::LBrace, 1),
            ('}', _, _) => (TokenKind::RBrace, 1),
            ('[', _, _) => (TokenKind::LBracket, 1),
            (']', _, _) => (TokenKind::RBracket, 1),
            (',', _, _) => (TokenKind::Comma, 1),
            (';', _, _) => (TokenKind::Semicolon, 1),
            (':', _, _) => (TokenKind::Colon, 1),
            ('.', _, _) => (TokenKind::Dot, 1),
            ('?', _, _) => (TokenKind::Question, 1),
            ('+', _, _) => (TokenKind::Plus, 1),
            ('-', _, _) => (TokenKind::Minus, 1),
            ('*', _, _) => (TokenKind::Star, 1),
            ('/', _, _) => (TokenKind::Slash, 1),
            ('%', _, _) => (TokenKind::Percent, 1),
            ('&', _, _) => (TokenKind::Amp, 1),
            ('|', _, _) => (TokenKind::Pipe, 1),
            ('^', _, _) => (TokenKind::Caret, 1),
            ('~', _, _) => (TokenKind::Tilde, 1),
            ('!', _, _) => (TokenKind::Bang, 1),
            ('=', _, _) => (TokenKind::Eq, 1),
            ('<', _, _) => (TokenKind::Less, 1),
            ('>', _, _) => (TokenKind::Greater, 1),
            _ => {
                // Unrecognized input: consume a maximal run of characters
                // that cannot begin any token.
                self.advance_while(is_unrecognized);
                return self.token(TokenKind::Invalid, start);
            }
        };

        for _ in 0..len {
            self.advance();
        }
        self.token(kind, start)
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind().is_eof() {
            None
        } else {
            Some(token)
        }
    }
}

/// Returns true if `c` can start an identifier.
fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Returns true if `c` can continue an identifier.
fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Returns true if `c` cannot begin any recognized token.
fn is_unrecognized(c: char) -> bool {
    !matches!(
        c,
        ' ' | '\t'
            | '\r'
            | '\n'
            | 'a'..='z'
            | 'A'..='Z'
            | '_'
            | '0'..='9'
            | '@'
            | '#'
            | '$'
            | '"'
            | '\''
            | '('
            | ')'
            | '{'
            | '}'
            | '['
            | ']'
            | ','
            | ';'
            | ':'
            | '.'
            | '?'
            | '+'
            | '-'
            | '*'
            | '/'
            | '%'
            | '&'
            | '|'
            | '^'
            | '~'
            | '!'
            | '='
            | '<'
            | '>'
    )
}

/// Classifies an identifier lexeme by its case shape.
///
/// - lowercase or `_` leading → [`TokenKind::Ident`]
/// - uppercase leading with any lowercase → [`TokenKind::TypeIdent`]
/// - uppercase leading, no lowercase → [`TokenKind::ConstIdent`]
fn classify_identifier(text: &str) -> TokenKind {
    let first = text.chars().next().unwrap_or('_');
    if first.is_ascii_uppercase() {
        if text.chars().any(|c| c.is_ascii_lowercase()) {
            TokenKind::TypeIdent
        } else {
            TokenKind::ConstIdent
        }
    } else {
        TokenKind::Ident
    }
}

/// Resolves a character escape: `\n`, `\t`, `\r`, `\0`, `\\`, `\"`, `\'`.
/// Unknown escapes resolve to the escaped character itself.
fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}

/// Lexes the entire source into a token vector, excluding the EOF token.
///
/// Trivia (whitespace, newlines, comments) is included.
#[must_use]
pub fn lex(source: &str) -> Vec<Token<'_>> {
    Lexer::new(source).collect()
}

/// Lexes the entire source into a token vector, with the EOF token last.
#[must_use]
pub fn lex_with_eof(source: &str) -> Vec<Token<'_>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let is_eof = token.kind().is_eof();
        tokens.push(token);
        if is_eof {
            break;
        }
    }
    tokens
}
