// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Parsing infrastructure for Sable source code.
//!
//! This module contains the lexer, token model, and parser.
//!
//! # Lexical Analysis
//!
//! The [`Lexer`] converts source text into a stream of [`Token`]s. Each
//! token carries its source location via [`Span`] and a lexeme slice of the
//! source. Whitespace, newlines, and comments are returned as real tokens
//! rather than skipped, so the parser (and IDE tooling) can reason about
//! their positions.
//!
//! ```
//! use sable_core::source_analysis::{lex, TokenKind};
//!
//! let tokens = lex("x + 1");
//! assert_eq!(tokens.len(), 5); // x, space, +, space, 1
//! ```
//!
//! # Parsing
//!
//! The [`parse`] function builds a [`TranslationUnit`](crate::TranslationUnit)
//! from source text. The parser is a panic-mode recursive-descent parser
//! with Pratt expression parsing; it always produces a tree, recording
//! syntax errors as [`Diagnostic`]s and `"<error>"` placeholder nodes.
//!
//! # Error Handling
//!
//! The lexer uses error recovery: invalid input becomes
//! [`TokenKind::Invalid`] tokens rather than stopping. The parser absorbs
//! those (reporting "Invalid token") and never fails; callers inspect the
//! returned diagnostics.

mod lexer;
pub mod parser;
mod span;
mod token;


pub use lexer::{Lexer, lex, lex_with_eof};
pub use parser::{Diagnostic, DiagnosticKind, ParseOutcome, Parser, parse, parse_in_file};
pub use span::{FileId, Span};
pub use token::{Token, TokenKind, TokenValue};
