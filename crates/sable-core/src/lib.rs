// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Sable language server core.
//!
//! This crate contains the document/AST core of the Sable language server:
//! - Lexical analysis (tokenization, trivia preserved as tokens)
//! - Parsing (panic-mode recursive descent, always produces a tree)
//! - The bidirectional AST with spans and parent links
//! - The live document model (versioned text, incremental edits, re-parse)
//! - The project: every open file, indexed by path and URI
//!
//! The core is designed as a language service, prioritizing IDE
//! responsiveness: parse errors are recovered, never propagated, and every
//! query is answered from the in-memory model. It is strictly
//! single-threaded; one request is processed to completion before the
//! next.

pub mod ast;
pub mod document;
pub mod error;
pub mod language_service;
pub mod project;
pub mod source_analysis;
pub mod translation_unit;

pub use document::{SourceFile, TextChange, TextRange};
pub use error::DocumentError;
pub use project::Project;
pub use translation_unit::TranslationUnit;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::ast::{Ast, Node, NodeId, NodeKind};
    pub use crate::document::{SourceFile, TextChange, TextRange};
    pub use crate::error::DocumentError;
    pub use crate::language_service::{Completion, CompletionKind, HoverInfo, Position};
    pub use crate::project::Project;
    pub use crate::source_analysis::{FileId, Span, parse};
    pub use crate::translation_unit::TranslationUnit;
}
