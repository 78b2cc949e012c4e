// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Error types for the document and project model.
//!
//! Syntax errors never appear here: the parser absorbs them into its
//! diagnostic list. These errors are the ones edit and query operations
//! surface to callers, and they map one-to-one onto protocol error
//! responses.

use ecow::EcoString;
use miette::Diagnostic;
use thiserror::Error;

/// An error from an edit, query, or lookup on the document model.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum DocumentError {
    /// An edit range has `end < start` or extends past the document.
    #[error("invalid edit range")]
    InvalidRange,

    /// A line/column position lies outside the document.
    #[error("invalid position")]
    InvalidPosition,

    /// No file is known under the given path or URI.
    #[error("file not found: {0}")]
    FileNotFound(EcoString),

    /// A query arrived before the file was ever parsed.
    #[error("no syntax tree for file")]
    NoAstDefined,
}
