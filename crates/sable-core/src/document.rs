// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The live document model: one open source file.
//!
//! A [`SourceFile`] owns the current text of an open file, its protocol
//! version, and the [`TranslationUnit`] parsed from it. Edits rewrite the
//! text through byte-range splices and trigger a re-parse; the file's
//! identity (path, URI, file id) is stable across edits.
//!
//! # Edit ordering
//!
//! Incremental changes are applied **back to front**: changes are sorted
//! by start position descending before splicing, so earlier edits cannot
//! shift the byte ranges of later ones. Overlapping ranges are rejected
//! with [`DocumentError::InvalidRange`]. When validation fails, neither
//! the content nor the version is modified.

use camino::Utf8PathBuf;
use ecow::eco_format;
use tracing::debug;

use crate::error::DocumentError;
use crate::language_service::{COMPLETION_KEYWORDS, Completion, CompletionKind, HoverInfo, Position};
use crate::source_analysis::{Diagnostic, FileId, parse_in_file};
use crate::translation_unit::TranslationUnit;
use crate::ast::NodeKind;

/// A half-open line/column range within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    /// Start position (inclusive).
    pub start: Position,
    /// End position (exclusive).
    pub end: Position,
}

impl TextRange {
    /// Creates a new range.
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// One text document change: a range splice, or a full-document
/// replacement when `range` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    /// The replaced range; `None` replaces the entire document.
    pub range: Option<TextRange>,
    /// The replacement text.
    pub text: String,
}

impl TextChange {
    /// Creates a full-document replacement.
    #[must_use]
    pub fn full(text: impl Into<String>) -> Self {
        Self {
            range: None,
            text: text.into(),
        }
    }

    /// Creates a range splice.
    #[must_use]
    pub fn splice(range: TextRange, text: impl Into<String>) -> Self {
        Self {
            range: Some(range),
            text: text.into(),
        }
    }
}

/// One open source file: text, version, and parsed translation unit.
///
/// Created on open, updated in place by edits, destroyed on close. Every
/// edit frees the previous translation unit (and with it every node id
/// handed out from it) and re-parses.
#[derive(Debug)]
pub struct SourceFile {
    /// Filesystem path of the file.
    path: Utf8PathBuf,
    /// The client's URI for the same file.
    uri: String,
    /// Current document text.
    content: String,
    /// Last applied document version.
    version: i32,
    /// Project-assigned file id stamped into all spans.
    file_id: FileId,
    /// The parsed unit. `None` only before the first parse completes.
    unit: Option<TranslationUnit>,
    /// True if the last parse recorded any error.
    has_errors: bool,
    /// Error count from the last parse.
    error_count: usize,
    /// Diagnostics from the last parse.
    diagnostics: Vec<Diagnostic>,
}

impl SourceFile {
    /// Creates a source file and parses its initial content.
    #[must_use]
    pub fn new(
        path: Utf8PathBuf,
        uri: impl Into<String>,
        content: impl Into<String>,
        version: i32,
        file_id: FileId,
    ) -> Self {
        let mut file = Self {
            path,
            uri: uri.into(),
            content: content.into(),
            version,
            file_id,
            unit: None,
            has_errors: false,
            error_count: 0,
            diagnostics: Vec::new(),
        };
        file.reparse();
        file
    }

    /// Returns the filesystem path.
    #[must_use]
    pub fn path(&self) -> &Utf8PathBuf {
        &self.path
    }

    /// Returns the client URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns the current document text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the last applied version.
    #[must_use]
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Returns the project-assigned file id.
    #[must_use]
    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    /// Returns the parsed translation unit.
    #[must_use]
    pub fn unit(&self) -> Option<&TranslationUnit> {
        self.unit.as_ref()
    }

    /// Returns true if the last parse recorded errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Returns the error count from the last parse.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Returns the diagnostics from the last parse.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Re-parses the current content, replacing the translation unit.
    fn reparse(&mut self) {
        let outcome = parse_in_file(&self.content, self.path.as_str(), self.file_id);
        self.unit = Some(outcome.unit);
        self.has_errors = outcome.had_error;
        self.error_count = outcome.error_count;
        self.diagnostics = outcome.diagnostics;
        debug!(
            path = %self.path,
            version = self.version,
            errors = self.error_count,
            "parsed source file"
        );
    }

    // ========================================================================
    // Edits
    // ========================================================================

    /// Applies a batch of text changes and re-parses.
    ///
    /// If any change is a full-document replacement, the last such change
    /// wins and range changes in the batch are ignored. Otherwise every
    /// range is resolved and validated against the current content first;
    /// the changes are then spliced back to front (sorted by start
    /// position descending). Overlapping ranges fail with
    /// [`DocumentError::InvalidRange`], positions outside the document
    /// with [`DocumentError::InvalidPosition`], and on any failure the
    /// content and version are untouched.
    pub fn apply_text_changes(
        &mut self,
        changes: &[TextChange],
        new_version: i32,
    ) -> Result<(), DocumentError> {
        if changes.is_empty() {
            self.version = new_version;
            return Ok(());
        }

        if let Some(full) = changes.iter().rev().find(|change| change.range.is_none()) {
            self.content.clone_from(&full.text);
            self.version = new_version;
            self.reparse();
            return Ok(());
        }

        // Resolve every range against the unmodified content.
        let mut splices = Vec::with_capacity(changes.len());
        for change in changes {
            let range = change.range.as_ref().ok_or(DocumentError::InvalidRange)?;
            let start = resolve_position(&self.content, range.start)?;
            let end = resolve_position(&self.content, range.end)?;
            if start > end || end > self.content.len() {
                return Err(DocumentError::InvalidRange);
            }
            splices.push((start, end, change.text.as_str()));
        }

        // Back to front, so earlier splices don't shift later offsets.
        splices.sort_by(|a, b| b.0.cmp(&a.0));
        for window in splices.windows(2) {
            let (later_start, _, _) = window[0];
            let (_, earlier_end, _) = window[1];
            if earlier_end > later_start {
                return Err(DocumentError::InvalidRange);
            }
        }

        for (start, end, text) in splices {
            self.content.replace_range(start..end, text);
        }
        self.version = new_version;
        self.reparse();
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Returns completions at a position.
    ///
    /// The position is currently accepted and ignored: the completion set
    /// is the fixed keyword list. The signature is the seam for
    /// position-aware suggestions.
    pub fn completions_at(&self, _position: Position) -> Result<Vec<Completion>, DocumentError> {
        if self.unit.is_none() {
            return Err(DocumentError::NoAstDefined);
        }
        Ok(COMPLETION_KEYWORDS
            .iter()
            .map(|keyword| Completion::new(*keyword, CompletionKind::Keyword))
            .collect())
    }

    /// Returns hover information for the node at a position.
    pub fn hover_info(&self, position: Position) -> Result<HoverInfo, DocumentError> {
        let unit = self.unit.as_ref().ok_or(DocumentError::NoAstDefined)?;
        let id = unit
            .find_node_at_position(position)
            .ok_or(DocumentError::InvalidPosition)?;
        let node = unit.ast().node(id);
        let contents = match &node.kind {
            NodeKind::Identifier { name } => eco_format!("Identifier: {name}"),
            NodeKind::Function { name, .. } => eco_format!("Function: {name}"),
            NodeKind::Struct { name, .. } => eco_format!("Struct: {name}"),
            kind => eco_format!("AST Node: {}", kind.kind_name()),
        };
        Ok(HoverInfo::new(contents, node.span))
    }
}

/// Resolves a line/column position to a byte offset in `content`.
///
/// The column clamps to the end of its line (the text before the first
/// `'\n'` at or after the line start). A line past the last line of the
/// content is an [`DocumentError::InvalidPosition`].
fn resolve_position(content: &str, position: Position) -> Result<usize, DocumentError> {
    let mut line_start = 0usize;
    let mut line = 0u32;
    if position.line > 0 {
        for (i, byte) in content.bytes().enumerate() {
            if byte == b'\n' {
                line += 1;
                if line == position.line {
                    line_start = i + 1;
                    break;
                }
            }
        }
        if line < position.line {
            return Err(DocumentError::InvalidPosition);
        }
    }

    let line_end = content[line_start..]
        .find('\n')
        .map_or(content.len(), |i| line_start + i);
    Ok((line_start + position.column as usize).min(line_end))
}
