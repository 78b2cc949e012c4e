// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Source location tracking.
//!
//! Every token and AST node carries a [`Span`]: which file it came from,
//! where it starts, and how many bytes it covers. The half-open byte range
//! `[start, start + len)` is what position queries test against, and the
//! file id is what keeps node lookups from ever mixing documents.

use std::ops::Range;

/// Identifies a source file within a [`Project`](crate::Project).
///
/// File ids are assigned by the project when a file is opened and are never
/// reused. A span produced by a standalone parse (no project) carries
/// [`FileId::UNASSIGNED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FileId(pub u32);

impl FileId {
    /// Sentinel for spans created outside a project.
    pub const UNASSIGNED: FileId = FileId(0);

    /// Creates a new file id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// A half-open byte range `[start, start + len)` within one source file.
///
/// Stored as start plus length rather than a start/end pair: the length is
/// what slicing and emptiness checks want, and the end offset is derived.
/// The empty span at end-of-file is legal; the parser also uses zero-length
/// spans for synthesized recovery nodes.
///
/// # Examples
///
/// ```
/// use sable_core::source_analysis::Span;
///
/// // The "std" segment of `import std::io;`.
/// let span = Span::new(7, 10);
/// assert_eq!(span.len(), 3);
/// assert!(span.contains_offset(7));
/// assert!(!span.contains_offset(10));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    file: FileId,
    start: u32,
    len: u32,
}

impl Span {
    /// Creates a span from start and end byte offsets, outside any file.
    ///
    /// Requires `start <= end`.
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self::in_file(FileId::UNASSIGNED, start, end)
    }

    /// Creates a span from start and end byte offsets within a file.
    ///
    /// Requires `start <= end`.
    #[must_use]
    pub const fn in_file(file: FileId, start: u32, end: u32) -> Self {
        Self {
            file,
            start,
            len: end - start,
        }
    }

    /// Creates the empty span at the given offset.
    #[must_use]
    pub const fn empty(file: FileId, offset: u32) -> Self {
        Self {
            file,
            start: offset,
            len: 0,
        }
    }

    /// Returns the id of the owning file.
    #[must_use]
    pub const fn file(self) -> FileId {
        self.file
    }

    /// Returns the start byte offset.
    #[must_use]
    pub const fn start(self) -> u32 {
        self.start
    }

    /// Returns the end byte offset (exclusive).
    #[must_use]
    pub const fn end(self) -> u32 {
        self.start + self.len
    }

    /// Returns the number of bytes covered.
    #[must_use]
    pub const fn len(self) -> usize {
        self.len as usize
    }

    /// Returns true if the span covers no bytes.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Returns true if the half-open range contains the given byte offset.
    ///
    /// An empty span contains nothing, not even its own start offset.
    #[must_use]
    pub const fn contains_offset(self, offset: u32) -> bool {
        self.start <= offset && offset < self.end()
    }

    /// Returns the smallest span covering both `self` and `other`.
    ///
    /// The parser grows node spans with this as it folds children in, so
    /// both spans must come from the same file; covering across files is a
    /// construction bug, not a recoverable condition.
    #[must_use]
    pub fn cover(self, other: Self) -> Self {
        debug_assert_eq!(
            self.file, other.file,
            "cannot cover spans from different files"
        );
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        Self {
            file: self.file,
            start,
            len: end - start,
        }
    }

    /// Returns the `Range<usize>` for slicing the owning file's text.
    #[must_use]
    pub const fn byte_range(self) -> Range<usize> {
        self.start as usize..(self.start + self.len) as usize
    }
}
