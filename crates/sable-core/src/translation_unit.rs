// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The parsed form of one source file.
//!
//! A [`TranslationUnit`] bundles the AST arena with the file's line map and
//! answers the position queries every IDE feature is built on:
//! offset ⇄ line/column conversion and node-at-position lookup.
//!
//! # Line map
//!
//! The line map is built once at construction: `line_map[L]` is the byte
//! offset where line `L` begins, so `line_map[0] == 0` and every `'\n'` at
//! byte `i` contributes `i + 1`. Offset → position lookup is a binary
//! search; position → offset is one index plus a clamp.

use ecow::EcoString;

use crate::ast::{Ast, NodeId, NodeKind};
use crate::language_service::Position;

/// The root of a parsed file: AST arena, line map, and position queries.
///
/// Node ids handed out by the queries are valid until the owning
/// [`SourceFile`](crate::SourceFile) is edited or closed; a re-parse
/// replaces the whole unit.
#[derive(Debug)]
pub struct TranslationUnit {
    /// The file this unit was parsed from.
    file_name: EcoString,
    /// The node arena; owns every node for the life of the unit.
    ast: Ast,
    /// The `TranslationUnit` node.
    root: NodeId,
    /// Byte offset of each line start.
    line_map: Vec<u32>,
    /// Length of the source text in bytes.
    source_len: u32,
}

impl TranslationUnit {
    /// Builds a unit over a freshly parsed arena, constructing the line
    /// map from the source text.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "line starts are stored as u32 byte offsets"
    )]
    pub(crate) fn new(file_name: &str, source: &str, ast: Ast, root: NodeId) -> Self {
        let mut line_map = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_map.push(i as u32 + 1);
            }
        }
        Self {
            file_name: file_name.into(),
            ast,
            root,
            line_map,
            source_len: source.len() as u32,
        }
    }

    /// Returns the name of the file this unit was parsed from.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the node arena.
    #[must_use]
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Returns the root node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the top-level declarations in source order.
    #[must_use]
    pub fn declarations(&self) -> &[NodeId] {
        match &self.ast.node(self.root).kind {
            NodeKind::TranslationUnit { declarations } => declarations,
            _ => &[],
        }
    }

    /// Returns the line map: byte offsets of line starts.
    #[must_use]
    pub fn line_map(&self) -> &[u32] {
        &self.line_map
    }

    /// Returns the number of lines (always at least one).
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_map.len()
    }

    /// Returns the source length in bytes.
    #[must_use]
    pub fn source_len(&self) -> u32 {
        self.source_len
    }

    // ========================================================================
    // Position Mapping
    // ========================================================================

    /// Converts a byte offset to a line/column position.
    ///
    /// The line is the greatest `L` with `line_map[L] <= offset`; the
    /// column is the byte distance from that line's start.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "line counts are bounded by the u32 source length"
    )]
    pub fn offset_to_position(&self, offset: u32) -> Position {
        let line = self.line_map.partition_point(|&start| start <= offset) - 1;
        Position::new(line as u32, offset - self.line_map[line])
    }

    /// Converts a line/column position to a byte offset.
    ///
    /// A line past the end of the document clamps to the source length, as
    /// does a column past the end of the text. This clamping is
    /// load-bearing for protocol positions past end-of-line.
    #[must_use]
    pub fn position_to_offset(&self, position: Position) -> u32 {
        let line = position.line as usize;
        if line >= self.line_map.len() {
            return self.source_len;
        }
        (self.line_map[line] + position.column).min(self.source_len)
    }

    // ========================================================================
    // Node Lookup
    // ========================================================================

    /// Finds the most specific node whose half-open span contains the
    /// position, or `None`. Equivalent to
    /// `find_node_at_offset(position_to_offset(position))`.
    #[must_use]
    pub fn find_node_at_position(&self, position: Position) -> Option<NodeId> {
        self.find_node_at_offset(self.position_to_offset(position))
    }

    /// Finds the most specific node whose half-open span contains the byte
    /// offset, or `None`.
    ///
    /// The root itself is never returned: the search starts at the
    /// top-level declarations and takes the first one that produces a hit.
    /// Within a node, every child is tried in structural order and the
    /// last-visited hit wins, which makes zero-width overlaps
    /// deterministic.
    #[must_use]
    pub fn find_node_at_offset(&self, offset: u32) -> Option<NodeId> {
        for &declaration in self.declarations() {
            if let Some(hit) = self.find_in(declaration, offset) {
                return Some(hit);
            }
        }
        None
    }

    fn find_in(&self, id: NodeId, offset: u32) -> Option<NodeId> {
        if !self.ast.node(id).span.contains_offset(offset) {
            return None;
        }
        let mut best_child = None;
        for child in self.ast.children(id) {
            if let Some(hit) = self.find_in(child, offset) {
                best_child = Some(hit);
            }
        }
        Some(best_child.unwrap_or(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::parse;

    fn unit(source: &str) -> TranslationUnit {
        parse(source, "test.sb").unit
    }

    #[test]
    fn line_map_shape() {
        let unit = unit("import std::io;\nstruct Point {\n  int x;\n  int y;\n}");
        assert_eq!(unit.line_map(), &[0, 16, 31, 40, 49]);
        assert_eq!(unit.line_count(), 5);
    }

    #[test]
    fn line_map_of_empty_source() {
        let unit = unit("");
        assert_eq!(unit.line_map(), &[0]);
        assert_eq!(unit.line_count(), 1);
    }

    #[test]
    fn offset_to_position_examples() {
        let unit = unit("import std::io;\nstruct Point {\n  int x;\n  int y;\n}");
        assert_eq!(unit.offset_to_position(0), Position::new(0, 0));
        assert_eq!(unit.offset_to_position(15), Position::new(0, 15));
        assert_eq!(unit.offset_to_position(16), Position::new(1, 0));
        assert_eq!(unit.offset_to_position(23), Position::new(1, 7));
        assert_eq!(unit.offset_to_position(48), Position::new(4, 0));
    }

    #[test]
    fn position_to_offset_clamps() {
        let source = "ab\ncd";
        let unit = unit(source);
        assert_eq!(unit.position_to_offset(Position::new(0, 0)), 0);
        assert_eq!(unit.position_to_offset(Position::new(1, 1)), 4);
        // Line past the end clamps to the source length.
        assert_eq!(unit.position_to_offset(Position::new(9, 0)), 5);
        // Column past the end clamps to the source length.
        assert_eq!(unit.position_to_offset(Position::new(1, 99)), 5);
    }

    #[test]
    fn offset_round_trip() {
        let source = "import std::io;\nstruct Point {\n  int x;\n}";
        let unit = unit(source);
        for offset in 0..=u32::try_from(source.len()).expect("fits") {
            let position = unit.offset_to_position(offset);
            assert_eq!(
                unit.position_to_offset(position),
                offset,
                "round trip failed at offset {offset}"
            );
        }
    }

    #[test]
    fn position_round_trip() {
        let source = "fn int f() {\n  return 1;\n}\n";
        let unit = unit(source);
        let lines: Vec<&str> = source.split('\n').collect();
        for (line, text) in lines.iter().enumerate() {
            for column in 0..=text.len() {
                let position =
                    Position::new(u32::try_from(line).expect("fits"), u32::try_from(column).expect("fits"));
                let offset = unit.position_to_offset(position);
                assert_eq!(
                    unit.offset_to_position(offset),
                    position,
                    "round trip failed at {position}"
                );
            }
        }
    }

    #[test]
    fn node_at_import_identifier() {
        // Column 7 is the 's' of "std".
        let unit = unit("import std::io;");
        let hit = unit
            .find_node_at_position(Position::new(0, 7))
            .expect("node at position");
        let node = unit.ast().node(hit);
        assert!(
            matches!(&node.kind, NodeKind::Identifier { name } if name == "std"),
            "expected the `std` identifier, got {:?}",
            node.kind
        );
    }

    #[test]
    fn node_between_segments_is_the_import() {
        // Offset 10 is the first ':' of '::' — inside the import but not
        // inside any identifier.
        let unit = unit("import std::io;");
        let hit = unit.find_node_at_offset(10).expect("node at offset");
        assert!(matches!(
            unit.ast().node(hit).kind,
            NodeKind::Import { .. }
        ));
    }

    #[test]
    fn root_is_never_returned() {
        let unit = unit("import std::io;   ");
        // Offset 16 is trailing whitespace: inside the root span but no
        // declaration covers it.
        assert_eq!(unit.find_node_at_offset(16), None);
    }

    #[test]
    fn identifier_first_byte_resolves_to_identifier() {
        let source = "struct Point { int x; }";
        let outcome = parse(source, "test.sb");
        let unit = &outcome.unit;
        // Byte 19 is 'x'.
        let hit = unit.find_node_at_offset(19).expect("node");
        // The most specific node containing the member name is the member;
        // its name is not a separate child node.
        assert!(matches!(
            unit.ast().node(hit).kind,
            NodeKind::StructMember { .. }
        ));
    }

    #[test]
    fn deepest_match_wins() {
        let source = "int r = 1 + inner;";
        let unit = unit(source);
        // Byte 12 is the 'i' of `inner`, nested inside variable > binary.
        let hit = unit.find_node_at_offset(12).expect("node");
        assert!(
            matches!(&unit.ast().node(hit).kind, NodeKind::Identifier { name } if name == "inner")
        );
    }

    #[test]
    fn offset_outside_any_declaration() {
        let unit = unit("import std::io;");
        assert_eq!(unit.find_node_at_offset(15), None); // at EOF, past the ';'
    }
}
