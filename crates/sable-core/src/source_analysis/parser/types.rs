// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Type parsing for Sable.
//!
//! A type is a leading name (`int`, `Point`, `MAX_ALIGN`) followed by any
//! number of `*` pointer and `[len?]` array suffixes, or a `fn Type(args)`
//! function type. Absence is not an error here; callers treat `None` as
//! "missing type" and report in their own context.

use ecow::EcoString;

use crate::ast::{NodeId, NodeKind};
use crate::source_analysis::TokenKind;

use super::Parser;

impl Parser<'_> {
    /// Parses a type, or returns `None` without consuming anything when the
    /// current token cannot begin one.
    pub(super) fn parse_type(&mut self) -> Option<NodeId> {
        self.skip_trivia();

        if self.current_token().is_keyword("fn") {
            self.advance();
            return Some(self.parse_function_type());
        }

        if !self.current_kind().is_type_start() {
            return None;
        }
        let span = self.current_token().span();
        let name: EcoString = self.current_token().lexeme().into();
        self.advance();
        let mut ty = self.ast_mut().alloc(NodeKind::TypeIdentifier { name }, span);

        // Pointer and array suffixes bind left to right: `int*[4]` is an
        // array of four pointers.
        loop {
            self.skip_horizontal_trivia();
            match self.current_kind() {
                TokenKind::Star => {
                    self.advance();
                    let span = self
                        .ast_mut()
                        .node(ty)
                        .span
                        .cover(self.previous_token().span());
                    let pointer = self
                        .ast_mut()
                        .alloc(NodeKind::PointerType { pointee: ty }, span);
                    self.ast_mut().adopt_children(pointer);
                    ty = pointer;
                }
                TokenKind::LBracket => {
                    self.advance();
                    self.skip_trivia();
                    let size = if self.current_kind() == TokenKind::RBracket {
                        None
                    } else {
                        Some(self.parse_expression())
                    };
                    self.skip_trivia();
                    self.expect(TokenKind::RBracket, "Expected ']' in array type");
                    let span = self
                        .ast_mut()
                        .node(ty)
                        .span
                        .cover(self.previous_token().span());
                    let array = self
                        .ast_mut()
                        .alloc(NodeKind::ArrayType { element: ty, size }, span);
                    self.ast_mut().adopt_children(array);
                    ty = array;
                }
                _ => break,
            }
        }

        Some(ty)
    }

    /// Parses `fn Type ( TypeList )`. The `fn` keyword has been consumed.
    fn parse_function_type(&mut self) -> NodeId {
        let start = self.previous_token().span();

        let return_type = self.parse_type();
        if return_type.is_none() {
            self.error_at_current("Expected return type in function type");
        }

        self.skip_trivia();
        let mut parameters = Vec::new();
        if self.match_kind(TokenKind::LParen) {
            loop {
                self.skip_trivia();
                if self.current_kind() == TokenKind::RParen || self.is_at_end() {
                    break;
                }
                match self.parse_type() {
                    Some(parameter) => parameters.push(parameter),
                    None => {
                        self.error_at_current("Expected parameter type");
                        break;
                    }
                }
                self.skip_trivia();
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen, "Expected ')' in function type");
        } else {
            self.error_at_current("Expected '(' in function type");
        }

        let span = start.cover(self.previous_token().span());
        let node = self.ast_mut().alloc(
            NodeKind::FunctionType {
                return_type,
                parameters,
            },
            span,
        );
        self.ast_mut().adopt_children(node);
        node
    }
}
