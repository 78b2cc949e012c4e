// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Declaration parsing for Sable.
//!
//! This module handles top-level declarations: imports, modules, functions,
//! structs and unions, enums, constants, and the variable-declaration
//! fallthrough. Keywords are matched by lexeme on `Ident` tokens because
//! Sable does not reserve them lexically; the keyword is consumed before
//! dispatching to the individual parser, which reads it back from
//! `previous`.

use ecow::EcoString;

use crate::ast::{NodeId, NodeKind};
use crate::source_analysis::TokenKind;

use super::Parser;

impl Parser<'_> {
    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Parses one top-level declaration.
    ///
    /// Returns `None` when nothing could be made of the current token; the
    /// entry loop's livelock guard then forces progress.
    pub(super) fn parse_declaration(&mut self) -> Option<NodeId> {
        self.skip_trivia();

        if self.match_keyword("import") {
            return Some(self.parse_import());
        }
        if self.match_keyword("module") {
            return Some(self.parse_module());
        }
        if self.match_keyword("fn") {
            return Some(self.parse_function());
        }
        if self.match_keyword("struct") || self.match_keyword("union") {
            return Some(self.parse_struct());
        }
        if self.match_keyword("enum") {
            return Some(self.parse_enum());
        }
        if self.match_keyword("const") {
            return Some(self.parse_constant());
        }
        if self.match_keyword("typedef") {
            return Some(self.parse_typedef());
        }

        self.parse_variable_declaration()
    }

    /// Takes the current token as a name if it is any identifier class
    /// accepted for type-like names (`Ident`, `TypeIdent`, `ConstIdent`).
    fn take_name(&mut self) -> Option<EcoString> {
        if self.current_kind().is_type_start() {
            let name: EcoString = self.current_token().lexeme().into();
            self.advance();
            Some(name)
        } else {
            None
        }
    }

    // ========================================================================
    // Imports and Modules
    // ========================================================================

    /// Parses `import path (',' path)* ';'` where each path is a
    /// `::`-separated identifier chain. The `import` keyword has already
    /// been consumed.
    ///
    /// Each path segment becomes an [`NodeKind::Identifier`] child of the
    /// import, in source order. The final `;` extends the import's span.
    pub(super) fn parse_import(&mut self) -> NodeId {
        let start = self.previous_token().span();
        let mut segments = Vec::new();
        let mut end = start;

        loop {
            if !self.parse_import_path(&mut segments, &mut end) {
                break;
            }
            self.skip_horizontal_trivia();
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }

        self.skip_horizontal_trivia();
        if self.match_kind(TokenKind::Semicolon) {
            end = end.cover(self.previous_token().span());
        } else {
            self.error_at_current("Expected ';' after import");
        }

        let node = self
            .ast_mut()
            .alloc(NodeKind::Import { segments }, start.cover(end));
        self.ast_mut().adopt_children(node);
        node
    }

    /// Parses one `a::b::c` path, appending segment identifier nodes.
    /// Returns false after synchronizing on a malformed path.
    fn parse_import_path(
        &mut self,
        segments: &mut Vec<NodeId>,
        end: &mut crate::source_analysis::Span,
    ) -> bool {
        self.skip_trivia();
        let Some(segment) = self.path_segment() else {
            self.error_at_current("Expected identifier in import path");
            self.synchronize();
            return false;
        };
        *end = end.cover(self.previous_token().span());
        segments.push(segment);

        loop {
            self.skip_horizontal_trivia();
            if !self.match_kind(TokenKind::ColonColon) {
                return true;
            }
            self.skip_trivia();
            let Some(segment) = self.path_segment() else {
                self.error_at_current("Expected identifier after '::'");
                self.synchronize();
                return false;
            };
            *end = end.cover(self.previous_token().span());
            segments.push(segment);
        }
    }

    /// Consumes one path segment into an identifier node.
    fn path_segment(&mut self) -> Option<NodeId> {
        if !self.current_kind().is_type_start() {
            return None;
        }
        let span = self.current_token().span();
        let name: EcoString = self.current_token().lexeme().into();
        self.advance();
        Some(self.ast_mut().alloc(NodeKind::Identifier { name }, span))
    }

    /// Parses `module a::b::c ;`. The `module` keyword has been consumed.
    fn parse_module(&mut self) -> NodeId {
        let start = self.previous_token().span();
        let mut segments = Vec::new();
        let mut end = start;

        self.parse_import_path(&mut segments, &mut end);

        self.skip_horizontal_trivia();
        if self.match_kind(TokenKind::Semicolon) {
            end = end.cover(self.previous_token().span());
        } else {
            self.error_at_current("Expected ';' after module path");
        }

        let node = self
            .ast_mut()
            .alloc(NodeKind::Module { segments }, start.cover(end));
        self.ast_mut().adopt_children(node);
        node
    }

    // ========================================================================
    // Structs and Unions
    // ========================================================================

    /// Parses `struct Name { members }` or `union Name { members }`.
    /// The keyword has been consumed; `previous` tells which one it was.
    pub(super) fn parse_struct(&mut self) -> NodeId {
        let start = self.previous_token().span();
        let is_union = self.previous_token().lexeme() == "union";

        self.skip_trivia();
        let Some(name) = self.take_name() else {
            self.error_at_current("Expected struct name");
            let node = self.ast_mut().alloc(
                NodeKind::Struct {
                    name: "<missing>".into(),
                    is_union,
                    members: Vec::new(),
                },
                start,
            );
            self.synchronize();
            return node;
        };

        self.skip_trivia();
        if !self.match_kind(TokenKind::LBrace) {
            self.error_at_current("Expected '{' after struct name");
            let span = start.cover(self.previous_token().span());
            let node = self.ast_mut().alloc(
                NodeKind::Struct {
                    name,
                    is_union,
                    members: Vec::new(),
                },
                span,
            );
            self.synchronize();
            return node;
        }

        let mut members = Vec::new();
        loop {
            self.skip_trivia();
            if self.current_kind() == TokenKind::RBrace || self.is_at_end() {
                break;
            }
            let consumed_before = self.consumed;
            if let Some(member) = self.parse_struct_member() {
                members.push(member);
            }
            if self.consumed == consumed_before && !self.is_at_end() {
                // Recovery stalled on this token; drop it and move on.
                self.advance();
            }
        }

        self.close_brace("Expected '}' after struct body");

        let span = start.cover(self.previous_token().span());
        let node = self.ast_mut().alloc(
            NodeKind::Struct {
                name,
                is_union,
                members,
            },
            span,
        );
        self.ast_mut().adopt_children(node);
        node
    }

    /// Parses one `inline? Type name ;` struct member. On any missing
    /// element the member is discarded and the parser synchronizes.
    fn parse_struct_member(&mut self) -> Option<NodeId> {
        self.skip_trivia();
        let start = self.current_token().span();

        let is_inline = self.match_keyword("inline");
        if is_inline {
            self.skip_trivia();
        }

        let Some(ty) = self.parse_type() else {
            self.error_at_current("Expected member type");
            self.synchronize();
            return None;
        };

        self.skip_trivia();
        if self.current_kind() != TokenKind::Ident {
            self.error_at_current("Expected member name");
            self.synchronize();
            return None;
        }
        let name: EcoString = self.current_token().lexeme().into();
        self.advance();

        self.skip_horizontal_trivia();
        if !self.match_kind(TokenKind::Semicolon) {
            self.error_at_current("Expected ';' after struct member");
            self.synchronize();
            return None;
        }

        let span = start.cover(self.previous_token().span());
        let node = self.ast_mut().alloc(
            NodeKind::StructMember {
                name,
                ty: Some(ty),
                is_inline,
            },
            span,
        );
        self.ast_mut().adopt_children(node);
        Some(node)
    }

    /// Consumes a closing `}`, scanning forward for it when missing.
    /// Leaves panic mode clear either way.
    fn close_brace(&mut self, message: &str) {
        if self.match_kind(TokenKind::RBrace) {
            return;
        }
        self.error_at_current(message);
        while !self.is_at_end() && self.current_kind() != TokenKind::RBrace {
            self.advance();
        }
        self.match_kind(TokenKind::RBrace);
        self.clear_panic();
    }

    // ========================================================================
    // Functions
    // ========================================================================

    /// Parses `fn Type name(params) body`. The `fn` keyword has been
    /// consumed.
    fn parse_function(&mut self) -> NodeId {
        let start = self.previous_token().span();

        self.skip_trivia();
        let return_type = self.parse_type();
        if return_type.is_none() {
            self.error_at_current("Expected return type");
        }

        self.skip_trivia();
        let name: EcoString = if self.current_kind() == TokenKind::Ident {
            let name = self.current_token().lexeme().into();
            self.advance();
            name
        } else {
            self.error_at_current("Expected function name");
            let span = start.cover(self.previous_token().span());
            let node = self.ast_mut().alloc(
                NodeKind::Function {
                    name: "<missing>".into(),
                    return_type,
                    parameters: Vec::new(),
                    body: None,
                },
                span,
            );
            self.ast_mut().adopt_children(node);
            self.synchronize();
            return node;
        };

        self.skip_trivia();
        let mut parameters = Vec::new();
        if self.match_kind(TokenKind::LParen) {
            loop {
                self.skip_trivia();
                if self.current_kind() == TokenKind::RParen || self.is_at_end() {
                    break;
                }
                let consumed_before = self.consumed;
                if let Some(parameter) = self.parse_parameter() {
                    parameters.push(parameter);
                }
                self.skip_horizontal_trivia();
                if self.match_kind(TokenKind::Comma) {
                    continue;
                }
                if self.consumed == consumed_before {
                    break;
                }
            }
            if !self.match_kind(TokenKind::RParen) {
                self.error_at_current("Expected ')' after parameters");
            }
        } else {
            self.error_at_current("Expected '(' after function name");
        }

        self.skip_trivia();
        let body = if self.current_kind() == TokenKind::LBrace {
            Some(self.parse_compound_statement())
        } else {
            self.error_at_current("Expected function body");
            self.synchronize();
            None
        };

        let span = start.cover(self.previous_token().span());
        let node = self.ast_mut().alloc(
            NodeKind::Function {
                name,
                return_type,
                parameters,
                body,
            },
            span,
        );
        self.ast_mut().adopt_children(node);
        node
    }

    /// Parses one `Type name` parameter.
    fn parse_parameter(&mut self) -> Option<NodeId> {
        let start = self.current_token().span();
        let Some(ty) = self.parse_type() else {
            self.error_at_current("Expected parameter type");
            return None;
        };
        self.skip_trivia();
        if self.current_kind() != TokenKind::Ident {
            self.error_at_current("Expected parameter name");
            return None;
        }
        let name: EcoString = self.current_token().lexeme().into();
        self.advance();

        let span = start.cover(self.previous_token().span());
        let node = self
            .ast_mut()
            .alloc(NodeKind::Parameter { name, ty: Some(ty) }, span);
        self.ast_mut().adopt_children(node);
        Some(node)
    }

    // ========================================================================
    // Enums
    // ========================================================================

    /// Parses `enum Name { Variant (= expr)? , ... }`. The `enum` keyword
    /// has been consumed.
    fn parse_enum(&mut self) -> NodeId {
        let start = self.previous_token().span();

        self.skip_trivia();
        let Some(name) = self.take_name() else {
            self.error_at_current("Expected enum name");
            let node = self.ast_mut().alloc(
                NodeKind::Enum {
                    name: "<missing>".into(),
                    variants: Vec::new(),
                },
                start,
            );
            self.synchronize();
            return node;
        };

        self.skip_trivia();
        if !self.match_kind(TokenKind::LBrace) {
            self.error_at_current("Expected '{' after enum name");
            let span = start.cover(self.previous_token().span());
            let node = self.ast_mut().alloc(
                NodeKind::Enum {
                    name,
                    variants: Vec::new(),
                },
                span,
            );
            self.synchronize();
            return node;
        }

        let mut variants = Vec::new();
        loop {
            self.skip_trivia();
            if self.current_kind() == TokenKind::RBrace || self.is_at_end() {
                break;
            }

            let Some(variant_name) = self.take_name() else {
                self.error_at_current("Expected enum variant");
                self.synchronize();
                if self.current_kind() != TokenKind::RBrace && !self.is_at_end() {
                    self.advance();
                }
                continue;
            };
            let variant_start = self.previous_token().span();

            self.skip_horizontal_trivia();
            let value = if self.match_kind(TokenKind::Eq) {
                self.skip_trivia();
                Some(self.parse_expression())
            } else {
                None
            };

            let span = variant_start.cover(self.previous_token().span());
            let variant = self.ast_mut().alloc(
                NodeKind::EnumVariant {
                    name: variant_name,
                    value,
                },
                span,
            );
            self.ast_mut().adopt_children(variant);
            variants.push(variant);

            self.skip_trivia();
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }

        self.close_brace("Expected '}' after enum body");

        let span = start.cover(self.previous_token().span());
        let node = self.ast_mut().alloc(NodeKind::Enum { name, variants }, span);
        self.ast_mut().adopt_children(node);
        node
    }

    // ========================================================================
    // Constants and Variables
    // ========================================================================

    /// Parses `const Type? NAME = expr ;`. The `const` keyword has been
    /// consumed. The type may be omitted when the name is written in
    /// constant case (`const MAX = 100;`).
    pub(super) fn parse_constant(&mut self) -> NodeId {
        let start = self.previous_token().span();
        self.skip_trivia();

        let (name, ty): (EcoString, Option<NodeId>) =
            if self.current_kind() == TokenKind::ConstIdent {
                let name = self.current_token().lexeme().into();
                self.advance();
                (name, None)
            } else {
                let Some(ty) = self.parse_type() else {
                    self.error_at_current("Expected constant name or type");
                    let node = self.ast_mut().alloc(
                        NodeKind::Constant {
                            name: "<missing>".into(),
                            ty: None,
                            initializer: None,
                        },
                        start,
                    );
                    self.synchronize();
                    return node;
                };
                self.skip_trivia();
                if self.current_kind().is_identifier() {
                    let name = self.current_token().lexeme().into();
                    self.advance();
                    (name, Some(ty))
                } else {
                    self.error_at_current("Expected constant name");
                    let span = start.cover(self.previous_token().span());
                    let node = self.ast_mut().alloc(
                        NodeKind::Constant {
                            name: "<missing>".into(),
                            ty: Some(ty),
                            initializer: None,
                        },
                        span,
                    );
                    self.ast_mut().adopt_children(node);
                    self.synchronize();
                    return node;
                }
            };

        self.skip_horizontal_trivia();
        let initializer = if self.match_kind(TokenKind::Eq) {
            self.skip_trivia();
            Some(self.parse_expression())
        } else {
            self.error_at_current("Expected '=' in constant declaration");
            None
        };

        self.expect_statement_terminator("Expected ';' after constant");

        let span = start.cover(self.previous_token().span());
        let node = self.ast_mut().alloc(
            NodeKind::Constant {
                name,
                ty,
                initializer,
            },
            span,
        );
        self.ast_mut().adopt_children(node);
        node
    }

    /// Parses `typedef Name = Type ;`. The `typedef` keyword has been
    /// consumed.
    fn parse_typedef(&mut self) -> NodeId {
        let start = self.previous_token().span();

        self.skip_trivia();
        let Some(name) = self.take_name() else {
            self.error_at_current("Expected typedef name");
            let node = self.ast_mut().alloc(
                NodeKind::Typedef {
                    name: "<missing>".into(),
                    ty: None,
                },
                start,
            );
            self.synchronize();
            return node;
        };

        self.skip_horizontal_trivia();
        let ty = if self.match_kind(TokenKind::Eq) {
            let ty = self.parse_type();
            if ty.is_none() {
                self.error_at_current("Expected type in typedef");
            }
            ty
        } else {
            self.error_at_current("Expected '=' in typedef");
            None
        };

        self.expect_statement_terminator("Expected ';' after typedef");

        let span = start.cover(self.previous_token().span());
        let node = self.ast_mut().alloc(NodeKind::Typedef { name, ty }, span);
        self.ast_mut().adopt_children(node);
        node
    }

    /// Parses the declaration fallthrough: `Type name (= expr)? ;`.
    ///
    /// Returns `None` without consuming anything when the current token
    /// cannot begin a type.
    fn parse_variable_declaration(&mut self) -> Option<NodeId> {
        self.skip_trivia();
        let start = self.current_token().span();

        let Some(ty) = self.parse_type() else {
            self.error_at_current("Expected declaration");
            return None;
        };

        self.skip_trivia();
        let name: EcoString = if self.current_kind() == TokenKind::Ident {
            let name = self.current_token().lexeme().into();
            self.advance();
            name
        } else {
            self.error_at_current("Expected variable name");
            let span = start.cover(self.previous_token().span());
            let node = self.ast_mut().alloc(
                NodeKind::Variable {
                    name: "<missing>".into(),
                    ty: Some(ty),
                    initializer: None,
                },
                span,
            );
            self.ast_mut().adopt_children(node);
            return Some(node);
        };

        self.skip_horizontal_trivia();
        let initializer = if self.match_kind(TokenKind::Eq) {
            self.skip_trivia();
            Some(self.parse_expression())
        } else {
            None
        };

        self.expect_statement_terminator("Expected ';' after declaration");

        let span = start.cover(self.previous_token().span());
        let node = self.ast_mut().alloc(
            NodeKind::Variable {
                name,
                ty: Some(ty),
                initializer,
            },
            span,
        );
        self.ast_mut().adopt_children(node);
        Some(node)
    }
}
