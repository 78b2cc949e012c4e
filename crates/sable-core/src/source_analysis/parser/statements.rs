// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Statement parsing for Sable.
//!
//! Statement keywords (`return`, `if`, `while`, ...) are ordinary
//! identifiers matched by lexeme. A statement without a `;` recovers
//! silently when the next token is a block delimiter, a newline, end of
//! input, or a statement/declaration keyword; Sable treats those as
//! implicit terminators.

use ecow::EcoString;

use crate::ast::{NodeId, NodeKind};
use crate::source_analysis::TokenKind;

use super::{Parser, is_sync_keyword};

impl Parser<'_> {
    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Parses one statement.
    ///
    /// Returns `None` when the statement slot is empty: the current token
    /// closes the surrounding block or ends the input.
    pub(super) fn parse_statement(&mut self) -> Option<NodeId> {
        self.skip_trivia();

        if matches!(self.current_kind(), TokenKind::RBrace | TokenKind::Eof) {
            return None;
        }

        if self.current_kind() == TokenKind::LBrace {
            return Some(self.parse_compound_statement());
        }

        if self.current_kind() == TokenKind::Ident {
            match self.current_token().lexeme() {
                "return" => {
                    self.advance();
                    return Some(self.parse_return());
                }
                "if" => {
                    self.advance();
                    return Some(self.parse_if());
                }
                "while" => {
                    self.advance();
                    return Some(self.parse_while());
                }
                "for" => {
                    self.advance();
                    return Some(self.parse_for());
                }
                "foreach" => {
                    self.advance();
                    return Some(self.parse_foreach());
                }
                "switch" => {
                    self.advance();
                    return Some(self.parse_switch());
                }
                "break" => {
                    self.advance();
                    return Some(self.parse_break());
                }
                "continue" => {
                    self.advance();
                    return Some(self.parse_continue());
                }
                "defer" => {
                    self.advance();
                    return Some(self.parse_defer());
                }
                "assert" => {
                    self.advance();
                    return Some(self.parse_assert());
                }
                "const" => {
                    self.advance();
                    let constant = self.parse_constant();
                    return Some(self.wrap_declaration(constant));
                }
                _ => {}
            }
        }

        self.parse_expression_or_declaration_statement()
    }

    /// Parses a statement, substituting a zero-width poisoned node when the
    /// slot is empty. Keeps required child slots total.
    fn parse_statement_or_poisoned(&mut self) -> NodeId {
        match self.parse_statement() {
            Some(statement) => statement,
            None => {
                self.error_at_current("Expected statement");
                self.poisoned_here()
            }
        }
    }

    /// Wraps a declaration node in a statement-position node.
    fn wrap_declaration(&mut self, declaration: NodeId) -> NodeId {
        let span = self.ast_mut().node(declaration).span;
        let node = self
            .ast_mut()
            .alloc(NodeKind::DeclarationStmt { declaration }, span);
        self.ast_mut().adopt_children(node);
        node
    }

    // ========================================================================
    // Terminators
    // ========================================================================

    /// Consumes a statement's `;`, or recovers.
    ///
    /// Recovery is silent when the current token is `{`, `}`, end of input,
    /// a newline, or a statement/declaration keyword (implicit statement
    /// terminator); otherwise the error is reported and the parser
    /// synchronizes.
    pub(super) fn expect_statement_terminator(&mut self, message: &str) {
        self.skip_horizontal_trivia();
        if self.match_kind(TokenKind::Semicolon) {
            return;
        }
        if self.at_implicit_terminator() {
            return;
        }
        self.error_at_current(message);
        self.synchronize();
    }

    /// Returns true at positions where a missing `;` is tolerated.
    fn at_implicit_terminator(&self) -> bool {
        match self.current_kind() {
            TokenKind::LBrace | TokenKind::RBrace | TokenKind::Eof | TokenKind::Newline => true,
            TokenKind::Ident => is_sync_keyword(self.current_token().lexeme()),
            _ => false,
        }
    }

    // ========================================================================
    // Compound Statements
    // ========================================================================

    /// Parses `{ statement* }`. The current token must be `{`.
    pub(super) fn parse_compound_statement(&mut self) -> NodeId {
        let start = self.current_token().span();
        self.advance(); // {

        let mut statements = Vec::new();
        loop {
            self.skip_trivia();
            if self.current_kind() == TokenKind::RBrace || self.is_at_end() {
                break;
            }

            let consumed_before = self.consumed;
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
            }
            if self.in_panic_mode() {
                self.synchronize();
            }
            if self.consumed == consumed_before && !self.is_at_end() {
                self.error_at_current("Unexpected token, skipping");
                self.clear_panic();
                self.advance();
            }
        }

        if !self.match_kind(TokenKind::RBrace) {
            self.error_at_current("Expected '}' after block");
            while !self.is_at_end() && self.current_kind() != TokenKind::RBrace {
                self.advance();
            }
            self.match_kind(TokenKind::RBrace);
            self.clear_panic();
        }

        let span = start.cover(self.previous_token().span());
        let node = self.ast_mut().alloc(NodeKind::Compound { statements }, span);
        self.ast_mut().adopt_children(node);
        node
    }

    // ========================================================================
    // Simple Statements
    // ========================================================================

    /// Parses `return expr? ;`. The keyword has been consumed.
    fn parse_return(&mut self) -> NodeId {
        let start = self.previous_token().span();

        self.skip_horizontal_trivia();
        let value = if matches!(
            self.current_kind(),
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof | TokenKind::Newline
        ) {
            None
        } else {
            Some(self.parse_expression())
        };

        self.expect_statement_terminator("Expected ';' after return value");

        let span = start.cover(self.previous_token().span());
        let node = self.ast_mut().alloc(NodeKind::Return { value }, span);
        self.ast_mut().adopt_children(node);
        node
    }

    /// Parses `break label? ;`. The keyword has been consumed.
    fn parse_break(&mut self) -> NodeId {
        let start = self.previous_token().span();
        let label = self.optional_label();
        self.expect_statement_terminator("Expected ';' after break");

        let span = start.cover(self.previous_token().span());
        self.ast_mut().alloc(NodeKind::Break { label }, span)
    }

    /// Parses `continue label? ;`. The keyword has been consumed.
    fn parse_continue(&mut self) -> NodeId {
        let start = self.previous_token().span();
        let label = self.optional_label();
        self.expect_statement_terminator("Expected ';' after continue");

        let span = start.cover(self.previous_token().span());
        self.ast_mut().alloc(NodeKind::Continue { label }, span)
    }

    /// Consumes a same-line label identifier, if present.
    fn optional_label(&mut self) -> Option<EcoString> {
        self.skip_horizontal_trivia();
        if self.current_kind() == TokenKind::Ident
            && !is_sync_keyword(self.current_token().lexeme())
        {
            let label: EcoString = self.current_token().lexeme().into();
            self.advance();
            Some(label)
        } else {
            None
        }
    }

    /// Parses `defer stmt`. The keyword has been consumed.
    fn parse_defer(&mut self) -> NodeId {
        let start = self.previous_token().span();
        let body = self.parse_statement_or_poisoned();

        let span = start.cover(self.previous_token().span());
        let node = self.ast_mut().alloc(NodeKind::Defer { body }, span);
        self.ast_mut().adopt_children(node);
        node
    }

    /// Parses `assert (cond (, message)?) ;`. The keyword has been consumed.
    fn parse_assert(&mut self) -> NodeId {
        let start = self.previous_token().span();

        self.skip_trivia();
        self.expect(TokenKind::LParen, "Expected '(' after 'assert'");
        self.skip_trivia();
        let condition = self.parse_expression();

        self.skip_horizontal_trivia();
        let message = if self.match_kind(TokenKind::Comma) {
            self.skip_trivia();
            Some(self.parse_expression())
        } else {
            None
        };

        self.skip_trivia();
        self.expect(TokenKind::RParen, "Expected ')' after assert");
        self.expect_statement_terminator("Expected ';' after assert");

        let span = start.cover(self.previous_token().span());
        let node = self
            .ast_mut()
            .alloc(NodeKind::Assert { condition, message }, span);
        self.ast_mut().adopt_children(node);
        node
    }

    // ========================================================================
    // Control Flow
    // ========================================================================

    /// Parses `if (cond) stmt (else stmt)?`. The keyword has been consumed.
    fn parse_if(&mut self) -> NodeId {
        let start = self.previous_token().span();

        self.skip_trivia();
        self.expect(TokenKind::LParen, "Expected '(' after 'if'");
        self.skip_trivia();
        let condition = self.parse_expression();
        self.skip_trivia();
        self.expect(TokenKind::RParen, "Expected ')' after condition");

        let then_branch = self.parse_statement_or_poisoned();

        self.skip_trivia();
        let else_branch = if self.match_keyword("else") {
            Some(self.parse_statement_or_poisoned())
        } else {
            None
        };

        let span = start.cover(self.previous_token().span());
        let node = self.ast_mut().alloc(
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            },
            span,
        );
        self.ast_mut().adopt_children(node);
        node
    }

    /// Parses `while (cond) stmt`. The keyword has been consumed.
    fn parse_while(&mut self) -> NodeId {
        let start = self.previous_token().span();

        self.skip_trivia();
        self.expect(TokenKind::LParen, "Expected '(' after 'while'");
        self.skip_trivia();
        let condition = self.parse_expression();
        self.skip_trivia();
        self.expect(TokenKind::RParen, "Expected ')' after condition");

        let body = self.parse_statement_or_poisoned();

        let span = start.cover(self.previous_token().span());
        let node = self.ast_mut().alloc(NodeKind::While { condition, body }, span);
        self.ast_mut().adopt_children(node);
        node
    }

    /// Parses `for (init?; cond?; update?) stmt`. The keyword has been
    /// consumed.
    fn parse_for(&mut self) -> NodeId {
        let start = self.previous_token().span();

        self.skip_trivia();
        self.expect(TokenKind::LParen, "Expected '(' after 'for'");

        self.skip_trivia();
        let init = if self.match_kind(TokenKind::Semicolon) {
            None
        } else {
            let node = self.parse_for_init();
            self.skip_horizontal_trivia();
            self.expect(TokenKind::Semicolon, "Expected ';' after loop initializer");
            Some(node)
        };

        self.skip_trivia();
        let condition = if self.match_kind(TokenKind::Semicolon) {
            None
        } else {
            let node = self.parse_expression();
            self.skip_horizontal_trivia();
            self.expect(TokenKind::Semicolon, "Expected ';' after loop condition");
            Some(node)
        };

        self.skip_trivia();
        let update = if self.current_kind() == TokenKind::RParen {
            None
        } else {
            Some(self.parse_expression())
        };
        self.skip_trivia();
        self.expect(TokenKind::RParen, "Expected ')' after for clauses");

        let body = self.parse_statement_or_poisoned();

        let span = start.cover(self.previous_token().span());
        let node = self.ast_mut().alloc(
            NodeKind::For {
                init,
                condition,
                update,
                body,
            },
            span,
        );
        self.ast_mut().adopt_children(node);
        node
    }

    /// Parses a `for` initializer: an expression, or a `Type name (= expr)?`
    /// variable declaration. The trailing `;` belongs to the caller.
    fn parse_for_init(&mut self) -> NodeId {
        let start = self.current_token().span();
        let expr = self.parse_expression();

        self.skip_horizontal_trivia();
        if let Some(type_node) = self.reinterpret_as_type(expr) {
            let name: EcoString = self.current_token().lexeme().into();
            self.advance();

            self.skip_horizontal_trivia();
            let initializer = if self.match_kind(TokenKind::Eq) {
                self.skip_trivia();
                Some(self.parse_expression())
            } else {
                None
            };

            let span = start.cover(self.previous_token().span());
            let node = self.ast_mut().alloc(
                NodeKind::Variable {
                    name,
                    ty: Some(type_node),
                    initializer,
                },
                span,
            );
            self.ast_mut().adopt_children(node);
            return node;
        }

        expr
    }

    /// Parses `foreach (Type? name : iterable) stmt`. The keyword has been
    /// consumed.
    fn parse_foreach(&mut self) -> NodeId {
        let start = self.previous_token().span();

        self.skip_trivia();
        self.expect(TokenKind::LParen, "Expected '(' after 'foreach'");

        self.skip_trivia();
        let (ty, binding) = match self.parse_type() {
            None => {
                self.error_at_current("Expected loop variable");
                let placeholder = self.error_placeholder(self.current_token().span());
                (None, placeholder)
            }
            Some(first) => {
                self.skip_horizontal_trivia();
                if self.current_kind() == TokenKind::Ident {
                    // `Type name` form.
                    let span = self.current_token().span();
                    let name: EcoString = self.current_token().lexeme().into();
                    self.advance();
                    let binding = self.ast_mut().alloc(NodeKind::Identifier { name }, span);
                    (Some(first), binding)
                } else {
                    // Bare `name` form: the leading token was the binding.
                    self.retag_type_as_identifier(first);
                    (None, first)
                }
            }
        };

        self.skip_trivia();
        self.expect(TokenKind::Colon, "Expected ':' in foreach");
        self.skip_trivia();
        let iterable = self.parse_expression();
        self.skip_trivia();
        self.expect(TokenKind::RParen, "Expected ')' after foreach");

        let body = self.parse_statement_or_poisoned();

        let span = start.cover(self.previous_token().span());
        let node = self.ast_mut().alloc(
            NodeKind::Foreach {
                ty,
                binding,
                iterable,
                body,
            },
            span,
        );
        self.ast_mut().adopt_children(node);
        node
    }

    /// Parses `switch (expr) { case ...: stmt* default: stmt* }`. The
    /// keyword has been consumed.
    fn parse_switch(&mut self) -> NodeId {
        let start = self.previous_token().span();

        self.skip_trivia();
        self.expect(TokenKind::LParen, "Expected '(' after 'switch'");
        self.skip_trivia();
        let scrutinee = self.parse_expression();
        self.skip_trivia();
        self.expect(TokenKind::RParen, "Expected ')' after switch value");

        self.skip_trivia();
        let mut cases = Vec::new();
        if self.match_kind(TokenKind::LBrace) {
            loop {
                self.skip_trivia();
                if self.current_kind() == TokenKind::RBrace || self.is_at_end() {
                    break;
                }

                let consumed_before = self.consumed;
                if self.match_keyword("case") {
                    let case_start = self.previous_token().span();
                    self.skip_trivia();
                    let value = self.parse_expression();
                    self.skip_horizontal_trivia();
                    self.expect(TokenKind::Colon, "Expected ':' after case value");
                    let body = self.parse_case_body();
                    let span = case_start.cover(self.previous_token().span());
                    let case = self.ast_mut().alloc(NodeKind::SwitchCase { value, body }, span);
                    self.ast_mut().adopt_children(case);
                    cases.push(case);
                } else if self.match_keyword("default") {
                    let case_start = self.previous_token().span();
                    self.skip_horizontal_trivia();
                    self.expect(TokenKind::Colon, "Expected ':' after 'default'");
                    let body = self.parse_case_body();
                    let span = case_start.cover(self.previous_token().span());
                    let case = self.ast_mut().alloc(NodeKind::SwitchDefault { body }, span);
                    self.ast_mut().adopt_children(case);
                    cases.push(case);
                } else {
                    self.error_at_current("Expected 'case' or 'default'");
                    self.synchronize();
                }
                if self.consumed == consumed_before && !self.is_at_end() {
                    self.advance();
                }
            }

            if !self.match_kind(TokenKind::RBrace) {
                self.error_at_current("Expected '}' after switch body");
                while !self.is_at_end() && self.current_kind() != TokenKind::RBrace {
                    self.advance();
                }
                self.match_kind(TokenKind::RBrace);
                self.clear_panic();
            }
        } else {
            self.error_at_current("Expected '{' after switch");
            self.synchronize();
        }

        let span = start.cover(self.previous_token().span());
        let node = self.ast_mut().alloc(NodeKind::Switch { scrutinee, cases }, span);
        self.ast_mut().adopt_children(node);
        node
    }

    /// Parses statements up to the next `case`, `default`, `}`, or EOF.
    fn parse_case_body(&mut self) -> Vec<NodeId> {
        let mut body = Vec::new();
        loop {
            self.skip_trivia();
            if self.current_kind() == TokenKind::RBrace || self.is_at_end() {
                break;
            }
            if self.current_kind() == TokenKind::Ident
                && matches!(self.current_token().lexeme(), "case" | "default")
            {
                break;
            }

            let consumed_before = self.consumed;
            if let Some(statement) = self.parse_statement() {
                body.push(statement);
            }
            if self.in_panic_mode() {
                self.synchronize();
            }
            if self.consumed == consumed_before && !self.is_at_end() {
                self.error_at_current("Unexpected token, skipping");
                self.clear_panic();
                self.advance();
            }
        }
        body
    }

    // ========================================================================
    // Expression and Declaration Statements
    // ========================================================================

    /// Parses an expression statement, reinterpreting `Type name ...` as a
    /// local variable declaration.
    ///
    /// The parser has one token of lookahead, so `int x = 1;` is first
    /// parsed as the expression `int`; seeing a plain identifier right
    /// after a bare identifier expression re-tags it as a type and
    /// continues as a declaration.
    fn parse_expression_or_declaration_statement(&mut self) -> Option<NodeId> {
        let start = self.current_token().span();
        let expr = self.parse_expression();

        self.skip_horizontal_trivia();
        if let Some(type_node) = self.reinterpret_as_type(expr) {
            let name: EcoString = self.current_token().lexeme().into();
            self.advance();

            self.skip_horizontal_trivia();
            let initializer = if self.match_kind(TokenKind::Eq) {
                self.skip_trivia();
                Some(self.parse_expression())
            } else {
                None
            };

            self.expect_statement_terminator("Expected ';' after declaration");

            let span = start.cover(self.previous_token().span());
            let variable = self.ast_mut().alloc(
                NodeKind::Variable {
                    name,
                    ty: Some(type_node),
                    initializer,
                },
                span,
            );
            self.ast_mut().adopt_children(variable);

            let statement = self
                .ast_mut()
                .alloc(NodeKind::DeclarationStmt { declaration: variable }, span);
            self.ast_mut().adopt_children(statement);
            return Some(statement);
        }

        self.expect_statement_terminator("Expected ';' after expression");

        let span = start.cover(self.previous_token().span());
        let statement = self
            .ast_mut()
            .alloc(NodeKind::ExpressionStmt { expression: expr }, span);
        self.ast_mut().adopt_children(statement);
        Some(statement)
    }

    /// If `expr` is a bare (non-placeholder) identifier and the current
    /// token is a plain identifier, re-tags `expr` as a type identifier and
    /// returns it. The caller is then parsing a variable declaration.
    fn reinterpret_as_type(&mut self, expr: NodeId) -> Option<NodeId> {
        if self.current_kind() != TokenKind::Ident
            || is_sync_keyword(self.current_token().lexeme())
        {
            return None;
        }
        let NodeKind::Identifier { name } = &self.ast_mut().node(expr).kind else {
            return None;
        };
        if name == "<error>" {
            return None;
        }
        let name = name.clone();
        self.ast_mut().node_mut(expr).kind = NodeKind::TypeIdentifier { name };
        Some(expr)
    }

    /// Re-tags a simple type identifier node as a value identifier, for the
    /// `foreach (x : xs)` form where the first token turned out to be the
    /// binding.
    fn retag_type_as_identifier(&mut self, node: NodeId) {
        if let NodeKind::TypeIdentifier { name } = &self.ast_mut().node(node).kind {
            let name = name.clone();
            self.ast_mut().node_mut(node).kind = NodeKind::Identifier { name };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use crate::ast::NodeKind;

    /// Parses `body` as the body of a function and returns the unit plus
    /// the compound statement's children.
    fn parse_body(body: &str) -> (crate::translation_unit::TranslationUnit, Vec<crate::ast::NodeId>) {
        let source = format!("fn int f() {{ {body} }}");
        let outcome = parse(&source, "test.sb");
        assert!(
            outcome.diagnostics.is_empty(),
            "unexpected errors for {body:?}: {:?}",
            outcome.diagnostics
        );
        let decl = outcome.unit.declarations()[0];
        let NodeKind::Function { body, .. } = &outcome.unit.ast().node(decl).kind else {
            panic!("expected function");
        };
        let body = body.expect("function body");
        let NodeKind::Compound { statements } = &outcome.unit.ast().node(body).kind else {
            panic!("expected compound body");
        };
        let statements = statements.clone();
        (outcome.unit, statements)
    }

    #[test]
    fn return_with_and_without_value() {
        let (unit, statements) = parse_body("return 1; return;");
        assert_eq!(statements.len(), 2);
        assert!(matches!(
            unit.ast().node(statements[0]).kind,
            NodeKind::Return { value: Some(_) }
        ));
        assert!(matches!(
            unit.ast().node(statements[1]).kind,
            NodeKind::Return { value: None }
        ));
    }

    #[test]
    fn if_with_else() {
        let (unit, statements) = parse_body("if (a < b) { return a; } else { return b; }");
        assert_eq!(statements.len(), 1);
        let NodeKind::If {
            condition,
            then_branch,
            else_branch,
        } = &unit.ast().node(statements[0]).kind
        else {
            panic!("expected if");
        };
        assert!(matches!(
            unit.ast().node(*condition).kind,
            NodeKind::Binary { .. }
        ));
        assert!(matches!(
            unit.ast().node(*then_branch).kind,
            NodeKind::Compound { .. }
        ));
        assert!(else_branch.is_some());
    }

    #[test]
    fn if_without_else() {
        let (unit, statements) = parse_body("if (ready) start();");
        let NodeKind::If { else_branch, .. } = &unit.ast().node(statements[0]).kind else {
            panic!("expected if");
        };
        assert!(else_branch.is_none());
    }

    #[test]
    fn while_loop() {
        let (unit, statements) = parse_body("while (n > 0) { n = n - 1; }");
        let NodeKind::While { condition, body } = &unit.ast().node(statements[0]).kind else {
            panic!("expected while");
        };
        assert!(matches!(
            unit.ast().node(*condition).kind,
            NodeKind::Binary { .. }
        ));
        assert!(matches!(
            unit.ast().node(*body).kind,
            NodeKind::Compound { .. }
        ));
    }

    #[test]
    fn for_loop_full_header() {
        let (unit, statements) = parse_body("for (int i = 0; i < 10; i = i + 1) { use(i); }");
        let NodeKind::For {
            init,
            condition,
            update,
            ..
        } = &unit.ast().node(statements[0]).kind
        else {
            panic!("expected for");
        };
        let init = init.expect("init");
        assert!(matches!(
            unit.ast().node(init).kind,
            NodeKind::Variable { .. }
        ));
        assert!(condition.is_some());
        assert!(update.is_some());
    }

    #[test]
    fn for_loop_empty_clauses() {
        let (unit, statements) = parse_body("for (;;) { tick(); }");
        let NodeKind::For {
            init,
            condition,
            update,
            ..
        } = &unit.ast().node(statements[0]).kind
        else {
            panic!("expected for");
        };
        assert!(init.is_none());
        assert!(condition.is_none());
        assert!(update.is_none());
    }

    #[test]
    fn foreach_with_typed_binding() {
        let (unit, statements) = parse_body("foreach (Point p : shape.points) { draw(p); }");
        let NodeKind::Foreach { ty, binding, .. } = &unit.ast().node(statements[0]).kind else {
            panic!("expected foreach");
        };
        assert!(ty.is_some());
        assert!(matches!(
            &unit.ast().node(*binding).kind,
            NodeKind::Identifier { name } if name == "p"
        ));
    }

    #[test]
    fn foreach_with_bare_binding() {
        let (unit, statements) = parse_body("foreach (item : items) { use(item); }");
        let NodeKind::Foreach { ty, binding, .. } = &unit.ast().node(statements[0]).kind else {
            panic!("expected foreach");
        };
        assert!(ty.is_none());
        assert!(matches!(
            &unit.ast().node(*binding).kind,
            NodeKind::Identifier { name } if name == "item"
        ));
    }

    #[test]
    fn switch_with_cases_and_default() {
        let (unit, statements) =
            parse_body("switch (mode) { case 1: one(); case 2: two(); stop(); default: other(); }");
        let NodeKind::Switch { cases, .. } = &unit.ast().node(statements[0]).kind else {
            panic!("expected switch");
        };
        assert_eq!(cases.len(), 3);
        let NodeKind::SwitchCase { body, .. } = &unit.ast().node(cases[0]).kind else {
            panic!("expected case");
        };
        assert_eq!(body.len(), 1);
        let NodeKind::SwitchCase { body, .. } = &unit.ast().node(cases[1]).kind else {
            panic!("expected case");
        };
        assert_eq!(body.len(), 2);
        assert!(matches!(
            unit.ast().node(cases[2]).kind,
            NodeKind::SwitchDefault { .. }
        ));
    }

    #[test]
    fn break_and_continue_with_labels() {
        let (unit, statements) = parse_body("break; continue; break outer;");
        assert!(matches!(
            &unit.ast().node(statements[0]).kind,
            NodeKind::Break { label: None }
        ));
        assert!(matches!(
            &unit.ast().node(statements[1]).kind,
            NodeKind::Continue { label: None }
        ));
        assert!(matches!(
            &unit.ast().node(statements[2]).kind,
            NodeKind::Break { label: Some(label) } if label == "outer"
        ));
    }

    #[test]
    fn defer_wraps_a_statement() {
        let (unit, statements) = parse_body("defer close(handle);");
        let NodeKind::Defer { body } = &unit.ast().node(statements[0]).kind else {
            panic!("expected defer");
        };
        assert!(matches!(
            unit.ast().node(*body).kind,
            NodeKind::ExpressionStmt { .. }
        ));
    }

    #[test]
    fn assert_with_message() {
        let (unit, statements) = parse_body("assert(size > 0, \"empty\");");
        let NodeKind::Assert { condition, message } = &unit.ast().node(statements[0]).kind else {
            panic!("expected assert");
        };
        assert!(matches!(
            unit.ast().node(*condition).kind,
            NodeKind::Binary { .. }
        ));
        assert!(message.is_some());
    }

    #[test]
    fn local_constant_is_a_declaration_statement() {
        let (unit, statements) = parse_body("const MAX = 8;");
        let NodeKind::DeclarationStmt { declaration } = &unit.ast().node(statements[0]).kind else {
            panic!("expected declaration statement");
        };
        assert!(matches!(
            unit.ast().node(*declaration).kind,
            NodeKind::Constant { .. }
        ));
    }

    #[test]
    fn local_variable_reinterpretation() {
        let (unit, statements) = parse_body("int total = a + b;");
        let NodeKind::DeclarationStmt { declaration } = &unit.ast().node(statements[0]).kind else {
            panic!("expected declaration statement");
        };
        let NodeKind::Variable { name, ty, .. } = &unit.ast().node(*declaration).kind else {
            panic!("expected variable");
        };
        assert_eq!(name, "total");
        let ty = ty.expect("type");
        assert!(matches!(
            &unit.ast().node(ty).kind,
            NodeKind::TypeIdentifier { name } if name == "int"
        ));
    }

    #[test]
    fn expression_statement_keeps_plain_calls() {
        let (unit, statements) = parse_body("update(x);");
        assert!(matches!(
            unit.ast().node(statements[0]).kind,
            NodeKind::ExpressionStmt { .. }
        ));
    }

    #[test]
    fn nested_compound_statements() {
        let (unit, statements) = parse_body("{ { inner(); } }");
        let NodeKind::Compound { statements: outer } = &unit.ast().node(statements[0]).kind else {
            panic!("expected compound");
        };
        assert!(matches!(
            unit.ast().node(outer[0]).kind,
            NodeKind::Compound { .. }
        ));
    }

    #[test]
    fn missing_semicolon_before_brace_is_silent() {
        let source = "fn int f() { return 1 }";
        let outcome = parse(source, "test.sb");
        assert!(
            outcome.diagnostics.is_empty(),
            "closing brace should terminate the statement: {:?}",
            outcome.diagnostics
        );
    }

    #[test]
    fn empty_statement_slot_is_poisoned() {
        let source = "fn int f() { if (ready) }";
        let outcome = parse(source, "test.sb");
        assert!(outcome.had_error);

        let ast = outcome.unit.ast();
        let poisoned: Vec<_> = ast
            .iter()
            .filter(|(_, node)| matches!(node.kind, NodeKind::Poisoned))
            .collect();
        assert_eq!(poisoned.len(), 1);
        let (id, node) = &poisoned[0];
        assert!(node.span.is_empty(), "poisoned nodes are zero-width");
        let parent = node.parent.expect("poisoned node is parented");
        assert!(matches!(ast.node(parent).kind, NodeKind::If { .. }));
        assert!(ast.children(parent).contains(id));
    }

    #[test]
    fn statement_recovery_keeps_following_statements() {
        let source = "fn int f() { int x = ; return x; }";
        let outcome = parse(source, "test.sb");
        assert!(outcome.had_error);
        let decl = outcome.unit.declarations()[0];
        let NodeKind::Function { body, .. } = &outcome.unit.ast().node(decl).kind else {
            panic!("expected function");
        };
        let body = body.expect("body");
        let NodeKind::Compound { statements } = &outcome.unit.ast().node(body).kind else {
            panic!("expected compound");
        };
        // The malformed declaration and the healthy return are both there.
        assert!(
            statements
                .iter()
                .any(|&id| matches!(outcome.unit.ast().node(id).kind, NodeKind::Return { .. })),
            "return statement should survive recovery"
        );
    }
}
