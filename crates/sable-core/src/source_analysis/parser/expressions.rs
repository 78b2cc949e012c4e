// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Expression parsing for Sable (Pratt / precedence climbing).
//!
//! `parse_precedence` consumes one prefix token, builds the left operand,
//! then folds infix operators while their precedence is at least the
//! requested minimum. The right operand is parsed one level higher, which
//! makes every binary operator left-associative.
//!
//! Newlines matter here: at infix-operator position only horizontal trivia
//! is skipped, so an expression ends at a line break unless an operator
//! keeps it open. Operand positions skip all trivia, which is what lets
//! `x +\n  y` continue across lines.

use ecow::EcoString;

use crate::ast::{BinaryOp, LiteralValue, NodeId, NodeKind, UnaryOp};
use crate::source_analysis::{TokenKind, TokenValue};

use super::{Parser, Precedence};

/// Returns the infix precedence of a token, or [`Precedence::None`] when
/// the token cannot continue an expression.
fn infix_precedence(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Eq
        | TokenKind::PlusEq
        | TokenKind::MinusEq
        | TokenKind::StarEq
        | TokenKind::SlashEq
        | TokenKind::PercentEq
        | TokenKind::AmpEq
        | TokenKind::PipeEq
        | TokenKind::CaretEq
        | TokenKind::ShlEq
        | TokenKind::ShrEq
        | TokenKind::Question => Precedence::Assignment,
        TokenKind::PipePipe => Precedence::Or,
        TokenKind::AmpAmp => Precedence::And,
        TokenKind::EqEq | TokenKind::BangEq => Precedence::Equality,
        TokenKind::Less | TokenKind::Greater | TokenKind::LessEq | TokenKind::GreaterEq => {
            Precedence::Comparison
        }
        TokenKind::Plus
        | TokenKind::Minus
        | TokenKind::Pipe
        | TokenKind::Caret
        | TokenKind::Shl
        | TokenKind::Shr => Precedence::Term,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent | TokenKind::Amp => {
            Precedence::Factor
        }
        TokenKind::Dot | TokenKind::LParen | TokenKind::LBracket => Precedence::Call,
        _ => Precedence::None,
    }
}

/// Maps an infix operator token to its [`BinaryOp`].
fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::Eq => BinaryOp::Assign,
        TokenKind::PlusEq => BinaryOp::AddAssign,
        TokenKind::MinusEq => BinaryOp::SubAssign,
        TokenKind::StarEq => BinaryOp::MulAssign,
        TokenKind::SlashEq => BinaryOp::DivAssign,
        TokenKind::PercentEq => BinaryOp::RemAssign,
        TokenKind::AmpEq => BinaryOp::AndAssign,
        TokenKind::PipeEq => BinaryOp::OrAssign,
        TokenKind::CaretEq => BinaryOp::XorAssign,
        TokenKind::ShlEq => BinaryOp::ShlAssign,
        TokenKind::ShrEq => BinaryOp::ShrAssign,
        TokenKind::PipePipe => BinaryOp::LogicalOr,
        TokenKind::AmpAmp => BinaryOp::LogicalAnd,
        TokenKind::EqEq => BinaryOp::Equal,
        TokenKind::BangEq => BinaryOp::NotEqual,
        TokenKind::Less => BinaryOp::Less,
        TokenKind::Greater => BinaryOp::Greater,
        TokenKind::LessEq => BinaryOp::LessEqual,
        TokenKind::GreaterEq => BinaryOp::GreaterEqual,
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Subtract,
        TokenKind::Pipe => BinaryOp::BitOr,
        TokenKind::Caret => BinaryOp::BitXor,
        TokenKind::Shl => BinaryOp::ShiftLeft,
        TokenKind::Shr => BinaryOp::ShiftRight,
        TokenKind::Star => BinaryOp::Multiply,
        TokenKind::Slash => BinaryOp::Divide,
        TokenKind::Percent => BinaryOp::Remainder,
        TokenKind::Amp => BinaryOp::BitAnd,
        _ => return None,
    })
}

/// Maps a prefix operator token to its [`UnaryOp`].
fn unary_op(kind: TokenKind) -> Option<UnaryOp> {
    Some(match kind {
        TokenKind::Bang => UnaryOp::Not,
        TokenKind::Minus => UnaryOp::Negate,
        TokenKind::Plus => UnaryOp::Plus,
        TokenKind::Tilde => UnaryOp::BitNot,
        TokenKind::Star => UnaryOp::Deref,
        TokenKind::Amp => UnaryOp::AddressOf,
        TokenKind::PlusPlus => UnaryOp::Increment,
        TokenKind::MinusMinus => UnaryOp::Decrement,
        _ => return None,
    })
}

impl Parser<'_> {
    /// Parses an expression at the lowest precedence.
    pub(super) fn parse_expression(&mut self) -> NodeId {
        self.parse_precedence(Precedence::Assignment)
    }

    /// Core Pratt loop: one prefix token, then infix folds while the
    /// operator binds at least as tightly as `min_prec`.
    fn parse_precedence(&mut self, min_prec: Precedence) -> NodeId {
        self.skip_trivia();
        self.advance(); // consume the prefix token
        let mut lhs = self.parse_prefix();

        loop {
            self.skip_horizontal_trivia();
            let prec = infix_precedence(self.current_kind());
            if prec == Precedence::None || prec < min_prec {
                break;
            }
            self.advance(); // consume the operator
            lhs = self.parse_infix(lhs, prec);
        }

        lhs
    }

    // ========================================================================
    // Prefix Positions
    // ========================================================================

    /// Builds the node for the just-consumed prefix token.
    fn parse_prefix(&mut self) -> NodeId {
        let span = self.previous_token().span();
        match self.previous_token().kind() {
            TokenKind::Integer => {
                let value = match self.previous_token().value() {
                    Some(TokenValue::Int(v)) => *v,
                    _ => 0,
                };
                self.ast_mut().alloc(
                    NodeKind::Literal {
                        value: LiteralValue::Int(value),
                    },
                    span,
                )
            }
            TokenKind::Real => {
                let value = match self.previous_token().value() {
                    Some(TokenValue::Real(v)) => *v,
                    _ => 0.0,
                };
                self.ast_mut().alloc(
                    NodeKind::Literal {
                        value: LiteralValue::Real(value),
                    },
                    span,
                )
            }
            TokenKind::String => {
                let value = match self.previous_token().value() {
                    Some(TokenValue::Str(s)) => s.clone(),
                    _ => EcoString::new(),
                };
                self.ast_mut().alloc(
                    NodeKind::Literal {
                        value: LiteralValue::Str(value),
                    },
                    span,
                )
            }
            TokenKind::CharLiteral => {
                let value = match self.previous_token().value() {
                    Some(TokenValue::Char(c)) => *c,
                    _ => '\0',
                };
                self.ast_mut().alloc(
                    NodeKind::Literal {
                        value: LiteralValue::Char(value),
                    },
                    span,
                )
            }
            TokenKind::Ident if self.previous_token().lexeme() == "true" => self.ast_mut().alloc(
                NodeKind::Literal {
                    value: LiteralValue::Bool(true),
                },
                span,
            ),
            TokenKind::Ident if self.previous_token().lexeme() == "false" => self.ast_mut().alloc(
                NodeKind::Literal {
                    value: LiteralValue::Bool(false),
                },
                span,
            ),
            kind if kind.is_identifier() => {
                let name: EcoString = self.previous_token().lexeme().into();
                self.ast_mut().alloc(NodeKind::Identifier { name }, span)
            }
            TokenKind::LParen => self.parse_grouping_or_cast(),
            TokenKind::LBrace => self.parse_initializer_list(),
            kind => {
                if let Some(op) = unary_op(kind) {
                    return self.parse_unary(op);
                }
                self.error_at_previous("Expected expression");
                self.error_placeholder(span)
            }
        }
    }

    /// Parses either a parenthesized expression or a `(Type) expr` cast.
    ///
    /// A type-cased identifier right after `(` selects the cast form; with
    /// one token of lookahead that is the whole heuristic.
    fn parse_grouping_or_cast(&mut self) -> NodeId {
        let start = self.previous_token().span();
        self.skip_trivia();

        if self.current_kind() == TokenKind::TypeIdent {
            let ty = match self.parse_type() {
                Some(ty) => ty,
                None => self.error_placeholder(self.current_token().span()),
            };
            self.skip_trivia();
            self.expect(TokenKind::RParen, "Expected ')' after cast type");
            let operand = self.parse_precedence(Precedence::Unary);
            let span = start.cover(self.ast_mut().node(operand).span);
            let node = self.ast_mut().alloc(NodeKind::Cast { ty, expr: operand }, span);
            self.ast_mut().adopt_children(node);
            return node;
        }

        let inner = self.parse_expression();
        self.skip_trivia();
        if !self.match_kind(TokenKind::RParen) {
            self.error_at_current("Expected ')' after expression");
            let span = self.previous_token().span();
            return self.error_placeholder(span);
        }
        inner
    }

    /// Parses `{ expr (, expr)* ,? }` as an initializer list. The `{` has
    /// been consumed.
    fn parse_initializer_list(&mut self) -> NodeId {
        let start = self.previous_token().span();
        let mut items = Vec::new();

        loop {
            self.skip_trivia();
            if self.current_kind() == TokenKind::RBrace || self.is_at_end() {
                break;
            }
            items.push(self.parse_expression());
            self.skip_trivia();
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }

        self.skip_trivia();
        if !self.match_kind(TokenKind::RBrace) {
            self.error_at_current("Expected '}' after initializer list");
        }

        let span = start.cover(self.previous_token().span());
        let node = self.ast_mut().alloc(NodeKind::InitializerList { items }, span);
        self.ast_mut().adopt_children(node);
        node
    }

    /// Parses the operand of a prefix operator.
    fn parse_unary(&mut self, op: UnaryOp) -> NodeId {
        let op_span = self.previous_token().span();
        let operand = self.parse_precedence(Precedence::Unary);
        let span = op_span.cover(self.ast_mut().node(operand).span);
        let node = self.ast_mut().alloc(NodeKind::Unary { op, operand }, span);
        self.ast_mut().adopt_children(node);
        node
    }

    // ========================================================================
    // Infix Positions
    // ========================================================================

    /// Folds one infix construct onto `lhs`. The operator token has been
    /// consumed.
    fn parse_infix(&mut self, lhs: NodeId, prec: Precedence) -> NodeId {
        match self.previous_token().kind() {
            TokenKind::Dot => self.parse_access(lhs),
            TokenKind::LParen => self.parse_call(lhs),
            TokenKind::LBracket => self.parse_subscript(lhs),
            TokenKind::Question => self.parse_ternary(lhs),
            kind => {
                let Some(op) = binary_op(kind) else {
                    self.error_at_previous("Expected binary operator");
                    return lhs;
                };
                let rhs = self.parse_precedence(prec.one_higher());
                let span = self
                    .ast_mut()
                    .node(lhs)
                    .span
                    .cover(self.ast_mut().node(rhs).span);
                let node = self.ast_mut().alloc(NodeKind::Binary { op, lhs, rhs }, span);
                self.ast_mut().adopt_children(node);
                node
            }
        }
    }

    /// Parses the member side of `object.member`.
    fn parse_access(&mut self, object: NodeId) -> NodeId {
        self.skip_trivia();
        let member = if self.current_kind().is_identifier() {
            let span = self.current_token().span();
            let name: EcoString = self.current_token().lexeme().into();
            self.advance();
            self.ast_mut().alloc(NodeKind::Identifier { name }, span)
        } else {
            self.error_at_current("Expected member name after '.'");
            self.error_placeholder(self.previous_token().span())
        };

        let span = self
            .ast_mut()
            .node(object)
            .span
            .cover(self.ast_mut().node(member).span);
        let node = self.ast_mut().alloc(NodeKind::Access { object, member }, span);
        self.ast_mut().adopt_children(node);
        node
    }

    /// Parses the argument list of `callee(args)`. The `(` has been
    /// consumed.
    fn parse_call(&mut self, callee: NodeId) -> NodeId {
        let mut arguments = Vec::new();
        loop {
            self.skip_trivia();
            if self.current_kind() == TokenKind::RParen || self.is_at_end() {
                break;
            }
            arguments.push(self.parse_expression());
            self.skip_trivia();
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "Expected ')' after arguments");

        let span = self
            .ast_mut()
            .node(callee)
            .span
            .cover(self.previous_token().span());
        let node = self
            .ast_mut()
            .alloc(NodeKind::Call { callee, arguments }, span);
        self.ast_mut().adopt_children(node);
        node
    }

    /// Parses the index of `object[index]`. The `[` has been consumed.
    fn parse_subscript(&mut self, object: NodeId) -> NodeId {
        self.skip_trivia();
        let index = self.parse_expression();
        self.skip_trivia();
        self.expect(TokenKind::RBracket, "Expected ']' after subscript");

        let span = self
            .ast_mut()
            .node(object)
            .span
            .cover(self.previous_token().span());
        let node = self.ast_mut().alloc(NodeKind::Subscript { object, index }, span);
        self.ast_mut().adopt_children(node);
        node
    }

    /// Parses `cond ? then : else`. The `?` has been consumed.
    fn parse_ternary(&mut self, condition: NodeId) -> NodeId {
        let then_value = self.parse_expression();
        self.skip_trivia();
        self.expect(TokenKind::Colon, "Expected ':' in conditional expression");
        let else_value = self.parse_precedence(Precedence::Assignment);

        let span = self
            .ast_mut()
            .node(condition)
            .span
            .cover(self.ast_mut().node(else_value).span);
        let node = self.ast_mut().alloc(
            NodeKind::Ternary {
                condition,
                then_value,
                else_value,
            },
            span,
        );
        self.ast_mut().adopt_children(node);
        node
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use crate::ast::{BinaryOp, LiteralValue, NodeId, NodeKind, UnaryOp};

    /// Parses `source` as the initializer of a variable declaration and
    /// returns the arena plus the initializer id.
    fn parse_init(expr: &str) -> (crate::translation_unit::TranslationUnit, NodeId) {
        let source = format!("int r = {expr};");
        let outcome = parse(&source, "test.sb");
        assert!(
            outcome.diagnostics.is_empty(),
            "unexpected errors for {expr:?}: {:?}",
            outcome.diagnostics
        );
        let decl = outcome.unit.declarations()[0];
        let NodeKind::Variable { initializer, .. } = &outcome.unit.ast().node(decl).kind else {
            panic!("expected variable");
        };
        let init = initializer.expect("initializer");
        (outcome.unit, init)
    }

    #[test]
    fn literal_kinds() {
        let (unit, id) = parse_init("42");
        assert!(matches!(
            unit.ast().node(id).kind,
            NodeKind::Literal {
                value: LiteralValue::Int(42)
            }
        ));

        let (unit, id) = parse_init("2.5");
        assert!(matches!(
            unit.ast().node(id).kind,
            NodeKind::Literal {
                value: LiteralValue::Real(v)
            } if (v - 2.5).abs() < f64::EPSILON
        ));

        let (unit, id) = parse_init("\"hi\"");
        assert!(matches!(
            &unit.ast().node(id).kind,
            NodeKind::Literal {
                value: LiteralValue::Str(s)
            } if s == "hi"
        ));

        let (unit, id) = parse_init("'c'");
        assert!(matches!(
            unit.ast().node(id).kind,
            NodeKind::Literal {
                value: LiteralValue::Char('c')
            }
        ));

        let (unit, id) = parse_init("true");
        assert!(matches!(
            unit.ast().node(id).kind,
            NodeKind::Literal {
                value: LiteralValue::Bool(true)
            }
        ));
    }

    #[test]
    fn unary_wraps_operand() {
        let (unit, id) = parse_init("-x");
        let NodeKind::Unary { op, operand } = &unit.ast().node(id).kind else {
            panic!("expected unary");
        };
        assert_eq!(*op, UnaryOp::Negate);
        assert!(matches!(
            unit.ast().node(*operand).kind,
            NodeKind::Identifier { .. }
        ));
    }

    #[test]
    fn logical_precedence_below_equality() {
        let (unit, id) = parse_init("a == b && c != d");
        let NodeKind::Binary { op, lhs, rhs } = &unit.ast().node(id).kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::LogicalAnd);
        assert!(matches!(
            unit.ast().node(*lhs).kind,
            NodeKind::Binary {
                op: BinaryOp::Equal,
                ..
            }
        ));
        assert!(matches!(
            unit.ast().node(*rhs).kind,
            NodeKind::Binary {
                op: BinaryOp::NotEqual,
                ..
            }
        ));
    }

    #[test]
    fn shift_sits_in_term_level() {
        let (unit, id) = parse_init("a << 2 + b");
        // Both << and + are Term level, left-associative: (a << 2) + b.
        let NodeKind::Binary { op, lhs, .. } = &unit.ast().node(id).kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(
            unit.ast().node(*lhs).kind,
            NodeKind::Binary {
                op: BinaryOp::ShiftLeft,
                ..
            }
        ));
    }

    #[test]
    fn grouping_overrides_precedence() {
        let (unit, id) = parse_init("(1 + 2) * 3");
        let NodeKind::Binary { op, lhs, .. } = &unit.ast().node(id).kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Multiply);
        assert!(matches!(
            unit.ast().node(*lhs).kind,
            NodeKind::Binary {
                op: BinaryOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn call_access_subscript_chain() {
        let (unit, id) = parse_init("obj.items[0].len()");
        // Outermost is the call.
        let NodeKind::Call { callee, arguments } = &unit.ast().node(id).kind else {
            panic!("expected call");
        };
        assert!(arguments.is_empty());
        // Callee is an access whose object is a subscript.
        let NodeKind::Access { object, .. } = &unit.ast().node(*callee).kind else {
            panic!("expected access");
        };
        assert!(matches!(
            unit.ast().node(*object).kind,
            NodeKind::Subscript { .. }
        ));
    }

    #[test]
    fn call_with_arguments() {
        let (unit, id) = parse_init("max(a, b + 1)");
        let NodeKind::Call { arguments, .. } = &unit.ast().node(id).kind else {
            panic!("expected call");
        };
        assert_eq!(arguments.len(), 2);
    }

    #[test]
    fn ternary_expression() {
        let (unit, id) = parse_init("a ? b : c");
        let NodeKind::Ternary {
            condition,
            then_value,
            else_value,
        } = &unit.ast().node(id).kind
        else {
            panic!("expected ternary");
        };
        for node in [condition, then_value, else_value] {
            assert!(matches!(
                unit.ast().node(*node).kind,
                NodeKind::Identifier { .. }
            ));
        }
    }

    #[test]
    fn cast_expression() {
        let (unit, id) = parse_init("(Point) p");
        let NodeKind::Cast { ty, expr } = &unit.ast().node(id).kind else {
            panic!("expected cast");
        };
        assert!(matches!(
            unit.ast().node(*ty).kind,
            NodeKind::TypeIdentifier { .. }
        ));
        assert!(matches!(
            unit.ast().node(*expr).kind,
            NodeKind::Identifier { .. }
        ));
    }

    #[test]
    fn initializer_list_expression() {
        let (unit, id) = parse_init("{ 1, 2, 3 }");
        let NodeKind::InitializerList { items } = &unit.ast().node(id).kind else {
            panic!("expected initializer list");
        };
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn expression_continues_after_operator_newline() {
        let source = "int r = 1 +\n        2;";
        let outcome = parse(source, "test.sb");
        assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    }

    #[test]
    fn missing_operand_synthesizes_error_placeholder() {
        let outcome = parse("int r = 1 + ;", "test.sb");
        assert!(outcome.had_error);
        let ast = outcome.unit.ast();
        let has_placeholder = ast.iter().any(|(_, node)| {
            matches!(&node.kind, NodeKind::Identifier { name } if name == "<error>")
        });
        assert!(has_placeholder, "expected an <error> placeholder node");
    }

    #[test]
    fn error_placeholder_is_parented() {
        let outcome = parse("int r = 1 + ;", "test.sb");
        let ast = outcome.unit.ast();
        for (id, node) in ast.iter() {
            if let NodeKind::Identifier { name } = &node.kind {
                if name == "<error>" {
                    let parent = node.parent.expect("placeholder should be parented");
                    assert!(ast.children(parent).contains(&id));
                }
            }
        }
    }

    #[test]
    fn compound_assignment_parses() {
        let outcome = parse("fn int f() { x += 2; }", "test.sb");
        assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
        let ast = outcome.unit.ast();
        let found = ast.iter().any(|(_, node)| {
            matches!(
                node.kind,
                NodeKind::Binary {
                    op: BinaryOp::AddAssign,
                    ..
                }
            )
        });
        assert!(found);
    }
}
