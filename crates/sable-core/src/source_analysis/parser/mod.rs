// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Panic-mode recursive descent parser for Sable source code.
//!
//! This parser builds an AST from the lexer's token stream. It is designed
//! for IDE use with comprehensive error recovery and diagnostics.
//!
//! # Design Philosophy
//!
//! - **Error recovery is mandatory** - Parser MUST always produce a tree
//! - **Multiple errors** - Report all errors, don't stop at first
//! - **Precise spans** - Every diagnostic points to exact source location
//! - **Synchronization points** - Recover at declaration and statement
//!   boundaries
//!
//! # Panic Mode
//!
//! The first error in a region sets `panic_mode`; while it is set, further
//! diagnostics are suppressed so one mistake doesn't cascade into dozens of
//! messages. [`Parser::synchronize`] clears the flag and skips tokens until
//! a known-safe boundary: a just-consumed `;` or `}`, an upcoming `{`/`}`,
//! a declaration or statement keyword, or end of input.
//!
//! # Expression Precedence (Pratt Parsing)
//!
//! Binary operator precedence uses Pratt parsing with an explicit
//! [`Precedence`] ladder, low to high:
//!
//! | Level | Operators |
//! |-------|-----------|
//! | Assignment | `=` and compound assignments, `?:` |
//! | Or | `\|\|` |
//! | And | `&&` |
//! | Equality | `==` `!=` |
//! | Comparison | `<` `>` `<=` `>=` |
//! | Term | `+` `-` `\|` `^` `<<` `>>` |
//! | Factor | `*` `/` `%` `&` |
//! | Unary | `!` `-` `+` `~` `*` `&` `++` `--` |
//! | Call | `.` `()` `[]` |
//!
//! # Usage
//!
//! ```
//! use sable_core::source_analysis::parse;
//!
//! let outcome = parse("import std::io;", "demo.sb");
//! assert!(outcome.diagnostics.is_empty());
//! assert_eq!(outcome.unit.declarations().len(), 1);
//! ```

use ecow::EcoString;

use crate::ast::{Ast, NodeKind};
use crate::source_analysis::{FileId, Lexer, Span, Token, TokenKind};
use crate::translation_unit::TranslationUnit;

// Submodules with additional impl blocks for Parser
mod declarations;
mod expressions;
mod statements;
mod types;

/// Default cap on reported errors per parse. Exceeding it stops reporting
/// but never aborts the parse.
const DEFAULT_MAX_ERRORS: usize = 100;

/// Keywords that act as synchronization points for error recovery.
///
/// Sable keywords are not lexically reserved, so these are matched by
/// lexeme on `Ident` tokens.
const SYNC_KEYWORDS: &[&str] = &[
    "fn", "struct", "union", "enum", "const", "module", "import", "if", "while", "for", "switch",
    "return", "break", "continue", "defer",
];

/// Returns true if `lexeme` is a declaration or statement keyword.
pub(super) fn is_sync_keyword(lexeme: &str) -> bool {
    SYNC_KEYWORDS.contains(&lexeme)
}

// ============================================================================
// Pratt Parsing Precedence
// ============================================================================

/// Operator precedence, low to high. Used as the `min_prec` argument to
/// `parse_precedence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) enum Precedence {
    /// Not an operator; terminates expression parsing.
    None,
    /// `=`, compound assignment, `?:`.
    Assignment,
    /// `||`
    Or,
    /// `&&`
    And,
    /// `==` `!=`
    Equality,
    /// `<` `>` `<=` `>=`
    Comparison,
    /// `+` `-` `|` `^` `<<` `>>`
    Term,
    /// `*` `/` `%` `&`
    Factor,
    /// Unary prefix operators.
    Unary,
    /// `.` `()` `[]`
    Call,
    /// Literals, identifiers, grouping.
    Primary,
}

impl Precedence {
    /// Returns the next-higher precedence level, saturating at `Primary`.
    ///
    /// Parsing the right operand one level higher makes binary operators
    /// left-associative.
    pub(super) const fn one_higher(self) -> Self {
        match self {
            Self::None => Self::Assignment,
            Self::Assignment => Self::Or,
            Self::Or => Self::And,
            Self::And => Self::Equality,
            Self::Equality => Self::Comparison,
            Self::Comparison => Self::Term,
            Self::Term => Self::Factor,
            Self::Factor => Self::Unary,
            Self::Unary => Self::Call,
            Self::Call | Self::Primary => Self::Primary,
        }
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// One recovered syntax problem.
///
/// Lexer and parser failures are data, not `Err` values: they accumulate
/// on the [`ParseOutcome`] while recovery continues, and never escape as
/// errors. Every diagnostic is keyed by the offending token's span and,
/// when that token had text, its lexeme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Which failure class produced this.
    pub kind: DiagnosticKind,
    /// Human-readable description.
    pub message: EcoString,
    /// The source location of the offending token.
    pub span: Span,
    /// The offending token's lexeme, when it had one.
    pub found: Option<EcoString>,
}

impl Diagnostic {
    /// Creates a grammar-level diagnostic.
    #[must_use]
    pub fn parse_error(message: impl Into<EcoString>, span: Span) -> Self {
        Self {
            kind: DiagnosticKind::ParseError,
            message: message.into(),
            span,
            found: None,
        }
    }

    /// Creates the diagnostic for an invalid token handed back by the
    /// lexer.
    #[must_use]
    pub fn invalid_token(span: Span) -> Self {
        Self {
            kind: DiagnosticKind::InvalidToken,
            message: "Invalid token".into(),
            span,
            found: None,
        }
    }

    /// Attaches the offending lexeme.
    #[must_use]
    pub fn with_found(mut self, lexeme: impl Into<EcoString>) -> Self {
        self.found = Some(lexeme.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(found) = &self.found {
            write!(f, " (found `{found}`)")?;
        }
        Ok(())
    }
}

/// The failure class of a [`Diagnostic`].
///
/// This is the syntax half of the error taxonomy; edit, query, and lookup
/// failures are [`DocumentError`](crate::error::DocumentError)s instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A syntactic failure, recorded and recovered locally.
    ParseError,
    /// The lexer returned an invalid token; the parser skipped it.
    InvalidToken,
}

/// Everything a parse produces: the tree and the trouble.
#[derive(Debug)]
pub struct ParseOutcome {
    /// The translation unit. Always present, even for garbage input.
    pub unit: TranslationUnit,
    /// Accumulated diagnostics, capped at the parser's error limit.
    pub diagnostics: Vec<Diagnostic>,
    /// True if at least one error was recorded.
    pub had_error: bool,
    /// Total error count, including errors past the reporting cap.
    pub error_count: usize,
}

/// Parses source text into a translation unit.
///
/// This is the main entry point. It always returns a tree, even when the
/// input has syntax errors; check [`ParseOutcome::diagnostics`].
#[must_use]
pub fn parse(source: &str, file_name: &str) -> ParseOutcome {
    parse_in_file(source, file_name, FileId::UNASSIGNED)
}

/// Parses source text whose spans belong to the given file.
#[must_use]
pub fn parse_in_file(source: &str, file_name: &str, file: FileId) -> ParseOutcome {
    let parser = Parser::new(source, file);
    parser.parse_translation_unit(file_name, source)
}

// ============================================================================
// Parser State
// ============================================================================

/// The parser state.
///
/// `current` is the token being examined; `previous` is the token most
/// recently consumed. [`Parser::advance`] pulls tokens from the lexer,
/// reporting and discarding invalid ones.
pub struct Parser<'src> {
    /// The token source.
    lexer: Lexer<'src>,
    /// The token under examination.
    current: Token<'src>,
    /// The most recently consumed token.
    previous: Token<'src>,
    /// The arena receiving all nodes.
    ast: Ast,
    /// Accumulated diagnostics.
    diagnostics: Vec<Diagnostic>,
    /// True once any error has been recorded.
    had_error: bool,
    /// While set, diagnostics are suppressed.
    panic_mode: bool,
    /// Total errors recorded (reported or not).
    error_count: usize,
    /// Reporting cap.
    max_errors: usize,
    /// Tokens consumed so far; the entry loop uses this to detect lack of
    /// progress.
    consumed: usize,
    /// The file owning all produced spans.
    file: FileId,
}

impl<'src> Parser<'src> {
    /// Creates a parser over `source`, priming `current` with the first
    /// usable token.
    #[must_use]
    pub fn new(source: &'src str, file: FileId) -> Self {
        let lexer = Lexer::with_file(source, file);
        let placeholder = Token::new(TokenKind::Eof, Span::empty(file, 0), "");
        let mut parser = Self {
            lexer,
            current: placeholder.clone(),
            previous: placeholder,
            ast: Ast::new(),
            diagnostics: Vec::new(),
            had_error: false,
            panic_mode: false,
            error_count: 0,
            max_errors: DEFAULT_MAX_ERRORS,
            consumed: 0,
            file,
        };
        parser.prime();
        parser
    }

    /// Pulls the first non-invalid token into `current`.
    fn prime(&mut self) {
        loop {
            let token = self.lexer.next_token();
            if token.kind().is_invalid() {
                let diagnostic =
                    Diagnostic::invalid_token(token.span()).with_found(token.lexeme());
                self.report(diagnostic);
                continue;
            }
            self.current = token;
            break;
        }
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    /// Moves `current` to `previous` and pulls the next usable token,
    /// reporting "Invalid token" on each invalid one.
    pub(super) fn advance(&mut self) {
        if !self.current.kind().is_eof() {
            self.consumed += 1;
        }
        self.previous = self.current.clone();
        loop {
            let token = self.lexer.next_token();
            if token.kind().is_invalid() {
                let diagnostic =
                    Diagnostic::invalid_token(token.span()).with_found(token.lexeme());
                self.report(diagnostic);
                continue;
            }
            self.current = token;
            break;
        }
    }

    /// Returns the current token kind.
    pub(super) fn current_kind(&self) -> TokenKind {
        self.current.kind()
    }

    /// Returns the current token.
    pub(super) fn current_token(&self) -> &Token<'src> {
        &self.current
    }

    /// Returns the most recently consumed token.
    pub(super) fn previous_token(&self) -> &Token<'src> {
        &self.previous
    }

    /// Checks if we're at the end of input.
    pub(super) fn is_at_end(&self) -> bool {
        self.current.kind().is_eof()
    }

    /// Skips whitespace, newlines, and comments.
    ///
    /// Called at every declaration, member, statement, import-segment, and
    /// expression-operand entry point.
    pub(super) fn skip_trivia(&mut self) {
        while self.current.kind().is_trivia() {
            self.advance();
        }
    }

    /// Skips whitespace and comments but leaves newlines visible.
    ///
    /// Used where a newline may act as an implicit statement terminator:
    /// at infix-operator position and before a statement's `;`.
    pub(super) fn skip_horizontal_trivia(&mut self) {
        while self.current.kind().is_horizontal_trivia() {
            self.advance();
        }
    }

    /// Consumes the current token if it has the given kind.
    pub(super) fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.current.kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes the current token if it is the given keyword.
    pub(super) fn match_keyword(&mut self, keyword: &str) -> bool {
        if self.current.is_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expects the current token to have the given kind, advancing if so.
    /// Reports an error and returns false otherwise.
    pub(super) fn expect(&mut self, kind: TokenKind, message: &str) -> bool {
        if self.match_kind(kind) {
            true
        } else {
            self.error_at_current(message);
            false
        }
    }

    // ========================================================================
    // Error Handling & Recovery
    // ========================================================================

    /// Records a diagnostic, unless panic mode suppresses it.
    ///
    /// Sets both `had_error` and `panic_mode`. Past `max_errors` the count
    /// still grows but nothing more is reported.
    fn report(&mut self, diagnostic: Diagnostic) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.had_error = true;
        self.error_count += 1;
        if self.error_count > self.max_errors {
            return;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Records a grammar error keyed by the offending token's span and
    /// lexeme.
    pub(super) fn error_at(&mut self, span: Span, lexeme: &str, message: impl Into<EcoString>) {
        let mut diagnostic = Diagnostic::parse_error(message, span);
        if !lexeme.is_empty() {
            diagnostic = diagnostic.with_found(lexeme);
        }
        self.report(diagnostic);
    }

    /// Reports an error at the current token.
    pub(super) fn error_at_current(&mut self, message: impl Into<EcoString>) {
        let span = self.current.span();
        let lexeme = self.current.lexeme().to_owned();
        self.error_at(span, &lexeme, message);
    }

    /// Reports an error at the previous token.
    pub(super) fn error_at_previous(&mut self, message: impl Into<EcoString>) {
        let span = self.previous.span();
        let lexeme = self.previous.lexeme().to_owned();
        self.error_at(span, &lexeme, message);
    }

    /// Returns true while diagnostics are being suppressed.
    pub(super) fn in_panic_mode(&self) -> bool {
        self.panic_mode
    }

    /// Clears panic mode without skipping anything.
    ///
    /// Used by recovery paths that have already reached a safe boundary,
    /// such as a scanned-for closing brace.
    pub(super) fn clear_panic(&mut self) {
        self.panic_mode = false;
    }

    /// Synchronizes the parser to a safe recovery point.
    ///
    /// Clears panic mode, then advances until the previous token was `;` or
    /// `}`, the current token is `{` or `}`, the current token is a
    /// declaration/statement keyword, or end of input.
    pub(super) fn synchronize(&mut self) {
        self.panic_mode = false;

        while !self.is_at_end() {
            if matches!(
                self.previous.kind(),
                TokenKind::Semicolon | TokenKind::RBrace
            ) {
                return;
            }
            match self.current.kind() {
                TokenKind::LBrace | TokenKind::RBrace => return,
                TokenKind::Ident if is_sync_keyword(self.current.lexeme()) => return,
                _ => self.advance(),
            }
        }
    }

    /// Allocates a zero-width [`NodeKind::Poisoned`] node at the current
    /// token, for slots that require a node.
    pub(super) fn poisoned_here(&mut self) -> crate::ast::NodeId {
        let offset = self.current.span().start();
        self.ast
            .alloc(NodeKind::Poisoned, Span::empty(self.file, offset))
    }

    /// Synthesizes an `"<error>"` identifier placeholder at the given span.
    ///
    /// Placeholders are first-class nodes: parent linked and visible to
    /// traversals.
    pub(super) fn error_placeholder(&mut self, span: Span) -> crate::ast::NodeId {
        self.ast.alloc(
            NodeKind::Identifier {
                name: "<error>".into(),
            },
            span,
        )
    }

    /// Gives parser internals access to the arena.
    pub(super) fn ast_mut(&mut self) -> &mut Ast {
        &mut self.ast
    }

    // ========================================================================
    // Translation Unit Parsing
    // ========================================================================

    /// Parses the whole token stream into a translation unit.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the root span shares the lexer's u32 offset representation"
    )]
    fn parse_translation_unit(mut self, file_name: &str, source: &str) -> ParseOutcome {
        let root_span = Span::in_file(self.file, 0, source.len() as u32);
        let root = self.ast.alloc(
            NodeKind::TranslationUnit {
                declarations: Vec::new(),
            },
            root_span,
        );

        while !self.is_at_end() {
            self.skip_trivia();
            if self.is_at_end() {
                break;
            }

            let consumed_before = self.consumed;
            if let Some(declaration) = self.parse_declaration() {
                self.ast.push_declaration(root, declaration);
            }
            if self.panic_mode {
                self.synchronize();
            }
            // Guard against livelock: a declaration that consumed nothing
            // would loop forever on the same token.
            if self.consumed == consumed_before && !self.is_at_end() {
                self.error_at_current("Unexpected token, skipping");
                self.panic_mode = false;
                self.advance();
            }
        }

        // The root span always covers the whole source, even when trailing
        // declarations were recovered away.
        self.ast.node_mut(root).span = root_span;

        let unit = TranslationUnit::new(file_name, source, self.ast, root);
        ParseOutcome {
            unit,
            diagnostics: self.diagnostics,
            had_error: self.had_error,
            error_count: self.error_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, LiteralValue, NodeId, NodeKind};

    /// Helper to parse a string and check for errors.
    fn parse_ok(source: &str) -> ParseOutcome {
        let outcome = parse(source, "test.sb");
        assert!(
            outcome.diagnostics.is_empty(),
            "Expected no errors, got: {:?}",
            outcome.diagnostics
        );
        outcome
    }

    /// Helper to parse a string expecting errors.
    fn parse_err(source: &str) -> ParseOutcome {
        let outcome = parse(source, "test.sb");
        assert!(outcome.had_error, "Expected errors for {source:?}");
        outcome
    }

    fn declarations(outcome: &ParseOutcome) -> Vec<NodeId> {
        outcome.unit.declarations().to_vec()
    }

    #[test]
    fn parse_empty_source() {
        let outcome = parse_ok("");
        assert!(declarations(&outcome).is_empty());
        let root = outcome.unit.root();
        assert!(outcome.unit.ast().node(root).parent.is_none());
    }

    #[test]
    fn parse_whitespace_only_source() {
        let outcome = parse_ok("  \n\t\n");
        assert!(declarations(&outcome).is_empty());
    }

    #[test]
    fn import_chain_spans_and_segments() {
        // `import std::io;` is 15 bytes; "std" at [7,10), "io" at [12,14).
        let outcome = parse_ok("import std::io;");
        let decls = declarations(&outcome);
        assert_eq!(decls.len(), 1);

        let ast = outcome.unit.ast();
        let import = ast.node(decls[0]);
        assert_eq!(import.span.start(), 0);
        assert_eq!(import.span.end(), 15);

        let NodeKind::Import { segments } = &import.kind else {
            panic!("expected import, got {:?}", import.kind);
        };
        let names: Vec<_> = segments
            .iter()
            .map(|&id| ast.node(id).kind.name().expect("segment name").to_string())
            .collect();
        assert_eq!(names, vec!["std", "io"]);
        assert_eq!(ast.node(segments[0]).span.byte_range(), 7..10);
        assert_eq!(ast.node(segments[1]).span.byte_range(), 12..14);

        // Reconstructed path equals the source path.
        assert_eq!(names.join("::"), "std::io");
    }

    #[test]
    fn import_identifiers_are_parented() {
        let outcome = parse_ok("import std::io;");
        let ast = outcome.unit.ast();
        let import = declarations(&outcome)[0];
        for child in ast.children(import) {
            assert_eq!(ast.node(child).parent, Some(import));
        }
        assert_eq!(ast.node(import).parent, Some(outcome.unit.root()));
    }

    #[test]
    fn import_multiple_paths() {
        let outcome = parse_ok("import std::io, core::mem;");
        let ast = outcome.unit.ast();
        let import = declarations(&outcome)[0];
        let NodeKind::Import { segments } = &ast.node(import).kind else {
            panic!("expected import");
        };
        assert_eq!(segments.len(), 4);
    }

    #[test]
    fn struct_with_inline_member() {
        let outcome = parse_ok("struct Base { int x; inline Point pos; }");
        let ast = outcome.unit.ast();
        let decls = declarations(&outcome);
        assert_eq!(decls.len(), 1);

        let NodeKind::Struct {
            name,
            is_union,
            members,
        } = &ast.node(decls[0]).kind
        else {
            panic!("expected struct");
        };
        assert_eq!(name, "Base");
        assert!(!*is_union);
        assert_eq!(members.len(), 2);

        let NodeKind::StructMember {
            name, is_inline, ..
        } = &ast.node(members[0]).kind
        else {
            panic!("expected member");
        };
        assert_eq!(name, "x");
        assert!(!*is_inline);

        let NodeKind::StructMember {
            name, is_inline, ..
        } = &ast.node(members[1]).kind
        else {
            panic!("expected member");
        };
        assert_eq!(name, "pos");
        assert!(*is_inline);
    }

    #[test]
    fn union_flag_set() {
        let outcome = parse_ok("union Value { int i; Real r; }");
        let ast = outcome.unit.ast();
        let NodeKind::Struct { is_union, .. } = &ast.node(declarations(&outcome)[0]).kind else {
            panic!("expected struct node for union");
        };
        assert!(*is_union);
    }

    #[test]
    fn typedef_declaration() {
        let outcome = parse_ok("typedef Handle = int*;");
        let ast = outcome.unit.ast();
        let NodeKind::Typedef { name, ty } = &ast.node(declarations(&outcome)[0]).kind else {
            panic!("expected typedef");
        };
        assert_eq!(name, "Handle");
        let ty = ty.expect("aliased type");
        assert!(matches!(ast.node(ty).kind, NodeKind::PointerType { .. }));
    }

    #[test]
    fn recovery_across_declarations() {
        // The first struct is malformed; the second must still parse fully.
        let outcome = parse_err("struct Bad { invalid } struct Good { int x; }");
        let ast = outcome.unit.ast();
        let decls = declarations(&outcome);
        assert_eq!(decls.len(), 2, "both structs should be present");

        let NodeKind::Struct { name, members, .. } = &ast.node(decls[1]).kind else {
            panic!("expected struct");
        };
        assert_eq!(name, "Good");
        assert_eq!(members.len(), 1);
    }

    #[test]
    fn missing_semicolon_between_variables() {
        // The newline acts as an implicit terminator; no error-mode lockup.
        let outcome = parse("int x = 42\nint y = 24;", "test.sb");
        let decls = declarations(&outcome);
        assert_eq!(decls.len(), 2);

        let ast = outcome.unit.ast();
        for decl in decls {
            assert!(matches!(ast.node(decl).kind, NodeKind::Variable { .. }));
        }
    }

    #[test]
    fn variable_declaration_shape() {
        let outcome = parse_ok("int x = 42;");
        let ast = outcome.unit.ast();
        let NodeKind::Variable {
            name,
            ty,
            initializer,
        } = &ast.node(declarations(&outcome)[0]).kind
        else {
            panic!("expected variable");
        };
        assert_eq!(name, "x");
        let ty = ty.expect("type");
        assert_eq!(
            ast.node(ty).kind.name().map(ecow::EcoString::as_str),
            Some("int")
        );
        let init = initializer.expect("initializer");
        assert!(matches!(
            ast.node(init).kind,
            NodeKind::Literal {
                value: LiteralValue::Int(42)
            }
        ));
    }

    #[test]
    fn binary_expression_precedence() {
        let outcome = parse_ok("int r = 1 + 2 * 3;");
        let ast = outcome.unit.ast();
        let NodeKind::Variable { initializer, .. } = &ast.node(declarations(&outcome)[0]).kind
        else {
            panic!("expected variable");
        };
        let NodeKind::Binary { op, lhs, rhs } = &ast.node(initializer.expect("init")).kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(
            ast.node(*lhs).kind,
            NodeKind::Literal {
                value: LiteralValue::Int(1)
            }
        ));
        // Multiplication binds tighter: rhs is 2 * 3.
        let NodeKind::Binary { op, .. } = &ast.node(*rhs).kind else {
            panic!("expected nested binary");
        };
        assert_eq!(*op, BinaryOp::Multiply);
    }

    #[test]
    fn binary_is_left_associative() {
        let outcome = parse_ok("int r = 1 - 2 - 3;");
        let ast = outcome.unit.ast();
        let NodeKind::Variable { initializer, .. } = &ast.node(declarations(&outcome)[0]).kind
        else {
            panic!("expected variable");
        };
        let NodeKind::Binary { op, lhs, .. } = &ast.node(initializer.expect("init")).kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Subtract);
        // Left operand is itself (1 - 2).
        assert!(matches!(
            ast.node(*lhs).kind,
            NodeKind::Binary {
                op: BinaryOp::Subtract,
                ..
            }
        ));
    }

    #[test]
    fn binary_span_starts_at_lhs() {
        let outcome = parse_ok("int r = 10 + 2;");
        let ast = outcome.unit.ast();
        let NodeKind::Variable { initializer, .. } = &ast.node(declarations(&outcome)[0]).kind
        else {
            panic!("expected variable");
        };
        let node = ast.node(initializer.expect("init"));
        // "10 + 2" starts at byte 8.
        assert_eq!(node.span.start(), 8);
        assert_eq!(node.span.end(), 14);
    }

    #[test]
    fn parser_never_sticks_on_garbage() {
        // Pure nonsense must terminate and cover the whole input.
        let outcome = parse_err(")))) ???? ;;;; ^^^^");
        assert!(outcome.error_count > 0);
    }

    #[test]
    fn livelock_guard_reports_and_skips() {
        let outcome = parse_err("}");
        assert!(
            outcome
                .diagnostics
                .iter()
                .any(|d| d.message.contains("Unexpected token")),
            "got: {:?}",
            outcome.diagnostics
        );
    }

    #[test]
    fn error_cap_stops_reporting_not_parsing() {
        // Hundreds of bad declarations; reporting is capped but the parse
        // still terminates and the count keeps growing.
        let source = "? ".repeat(300);
        let outcome = parse(&source, "test.sb");
        assert!(outcome.error_count >= outcome.diagnostics.len());
        assert!(outcome.diagnostics.len() <= DEFAULT_MAX_ERRORS);
    }

    #[test]
    fn invalid_tokens_are_reported_and_skipped() {
        let outcome = parse("import `` std;", "test.sb");
        let invalid = outcome
            .diagnostics
            .iter()
            .find(|d| d.kind == DiagnosticKind::InvalidToken)
            .expect("lexer failure should be recorded");
        assert_eq!(invalid.message, "Invalid token");
        assert_eq!(invalid.found.as_deref(), Some("``"));
    }

    #[test]
    fn grammar_failures_carry_the_offending_lexeme() {
        let outcome = parse_err("struct 42 { }");
        let error = &outcome.diagnostics[0];
        assert_eq!(error.kind, DiagnosticKind::ParseError);
        assert_eq!(error.found.as_deref(), Some("42"));
        assert_eq!(error.to_string(), "Expected struct name (found `42`)");
    }

    #[test]
    fn every_node_parent_agrees_with_children() {
        let source = "import std::io;\n\
                      struct Point { int x; int y; }\n\
                      fn int main() { int t = 1 + 2; return t; }\n\
                      enum Color { RED, GREEN }\n";
        let outcome = parse(source, "test.sb");
        let ast = outcome.unit.ast();

        for (id, node) in ast.iter() {
            match node.parent {
                None => assert_eq!(id, outcome.unit.root(), "only the root may be unparented"),
                Some(parent) => {
                    assert!(
                        ast.children(parent).contains(&id),
                        "{id} not in child list of its parent"
                    );
                }
            }
            // Span sanity: start <= end <= len(source).
            assert!(node.span.start() <= node.span.end());
            assert!(node.span.end() as usize <= source.len());
        }
    }

    #[test]
    fn children_spans_inside_parent_span() {
        let source = "struct Point { int x; inline Vec2 v; }";
        let outcome = parse_ok(source);
        let ast = outcome.unit.ast();
        for (id, node) in ast.iter() {
            for child in ast.children(id) {
                let child_span = ast.node(child).span;
                if child_span.is_empty() {
                    continue; // synthesized placeholders may be zero-width
                }
                assert!(
                    node.span.start() <= child_span.start() && child_span.end() <= node.span.end(),
                    "child {child} span {:?} escapes parent {id} span {:?}",
                    child_span,
                    node.span
                );
            }
        }
    }

    #[test]
    fn panic_mode_is_clear_after_parse() {
        let source = "struct Bad { invalid } struct Good { int x; }";
        let parser = Parser::new(source, FileId::UNASSIGNED);
        let outcome = parser.parse_translation_unit("test.sb", source);
        assert!(outcome.had_error);
        // Recovery must leave the second declaration intact (checked above)
        // and the outcome carries diagnostics rather than a poisoned state.
        assert!(!outcome.diagnostics.is_empty());
    }
}
