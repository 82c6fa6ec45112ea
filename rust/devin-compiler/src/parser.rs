//! Recursive-descent parser for Devin.
//!
//! Expression precedence is implemented as a sequence of left-folding
//! layers (one function per precedence level in spec §4.1), which is
//! equivalent to a precedence-climbing/Pratt parser for a grammar with this
//! few levels and no right-associative operators.
//!
//! The parser is **non-recovering**: a failure is a single [`ParseError`]
//! carrying the failure position and the set of token descriptions that
//! would have been accepted there. Because Devin's grammar dispatches on a
//! leading keyword or punctuation at every choice point (`var`/`def` for
//! declarations, `if`/`while`/`do`/`return`/`assert`/`{` for statements,
//! etc.), the "try A, then try B, merge failures by position" combinator
//! described in spec §4.1 degenerates to direct single-token dispatch: the
//! `expected` set built at a dispatch point already *is* the union spec
//! §4.1 describes, so no actual backtracking is needed to get the same
//! observable failure. The one place two full parses are genuinely
//! attempted is an assignment target vs. a plain expression statement,
//! handled by [`Parser::postfix_with_assign`].

use devin_core::ast::*;
use devin_core::Span;

use crate::lexer::{tokenize, LexError, Token, TokenKind};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub span: Span,
    pub found: String,
    pub expected: Vec<&'static str>,
    pub fatal: bool,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unexpected {} at byte {}; expected one of: {}",
            self.found,
            self.span.start,
            self.expected.join(", ")
        )
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    /// Merge two failures by source position per spec §4.1: prefer the
    /// deeper position; on a tie, union the expected sets.
    fn merge(self, other: ParseError) -> ParseError {
        if self.fatal && !other.fatal {
            return self;
        }
        if other.fatal && !self.fatal {
            return other;
        }
        match self.span.start.cmp(&other.span.start) {
            std::cmp::Ordering::Greater => self,
            std::cmp::Ordering::Less => other,
            std::cmp::Ordering::Equal => {
                let mut expected = self.expected;
                for e in other.expected {
                    if !expected.contains(&e) {
                        expected.push(e);
                    }
                }
                ParseError {
                    span: self.span,
                    found: self.found,
                    expected,
                    fatal: self.fatal || other.fatal,
                }
            }
        }
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

type PResult<T> = Result<T, ParseError>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn peek_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn error(&self, expected: Vec<&'static str>, fatal: bool) -> ParseError {
        ParseError {
            span: self.peek_span(),
            found: self.peek().to_string(),
            expected,
            fatal,
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    fn expect(&mut self, kind: TokenKind, name: &'static str) -> PResult<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.error(vec![name], true))
        }
    }

    fn expect_ident(&mut self) -> PResult<(String, Span)> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                let span = self.peek_span();
                self.advance();
                Ok((name, span))
            }
            _ => Err(self.error(vec!["identifier"], true)),
        }
    }

    // ── Program ──

    pub fn parse_program(&mut self) -> PResult<Devin> {
        let mut declarations = Vec::new();
        while !self.at_eof() {
            declarations.push(self.parse_declaration()?);
        }
        Ok(Devin { declarations })
    }

    fn parse_declaration(&mut self) -> PResult<Declaration> {
        match self.peek() {
            TokenKind::Var => self.parse_variable_decl().map(Declaration::Variable),
            TokenKind::Def => self.parse_function_decl().map(Declaration::Function),
            _ => Err(self.error(vec!["'var'", "'def'"], false)),
        }
    }

    fn parse_variable_decl(&mut self) -> PResult<VariableDecl> {
        let start = self.peek_span();
        self.expect(TokenKind::Var, "'var'")?;
        let (name, _) = self.expect_ident()?;
        let annotation = self.parse_optional_annotation()?;
        self.expect(TokenKind::Eq, "'='")?;
        let initializer = self.parse_expr()?;
        let end = self.expect(TokenKind::Semicolon, "';'")?.span;
        Ok(VariableDecl {
            name,
            annotation,
            initializer,
            span: start.merge(end),
        })
    }

    fn parse_optional_annotation(&mut self) -> PResult<Option<TypeExpr>> {
        if self.check(&TokenKind::Colon) {
            self.advance();
            Ok(Some(self.parse_type_expr()?))
        } else {
            Ok(None)
        }
    }

    fn parse_type_expr(&mut self) -> PResult<TypeExpr> {
        let (name, span) = self.expect_ident()?;
        if name == "Array" && self.check(&TokenKind::LBracket) {
            self.advance();
            let inner = self.parse_type_expr()?;
            let end = self.expect(TokenKind::RBracket, "']'")?.span;
            Ok(TypeExpr::Array(Box::new(inner), span.merge(end)))
        } else {
            Ok(TypeExpr::Named(name, span))
        }
    }

    fn parse_function_decl(&mut self) -> PResult<FunctionDecl> {
        let start = self.peek_span();
        self.expect(TokenKind::Def, "'def'")?;
        let (name, _) = self.expect_ident()?;
        self.expect(TokenKind::LParen, "'('")?;
        let mut parameters = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                parameters.push(self.parse_param()?);
                if self.check(&TokenKind::Comma) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        let return_type = self.parse_optional_annotation()?;
        let body = self.parse_block()?;
        let span = start.merge(body.span());
        Ok(FunctionDecl {
            name,
            parameters,
            return_type,
            body: Box::new(body),
            span,
        })
    }

    fn parse_param(&mut self) -> PResult<Param> {
        let start = self.peek_span();
        let is_ref = if self.check(&TokenKind::Ref) {
            self.advance();
            true
        } else {
            false
        };
        let (name, name_span) = self.expect_ident()?;
        let annotation = self.parse_optional_annotation()?;
        let span = if is_ref { start.merge(name_span) } else { name_span };
        let span = annotation.as_ref().map(|a| span.merge(a.span())).unwrap_or(span);
        Ok(Param {
            name,
            is_ref,
            annotation,
            span,
        })
    }

    // ── Statements ──

    fn parse_block(&mut self) -> PResult<Stmt> {
        let start = self.expect(TokenKind::LBrace, "'{'")?.span;
        let mut items = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.at_eof() {
                return Err(self.error(vec!["'}'"], true));
            }
            items.push(self.parse_block_item()?);
        }
        let end = self.advance().span;
        Ok(Stmt::Block(items, start.merge(end)))
    }

    fn parse_block_item(&mut self) -> PResult<BlockItem> {
        match self.peek() {
            TokenKind::Var | TokenKind::Def => {
                Ok(BlockItem::Declaration(self.parse_declaration()?))
            }
            _ => Ok(BlockItem::Statement(self.parse_statement()?)),
        }
    }

    fn parse_statement(&mut self) -> PResult<Stmt> {
        match self.peek() {
            TokenKind::LBrace => self.parse_block(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Assert => self.parse_assert(),
            TokenKind::Var | TokenKind::Def => {
                let start = self.peek_span();
                let decl = self.parse_declaration()?;
                Ok(Stmt::Declaration(Box::new(decl), start))
            }
            _ => self.parse_expr_statement(),
        }
    }

    fn parse_if(&mut self) -> PResult<Stmt> {
        let start = self.expect(TokenKind::If, "'if'")?.span;
        let cond = self.parse_expr()?;
        let then_branch = self.parse_statement()?;
        if self.check(&TokenKind::Else) {
            self.advance();
            let else_branch = self.parse_statement()?;
            let span = start.merge(else_branch.span());
            Ok(Stmt::IfElse(
                Box::new(cond),
                Box::new(then_branch),
                Box::new(else_branch),
                span,
            ))
        } else {
            let span = start.merge(then_branch.span());
            Ok(Stmt::If(Box::new(cond), Box::new(then_branch), span))
        }
    }

    fn parse_while(&mut self) -> PResult<Stmt> {
        let start = self.expect(TokenKind::While, "'while'")?.span;
        let cond = self.parse_expr()?;
        let body = self.parse_statement()?;
        let span = start.merge(body.span());
        Ok(Stmt::While(Box::new(cond), Box::new(body), span))
    }

    fn parse_do_while(&mut self) -> PResult<Stmt> {
        let start = self.expect(TokenKind::Do, "'do'")?.span;
        let body = self.parse_statement()?;
        self.expect(TokenKind::While, "'while'")?;
        let cond = self.parse_expr()?;
        let end = self.expect(TokenKind::Semicolon, "';'")?.span;
        Ok(Stmt::DoWhile(Box::new(body), Box::new(cond), start.merge(end)))
    }

    fn parse_return(&mut self) -> PResult<Stmt> {
        let start = self.expect(TokenKind::Return, "'return'")?.span;
        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };
        let end = self.expect(TokenKind::Semicolon, "';'")?.span;
        Ok(Stmt::Return(value, start.merge(end)))
    }

    fn parse_assert(&mut self) -> PResult<Stmt> {
        let start = self.expect(TokenKind::Assert, "'assert'")?.span;
        let expr = self.parse_expr()?;
        let end = self.expect(TokenKind::Semicolon, "';'")?.span;
        Ok(Stmt::Assert(Box::new(expr), start.merge(end)))
    }

    fn parse_expr_statement(&mut self) -> PResult<Stmt> {
        let expr = self.parse_expr()?;
        let end = self.expect(TokenKind::Semicolon, "';'")?.span;
        let span = expr.span().merge(end);
        Ok(Stmt::Expr(Box::new(expr), span))
    }

    // ── Expressions ──
    //
    // Layer 1 (lowest) → layer 7 (highest), per spec §4.1.

    pub fn parse_expr(&mut self) -> PResult<Expr> {
        self.parse_logical()
    }

    fn parse_logical(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_equality()?;
        loop {
            let op = match self.peek() {
                TokenKind::And => BinaryOp::And,
                TokenKind::Or => BinaryOp::Or,
                TokenKind::Xor => BinaryOp::Xor,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_equality()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary(BinaryExpr {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
                span,
                ty: None,
            });
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::Ne,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_relational()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary(BinaryExpr {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
                span,
                ty: None,
            });
        }
        Ok(lhs)
    }

    fn parse_relational(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_additive()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary(BinaryExpr {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
                span,
                ty: None,
            });
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> PResult<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary(BinaryExpr {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
                span,
                ty: None,
            });
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> PResult<Expr> {
        let mut lhs = self.postfix_with_assign()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => break,
            };
            self.advance();
            let rhs = self.postfix_with_assign()?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary(BinaryExpr {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
                span,
                ty: None,
            });
        }
        Ok(lhs)
    }

    /// Layer 6: postfix indexing, with an optional trailing assignment.
    /// The parser's one genuine two-attempt disambiguation: a plain
    /// expression vs. an assignment target both start by parsing the same
    /// postfix chain, and only diverge once an assignment operator is (or
    /// isn't) seen next — there is no backtracking because both paths
    /// share the same prefix parse.
    fn postfix_with_assign(&mut self) -> PResult<Expr> {
        let target = self.parse_postfix()?;
        let op = match self.peek() {
            TokenKind::Eq => AssignOp::Assign,
            TokenKind::PlusEq => AssignOp::AddAssign,
            TokenKind::MinusEq => AssignOp::SubAssign,
            TokenKind::StarEq => AssignOp::MulAssign,
            TokenKind::SlashEq => AssignOp::DivAssign,
            TokenKind::PercentEq => AssignOp::RemAssign,
            _ => return Ok(target),
        };
        self.advance();
        let value = self.parse_expr()?;
        let span = target.span().merge(value.span());
        Ok(Expr::Assign(AssignExpr {
            op,
            target: Box::new(target),
            value: Box::new(value),
            span,
            ty: None,
        }))
    }

    fn parse_postfix(&mut self) -> PResult<Expr> {
        let mut expr = self.parse_primary()?;
        while self.check(&TokenKind::LBracket) {
            self.advance();
            let index = self.parse_expr()?;
            let end = self.expect(TokenKind::RBracket, "']'")?.span;
            let span = expr.span().merge(end);
            expr = Expr::Access(AccessExpr {
                array: Box::new(expr),
                index: Box::new(index),
                span,
                ty: None,
            });
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> PResult<Expr> {
        let start = self.peek_span();
        match self.peek().clone() {
            TokenKind::IntegerLit(n) => {
                self.advance();
                Ok(Expr::IntegerLit(n, start))
            }
            TokenKind::RationalLit(num, scale) => {
                self.advance();
                Ok(Expr::RationalLit(
                    num_rational::BigRational::new(num, scale),
                    start,
                ))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::BoolLit(true, start))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::BoolLit(false, start))
            }
            TokenKind::Plus | TokenKind::Minus | TokenKind::Not | TokenKind::Len => {
                let op = match self.peek() {
                    TokenKind::Plus => UnaryOp::Plus,
                    TokenKind::Minus => UnaryOp::Minus,
                    TokenKind::Not => UnaryOp::Not,
                    TokenKind::Len => UnaryOp::Len,
                    _ => unreachable!(),
                };
                self.advance();
                let operand = self.parse_postfix()?;
                let span = start.merge(operand.span());
                Ok(Expr::Unary(UnaryExpr {
                    op,
                    operand: Box::new(operand),
                    span,
                    ty: None,
                }))
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(&TokenKind::RBracket) {
                    loop {
                        elements.push(self.parse_expr()?);
                        if self.check(&TokenKind::Comma) {
                            self.advance();
                        } else {
                            break;
                        }
                    }
                }
                let end = self.expect(TokenKind::RBracket, "']'")?.span;
                Ok(Expr::Array(ArrayExpr {
                    elements,
                    span: start.merge(end),
                    ty: None,
                }))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                let end = self.expect(TokenKind::RParen, "')'")?.span;
                Ok(Expr::Parenthesized(Box::new(inner), start.merge(end)))
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.check(&TokenKind::LParen) {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if self.check(&TokenKind::Comma) {
                                self.advance();
                            } else {
                                break;
                            }
                        }
                    }
                    let end = self.expect(TokenKind::RParen, "')'")?.span;
                    Ok(Expr::Call(CallExpr {
                        callee: name,
                        callee_span: start,
                        args,
                        span: start.merge(end),
                        ty: None,
                    }))
                } else {
                    Ok(Expr::Variable(VariableExpr {
                        name,
                        span: start,
                        ty: None,
                    }))
                }
            }
            _ => Err(self.error(
                vec![
                    "integer literal",
                    "rational literal",
                    "identifier",
                    "'('",
                    "'['",
                    "'true'",
                    "'false'",
                    "unary operator",
                ],
                false,
            )),
        }
    }
}

/// Parse Devin source into an AST plus a (zero-or-one element) list of
/// parse errors, per the Core API in spec §6.
pub fn parse(source: &str) -> (Option<Devin>, Vec<ParseError>) {
    let tokens = match tokenize(source) {
        Ok(tokens) => tokens,
        Err(e) => return (None, vec![lex_error_to_parse_error(e)]),
    };
    let mut parser = Parser::new(tokens);
    match parser.parse_program() {
        Ok(ast) => (Some(ast), Vec::new()),
        Err(e) => (None, vec![e]),
    }
}

fn lex_error_to_parse_error(e: LexError) -> ParseError {
    match e {
        LexError::UnexpectedChar { ch, pos } => ParseError {
            span: Span::new(pos, pos + ch.len_utf8()),
            found: format!("character '{}'", ch),
            expected: vec!["a valid token"],
            fatal: true,
        },
        LexError::InvalidNumber { pos } => ParseError {
            span: Span::new(pos, pos),
            found: "malformed number".to_string(),
            expected: vec!["digits"],
            fatal: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(src: &str) -> Devin {
        let (ast, errors) = parse(src);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        ast.unwrap()
    }

    #[test]
    fn parses_variable_decl() {
        let ast = parse_ok("var x = 1;");
        assert_eq!(ast.declarations.len(), 1);
    }

    #[test]
    fn parses_function_with_params_and_ref() {
        let ast = parse_ok("def f(ref a, b: Int): Int { return b; }");
        match &ast.declarations[0] {
            Declaration::Function(f) => {
                assert_eq!(f.parameters.len(), 2);
                assert!(f.parameters[0].is_ref);
                assert!(!f.parameters[1].is_ref);
            }
            _ => panic!("expected function decl"),
        }
    }

    #[test]
    fn precedence_respects_spec_layering() {
        // 2*y + x must parse as (2*y) + x, not 2*(y+x)
        let ast = parse_ok("var z = 2*y + x;");
        match &ast.declarations[0] {
            Declaration::Variable(v) => match &v.initializer {
                Expr::Binary(b) => assert_eq!(b.op, BinaryOp::Add),
                _ => panic!("expected top-level add"),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn call_vs_variable_disambiguation() {
        let ast = parse_ok("var a = f; var b = f();");
        match &ast.declarations[0] {
            Declaration::Variable(v) => assert!(matches!(v.initializer, Expr::Variable(_))),
            _ => unreachable!(),
        }
        match &ast.declarations[1] {
            Declaration::Variable(v) => assert!(matches!(v.initializer, Expr::Call(_))),
            _ => unreachable!(),
        }
    }

    #[test]
    fn eq_vs_eqeq_in_assignment_position() {
        let ast = parse_ok("def f() { var x = 1; x = 2; }");
        match &ast.declarations[0] {
            Declaration::Function(f) => match f.body.as_ref() {
                Stmt::Block(items, _) => {
                    assert!(matches!(items[1], BlockItem::Statement(Stmt::Expr(_, _))));
                }
                _ => unreachable!(),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn else_attaches_to_nearest_if() {
        let ast = parse_ok("def f() { if (true) if (false) { } else { } }");
        match &ast.declarations[0] {
            Declaration::Function(f) => match f.body.as_ref() {
                Stmt::Block(items, _) => match &items[0] {
                    BlockItem::Statement(Stmt::If(_, inner, _)) => {
                        assert!(matches!(inner.as_ref(), Stmt::IfElse(_, _, _, _)));
                    }
                    _ => panic!("expected outer if without else"),
                },
                _ => unreachable!(),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn reports_single_error_on_malformed_input() {
        let (ast, errors) = parse("def f( { }");
        assert!(ast.is_none());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn array_repetition_and_indexing_parse() {
        let ast = parse_ok("var a = [1, 2][0] * 5;");
        assert_eq!(ast.declarations.len(), 1);
    }
}
