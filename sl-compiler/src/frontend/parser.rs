//! Hand-written recursive-descent parser for SL.
//!
//! Statement boundaries do not need separators: every statement begins
//! with a keyword or an identifier, so `;` is accepted and skipped but
//! never required.

use crate::ast::*;
use crate::frontend::lexer::Token;
use std::fmt;
use std::mem;

#[derive(Debug, Clone)]
pub struct ParseError {
    pub location: usize,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseError {}

pub fn parse(tokens: Vec<(Token, Span)>, source_len: usize) -> Result<Program, ParseError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source_len,
        ids: NodeIdGen::new(),
    };
    parser.parse_program()
}

struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    end: usize,
    ids: NodeIdGen,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_at(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|(t, _)| t)
    }

    fn here(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(_, s)| s.start)
            .unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<(Token, Span)> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            location: self.here(),
            message: message.into(),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(tok) => self.error(format!("expected {}, found {}", expected, tok)),
            None => self.error(format!("expected {}, found end of file", expected)),
        }
    }

    /// Consume a token of the same variant as `expected` or fail.
    fn expect(&mut self, expected: Token) -> Result<Span, ParseError> {
        match self.peek() {
            Some(tok) if mem::discriminant(tok) == mem::discriminant(&expected) => {
                Ok(self.advance().map(|(_, s)| s).unwrap_or(Span::new(0, 0)))
            }
            _ => Err(self.unexpected(&expected.to_string())),
        }
    }

    fn eat(&mut self, token: Token) -> bool {
        match self.peek() {
            Some(tok) if mem::discriminant(tok) == mem::discriminant(&token) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn skip_separators(&mut self) {
        while self.eat(Token::Semicolon) {}
    }

    // ── Program structure ────────────────────────────────────────────

    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let id = self.ids.next();
        let mut functions = Vec::new();
        self.skip_separators();
        while self.peek().is_some() {
            functions.push(self.parse_function()?);
            self.skip_separators();
        }
        Ok(Program { id, functions })
    }

    fn parse_function(&mut self) -> Result<Function, ParseError> {
        let id = self.ids.next();
        self.expect(Token::Func)?;
        let (name, name_span) = self.parse_name()?;

        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        if !matches!(self.peek(), Some(Token::RParen)) {
            loop {
                let param_id = self.ids.next();
                let (pname, pspan) = self.parse_name()?;
                self.expect(Token::Colon)?;
                let ty = self.parse_type_expr()?;
                params.push(Param {
                    id: param_id,
                    name: pname,
                    span: pspan,
                    ty,
                });
                if !self.eat(Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RParen)?;

        let ret = if self.eat(Token::Colon) {
            Some(self.parse_basic_type_node()?)
        } else {
            None
        };

        let mut decls = Vec::new();
        loop {
            self.skip_separators();
            if !matches!(self.peek(), Some(Token::Var)) {
                break;
            }
            decls.push(self.parse_var_decl()?);
        }

        let body = self.parse_statements()?;
        self.expect(Token::Endfunc)?;

        Ok(Function {
            id,
            name,
            name_span,
            params,
            ret,
            decls,
            body,
        })
    }

    fn parse_var_decl(&mut self) -> Result<VarDecl, ParseError> {
        let id = self.ids.next();
        self.expect(Token::Var)?;
        let mut names = Vec::new();
        loop {
            let (name, span) = self.parse_name()?;
            names.push((name, span));
            if !self.eat(Token::Comma) {
                break;
            }
        }
        self.expect(Token::Colon)?;
        let ty = self.parse_type_expr()?;
        Ok(VarDecl { id, names, ty })
    }

    fn parse_type_expr(&mut self) -> Result<TypeExpr, ParseError> {
        let id = self.ids.next();
        if matches!(self.peek(), Some(Token::Array)) {
            let start = self.expect(Token::Array)?;
            // Both `array 3 of int` and `array [3] of int` are accepted.
            let bracketed = self.eat(Token::LBracket);
            let size = self.parse_array_size()?;
            if bracketed {
                self.expect(Token::RBracket)?;
            }
            self.expect(Token::Of)?;
            let (elem, elem_span) = self.parse_basic_type()?;
            Ok(TypeExpr {
                id,
                span: start.to(elem_span),
                kind: TypeExprKind::Array { size, elem },
            })
        } else {
            let (basic, span) = self.parse_basic_type()?;
            Ok(TypeExpr {
                id,
                span,
                kind: TypeExprKind::Basic(basic),
            })
        }
    }

    fn parse_array_size(&mut self) -> Result<usize, ParseError> {
        match self.peek() {
            Some(Token::IntVal(text)) => {
                let size: usize = text
                    .parse()
                    .map_err(|_| self.error(format!("array size {} is out of range", text)))?;
                if size == 0 {
                    return Err(self.error("array size must be positive"));
                }
                self.pos += 1;
                Ok(size)
            }
            _ => Err(self.unexpected("array size")),
        }
    }

    fn parse_basic_type(&mut self) -> Result<(BasicType, Span), ParseError> {
        let basic = match self.peek() {
            Some(Token::Int) => BasicType::Int,
            Some(Token::Float) => BasicType::Float,
            Some(Token::Bool) => BasicType::Bool,
            Some(Token::Char) => BasicType::Char,
            _ => return Err(self.unexpected("type")),
        };
        let (_, span) = self.advance().unwrap_or((Token::Int, Span::new(0, 0)));
        Ok((basic, span))
    }

    fn parse_basic_type_node(&mut self) -> Result<BasicTypeNode, ParseError> {
        let id = self.ids.next();
        let (ty, span) = self.parse_basic_type()?;
        Ok(BasicTypeNode { id, span, ty })
    }

    fn parse_name(&mut self) -> Result<(String, Span), ParseError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                let (_, span) = self.advance().unwrap_or((Token::Func, Span::new(0, 0)));
                Ok((name, span))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn parse_ident(&mut self) -> Result<Ident, ParseError> {
        let id = self.ids.next();
        let (name, span) = self.parse_name()?;
        Ok(Ident { id, name, span })
    }

    // ── Statements ───────────────────────────────────────────────────

    fn parse_statements(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut stmts = Vec::new();
        loop {
            self.skip_separators();
            match self.peek() {
                None
                | Some(Token::Endfunc)
                | Some(Token::Endif)
                | Some(Token::Else)
                | Some(Token::Endwhile) => break,
                _ => stmts.push(self.parse_statement()?),
            }
        }
        Ok(stmts)
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.peek() {
            Some(Token::If) => {
                let id = self.ids.next();
                let span = self.expect(Token::If)?;
                let cond = self.parse_expr()?;
                self.expect(Token::Then)?;
                let then_stmts = self.parse_statements()?;
                let else_stmts = if self.eat(Token::Else) {
                    Some(self.parse_statements()?)
                } else {
                    None
                };
                self.expect(Token::Endif)?;
                Ok(Stmt::If {
                    id,
                    span,
                    cond,
                    then_stmts,
                    else_stmts,
                })
            }
            Some(Token::While) => {
                let id = self.ids.next();
                let span = self.expect(Token::While)?;
                let cond = self.parse_expr()?;
                self.expect(Token::Do)?;
                let body = self.parse_statements()?;
                self.expect(Token::Endwhile)?;
                Ok(Stmt::While {
                    id,
                    span,
                    cond,
                    body,
                })
            }
            Some(Token::Read) => {
                let id = self.ids.next();
                let span = self.expect(Token::Read)?;
                let target = self.parse_left_expr()?;
                Ok(Stmt::Read { id, span, target })
            }
            Some(Token::Write) => {
                let id = self.ids.next();
                let span = self.expect(Token::Write)?;
                if let Some(Token::StringVal(text)) = self.peek() {
                    let value = text.clone();
                    let (_, lit_span) = self.advance().unwrap_or((Token::Write, span));
                    Ok(Stmt::WriteString {
                        id,
                        span: span.to(lit_span),
                        value,
                    })
                } else {
                    let expr = self.parse_expr()?;
                    Ok(Stmt::WriteExpr { id, span, expr })
                }
            }
            Some(Token::Return) => {
                let id = self.ids.next();
                let span = self.expect(Token::Return)?;
                let expr = if self.starts_expr() {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                Ok(Stmt::Return { id, span, expr })
            }
            Some(Token::Ident(_)) => {
                if matches!(self.peek_at(1), Some(Token::LParen)) {
                    let id = self.ids.next();
                    let callee = self.parse_ident()?;
                    let span = callee.span;
                    self.expect(Token::LParen)?;
                    let args = self.parse_args()?;
                    self.expect(Token::RParen)?;
                    Ok(Stmt::ProcCall {
                        id,
                        span,
                        callee,
                        args,
                    })
                } else {
                    let id = self.ids.next();
                    let target = self.parse_left_expr()?;
                    let assign_span = self.expect(Token::Assign)?;
                    let value = self.parse_expr()?;
                    Ok(Stmt::Assign {
                        id,
                        target,
                        assign_span,
                        value,
                    })
                }
            }
            _ => Err(self.unexpected("statement")),
        }
    }

    fn parse_left_expr(&mut self) -> Result<LeftExpr, ParseError> {
        let id = self.ids.next();
        let ident = self.parse_ident()?;
        if self.eat(Token::LBracket) {
            let index = self.parse_expr()?;
            self.expect(Token::RBracket)?;
            Ok(LeftExpr::Index { id, ident, index })
        } else {
            Ok(LeftExpr::Ident { id, ident })
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if matches!(self.peek(), Some(Token::RParen)) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if !self.eat(Token::Comma) {
                break;
            }
        }
        Ok(args)
    }

    fn starts_expr(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Ident(_))
                | Some(Token::IntVal(_))
                | Some(Token::FloatVal(_))
                | Some(Token::CharVal(_))
                | Some(Token::True)
                | Some(Token::False)
                | Some(Token::Not)
                | Some(Token::Plus)
                | Some(Token::Minus)
                | Some(Token::LParen)
        )
    }

    // ── Expressions ──────────────────────────────────────────────────
    // Precedence, loosest first: or, and, relational, additive,
    // multiplicative, unary. Relational operators do not chain.

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            let op_span = self.expect(Token::Or)?;
            let rhs = self.parse_and()?;
            lhs = Expr::Binary {
                id: self.ids.next(),
                op: BinOp::Or,
                op_span,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_rel()?;
        while matches!(self.peek(), Some(Token::And)) {
            let op_span = self.expect(Token::And)?;
            let rhs = self.parse_rel()?;
            lhs = Expr::Binary {
                id: self.ids.next(),
                op: BinOp::And,
                op_span,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_rel(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_add()?;
        let op = match self.peek() {
            Some(Token::EqEq) => BinOp::Eq,
            Some(Token::Neq) => BinOp::Neq,
            Some(Token::Lt) => BinOp::Lt,
            Some(Token::Le) => BinOp::Le,
            Some(Token::Gt) => BinOp::Gt,
            Some(Token::Ge) => BinOp::Ge,
            _ => return Ok(lhs),
        };
        let (_, op_span) = self.advance().unwrap_or((Token::EqEq, Span::new(0, 0)));
        let rhs = self.parse_add()?;
        Ok(Expr::Binary {
            id: self.ids.next(),
            op,
            op_span,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_add(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            let (_, op_span) = self.advance().unwrap_or((Token::Plus, Span::new(0, 0)));
            let rhs = self.parse_mul()?;
            lhs = Expr::Binary {
                id: self.ids.next(),
                op,
                op_span,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Mod,
                _ => break,
            };
            let (_, op_span) = self.advance().unwrap_or((Token::Star, Span::new(0, 0)));
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                id: self.ids.next(),
                op,
                op_span,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Some(Token::Plus) => Some(UnOp::Plus),
            Some(Token::Minus) => Some(UnOp::Neg),
            Some(Token::Not) => Some(UnOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            let id = self.ids.next();
            let (_, op_span) = self.advance().unwrap_or((Token::Plus, Span::new(0, 0)));
            let operand = self.parse_unary()?;
            Ok(Expr::Unary {
                id,
                op,
                op_span,
                operand: Box::new(operand),
            })
        } else {
            self.parse_primary()
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Some(Token::LParen) => {
                let id = self.ids.next();
                self.expect(Token::LParen)?;
                let inner = self.parse_expr()?;
                self.expect(Token::RParen)?;
                Ok(Expr::Paren {
                    id,
                    inner: Box::new(inner),
                })
            }
            Some(Token::IntVal(text)) => {
                let value = Lit::Int(text.clone());
                self.parse_literal(value)
            }
            Some(Token::FloatVal(text)) => {
                let value = Lit::Float(text.clone());
                self.parse_literal(value)
            }
            Some(Token::CharVal(text)) => {
                let value = Lit::Char(text.clone());
                self.parse_literal(value)
            }
            Some(Token::True) => self.parse_literal(Lit::Bool(true)),
            Some(Token::False) => self.parse_literal(Lit::Bool(false)),
            Some(Token::Ident(_)) => {
                let id = self.ids.next();
                let ident = self.parse_ident()?;
                if self.eat(Token::LParen) {
                    let args = self.parse_args()?;
                    self.expect(Token::RParen)?;
                    Ok(Expr::Call {
                        id,
                        callee: ident,
                        args,
                    })
                } else if self.eat(Token::LBracket) {
                    let index = self.parse_expr()?;
                    self.expect(Token::RBracket)?;
                    Ok(Expr::Index {
                        id,
                        ident,
                        index: Box::new(index),
                    })
                } else {
                    Ok(Expr::Ident { id, ident })
                }
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_literal(&mut self, value: Lit) -> Result<Expr, ParseError> {
        let id = self.ids.next();
        let (_, span) = self.advance().unwrap_or((Token::True, Span::new(0, 0)));
        Ok(Expr::Literal { id, span, value })
    }
}
