//! Recursive-descent parser for declarations and expressions.

use crate::error::{Error, Result};
use crate::frontend::lexer::{LexError, Lexer, Token, TokenKind};
use crate::ir::{BinOp, Lit, Ty};
use crate::name::Name;
use crate::span::Span;
use crate::surface::{FModule, UDecl, UExpr, UExprKind};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Token,
}

fn parse_error(err: LexError) -> Error {
    Error::parse(err.message).with_span(err.span)
}

impl<'a> Parser<'a> {
    /// `base_offset` is the byte offset of `src` within the enclosing file;
    /// every span the parser produces is file-absolute.
    pub fn new(src: &'a str, base_offset: usize) -> Result<Self> {
        let mut lexer = Lexer::new(src, base_offset);
        let lookahead = lexer.next_token().map_err(parse_error)?;
        Ok(Parser { lexer, lookahead })
    }

    fn bump(&mut self) -> Result<Token> {
        let next = self.lexer.next_token().map_err(parse_error)?;
        Ok(std::mem::replace(&mut self.lookahead, next))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.lookahead.kind == kind {
            self.bump()
        } else {
            Err(self.error_here(format!("expected {kind}")))
        }
    }

    fn expect_ident(&mut self) -> Result<(Name, Span)> {
        match self.lookahead.kind.clone() {
            TokenKind::Ident(text) => {
                let token = self.bump()?;
                Ok((Name::source(text), token.span))
            }
            _ => Err(self.error_here("expected identifier")),
        }
    }

    fn error_here(&self, message: impl Into<String>) -> Error {
        Error::parse(format!(
            "{}, found {}",
            message.into(),
            self.lookahead.kind
        ))
        .with_span(self.lookahead.span)
    }

    fn skip_newlines(&mut self) -> Result<()> {
        while self.lookahead.kind == TokenKind::Newline {
            self.bump()?;
        }
        Ok(())
    }

    pub fn at_eof(&self) -> bool {
        self.lookahead.kind == TokenKind::Eof
    }

    pub fn lookahead_kind(&self) -> &TokenKind {
        &self.lookahead.kind
    }

    /// Consume any trailing newlines and require end of input.
    pub fn expect_end(&mut self) -> Result<()> {
        self.skip_newlines()?;
        self.expect(TokenKind::Eof)?;
        Ok(())
    }

    /// `include "path"` / `load "path"`
    pub fn parse_file_directive(&mut self, keyword: TokenKind) -> Result<String> {
        self.expect(keyword)?;
        let path = match self.lookahead.kind.clone() {
            TokenKind::Str(path) => {
                self.bump()?;
                path
            }
            _ => return Err(self.error_here("expected quoted file path")),
        };
        self.expect_end()?;
        Ok(path)
    }

    /// A stage name: either a bare identifier or a quoted string (stage
    /// names like "type inference" contain spaces).
    pub fn parse_stage_name(&mut self) -> Result<String> {
        match self.lookahead.kind.clone() {
            TokenKind::Str(name) => {
                self.bump()?;
                Ok(name)
            }
            TokenKind::Ident(name) => {
                self.bump()?;
                Ok(name)
            }
            _ => Err(self.error_here("expected stage name")),
        }
    }

    /// Parse a whole module: newline-separated declarations until EOF.
    pub fn parse_module(&mut self) -> Result<FModule> {
        let mut module = FModule::empty();
        self.skip_newlines()?;
        while !self.at_eof() {
            if self.lookahead.kind == TokenKind::KwType {
                module.ty_aliases.push(self.parse_ty_alias()?);
            } else {
                module.decls.push(self.parse_decl()?);
            }
            if !self.at_eof() {
                self.expect(TokenKind::Newline)?;
                self.skip_newlines()?;
            }
        }
        Ok(module)
    }

    /// `type T = ty`
    fn parse_ty_alias(&mut self) -> Result<(Name, Ty, Span)> {
        let start = self.expect(TokenKind::KwType)?.span;
        let (name, _) = self.expect_ident()?;
        self.expect(TokenKind::Assign)?;
        let ty = self.parse_ty()?;
        let span = Span::new(start.lo, self.lookahead.span.lo).or(start);
        Ok((name, ty, span))
    }

    /// `name = expr` or `name : ty = expr`
    fn parse_decl(&mut self) -> Result<UDecl> {
        let (name, name_span) = self.expect_ident()?;
        let ann = if self.lookahead.kind == TokenKind::Colon {
            self.bump()?;
            Some(self.parse_ty()?)
        } else {
            None
        };
        self.expect(TokenKind::Assign)?;
        let expr = self.parse_expr()?;
        let span = Span::union([name_span, expr.span]);
        Ok(UDecl {
            name,
            ann,
            expr,
            span,
        })
    }

    pub fn parse_ty(&mut self) -> Result<Ty> {
        let lhs = self.parse_ty_atom()?;
        if self.lookahead.kind == TokenKind::Arrow {
            self.bump()?;
            let rhs = self.parse_ty()?;
            Ok(Ty::Arrow(Box::new(lhs), Box::new(rhs)))
        } else {
            Ok(lhs)
        }
    }

    fn parse_ty_atom(&mut self) -> Result<Ty> {
        match self.lookahead.kind.clone() {
            TokenKind::Ident(text) => {
                self.bump()?;
                Ok(match text.as_str() {
                    "Int" => Ty::Int,
                    "Float" => Ty::Float,
                    "Bool" => Ty::Bool,
                    "Unit" => Ty::Unit,
                    _ => Ty::Named(Name::source(text)),
                })
            }
            TokenKind::LParen => {
                self.bump()?;
                let ty = self.parse_ty()?;
                self.expect(TokenKind::RParen)?;
                Ok(ty)
            }
            _ => Err(self.error_here("expected type")),
        }
    }

    pub fn parse_expr(&mut self) -> Result<UExpr> {
        match self.lookahead.kind {
            TokenKind::Backslash => self.parse_lambda(),
            TokenKind::KwIf => self.parse_if(),
            TokenKind::KwLet => self.parse_let(),
            _ => self.parse_comparison(),
        }
    }

    fn parse_lambda(&mut self) -> Result<UExpr> {
        let start = self.expect(TokenKind::Backslash)?.span;
        let (param, _) = self.expect_ident()?;
        self.expect(TokenKind::Dot)?;
        let body = self.parse_expr()?;
        let span = Span::union([start, body.span]);
        Ok(UExpr::new(
            UExprKind::Lam {
                param,
                body: Box::new(body),
            },
            span,
        ))
    }

    fn parse_if(&mut self) -> Result<UExpr> {
        let start = self.expect(TokenKind::KwIf)?.span;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::KwThen)?;
        let then = self.parse_expr()?;
        self.expect(TokenKind::KwElse)?;
        let els = self.parse_expr()?;
        let span = Span::union([start, els.span]);
        Ok(UExpr::new(
            UExprKind::If(Box::new(cond), Box::new(then), Box::new(els)),
            span,
        ))
    }

    fn parse_let(&mut self) -> Result<UExpr> {
        let start = self.expect(TokenKind::KwLet)?.span;
        let (name, _) = self.expect_ident()?;
        self.expect(TokenKind::Assign)?;
        let rhs = self.parse_expr()?;
        self.expect(TokenKind::KwIn)?;
        let body = self.parse_expr()?;
        let span = Span::union([start, body.span]);
        Ok(UExpr::new(
            UExprKind::Let {
                name,
                rhs: Box::new(rhs),
                body: Box::new(body),
            },
            span,
        ))
    }

    fn parse_comparison(&mut self) -> Result<UExpr> {
        let lhs = self.parse_additive()?;
        let op = match self.lookahead.kind {
            TokenKind::Lt => BinOp::Less,
            TokenKind::Gt => BinOp::Greater,
            TokenKind::EqEq => BinOp::Equal,
            _ => return Ok(lhs),
        };
        self.bump()?;
        let rhs = self.parse_additive()?;
        let span = Span::union([lhs.span, rhs.span]);
        Ok(UExpr::new(
            UExprKind::BinOp(op, Box::new(lhs), Box::new(rhs)),
            span,
        ))
    }

    fn parse_additive(&mut self) -> Result<UExpr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.lookahead.kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.bump()?;
            let rhs = self.parse_multiplicative()?;
            let span = Span::union([lhs.span, rhs.span]);
            lhs = UExpr::new(UExprKind::BinOp(op, Box::new(lhs), Box::new(rhs)), span);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<UExpr> {
        let mut lhs = self.parse_app()?;
        loop {
            let op = match self.lookahead.kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => return Ok(lhs),
            };
            self.bump()?;
            let rhs = self.parse_app()?;
            let span = Span::union([lhs.span, rhs.span]);
            lhs = UExpr::new(UExprKind::BinOp(op, Box::new(lhs), Box::new(rhs)), span);
        }
    }

    fn starts_primary(&self) -> bool {
        matches!(
            self.lookahead.kind,
            TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::Ident(_)
                | TokenKind::KwTrue
                | TokenKind::KwFalse
                | TokenKind::LParen
        )
    }

    fn parse_app(&mut self) -> Result<UExpr> {
        let mut func = self.parse_primary()?;
        while self.starts_primary() {
            let arg = self.parse_primary()?;
            let span = Span::union([func.span, arg.span]);
            func = UExpr::new(UExprKind::App(Box::new(func), Box::new(arg)), span);
        }
        Ok(func)
    }

    fn parse_primary(&mut self) -> Result<UExpr> {
        match self.lookahead.kind.clone() {
            TokenKind::Int(value) => {
                let token = self.bump()?;
                Ok(UExpr::new(UExprKind::Lit(Lit::Int(value)), token.span))
            }
            TokenKind::Float(value) => {
                let token = self.bump()?;
                Ok(UExpr::new(UExprKind::Lit(Lit::Float(value)), token.span))
            }
            TokenKind::KwTrue => {
                let token = self.bump()?;
                Ok(UExpr::new(UExprKind::Lit(Lit::Bool(true)), token.span))
            }
            TokenKind::KwFalse => {
                let token = self.bump()?;
                Ok(UExpr::new(UExprKind::Lit(Lit::Bool(false)), token.span))
            }
            TokenKind::Ident(text) => {
                let token = self.bump()?;
                Ok(UExpr::new(
                    UExprKind::Var(Name::source(text)),
                    token.span,
                ))
            }
            TokenKind::Minus => {
                let minus = self.bump()?;
                match self.lookahead.kind {
                    TokenKind::Int(value) => {
                        let token = self.bump()?;
                        let span = Span::union([minus.span, token.span]);
                        Ok(UExpr::new(UExprKind::Lit(Lit::Int(-value)), span))
                    }
                    TokenKind::Float(value) => {
                        let token = self.bump()?;
                        let span = Span::union([minus.span, token.span]);
                        Ok(UExpr::new(UExprKind::Lit(Lit::Float(-value)), span))
                    }
                    _ => Err(self.error_here("expected numeric literal after -")),
                }
            }
            TokenKind::LParen => {
                let open = self.bump()?;
                if self.lookahead.kind == TokenKind::RParen {
                    let close = self.bump()?;
                    let span = Span::union([open.span, close.span]);
                    return Ok(UExpr::new(UExprKind::Lit(Lit::Unit), span));
                }
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            _ => Err(self.error_here("expected expression")),
        }
    }
}
