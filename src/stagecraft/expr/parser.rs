// SPDX-License-Identifier: MIT

//! Recursive-descent parser for when-expressions
//!
//! Grammar, loosest binding first:
//! - `or      := and ('||' and)*`
//! - `and     := cmp ('&&' cmp)*`
//! - `cmp     := unary (('=='|'!='|'>'|'>='|'<'|'<=') unary)?`
//! - `unary   := '!' unary | primary`
//! - `primary := literal | path | '(' or ')'`
//!
//! There are no calls, indexing or assignment, so every parsed
//! expression evaluates in bounded time without side effects.

use super::ast::{CompareOp, Expr, Root};
use super::lexer::{tokenize, Token, TokenKind};
use crate::kit::error::ExprError;
use serde_json::{Number, Value};

/// Maximum nesting of `(` and `!`
pub const MAX_DEPTH: usize = 64;

/// Parse a when-expression string into an AST
pub fn parse(input: &str) -> Result<Expr, ExprError> {
    let mut parser = Parser {
        tokens: tokenize(input),
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_or()?;
    match parser.peek() {
        TokenKind::End => Ok(expr),
        _ => Err(ExprError::TrailingInput(parser.current().position)),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn current(&self) -> &Token {
        // tokenize() always terminates the stream with End
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &TokenKind {
        &self.current().kind
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        kind
    }

    fn unexpected(&self) -> ExprError {
        let token = self.current();
        match token.kind {
            TokenKind::End => ExprError::UnexpectedEnd,
            ref kind => ExprError::UnexpectedToken {
                found: kind.to_string(),
                position: token.position,
            },
        }
    }

    fn enter(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::TooDeep(MAX_DEPTH));
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let first = self.parse_and()?;
        if *self.peek() != TokenKind::OrOr {
            return Ok(first);
        }
        let mut operands = vec![first];
        while *self.peek() == TokenKind::OrOr {
            self.advance();
            operands.push(self.parse_and()?);
        }
        Ok(Expr::Or(operands))
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let first = self.parse_cmp()?;
        if *self.peek() != TokenKind::AndAnd {
            return Ok(first);
        }
        let mut operands = vec![first];
        while *self.peek() == TokenKind::AndAnd {
            self.advance();
            operands.push(self.parse_cmp()?);
        }
        Ok(Expr::And(operands))
    }

    fn parse_cmp(&mut self) -> Result<Expr, ExprError> {
        let left = self.parse_unary()?;
        let op = match self.peek() {
            TokenKind::EqEq => CompareOp::Eq,
            TokenKind::NotEq => CompareOp::NotEq,
            TokenKind::Gt => CompareOp::Gt,
            TokenKind::Gte => CompareOp::Gte,
            TokenKind::Lt => CompareOp::Lt,
            TokenKind::Lte => CompareOp::Lte,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_unary()?;
        Ok(Expr::Compare {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if *self.peek() == TokenKind::Bang {
            self.advance();
            self.enter()?;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        match self.peek().clone() {
            TokenKind::LParen => {
                self.advance();
                self.enter()?;
                let inner = self.parse_or()?;
                if *self.peek() != TokenKind::RParen {
                    return Err(self.unexpected());
                }
                self.advance();
                self.depth -= 1;
                Ok(inner)
            }
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Literal(
                    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null),
                ))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Literal(Value::String(s)))
            }
            TokenKind::Ident(ident) => {
                self.advance();
                match ident.as_str() {
                    "true" => Ok(Expr::Literal(Value::Bool(true))),
                    "false" => Ok(Expr::Literal(Value::Bool(false))),
                    "null" => Ok(Expr::Literal(Value::Null)),
                    _ => self.parse_path(Root::from_ident(&ident)),
                }
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_path(&mut self, root: Root) -> Result<Expr, ExprError> {
        let mut segments = Vec::new();
        while *self.peek() == TokenKind::Dot {
            self.advance();
            match self.peek().clone() {
                TokenKind::Ident(segment) => {
                    self.advance();
                    segments.push(segment);
                }
                _ => return Err(self.unexpected()),
            }
        }
        Ok(Expr::Path { root, segments })
    }
}
