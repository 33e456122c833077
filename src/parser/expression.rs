//! Expression grammar, precedence climbing from lowest to highest:
//! `assign > or > and > cmp > add > mul > not > atom`.

use std::error::Error;

use super::Parser;
use crate::ast::{BinaryOpKind, Constant, Expression, UnaryOpKind};
use crate::lexer::{LexemeKind, Payload};

impl<'a> Parser<'a> {
    pub(super) fn parse_expression(&mut self) -> Result<Expression, Box<dyn Error>> {
        self.parse_assign()
    }

    /// `assign = or [ "=" or ]`, right-associative at the statement level (each
    /// `write`/`if`/... argument parses its own top-level `assign`).
    fn parse_assign(&mut self) -> Result<Expression, Box<dyn Error>> {
        let line = self.line();
        let lhs = self.parse_or()?;

        if self.check(LexemeKind::Assign) {
            self.advance()?;
            let rhs = self.parse_or()?;
            return Ok(Expression::Assign {
                target: Box::new(lhs),
                value: Box::new(rhs),
                line,
            });
        }

        Ok(lhs)
    }

    fn parse_or(&mut self) -> Result<Expression, Box<dyn Error>> {
        let mut lhs = self.parse_and()?;
        while self.check(LexemeKind::Or) {
            let line = self.line();
            self.advance()?;
            let rhs = self.parse_and()?;
            lhs = Expression::Binary {
                op: BinaryOpKind::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expression, Box<dyn Error>> {
        let mut lhs = self.parse_cmp()?;
        while self.check(LexemeKind::And) {
            let line = self.line();
            self.advance()?;
            let rhs = self.parse_cmp()?;
            lhs = Expression::Binary {
                op: BinaryOpKind::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<Expression, Box<dyn Error>> {
        let mut lhs = self.parse_add()?;
        loop {
            let op = match self.current.kind {
                LexemeKind::Lt => BinaryOpKind::Lt,
                LexemeKind::Gt => BinaryOpKind::Gt,
                LexemeKind::Le => BinaryOpKind::Le,
                LexemeKind::Ge => BinaryOpKind::Ge,
                LexemeKind::Eq => BinaryOpKind::Eq,
                LexemeKind::Ne => BinaryOpKind::Ne,
                _ => break,
            };
            let line = self.line();
            self.advance()?;
            let rhs = self.parse_add()?;
            lhs = Expression::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_add(&mut self) -> Result<Expression, Box<dyn Error>> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.current.kind {
                LexemeKind::Plus => BinaryOpKind::Plus,
                LexemeKind::Minus => BinaryOpKind::Minus,
                _ => break,
            };
            let line = self.line();
            self.advance()?;
            let rhs = self.parse_mul()?;
            lhs = Expression::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<Expression, Box<dyn Error>> {
        let mut lhs = self.parse_not()?;
        loop {
            let op = match self.current.kind {
                LexemeKind::Star => BinaryOpKind::Mul,
                LexemeKind::Slash => BinaryOpKind::Div,
                LexemeKind::Percent => BinaryOpKind::Mod,
                _ => break,
            };
            let line = self.line();
            self.advance()?;
            let rhs = self.parse_not()?;
            lhs = Expression::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    /// `not = [ "not" ] atom`. Unary `+`/`-` are folded in here too, ahead of
    /// `atom`, since the grammar gives them atom-level precedence.
    fn parse_not(&mut self) -> Result<Expression, Box<dyn Error>> {
        let line = self.line();
        match self.current.kind {
            LexemeKind::Not => {
                self.advance()?;
                let operand = self.parse_not()?;
                Ok(Expression::Unary {
                    op: UnaryOpKind::Not,
                    operand: Box::new(operand),
                    line,
                })
            }
            LexemeKind::Plus => {
                self.advance()?;
                let operand = self.parse_not()?;
                Ok(Expression::Unary {
                    op: UnaryOpKind::Plus,
                    operand: Box::new(operand),
                    line,
                })
            }
            LexemeKind::Minus => {
                self.advance()?;
                let operand = self.parse_not()?;
                Ok(Expression::Unary {
                    op: UnaryOpKind::Minus,
                    operand: Box::new(operand),
                    line,
                })
            }
            _ => self.parse_atom(),
        }
    }

    /// `atom = ident | constant | "(" expression ")"`
    fn parse_atom(&mut self) -> Result<Expression, Box<dyn Error>> {
        let line = self.line();
        match self.current.kind {
            LexemeKind::Id => {
                let lexeme = self.advance()?;
                let Payload::Str(name) = lexeme.payload else {
                    unreachable!("Id lexemes always carry a Str payload")
                };
                Ok(Expression::Ident { name, line })
            }
            LexemeKind::IntValue
            | LexemeKind::RealValue
            | LexemeKind::StrValue
            | LexemeKind::True
            | LexemeKind::False => {
                let value = self.parse_constant()?;
                Ok(Expression::Constant { value, line })
            }
            LexemeKind::LParen => {
                self.advance()?;
                let inner = self.parse_expression()?;
                self.expect(LexemeKind::RParen)?;
                Ok(inner)
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// A single literal token: int/real/string/true/false. Used both for atoms
    /// and for declaration initializers, which the grammar restricts to bare
    /// constants rather than arbitrary expressions.
    pub(super) fn parse_constant(&mut self) -> Result<Constant, Box<dyn Error>> {
        let lexeme = self.advance()?;
        match lexeme.kind {
            LexemeKind::IntValue => {
                let Payload::Int(value) = lexeme.payload else {
                    unreachable!()
                };
                Ok(Constant::Int(value))
            }
            LexemeKind::RealValue => {
                let Payload::Real(value) = lexeme.payload else {
                    unreachable!()
                };
                Ok(Constant::Real(value))
            }
            LexemeKind::StrValue => {
                let Payload::Str(value) = lexeme.payload else {
                    unreachable!()
                };
                Ok(Constant::Str(value))
            }
            LexemeKind::True => Ok(Constant::Bool(true)),
            LexemeKind::False => Ok(Constant::Bool(false)),
            other => Err(Box::new(super::SyntaxError {
                message: format!("expected a constant, found '{other}'"),
                line: lexeme.line,
            })),
        }
    }
}
