//! Recursive-descent parser. Holds a single-lexeme lookahead over the lexer and
//! builds an [`ast::Program`] directly (see the design notes on replacing the
//! source's streaming `ModelVisitor` with an AST).

mod expression;
mod statement;

use std::{error::Error, fmt::Display};

use colored::Colorize;

use crate::ast::{Declaration, Program, TypeName};
use crate::lexer::{Lexeme, LexemeKind, Lexer, Payload};

/// Grammar violations. Carries the offending line so the CLI can render a
/// source excerpt, mirroring the teacher's `ParseError::Display`.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
}

impl SyntaxError {
    fn new(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at line {}: {}",
            "syntax error".red().bold(),
            self.line,
            self.message
        )
    }
}

impl Error for SyntaxError {}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Lexeme,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Result<Self, Box<dyn Error>> {
        let mut lexer = Lexer::new(source);
        let current = lexer
            .next()
            .expect("a fresh lexer always yields at least the eof sentinel")?;
        Ok(Self { lexer, current })
    }

    fn line(&self) -> usize {
        self.current.line
    }

    /// Consume the current lexeme and return it, advancing lookahead by one.
    fn advance(&mut self) -> Result<Lexeme, Box<dyn Error>> {
        let consumed = self.current.clone();
        if consumed.kind != LexemeKind::Eof {
            self.current = self
                .lexer
                .next()
                .expect("the eof sentinel is only consumed once")?;
        }
        Ok(consumed)
    }

    /// Consume the current lexeme if it has the expected kind, else raise a
    /// [`SyntaxError`].
    fn expect(&mut self, kind: LexemeKind) -> Result<Lexeme, Box<dyn Error>> {
        if self.current.kind == kind {
            self.advance()
        } else {
            Err(Box::new(SyntaxError::new(
                format!("expected '{kind}', found '{}'", self.current.kind),
                self.line(),
            )))
        }
    }

    fn check(&self, kind: LexemeKind) -> bool {
        self.current.kind == kind
    }

    fn unexpected(&self, context: &str) -> Box<dyn Error> {
        Box::new(SyntaxError::new(
            format!("unexpected '{}' while parsing {context}", self.current.kind),
            self.line(),
        ))
    }

    /// `program = "program" "{" declarations operators "}"`
    pub fn parse_program(mut self) -> Result<Program, Box<dyn Error>> {
        self.expect(LexemeKind::Program)?;
        self.expect(LexemeKind::LBrace)?;

        let declarations = self.parse_declarations()?;
        let body = self.parse_operators()?;

        self.expect(LexemeKind::RBrace)?;
        self.expect(LexemeKind::Eof)?;

        Ok(Program { declarations, body })
    }

    fn type_name_for(&self) -> Option<TypeName> {
        match self.current.kind {
            LexemeKind::Int => Some(TypeName::Int),
            LexemeKind::Real => Some(TypeName::Real),
            LexemeKind::Str => Some(TypeName::Str),
            LexemeKind::Boolean => Some(TypeName::Bool),
            _ => None,
        }
    }

    /// `declarations = { type ident [ "=" constant ] { "," ident [ "=" constant ] } ";" }`
    fn parse_declarations(&mut self) -> Result<Vec<Declaration>, Box<dyn Error>> {
        let mut declarations = vec![];

        while let Some(type_name) = self.type_name_for() {
            self.advance()?;

            loop {
                let line = self.line();
                let name = self.expect(LexemeKind::Id)?;
                let Payload::Str(name) = name.payload else {
                    unreachable!("Id lexemes always carry a Str payload")
                };

                let initial = if self.check(LexemeKind::Assign) {
                    self.advance()?;
                    Some(self.parse_constant()?)
                } else {
                    None
                };

                declarations.push(Declaration {
                    type_name,
                    name,
                    initial,
                    line,
                });

                if self.check(LexemeKind::Comma) {
                    self.advance()?;
                    continue;
                }
                break;
            }

            self.expect(LexemeKind::Semicolon)?;
        }

        Ok(declarations)
    }
}
