//! Tree-walking compiler from [`ast::Program`] to a flat [`Instruction`] vector.
//!
//! Forward jumps (if/else, while, do-while, break, continue) are emitted with a
//! placeholder target and back-patched once the real destination is known, using
//! three running lists: `pending_jumps` isn't needed as a single global list here
//! since every forward jump is resolved by the construct that emitted it, but the
//! per-loop `continue`/`break` patch lists are kept on a stack so nested loops
//! resolve independently.

use std::error::Error;
use std::fmt::{self, Display};

use crate::ast::{Constant, Declaration, Expression, Program, Statement};
use crate::bytecode::{BinaryOp, CompiledProgram, Instruction, Label, UnaryOp};
use crate::value::Value;

/// A `break`/`continue` outside any loop, or an assignment whose target isn't a
/// plain identifier. Both are grammatical non-sequiturs the parser can't reject
/// on its own, since the grammar has no notion of "inside a loop".
#[derive(Debug, Clone, PartialEq)]
pub struct WriterError {
    pub message: String,
    pub line: usize,
}

impl WriterError {
    fn new(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

impl Display for WriterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "compile error at line {}: {}", self.line, self.message)
    }
}

impl Error for WriterError {}

/// Per-loop patch lists: indices of `Jump` instructions emitted for `break`/
/// `continue` inside that loop, resolved once the loop finishes emitting.
#[derive(Default)]
struct LoopContext {
    break_jumps: Vec<Label>,
    continue_jumps: Vec<Label>,
}

pub struct Emitter {
    instructions: Vec<Instruction>,
    lines: Vec<usize>,
    loops: Vec<LoopContext>,
    /// The line of whatever statement/expression is currently being emitted,
    /// used by `push` so call sites don't have to thread a line through every
    /// single instruction.
    line: usize,
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            instructions: vec![],
            lines: vec![],
            loops: vec![],
            line: 0,
        }
    }

    pub fn compile(program: &Program) -> Result<CompiledProgram, Box<dyn Error>> {
        let mut emitter = Self::new();
        emitter.emit_declarations(&program.declarations)?;
        emitter.emit_statements(&program.body)?;
        Ok(CompiledProgram {
            instructions: emitter.instructions,
            lines: emitter.lines,
        })
    }

    fn here(&self) -> Label {
        self.instructions.len()
    }

    fn push(&mut self, instruction: Instruction) -> Label {
        self.instructions.push(instruction);
        self.lines.push(self.line);
        self.here() - 1
    }

    /// Overwrite a previously-emitted jump's placeholder target.
    fn patch(&mut self, at: Label, target: Label) {
        match &mut self.instructions[at] {
            Instruction::Jump(t) | Instruction::JumpIfFalse(t) | Instruction::JumpIfTrue(t) => {
                *t = target
            }
            other => unreachable!("patch() called on a non-jump instruction: {other}"),
        }
    }

    fn emit_declarations(&mut self, declarations: &[Declaration]) -> Result<(), Box<dyn Error>> {
        for declaration in declarations {
            let default = match &declaration.initial {
                Some(constant) => constant_to_value(constant),
                None => Value::default_for(declaration.type_name),
            };
            self.line = declaration.line;
            self.push(Instruction::DefineVariable {
                name: declaration.name.clone(),
                type_name: declaration.type_name,
                default,
            });
        }
        Ok(())
    }

    fn emit_statements(&mut self, statements: &[Statement]) -> Result<(), Box<dyn Error>> {
        for statement in statements {
            self.emit_statement(statement)?;
        }
        Ok(())
    }

    fn emit_statement(&mut self, statement: &Statement) -> Result<(), Box<dyn Error>> {
        match statement {
            Statement::Compound(body) => self.emit_statements(body),
            Statement::If {
                condition,
                then_branch,
                else_branch,
                line,
            } => {
                self.line = *line;
                self.emit_if(condition, then_branch, else_branch.as_deref())
            }
            Statement::While {
                condition, body, line,
            } => {
                self.line = *line;
                self.emit_while(condition, body)
            }
            Statement::DoWhile {
                body, condition, line,
            } => {
                self.line = *line;
                self.emit_do_while(body, condition)
            }
            Statement::Break { line } => self.emit_break(*line),
            Statement::Continue { line } => self.emit_continue(*line),
            Statement::Read { name, line } => {
                self.line = *line;
                self.push(Instruction::Read { name: name.clone() });
                Ok(())
            }
            Statement::Write { args, line } => {
                self.line = *line;
                self.emit_write(args)
            }
            Statement::Expression(expr) => {
                self.emit_expression(expr)?;
                self.line = expr.line();
                self.push(Instruction::Pop);
                Ok(())
            }
        }
    }

    fn emit_if(
        &mut self,
        condition: &Expression,
        then_branch: &Statement,
        else_branch: Option<&Statement>,
    ) -> Result<(), Box<dyn Error>> {
        self.emit_expression(condition)?;
        let else_jump = self.push(Instruction::JumpIfFalse(0));
        self.emit_statement(then_branch)?;

        match else_branch {
            Some(else_branch) => {
                let end_jump = self.push(Instruction::Jump(0));
                self.patch(else_jump, self.here());
                self.emit_statement(else_branch)?;
                self.patch(end_jump, self.here());
            }
            None => {
                self.patch(else_jump, self.here());
            }
        }
        Ok(())
    }

    fn emit_while(&mut self, condition: &Expression, body: &Statement) -> Result<(), Box<dyn Error>> {
        let condition_start = self.here();
        self.loops.push(LoopContext::default());

        self.emit_expression(condition)?;
        let exit_jump = self.push(Instruction::JumpIfFalse(0));
        self.emit_statement(body)?;
        self.push(Instruction::Jump(condition_start));

        let loop_end = self.here();
        self.patch(exit_jump, loop_end);
        self.resolve_loop(condition_start, loop_end);
        Ok(())
    }

    fn emit_do_while(&mut self, body: &Statement, condition: &Expression) -> Result<(), Box<dyn Error>> {
        let body_start = self.here();
        self.loops.push(LoopContext::default());

        self.emit_statement(body)?;
        self.emit_expression(condition)?;
        let back_jump = self.push(Instruction::JumpIfTrue(0));
        self.patch(back_jump, body_start);

        let loop_end = self.here();
        // `continue` re-enters at the top of the body, not the condition check
        // (the condition lives at the *bottom* of a do-while).
        self.resolve_loop(body_start, loop_end);
        Ok(())
    }

    /// `break` always exits past the loop. `continue` re-enters at whatever
    /// `continue_target` the caller passes: the condition check for `while`,
    /// the top of the body for `do-while`.
    fn resolve_loop(&mut self, continue_target: Label, break_target: Label) {
        let context = self.loops.pop().expect("emit_while/emit_do_while push a context");
        for jump in context.continue_jumps {
            self.patch(jump, continue_target);
        }
        for jump in context.break_jumps {
            self.patch(jump, break_target);
        }
    }

    fn emit_break(&mut self, line: usize) -> Result<(), Box<dyn Error>> {
        if self.loops.is_empty() {
            return Err(Box::new(WriterError::new("'break' used outside of a loop", line)));
        }
        self.line = line;
        let jump = self.push(Instruction::Jump(0));
        self.loops.last_mut().unwrap().break_jumps.push(jump);
        Ok(())
    }

    fn emit_continue(&mut self, line: usize) -> Result<(), Box<dyn Error>> {
        if self.loops.is_empty() {
            return Err(Box::new(WriterError::new(
                "'continue' used outside of a loop",
                line,
            )));
        }
        self.line = line;
        let jump = self.push(Instruction::Jump(0));
        self.loops.last_mut().unwrap().continue_jumps.push(jump);
        Ok(())
    }

    fn emit_write(&mut self, args: &[Expression]) -> Result<(), Box<dyn Error>> {
        for arg in args {
            self.emit_expression(arg)?;
            self.line = arg.line();
            self.push(Instruction::Write);
        }
        Ok(())
    }

    fn emit_expression(&mut self, expression: &Expression) -> Result<(), Box<dyn Error>> {
        self.line = expression.line();
        match expression {
            Expression::Constant { value, .. } => {
                self.push(Instruction::InvokeConstant(constant_to_value(value)));
                Ok(())
            }
            Expression::Ident { name, .. } => {
                self.push(Instruction::InvokeVariable(name.clone()));
                Ok(())
            }
            Expression::Assign { target, value, line } => {
                let Expression::Ident { name, .. } = target.as_ref() else {
                    return Err(Box::new(WriterError::new(
                        "the left-hand side of an assignment must be a variable",
                        *line,
                    )));
                };
                self.emit_expression(value)?;
                self.line = *line;
                self.push(Instruction::Store { name: name.clone() });
                // Assignment is itself an expression; its value is the assigned
                // variable re-read, so `write(x = 1)` sees `1`.
                self.push(Instruction::InvokeVariable(name.clone()));
                Ok(())
            }
            Expression::Binary { op, lhs, rhs, line } => {
                self.emit_expression(lhs)?;
                self.emit_expression(rhs)?;
                self.line = *line;
                self.push(Instruction::BinaryOp(BinaryOp::from(*op)));
                Ok(())
            }
            Expression::Unary { op, operand, line } => {
                self.emit_expression(operand)?;
                self.line = *line;
                let op = match op {
                    crate::ast::UnaryOpKind::Not => UnaryOp::Not,
                    crate::ast::UnaryOpKind::Plus => UnaryOp::UnaryPlus,
                    crate::ast::UnaryOpKind::Minus => UnaryOp::UnaryMinus,
                };
                self.push(Instruction::UnaryOp(op));
                Ok(())
            }
        }
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

fn constant_to_value(constant: &Constant) -> Value {
    match constant {
        Constant::Bool(b) => Value::Bool(*b),
        Constant::Int(i) => Value::Int(*i),
        Constant::Real(r) => Value::Real(*r),
        Constant::Str(s) => Value::Str(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn compile(source: &str) -> Vec<Instruction> {
        let program = Parser::new(source).and_then(Parser::parse_program).unwrap();
        Emitter::compile(&program)
            .expect("expected the program to compile")
            .instructions
    }

    #[test]
    fn if_without_else_jumps_past_the_body_when_false() {
        let instructions = compile("program { int x; if (x == 0) { write(1); } }");
        assert!(instructions.iter().any(|i| matches!(i, Instruction::JumpIfFalse(_))));
    }

    #[test]
    fn while_loop_jumps_back_to_the_condition() {
        let instructions = compile("program { int x; while (x < 10) { x = x + 1; } }");
        let Instruction::Jump(target) = instructions.last().unwrap() else {
            panic!("expected the loop body to end with a backward jump");
        };
        assert!(matches!(instructions[*target], Instruction::InvokeVariable(_)));
    }

    #[test]
    fn break_outside_loop_is_rejected() {
        let program = Parser::new("program { break; }")
            .and_then(Parser::parse_program)
            .unwrap();
        assert!(Emitter::compile(&program).is_err());
    }

    #[test]
    fn continue_outside_loop_is_rejected() {
        let program = Parser::new("program { continue; }")
            .and_then(Parser::parse_program)
            .unwrap();
        assert!(Emitter::compile(&program).is_err());
    }

    #[test]
    fn assignment_target_must_be_an_identifier() {
        let program = Parser::new("program { int x; 1 = x; }")
            .and_then(Parser::parse_program)
            .unwrap();
        assert!(Emitter::compile(&program).is_err());
    }

    #[test]
    fn do_while_continue_jumps_to_the_top_of_the_body_not_the_condition() {
        let instructions = compile("program { int x = 0; do { x = x + 1; continue; } while (x < 3); }");
        let continue_jump_index = instructions
            .iter()
            .position(|i| matches!(i, Instruction::Jump(t) if *t != 0))
            .unwrap();
        let Instruction::Jump(target) = instructions[continue_jump_index] else {
            unreachable!()
        };
        // The jump should land on the body's first instruction, strictly before
        // the `Store` that `x = x + 1` compiles to.
        assert!(target < instructions.iter().position(|i| matches!(i, Instruction::Store { .. })).unwrap());
    }
}
