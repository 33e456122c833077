//! The stack-based virtual machine: an operand stack, a flat variable
//! environment, and a program counter stepping through a [`CompiledProgram`].

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{self, Display};
use std::io::{BufRead, Write};

use crate::bytecode::{CompiledProgram, Instruction};
use crate::value::{self, Tag, Value};

/// Variable misuse that the emitter can't catch statically: re-declaring a
/// name, or referencing one that was never declared. Stack underflow would
/// indicate an emitter bug rather than a user error, but is reported the same
/// way rather than panicking, since it is still reachable via a malformed
/// `CompiledProgram` built by hand (e.g. in tests).
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub message: String,
    pub line: usize,
}

impl RuntimeError {
    fn new(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "runtime error at line {}: {}", self.line, self.message)
    }
}

impl Error for RuntimeError {}

/// Executes a [`CompiledProgram`] against the given input/output streams.
pub struct Vm<R, W> {
    program: CompiledProgram,
    stack: Vec<Value>,
    variables: HashMap<String, Value>,
    stdin: R,
    stdout: W,
    pending_words: std::collections::VecDeque<String>,
}

impl<R: BufRead, W: Write> Vm<R, W> {
    pub fn new(program: CompiledProgram, stdin: R, stdout: W) -> Self {
        Self {
            program,
            stack: vec![],
            variables: HashMap::new(),
            stdin,
            stdout,
            pending_words: std::collections::VecDeque::new(),
        }
    }

    pub fn run(&mut self) -> Result<(), Box<dyn Error>> {
        let mut pc = 0usize;
        while pc < self.program.instructions.len() {
            let line = self.program.lines[pc];
            let next = self.step(pc, line)?;
            pc = next;
        }
        Ok(())
    }

    /// Execute the instruction at `pc`, returning the next `pc`.
    fn step(&mut self, pc: usize, line: usize) -> Result<usize, Box<dyn Error>> {
        match self.program.instructions[pc].clone() {
            Instruction::DefineVariable {
                name,
                type_name,
                default,
            } => {
                if self.variables.contains_key(&name) {
                    return Err(Box::new(RuntimeError::new(
                        format!("variable '{name}' is already declared"),
                        line,
                    )));
                }
                value::check_initializer_type(type_name, &default, line)?;
                self.variables.insert(name, default);
            }
            Instruction::Read { name } => {
                let type_name = self.declared_type(&name, line)?;
                let token = self.next_word()?;
                let value = Value::parse_for_read(type_name, &token, line)?;
                self.variables.insert(name, value);
            }
            Instruction::Store { name } => {
                let value = self.pop(line)?;
                let target_tag = self.variable(&name, line)?.tag();
                let coerced = value::coerce_assign(target_tag, value, line)?;
                self.variables.insert(name, coerced);
            }
            Instruction::Write => {
                let value = self.pop(line)?;
                write!(self.stdout, "{}", value.format_for_write())?;
            }
            Instruction::Pop => {
                self.pop(line)?;
            }
            Instruction::InvokeConstant(value) => self.stack.push(value),
            Instruction::InvokeVariable(name) => {
                let value = self.variable(&name, line)?.clone();
                self.stack.push(value);
            }
            Instruction::BinaryOp(op) => {
                let rhs = self.pop(line)?;
                let lhs = self.pop(line)?;
                self.stack.push(value::apply_binary(op, lhs, rhs, line)?);
            }
            Instruction::UnaryOp(op) => {
                let operand = self.pop(line)?;
                self.stack.push(value::apply_unary(op, operand, line)?);
            }
            Instruction::Jump(target) => return Ok(target),
            Instruction::JumpIfFalse(target) => {
                if !self.pop_bool(line)? {
                    return Ok(target);
                }
            }
            Instruction::JumpIfTrue(target) => {
                if self.pop_bool(line)? {
                    return Ok(target);
                }
            }
            Instruction::NoOp => {}
        }
        Ok(pc + 1)
    }

    fn pop(&mut self, line: usize) -> Result<Value, Box<dyn Error>> {
        self.stack
            .pop()
            .ok_or_else(|| -> Box<dyn Error> { Box::new(RuntimeError::new("operand stack underflow", line)) })
    }

    fn pop_bool(&mut self, line: usize) -> Result<bool, Box<dyn Error>> {
        match self.pop(line)? {
            Value::Bool(b) => Ok(b),
            other => Err(Box::new(RuntimeError::new(
                format!("expected a boolean condition, found a {}", other.tag()),
                line,
            ))),
        }
    }

    fn variable(&self, name: &str, line: usize) -> Result<&Value, Box<dyn Error>> {
        self.variables
            .get(name)
            .ok_or_else(|| -> Box<dyn Error> {
                Box::new(RuntimeError::new(format!("undeclared variable '{name}'"), line))
            })
    }

    fn declared_type(&self, name: &str, line: usize) -> Result<crate::ast::TypeName, Box<dyn Error>> {
        Ok(match self.variable(name, line)?.tag() {
            Tag::Bool => crate::ast::TypeName::Bool,
            Tag::Int => crate::ast::TypeName::Int,
            Tag::Real => crate::ast::TypeName::Real,
            Tag::Str => crate::ast::TypeName::Str,
        })
    }

    /// Pull the next whitespace-delimited token off stdin, refilling the
    /// pending-word queue a line at a time.
    fn next_word(&mut self) -> Result<String, Box<dyn Error>> {
        loop {
            if let Some(word) = self.pending_words.pop_front() {
                return Ok(word);
            }

            let mut line = String::new();
            let bytes_read = self.stdin.read_line(&mut line)?;
            if bytes_read == 0 {
                return Err(Box::new(RuntimeError::new(
                    "unexpected end of input while reading a value",
                    0,
                )));
            }
            self.pending_words
                .extend(line.split_whitespace().map(str::to_owned));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::Emitter;
    use crate::parser::Parser;
    use std::io::{BufReader, Cursor};

    fn run(source: &str, input: &str) -> String {
        let program = Parser::new(source).and_then(Parser::parse_program).unwrap();
        let compiled = Emitter::compile(&program).unwrap();
        let mut output = Vec::new();
        let reader = BufReader::new(Cursor::new(input.as_bytes().to_vec()));
        let mut vm = Vm::new(compiled, reader, &mut output);
        vm.run().expect("expected the program to run without error");
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn writes_arithmetic_result() {
        assert_eq!(run("program { write(2 + 3 * 4); }", ""), "14");
    }

    #[test]
    fn reads_and_echoes_an_int() {
        assert_eq!(run("program { int x; read(x); write(x + 1); }", "41"), "42");
    }

    #[test]
    fn while_loop_accumulates() {
        let source = "program { int i = 0; int total = 0; while (i < 5) { total = total + i; i = i + 1; } write(total); }";
        assert_eq!(run(source, ""), "10");
    }

    #[test]
    fn do_while_runs_body_at_least_once() {
        let source = "program { int i = 0; do { write(i); i = i + 1; } while (i < 0); }";
        assert_eq!(run(source, ""), "0");
    }

    #[test]
    fn break_exits_the_loop_immediately() {
        let source = "program { int i = 0; while (i < 10) { if (i == 3) { break; } write(i); i = i + 1; } }";
        assert_eq!(run(source, ""), "012");
    }

    #[test]
    fn continue_skips_to_the_next_iteration() {
        let source = "program { int i = 0; while (i < 5) { i = i + 1; if (i == 3) { continue; } write(i); } }";
        assert_eq!(run(source, ""), "1245");
    }

    #[test]
    fn integer_division_by_zero_is_a_runtime_error() {
        let program = Parser::new("program { write(1 / 0); }")
            .and_then(Parser::parse_program)
            .unwrap();
        let compiled = Emitter::compile(&program).unwrap();
        let mut output = Vec::new();
        let mut vm = Vm::new(compiled, BufReader::new(Cursor::new(vec![])), &mut output);
        assert!(vm.run().is_err());
    }

    #[test]
    fn initializer_type_mismatch_is_a_runtime_error() {
        // The grammar accepts any constant as an initializer; the mismatch is
        // only caught once the DefineVariable instruction actually executes.
        let program = Parser::new("program { int x = \"oops\"; }")
            .and_then(Parser::parse_program)
            .unwrap();
        let compiled = Emitter::compile(&program).unwrap();
        let mut output = Vec::new();
        let mut vm = Vm::new(compiled, BufReader::new(Cursor::new(vec![])), &mut output);
        assert!(vm.run().is_err());
    }

    #[test]
    fn assignment_expression_value_is_the_assigned_value() {
        assert_eq!(run("program { int x; write(x = 7); }", ""), "7");
    }

    #[test]
    fn redeclaring_a_variable_is_a_runtime_error() {
        let program = Parser::new("program { int x; int x; }")
            .and_then(Parser::parse_program)
            .unwrap();
        let compiled = Emitter::compile(&program).unwrap();
        let mut output = Vec::new();
        let mut vm = Vm::new(compiled, BufReader::new(Cursor::new(vec![])), &mut output);
        assert!(vm.run().is_err());
    }
}
