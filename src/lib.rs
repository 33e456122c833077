//! Lexer, parser, bytecode compiler, and stack VM for a small statically-typed
//! imperative language: `program { declarations operators }`.

pub mod ast;
pub mod bytecode;
pub mod emitter;
pub mod lexer;
pub mod parser;
pub mod value;
pub mod vm;

use std::error::Error;
use std::io::{BufRead, Write};

use emitter::Emitter;
use parser::Parser;
use vm::Vm;

/// Lex, parse, compile, and run a program's source, reading `read()` input
/// from `stdin` and writing `write()` output to `stdout`.
pub fn interpret<R: BufRead, W: Write>(source: &str, stdin: R, stdout: W) -> Result<(), Box<dyn Error>> {
    let program = Parser::new(source)?.parse_program()?;
    let compiled = Emitter::compile(&program)?;
    let mut vm = Vm::new(compiled, stdin, stdout);
    vm.run()
}
