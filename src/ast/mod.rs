//! Abstract syntax tree produced by the parser and consumed by the emitter.
//!
//! The design notes accept an AST in place of the source's streaming visitor
//! callback interface; this crate takes that option; the emitter walks this tree
//! instead of being driven by parse events.

mod expression;
mod program;
mod statement;

pub use expression::{BinaryOpKind, Constant, Expression, UnaryOpKind};
pub use program::Program;
pub use statement::{Declaration, Statement, TypeName};
