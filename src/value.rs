//! The runtime value model: a four-way tagged union plus the closed tables of
//! which operator/operand-tag combinations are legal and what they produce.

use std::{error::Error, fmt::Display};

use crate::ast::TypeName;
use crate::bytecode::{BinaryOp, UnaryOp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Bool,
    Int,
    Real,
    Str,
}

impl Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tag::Bool => "boolean",
            Tag::Int => "int",
            Tag::Real => "real",
            Tag::Str => "string",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Real(f64),
    Str(String),
}

impl Value {
    pub fn tag(&self) -> Tag {
        match self {
            Value::Bool(_) => Tag::Bool,
            Value::Int(_) => Tag::Int,
            Value::Real(_) => Tag::Real,
            Value::Str(_) => Tag::Str,
        }
    }

    /// The type's zero value, used for declarations without an initializer.
    pub fn default_for(type_name: TypeName) -> Self {
        match type_name {
            TypeName::Bool => Value::Bool(false),
            TypeName::Int => Value::Int(0),
            TypeName::Real => Value::Real(0.0),
            TypeName::Str => Value::Str(String::new()),
        }
    }

    /// `write`'s formatting rule: Int/Real in standard decimal, Bool as the
    /// literal `true`/`false`, Str verbatim.
    pub fn format_for_write(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Real(r) => format_real(*r),
            Value::Str(s) => s.clone(),
        }
    }

    /// Parse a whitespace-delimited `read` token according to the variable's
    /// declared type.
    pub fn parse_for_read(type_name: TypeName, token: &str, line: usize) -> Result<Self, Box<dyn Error>> {
        match type_name {
            TypeName::Int => token
                .parse::<i32>()
                .map(Value::Int)
                .map_err(|_| read_error(token, "int", line)),
            TypeName::Real => token
                .parse::<f64>()
                .map(Value::Real)
                .map_err(|_| read_error(token, "real", line)),
            TypeName::Bool => match token {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(read_error(token, "boolean", line)),
            },
            TypeName::Str => Ok(Value::Str(token.to_owned())),
        }
    }
}

fn format_real(value: f64) -> String {
    if value == value.trunc() && value.is_finite() {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

fn read_error(token: &str, expected: &str, line: usize) -> Box<dyn Error> {
    Box::new(RuntimeTypeError::new(
        format!("could not parse '{token}' as {expected}"),
        line,
    ))
}

/// Operator/operand combination not in the allowed tables (§4.4).
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeTypeError {
    pub message: String,
    pub line: usize,
}

impl RuntimeTypeError {
    pub fn new(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

impl Display for RuntimeTypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "type error at line {}: {}", self.line, self.message)
    }
}

impl Error for RuntimeTypeError {}

/// A declaration's initializer type did not exactly match its declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeMismatchError {
    pub message: String,
    pub line: usize,
}

impl Display for TypeMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "type mismatch at line {}: {}", self.line, self.message)
    }
}

impl Error for TypeMismatchError {}

/// Integer division or modulo by zero. Real division by zero is not an error
/// (it follows IEEE-754 and produces ±inf/NaN).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroDivisionError {
    pub line: usize,
}

impl Display for ZeroDivisionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "division by zero at line {}", self.line)
    }
}

impl Error for ZeroDivisionError {}

fn type_error(op: impl Display, lhs: Tag, rhs: Tag, line: usize) -> Box<dyn Error> {
    Box::new(RuntimeTypeError::new(
        format!("operator '{op}' is not defined for {lhs} and {rhs}"),
        line,
    ))
}

/// Numeric promotion: `Int`/`Real` pairs widen to `Real`, `Int`/`Int` stays `Int`.
enum Numeric {
    Int(i32, i32),
    Real(f64, f64),
}

fn promote(lhs: &Value, rhs: &Value) -> Option<Numeric> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(Numeric::Int(*a, *b)),
        (Value::Real(a), Value::Real(b)) => Some(Numeric::Real(*a, *b)),
        (Value::Int(a), Value::Real(b)) => Some(Numeric::Real(*a as f64, *b)),
        (Value::Real(a), Value::Int(b)) => Some(Numeric::Real(*a, *b as f64)),
        _ => None,
    }
}

pub fn apply_binary(op: BinaryOp, lhs: Value, rhs: Value, line: usize) -> Result<Value, Box<dyn Error>> {
    use BinaryOp::*;

    match op {
        Plus | Minus | Mul | Div | Mod => apply_arithmetic(op, lhs, rhs, line),
        Lt | Gt | Le | Ge | Eq | Ne => apply_comparison(op, lhs, rhs, line),
        And => apply_logical(op, lhs, rhs, line),
        Or => apply_logical(op, lhs, rhs, line),
    }
}

fn apply_arithmetic(op: BinaryOp, lhs: Value, rhs: Value, line: usize) -> Result<Value, Box<dyn Error>> {
    use BinaryOp::*;

    if op == Plus {
        if let (Value::Str(a), Value::Str(b)) = (&lhs, &rhs) {
            return Ok(Value::Str(format!("{a}{b}")));
        }
    }

    let (lhs_tag, rhs_tag) = (lhs.tag(), rhs.tag());
    let Some(numeric) = promote(&lhs, &rhs) else {
        return Err(type_error(display_op(op), lhs_tag, rhs_tag, line));
    };

    match numeric {
        Numeric::Int(a, b) => match op {
            Plus => Ok(Value::Int(a.wrapping_add(b))),
            Minus => Ok(Value::Int(a.wrapping_sub(b))),
            Mul => Ok(Value::Int(a.wrapping_mul(b))),
            Div => {
                if b == 0 {
                    return Err(Box::new(ZeroDivisionError { line }));
                }
                Ok(Value::Int(a.wrapping_div(b)))
            }
            Mod => {
                if b == 0 {
                    return Err(Box::new(ZeroDivisionError { line }));
                }
                Ok(Value::Int(a.wrapping_rem(b)))
            }
            _ => unreachable!(),
        },
        Numeric::Real(a, b) => match op {
            Plus => Ok(Value::Real(a + b)),
            Minus => Ok(Value::Real(a - b)),
            Mul => Ok(Value::Real(a * b)),
            Div => Ok(Value::Real(a / b)),
            Mod => Err(type_error("%", Tag::Real, Tag::Real, line)),
            _ => unreachable!(),
        },
    }
}

fn apply_comparison(op: BinaryOp, lhs: Value, rhs: Value, line: usize) -> Result<Value, Box<dyn Error>> {
    use BinaryOp::*;

    if let (Value::Str(a), Value::Str(b)) = (&lhs, &rhs) {
        let ordering = a.as_bytes().cmp(b.as_bytes());
        return Ok(Value::Bool(match op {
            Lt => ordering.is_lt(),
            Gt => ordering.is_gt(),
            Le => ordering.is_le(),
            Ge => ordering.is_ge(),
            Eq => ordering.is_eq(),
            Ne => !ordering.is_eq(),
            _ => unreachable!(),
        }));
    }

    if let (Value::Bool(a), Value::Bool(b)) = (&lhs, &rhs) {
        return match op {
            Eq => Ok(Value::Bool(a == b)),
            Ne => Ok(Value::Bool(a != b)),
            _ => Err(type_error(display_op(op), Tag::Bool, Tag::Bool, line)),
        };
    }

    let (lhs_tag, rhs_tag) = (lhs.tag(), rhs.tag());
    let Some(numeric) = promote(&lhs, &rhs) else {
        return Err(type_error(display_op(op), lhs_tag, rhs_tag, line));
    };

    let ordering = match numeric {
        Numeric::Int(a, b) => a.cmp(&b),
        Numeric::Real(a, b) => a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Greater),
    };

    Ok(Value::Bool(match op {
        Lt => ordering.is_lt(),
        Gt => ordering.is_gt(),
        Le => ordering.is_le(),
        Ge => ordering.is_ge(),
        Eq => ordering.is_eq(),
        Ne => !ordering.is_eq(),
        _ => unreachable!(),
    }))
}

fn apply_logical(op: BinaryOp, lhs: Value, rhs: Value, line: usize) -> Result<Value, Box<dyn Error>> {
    let (Value::Bool(a), Value::Bool(b)) = (&lhs, &rhs) else {
        return Err(type_error(display_op(op), lhs.tag(), rhs.tag(), line));
    };

    Ok(Value::Bool(match op {
        BinaryOp::And => *a && *b,
        BinaryOp::Or => *a || *b,
        _ => unreachable!(),
    }))
}

pub fn apply_unary(op: UnaryOp, operand: Value, line: usize) -> Result<Value, Box<dyn Error>> {
    match (op, operand) {
        (UnaryOp::UnaryPlus, Value::Int(v)) => Ok(Value::Int(v)),
        (UnaryOp::UnaryPlus, Value::Real(v)) => Ok(Value::Real(v)),
        (UnaryOp::UnaryMinus, Value::Int(v)) => Ok(Value::Int(-v)),
        (UnaryOp::UnaryMinus, Value::Real(v)) => Ok(Value::Real(-v)),
        (UnaryOp::Not, Value::Bool(v)) => Ok(Value::Bool(!v)),
        (op, operand) => Err(Box::new(RuntimeTypeError::new(
            format!("unary '{}' is not defined for {}", display_unary_op(op), operand.tag()),
            line,
        ))),
    }
}

/// Coerce `value` to assign into a variable currently holding `target_tag`.
/// Allowed: `Int:=Int`, `Int:=Real` (truncating), `Real:=Int`, `Real:=Real`,
/// `Str:=Str`, `Bool:=Bool`.
pub fn coerce_assign(target_tag: Tag, value: Value, line: usize) -> Result<Value, Box<dyn Error>> {
    match (target_tag, value) {
        (Tag::Int, Value::Int(v)) => Ok(Value::Int(v)),
        (Tag::Int, Value::Real(v)) => Ok(Value::Int(v as i32)),
        (Tag::Real, Value::Real(v)) => Ok(Value::Real(v)),
        (Tag::Real, Value::Int(v)) => Ok(Value::Real(v as f64)),
        (Tag::Str, Value::Str(v)) => Ok(Value::Str(v)),
        (Tag::Bool, Value::Bool(v)) => Ok(Value::Bool(v)),
        (target_tag, value) => Err(Box::new(RuntimeTypeError::new(
            format!("cannot assign {} to a {target_tag} variable", value.tag()),
            line,
        ))),
    }
}

/// A declaration's initializer must match its declared type exactly (no
/// widening), checked at the `DefineVariable` instruction.
pub fn check_initializer_type(type_name: TypeName, value: &Value, line: usize) -> Result<(), Box<dyn Error>> {
    let expected = Tag::from(type_name);
    if value.tag() == expected {
        Ok(())
    } else {
        Err(Box::new(TypeMismatchError {
            message: format!(
                "variable declared as {expected} cannot be initialized with a {} value",
                value.tag()
            ),
            line,
        }))
    }
}

impl From<TypeName> for Tag {
    fn from(type_name: TypeName) -> Self {
        match type_name {
            TypeName::Int => Tag::Int,
            TypeName::Real => Tag::Real,
            TypeName::Str => Tag::Str,
            TypeName::Bool => Tag::Bool,
        }
    }
}

fn display_op(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Or => "or",
        BinaryOp::And => "and",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Gt => ">",
        BinaryOp::Le => "<=",
        BinaryOp::Ge => ">=",
        BinaryOp::Plus => "+",
        BinaryOp::Minus => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
    }
}

fn display_unary_op(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Not => "not",
        UnaryOp::UnaryPlus => "+",
        UnaryOp::UnaryMinus => "-",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_arithmetic_stays_int() {
        let result = apply_binary(BinaryOp::Plus, Value::Int(2), Value::Int(3), 1).unwrap();
        assert_eq!(result, Value::Int(5));
    }

    #[test]
    fn mixed_arithmetic_widens_to_real() {
        let result = apply_binary(BinaryOp::Plus, Value::Int(2), Value::Real(0.5), 1).unwrap();
        assert_eq!(result, Value::Real(2.5));
    }

    #[test]
    fn string_concatenation() {
        let result = apply_binary(
            BinaryOp::Plus,
            Value::Str("ab".into()),
            Value::Str("cd".into()),
            1,
        )
        .unwrap();
        assert_eq!(result, Value::Str("abcd".into()));
    }

    #[test]
    fn string_subtraction_is_a_type_error() {
        let result = apply_binary(
            BinaryOp::Minus,
            Value::Str("ab".into()),
            Value::Str("cd".into()),
            1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn integer_division_by_zero_errors() {
        let result = apply_binary(BinaryOp::Div, Value::Int(1), Value::Int(0), 1);
        assert!(result.is_err());
    }

    #[test]
    fn real_division_by_zero_produces_infinity() {
        let result = apply_binary(BinaryOp::Div, Value::Real(1.0), Value::Real(0.0), 1).unwrap();
        assert_eq!(result, Value::Real(f64::INFINITY));
    }

    #[test]
    fn real_modulo_is_a_type_error() {
        let result = apply_binary(BinaryOp::Mod, Value::Real(1.0), Value::Real(2.0), 1);
        assert!(result.is_err());
    }

    #[test]
    fn assignment_truncates_real_into_int() {
        let result = coerce_assign(Tag::Int, Value::Real(3.9), 1).unwrap();
        assert_eq!(result, Value::Int(3));
    }

    #[test]
    fn assignment_rejects_incompatible_types() {
        let result = coerce_assign(Tag::Str, Value::Int(1), 1);
        assert!(result.is_err());
    }

    #[test]
    fn write_formats_bool_as_literal_words() {
        assert_eq!(Value::Bool(true).format_for_write(), "true");
        assert_eq!(Value::Bool(false).format_for_write(), "false");
    }

    #[test]
    fn string_comparison_is_lexicographic_by_byte() {
        let result = apply_binary(
            BinaryOp::Lt,
            Value::Str("abc".into()),
            Value::Str("abd".into()),
            1,
        )
        .unwrap();
        assert_eq!(result, Value::Bool(true));
    }
}
