use crate::value::{Value, ValueError};
use std::fmt;

///
/// ArithOp
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl ArithOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Rem => "rem",
        }
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// Checked integer arithmetic. Division by zero yields null; overflow errors.
macro_rules! int_arith {
    ($op:expr, $a:expr, $b:expr, $wrap:path) => {{
        let (a, b) = ($a, $b);
        let out = match $op {
            ArithOp::Add => a.checked_add(b),
            ArithOp::Sub => a.checked_sub(b),
            ArithOp::Mul => a.checked_mul(b),
            ArithOp::Div | ArithOp::Rem if b == 0 => return Ok(Value::Null),
            ArithOp::Div => a.checked_div(b),
            ArithOp::Rem => a.checked_rem(b),
        };
        out.map($wrap).ok_or(ValueError::Overflow { op: $op.name() })
    }};
}

macro_rules! float_arith {
    ($op:expr, $a:expr, $b:expr, $wrap:path) => {{
        let (a, b) = ($a, $b);
        Ok(match $op {
            ArithOp::Add => $wrap(a + b),
            ArithOp::Sub => $wrap(a - b),
            ArithOp::Mul => $wrap(a * b),
            ArithOp::Div | ArithOp::Rem if b == 0.0 => Value::Null,
            ArithOp::Div => $wrap(a / b),
            ArithOp::Rem => $wrap(a % b),
        })
    }};
}

/// Apply `op` to two same-tag numeric operands.
///
/// Null on either side propagates. Mixed tags are rejected; the binder
/// casts operands to their common type first.
pub fn arithmetic(op: ArithOp, left: &Value, right: &Value) -> Result<Value, ValueError> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Byte(a), Value::Byte(b)) => int_arith!(op, *a, *b, Value::Byte),
        (Value::Short(a), Value::Short(b)) => int_arith!(op, *a, *b, Value::Short),
        (Value::Integer(a), Value::Integer(b)) => int_arith!(op, *a, *b, Value::Integer),
        (Value::Long(a), Value::Long(b)) => int_arith!(op, *a, *b, Value::Long),
        (Value::Float(a), Value::Float(b)) => float_arith!(op, *a, *b, Value::Float),
        (Value::Double(a), Value::Double(b)) => float_arith!(op, *a, *b, Value::Double),
        _ => Err(ValueError::mismatch(
            format!("matching numeric operands for {op}"),
            format!("{} {op} {}", left.tag(), right.tag()),
        )),
    }
}

pub fn negate(value: &Value) -> Result<Value, ValueError> {
    let overflow = ValueError::Overflow { op: "neg" };
    match value {
        Value::Null => Ok(Value::Null),
        Value::Byte(v) => v.checked_neg().map(Value::Byte).ok_or(overflow),
        Value::Short(v) => v.checked_neg().map(Value::Short).ok_or(overflow),
        Value::Integer(v) => v.checked_neg().map(Value::Integer).ok_or(overflow),
        Value::Long(v) => v.checked_neg().map(Value::Long).ok_or(overflow),
        Value::Float(v) => Ok(Value::Float(-v)),
        Value::Double(v) => Ok(Value::Double(-v)),
        other => Err(ValueError::mismatch("numeric", other.tag())),
    }
}
