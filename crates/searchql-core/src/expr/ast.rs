use crate::{
    relevance::RelevanceCall,
    value::{ArithOp, ExprType, Value},
};
use std::{
    fmt,
    ops::{BitAnd, BitOr},
};

///
/// Expression AST
///
/// Untyped tree handed over by the planner. Field references and calls
/// are resolved by name during binding; nothing here is type checked.
///

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    /// Operator with its operands swapped: `a < b` ⇔ `b > a`.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Eq => Self::Eq,
            Self::Ne => Self::Ne,
            Self::Lt => Self::Gt,
            Self::Lte => Self::Gte,
            Self::Gt => Self::Lt,
            Self::Gte => Self::Lte,
        }
    }

    /// Complement under two-valued logic: `!(a < b)` ⇔ `a >= b`.
    #[must_use]
    pub const fn negate(self) -> Self {
        match self {
            Self::Eq => Self::Ne,
            Self::Ne => Self::Eq,
            Self::Lt => Self::Gte,
            Self::Lte => Self::Gt,
            Self::Gt => Self::Lte,
            Self::Gte => Self::Lt,
        }
    }

    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

///
/// Expr
///

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Value),
    Field(String),
    Cast {
        expr: Box<Self>,
        ty: ExprType,
    },
    Not(Box<Self>),
    And(Vec<Self>),
    Or(Vec<Self>),
    Compare {
        op: CompareOp,
        left: Box<Self>,
        right: Box<Self>,
    },
    Arith {
        op: ArithOp,
        left: Box<Self>,
        right: Box<Self>,
    },
    Neg(Box<Self>),
    In {
        expr: Box<Self>,
        list: Vec<Self>,
        negated: bool,
    },
    Call {
        name: String,
        args: Vec<Self>,
    },
    Relevance(RelevanceCall),
}

impl Expr {
    #[must_use]
    pub const fn lit(value: Value) -> Self {
        Self::Literal(value)
    }

    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    #[must_use]
    pub fn cast(expr: Self, ty: ExprType) -> Self {
        Self::Cast {
            expr: Box::new(expr),
            ty,
        }
    }

    #[must_use]
    pub const fn and(exprs: Vec<Self>) -> Self {
        Self::And(exprs)
    }

    #[must_use]
    pub const fn or(exprs: Vec<Self>) -> Self {
        Self::Or(exprs)
    }

    #[expect(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(expr: Self) -> Self {
        Self::Not(Box::new(expr))
    }

    #[must_use]
    pub fn compare(op: CompareOp, left: Self, right: Self) -> Self {
        Self::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[must_use]
    pub fn eq(left: Self, right: Self) -> Self {
        Self::compare(CompareOp::Eq, left, right)
    }

    #[must_use]
    pub fn ne(left: Self, right: Self) -> Self {
        Self::compare(CompareOp::Ne, left, right)
    }

    #[must_use]
    pub fn lt(left: Self, right: Self) -> Self {
        Self::compare(CompareOp::Lt, left, right)
    }

    #[must_use]
    pub fn lte(left: Self, right: Self) -> Self {
        Self::compare(CompareOp::Lte, left, right)
    }

    #[must_use]
    pub fn gt(left: Self, right: Self) -> Self {
        Self::compare(CompareOp::Gt, left, right)
    }

    #[must_use]
    pub fn gte(left: Self, right: Self) -> Self {
        Self::compare(CompareOp::Gte, left, right)
    }

    #[must_use]
    pub fn arith(op: ArithOp, left: Self, right: Self) -> Self {
        Self::Arith {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[expect(clippy::should_implement_trait)]
    #[must_use]
    pub fn neg(expr: Self) -> Self {
        Self::Neg(Box::new(expr))
    }

    #[must_use]
    pub fn in_list(expr: Self, list: Vec<Self>) -> Self {
        Self::In {
            expr: Box::new(expr),
            list,
            negated: false,
        }
    }

    #[must_use]
    pub fn not_in(expr: Self, list: Vec<Self>) -> Self {
        Self::In {
            expr: Box::new(expr),
            list,
            negated: true,
        }
    }

    #[must_use]
    pub fn call(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Call {
            name: name.into(),
            args,
        }
    }

    #[must_use]
    pub fn is_null(expr: Self) -> Self {
        Self::call("isnull", vec![expr])
    }

    #[must_use]
    pub fn is_not_null(expr: Self) -> Self {
        Self::call("isnotnull", vec![expr])
    }

    #[must_use]
    pub fn like(expr: Self, pattern: impl Into<String>) -> Self {
        Self::call("like", vec![expr, Self::Literal(Value::String(pattern.into()))])
    }

    #[must_use]
    pub const fn relevance(call: RelevanceCall) -> Self {
        Self::Relevance(call)
    }
}

impl BitAnd for Expr {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::And(vec![self, rhs])
    }
}

impl BitAnd for &Expr {
    type Output = Expr;

    fn bitand(self, rhs: Self) -> Self::Output {
        Expr::And(vec![self.clone(), rhs.clone()])
    }
}

impl BitOr for Expr {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::Or(vec![self, rhs])
    }
}

impl BitOr for &Expr {
    type Output = Expr;

    fn bitor(self, rhs: Self) -> Self::Output {
        Expr::Or(vec![self.clone(), rhs.clone()])
    }
}
