use crate::value::ExprType;
use std::fmt;

///
/// NullPolicy
///
/// How null and missing operands reach a domain function.
///
/// - `Any`: any null operand short-circuits to null; a missing operand
///   short-circuits to missing.
/// - `None`: nulls and missing operands reach the function as `Null`.
/// - `Strict`: null or missing operands short-circuit to null.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NullPolicy {
    Any,
    None,
    Strict,
}

///
/// TypeFamily
///
/// One accepted class of operand types. An untyped `NULL` literal is
/// accepted by every family.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TypeFamily {
    Any,
    Boolean,
    Numeric,
    Integral,
    Text,
    Date,
    Timestamp,
    Ip,
}

impl TypeFamily {
    #[must_use]
    pub fn accepts(self, ty: &ExprType) -> bool {
        if *ty == ExprType::Undefined {
            return true;
        }

        match self {
            Self::Any => true,
            Self::Boolean => *ty == ExprType::Boolean,
            Self::Numeric => ty.is_numeric(),
            Self::Integral => ty.is_integral(),
            Self::Text => *ty == ExprType::String,
            Self::Date => *ty == ExprType::Date,
            Self::Timestamp => *ty == ExprType::Timestamp,
            Self::Ip => *ty == ExprType::Ip,
        }
    }
}

impl fmt::Display for TypeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Any => "ANY",
            Self::Boolean => "BOOLEAN",
            Self::Numeric => "NUMERIC",
            Self::Integral => "INTEGRAL",
            Self::Text => "STRING",
            Self::Date => "DATE",
            Self::Timestamp => "TIMESTAMP",
            Self::Ip => "IP",
        };
        f.write_str(label)
    }
}

///
/// OperandRule
///
/// Union of families accepted at one operand position.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OperandRule(pub &'static [TypeFamily]);

impl OperandRule {
    #[must_use]
    pub fn accepts(&self, ty: &ExprType) -> bool {
        self.0.iter().any(|family| family.accepts(ty))
    }
}

impl fmt::Display for OperandRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, family) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{family}")?;
        }
        Ok(())
    }
}

// Common operand rules.
pub(crate) const STRING: OperandRule = OperandRule(&[TypeFamily::Text]);
pub(crate) const NUMERIC: OperandRule = OperandRule(&[TypeFamily::Numeric]);
pub(crate) const ANY: OperandRule = OperandRule(&[TypeFamily::Any]);
pub(crate) const IP_OR_STRING: OperandRule = OperandRule(&[TypeFamily::Ip, TypeFamily::Text]);
pub(crate) const DATETIME_OR_STRING: OperandRule = OperandRule(&[
    TypeFamily::Timestamp,
    TypeFamily::Date,
    TypeFamily::Text,
]);

///
/// ReturnTypeInference
///

#[derive(Clone, Debug)]
pub enum ReturnTypeInference {
    Fixed(ExprType),
    /// Same type as operand `n`.
    ArgType(usize),
    /// Array of operand `n`'s type.
    ArrayOfArg(usize),
    Custom(fn(&[ExprType]) -> ExprType),
}

impl ReturnTypeInference {
    #[must_use]
    pub fn infer(&self, operands: &[ExprType]) -> ExprType {
        match self {
            Self::Fixed(ty) => ty.clone(),
            Self::ArgType(n) => operands.get(*n).cloned().unwrap_or(ExprType::Undefined),
            Self::ArrayOfArg(n) => {
                ExprType::array_of(operands.get(*n).cloned().unwrap_or(ExprType::Undefined))
            }
            Self::Custom(f) => f(operands),
        }
    }
}

///
/// FunctionSignature
///
/// Declared shape of a domain function. `arity` counts every parameter of
/// the domain implementation, including an injected function context.
///

#[derive(Clone, Debug)]
pub struct FunctionSignature {
    pub arity: usize,
    pub operands: Vec<OperandRule>,
    pub null_policy: NullPolicy,
    pub returns: ReturnTypeInference,
}

impl FunctionSignature {
    #[must_use]
    pub fn new(
        arity: usize,
        operands: impl Into<Vec<OperandRule>>,
        null_policy: NullPolicy,
        returns: ReturnTypeInference,
    ) -> Self {
        Self {
            arity,
            operands: operands.into(),
            null_policy,
            returns,
        }
    }

    /// Index of the first operand whose type the rules reject.
    #[must_use]
    pub fn first_rejected(&self, operands: &[ExprType]) -> Option<usize> {
        self.operands
            .iter()
            .zip(operands)
            .position(|(rule, ty)| !rule.accepts(ty))
    }
}
