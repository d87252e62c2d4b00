use crate::{
    config::RelevanceConfig,
    expr::{CompareOp, Expr, FieldOrigin, Schema},
    function::FunctionRegistry,
    relevance::{FullTextQuery, RelevanceError, translate},
    udf::{BoundUdf, BridgeError},
    value::{ArithOp, ExprType, Value, ValueError, coerce, common_type},
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// BindError
///
/// Construction-time failures of binding an expression against a schema.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum BindError {
    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{context} expects {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: &'static str,
        found: ExprType,
    },

    #[error("{context}: {left} and {right} have no common type")]
    Incompatible {
        context: String,
        left: ExprType,
        right: ExprType,
    },

    #[error("predicate must be BOOLEAN, found {0}")]
    NotPredicate(ExprType),

    #[error(transparent)]
    Literal(#[from] ValueError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Relevance(#[from] RelevanceError),
}

///
/// BoundExpr
///
/// Type-checked expression. Field references carry their schema type and
/// origin; calls carry their bound UDF; relevance calls carry their
/// translated native descriptor. Operands of comparisons, arithmetic and
/// `IN` share one type.
///

#[derive(Clone, Debug, PartialEq)]
pub enum BoundExpr {
    Literal {
        value: Value,
        ty: ExprType,
    },
    Field {
        name: String,
        ty: ExprType,
        origin: FieldOrigin,
    },
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
        ty: ExprType,
    },
    Neg(Box<Self>),
    In {
        expr: Box<Self>,
        list: Vec<Self>,
        negated: bool,
    },
    Call {
        udf: BoundUdf,
        args: Vec<Self>,
    },
    Relevance(FullTextQuery),
}

impl BoundExpr {
    #[must_use]
    pub fn literal(value: Value) -> Self {
        let ty = value.expr_type();
        Self::Literal { value, ty }
    }

    #[must_use]
    pub fn ty(&self) -> ExprType {
        match self {
            Self::Literal { ty, .. }
            | Self::Field { ty, .. }
            | Self::Cast { ty, .. }
            | Self::Arith { ty, .. } => ty.clone(),
            Self::Neg(inner) => inner.ty(),
            Self::Call { udf, .. } => udf.return_type().clone(),
            Self::Not(_)
            | Self::And(_)
            | Self::Or(_)
            | Self::Compare { .. }
            | Self::In { .. }
            | Self::Relevance(_) => ExprType::Boolean,
        }
    }

    #[must_use]
    pub const fn as_literal(&self) -> Option<&Value> {
        match self {
            Self::Literal { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Direct children, in operand order.
    #[must_use]
    pub fn children(&self) -> Vec<&Self> {
        match self {
            Self::Literal { .. } | Self::Field { .. } | Self::Relevance(_) => Vec::new(),
            Self::Cast { expr, .. } | Self::Not(expr) | Self::Neg(expr) => vec![&**expr],
            Self::And(items) | Self::Or(items) => items.iter().collect(),
            Self::Compare { left, right, .. } | Self::Arith { left, right, .. } => {
                vec![&**left, &**right]
            }
            Self::In { expr, list, .. } => std::iter::once(&**expr).chain(list).collect(),
            Self::Call { args, .. } => args.iter().collect(),
        }
    }

    /// Whether `pred` holds for this node or any descendant.
    pub fn any(&self, pred: &impl Fn(&Self) -> bool) -> bool {
        pred(self) || self.children().into_iter().any(|child| child.any(pred))
    }
}

// Script source rendering.
impl fmt::Display for BoundExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal { value, .. } => write!(f, "{value}"),
            Self::Field { name, .. } => write!(f, "`{name}`"),
            Self::Cast { expr, ty } => write!(f, "CAST({expr} AS {ty})"),
            Self::Not(inner) => write!(f, "NOT {inner}"),
            Self::And(items) => write_joined(f, items, " AND "),
            Self::Or(items) => write_joined(f, items, " OR "),
            Self::Compare { op, left, right } => write!(f, "({left} {op} {right})"),
            Self::Arith {
                op, left, right, ..
            } => write!(f, "({left} {op} {right})"),
            Self::Neg(inner) => write!(f, "-{inner}"),
            Self::In {
                expr,
                list,
                negated,
            } => {
                let keyword = if *negated { "NOT IN" } else { "IN" };
                write!(f, "({expr} {keyword} ")?;
                write_joined(f, list, ", ")?;
                f.write_str(")")
            }
            Self::Call { udf, args } => {
                f.write_str(udf.id().name)?;
                write_joined(f, args, ", ")
            }
            Self::Relevance(query) => write!(f, "{}({})", query.kind(), query.to_json()),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[BoundExpr], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(")")
}

///
/// Binder
///
/// Resolves an `Expr` against a schema, the function registry and the
/// relevance configuration. Literals are coerced eagerly; other operands
/// get explicit `Cast` nodes.
///

pub struct Binder<'a> {
    schema: &'a Schema,
    registry: &'a FunctionRegistry,
    relevance: &'a RelevanceConfig,
}

impl<'a> Binder<'a> {
    #[must_use]
    pub const fn new(
        schema: &'a Schema,
        registry: &'a FunctionRegistry,
        relevance: &'a RelevanceConfig,
    ) -> Self {
        Self {
            schema,
            registry,
            relevance,
        }
    }

    /// Bind an expression that must evaluate to a boolean.
    pub fn bind_predicate(&self, expr: &Expr) -> Result<BoundExpr, BindError> {
        let bound = self.bind(expr)?;
        match bound.ty() {
            ExprType::Boolean | ExprType::Undefined => Ok(bound),
            other => Err(BindError::NotPredicate(other)),
        }
    }

    pub fn bind(&self, expr: &Expr) -> Result<BoundExpr, BindError> {
        match expr {
            Expr::Literal(value) => Ok(BoundExpr::literal(value.clone())),
            Expr::Field(name) => {
                let field = self
                    .schema
                    .get(name)
                    .ok_or_else(|| BindError::UnknownField(name.clone()))?;
                Ok(BoundExpr::Field {
                    name: field.name.clone(),
                    ty: field.ty.ty.clone(),
                    origin: field.origin,
                })
            }
            Expr::Cast { expr, ty } => cast_to(self.bind(expr)?, ty),
            Expr::Not(inner) => {
                let inner = boolean_operand(self.bind(inner)?, "NOT")?;
                Ok(BoundExpr::Not(Box::new(inner)))
            }
            Expr::And(items) if items.is_empty() => Ok(BoundExpr::literal(Value::Boolean(true))),
            Expr::Or(items) if items.is_empty() => Ok(BoundExpr::literal(Value::Boolean(false))),
            Expr::And(items) => Ok(BoundExpr::And(self.bind_booleans(items, "AND")?)),
            Expr::Or(items) => Ok(BoundExpr::Or(self.bind_booleans(items, "OR")?)),
            Expr::Compare { op, left, right } => {
                let (left, right) = (self.bind(left)?, self.bind(right)?);
                let context = format!("comparison '{op}'");
                let ty = unify(&context, &left.ty(), &right.ty())?;
                if !ty.is_orderable() && !matches!(op, CompareOp::Eq | CompareOp::Ne) {
                    return Err(BindError::TypeMismatch {
                        context,
                        expected: "an orderable type",
                        found: ty,
                    });
                }
                Ok(BoundExpr::Compare {
                    op: *op,
                    left: Box::new(cast_to(left, &ty)?),
                    right: Box::new(cast_to(right, &ty)?),
                })
            }
            Expr::Arith { op, left, right } => {
                let context = format!("arithmetic '{op}'");
                let left = numeric_operand(self.bind(left)?, &context)?;
                let right = numeric_operand(self.bind(right)?, &context)?;
                let ty = unify(&context, &left.ty(), &right.ty())?;
                Ok(BoundExpr::Arith {
                    op: *op,
                    left: Box::new(cast_to(left, &ty)?),
                    right: Box::new(cast_to(right, &ty)?),
                    ty,
                })
            }
            Expr::Neg(inner) => {
                let inner = numeric_operand(self.bind(inner)?, "negation")?;
                Ok(BoundExpr::Neg(Box::new(inner)))
            }
            Expr::In {
                expr,
                list,
                negated,
            } => {
                let expr = self.bind(expr)?;
                let list = list
                    .iter()
                    .map(|item| self.bind(item))
                    .collect::<Result<Vec<_>, _>>()?;
                let ty = list.iter().try_fold(expr.ty(), |ty, item| {
                    unify("IN list", &ty, &item.ty())
                })?;
                Ok(BoundExpr::In {
                    expr: Box::new(cast_to(expr, &ty)?),
                    list: list
                        .into_iter()
                        .map(|item| cast_to(item, &ty))
                        .collect::<Result<_, _>>()?,
                    negated: *negated,
                })
            }
            Expr::Call { name, args } => {
                let function = self
                    .registry
                    .get(name)
                    .ok_or_else(|| BindError::UnknownFunction(name.clone()))?;
                let args = args
                    .iter()
                    .map(|arg| self.bind(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                let udf = function.bind(args.iter().map(BoundExpr::ty).collect())?;
                Ok(BoundExpr::Call { udf, args })
            }
            Expr::Relevance(call) => {
                let query = translate(call, self.relevance)?;
                if let Some(missing) = query
                    .fields()
                    .iter()
                    .find(|f| !f.is_pattern() && self.schema.get(&f.field).is_none())
                {
                    return Err(BindError::UnknownField(missing.field.clone()));
                }
                Ok(BoundExpr::Relevance(query))
            }
        }
    }

    fn bind_booleans(&self, items: &[Expr], context: &str) -> Result<Vec<BoundExpr>, BindError> {
        items
            .iter()
            .map(|item| boolean_operand(self.bind(item)?, context))
            .collect()
    }
}

fn unify(context: &str, left: &ExprType, right: &ExprType) -> Result<ExprType, BindError> {
    common_type(left, right).ok_or_else(|| BindError::Incompatible {
        context: context.to_string(),
        left: left.clone(),
        right: right.clone(),
    })
}

fn boolean_operand(expr: BoundExpr, context: &str) -> Result<BoundExpr, BindError> {
    match expr.ty() {
        ExprType::Boolean => Ok(expr),
        ExprType::Undefined => cast_to(expr, &ExprType::Boolean),
        found => Err(BindError::TypeMismatch {
            context: context.to_string(),
            expected: "BOOLEAN",
            found,
        }),
    }
}

fn numeric_operand(expr: BoundExpr, context: &str) -> Result<BoundExpr, BindError> {
    let ty = expr.ty();
    if ty.is_numeric() || ty == ExprType::Undefined {
        Ok(expr)
    } else {
        Err(BindError::TypeMismatch {
            context: context.to_string(),
            expected: "a numeric type",
            found: ty,
        })
    }
}

/// Convert `expr` to `ty`: literals are coerced now, other nodes are
/// wrapped in a `Cast`.
fn cast_to(expr: BoundExpr, ty: &ExprType) -> Result<BoundExpr, BindError> {
    if expr.ty() == *ty || *ty == ExprType::Undefined {
        return Ok(expr);
    }

    match expr {
        BoundExpr::Literal { value, .. } => Ok(BoundExpr::Literal {
            value: coerce(value, ty)?,
            ty: ty.clone(),
        }),
        other => Ok(BoundExpr::Cast {
            expr: Box::new(other),
            ty: ty.clone(),
        }),
    }
}
