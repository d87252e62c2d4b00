//! Exact native rendering of bound predicates.
//!
//! `render(expr, true)` matches the documents where `expr` IS TRUE and
//! `render(expr, false)` those where it IS FALSE. Rows where `expr` is
//! null match neither, which keeps NOT exact under three-valued logic.

use crate::{
    backend::{NativeQuery, RangeBound, like_to_wildcard},
    expr::{BoundExpr, CompareOp, FieldOrigin},
    function::{FunctionProperties, resolve_relative},
    value::{ExprType, NativeValue, Value, format_timestamp, to_native},
};
use chrono::Utc;

/// Native form of `expr` under `polarity`, or `None` when it has none.
pub(crate) fn render(
    expr: &BoundExpr,
    polarity: bool,
    props: &FunctionProperties,
) -> Option<NativeQuery> {
    match expr {
        BoundExpr::Literal { value, .. } => match value {
            Value::Boolean(b) if *b == polarity => Some(NativeQuery::MatchAll),
            Value::Boolean(_) | Value::Null => Some(NativeQuery::MatchNone),
            _ => None,
        },
        BoundExpr::Field {
            ty: ExprType::Boolean,
            ..
        } => {
            let field = indexed_field(expr)?;
            Some(NativeQuery::term(field, NativeValue::Bool(polarity)))
        }
        BoundExpr::Not(inner) => render(inner, !polarity, props),
        // AND is false when any operand is false; OR mirrors it.
        BoundExpr::And(items) => {
            let rendered = render_all(items, polarity, props)?;
            Some(if polarity {
                NativeQuery::and(rendered)
            } else {
                NativeQuery::or(rendered)
            })
        }
        BoundExpr::Or(items) => {
            let rendered = render_all(items, polarity, props)?;
            Some(if polarity {
                NativeQuery::or(rendered)
            } else {
                NativeQuery::and(rendered)
            })
        }
        BoundExpr::Compare { op, left, right } => {
            let (field, op, value) = match (indexed_field(left), right.as_literal()) {
                (Some(field), Some(value)) => (field, *op, value),
                _ => (indexed_field(right)?, op.flip(), left.as_literal()?),
            };
            if value.is_null() {
                return Some(NativeQuery::MatchNone);
            }
            let op = if polarity { op } else { op.negate() };
            Some(compare_true(field, op, to_native(value)))
        }
        BoundExpr::In {
            expr,
            list,
            negated,
        } => {
            let field = indexed_field(expr)?;
            let literals = list
                .iter()
                .map(BoundExpr::as_literal)
                .collect::<Option<Vec<_>>>()?;
            let has_null = literals.iter().any(|v| v.is_null());
            let values: Vec<NativeValue> = literals
                .into_iter()
                .filter(|v| !v.is_null())
                .map(to_native)
                .collect();
            let member = if values.is_empty() {
                NativeQuery::MatchNone
            } else {
                NativeQuery::Terms {
                    field: field.to_string(),
                    values,
                }
            };

            Some(if polarity != *negated {
                member
            } else if has_null {
                NativeQuery::MatchNone
            } else {
                NativeQuery::and(vec![NativeQuery::exists(field), NativeQuery::not(member)])
            })
        }
        BoundExpr::Call { udf, args } => render_call(udf.id().name, args, polarity, props),
        BoundExpr::Relevance(query) => {
            let query = NativeQuery::FullText(query.clone());
            Some(if polarity {
                query
            } else {
                NativeQuery::not(query)
            })
        }
        _ => None,
    }
}

fn render_all(
    items: &[BoundExpr],
    polarity: bool,
    props: &FunctionProperties,
) -> Option<Vec<NativeQuery>> {
    items
        .iter()
        .map(|item| render(item, polarity, props))
        .collect()
}

fn indexed_field(expr: &BoundExpr) -> Option<&str> {
    match expr {
        BoundExpr::Field {
            name,
            origin: FieldOrigin::Indexed,
            ty,
        } if !matches!(ty, ExprType::Array(_) | ExprType::Struct(_)) => Some(name),
        _ => None,
    }
}

// `field op value` for a non-null field.
fn compare_true(field: &str, op: CompareOp, value: NativeValue) -> NativeQuery {
    match op {
        CompareOp::Eq => NativeQuery::term(field, value),
        CompareOp::Ne => NativeQuery::and(vec![
            NativeQuery::exists(field),
            NativeQuery::not(NativeQuery::term(field, value)),
        ]),
        CompareOp::Lt => NativeQuery::range(field, None, Some(RangeBound::exclusive(value))),
        CompareOp::Lte => NativeQuery::range(field, None, Some(RangeBound::inclusive(value))),
        CompareOp::Gt => NativeQuery::range(field, Some(RangeBound::exclusive(value)), None),
        CompareOp::Gte => NativeQuery::range(field, Some(RangeBound::inclusive(value)), None),
    }
}

fn render_call(
    name: &str,
    args: &[BoundExpr],
    polarity: bool,
    props: &FunctionProperties,
) -> Option<NativeQuery> {
    match (name, args) {
        ("isnull" | "isnotnull", [arg]) => {
            let exists = NativeQuery::exists(indexed_field(arg)?);
            let wants_null = (name == "isnull") == polarity;
            Some(if wants_null {
                NativeQuery::not(exists)
            } else {
                exists
            })
        }
        ("like", [text, pattern]) => {
            let field = indexed_field(text)?;
            if text.ty() != ExprType::String {
                return None;
            }
            let pattern = match pattern.as_literal()? {
                Value::String(pattern) => pattern,
                Value::Null => return Some(NativeQuery::MatchNone),
                _ => return None,
            };
            let wildcard = NativeQuery::Wildcard {
                field: field.to_string(),
                pattern: like_to_wildcard(pattern),
                case_insensitive: true,
            };
            Some(if polarity {
                wildcard
            } else {
                NativeQuery::and(vec![NativeQuery::exists(field), NativeQuery::not(wildcard)])
            })
        }
        ("latest" | "earliest", [expression, candidate]) => {
            let field = indexed_field(candidate)?;
            if candidate.ty() != ExprType::Timestamp {
                return None;
            }
            let Value::String(expression) = expression.as_literal()? else {
                return None;
            };
            let boundary = resolve_relative(expression, props.zoned_now()).ok()?;
            let boundary =
                NativeValue::String(format_timestamp(boundary.with_timezone(&Utc).naive_utc()));

            // latest: candidate < boundary; earliest: candidate >= boundary.
            let before = (name == "latest") == polarity;
            Some(if before {
                NativeQuery::range(field, None, Some(RangeBound::exclusive(boundary)))
            } else {
                NativeQuery::range(field, Some(RangeBound::inclusive(boundary)), None)
            })
        }
        _ => None,
    }
}
