use crate::value::{Value, ValueError};
use std::cmp::Ordering;

///
/// NullOrder
///
/// Placement of nulls under the total sort ordering.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NullOrder {
    #[default]
    First,
    Last,
}

fn incomparable(left: &Value, right: &Value) -> ValueError {
    ValueError::Incomparable {
        left: left.tag(),
        right: right.tag(),
    }
}

/// Three-valued ordering comparison.
///
/// `Ok(None)` when either side is null or a float side is NaN. Floats
/// compare under IEEE rules, so `-0.0` equals `0.0`. Values of different
/// tags never compare; the binder inserts explicit casts before evaluation.
pub fn compare(left: &Value, right: &Value) -> Result<Option<Ordering>, ValueError> {
    let ordering = match (left, right) {
        (Value::Null, _) | (_, Value::Null) => return Ok(None),
        (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        (Value::Byte(a), Value::Byte(b)) => a.cmp(b),
        (Value::Short(a), Value::Short(b)) => a.cmp(b),
        (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
        (Value::Long(a), Value::Long(b)) => a.cmp(b),
        (Value::Float(a), Value::Float(b)) => return Ok(a.partial_cmp(b)),
        (Value::Double(a), Value::Double(b)) => return Ok(a.partial_cmp(b)),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Date(a), Value::Date(b)) => a.cmp(b),
        (Value::Time(a), Value::Time(b)) => a.cmp(b),
        (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
        (Value::Ip(a), Value::Ip(b)) => a.cmp(b),
        (Value::Binary(a), Value::Binary(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => {
            for (x, y) in a.iter().zip(b) {
                match compare(x, y)? {
                    None => return Ok(None),
                    Some(Ordering::Equal) => {}
                    Some(other) => return Ok(Some(other)),
                }
            }
            a.len().cmp(&b.len())
        }
        _ => return Err(incomparable(left, right)),
    };

    Ok(Some(ordering))
}

/// Three-valued equality.
///
/// Structs compare field-by-field in declaration order; any null field
/// taints the result to `None`.
pub fn equals(left: &Value, right: &Value) -> Result<Option<bool>, ValueError> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(None),
        (Value::Struct(a), Value::Struct(b)) => {
            if a.len() != b.len() || a.iter().zip(b).any(|((x, _), (y, _))| x != y) {
                return Err(incomparable(left, right));
            }
            let mut unknown = false;
            for ((_, x), (_, y)) in a.iter().zip(b) {
                match equals(x, y)? {
                    Some(false) => return Ok(Some(false)),
                    Some(true) => {}
                    None => unknown = true,
                }
            }
            Ok(if unknown { None } else { Some(true) })
        }
        _ => Ok(compare(left, right)?.map(Ordering::is_eq)),
    }
}

/// Total ordering for sort evaluators.
///
/// Nulls sort by `nulls`; floats use `total_cmp`, and distinct tags fall
/// back to tag order so the ordering stays total.
#[must_use]
pub fn sort_cmp(left: &Value, right: &Value, nulls: NullOrder) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => {
            return match nulls {
                NullOrder::First => Ordering::Less,
                NullOrder::Last => Ordering::Greater,
            };
        }
        (false, true) => {
            return match nulls {
                NullOrder::First => Ordering::Greater,
                NullOrder::Last => Ordering::Less,
            };
        }
        (false, false) => {}
    }

    match (left, right) {
        (Value::Float(a), Value::Float(b)) => return a.total_cmp(b),
        (Value::Double(a), Value::Double(b)) => return a.total_cmp(b),
        _ => {}
    }

    match compare(left, right) {
        Ok(Some(ordering)) => ordering,
        Ok(None) | Err(_) => left.tag().to_u8().cmp(&right.tag().to_u8()),
    }
}
