use super::text_arg;
use crate::{
    function::{
        FunctionError, FunctionSignature, NullPolicy, ReturnTypeInference, signature::STRING,
    },
    udf::{DomainFunction, FunctionId, UdfBridge},
    value::{ExprType, Value, ValueError},
};

const OWNER: &str = "text";

pub(super) fn functions() -> Vec<DomainFunction> {
    let string_to = |returns: ExprType| {
        FunctionSignature::new(1, [STRING], NullPolicy::Any, ReturnTypeInference::Fixed(returns))
    };

    vec![
        UdfBridge::adapt(FunctionId::new(OWNER, "length"), string_to(ExprType::Integer), length),
        UdfBridge::adapt(FunctionId::new(OWNER, "lower"), string_to(ExprType::String), lower),
        UdfBridge::adapt(FunctionId::new(OWNER, "upper"), string_to(ExprType::String), upper),
        UdfBridge::adapt(
            FunctionId::new(OWNER, "like"),
            FunctionSignature::new(
                2,
                [STRING, STRING],
                NullPolicy::Any,
                ReturnTypeInference::Fixed(ExprType::Boolean),
            ),
            like,
        ),
    ]
}

/// Byte length of the UTF-8 text.
fn length(args: &[Value]) -> Result<Value, FunctionError> {
    let len = text_arg("length", args, 0)?.len();
    let len = i32::try_from(len).map_err(|_| ValueError::OutOfRange {
        ty: "INTEGER".to_string(),
        value: len.to_string(),
    })?;

    Ok(Value::Integer(len))
}

fn lower(args: &[Value]) -> Result<Value, FunctionError> {
    Ok(Value::String(text_arg("lower", args, 0)?.to_lowercase()))
}

fn upper(args: &[Value]) -> Result<Value, FunctionError> {
    Ok(Value::String(text_arg("upper", args, 0)?.to_uppercase()))
}

fn like(args: &[Value]) -> Result<Value, FunctionError> {
    let text = text_arg("like", args, 0)?;
    let pattern = text_arg("like", args, 1)?;

    Ok(Value::Boolean(like_matches(text, pattern)))
}

///
/// GlobSyntax
///
/// The single-character and run wildcards of a glob dialect.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GlobSyntax {
    pub any_one: char,
    pub any_run: char,
}

impl GlobSyntax {
    /// SQL `LIKE`: `_` and `%`.
    pub const LIKE: Self = Self {
        any_one: '_',
        any_run: '%',
    };

    /// Backend wildcard queries: `?` and `*`.
    pub const WILDCARD: Self = Self {
        any_one: '?',
        any_run: '*',
    };
}

///
/// GlobToken
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum GlobToken {
    Literal(char),
    AnyOne,
    AnyRun,
}

fn glob_tokens(pattern: &str, syntax: GlobSyntax) -> Vec<GlobToken> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        tokens.push(match c {
            '\\' => GlobToken::Literal(chars.next().unwrap_or('\\')),
            c if c == syntax.any_run => GlobToken::AnyRun,
            c if c == syntax.any_one => GlobToken::AnyOne,
            other => GlobToken::Literal(other),
        });
    }

    tokens
}

/// Whole-value glob match under `syntax`; `\` escapes the next character.
#[must_use]
pub fn glob_matches(
    text: &str,
    pattern: &str,
    syntax: GlobSyntax,
    case_insensitive: bool,
) -> bool {
    let (text, pattern) = if case_insensitive {
        (text.to_lowercase(), pattern.to_lowercase())
    } else {
        (text.to_string(), pattern.to_string())
    };
    let text: Vec<char> = text.chars().collect();
    let tokens = glob_tokens(&pattern, syntax);

    // Greedy match with single backtrack point on the last run wildcard.
    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match tokens.get(p) {
            Some(GlobToken::AnyRun) => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(GlobToken::AnyOne) => {
                t += 1;
                p += 1;
            }
            Some(GlobToken::Literal(c)) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match backtrack {
                Some((bp, bt)) => {
                    p = bp + 1;
                    t = bt + 1;
                    backtrack = Some((bp, bt + 1));
                }
                None => return false,
            },
        }
    }

    tokens[p..].iter().all(|token| *token == GlobToken::AnyRun)
}

/// Case-insensitive SQL `LIKE`: `%` matches any run, `_` one character,
/// and `\` escapes the next character.
#[must_use]
pub fn like_matches(text: &str, pattern: &str) -> bool {
    glob_matches(text, pattern, GlobSyntax::LIKE, true)
}
