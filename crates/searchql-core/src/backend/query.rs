use crate::{expr::BoundExpr, relevance::FullTextQuery, value::NativeValue};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value as JsonValue, json};

/// Script language tag the backend routes compiled expressions under.
pub const SCRIPT_LANG: &str = "searchql_expression";

/// `{key: value}` with a runtime key.
pub(crate) fn keyed(key: &str, value: JsonValue) -> JsonValue {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    JsonValue::Object(map)
}

///
/// RangeBound
///

#[derive(Clone, Debug, PartialEq)]
pub struct RangeBound {
    pub value: NativeValue,
    pub inclusive: bool,
}

impl RangeBound {
    #[must_use]
    pub const fn inclusive(value: NativeValue) -> Self {
        Self {
            value,
            inclusive: true,
        }
    }

    #[must_use]
    pub const fn exclusive(value: NativeValue) -> Self {
        Self {
            value,
            inclusive: false,
        }
    }
}

///
/// BoolQuery
///
/// `must` all hold, `must_not` none hold, and when `should` is non-empty
/// at least one of it holds.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<NativeQuery>,
    pub should: Vec<NativeQuery>,
    pub must_not: Vec<NativeQuery>,
}

///
/// ScriptQuery
///
/// Bound expression shipped to the backend together with the query-start
/// instant, so the backend rebuilds the same function context.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ScriptQuery {
    pub predicate: BoundExpr,
    pub instant: DateTime<Utc>,
}

///
/// NativeQuery
///
/// Backend filter descriptor. Every variant is two-valued: a document
/// either matches or it does not.
///

#[derive(Clone, Debug, PartialEq)]
pub enum NativeQuery {
    MatchAll,
    MatchNone,
    Term {
        field: String,
        value: NativeValue,
    },
    Terms {
        field: String,
        values: Vec<NativeValue>,
    },
    Range {
        field: String,
        lower: Option<RangeBound>,
        upper: Option<RangeBound>,
    },
    Exists {
        field: String,
    },
    Wildcard {
        field: String,
        pattern: String,
        case_insensitive: bool,
    },
    FullText(FullTextQuery),
    Bool(BoolQuery),
    Script(ScriptQuery),
}

impl NativeQuery {
    #[must_use]
    pub fn term(field: impl Into<String>, value: NativeValue) -> Self {
        Self::Term {
            field: field.into(),
            value,
        }
    }

    #[must_use]
    pub fn exists(field: impl Into<String>) -> Self {
        Self::Exists {
            field: field.into(),
        }
    }

    #[must_use]
    pub fn range(
        field: impl Into<String>,
        lower: Option<RangeBound>,
        upper: Option<RangeBound>,
    ) -> Self {
        Self::Range {
            field: field.into(),
            lower,
            upper,
        }
    }

    /// Conjunction with `MatchAll`/`MatchNone` folded away.
    #[must_use]
    pub fn and(queries: Vec<Self>) -> Self {
        let mut must = Vec::new();
        for query in queries {
            match query {
                Self::MatchAll => {}
                Self::MatchNone => return Self::MatchNone,
                Self::Bool(BoolQuery {
                    must: inner,
                    should,
                    must_not,
                }) if should.is_empty() && must_not.is_empty() => must.extend(inner),
                other => must.push(other),
            }
        }

        match must.len() {
            0 => Self::MatchAll,
            1 => must.remove(0),
            _ => Self::Bool(BoolQuery {
                must,
                ..BoolQuery::default()
            }),
        }
    }

    /// Disjunction with `MatchAll`/`MatchNone` folded away.
    #[must_use]
    pub fn or(queries: Vec<Self>) -> Self {
        let mut should = Vec::new();
        for query in queries {
            match query {
                Self::MatchNone => {}
                Self::MatchAll => return Self::MatchAll,
                other => should.push(other),
            }
        }

        match should.len() {
            0 => Self::MatchNone,
            1 => should.remove(0),
            _ => Self::Bool(BoolQuery {
                should,
                ..BoolQuery::default()
            }),
        }
    }

    #[expect(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(query: Self) -> Self {
        match query {
            Self::MatchAll => Self::MatchNone,
            Self::MatchNone => Self::MatchAll,
            other => Self::Bool(BoolQuery {
                must_not: vec![other],
                ..BoolQuery::default()
            }),
        }
    }

    /// Render in the backend's JSON query DSL.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::MatchAll => json!({ "match_all": {} }),
            Self::MatchNone => json!({ "match_none": {} }),
            Self::Term { field, value } => {
                keyed("term", keyed(field, json!({ "value": value.to_json() })))
            }
            Self::Terms { field, values } => keyed(
                "terms",
                keyed(field, values.iter().map(NativeValue::to_json).collect()),
            ),
            Self::Range {
                field,
                lower,
                upper,
            } => {
                let mut body = Map::new();
                if let Some(bound) = lower {
                    let op = if bound.inclusive { "gte" } else { "gt" };
                    body.insert(op.to_string(), bound.value.to_json());
                }
                if let Some(bound) = upper {
                    let op = if bound.inclusive { "lte" } else { "lt" };
                    body.insert(op.to_string(), bound.value.to_json());
                }
                keyed("range", keyed(field, JsonValue::Object(body)))
            }
            Self::Exists { field } => json!({ "exists": { "field": field } }),
            Self::Wildcard {
                field,
                pattern,
                case_insensitive,
            } => keyed(
                "wildcard",
                keyed(
                    field,
                    json!({ "wildcard": pattern, "case_insensitive": case_insensitive }),
                ),
            ),
            Self::FullText(query) => query.to_json(),
            Self::Bool(query) => {
                let mut body = Map::new();
                let sections = [
                    ("must", &query.must),
                    ("should", &query.should),
                    ("must_not", &query.must_not),
                ];
                for (name, clauses) in sections {
                    if !clauses.is_empty() {
                        let rendered = clauses.iter().map(Self::to_json).collect();
                        body.insert(name.to_string(), JsonValue::Array(rendered));
                    }
                }
                if !query.should.is_empty() {
                    body.insert("minimum_should_match".to_string(), json!(1));
                }
                keyed("bool", JsonValue::Object(body))
            }
            Self::Script(script) => json!({
                "script": {
                    "script": {
                        "lang": SCRIPT_LANG,
                        "source": script.predicate.to_string(),
                        "params": { "utcTimestamp": script.instant.timestamp_millis() },
                    }
                }
            }),
        }
    }
}

/// Translate a SQL `LIKE` pattern into native wildcard syntax.
///
/// `%` becomes `*`, `_` becomes `?`; literal `*`, `?` and `\` are escaped.
#[must_use]
pub fn like_to_wildcard(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        let literal = match c {
            '%' => {
                out.push('*');
                continue;
            }
            '_' => {
                out.push('?');
                continue;
            }
            '\\' => chars.next().unwrap_or('\\'),
            other => other,
        };
        if matches!(literal, '*' | '?' | '\\') {
            out.push('\\');
        }
        out.push(literal);
    }

    out
}
