use crate::{
    relevance::{RelevanceError, RelevanceKind},
    value::Value,
};
use chrono_tz::Tz;
use serde_json::{Number, Value as JsonValue};
use std::fmt;

///
/// Operator
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Operator {
    And,
    #[default]
    Or,
}

impl Operator {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

///
/// MatchType
///
/// `type` of a `multi_match` or `query_string` call.
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum MatchType {
    #[default]
    BestFields,
    MostFields,
    CrossFields,
    Phrase,
    PhrasePrefix,
    BoolPrefix,
}

impl MatchType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BestFields => "best_fields",
            Self::MostFields => "most_fields",
            Self::CrossFields => "cross_fields",
            Self::Phrase => "phrase",
            Self::PhrasePrefix => "phrase_prefix",
            Self::BoolPrefix => "bool_prefix",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        let ty = match text.trim().to_ascii_lowercase().as_str() {
            "best_fields" => Self::BestFields,
            "most_fields" => Self::MostFields,
            "cross_fields" => Self::CrossFields,
            "phrase" => Self::Phrase,
            "phrase_prefix" => Self::PhrasePrefix,
            "bool_prefix" => Self::BoolPrefix,
            _ => return None,
        };

        Some(ty)
    }

    /// Single-field kind a one-field `multi_match` of this type reduces to.
    #[must_use]
    pub const fn single_field_kind(self) -> RelevanceKind {
        match self {
            Self::BestFields | Self::MostFields | Self::CrossFields => RelevanceKind::Match,
            Self::Phrase => RelevanceKind::MatchPhrase,
            Self::PhrasePrefix => RelevanceKind::MatchPhrasePrefix,
            Self::BoolPrefix => RelevanceKind::MatchBoolPrefix,
        }
    }
}

///
/// QueryFlags
///
/// Operator set enabled for `simple_query_string`. Absent `flags` means
/// `ALL`.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct QueryFlags(u16);

impl QueryFlags {
    pub const NONE: Self = Self(0);
    pub const AND: Self = Self(1);
    pub const OR: Self = Self(1 << 1);
    pub const NOT: Self = Self(1 << 2);
    pub const PREFIX: Self = Self(1 << 3);
    pub const PHRASE: Self = Self(1 << 4);
    pub const PRECEDENCE: Self = Self(1 << 5);
    pub const ESCAPE: Self = Self(1 << 6);
    pub const WHITESPACE: Self = Self(1 << 7);
    pub const FUZZY: Self = Self(1 << 8);
    pub const NEAR: Self = Self(1 << 9);
    pub const SLOP: Self = Self::NEAR;
    pub const ALL: Self = Self((1 << 10) - 1);

    // Display order; `SLOP` is parsed as an alias of `NEAR`.
    const NAMED: [(&'static str, Self); 10] = [
        ("AND", Self::AND),
        ("OR", Self::OR),
        ("NOT", Self::NOT),
        ("PREFIX", Self::PREFIX),
        ("PHRASE", Self::PHRASE),
        ("PRECEDENCE", Self::PRECEDENCE),
        ("ESCAPE", Self::ESCAPE),
        ("WHITESPACE", Self::WHITESPACE),
        ("FUZZY", Self::FUZZY),
        ("NEAR", Self::NEAR),
    ];

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Parse a `|`-separated flag list, case-insensitively.
    pub fn parse(text: &str) -> Result<Self, RelevanceError> {
        text.split('|').try_fold(Self::NONE, |flags, token| {
            let name = token.trim().to_ascii_uppercase();
            let flag = match name.as_str() {
                "ALL" => Self::ALL,
                "NONE" => Self::NONE,
                "SLOP" => Self::SLOP,
                _ => Self::NAMED
                    .iter()
                    .find(|(label, _)| *label == name)
                    .map(|(_, flag)| *flag)
                    .ok_or_else(|| RelevanceError::InvalidFlag {
                        token: token.trim().to_string(),
                    })?,
            };

            Ok(flags.union(flag))
        })
    }
}

impl Default for QueryFlags {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Display for QueryFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ALL {
            return f.write_str("ALL");
        }
        if *self == Self::NONE {
            return f.write_str("NONE");
        }

        let mut first = true;
        for (label, flag) in Self::NAMED {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(label)?;
                first = false;
            }
        }
        Ok(())
    }
}

///
/// OptionValue
///
/// Normalized option literal.
///

#[derive(Clone, Debug, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Operator(Operator),
    MatchType(MatchType),
    Flags(QueryFlags),
}

impl OptionValue {
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Bool(v) => JsonValue::Bool(*v),
            Self::Int(v) => JsonValue::from(*v),
            Self::Float(v) => Number::from_f64(*v).map_or(JsonValue::Null, JsonValue::Number),
            Self::Text(v) => JsonValue::String(v.clone()),
            Self::Operator(op) => JsonValue::String(op.name().to_string()),
            Self::MatchType(ty) => JsonValue::String(ty.name().to_string()),
            Self::Flags(flags) => JsonValue::String(flags.to_string()),
        }
    }
}

///
/// OptionKind
///
/// Literal shape an option accepts.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum OptionKind {
    Text,
    Bool,
    Count,
    Float,
    Boost,
    Ratio,
    Fuzziness,
    Operator,
    ZeroTerms,
    MultiMatchType,
    QueryStringType,
    Flags,
    MinimumShouldMatch,
    Rewrite,
    TimeZone,
}

impl OptionKind {
    const fn expected(self) -> &'static str {
        match self {
            Self::Text => "a string",
            Self::Bool => "a boolean",
            Self::Count => "a non-negative integer",
            Self::Float => "a number",
            Self::Boost => "a positive number",
            Self::Ratio => "a number between 0 and 1",
            Self::Fuzziness => "AUTO, AUTO:low,high, 0, 1, or 2",
            Self::Operator => "AND or OR",
            Self::ZeroTerms => "NONE or ALL",
            Self::MultiMatchType => "a multi_match type",
            Self::QueryStringType => "a query_string type",
            Self::Flags => "a '|'-separated flag list",
            Self::MinimumShouldMatch => "an integer or percentage",
            Self::Rewrite => "a rewrite method",
            Self::TimeZone => "a time zone",
        }
    }
}

use OptionKind as K;

const MATCH: &[(&str, OptionKind)] = &[
    ("analyzer", K::Text),
    ("auto_generate_synonyms_phrase", K::Bool),
    ("boost", K::Boost),
    ("fuzziness", K::Fuzziness),
    ("fuzzy_rewrite", K::Rewrite),
    ("fuzzy_transpositions", K::Bool),
    ("lenient", K::Bool),
    ("max_expansions", K::Count),
    ("minimum_should_match", K::MinimumShouldMatch),
    ("operator", K::Operator),
    ("prefix_length", K::Count),
    ("zero_terms_query", K::ZeroTerms),
];

const MATCH_PHRASE: &[(&str, OptionKind)] = &[
    ("analyzer", K::Text),
    ("boost", K::Boost),
    ("slop", K::Count),
    ("zero_terms_query", K::ZeroTerms),
];

const MATCH_BOOL_PREFIX: &[(&str, OptionKind)] = &[
    ("analyzer", K::Text),
    ("boost", K::Boost),
    ("fuzziness", K::Fuzziness),
    ("fuzzy_rewrite", K::Rewrite),
    ("fuzzy_transpositions", K::Bool),
    ("max_expansions", K::Count),
    ("minimum_should_match", K::MinimumShouldMatch),
    ("operator", K::Operator),
    ("prefix_length", K::Count),
];

const MATCH_PHRASE_PREFIX: &[(&str, OptionKind)] = &[
    ("analyzer", K::Text),
    ("boost", K::Boost),
    ("max_expansions", K::Count),
    ("slop", K::Count),
    ("zero_terms_query", K::ZeroTerms),
];

const MULTI_MATCH: &[(&str, OptionKind)] = &[
    ("analyzer", K::Text),
    ("auto_generate_synonyms_phrase", K::Bool),
    ("boost", K::Boost),
    ("cutoff_frequency", K::Float),
    ("fuzziness", K::Fuzziness),
    ("fuzzy_transpositions", K::Bool),
    ("lenient", K::Bool),
    ("max_expansions", K::Count),
    ("minimum_should_match", K::MinimumShouldMatch),
    ("operator", K::Operator),
    ("prefix_length", K::Count),
    ("slop", K::Count),
    ("tie_breaker", K::Ratio),
    ("type", K::MultiMatchType),
    ("zero_terms_query", K::ZeroTerms),
];

const SIMPLE_QUERY_STRING: &[(&str, OptionKind)] = &[
    ("analyze_wildcard", K::Bool),
    ("analyzer", K::Text),
    ("auto_generate_synonyms_phrase", K::Bool),
    ("boost", K::Boost),
    ("default_operator", K::Operator),
    ("flags", K::Flags),
    ("fuzzy_max_expansions", K::Count),
    ("fuzzy_prefix_length", K::Count),
    ("fuzzy_transpositions", K::Bool),
    ("lenient", K::Bool),
    ("minimum_should_match", K::MinimumShouldMatch),
    ("quote_field_suffix", K::Text),
];

const QUERY_STRING: &[(&str, OptionKind)] = &[
    ("allow_leading_wildcard", K::Bool),
    ("analyze_wildcard", K::Bool),
    ("analyzer", K::Text),
    ("auto_generate_synonyms_phrase", K::Bool),
    ("boost", K::Boost),
    ("default_operator", K::Operator),
    ("enable_position_increments", K::Bool),
    ("escape", K::Bool),
    ("fuzziness", K::Fuzziness),
    ("fuzzy_max_expansions", K::Count),
    ("fuzzy_prefix_length", K::Count),
    ("fuzzy_rewrite", K::Rewrite),
    ("fuzzy_transpositions", K::Bool),
    ("lenient", K::Bool),
    ("max_determinized_states", K::Count),
    ("minimum_should_match", K::MinimumShouldMatch),
    ("phrase_slop", K::Count),
    ("quote_analyzer", K::Text),
    ("quote_field_suffix", K::Text),
    ("rewrite", K::Rewrite),
    ("time_zone", K::TimeZone),
    ("type", K::QueryStringType),
];

/// Option allow-list of `kind`, sorted by name.
pub(crate) const fn allowed_options(
    kind: RelevanceKind,
) -> &'static [(&'static str, OptionKind)] {
    match kind {
        RelevanceKind::Match => MATCH,
        RelevanceKind::MatchPhrase => MATCH_PHRASE,
        RelevanceKind::MatchBoolPrefix => MATCH_BOOL_PREFIX,
        RelevanceKind::MatchPhrasePrefix => MATCH_PHRASE_PREFIX,
        RelevanceKind::SimpleQueryString => SIMPLE_QUERY_STRING,
        RelevanceKind::QueryString => QUERY_STRING,
        RelevanceKind::MultiMatch => MULTI_MATCH,
    }
}

/// Whether `kind` accepts an option named `name` (already lower case).
pub(crate) fn allows(kind: RelevanceKind, name: &str) -> bool {
    allowed_options(kind).iter().any(|(allowed, _)| *allowed == name)
}

fn bool_of(value: &Value) -> Option<bool> {
    match value {
        Value::Boolean(v) => Some(*v),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn int_of(value: &Value) -> Option<i64> {
    match value {
        Value::String(text) => text.trim().parse().ok(),
        other => other.as_i64().ok(),
    }
}

fn float_of(value: &Value) -> Option<f64> {
    let v = match value {
        Value::String(text) => text.trim().parse().ok()?,
        other => other.as_f64().ok()?,
    };

    v.is_finite().then_some(v)
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

fn is_fuzziness(text: &str) -> bool {
    let upper = text.trim().to_ascii_uppercase();
    if upper == "AUTO" {
        return true;
    }
    let Some(bounds) = upper.strip_prefix("AUTO:") else {
        return false;
    };
    let Some((low, high)) = bounds.split_once(',') else {
        return false;
    };

    match (low.parse::<u32>(), high.parse::<u32>()) {
        (Ok(low), Ok(high)) => low <= high,
        _ => false,
    }
}

// `N`, `N%`, `-N%`, and `N<M%` combinations separated by whitespace.
fn is_minimum_should_match(text: &str) -> bool {
    let single = |part: &str| {
        let part = part.strip_prefix('-').unwrap_or(part);
        let part = part.strip_suffix('%').unwrap_or(part);
        is_digits(part)
    };

    let mut parts = text.split_whitespace().peekable();
    parts.peek().is_some()
        && parts.all(|part| match part.split_once('<') {
            Some((threshold, rest)) => is_digits(threshold) && single(rest),
            None => single(part),
        })
}

fn is_rewrite(text: &str) -> bool {
    let lower = text.trim().to_ascii_lowercase();
    if matches!(
        lower.as_str(),
        "constant_score" | "scoring_boolean" | "constant_score_boolean"
    ) {
        return true;
    }

    ["top_terms_blended_freqs_", "top_terms_boost_", "top_terms_"]
        .iter()
        .find_map(|prefix| lower.strip_prefix(prefix))
        .is_some_and(is_digits)
}

fn is_time_zone(text: &str) -> bool {
    let text = text.trim();
    if text.parse::<Tz>().is_ok() {
        return true;
    }

    let Some(offset) = text.strip_prefix('+').or_else(|| text.strip_prefix('-')) else {
        return false;
    };
    offset.split_once(':').is_some_and(|(hours, minutes)| {
        hours.len() == 2
            && minutes.len() == 2
            && hours.parse::<u8>().is_ok_and(|h| h <= 18)
            && minutes.parse::<u8>().is_ok_and(|m| m < 60)
    })
}

/// Validate one named option against the allow-list of `kind` and
/// normalize its literal. Returns the canonical option name.
pub(crate) fn normalize(
    kind: RelevanceKind,
    name: &str,
    value: &Value,
) -> Result<(&'static str, OptionValue), RelevanceError> {
    let lowered = name.trim().to_ascii_lowercase();
    let Some(&(canonical, option_kind)) = allowed_options(kind)
        .iter()
        .find(|(allowed, _)| *allowed == lowered)
    else {
        return Err(RelevanceError::UnknownOption {
            kind,
            option: name.to_string(),
        });
    };

    let invalid = || RelevanceError::InvalidOptionValue {
        kind,
        option: canonical,
        value: value.to_string(),
        expected: option_kind.expected(),
    };
    let text = value.as_str().ok();

    let normalized = match option_kind {
        K::Text => OptionValue::Text(text.ok_or_else(invalid)?.to_string()),
        K::Bool => OptionValue::Bool(bool_of(value).ok_or_else(invalid)?),
        K::Count => OptionValue::Int(int_of(value).filter(|v| *v >= 0).ok_or_else(invalid)?),
        K::Float => OptionValue::Float(float_of(value).ok_or_else(invalid)?),
        K::Boost => OptionValue::Float(float_of(value).filter(|v| *v > 0.0).ok_or_else(invalid)?),
        K::Ratio => OptionValue::Float(
            float_of(value)
                .filter(|v| (0.0..=1.0).contains(v))
                .ok_or_else(invalid)?,
        ),
        K::Fuzziness => match int_of(value) {
            Some(edits @ 0..=2) => OptionValue::Int(edits),
            Some(_) => return Err(invalid()),
            None => match text.filter(|t| is_fuzziness(t)) {
                Some(t) => OptionValue::Text(t.trim().to_ascii_uppercase()),
                None => return Err(invalid()),
            },
        },
        K::Operator => OptionValue::Operator(text.and_then(Operator::parse).ok_or_else(invalid)?),
        K::ZeroTerms => {
            let upper = text.ok_or_else(invalid)?.trim().to_ascii_uppercase();
            if upper != "NONE" && upper != "ALL" {
                return Err(invalid());
            }
            OptionValue::Text(upper)
        }
        K::MultiMatchType => {
            OptionValue::MatchType(text.and_then(MatchType::parse).ok_or_else(invalid)?)
        }
        K::QueryStringType => OptionValue::MatchType(
            text.and_then(MatchType::parse)
                .filter(|ty| *ty != MatchType::BoolPrefix)
                .ok_or_else(invalid)?,
        ),
        K::Flags => OptionValue::Flags(QueryFlags::parse(text.ok_or_else(invalid)?)?),
        K::MinimumShouldMatch => match value {
            Value::String(t) if is_minimum_should_match(t) => {
                OptionValue::Text(t.trim().to_string())
            }
            Value::String(_) => return Err(invalid()),
            other => OptionValue::Int(other.as_i64().map_err(|_| invalid())?),
        },
        K::Rewrite => match text.filter(|t| is_rewrite(t)) {
            Some(t) => OptionValue::Text(t.trim().to_ascii_lowercase()),
            None => return Err(invalid()),
        },
        K::TimeZone => match text.filter(|t| is_time_zone(t)) {
            Some(t) => OptionValue::Text(t.trim().to_string()),
            None => return Err(invalid()),
        },
    };

    Ok((canonical, normalized))
}
