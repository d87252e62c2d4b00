//! Module: relevance
//! Responsibility: relevance-call descriptors, their text surface, option
//! validation, and translation into native full-text descriptors.
//! Does not own: deciding whether a translated call is pushed down.
//! Boundary: the binder translates every relevance call once, at bind time.

mod call;
mod kind;
mod options;
mod parse;
mod translate;


use thiserror::Error as ThisError;

// re-exports
pub use call::{FieldBoost, FieldSpec, RelevanceArgument, RelevanceCall};
pub use kind::RelevanceKind;
pub use options::{MatchType, Operator, OptionValue, QueryFlags};
pub use parse::parse_relevance_call;
pub use translate::{FieldWeight, FullTextQuery, escape_query, translate};

///
/// RelevanceError
///
/// Validation failures of a relevance call. All are raised before
/// execution.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum RelevanceError {
    #[error("unknown relevance function '{name}'")]
    UnknownFunction { name: String },

    #[error("syntax error at {position}: {reason}")]
    Syntax { position: usize, reason: String },

    #[error("{kind}: {reason}")]
    MalformedCall { kind: RelevanceKind, reason: String },

    #[error("{kind} {reason}")]
    FieldSpecShape { kind: RelevanceKind, reason: String },

    #[error("{kind} does not accept field boosts")]
    BoostNotAllowed { kind: RelevanceKind },

    #[error("boost for field '{field}' must be positive, found {boost}")]
    NonPositiveBoost { field: String, boost: f64 },

    #[error("'{option}' is not a valid option for {kind}")]
    UnknownOption { kind: RelevanceKind, option: String },

    #[error("option '{option}' given more than once to {kind}")]
    DuplicateOption {
        kind: RelevanceKind,
        option: &'static str,
    },

    #[error("invalid value {value} for {kind} option '{option}': expected {expected}")]
    InvalidOptionValue {
        kind: RelevanceKind,
        option: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("invalid flag '{token}' in simple_query_string flags")]
    InvalidFlag { token: String },
}
