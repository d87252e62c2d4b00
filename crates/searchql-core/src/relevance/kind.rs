use serde::Deserialize;
use std::fmt;

///
/// RelevanceKind
///
/// Fixed set of full-text functions, partitioned by field-spec shape.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceKind {
    Match,
    MatchPhrase,
    MatchBoolPrefix,
    MatchPhrasePrefix,
    SimpleQueryString,
    QueryString,
    MultiMatch,
}

impl RelevanceKind {
    pub const ALL: [Self; 7] = [
        Self::Match,
        Self::MatchPhrase,
        Self::MatchBoolPrefix,
        Self::MatchPhrasePrefix,
        Self::SimpleQueryString,
        Self::QueryString,
        Self::MultiMatch,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::MatchPhrase => "match_phrase",
            Self::MatchBoolPrefix => "match_bool_prefix",
            Self::MatchPhrasePrefix => "match_phrase_prefix",
            Self::SimpleQueryString => "simple_query_string",
            Self::QueryString => "query_string",
            Self::MultiMatch => "multi_match",
        }
    }

    /// Resolve a function name, including the legacy `*query` aliases.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "match" | "match_query" | "matchquery" => Self::Match,
            "match_phrase" | "matchphrase" | "matchphrasequery" => Self::MatchPhrase,
            "match_bool_prefix" => Self::MatchBoolPrefix,
            "match_phrase_prefix" => Self::MatchPhrasePrefix,
            "simple_query_string" => Self::SimpleQueryString,
            "query_string" => Self::QueryString,
            "multi_match" | "multimatch" | "multimatchquery" => Self::MultiMatch,
            _ => return None,
        };

        Some(kind)
    }

    /// Single-field kinds take exactly one unboosted field name.
    #[must_use]
    pub const fn is_single_field(self) -> bool {
        matches!(
            self,
            Self::Match | Self::MatchPhrase | Self::MatchBoolPrefix | Self::MatchPhrasePrefix
        )
    }
}

impl fmt::Display for RelevanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
