//! Reference full-text semantics over analyzed field text.
//!
//! The analyzer lower-cases and splits on non-alphanumeric characters.
//! Scoring is out of scope; every query reduces to match / no match.

use crate::{
    backend::Row,
    expr::Schema,
    function::{GlobSyntax, glob_matches},
    relevance::{FullTextQuery, MatchType, Operator, OptionValue, QueryFlags, RelevanceKind},
    value::{ExprType, NativeValue, from_native},
};

pub(super) fn analyze(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// `*`/`?` wildcard match; `\` escapes the next character.
pub(super) fn wildcard_matches(text: &str, pattern: &str, case_insensitive: bool) -> bool {
    glob_matches(text, pattern, GlobSyntax::WILDCARD, case_insensitive)
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut current = vec![i + 1];
        for (j, cb) in b.iter().enumerate() {
            let substitute = prev[j] + usize::from(ca != *cb);
            current.push(substitute.min(prev[j + 1] + 1).min(current[j] + 1));
        }
        prev = current;
    }

    prev[b.len()]
}

///
/// Fuzziness
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Fuzziness {
    Edits(usize),
    Auto { low: usize, high: usize },
}

impl Fuzziness {
    fn from_query(query: &FullTextQuery) -> Option<Self> {
        match query.option("fuzziness")? {
            OptionValue::Int(edits) => usize::try_from(*edits).ok().map(Self::Edits),
            OptionValue::Text(text) => {
                let (low, high) = text
                    .strip_prefix("AUTO:")
                    .and_then(|bounds| bounds.split_once(','))
                    .and_then(|(low, high)| Some((low.parse().ok()?, high.parse().ok()?)))
                    .unwrap_or((3, 6));
                Some(Self::Auto { low, high })
            }
            _ => None,
        }
    }

    fn edits(self, term: &str) -> usize {
        match self {
            Self::Edits(edits) => edits,
            Self::Auto { low, high } => {
                let len = term.chars().count();
                if len < low {
                    0
                } else if len < high {
                    1
                } else {
                    2
                }
            }
        }
    }
}

fn term_matches(token: &str, term: &str, fuzziness: Option<Fuzziness>) -> bool {
    token == term || fuzziness.is_some_and(|f| edit_distance(token, term) <= f.edits(term))
}

///
/// FieldText
///

struct FieldText {
    name: String,
    tokens: Vec<String>,
}

fn native_text(native: &NativeValue) -> String {
    match native {
        NativeValue::Null => String::new(),
        NativeValue::String(text) => text.clone(),
        NativeValue::List(items) => items.iter().map(native_text).collect::<Vec<_>>().join(" "),
        other => from_native(other, &ExprType::Undefined)
            .map(|value| value.to_text())
            .unwrap_or_default(),
    }
}

fn field_texts(schema: &Schema, query: &FullTextQuery, row: &Row) -> Vec<FieldText> {
    let mut names: Vec<String> = Vec::new();
    if query.searches_all_fields() {
        names.extend(
            schema
                .fields()
                .iter()
                .filter(|f| f.is_text())
                .map(|f| f.name.clone()),
        );
    } else {
        for weight in query.fields() {
            if weight.is_pattern() {
                names.extend(schema.matching(&weight.field).map(|f| f.name.clone()));
            } else {
                names.push(weight.field.clone());
            }
        }
    }
    let mut seen = Vec::new();
    names.retain(|name| {
        let fresh = !seen.contains(name);
        if fresh {
            seen.push(name.clone());
        }
        fresh
    });

    names
        .into_iter()
        .filter_map(|name| {
            let tokens = analyze(&native_text(row.get(&name)?));
            Some(FieldText { name, tokens })
        })
        .collect()
}

/// Number of terms that must match under `minimum_should_match`.
fn required_terms(query: &FullTextQuery, terms: usize, operator: Operator) -> usize {
    let fallback = match operator {
        Operator::And => terms,
        Operator::Or => 1,
    };
    let Some(option) = query.option("minimum_should_match") else {
        return fallback.min(terms);
    };

    let spec = match option {
        OptionValue::Int(n) => n.to_string(),
        OptionValue::Text(text) => text.clone(),
        _ => return fallback.min(terms),
    };
    // Conditional forms (`N<M%`) fall back to the operator.
    if spec.contains('<') || spec.contains(' ') {
        return fallback.min(terms);
    }

    let (negative, body) = match spec.strip_prefix('-') {
        Some(body) => (true, body),
        None => (false, spec.as_str()),
    };
    let amount = match body.strip_suffix('%') {
        Some(percent) => percent.parse::<usize>().unwrap_or(0) * terms / 100,
        None => body.parse::<usize>().unwrap_or(0),
    };
    let required = if negative {
        terms.saturating_sub(amount)
    } else {
        amount
    };

    required.clamp(1, terms.max(1))
}

fn bag_matches(
    tokens: &[String],
    terms: &[String],
    prefix_last: bool,
    required: usize,
    fuzziness: Option<Fuzziness>,
) -> bool {
    let last = terms.len().saturating_sub(1);
    let hits = terms
        .iter()
        .enumerate()
        .filter(|(i, term)| {
            tokens.iter().any(|token| {
                if prefix_last && *i == last {
                    token.starts_with(term.as_str())
                } else {
                    term_matches(token, term, fuzziness)
                }
            })
        })
        .count();

    hits >= required
}

// In-order occurrence of `terms` with at most `slop` skipped tokens.
fn phrase_matches(tokens: &[String], terms: &[String], slop: usize, prefix_last: bool) -> bool {
    let Some((first, rest)) = terms.split_first() else {
        return false;
    };
    let hit = |token: &str, term: &str, is_last: bool| {
        if prefix_last && is_last {
            token.starts_with(term)
        } else {
            token == term
        }
    };

    (0..tokens.len())
        .filter(|&start| hit(&tokens[start], first, rest.is_empty()))
        .any(|start| {
            let mut previous = start;
            let mut skipped = 0;
            for (i, term) in rest.iter().enumerate() {
                let is_last = i + 1 == rest.len();
                let Some(offset) = tokens[previous + 1..]
                    .iter()
                    .position(|token| hit(token, term, is_last))
                else {
                    return false;
                };
                skipped += offset;
                previous += offset + 1;
            }
            skipped <= slop
        })
}

fn slop(query: &FullTextQuery, option: &str) -> usize {
    match query.option(option) {
        Some(OptionValue::Int(n)) => usize::try_from(*n).unwrap_or(0),
        _ => 0,
    }
}

fn zero_terms_all(query: &FullTextQuery) -> bool {
    matches!(query.option("zero_terms_query"), Some(OptionValue::Text(t)) if t == "ALL")
}

/// Whether `row` matches `query` under the reference semantics.
pub(super) fn full_text_matches(schema: &Schema, query: &FullTextQuery, row: &Row) -> bool {
    let fields = field_texts(schema, query, row);

    match query.kind() {
        RelevanceKind::QueryString => {
            let flags = QueryFlags::ALL;
            evaluate_query_text(query, &fields, flags, true)
        }
        RelevanceKind::SimpleQueryString => {
            evaluate_query_text(query, &fields, query.flags(), false)
        }
        RelevanceKind::MultiMatch => {
            let terms = analyze(query.query());
            if terms.is_empty() {
                return zero_terms_all(query);
            }
            match query.match_type() {
                MatchType::CrossFields => {
                    let tokens: Vec<String> =
                        fields.iter().flat_map(|f| f.tokens.iter().cloned()).collect();
                    let required = required_terms(query, terms.len(), query.operator());
                    bag_matches(&tokens, &terms, false, required, Fuzziness::from_query(query))
                }
                ty => fields
                    .iter()
                    .any(|field| single_field(query, ty.single_field_kind(), field, &terms)),
            }
        }
        kind => {
            let terms = analyze(query.query());
            if terms.is_empty() {
                return zero_terms_all(query);
            }
            fields
                .iter()
                .any(|field| single_field(query, kind, field, &terms))
        }
    }
}

fn single_field(
    query: &FullTextQuery,
    kind: RelevanceKind,
    field: &FieldText,
    terms: &[String],
) -> bool {
    let tokens = &field.tokens;
    match kind {
        RelevanceKind::MatchPhrase => phrase_matches(tokens, terms, slop(query, "slop"), false),
        RelevanceKind::MatchPhrasePrefix => {
            phrase_matches(tokens, terms, slop(query, "slop"), true)
        }
        RelevanceKind::MatchBoolPrefix => {
            let required = required_terms(query, terms.len(), query.operator());
            bag_matches(tokens, terms, true, required, Fuzziness::from_query(query))
        }
        _ => {
            let required = required_terms(query, terms.len(), query.operator());
            bag_matches(tokens, terms, false, required, Fuzziness::from_query(query))
        }
    }
}

///
/// Occur
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Occur {
    Must,
    Should,
    MustNot,
}

///
/// TextNode
///
/// Parsed `query_string` / `simple_query_string` syntax.
///

#[derive(Clone, Debug, PartialEq)]
enum TextNode {
    Term {
        field: Option<String>,
        text: String,
        fuzzy: Option<usize>,
    },
    Prefix {
        field: Option<String>,
        text: String,
    },
    Wildcard {
        field: Option<String>,
        pattern: String,
    },
    Phrase {
        field: Option<String>,
        text: String,
        slop: usize,
    },
    Group(Vec<(Occur, Self)>),
}

///
/// RawTerm
///

#[derive(Debug, Default)]
struct RawTerm {
    text: String,
    wildcard: bool,
    /// Byte offset of the first unescaped `:`.
    colon: Option<usize>,
}

///
/// QueryTextParser
///
/// `classic` enables the Lucene classic surface (`AND`/`OR`/`NOT`
/// keywords, `+`/`-` prefixes, `field:` qualifiers, wildcards). Otherwise
/// the simple surface applies, where each operator is gated by `flags`.
///

struct QueryTextParser {
    chars: Vec<char>,
    cursor: usize,
    flags: QueryFlags,
    classic: bool,
    default_occur: Occur,
    phrase_slop: usize,
}

impl QueryTextParser {
    fn enabled(&self, flag: QueryFlags) -> bool {
        self.classic || self.flags.contains(flag)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.cursor).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.cursor += 1;
        }
    }

    fn is_operator_char(&self, c: char) -> bool {
        match c {
            '(' | ')' => self.enabled(QueryFlags::PRECEDENCE),
            '"' => self.enabled(QueryFlags::PHRASE),
            '|' => !self.classic && self.flags.contains(QueryFlags::OR),
            '+' => !self.classic && self.flags.contains(QueryFlags::AND),
            _ => false,
        }
    }

    fn group(&mut self, nested: bool) -> TextNode {
        let mut clauses: Vec<(Occur, TextNode)> = Vec::new();
        let mut pending: Option<Occur> = None;

        loop {
            self.skip_whitespace();
            let Some(c) = self.peek() else { break };

            if c == ')' && nested && self.enabled(QueryFlags::PRECEDENCE) {
                self.cursor += 1;
                break;
            }

            // Binary operators rewrite the occur of both neighbours.
            if let Some(binary) = self.binary_operator() {
                if let Some((occur, _)) = clauses.last_mut()
                    && *occur != Occur::MustNot
                {
                    *occur = binary;
                }
                pending = Some(binary);
                continue;
            }

            let mut occur = pending.take().unwrap_or(self.default_occur);
            if let Some(prefix) = self.unary_operator() {
                occur = prefix;
            }
            self.skip_whitespace();
            if let Some(node) = self.clause(nested) {
                clauses.push((occur, node));
            }
        }

        TextNode::Group(clauses)
    }

    fn keyword(&mut self, word: &str) -> bool {
        let len = word.len();
        let candidate: String = self.chars.iter().skip(self.cursor).take(len).collect();
        let boundary = self
            .chars
            .get(self.cursor + len)
            .is_none_or(|c| c.is_whitespace() || *c == '(');
        if candidate == word && boundary {
            self.cursor += len;
            true
        } else {
            false
        }
    }

    fn binary_operator(&mut self) -> Option<Occur> {
        if self.classic {
            if self.keyword("AND") || self.symbol("&&") {
                return Some(Occur::Must);
            }
            if self.keyword("OR") || self.symbol("||") {
                return Some(Occur::Should);
            }
            return None;
        }

        match self.peek()? {
            '+' if self.flags.contains(QueryFlags::AND) => {
                self.cursor += 1;
                Some(Occur::Must)
            }
            '|' if self.flags.contains(QueryFlags::OR) => {
                self.cursor += 1;
                Some(Occur::Should)
            }
            _ => None,
        }
    }

    fn symbol(&mut self, text: &str) -> bool {
        let candidate: String = self.chars.iter().skip(self.cursor).take(text.len()).collect();
        if candidate == text {
            self.cursor += text.len();
            true
        } else {
            false
        }
    }

    fn unary_operator(&mut self) -> Option<Occur> {
        if self.classic {
            if self.keyword("NOT") {
                return Some(Occur::MustNot);
            }
            return match self.peek()? {
                '+' => {
                    self.cursor += 1;
                    Some(Occur::Must)
                }
                '-' | '!' => {
                    self.cursor += 1;
                    Some(Occur::MustNot)
                }
                _ => None,
            };
        }

        if self.peek()? == '-' && self.flags.contains(QueryFlags::NOT) {
            self.cursor += 1;
            return Some(Occur::MustNot);
        }
        None
    }

    fn clause(&mut self, nested: bool) -> Option<TextNode> {
        let c = self.peek()?;
        if c == '(' && self.enabled(QueryFlags::PRECEDENCE) {
            self.cursor += 1;
            return Some(self.group(true));
        }
        if c == ')' && !nested && self.enabled(QueryFlags::PRECEDENCE) {
            // Unbalanced close paren: skip it.
            self.cursor += 1;
            return None;
        }
        if c == '"' && self.enabled(QueryFlags::PHRASE) {
            return Some(self.phrase(None));
        }

        let raw = self.raw_term();
        if raw.text.is_empty() {
            self.cursor += 1;
            return None;
        }

        // `field:term` qualification in the classic surface.
        if let Some(colon) = raw.colon.filter(|&at| self.classic && at > 0) {
            let field = Some(raw.text[..colon].to_string());
            let rest = &raw.text[colon + 1..];
            if rest.is_empty() {
                return match self.peek() {
                    Some('"') => Some(self.phrase(field)),
                    Some('(') => {
                        self.cursor += 1;
                        Some(qualify(self.group(true), field.as_deref()))
                    }
                    _ => None,
                };
            }
            let fuzzy = self.fuzzy();
            return Some(term_node(field, rest, raw.wildcard, fuzzy));
        }

        let fuzzy = self.fuzzy();
        if !self.classic
            && self.flags.contains(QueryFlags::PREFIX)
            && let Some(stem) = raw.text.strip_suffix('*')
        {
            return Some(TextNode::Prefix {
                field: None,
                text: stem.to_lowercase(),
            });
        }

        Some(term_node(None, &raw.text, raw.wildcard, fuzzy))
    }

    // Reads up to whitespace or an active operator character. Escaped
    // characters are kept literally with the escape removed.
    fn raw_term(&mut self) -> RawTerm {
        let escape = self.enabled(QueryFlags::ESCAPE);
        let mut raw = RawTerm::default();

        while let Some(c) = self.peek() {
            let fuzzy_suffix = c == '~' && self.fuzzy_enabled();
            if c.is_whitespace() || self.is_operator_char(c) || fuzzy_suffix {
                break;
            }
            self.cursor += 1;
            if c == '\\' && escape {
                if let Some(next) = self.peek() {
                    // Escaped wildcards become a token separator.
                    raw.text.push(if matches!(next, '*' | '?') { ' ' } else { next });
                    self.cursor += 1;
                }
                continue;
            }
            if self.classic && matches!(c, '*' | '?') {
                raw.wildcard = true;
            }
            if c == ':' && raw.colon.is_none() {
                raw.colon = Some(raw.text.len());
            }
            raw.text.push(c);
        }

        raw
    }

    fn fuzzy_enabled(&self) -> bool {
        self.enabled(QueryFlags::FUZZY) || self.enabled(QueryFlags::NEAR)
    }

    // Optional `~N` suffix.
    fn fuzzy(&mut self) -> Option<usize> {
        if self.peek() != Some('~') || !self.fuzzy_enabled() {
            return None;
        }
        self.cursor += 1;
        let start = self.cursor;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.cursor += 1;
        }
        let digits: String = self.chars[start..self.cursor].iter().collect();

        Some(digits.parse().unwrap_or(2))
    }

    fn phrase(&mut self, field: Option<String>) -> TextNode {
        self.cursor += 1;
        let mut text = String::new();
        while let Some(c) = self.peek() {
            self.cursor += 1;
            if c == '"' {
                break;
            }
            text.push(c);
        }
        let slop = self.fuzzy().unwrap_or(self.phrase_slop);

        TextNode::Phrase { field, text, slop }
    }
}

fn term_node(
    field: Option<String>,
    raw: &str,
    wildcard: bool,
    fuzzy: Option<usize>,
) -> TextNode {
    if wildcard {
        return TextNode::Wildcard {
            field,
            pattern: raw.to_lowercase(),
        };
    }

    TextNode::Term {
        field,
        text: raw.to_string(),
        fuzzy,
    }
}

fn qualify(node: TextNode, field: Option<&str>) -> TextNode {
    let field = field.map(str::to_string);
    match node {
        TextNode::Term { text, fuzzy, .. } => TextNode::Term { field, text, fuzzy },
        TextNode::Prefix { text, .. } => TextNode::Prefix { field, text },
        TextNode::Wildcard { pattern, .. } => TextNode::Wildcard { field, pattern },
        TextNode::Phrase { text, slop, .. } => TextNode::Phrase { field, text, slop },
        TextNode::Group(clauses) => TextNode::Group(
            clauses
                .into_iter()
                .map(|(occur, node)| (occur, qualify(node, field.as_deref())))
                .collect(),
        ),
    }
}

fn evaluate_query_text(
    query: &FullTextQuery,
    fields: &[FieldText],
    flags: QueryFlags,
    classic: bool,
) -> bool {
    let default_occur = match query.operator() {
        Operator::And => Occur::Must,
        Operator::Or => Occur::Should,
    };
    let mut parser = QueryTextParser {
        chars: query.query().chars().collect(),
        cursor: 0,
        flags,
        classic,
        default_occur,
        phrase_slop: slop(query, "phrase_slop"),
    };
    let tree = parser.group(false);

    evaluate_node(&tree, fields, default_occur).unwrap_or(false)
}

// `None` when the node analyzes to nothing and drops out of its group.
fn evaluate_node(node: &TextNode, fields: &[FieldText], default_occur: Occur) -> Option<bool> {
    let scoped = |field: &Option<String>| -> Vec<&FieldText> {
        match field {
            Some(name) => fields.iter().filter(|f| f.name == *name).collect(),
            None => fields.iter().collect(),
        }
    };

    match node {
        TextNode::Term { field, text, fuzzy } => {
            let terms = analyze(text);
            if terms.is_empty() {
                return None;
            }
            let fuzziness = fuzzy.map(Fuzziness::Edits);
            let required = match default_occur {
                Occur::Must => terms.len(),
                _ => 1,
            };
            Some(
                scoped(field)
                    .iter()
                    .any(|f| bag_matches(&f.tokens, &terms, false, required, fuzziness)),
            )
        }
        TextNode::Prefix { field, text } => {
            let stem = analyze(text).pop()?;
            Some(
                scoped(field)
                    .iter()
                    .any(|f| f.tokens.iter().any(|t| t.starts_with(&stem))),
            )
        }
        TextNode::Wildcard { field, pattern } => Some(
            scoped(field)
                .iter()
                .any(|f| f.tokens.iter().any(|t| wildcard_matches(t, pattern, true))),
        ),
        TextNode::Phrase { field, text, slop } => {
            let terms = analyze(text);
            if terms.is_empty() {
                return None;
            }
            Some(
                scoped(field)
                    .iter()
                    .any(|f| phrase_matches(&f.tokens, &terms, *slop, false)),
            )
        }
        TextNode::Group(clauses) => {
            let mut any_clause = false;
            let (mut has_must, mut has_should, mut should_hit) = (false, false, false);
            for (occur, child) in clauses {
                let Some(hit) = evaluate_node(child, fields, default_occur) else {
                    continue;
                };
                any_clause = true;
                match occur {
                    Occur::Must if !hit => return Some(false),
                    Occur::MustNot if hit => return Some(false),
                    Occur::Must => has_must = true,
                    Occur::Should => {
                        has_should = true;
                        should_hit |= hit;
                    }
                    Occur::MustNot => {}
                }
            }
            if !any_clause {
                return None;
            }
            Some(has_must || !has_should || should_hit)
        }
    }
}
