use super::*;
use crate::{
    config::RelevanceConfig,
    expr::{Binder, Expr},
    function::FunctionRegistry,
    relevance::{FieldSpec, RelevanceCall, RelevanceKind, parse_relevance_call, translate},
    test_support::{instant, sample_rows, sample_schema},
    value::ArithOp,
};
use std::collections::BTreeMap;

fn backend() -> MemoryBackend {
    MemoryBackend::new(sample_schema(), sample_rows())
}

fn hits(query: &NativeQuery) -> Vec<i64> {
    backend()
        .search(Some(query))
        .expect("search")
        .iter()
        .filter_map(|row| match row.get("id") {
            Some(NativeValue::Long(id)) => Some(*id),
            _ => None,
        })
        .collect()
}

fn full_text(text: &str) -> NativeQuery {
    let call = parse_relevance_call(text).expect("relevance call parses");
    full_text_call(&call, &RelevanceConfig::default())
}

fn full_text_call(call: &RelevanceCall, config: &RelevanceConfig) -> NativeQuery {
    NativeQuery::FullText(translate(call, config).expect("translate"))
}

//
// structured queries
//

#[test]
fn absent_query_returns_every_row() {
    let rows = backend().search(None).expect("search");

    assert_eq!(rows.len(), 5);
}

#[test]
fn term_and_terms_compare_under_the_field_type() {
    assert_eq!(hits(&NativeQuery::term("age", NativeValue::Int(35))), vec![2]);
    assert_eq!(
        hits(&NativeQuery::Terms {
            field: "name".to_string(),
            values: vec![NativeValue::string("alice"), NativeValue::string("dave")],
        }),
        vec![1, 5]
    );
}

#[test]
fn ranges_honour_bound_inclusivity() {
    let query = NativeQuery::range(
        "age",
        Some(RangeBound::exclusive(NativeValue::Int(25))),
        Some(RangeBound::inclusive(NativeValue::Int(42))),
    );

    assert_eq!(hits(&query), vec![2, 3]);
}

#[test]
fn timestamp_ranges_parse_backend_text() {
    let query = NativeQuery::range(
        "ts",
        Some(RangeBound::inclusive(NativeValue::string("2024-01-01 00:00:00"))),
        None,
    );

    assert_eq!(hits(&query), vec![1, 3, 4]);
}

#[test]
fn null_values_count_as_absent() {
    assert_eq!(hits(&NativeQuery::exists("score")), vec![1, 3, 5]);
    assert_eq!(hits(&NativeQuery::not(NativeQuery::exists("name"))), vec![4]);
    assert_eq!(
        hits(&NativeQuery::range(
            "score",
            Some(RangeBound::inclusive(NativeValue::Double(0.0))),
            None,
        )),
        vec![1, 3, 5]
    );
}

#[test]
fn wildcards_match_whole_values() {
    let pattern = |pattern: &str, case_insensitive| NativeQuery::Wildcard {
        field: "name".to_string(),
        pattern: pattern.to_string(),
        case_insensitive,
    };

    assert_eq!(hits(&pattern("*o*", false)), vec![2, 3]);
    assert_eq!(hits(&pattern("?ave", false)), vec![5]);
    assert_eq!(hits(&pattern("ALI*", false)), Vec::<i64>::new());
    assert_eq!(hits(&pattern("ALI*", true)), vec![1]);
}

#[test]
fn wildcard_escapes_match_literally() {
    assert!(text::wildcard_matches("what?", r"what\?", false));
    assert!(!text::wildcard_matches("whats", r"what\?", false));
    assert!(text::wildcard_matches("2*3", r"2\*3", false));
    assert!(text::wildcard_matches("abc", "a*c", false));
    assert!(!text::wildcard_matches("ab", "a?c", false));
}

#[test]
fn boolean_queries_combine_clauses() {
    let query = NativeQuery::and(vec![
        NativeQuery::term("active", NativeValue::Bool(true)),
        NativeQuery::or(vec![
            NativeQuery::term("name", NativeValue::string("carol")),
            NativeQuery::term("age", NativeValue::Int(19)),
        ]),
    ]);

    assert_eq!(hits(&query), vec![3]);
}

#[test]
fn unknown_fields_are_request_errors() {
    let err = backend()
        .search(Some(&NativeQuery::exists("nope")))
        .expect_err("unknown field");

    assert_eq!(err, BackendError::UnknownField("nope".to_string()));
}

//
// scripts
//

#[test]
fn scripts_evaluate_the_shipped_predicate() {
    let schema = sample_schema();
    let relevance = RelevanceConfig::default();
    let binder = Binder::new(&schema, FunctionRegistry::builtin(), &relevance);
    let predicate = binder
        .bind_predicate(&Expr::gt(
            Expr::arith(ArithOp::Add, Expr::field("age"), Expr::lit(Value::Integer(1))),
            Expr::lit(Value::Integer(30)),
        ))
        .expect("bind");

    let query = NativeQuery::Script(ScriptQuery {
        predicate,
        instant: instant("2024-01-01T10:00:00Z"),
    });

    assert_eq!(hits(&query), vec![2, 3]);
}

//
// full text
//

#[test]
fn match_defaults_to_or_and_honours_and() {
    assert_eq!(hits(&full_text("match(title, 'brown fox')")), vec![1, 3, 4]);
    assert_eq!(
        hits(&full_text("match(title, 'brown fox', operator='AND')")),
        vec![1]
    );
}

#[test]
fn match_analyzes_case_and_punctuation_away() {
    assert_eq!(hits(&full_text("match(title, 'LAZY, dog!')")), vec![2]);
}

#[test]
fn match_fuzziness_tolerates_small_edits() {
    assert_eq!(hits(&full_text("match(title, 'quik')")), Vec::<i64>::new());
    assert_eq!(
        hits(&full_text("match(title, 'quik', fuzziness='AUTO')")),
        vec![1]
    );
}

#[test]
fn phrases_require_order_within_slop() {
    assert_eq!(
        hits(&full_text("match_phrase(body, 'quick fox')")),
        Vec::<i64>::new()
    );
    assert_eq!(
        hits(&full_text("match_phrase(body, 'quick fox', slop=1)")),
        vec![1]
    );
    assert_eq!(
        hits(&full_text("match_phrase(body, 'fox quick', slop=5)")),
        Vec::<i64>::new()
    );
    assert_eq!(
        hits(&full_text("match_phrase_prefix(body, 'brown be')")),
        vec![3]
    );
}

#[test]
fn missing_text_fields_never_match() {
    assert_eq!(hits(&full_text("match(body, 'hound')")), Vec::<i64>::new());
    assert_eq!(hits(&full_text("match(title, 'hound')")), vec![4]);
}

#[test]
fn multi_match_cross_fields_pools_terms() {
    let best = "multi_match([title, body], 'lazy sleep', operator='AND')";
    let cross = "multi_match([title, body], 'lazy sleep', operator='AND', type='cross_fields')";

    assert_eq!(hits(&full_text(best)), Vec::<i64>::new());
    assert_eq!(hits(&full_text(cross)), vec![2]);
}

#[test]
fn query_string_supports_qualifiers_and_keywords() {
    assert_eq!(
        hits(&full_text("query_string([title], 'title:fox AND NOT hound')")),
        vec![1]
    );
    assert_eq!(
        hits(&full_text("query_string([title, body], 'sleep OR bear')")),
        vec![2, 3]
    );
    assert_eq!(
        hits(&full_text("query_string([title], '(brown OR lazy) AND -bear')")),
        vec![1, 2]
    );
}

#[test]
fn escaped_wildcards_in_query_string_match_literally() {
    let call = |query: &str| {
        RelevanceCall::new(
            RelevanceKind::QueryString,
            FieldSpec::list([("title", None)]),
            query,
        )
    };
    let plain = RelevanceConfig::default();
    let escaping = RelevanceConfig {
        escape_defaults: BTreeMap::from([(RelevanceKind::QueryString, true)]),
    };

    // Unescaped, `?` is a one-character wildcard and `free` is too short.
    assert_eq!(hits(&full_text_call(&call("free?"), &plain)), Vec::<i64>::new());
    assert_eq!(hits(&full_text_call(&call(r"free\?"), &plain)), vec![5]);
    assert_eq!(hits(&full_text_call(&call("free?"), &escaping)), vec![5]);
}

#[test]
fn simple_query_string_gates_operators_by_flag() {
    assert_eq!(
        hits(&full_text("simple_query_string([title], 'fox -hound')")),
        vec![1]
    );
    assert_eq!(
        hits(&full_text(
            "simple_query_string([title], 'fox -hound', flags='AND|OR')"
        )),
        vec![1, 4]
    );
    assert_eq!(
        hits(&full_text("simple_query_string([title], 'soft*')")),
        vec![5]
    );
    assert_eq!(
        hits(&full_text(
            "simple_query_string([title], 'soft*', flags='NONE')"
        )),
        Vec::<i64>::new()
    );
}

#[test]
fn simple_query_string_negation_partitions_the_corpus() {
    // Row 4 has no body; only the negated query keeps it.
    let literal = hits(&full_text(
        "simple_query_string([body], '-fox', flags='NONE|PREFIX')",
    ));
    let negated = hits(&full_text(
        "simple_query_string([body], '-fox', flags='NOT|AND|OR')",
    ));

    assert_eq!(literal, vec![1]);
    assert_eq!(negated, vec![2, 3, 4, 5]);
    assert!(literal.iter().all(|id| !negated.contains(id)));
    assert_eq!(literal.len() + negated.len(), sample_rows().len());
}

#[test]
fn all_field_searches_cover_every_text_field() {
    assert_eq!(
        hits(&full_text("simple_query_string([], 'woods')")),
        vec![3]
    );
    assert_eq!(
        hits(&full_text("simple_query_string(['*'], 'animal')")),
        vec![1]
    );
}
