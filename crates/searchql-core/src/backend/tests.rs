use super::*;
use crate::{expr::BoundExpr, test_support::instant, value::Value};
use serde_json::json;

fn long(v: i64) -> NativeValue {
    NativeValue::Long(v)
}

//
// query construction
//

#[test]
fn conjunctions_fold_constants_and_flatten() {
    let a = NativeQuery::term("a", long(1));
    let b = NativeQuery::exists("b");
    let c = NativeQuery::term("c", long(3));

    assert_eq!(
        NativeQuery::and(vec![NativeQuery::MatchAll, a.clone()]),
        a.clone()
    );
    assert_eq!(
        NativeQuery::and(vec![a.clone(), NativeQuery::MatchNone]),
        NativeQuery::MatchNone
    );
    assert_eq!(NativeQuery::and(vec![]), NativeQuery::MatchAll);

    let nested = NativeQuery::and(vec![NativeQuery::and(vec![a.clone(), b.clone()]), c.clone()]);
    assert_eq!(
        nested,
        NativeQuery::Bool(BoolQuery {
            must: vec![a, b, c],
            ..BoolQuery::default()
        })
    );
}

#[test]
fn disjunctions_and_negations_fold_constants() {
    let a = NativeQuery::term("a", long(1));

    assert_eq!(
        NativeQuery::or(vec![NativeQuery::MatchNone, a.clone()]),
        a.clone()
    );
    assert_eq!(
        NativeQuery::or(vec![a.clone(), NativeQuery::MatchAll]),
        NativeQuery::MatchAll
    );
    assert_eq!(NativeQuery::or(vec![]), NativeQuery::MatchNone);
    assert_eq!(NativeQuery::not(NativeQuery::MatchAll), NativeQuery::MatchNone);
    assert_eq!(
        NativeQuery::not(a.clone()),
        NativeQuery::Bool(BoolQuery {
            must_not: vec![a],
            ..BoolQuery::default()
        })
    );
}

#[test]
fn negated_conjuncts_are_not_flattened_into_must() {
    let a = NativeQuery::term("a", long(1));
    let not_b = NativeQuery::not(NativeQuery::exists("b"));

    let query = NativeQuery::and(vec![a.clone(), not_b.clone()]);

    assert_eq!(
        query,
        NativeQuery::Bool(BoolQuery {
            must: vec![a, not_b],
            ..BoolQuery::default()
        })
    );
}

//
// rendering
//

#[test]
fn leaf_queries_render_in_the_backend_dsl() {
    assert_eq!(
        NativeQuery::term("age", NativeValue::Int(30)).to_json(),
        json!({ "term": { "age": { "value": 30 } } })
    );
    assert_eq!(
        NativeQuery::Terms {
            field: "name".to_string(),
            values: vec![NativeValue::string("a"), NativeValue::string("b")],
        }
        .to_json(),
        json!({ "terms": { "name": ["a", "b"] } })
    );
    assert_eq!(
        NativeQuery::range(
            "age",
            Some(RangeBound::inclusive(NativeValue::Int(18))),
            Some(RangeBound::exclusive(NativeValue::Int(65))),
        )
        .to_json(),
        json!({ "range": { "age": { "gte": 18, "lt": 65 } } })
    );
    assert_eq!(
        NativeQuery::exists("name").to_json(),
        json!({ "exists": { "field": "name" } })
    );
    assert_eq!(
        NativeQuery::Wildcard {
            field: "name".to_string(),
            pattern: "al*".to_string(),
            case_insensitive: true,
        }
        .to_json(),
        json!({ "wildcard": { "name": { "wildcard": "al*", "case_insensitive": true } } })
    );
    assert_eq!(NativeQuery::MatchNone.to_json(), json!({ "match_none": {} }));
}

#[test]
fn bool_queries_require_one_should_clause() {
    let query = NativeQuery::and(vec![
        NativeQuery::exists("age"),
        NativeQuery::or(vec![
            NativeQuery::term("a", long(1)),
            NativeQuery::term("b", long(2)),
        ]),
    ]);

    assert_eq!(
        query.to_json(),
        json!({
            "bool": {
                "must": [
                    { "exists": { "field": "age" } },
                    {
                        "bool": {
                            "should": [
                                { "term": { "a": { "value": 1 } } },
                                { "term": { "b": { "value": 2 } } },
                            ],
                            "minimum_should_match": 1,
                        }
                    },
                ]
            }
        })
    );
}

#[test]
fn script_queries_carry_source_and_instant() {
    let at = instant("2024-01-01T10:00:00Z");
    let query = NativeQuery::Script(ScriptQuery {
        predicate: BoundExpr::literal(Value::Boolean(true)),
        instant: at,
    });

    assert_eq!(
        query.to_json(),
        json!({
            "script": {
                "script": {
                    "lang": SCRIPT_LANG,
                    "source": "true",
                    "params": { "utcTimestamp": at.timestamp_millis() },
                }
            }
        })
    );
}

//
// LIKE translation
//

#[test]
fn like_patterns_become_wildcards() {
    let cases = [
        ("a%", "a*"),
        ("_b_", "?b?"),
        (r"100\%", "100%"),
        (r"a\_b", "a_b"),
        ("what?", r"what\?"),
        ("2*3", r"2\*3"),
        (r"c:\\dir", r"c:\\dir"),
        (r"trailing\", r"trailing\\"),
    ];

    for (like, wildcard) in cases {
        assert_eq!(like_to_wildcard(like), wildcard, "{like}");
    }
}

//
// rows
//

#[test]
fn rows_collect_from_pairs() {
    let row: Row = [("a", long(1)), ("b", NativeValue::Null)].into_iter().collect();

    assert_eq!(row.get("a"), Some(&long(1)));
    assert_eq!(row.get("b"), Some(&NativeValue::Null));
    assert!(row.get("c").is_none());
    assert_eq!(row, Row::new().with("b", NativeValue::Null).with("a", long(1)));
}
