mod property;

use super::*;
use crate::{
    backend::RangeBound,
    config::RelevanceConfig,
    expr::{Binder, Expr},
    function::FunctionRegistry,
    relevance::{FieldSpec, RelevanceCall, RelevanceKind},
    test_support::{props_at, sample_schema},
    value::{ArithOp, ExprType, NativeValue, Value},
};

const NOW: &str = "2024-01-01T10:00:00Z";

fn bind(expr: &Expr) -> BoundExpr {
    let schema = sample_schema();
    let relevance = RelevanceConfig::default();
    let binder = Binder::new(&schema, FunctionRegistry::builtin(), &relevance);

    binder.bind_predicate(expr).expect("bind")
}

fn split_with(expr: &Expr, script_pushdown: bool) -> SplitPlan {
    let schema = sample_schema();
    let config = PushdownConfig {
        script_pushdown,
        aggregation_bucket_limit: None,
    };
    let props = props_at(NOW);

    PushdownEngine::new(&schema, &config, &props).split(bind(expr))
}

fn split(expr: &Expr) -> SplitPlan {
    split_with(expr, false)
}

fn age() -> Expr {
    Expr::field("age")
}

fn int(v: i32) -> Expr {
    Expr::lit(Value::Integer(v))
}

fn text(v: &str) -> Expr {
    Expr::lit(Value::string(v))
}

fn age_plus_one_over_30() -> Expr {
    Expr::gt(Expr::arith(ArithOp::Add, age(), int(1)), int(30))
}

fn age_range(lower: Option<RangeBound>, upper: Option<RangeBound>) -> NativeQuery {
    NativeQuery::range("age", lower, upper)
}

fn ts_range(lower: Option<RangeBound>, upper: Option<RangeBound>) -> NativeQuery {
    NativeQuery::range("ts", lower, upper)
}

fn stamp(text: &str) -> NativeValue {
    NativeValue::string(text)
}

//
// native rendering
//

#[test]
fn comparisons_render_as_ranges_and_terms() {
    let plan = split(&Expr::gt(age(), int(30)));
    assert_eq!(plan.outcome, SplitOutcome::Native);
    assert_eq!(
        plan.native,
        Some(age_range(Some(RangeBound::exclusive(NativeValue::Int(30))), None))
    );
    assert!(plan.residual.is_none());

    let plan = split(&Expr::eq(Expr::field("name"), text("bob")));
    assert_eq!(plan.native, Some(NativeQuery::term("name", stamp("bob"))));
}

#[test]
fn literal_on_the_left_flips_the_operator() {
    let plan = split(&Expr::lt(int(30), age()));

    assert_eq!(
        plan.native,
        Some(age_range(Some(RangeBound::exclusive(NativeValue::Int(30))), None))
    );
}

#[test]
fn negated_comparisons_render_the_opposite_range() {
    let plan = split(&Expr::not(Expr::gt(age(), int(5))));

    assert_eq!(plan.outcome, SplitOutcome::Native);
    assert_eq!(
        plan.native,
        Some(age_range(None, Some(RangeBound::inclusive(NativeValue::Int(5)))))
    );
}

#[test]
fn not_equal_requires_the_field_to_exist() {
    let plan = split(&Expr::ne(age(), int(5)));

    assert_eq!(
        plan.native,
        Some(NativeQuery::and(vec![
            NativeQuery::exists("age"),
            NativeQuery::not(NativeQuery::term("age", NativeValue::Int(5))),
        ]))
    );
}

#[test]
fn null_comparisons_match_nothing() {
    let plan = split(&Expr::eq(age(), Expr::lit(Value::Null)));

    assert_eq!(plan.native, Some(NativeQuery::MatchNone));
}

#[test]
fn in_lists_with_null_never_negate_to_true() {
    let plan = split(&Expr::in_list(age(), vec![int(1), int(2)]));
    assert_eq!(
        plan.native,
        Some(NativeQuery::Terms {
            field: "age".to_string(),
            values: vec![NativeValue::Int(1), NativeValue::Int(2)],
        })
    );

    let plan = split(&Expr::not_in(age(), vec![int(1), Expr::lit(Value::Null)]));
    assert_eq!(plan.native, Some(NativeQuery::MatchNone));
}

#[test]
fn null_checks_render_as_exists() {
    let plan = split(&Expr::is_null(Expr::field("name")));
    assert_eq!(
        plan.native,
        Some(NativeQuery::not(NativeQuery::exists("name")))
    );

    let plan = split(&Expr::not(Expr::is_not_null(Expr::field("name"))));
    assert_eq!(
        plan.native,
        Some(NativeQuery::not(NativeQuery::exists("name")))
    );
}

#[test]
fn like_renders_a_case_insensitive_wildcard() {
    let plan = split(&Expr::like(Expr::field("name"), "a%"));
    let wildcard = NativeQuery::Wildcard {
        field: "name".to_string(),
        pattern: "a*".to_string(),
        case_insensitive: true,
    };
    assert_eq!(plan.native, Some(wildcard.clone()));

    let plan = split(&Expr::not(Expr::like(Expr::field("name"), "a%")));
    assert_eq!(
        plan.native,
        Some(NativeQuery::and(vec![
            NativeQuery::exists("name"),
            NativeQuery::not(wildcard),
        ]))
    );
}

#[test]
fn boolean_fields_render_as_terms() {
    let plan = split(&Expr::not(Expr::field("active")));

    assert_eq!(
        plan.native,
        Some(NativeQuery::term("active", NativeValue::Bool(false)))
    );
}

#[test]
fn relevance_calls_render_as_full_text() {
    let call = RelevanceCall::new(RelevanceKind::Match, FieldSpec::single("title"), "fox");
    let plan = split(&Expr::relevance(call));

    assert_eq!(plan.outcome, SplitOutcome::Native);
    assert!(matches!(plan.native, Some(NativeQuery::FullText(ref q)) if q.query() == "fox"));
}

//
// relative time
//

#[test]
fn latest_one_hour_back_becomes_an_exclusive_upper_bound() {
    let plan = split(&Expr::call("latest", vec![text("-1h"), Expr::field("ts")]));

    assert_eq!(plan.outcome, SplitOutcome::Native);
    assert_eq!(
        plan.native,
        Some(ts_range(
            None,
            Some(RangeBound::exclusive(stamp("2024-01-01 09:00:00")))
        ))
    );
}

#[test]
fn earliest_and_negated_latest_become_inclusive_lower_bounds() {
    let lower = Some(ts_range(
        Some(RangeBound::inclusive(stamp("2024-01-01 00:00:00"))),
        None,
    ));

    let plan = split(&Expr::call("earliest", vec![text("@d"), Expr::field("ts")]));
    assert_eq!(plan.native, lower);

    let plan = split(&Expr::not(Expr::call(
        "latest",
        vec![text("@d"), Expr::field("ts")],
    )));
    assert_eq!(plan.native, lower);
}

#[test]
fn unparsable_relative_time_stays_local() {
    let plan = split(&Expr::call("latest", vec![text("-1fortnight"), Expr::field("ts")]));

    assert_eq!(plan.outcome, SplitOutcome::Residual);
    assert_eq!(plan.decisions, vec![Classification::Residual("no native form")]);
}

//
// constant folding
//

#[test]
fn constant_subtrees_fold_before_rendering() {
    let plan = split(&Expr::gt(age(), Expr::arith(ArithOp::Add, int(2), int(3))));
    assert_eq!(
        plan.native,
        Some(age_range(Some(RangeBound::exclusive(NativeValue::Int(5))), None))
    );

    let plan = split(&Expr::lt(Expr::field("ts"), Expr::call("now", Vec::new())));
    assert_eq!(
        plan.native,
        Some(ts_range(
            None,
            Some(RangeBound::exclusive(stamp("2024-01-01 10:00:00")))
        ))
    );
}

#[test]
fn constant_false_conjuncts_match_nothing() {
    let plan = split(&(Expr::gt(age(), int(20)) & Expr::lit(Value::Boolean(false))));

    assert_eq!(plan.outcome, SplitOutcome::Native);
    assert_eq!(plan.native, Some(NativeQuery::MatchNone));
}

//
// splitting
//

#[test]
fn unrenderable_conjuncts_split_into_the_residual() {
    let plan = split(&(Expr::gt(age(), int(20)) & age_plus_one_over_30()));

    assert_eq!(plan.outcome, SplitOutcome::Partial);
    assert_eq!(
        plan.native,
        Some(age_range(Some(RangeBound::exclusive(NativeValue::Int(20))), None))
    );
    assert_eq!(plan.residual, Some(bind(&age_plus_one_over_30())));
    assert_eq!(
        plan.decisions,
        vec![
            Classification::Native,
            Classification::Residual("no native form")
        ]
    );
}

#[test]
fn disjunctions_push_down_only_as_a_whole() {
    let predicate = Expr::gt(age(), int(40)) | age_plus_one_over_30();
    let plan = split(&predicate);

    assert_eq!(plan.outcome, SplitOutcome::Residual);
    assert!(plan.native.is_none());
    assert_eq!(plan.residual, Some(bind(&predicate)));
}

#[test]
fn casted_fields_are_not_native() {
    let plan = split(&Expr::gt(
        Expr::cast(age(), ExprType::Long),
        Expr::lit(Value::Long(5)),
    ));

    assert_eq!(plan.outcome, SplitOutcome::Residual);
}

#[test]
fn scripts_carry_pure_conjuncts_when_enabled() {
    let plan = split_with(&(Expr::gt(age(), int(20)) & age_plus_one_over_30()), true);

    assert_eq!(plan.outcome, SplitOutcome::Native);
    assert!(plan.residual.is_none());
    assert_eq!(
        plan.decisions,
        vec![Classification::Native, Classification::Script]
    );

    let Some(NativeQuery::Bool(query)) = &plan.native else {
        panic!("expected a conjunction, got {:?}", plan.native);
    };
    assert_eq!(query.must.len(), 2);
    assert!(matches!(
        &query.must[1],
        NativeQuery::Script(script)
            if script.predicate == bind(&age_plus_one_over_30())
                && script.instant == props_at(NOW).instant()
    ));
}

#[test]
fn relevance_and_context_aware_calls_are_never_scripts() {
    let call = RelevanceCall::new(RelevanceKind::Match, FieldSpec::single("title"), "fox");
    let with_relevance = Expr::relevance(call) | age_plus_one_over_30();
    let plan = split_with(&with_relevance, true);
    assert_eq!(plan.decisions, vec![Classification::Residual("not scriptable")]);

    let relative = Expr::call("latest", vec![text("-1fortnight"), Expr::field("ts")]);
    let plan = split_with(&relative, true);
    assert_eq!(plan.decisions, vec![Classification::Residual("not scriptable")]);
}

//
// derived columns
//

#[test]
fn derived_columns_force_the_whole_predicate_residual() {
    let predicate = Expr::gt(age(), int(20)) & Expr::eq(Expr::field("score_bucket"), text("high"));
    let plan = split(&predicate);

    assert_eq!(plan.outcome, SplitOutcome::Barrier);
    assert!(plan.native.is_none());
    assert_eq!(plan.residual, Some(bind(&predicate)));
    assert_eq!(
        plan.decisions,
        vec![Classification::Barrier("score_bucket".to_string())]
    );
}

#[test]
fn derived_columns_hold_back_relevance_on_indexed_fields() {
    let call = RelevanceCall::new(RelevanceKind::Match, FieldSpec::single("title"), "fox");
    let predicate = Expr::relevance(call) & Expr::eq(Expr::field("score_bucket"), text("high"));
    let plan = split(&predicate);

    assert_eq!(plan.outcome, SplitOutcome::Barrier);
    assert!(plan.native.is_none());
    let residual = plan.residual.expect("residual predicate");
    assert!(residual.any(&|node| matches!(node, BoundExpr::Relevance(_))));
    assert_eq!(residual, bind(&predicate));
}

#[test]
fn all_field_relevance_reaches_derived_text_columns() {
    let call = RelevanceCall::new(
        RelevanceKind::SimpleQueryString,
        FieldSpec::List(Vec::new()),
        "high",
    );
    let plan = split(&Expr::relevance(call));

    assert_eq!(plan.outcome, SplitOutcome::Barrier);
}

#[test]
fn classify_reports_per_conjunct_decisions() {
    let schema = sample_schema();
    let config = PushdownConfig::default();
    let props = props_at(NOW);
    let engine = PushdownEngine::new(&schema, &config, &props);

    assert_eq!(
        engine.classify(&bind(&Expr::gt(age(), int(1)))),
        Classification::Native
    );
    assert_eq!(
        engine.classify(&bind(&Expr::eq(Expr::field("score_bucket"), text("low")))),
        Classification::Barrier("score_bucket".to_string())
    );
    assert_eq!(
        engine.derived_reference(&bind(&Expr::is_null(Expr::field("score_bucket")))),
        Some("score_bucket".to_string())
    );
    assert!(engine.derived_reference(&bind(&Expr::gt(age(), int(1)))).is_none());
}
