use super::*;
use crate::{
    backend::Row,
    config::RelevanceConfig,
    function::FunctionRegistry,
    relevance::{FieldSpec, RelevanceCall, RelevanceKind},
    test_support::{props_at, sample_rows, sample_schema},
    value::{ArithOp, ExprType, NativeValue, Value},
};
use proptest::prelude::*;

fn bind(expr: &Expr) -> Result<BoundExpr, BindError> {
    let schema = sample_schema();
    let relevance = RelevanceConfig::default();
    let binder = Binder::new(&schema, FunctionRegistry::builtin(), &relevance);

    binder.bind_predicate(expr)
}

fn int(v: i32) -> Expr {
    Expr::lit(Value::Integer(v))
}

fn text(v: &str) -> Expr {
    Expr::lit(Value::string(v))
}

fn truth(v: Option<bool>) -> Expr {
    Expr::lit(v.map_or(Value::Null, Value::Boolean))
}

fn eval_on(expr: &Expr, row: &Row) -> Option<bool> {
    let bound = bind(expr).expect("bind");
    let props = props_at("2024-01-01T10:00:00Z");

    eval_predicate(&bound, row, &EvalEnv::new(&props)).expect("eval")
}

fn row(id: i64) -> Row {
    sample_rows()
        .into_iter()
        .find(|row| row.get("id") == Some(&NativeValue::Long(id)))
        .expect("sample row")
}

//
// binding
//

#[test]
fn unknown_names_are_rejected() {
    assert_eq!(
        bind(&Expr::eq(Expr::field("nope"), int(1))),
        Err(BindError::UnknownField("nope".to_string()))
    );
    assert_eq!(
        bind(&Expr::call("frobnicate", vec![])),
        Err(BindError::UnknownFunction("frobnicate".to_string()))
    );
}

#[test]
fn literals_are_coerced_to_the_column_type() {
    let bound = bind(&Expr::gt(Expr::field("ts"), text("2024-01-01 09:00:00"))).expect("bind");

    let BoundExpr::Compare { right, .. } = bound else {
        panic!("expected a comparison, got {bound:?}");
    };
    assert_eq!(right.ty(), ExprType::Timestamp);
    assert!(matches!(
        right.as_literal(),
        Some(Value::Timestamp(ts)) if ts.to_string() == "2024-01-01 09:00:00"
    ));
}

#[test]
fn narrower_columns_are_widened_with_a_cast() {
    let bound = bind(&Expr::eq(Expr::field("age"), Expr::lit(Value::Long(30)))).expect("bind");

    let BoundExpr::Compare { left, right, .. } = bound else {
        panic!("expected a comparison, got {bound:?}");
    };
    assert!(matches!(*left, BoundExpr::Cast { ty: ExprType::Long, .. }));
    assert_eq!(right.ty(), ExprType::Long);
}

#[test]
fn incompatible_operands_are_rejected() {
    assert!(matches!(
        bind(&Expr::eq(Expr::field("name"), int(5))),
        Err(BindError::Incompatible {
            left: ExprType::String,
            right: ExprType::Integer,
            ..
        })
    ));
    assert!(matches!(
        bind(&Expr::gt(
            Expr::arith(ArithOp::Add, Expr::field("name"), int(1)),
            int(2)
        )),
        Err(BindError::TypeMismatch {
            expected: "a numeric type",
            ..
        })
    ));
    assert!(matches!(
        bind(&Expr::in_list(Expr::field("age"), vec![text("x")])),
        Err(BindError::Incompatible { .. })
    ));
}

#[test]
fn boolean_operators_require_boolean_operands() {
    assert!(matches!(
        bind(&Expr::not(Expr::field("age"))),
        Err(BindError::TypeMismatch {
            expected: "BOOLEAN",
            found: ExprType::Integer,
            ..
        })
    ));
    assert_eq!(
        bind(&Expr::field("age")),
        Err(BindError::NotPredicate(ExprType::Integer))
    );
}

#[test]
fn empty_junctions_bind_to_their_identity() {
    assert_eq!(
        bind(&Expr::and(vec![])),
        Ok(BoundExpr::literal(Value::Boolean(true)))
    );
    assert_eq!(
        bind(&Expr::or(vec![])),
        Ok(BoundExpr::literal(Value::Boolean(false)))
    );
}

#[test]
fn untyped_null_operands_become_boolean_nulls() {
    let bound = bind(&(Expr::field("active") & Expr::lit(Value::Null))).expect("bind");

    let BoundExpr::And(items) = bound else {
        panic!("expected AND, got {bound:?}");
    };
    assert_eq!(
        items[1],
        BoundExpr::Literal {
            value: Value::Null,
            ty: ExprType::Boolean
        }
    );
}

#[test]
fn call_arity_is_checked_at_bind() {
    assert!(matches!(
        bind(&Expr::call("latest", vec![text("-1h")])),
        Err(BindError::Bridge(_))
    ));
}

#[test]
fn relevance_calls_translate_and_resolve_their_fields() {
    let call = RelevanceCall::new(RelevanceKind::Match, FieldSpec::single("title"), "fox");
    let bound = bind(&Expr::relevance(call)).expect("bind");
    assert!(matches!(bound, BoundExpr::Relevance(ref q) if q.kind() == RelevanceKind::Match));

    let missing = RelevanceCall::new(RelevanceKind::Match, FieldSpec::single("nope"), "fox");
    assert_eq!(
        bind(&Expr::relevance(missing)),
        Err(BindError::UnknownField("nope".to_string()))
    );

    let patterned = RelevanceCall::new(
        RelevanceKind::SimpleQueryString,
        FieldSpec::list([("nothing_*", None)]),
        "fox",
    );
    assert!(bind(&Expr::relevance(patterned)).is_ok());

    let invalid = RelevanceCall::new(RelevanceKind::Match, FieldSpec::single("title"), "fox")
        .with_option("operator", Value::string("MAYBE"));
    assert!(matches!(
        bind(&Expr::relevance(invalid)),
        Err(BindError::Relevance(_))
    ));
}

#[test]
fn bound_trees_render_as_script_source() {
    let bound = bind(
        &(Expr::gt(Expr::field("age"), int(30)) | Expr::is_null(Expr::field("name"))),
    )
    .expect("bind");

    assert_eq!(bound.to_string(), "((`age` > 30) OR isnull(`name`))");
}

//
// evaluation
//

#[test]
fn missing_fields_differ_from_explicit_nulls() {
    let schema = sample_schema();
    let relevance = RelevanceConfig::default();
    let binder = Binder::new(&schema, FunctionRegistry::builtin(), &relevance);
    let props = props_at("2024-01-01T10:00:00Z");
    let env = EvalEnv::new(&props);

    let age = binder.bind(&Expr::field("age")).expect("bind");
    let name = binder.bind(&Expr::field("name")).expect("bind");

    assert_eq!(eval(&age, &row(4), &env), Ok(None));
    assert_eq!(eval(&name, &row(4), &env), Ok(Some(Value::Null)));
    assert_eq!(eval(&age, &row(1), &env), Ok(Some(Value::Integer(25))));
}

#[test]
fn three_valued_connectives() {
    let empty = Row::new();
    let cases = [
        (Some(true), None, None, Some(true)),
        (Some(false), None, Some(false), None),
        (None, None, None, None),
        (Some(true), Some(false), Some(false), Some(true)),
    ];

    for (a, b, and, or) in cases {
        assert_eq!(eval_on(&(truth(a) & truth(b)), &empty), and, "{a:?} AND {b:?}");
        assert_eq!(eval_on(&(truth(b) & truth(a)), &empty), and, "{b:?} AND {a:?}");
        assert_eq!(eval_on(&(truth(a) | truth(b)), &empty), or, "{a:?} OR {b:?}");
    }
    assert_eq!(eval_on(&Expr::not(truth(None)), &empty), None);
}

#[test]
fn comparisons_against_missing_or_null_are_unknown() {
    let older = Expr::gt(Expr::field("age"), int(30));

    assert_eq!(eval_on(&older, &row(2)), Some(true));
    assert_eq!(eval_on(&older, &row(1)), Some(false));
    assert_eq!(eval_on(&older, &row(4)), None);
    assert_eq!(eval_on(&Expr::not(older), &row(4)), None);
}

#[test]
fn in_lists_follow_sql_null_semantics() {
    let with_null = vec![int(25), Expr::lit(Value::Null)];

    assert_eq!(
        eval_on(&Expr::in_list(Expr::field("age"), with_null.clone()), &row(1)),
        Some(true)
    );
    assert_eq!(
        eval_on(&Expr::in_list(Expr::field("age"), with_null.clone()), &row(2)),
        None
    );
    assert_eq!(
        eval_on(&Expr::not_in(Expr::field("age"), with_null), &row(2)),
        None
    );
    assert_eq!(
        eval_on(&Expr::not_in(Expr::field("age"), vec![int(25)]), &row(2)),
        Some(true)
    );
}

#[test]
fn null_policies_see_missing_operands() {
    assert_eq!(eval_on(&Expr::is_null(Expr::field("age")), &row(4)), Some(true));
    assert_eq!(eval_on(&Expr::is_null(Expr::field("name")), &row(4)), Some(true));
    assert_eq!(eval_on(&Expr::is_not_null(Expr::field("name")), &row(1)), Some(true));
}

#[test]
fn like_is_case_insensitive() {
    assert_eq!(eval_on(&Expr::like(Expr::field("name"), "A%"), &row(1)), Some(true));
    assert_eq!(eval_on(&Expr::like(Expr::field("name"), "a_ice"), &row(1)), Some(true));
    assert_eq!(eval_on(&Expr::like(Expr::field("name"), "a%"), &row(2)), Some(false));
    assert_eq!(eval_on(&Expr::like(Expr::field("name"), "a%"), &row(4)), None);
}

#[test]
fn arithmetic_widens_before_comparing() {
    let expr = Expr::gt(
        Expr::arith(ArithOp::Add, Expr::field("age"), Expr::lit(Value::Double(0.5))),
        Expr::lit(Value::Double(25.0)),
    );

    assert_eq!(eval_on(&expr, &row(1)), Some(true));
    assert_eq!(eval_on(&expr, &row(5)), Some(false));
}

#[test]
fn relevance_nodes_need_an_evaluator() {
    let call = RelevanceCall::new(RelevanceKind::Match, FieldSpec::single("title"), "fox");
    let bound = bind(&Expr::relevance(call)).expect("bind");
    let props = props_at("2024-01-01T10:00:00Z");

    assert_eq!(
        eval_predicate(&bound, &row(1), &EvalEnv::new(&props)),
        Err(EvalError::RelevanceUnavailable {
            kind: RelevanceKind::Match
        })
    );
}

#[test]
fn non_boolean_results_are_not_predicates() {
    let schema = sample_schema();
    let relevance = RelevanceConfig::default();
    let binder = Binder::new(&schema, FunctionRegistry::builtin(), &relevance);
    let props = props_at("2024-01-01T10:00:00Z");
    let age = binder.bind(&Expr::field("age")).expect("bind");

    assert!(matches!(
        eval_predicate(&age, &row(1), &EvalEnv::new(&props)),
        Err(EvalError::NotBoolean(_))
    ));
}

#[test]
fn field_patterns_match_star_globs() {
    assert!(glob_matches("title", "ti*"));
    assert!(glob_matches("title", "*tle"));
    assert!(glob_matches("title", "t*t*e"));
    assert!(glob_matches("title", "*"));
    assert!(!glob_matches("title", "body*"));
    assert!(!glob_matches("tit", "tit*e"));

    let schema = sample_schema();
    let names: Vec<&str> = schema.matching("*e").map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["name", "age", "score", "active", "title"]);
}

proptest! {
    #[test]
    fn comparisons_agree_with_integer_ordering(age in any::<i32>(), bound in any::<i32>()) {
        let row = Row::new().with("age", NativeValue::Int(age));
        let cases = [
            (Expr::lt(Expr::field("age"), int(bound)), age < bound),
            (Expr::lte(Expr::field("age"), int(bound)), age <= bound),
            (Expr::gt(Expr::field("age"), int(bound)), age > bound),
            (Expr::gte(Expr::field("age"), int(bound)), age >= bound),
            (Expr::eq(Expr::field("age"), int(bound)), age == bound),
            (Expr::ne(Expr::field("age"), int(bound)), age != bound),
        ];

        for (expr, expected) in cases {
            prop_assert_eq!(eval_on(&expr, &row), Some(expected));
            prop_assert_eq!(eval_on(&Expr::not(expr), &row), Some(!expected));
        }
    }

    #[test]
    fn de_morgan_holds_under_three_valued_logic(
        a in prop::option::of(any::<bool>()),
        b in prop::option::of(any::<bool>()),
    ) {
        let empty = Row::new();
        let lhs = Expr::not(truth(a) & truth(b));
        let rhs = Expr::not(truth(a)) | Expr::not(truth(b));

        prop_assert_eq!(eval_on(&lhs, &empty), eval_on(&rhs, &empty));
    }
}
