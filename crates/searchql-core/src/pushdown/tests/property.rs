use crate::{
    backend::{MemoryBackend, Row},
    config::{PushdownConfig, RelevanceConfig},
    expr::{Binder, CompareOp, EvalEnv, Expr, eval_predicate},
    function::FunctionRegistry,
    pushdown::PushdownEngine,
    relevance::parse_relevance_call,
    test_support::{props_at, sample_schema},
    value::{ArithOp, NativeValue, Value},
};
use proptest::prelude::*;

// Absent, explicit null, or a value.
fn slot(value: impl Strategy<Value = NativeValue>) -> impl Strategy<Value = Option<NativeValue>> {
    prop_oneof![
        1 => Just(None),
        1 => Just(Some(NativeValue::Null)),
        3 => value.prop_map(Some),
    ]
}

fn arb_name() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("alice"), Just("Bob"), Just("a_b"), Just("")]
}

fn arb_title() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("Quick brown fox"),
        Just("Brown bear"),
        Just("lazy dog days"),
        Just("fox and hound"),
    ]
}

// Instants on and around the boundaries of the relative leaves below.
fn arb_stamp() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("2023-12-31 23:59:59"),
        Just("2024-01-01 00:00:00"),
        Just("2024-01-01 08:00:00"),
        Just("2024-01-01 09:00:00"),
        Just("2024-01-01 09:30:00"),
    ]
}

fn arb_row() -> impl Strategy<Value = Row> {
    (
        slot((0i32..50).prop_map(NativeValue::Int)),
        slot(arb_name().prop_map(|name| NativeValue::string(name))),
        slot(any::<bool>().prop_map(NativeValue::Bool)),
        slot(prop_oneof![Just(0.0), Just(1.5), Just(4.25)].prop_map(NativeValue::Double)),
        slot(prop_oneof![Just("low"), Just("high")].prop_map(|b| NativeValue::string(b))),
        slot(arb_title().prop_map(|title| NativeValue::string(title))),
        slot(arb_stamp().prop_map(|stamp| NativeValue::string(stamp))),
    )
        .prop_map(|(age, name, active, score, bucket, title, ts)| {
            let slots = [
                ("age", age),
                ("name", name),
                ("active", active),
                ("score", score),
                ("score_bucket", bucket),
                ("title", title),
                ("ts", ts),
            ];
            slots
                .into_iter()
                .fold(Row::new(), |row, (field, value)| match value {
                    Some(value) => row.with(field, value),
                    None => row,
                })
        })
}

fn arb_op() -> impl Strategy<Value = CompareOp> {
    prop_oneof![
        Just(CompareOp::Eq),
        Just(CompareOp::Ne),
        Just(CompareOp::Lt),
        Just(CompareOp::Lte),
        Just(CompareOp::Gt),
        Just(CompareOp::Gte),
    ]
}

fn arb_int() -> impl Strategy<Value = Expr> {
    prop_oneof![
        4 => (0i32..50).prop_map(|v| Expr::lit(Value::Integer(v))),
        1 => Just(Expr::lit(Value::Null)),
    ]
}

fn arb_relevance() -> impl Strategy<Value = Expr> {
    prop_oneof![
        Just("match(title, 'fox')"),
        Just("match(title, 'brown fox', operator='AND')"),
        Just("match_phrase(title, 'brown fox')"),
        Just("multi_match([title], 'lazy bear')"),
        Just("query_string([title], 'fox AND NOT hound')"),
        Just("simple_query_string([title], '-fox')"),
    ]
    .prop_map(|text| Expr::relevance(parse_relevance_call(text).expect("relevance call")))
}

fn arb_relative() -> impl Strategy<Value = Expr> {
    (
        prop_oneof![Just("latest"), Just("earliest")],
        prop_oneof![Just("-1h"), Just("-2h"), Just("@d")],
    )
        .prop_map(|(name, relative)| {
            Expr::call(name, vec![Expr::lit(Value::string(relative)), Expr::field("ts")])
        })
}

fn arb_leaf() -> impl Strategy<Value = Expr> {
    prop_oneof![
        (arb_op(), arb_int()).prop_map(|(op, v)| Expr::compare(op, Expr::field("age"), v)),
        (arb_op(), arb_int()).prop_map(|(op, v)| Expr::compare(op, v, Expr::field("age"))),
        (arb_op(), prop_oneof![Just(0.0), Just(1.5), Just(3.0)]).prop_map(|(op, v)| {
            Expr::compare(op, Expr::field("score"), Expr::lit(Value::Double(v)))
        }),
        arb_name().prop_map(|v| Expr::eq(Expr::field("name"), Expr::lit(Value::string(v)))),
        "[ab%_]{0,3}".prop_map(|pattern| Expr::like(Expr::field("name"), pattern)),
        prop::collection::vec(arb_int(), 1..4)
            .prop_map(|list| Expr::in_list(Expr::field("age"), list)),
        prop::collection::vec(arb_int(), 1..4)
            .prop_map(|list| Expr::not_in(Expr::field("age"), list)),
        Just(Expr::is_null(Expr::field("name"))),
        Just(Expr::is_not_null(Expr::field("score"))),
        Just(Expr::field("active")),
        (0i32..50).prop_map(|v| {
            let next = Expr::arith(ArithOp::Add, Expr::field("age"), Expr::lit(Value::Integer(1)));
            Expr::gt(next, Expr::lit(Value::Integer(v)))
        }),
        Just(Expr::eq(
            Expr::field("score_bucket"),
            Expr::lit(Value::string("high"))
        )),
        prop_oneof![Just(Some(true)), Just(Some(false)), Just(None)]
            .prop_map(|v| Expr::lit(v.map_or(Value::Null, Value::Boolean))),
        arb_relevance(),
        arb_relative(),
    ]
}

fn arb_predicate() -> impl Strategy<Value = Expr> {
    arb_leaf().prop_recursive(3, 24, 3, |inner| {
        prop_oneof![
            inner.clone().prop_map(Expr::not),
            prop::collection::vec(inner.clone(), 1..4).prop_map(Expr::And),
            prop::collection::vec(inner, 1..4).prop_map(Expr::Or),
        ]
    })
}

// A row is kept by native ∧ residual exactly when local evaluation of the
// whole predicate is TRUE.
fn split_agrees(
    predicate: &Expr,
    rows: &[Row],
    script_pushdown: bool,
) -> Result<(), TestCaseError> {
    let schema = sample_schema();
    let relevance = RelevanceConfig::default();
    let bound = Binder::new(&schema, FunctionRegistry::builtin(), &relevance)
        .bind_predicate(predicate)
        .expect("generated predicates are well typed");
    let props = props_at("2024-01-01T10:00:00Z");
    let config = PushdownConfig {
        script_pushdown,
        aggregation_bucket_limit: None,
    };
    let plan = PushdownEngine::new(&schema, &config, &props).split(bound.clone());
    let backend = MemoryBackend::new(schema.clone(), rows.to_vec());
    let env = EvalEnv::new(&props).with_text(Some(&backend));

    for row in rows {
        let local = eval_predicate(&bound, row, &env).expect("local eval") == Some(true);
        let native = match &plan.native {
            Some(query) => backend.query_matches(query, row).expect("native match"),
            None => true,
        };
        let residual = match &plan.residual {
            Some(residual) => {
                eval_predicate(residual, row, &env).expect("residual eval") == Some(true)
            }
            None => true,
        };
        prop_assert_eq!(local, native && residual, "row {:?} under {:?}", row, plan);
    }

    Ok(())
}

proptest! {
    #[test]
    fn split_is_exact(
        predicate in arb_predicate(),
        rows in prop::collection::vec(arb_row(), 1..8),
    ) {
        split_agrees(&predicate, &rows, false)?;
    }

    #[test]
    fn split_with_scripts_is_exact(
        predicate in arb_predicate(),
        rows in prop::collection::vec(arb_row(), 1..8),
    ) {
        split_agrees(&predicate, &rows, true)?;
    }
}
