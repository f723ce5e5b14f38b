use pandas_ply::prelude::*;
use pandas_ply::symbolic::{Context, EvalOptions, SymbolicError, to_callable};
use pandas_ply::Source;

fn kwargs(entries: &[(&str, i64)]) -> Kwargs<Value> {
    entries
        .iter()
        .map(|(name, value)| ((*name).to_owned(), Value::from(*value)))
        .collect()
}

#[test]
fn pythagoras_over_named_symbols() {
    let expr = builtins::sqrt()
        .apply(vec![(sym("X").pow(2_i64) + sym("Y").pow(2_i64)).into()]);
    assert_eq!(
        expr.to_string(),
        "sqrt(getattr(getattr(Symbol(\"X\"), \"pow\")(2), \"add\")(getattr(Symbol(\"Y\"), \"pow\")(2)))"
    );

    let hypot = to_callable(Source::from(&expr));
    let out = hypot(Vec::new(), kwargs(&[("X", 3), ("Y", 4)])).expect("call");
    assert_eq!(out.as_scalar(), Some(&Scalar::Float64(5.0)));
}

#[test]
fn constants_ignore_their_arguments() {
    let constant = to_callable(Source::constant(Value::from("fixed")));
    let out = constant(vec![Value::from(1_i64)], kwargs(&[("a", 2)])).expect("call");
    assert_eq!(out.as_scalar(), Some(&Scalar::from("fixed")));
}

#[test]
fn unbound_symbols_are_reported_by_key() {
    let err = (x() + sym("missing"))
        .eval(
            &Context::new().bind(0_usize, Value::from(1_i64)),
            EvalOptions::default(),
        )
        .expect_err("unbound");
    assert!(
        matches!(err, PlyError::Symbolic(SymbolicError::UnboundSymbol(ref key)) if key.to_string() == "\"missing\""),
        "{err}"
    );
}

#[test]
fn deferred_calls_wait_for_evaluation() {
    let double = Function::new("double", |args, _kwargs| {
        let value = args.first().and_then(Value::as_scalar).cloned();
        match value {
            Some(Scalar::Int64(v)) => Ok(Value::from(v * 2)),
            _ => Err(PlyError::InvalidArgument {
                op: "double".to_owned(),
                reason: "expected an integer".to_owned(),
            }),
        }
    });
    let expr = sym_call(double, vec![(x() + 1_i64).into()], Kwargs::new());
    assert_eq!(expr.to_string(), "double(getattr(Symbol(0), \"add\")(1))");

    let out = expr
        .eval(
            &Context::new().bind(0_usize, Value::from(20_i64)),
            EvalOptions::logged(),
        )
        .expect("eval");
    assert_eq!(out.as_scalar(), Some(&Scalar::Int64(42)));
}
