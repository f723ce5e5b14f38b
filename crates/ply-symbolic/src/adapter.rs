//! Uniform "expression, function or constant" arguments.

use std::fmt;
use std::rc::Rc;

use crate::{Context, Dynamic, EvalOptions, Expression, Kwargs};

pub type Callable<V> = Rc<dyn Fn(Vec<V>, Kwargs<V>) -> Result<V, <V as Dynamic>::Error>>;

/// Anything a query operation accepts where it needs a value per call.
pub enum Source<V: Dynamic> {
    Expression(Expression<V>),
    Function(Callable<V>),
    Constant(V),
}

impl<V: Dynamic> Source<V> {
    #[must_use]
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(Vec<V>, Kwargs<V>) -> Result<V, V::Error> + 'static,
    {
        Self::Function(Rc::new(f))
    }

    #[must_use]
    pub fn constant(value: V) -> Self {
        Self::Constant(value)
    }
}

impl<V: Dynamic> Clone for Source<V> {
    fn clone(&self) -> Self {
        match self {
            Self::Expression(expr) => Self::Expression(expr.clone()),
            Self::Function(f) => Self::Function(Rc::clone(f)),
            Self::Constant(value) => Self::Constant(value.clone()),
        }
    }
}

impl<V: Dynamic> fmt::Debug for Source<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression(expr) => write!(f, "Expression({expr})"),
            Self::Function(_) => f.write_str("Function(..)"),
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
        }
    }
}

impl<V: Dynamic> From<Expression<V>> for Source<V> {
    fn from(value: Expression<V>) -> Self {
        Self::Expression(value)
    }
}

impl<V: Dynamic> From<&Expression<V>> for Source<V> {
    fn from(value: &Expression<V>) -> Self {
        Self::Expression(value.clone())
    }
}

/// Bind positional arguments to `0..n` and named arguments to their names.
#[must_use]
pub fn build_context<V>(args: Vec<V>, kwargs: Kwargs<V>) -> Context<V> {
    let mut ctx = Context::new();
    for (pos, arg) in args.into_iter().enumerate() {
        ctx.insert(pos, arg);
    }
    for (name, arg) in kwargs {
        ctx.insert(name, arg);
    }
    ctx
}

/// Adapt a source into a plain function.
///
/// Expressions are evaluated against [`build_context`] of the call's
/// arguments. Functions come back as the same `Rc`. A callable constant is
/// forwarded to; any other constant is returned whatever the arguments.
#[must_use]
pub fn to_callable<V: Dynamic + 'static>(source: Source<V>) -> Callable<V> {
    match source {
        Source::Expression(expr) => Rc::new(move |args: Vec<V>, kwargs: Kwargs<V>| {
            expr.eval(&build_context(args, kwargs), EvalOptions::default())
        }),
        Source::Function(f) => f,
        Source::Constant(value) if value.is_callable() => {
            Rc::new(move |args: Vec<V>, kwargs: Kwargs<V>| value.call(args, kwargs))
        }
        Source::Constant(value) => Rc::new(move |_: Vec<V>, _: Kwargs<V>| Ok(value.clone())),
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use proptest::prelude::*;

    use super::{Source, build_context, to_callable};
    use crate::testing::{Probe, Recorder, object};
    use crate::{Context, EvalOptions, Expression, Kwargs, SymbolKey};

    #[test]
    fn context_binds_positions_then_names() {
        let mut kwargs = Kwargs::new();
        kwargs.insert("z".to_owned(), Probe::Num(9.0));
        let ctx = build_context(vec![Probe::Num(1.0), Probe::Num(2.0)], kwargs);
        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.get(&SymbolKey::Position(1)).and_then(Probe::as_num), Some(2.0));
        assert_eq!(ctx.get(&SymbolKey::from("z")).and_then(Probe::as_num), Some(9.0));
    }

    #[test]
    fn expression_source_reads_first_argument() {
        let expr = Expression::<Probe>::symbol(0_usize).attr("x") + 1_i64;
        let f = to_callable(Source::from(expr));
        let out = f(vec![object([("x", Probe::Num(41.0))])], Kwargs::new()).expect("call");
        assert_eq!(out.as_num(), Some(42.0));
    }

    #[test]
    fn expression_source_sees_named_arguments() {
        let f = to_callable(Source::from(Expression::<Probe>::symbol("k") * 2_i64));
        let mut kwargs = Kwargs::new();
        kwargs.insert("k".to_owned(), Probe::Num(5.0));
        let out = f(Vec::new(), kwargs).expect("call");
        assert_eq!(out.as_num(), Some(10.0));
    }

    #[test]
    fn functions_pass_through_unchanged() {
        let source = Source::<Probe>::function(|args, _| Ok(args[0].clone()));
        let Source::Function(original) = source.clone() else {
            panic!("expected a function source");
        };
        let adapted = to_callable(source);
        assert!(Rc::ptr_eq(&original, &adapted));
    }

    #[test]
    fn callable_constants_are_forwarded() {
        let recorder = Rc::new(Recorder::returning(Probe::Num(3.0)));
        let f = to_callable(Source::Constant(Probe::Func(Rc::clone(&recorder))));
        let out = f(vec![Probe::Num(1.0)], Kwargs::new()).expect("call");
        assert_eq!(out.as_num(), Some(3.0));
        assert_eq!(recorder.calls().len(), 1);
    }

    #[test]
    fn native_constants_are_forwarded() {
        let f = to_callable(Source::Constant(Probe::Native("sqrt", f64::sqrt)));
        let out = f(vec![Probe::Num(9.0)], Kwargs::new()).expect("call");
        assert_eq!(out.as_num(), Some(3.0));
    }

    proptest! {
        #[test]
        fn constants_ignore_any_arguments(
            constant in -1.0e6f64..1.0e6,
            args in prop::collection::vec(-100.0f64..100.0, 0..6),
            names in prop::collection::btree_set("[a-z]{1,4}", 0..4),
        ) {
            let f = to_callable(Source::Constant(Probe::Num(constant)));
            let args = args.into_iter().map(Probe::Num).collect();
            let kwargs = names.into_iter().map(|name| (name, Probe::Num(0.0))).collect();
            let out = f(args, kwargs).expect("call");
            prop_assert_eq!(out.as_num(), Some(constant));
        }

        #[test]
        fn evaluation_leaves_context_and_expression_untouched(
            a in -1.0e3f64..1.0e3,
            b in -1.0e3f64..1.0e3,
        ) {
            let x = Expression::<Probe>::symbol(0_usize);
            let y = Expression::<Probe>::symbol("y");
            let expr = (&x + &y) * 3_i64 - &x;
            let ctx = Context::new().bind(0_usize, Probe::Num(a)).bind("y", Probe::Num(b));

            let ctx_before = format!("{ctx:?}");
            let rendered_before = expr.to_string();
            let first = expr.eval(&ctx, EvalOptions::default()).expect("eval");
            let second = expr.eval(&ctx, EvalOptions::default()).expect("eval");

            prop_assert_eq!(format!("{ctx:?}"), ctx_before);
            prop_assert_eq!(expr.to_string(), rendered_before);
            prop_assert_eq!(first.as_num(), second.as_num());
            prop_assert_eq!(first.as_num(), Some((a + b) * 3.0 - a));
        }
    }
}
