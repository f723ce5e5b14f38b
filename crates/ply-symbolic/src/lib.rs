#![forbid(unsafe_code)]

//! Deferred symbolic expressions.
//!
//! An [`Expression`] records what would be done to a placeholder value
//! (reading an attribute, invoking it) without doing any of it. Every
//! operator applied to an expression decomposes into the same two
//! primitives: read the operator-named attribute (see [`ops`]), then call
//! it. Nothing runs until [`Expression::eval`] supplies a [`Context`] that
//! binds each [`SymbolKey`] to a concrete value.
//!
//! The engine knows nothing about the values it manipulates beyond the
//! [`Dynamic`] object protocol, so any host type can plug in.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod adapter;
mod expr;
pub mod ops;

pub use adapter::{Callable, Source, build_context, to_callable};
pub use expr::{Expression, Node, Operand, sym_call};

/// Named arguments, ordered by name.
pub type Kwargs<V> = BTreeMap<String, V>;

/// Identifier of a placeholder: a positional slot or a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymbolKey {
    Position(usize),
    Name(String),
}

impl From<usize> for SymbolKey {
    fn from(value: usize) -> Self {
        Self::Position(value)
    }
}

impl From<&str> for SymbolKey {
    fn from(value: &str) -> Self {
        Self::Name(value.to_owned())
    }
}

impl From<String> for SymbolKey {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position(pos) => write!(f, "{pos}"),
            Self::Name(name) => write!(f, "{name:?}"),
        }
    }
}

/// Symbol bindings for one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Context<V> {
    bindings: BTreeMap<SymbolKey, V>,
}

impl<V> Context<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bindings: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn bind(mut self, key: impl Into<SymbolKey>, value: V) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<SymbolKey>, value: V) {
        self.bindings.insert(key.into(), value);
    }

    #[must_use]
    pub fn get(&self, key: &SymbolKey) -> Option<&V> {
        self.bindings.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<V> Default for Context<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<SymbolKey>, V> FromIterator<(K, V)> for Context<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            bindings: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalOptions {
    /// Emit a `tracing` debug event for every node visited and its result.
    pub log: bool,
}

impl EvalOptions {
    #[must_use]
    pub fn logged() -> Self {
        Self { log: true }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SymbolicError {
    #[error("symbol {0} is not bound in the evaluation context")]
    UnboundSymbol(SymbolKey),
    #[error("{type_name} has no attribute {name:?}")]
    MissingAttribute { type_name: String, name: String },
    #[error("{type_name} is not callable")]
    NotCallable { type_name: String },
}

/// Object protocol a host value type offers to the engine.
///
/// `get_attr` and `call` are the only two operations expressions ever
/// perform; operators arrive as attribute reads of the names in [`ops`]
/// followed by a call.
pub trait Dynamic: Clone + fmt::Debug + Sized {
    type Error: From<SymbolicError>;

    fn get_attr(&self, name: &str) -> Result<Self, Self::Error>;

    fn call(&self, args: Vec<Self>, kwargs: Kwargs<Self>) -> Result<Self, Self::Error>;

    fn is_callable(&self) -> bool;

    /// Literal form used when an expression is rendered.
    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
pub(crate) mod testing;

#[cfg(test)]
mod tests {
    use super::{Context, EvalOptions, SymbolKey, SymbolicError};

    #[test]
    fn symbol_keys_render_like_literals() {
        assert_eq!(SymbolKey::from(0_usize).to_string(), "0");
        assert_eq!(SymbolKey::from("x").to_string(), "\"x\"");
    }

    #[test]
    fn symbol_keys_serialize_untagged() {
        let json = serde_json::to_string(&vec![SymbolKey::from(1_usize), SymbolKey::from("y")])
            .expect("serialize");
        assert_eq!(json, r#"[1,"y"]"#);
    }

    #[test]
    fn context_collects_from_pairs() {
        let ctx: Context<i64> = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.get(&SymbolKey::from("b")), Some(&2));
        assert!(Context::<i64>::default().is_empty());
    }

    #[test]
    fn eval_options_default_is_quiet() {
        assert!(!EvalOptions::default().log);
        assert!(EvalOptions::logged().log);
    }

    #[test]
    fn unbound_symbol_message_names_the_key() {
        let err = SymbolicError::UnboundSymbol(SymbolKey::from("some_symbol"));
        assert_eq!(
            err.to_string(),
            "symbol \"some_symbol\" is not bound in the evaluation context"
        );
    }

    mod logging {
        use std::fmt;
        use std::sync::{Arc, Mutex};

        use tracing::field::{Field, Visit};
        use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
        use tracing_subscriber::{Layer, Registry};

        use crate::testing::Probe;
        use crate::{Context, EvalOptions, Expression};

        #[derive(Default)]
        struct Captured {
            message: String,
            expression: String,
        }

        impl Visit for Captured {
            fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
                match field.name() {
                    "message" => self.message = format!("{value:?}"),
                    "expression" => self.expression = format!("{value:?}"),
                    _ => {}
                }
            }
        }

        #[derive(Clone, Default)]
        struct Capture(Arc<Mutex<Vec<(String, String)>>>);

        impl<S: tracing::Subscriber> Layer<S> for Capture {
            fn on_event(&self, event: &tracing::Event<'_>, _ctx: LayerContext<'_, S>) {
                let mut captured = Captured::default();
                event.record(&mut captured);
                self.0
                    .lock()
                    .expect("capture lock")
                    .push((captured.message, captured.expression));
            }
        }

        fn run(options: EvalOptions) -> Vec<(String, String)> {
            let capture = Capture::default();
            let subscriber = Registry::default().with(capture.clone());
            let expr = Expression::<Probe>::symbol(0_usize) + 1_i64;
            let ctx = Context::new().bind(0_usize, Probe::Num(2.0));
            let out = tracing::subscriber::with_default(subscriber, || {
                expr.eval(&ctx, options).expect("eval")
            });
            assert_eq!(out.as_num(), Some(3.0));
            capture.0.lock().expect("capture lock").clone()
        }

        #[test]
        fn log_option_traces_every_node() {
            let events = run(EvalOptions::logged());
            let messages: Vec<&str> = events.iter().map(|(m, _)| m.as_str()).collect();
            // call, getattr, symbol, then their results innermost first
            assert_eq!(
                messages,
                ["eval", "eval", "eval", "resolved", "resolved", "resolved"]
            );
            assert_eq!(events[2].1, "Symbol(0)");
            assert_eq!(events[5].1, "getattr(Symbol(0), \"add\")(1)");
        }

        #[test]
        fn evaluation_is_silent_by_default() {
            assert!(run(EvalOptions::default()).is_empty());
        }
    }
}
