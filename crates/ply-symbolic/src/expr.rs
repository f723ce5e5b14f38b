use std::fmt;
use std::rc::Rc;

use crate::{Context, Dynamic, EvalOptions, Kwargs, SymbolKey, SymbolicError};

/// One recorded step.
#[derive(Debug)]
pub enum Node<V> {
    Symbol(SymbolKey),
    GetAttr {
        target: Operand<V>,
        name: String,
    },
    Call {
        target: Operand<V>,
        args: Vec<Operand<V>>,
        kwargs: Kwargs<Operand<V>>,
    },
}

/// An immutable, cheaply clonable expression tree.
///
/// Building an expression never evaluates anything; every builder returns
/// a new tree that shares its children with the receiver.
pub struct Expression<V> {
    node: Rc<Node<V>>,
}

impl<V> Clone for Expression<V> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Expression<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Expression").field(&self.node).finish()
    }
}

/// A slot that is either still symbolic or already a concrete value.
#[derive(Debug, Clone)]
pub enum Operand<V> {
    Symbolic(Expression<V>),
    Literal(V),
}

impl<V> From<Expression<V>> for Operand<V> {
    fn from(value: Expression<V>) -> Self {
        Self::Symbolic(value)
    }
}

impl<V> From<&Expression<V>> for Operand<V> {
    fn from(value: &Expression<V>) -> Self {
        Self::Symbolic(value.clone())
    }
}

impl<V: From<i64>> From<i64> for Operand<V> {
    fn from(value: i64) -> Self {
        Self::Literal(V::from(value))
    }
}

impl<V: From<i64>> From<i32> for Operand<V> {
    fn from(value: i32) -> Self {
        Self::Literal(V::from(i64::from(value)))
    }
}

impl<V: From<f64>> From<f64> for Operand<V> {
    fn from(value: f64) -> Self {
        Self::Literal(V::from(value))
    }
}

impl<V: From<bool>> From<bool> for Operand<V> {
    fn from(value: bool) -> Self {
        Self::Literal(V::from(value))
    }
}

impl<'a, V: From<&'a str>> From<&'a str> for Operand<V> {
    fn from(value: &'a str) -> Self {
        Self::Literal(V::from(value))
    }
}

impl<V: From<String>> From<String> for Operand<V> {
    fn from(value: String) -> Self {
        Self::Literal(V::from(value))
    }
}

impl<V: Dynamic> Operand<V> {
    /// Evaluate a symbolic operand; a literal is passed through untouched.
    pub fn resolve(&self, ctx: &Context<V>, options: EvalOptions) -> Result<V, V::Error> {
        match self {
            Self::Symbolic(expr) => expr.eval(ctx, options),
            Self::Literal(value) => Ok(value.clone()),
        }
    }
}

impl<V> Expression<V> {
    fn from_node(node: Node<V>) -> Self {
        Self {
            node: Rc::new(node),
        }
    }

    #[must_use]
    pub fn symbol(key: impl Into<SymbolKey>) -> Self {
        Self::from_node(Node::Symbol(key.into()))
    }

    #[must_use]
    pub fn get_attr(target: impl Into<Operand<V>>, name: impl Into<String>) -> Self {
        Self::from_node(Node::GetAttr {
            target: target.into(),
            name: name.into(),
        })
    }

    #[must_use]
    pub fn invoke(
        target: impl Into<Operand<V>>,
        args: Vec<Operand<V>>,
        kwargs: Kwargs<Operand<V>>,
    ) -> Self {
        Self::from_node(Node::Call {
            target: target.into(),
            args,
            kwargs,
        })
    }

    #[must_use]
    pub fn node(&self) -> &Node<V> {
        &self.node
    }

    /// `getattr(self, name)`.
    #[must_use]
    pub fn attr(&self, name: impl Into<String>) -> Self {
        Self::get_attr(self, name)
    }

    #[must_use]
    pub fn call(&self, args: Vec<Operand<V>>, kwargs: Kwargs<Operand<V>>) -> Self {
        Self::invoke(self, args, kwargs)
    }

    /// Positional-only invocation.
    #[must_use]
    pub fn call_with<I>(&self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Operand<V>>,
    {
        self.call(args.into_iter().map(Into::into).collect(), Kwargs::new())
    }

    /// Read `name` and call it positionally.
    #[must_use]
    pub fn method(&self, name: &str, args: Vec<Operand<V>>) -> Self {
        self.attr(name).call(args, Kwargs::new())
    }
}

/// Defer a call to `func`, which may itself be a literal callable.
#[must_use]
pub fn sym_call<V>(
    func: impl Into<Operand<V>>,
    args: Vec<Operand<V>>,
    kwargs: Kwargs<Operand<V>>,
) -> Expression<V> {
    Expression::invoke(func, args, kwargs)
}

impl<V: Dynamic> Expression<V> {
    /// Resolve the tree against `ctx`.
    ///
    /// Targets resolve before positional arguments, which resolve in order
    /// before named arguments. Host errors surface unchanged.
    pub fn eval(&self, ctx: &Context<V>, options: EvalOptions) -> Result<V, V::Error> {
        if options.log {
            tracing::debug!(expression = %self, "eval");
        }

        let value = match self.node.as_ref() {
            Node::Symbol(key) => ctx
                .get(key)
                .cloned()
                .ok_or_else(|| SymbolicError::UnboundSymbol(key.clone()))?,
            Node::GetAttr { target, name } => target.resolve(ctx, options)?.get_attr(name)?,
            Node::Call {
                target,
                args,
                kwargs,
            } => {
                let callee = target.resolve(ctx, options)?;
                let args = args
                    .iter()
                    .map(|arg| arg.resolve(ctx, options))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut resolved = Kwargs::new();
                for (name, arg) in kwargs {
                    resolved.insert(name.clone(), arg.resolve(ctx, options)?);
                }
                callee.call(args, resolved)?
            }
        };

        if options.log {
            tracing::debug!(expression = %self, result = ?value, "resolved");
        }
        Ok(value)
    }
}

struct Rendered<'a, V>(&'a V);

impl<V: Dynamic> fmt::Display for Rendered<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.render(f)
    }
}

impl<V: Dynamic> fmt::Display for Operand<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbolic(expr) => fmt::Display::fmt(expr, f),
            Self::Literal(value) => write!(f, "{}", Rendered(value)),
        }
    }
}

impl<V: Dynamic> fmt::Display for Expression<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node.as_ref() {
            Node::Symbol(key) => write!(f, "Symbol({key})"),
            Node::GetAttr { target, name } => write!(f, "getattr({target}, {name:?})"),
            Node::Call {
                target,
                args,
                kwargs,
            } => {
                write!(f, "{target}(")?;
                let mut sep = "";
                for arg in args {
                    write!(f, "{sep}{arg}")?;
                    sep = ", ";
                }
                for (name, arg) in kwargs {
                    write!(f, "{sep}{name}={arg}")?;
                    sep = ", ";
                }
                f.write_str(")")
            }
        }
    }
}
