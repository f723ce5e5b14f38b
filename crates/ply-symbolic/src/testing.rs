//! Minimal host object used by the engine's own tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::{Dynamic, Kwargs, SymbolicError, ops};

#[derive(Debug, Clone)]
pub(crate) enum Probe {
    Num(f64),
    Text(String),
    Flag(bool),
    Object(Rc<BTreeMap<String, Probe>>),
    Func(Rc<Recorder>),
    Native(&'static str, fn(f64) -> f64),
    Method(Box<Probe>, &'static str),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub(crate) enum ProbeError {
    #[error(transparent)]
    Symbolic(#[from] SymbolicError),
    #[error("bad operands for {0}")]
    Operands(&'static str),
}

/// Callable that remembers every invocation.
#[derive(Debug)]
pub(crate) struct Recorder {
    output: Probe,
    calls: RefCell<Vec<(Vec<Probe>, Kwargs<Probe>)>>,
}

impl Recorder {
    pub(crate) fn returning(output: Probe) -> Self {
        Self {
            output,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(Vec<Probe>, Kwargs<Probe>)> {
        self.calls.borrow().clone()
    }
}

pub(crate) fn object<const N: usize>(fields: [(&str, Probe); N]) -> Probe {
    Probe::Object(Rc::new(
        fields
            .into_iter()
            .map(|(name, value)| (name.to_owned(), value))
            .collect(),
    ))
}

impl Probe {
    pub(crate) fn as_num(&self) -> Option<f64> {
        match self {
            Self::Num(v) => Some(*v),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Num(_) => "num",
            Self::Text(_) => "text",
            Self::Flag(_) => "flag",
            Self::Object(_) => "object",
            Self::Func(_) => "func",
            Self::Native(..) => "native",
            Self::Method(..) => "method",
        }
    }
}

impl From<i64> for Probe {
    fn from(value: i64) -> Self {
        Self::Num(value as f64)
    }
}

impl From<f64> for Probe {
    fn from(value: f64) -> Self {
        Self::Num(value)
    }
}

impl From<bool> for Probe {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<&str> for Probe {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Probe {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

const NUMERIC_OPS: [&str; 13] = [
    ops::ADD,
    ops::RADD,
    ops::SUB,
    ops::RSUB,
    ops::MUL,
    ops::RMUL,
    ops::DIV,
    ops::RDIV,
    ops::POW,
    ops::RPOW,
    ops::NEG,
    ops::ABS,
    ops::GT,
];

fn apply(name: &'static str, a: f64, b: Option<f64>) -> Result<f64, ProbeError> {
    let out = match (name, b) {
        (ops::ADD | ops::RADD, Some(b)) => a + b,
        (ops::SUB, Some(b)) => a - b,
        (ops::RSUB, Some(b)) => b - a,
        (ops::MUL | ops::RMUL, Some(b)) => a * b,
        (ops::DIV, Some(b)) => a / b,
        (ops::RDIV, Some(b)) => b / a,
        (ops::POW, Some(b)) => a.powf(b),
        (ops::RPOW, Some(b)) => b.powf(a),
        (ops::GT, Some(b)) => f64::from(u8::from(a > b)),
        (ops::NEG, None) => -a,
        (ops::ABS, None) => a.abs(),
        _ => return Err(ProbeError::Operands(name)),
    };
    Ok(out)
}

impl Dynamic for Probe {
    type Error = ProbeError;

    fn get_attr(&self, name: &str) -> Result<Self, Self::Error> {
        let found = match self {
            Self::Object(fields) => fields.get(name).cloned(),
            Self::Num(_) => NUMERIC_OPS
                .iter()
                .find(|op| **op == name)
                .map(|op| Self::Method(Box::new(self.clone()), *op)),
            _ => None,
        };
        found.ok_or_else(|| {
            SymbolicError::MissingAttribute {
                type_name: self.type_name().to_owned(),
                name: name.to_owned(),
            }
            .into()
        })
    }

    fn call(&self, args: Vec<Self>, kwargs: Kwargs<Self>) -> Result<Self, Self::Error> {
        match self {
            Self::Func(recorder) => {
                recorder.calls.borrow_mut().push((args, kwargs));
                Ok(recorder.output.clone())
            }
            Self::Native(name, f) => match args.first() {
                Some(Self::Num(v)) => Ok(Self::Num(f(*v))),
                _ => Err(ProbeError::Operands(*name)),
            },
            Self::Method(receiver, name) => {
                let name = *name;
                let a = receiver.as_num().ok_or(ProbeError::Operands(name))?;
                let b = match args.first() {
                    Some(arg) => Some(arg.as_num().ok_or(ProbeError::Operands(name))?),
                    None => None,
                };
                apply(name, a, b).map(Self::Num)
            }
            other => Err(SymbolicError::NotCallable {
                type_name: other.type_name().to_owned(),
            }
            .into()),
        }
    }

    fn is_callable(&self) -> bool {
        matches!(self, Self::Func(_) | Self::Native(..) | Self::Method(..))
    }

    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Flag(v) => write!(f, "{v}"),
            Self::Native(name, _) => f.write_str(name),
            other => write!(f, "<{}>", other.type_name()),
        }
    }
}
