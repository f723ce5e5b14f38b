//! Native functions ready to be used as expression literals.

use ply_columnar::Column;
use ply_frame::Series;
use ply_symbolic::Kwargs;
use ply_types::{DType, NullKind, Scalar};

use crate::PlyError;
use crate::value::{Function, Value};

fn single_argument(name: &str, mut args: Vec<Value>, kwargs: &Kwargs<Value>) -> Result<Value, PlyError> {
    if !kwargs.is_empty() {
        return Err(PlyError::invalid(name, "keyword arguments are not accepted"));
    }
    if args.len() != 1 {
        return Err(PlyError::invalid(
            name,
            format!("expected 1 argument, got {}", args.len()),
        ));
    }
    args.pop()
        .ok_or_else(|| PlyError::invalid(name, "expected 1 argument"))
}

fn float_map(value: &Scalar, f: fn(f64) -> f64) -> Result<Scalar, PlyError> {
    if value.is_missing() {
        return Ok(Scalar::Null(NullKind::NaN));
    }
    Ok(Scalar::Float64(f(value.to_f64()?)))
}

/// Elementwise `f` over a scalar or series, producing floats.
fn float_function(name: &'static str, f: fn(f64) -> f64) -> Function {
    Function::new(name, move |args, kwargs| {
        match single_argument(name, args, &kwargs)? {
            Value::Scalar(value) => Ok(Value::Scalar(float_map(&value, f)?)),
            Value::Series(series) => {
                let values = series
                    .values()
                    .iter()
                    .map(|value| float_map(value, f))
                    .collect::<Result<Vec<_>, _>>()?;
                let column = Column::new(DType::Float64, values)?;
                Ok(Value::Series(Series::new(
                    series.name(),
                    series.index().clone(),
                    column,
                )?))
            }
            other => Err(PlyError::invalid(
                name,
                format!("unsupported argument {}", other.kind()),
            )),
        }
    })
}

/// Square root; integers are widened to floats and missing stays NaN.
#[must_use]
pub fn sqrt() -> Function {
    float_function("sqrt", f64::sqrt)
}

#[must_use]
pub fn exp() -> Function {
    float_function("exp", f64::exp)
}

/// Natural logarithm.
#[must_use]
pub fn log() -> Function {
    float_function("log", f64::ln)
}

/// Absolute value, keeping integer columns integral.
#[must_use]
pub fn abs() -> Function {
    Function::new("abs", |args, kwargs| {
        match single_argument("abs", args, &kwargs)? {
            Value::Scalar(value) => Ok(Value::Scalar(
                Column::broadcast(&value, 1)?
                    .abs()?
                    .value(0)
                    .cloned()
                    .unwrap_or(Scalar::Null(NullKind::Null)),
            )),
            Value::Series(series) => Ok(Value::Series(series.abs()?)),
            other => Err(PlyError::invalid(
                "abs",
                format!("unsupported argument {}", other.kind()),
            )),
        }
    })
}
