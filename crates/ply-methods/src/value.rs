use std::fmt;
use std::rc::Rc;

use ply_columnar::{ArithmeticOp, Column, ComparisonOp, LogicalOp, compare_scalars};
use ply_frame::{DataFrame, FrameError, Series};
use ply_groupby::{DataFrameGroupBy, SeriesGroupBy};
use ply_index::{Index, IndexLabel};
use ply_symbolic::{Dynamic, Kwargs, Operand, SymbolicError, ops, sym_call};
use ply_types::{DType, NullKind, Scalar};

use crate::{Expr, PlyError};

const LEN: &str = "len";
const SIZE: &str = "size";

const OPERATORS: &[&str] = &[
    ops::ADD,
    ops::RADD,
    ops::SUB,
    ops::RSUB,
    ops::MUL,
    ops::RMUL,
    ops::DIV,
    ops::RDIV,
    ops::REM,
    ops::RREM,
    ops::POW,
    ops::RPOW,
    ops::GT,
    ops::GE,
    ops::LT,
    ops::LE,
    ops::EQ,
    ops::NE,
    ops::AND,
    ops::RAND,
    ops::OR,
    ops::ROR,
    ops::NEG,
    ops::INVERT,
    ops::ABS,
];

const REDUCTIONS: &[&str] = &["count", "sum", "mean", "min", "max"];

type NativeFn = dyn Fn(Vec<Value>, Kwargs<Value>) -> Result<Value, PlyError>;

/// A named native function usable as a literal inside expressions.
#[derive(Clone)]
pub struct Function {
    name: String,
    body: Rc<NativeFn>,
}

impl Function {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(Vec<Value>, Kwargs<Value>) -> Result<Value, PlyError> + 'static,
    {
        Self {
            name: name.into(),
            body: Rc::new(body),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invoke(&self, args: Vec<Value>, kwargs: Kwargs<Value>) -> Result<Value, PlyError> {
        (self.body)(args, kwargs)
    }

    /// Defer a call of this function on (possibly symbolic) arguments.
    #[must_use]
    pub fn apply(&self, args: Vec<Operand<Value>>) -> Expr {
        sym_call(Value::Function(self.clone()), args, Kwargs::new())
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Function").field(&self.name).finish()
    }
}

/// An operator or reduction bound to the value it was read from.
#[derive(Debug, Clone)]
pub struct Method {
    receiver: Box<Value>,
    name: String,
}

impl Method {
    #[must_use]
    pub fn receiver(&self) -> &Value {
        &self.receiver
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Everything an expression can produce or consume.
#[derive(Debug, Clone)]
pub enum Value {
    Scalar(Scalar),
    Series(Series),
    Frame(DataFrame),
    GroupBy(DataFrameGroupBy),
    SeriesGroupBy(SeriesGroupBy),
    List(Vec<Value>),
    Function(Function),
    Method(Method),
}

impl Value {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "Scalar",
            Self::Series(_) => "Series",
            Self::Frame(_) => "DataFrame",
            Self::GroupBy(_) => "DataFrameGroupBy",
            Self::SeriesGroupBy(_) => "SeriesGroupBy",
            Self::List(_) => "List",
            Self::Function(_) => "Function",
            Self::Method(_) => "Method",
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Scalar(value) => format!("Scalar {value}"),
            Self::Series(series) => format!("Series of {:?}", series.column().dtype()),
            Self::List(items) => format!("List of {} items", items.len()),
            other => other.kind().to_owned(),
        }
    }

    #[must_use]
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_series(&self) -> Option<&Series> {
        match self {
            Self::Series(series) => Some(series),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_frame(&self) -> Option<&DataFrame> {
        match self {
            Self::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    fn has_method(&self, name: &str) -> bool {
        let is_operator = OPERATORS.iter().any(|op| *op == name);
        let is_reduction = REDUCTIONS.iter().any(|op| *op == name);
        match self {
            Self::Scalar(_) => is_operator,
            Self::Series(_) => is_operator || is_reduction || matches!(name, ops::GETITEM | LEN),
            Self::Frame(_) | Self::List(_) => matches!(name, ops::GETITEM | LEN),
            Self::GroupBy(_) => matches!(name, ops::GETITEM | LEN | SIZE),
            Self::SeriesGroupBy(_) => is_reduction || matches!(name, LEN | SIZE),
            Self::Function(_) | Self::Method(_) => false,
        }
    }

    /// Boolean row mask over `index`; series are aligned by label and
    /// missing entries read as `false`.
    pub(crate) fn to_mask(&self, index: &Index) -> Result<Vec<bool>, PlyError> {
        match self {
            Self::Series(series) => series_mask(series, index),
            Self::Frame(frame) if frame.num_columns() == 1 => {
                let name = frame.column_names().next().unwrap_or_default();
                series_mask(&frame.series(name)?, index)
            }
            Self::List(items) => {
                if items.len() != index.len() {
                    return Err(PlyError::invalid(
                        "mask",
                        format!("expected {} entries, got {}", index.len(), items.len()),
                    ));
                }
                items
                    .iter()
                    .map(|item| match item {
                        Self::Scalar(value @ (Scalar::Bool(_) | Scalar::Null(_))) => {
                            Ok(value.to_mask_bit()?)
                        }
                        other => Err(PlyError::NonBooleanMask {
                            found: other.describe(),
                        }),
                    })
                    .collect()
            }
            other => Err(PlyError::NonBooleanMask {
                found: other.describe(),
            }),
        }
    }

    /// Column over `index` holding this value; scalars broadcast.
    pub(crate) fn into_column(self, target: &str, index: &Index) -> Result<Column, PlyError> {
        match self {
            Self::Scalar(value) => Ok(Column::broadcast(&value, index.len())?),
            Self::Series(series) => Ok(series.align_to(index)?.into_column()),
            Self::Frame(frame) if frame.num_columns() == 1 => {
                let name = frame.column_names().next().unwrap_or_default().to_owned();
                Ok(frame.series(&name)?.align_to(index)?.into_column())
            }
            Self::List(items) => {
                let values = scalars(items, target)?;
                if values.len() != index.len() {
                    return Err(FrameError::LengthMismatch {
                        index_len: index.len(),
                        column_len: values.len(),
                    }
                    .into());
                }
                Ok(Column::from_values(values)?)
            }
            other => Err(PlyError::Unassignable {
                target: target.to_owned(),
                found: other.describe(),
            }),
        }
    }

    /// Row labels taken positionally from this value; a series lends its name.
    pub(crate) fn into_index(self) -> Result<Index, PlyError> {
        match self {
            Self::Series(series) => {
                let index = Index::from_scalars(series.values())?;
                Ok(if series.name().is_empty() {
                    index
                } else {
                    index.with_name(series.name())
                })
            }
            Self::List(items) => Ok(Index::from_scalars(&scalars(items, crate::INDEX)?)?),
            other => Err(PlyError::Unassignable {
                target: crate::INDEX.to_owned(),
                found: other.describe(),
            }),
        }
    }
}

fn scalars(items: Vec<Value>, target: &str) -> Result<Vec<Scalar>, PlyError> {
    items
        .into_iter()
        .map(|item| match item {
            Value::Scalar(value) => Ok(value),
            other => Err(PlyError::Unassignable {
                target: target.to_owned(),
                found: other.describe(),
            }),
        })
        .collect()
}

fn series_mask(series: &Series, index: &Index) -> Result<Vec<bool>, PlyError> {
    if !matches!(series.column().dtype(), DType::Bool | DType::Null) {
        return Err(PlyError::NonBooleanMask {
            found: format!("Series of {:?}", series.column().dtype()),
        });
    }
    Ok(series.align_to(index)?.column().mask_bits()?)
}

fn arithmetic_op(name: &str) -> Option<(ArithmeticOp, bool)> {
    Some(match name {
        ops::ADD => (ArithmeticOp::Add, false),
        ops::RADD => (ArithmeticOp::Add, true),
        ops::SUB => (ArithmeticOp::Sub, false),
        ops::RSUB => (ArithmeticOp::Sub, true),
        ops::MUL => (ArithmeticOp::Mul, false),
        ops::RMUL => (ArithmeticOp::Mul, true),
        ops::DIV => (ArithmeticOp::Div, false),
        ops::RDIV => (ArithmeticOp::Div, true),
        ops::REM => (ArithmeticOp::Rem, false),
        ops::RREM => (ArithmeticOp::Rem, true),
        ops::POW => (ArithmeticOp::Pow, false),
        ops::RPOW => (ArithmeticOp::Pow, true),
        _ => return None,
    })
}

fn comparison_op(name: &str) -> Option<ComparisonOp> {
    Some(match name {
        ops::GT => ComparisonOp::Gt,
        ops::GE => ComparisonOp::Ge,
        ops::LT => ComparisonOp::Lt,
        ops::LE => ComparisonOp::Le,
        ops::EQ => ComparisonOp::Eq,
        ops::NE => ComparisonOp::Ne,
        _ => return None,
    })
}

fn logical_op(name: &str) -> Option<(LogicalOp, bool)> {
    Some(match name {
        ops::AND => (LogicalOp::And, false),
        ops::RAND => (LogicalOp::And, true),
        ops::OR => (LogicalOp::Or, false),
        ops::ROR => (LogicalOp::Or, true),
        _ => return None,
    })
}

fn operand_error(op: &str, left: &Value, right: &Value) -> PlyError {
    PlyError::invalid(
        op,
        format!("unsupported operands {} and {}", left.kind(), right.kind()),
    )
}

/// Single-row kernel run, so scalars follow the same dtype rules as columns.
fn first(column: Column) -> Scalar {
    column
        .value(0)
        .cloned()
        .unwrap_or(Scalar::Null(NullKind::Null))
}

fn broadcast_like(series: &Series, value: &Scalar) -> Result<Series, PlyError> {
    Ok(Series::new(
        series.name(),
        series.index().clone(),
        Column::broadcast(value, series.len())?,
    )?)
}

fn arithmetic(
    name: &str,
    left: &Value,
    right: &Value,
    op: ArithmeticOp,
    reflected: bool,
) -> Result<Value, PlyError> {
    Ok(match (left, right) {
        (Value::Series(a), Value::Series(b)) => Value::Series(if reflected {
            b.binary(a, op)?
        } else {
            a.binary(b, op)?
        }),
        (Value::Series(series), Value::Scalar(value)) => {
            Value::Series(series.binary_scalar(value, op, reflected)?)
        }
        (Value::Scalar(value), Value::Series(series)) => {
            Value::Series(series.binary_scalar(value, op, !reflected)?)
        }
        (Value::Scalar(a), Value::Scalar(b)) => {
            Value::Scalar(first(Column::broadcast(a, 1)?.binary_numeric_scalar(b, op, reflected)?))
        }
        (left, right) => return Err(operand_error(name, left, right)),
    })
}

fn comparison(name: &str, left: &Value, right: &Value, op: ComparisonOp) -> Result<Value, PlyError> {
    Ok(match (left, right) {
        (Value::Series(a), Value::Series(b)) => Value::Series(a.compare(b, op)?),
        (Value::Series(series), Value::Scalar(value)) => {
            Value::Series(series.compare_scalar(value, op)?)
        }
        (Value::Scalar(value), Value::Series(series)) => {
            Value::Series(series.compare_scalar(value, op.reversed())?)
        }
        (Value::Scalar(a), Value::Scalar(b)) => Value::Scalar(Scalar::Bool(compare_scalars(a, b, op)?)),
        (left, right) => return Err(operand_error(name, left, right)),
    })
}

fn logical(
    name: &str,
    left: &Value,
    right: &Value,
    op: LogicalOp,
    reflected: bool,
) -> Result<Value, PlyError> {
    Ok(match (left, right) {
        (Value::Series(a), Value::Series(b)) => Value::Series(if reflected {
            b.logical(a, op)?
        } else {
            a.logical(b, op)?
        }),
        (Value::Series(series), Value::Scalar(value))
        | (Value::Scalar(value), Value::Series(series)) => {
            Value::Series(series.logical(&broadcast_like(series, value)?, op)?)
        }
        (Value::Scalar(a), Value::Scalar(b)) => {
            let (a, b) = (a.to_mask_bit()?, b.to_mask_bit()?);
            Value::Scalar(Scalar::Bool(match op {
                LogicalOp::And => a && b,
                LogicalOp::Or => a || b,
            }))
        }
        (left, right) => return Err(operand_error(name, left, right)),
    })
}

fn unary(name: &str, receiver: &Value) -> Result<Value, PlyError> {
    Ok(match (receiver, name) {
        (Value::Series(series), ops::NEG) => Value::Series(series.neg()?),
        (Value::Series(series), ops::INVERT) => Value::Series(series.not()?),
        (Value::Series(series), ops::ABS) => Value::Series(series.abs()?),
        (Value::Scalar(value), ops::NEG) => Value::Scalar(first(Column::broadcast(value, 1)?.neg()?)),
        (Value::Scalar(value), ops::INVERT) => Value::Scalar(Scalar::Bool(!value.to_mask_bit()?)),
        (Value::Scalar(value), ops::ABS) => Value::Scalar(first(Column::broadcast(value, 1)?.abs()?)),
        (other, _) => {
            return Err(PlyError::invalid(
                name,
                format!("unsupported operand {}", other.kind()),
            ));
        }
    })
}

fn reduce(name: &str, receiver: &Value) -> Result<Value, PlyError> {
    Ok(match (receiver, name) {
        (Value::Series(series), "count") => Value::Scalar(series.count()),
        (Value::Series(series), "sum") => Value::Scalar(series.sum()?),
        (Value::Series(series), "mean") => Value::Scalar(series.mean()?),
        (Value::Series(series), "min") => Value::Scalar(series.min()),
        (Value::Series(series), "max") => Value::Scalar(series.max()),
        (Value::SeriesGroupBy(grouped), "count") => Value::Series(grouped.count()?),
        (Value::SeriesGroupBy(grouped), "sum") => Value::Series(grouped.sum()?),
        (Value::SeriesGroupBy(grouped), "mean") => Value::Series(grouped.mean()?),
        (Value::SeriesGroupBy(grouped), "min") => Value::Series(grouped.min()?),
        (Value::SeriesGroupBy(grouped), "max") => Value::Series(grouped.max()?),
        (Value::SeriesGroupBy(grouped), SIZE) => Value::Series(grouped.size()?),
        (Value::GroupBy(grouped), SIZE) => Value::Series(grouped.size()?),
        (value, LEN) => {
            let len = match value {
                Value::Series(series) => series.len(),
                Value::Frame(frame) => frame.len(),
                Value::GroupBy(grouped) => grouped.len(),
                Value::SeriesGroupBy(grouped) => grouped.len(),
                Value::List(items) => items.len(),
                other => return Err(PlyError::invalid(LEN, format!("{} has no length", other.kind()))),
            };
            Value::Scalar(Scalar::Int64(len as i64))
        }
        (other, _) => {
            return Err(PlyError::invalid(
                name,
                format!("unsupported receiver {}", other.kind()),
            ));
        }
    })
}

fn get_item(receiver: &Value, key: &Value) -> Result<Value, PlyError> {
    match (receiver, key) {
        (Value::Frame(frame), Value::Scalar(Scalar::Utf8(name))) => {
            Ok(Value::Series(frame.series(name)?))
        }
        (Value::Frame(frame), Value::List(names)) => {
            let names = names
                .iter()
                .map(|name| match name {
                    Value::Scalar(Scalar::Utf8(name)) => Ok(name.as_str()),
                    other => Err(PlyError::invalid(
                        ops::GETITEM,
                        format!("column names must be strings, got {}", other.describe()),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Frame(frame.select_columns(&names)?))
        }
        (Value::Frame(frame), mask @ Value::Series(_)) => {
            Ok(Value::Frame(frame.filter_rows(&mask.to_mask(frame.index())?)?))
        }
        (Value::Series(series), mask @ Value::Series(_)) => {
            Ok(Value::Series(series.filter(&mask.to_mask(series.index())?)?))
        }
        (Value::Series(series), Value::Scalar(label)) => {
            let label = IndexLabel::try_from(label)?;
            let position = series.index().position(&label).ok_or_else(|| {
                PlyError::invalid(ops::GETITEM, format!("label {label} not found"))
            })?;
            Ok(Value::Scalar(series.values()[position].clone()))
        }
        (Value::List(items), Value::Scalar(Scalar::Int64(position))) => {
            let len = items.len() as i64;
            let resolved = if *position < 0 { len + position } else { *position };
            usize::try_from(resolved)
                .ok()
                .and_then(|pos| items.get(pos))
                .cloned()
                .ok_or_else(|| {
                    PlyError::invalid(ops::GETITEM, format!("position {position} out of range"))
                })
        }
        (Value::GroupBy(grouped), Value::Scalar(Scalar::Utf8(name))) => {
            Ok(Value::SeriesGroupBy(grouped.column(name)?))
        }
        (receiver, key) => Err(operand_error(ops::GETITEM, receiver, key)),
    }
}

fn call_method(
    receiver: &Value,
    name: &str,
    mut args: Vec<Value>,
    kwargs: Kwargs<Value>,
) -> Result<Value, PlyError> {
    if !kwargs.is_empty() {
        return Err(PlyError::invalid(name, "keyword arguments are not accepted"));
    }

    let expects_operand = arithmetic_op(name).is_some()
        || comparison_op(name).is_some()
        || logical_op(name).is_some()
        || name == ops::GETITEM;
    let wanted = usize::from(expects_operand);
    if args.len() != wanted {
        return Err(PlyError::invalid(
            name,
            format!("expected {wanted} argument(s), got {}", args.len()),
        ));
    }

    let Some(operand) = args.pop() else {
        return match name {
            ops::NEG | ops::INVERT | ops::ABS => unary(name, receiver),
            _ => reduce(name, receiver),
        };
    };

    if let Some((op, reflected)) = arithmetic_op(name) {
        arithmetic(name, receiver, &operand, op, reflected)
    } else if let Some(op) = comparison_op(name) {
        comparison(name, receiver, &operand, op)
    } else if let Some((op, reflected)) = logical_op(name) {
        logical(name, receiver, &operand, op, reflected)
    } else {
        get_item(receiver, &operand)
    }
}

impl Dynamic for Value {
    type Error = PlyError;

    /// Operators and reductions shadow frame columns of the same name.
    fn get_attr(&self, name: &str) -> Result<Self, Self::Error> {
        if self.has_method(name) {
            return Ok(Self::Method(Method {
                receiver: Box::new(self.clone()),
                name: name.to_owned(),
            }));
        }

        let found = match self {
            Self::Series(series) if name == "name" => {
                Some(Self::Scalar(Scalar::Utf8(series.name().to_owned())))
            }
            Self::Frame(frame) if name == "columns" => Some(Self::List(
                frame
                    .column_names()
                    .map(|column| Self::Scalar(Scalar::Utf8(column.to_owned())))
                    .collect(),
            )),
            Self::Frame(frame) if name == "shape" => Some(Self::List(vec![
                Self::Scalar(Scalar::Int64(frame.len() as i64)),
                Self::Scalar(Scalar::Int64(frame.num_columns() as i64)),
            ])),
            Self::Frame(frame) => frame
                .has_column(name)
                .then(|| frame.series(name))
                .transpose()?
                .map(Self::Series),
            Self::GroupBy(grouped) => grouped
                .frame()
                .has_column(name)
                .then(|| grouped.column(name))
                .transpose()?
                .map(Self::SeriesGroupBy),
            _ => None,
        };

        found.ok_or_else(|| {
            SymbolicError::MissingAttribute {
                type_name: self.kind().to_owned(),
                name: name.to_owned(),
            }
            .into()
        })
    }

    fn call(&self, args: Vec<Self>, kwargs: Kwargs<Self>) -> Result<Self, Self::Error> {
        match self {
            Self::Function(function) => function.invoke(args, kwargs),
            Self::Method(method) => call_method(&method.receiver, &method.name, args, kwargs),
            other => Err(SymbolicError::NotCallable {
                type_name: other.kind().to_owned(),
            }
            .into()),
        }
    }

    fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_) | Self::Method(_))
    }

    fn render(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(value) => write!(f, "{value}"),
            Self::Series(series) => write!(f, "<Series {:?}>", series.name()),
            Self::Frame(frame) => write!(f, "<DataFrame {}x{}>", frame.len(), frame.num_columns()),
            Self::GroupBy(grouped) => write!(f, "<DataFrameGroupBy {:?}>", grouped.key_name()),
            Self::SeriesGroupBy(grouped) => write!(
                f,
                "<SeriesGroupBy {:?} by {:?}>",
                grouped.series().name(),
                grouped.key_name()
            ),
            Self::List(items) => {
                f.write_str("[")?;
                for (pos, item) in items.iter().enumerate() {
                    if pos > 0 {
                        f.write_str(", ")?;
                    }
                    item.render(f)?;
                }
                f.write_str("]")
            }
            Self::Function(function) => f.write_str(function.name()),
            Self::Method(method) => write!(f, "<method {}>", method.name),
        }
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<Series> for Value {
    fn from(value: Series) -> Self {
        Self::Series(value)
    }
}

impl From<DataFrame> for Value {
    fn from(value: DataFrame) -> Self {
        Self::Frame(value)
    }
}

impl From<DataFrameGroupBy> for Value {
    fn from(value: DataFrameGroupBy) -> Self {
        Self::GroupBy(value)
    }
}

impl From<SeriesGroupBy> for Value {
    fn from(value: SeriesGroupBy) -> Self {
        Self::SeriesGroupBy(value)
    }
}

impl From<Function> for Value {
    fn from(value: Function) -> Self {
        Self::Function(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::Int64(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Scalar(Scalar::Float64(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Scalar(Scalar::Bool(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Scalar(Scalar::Utf8(value.to_owned()))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Scalar(Scalar::Utf8(value))
    }
}

impl From<Value> for Operand<Value> {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<Function> for Operand<Value> {
    fn from(value: Function) -> Self {
        Self::Literal(Value::Function(value))
    }
}

#[cfg(test)]
mod tests {
    use ply_frame::{DataFrame, Series};
    use ply_symbolic::{Context, Dynamic, EvalOptions, Kwargs, SymbolicError};
    use ply_types::Scalar;

    use super::Value;
    use crate::{PlyError, x};

    fn ints(values: &[i64]) -> Vec<Scalar> {
        values.iter().copied().map(Scalar::Int64).collect()
    }

    fn frame() -> DataFrame {
        DataFrame::from_columns(vec![("x", ints(&[1, 2, 3])), ("len", ints(&[7, 8, 9]))])
            .expect("frame")
    }

    fn eval(expr: &crate::Expr, input: DataFrame) -> Result<Value, PlyError> {
        expr.eval(
            &Context::new().bind(0_usize, Value::Frame(input)),
            EvalOptions::default(),
        )
    }

    #[test]
    fn columns_are_attributes() {
        let out = eval(&x().attr("x"), frame()).expect("eval");
        let series = out.as_series().expect("series");
        assert_eq!(series.name(), "x");
        assert_eq!(series.values(), ints(&[1, 2, 3]).as_slice());
    }

    #[test]
    fn item_reaches_columns_shadowed_by_methods() {
        let out = eval(&x().item("len"), frame()).expect("eval");
        assert_eq!(out.as_series().expect("series").values(), ints(&[7, 8, 9]).as_slice());

        let out = eval(&x().method("len", Vec::new()), frame()).expect("eval");
        assert_eq!(out.as_scalar(), Some(&Scalar::Int64(3)));
    }

    #[test]
    fn series_arithmetic_and_reflection() {
        let out = eval(&(10_i64 - x().attr("x") * 2_i64), frame()).expect("eval");
        assert_eq!(out.as_series().expect("series").values(), ints(&[8, 6, 4]).as_slice());
    }

    #[test]
    fn comparisons_produce_boolean_series() {
        let out = eval(&(x().attr("x").gt(1_i64) & x().attr("x").lt(3_i64)), frame()).expect("eval");
        assert_eq!(
            out.as_series().expect("series").values(),
            &[Scalar::Bool(false), Scalar::Bool(true), Scalar::Bool(false)]
        );
    }

    #[test]
    fn scalar_operators_follow_column_rules() {
        let three = Value::from(3_i64);
        let half = three
            .get_attr("div")
            .and_then(|method| method.call(vec![Value::from(2_i64)], Kwargs::new()))
            .expect("div");
        assert_eq!(half.as_scalar(), Some(&Scalar::Float64(1.5)));

        let neg = three
            .get_attr("neg")
            .and_then(|method| method.call(Vec::new(), Kwargs::new()))
            .expect("neg");
        assert_eq!(neg.as_scalar(), Some(&Scalar::Int64(-3)));
    }

    #[test]
    fn reductions_return_scalars() {
        let out = eval(&x().attr("x").method("mean", Vec::new()), frame()).expect("eval");
        assert_eq!(out.as_scalar(), Some(&Scalar::Float64(2.0)));
        let out = eval(&x().attr("x").method("len", Vec::new()), frame()).expect("eval");
        assert_eq!(out.as_scalar(), Some(&Scalar::Int64(3)));
    }

    #[test]
    fn series_item_by_label() {
        let series = Series::from_values(
            "s",
            vec!["a".into(), "b".into()],
            ints(&[10, 20]),
        )
        .expect("series");
        let out = Value::Series(series)
            .get_attr("getitem")
            .and_then(|method| method.call(vec![Value::from("b")], Kwargs::new()))
            .expect("item");
        assert_eq!(out.as_scalar(), Some(&Scalar::Int64(20)));
    }

    #[test]
    fn unknown_attribute_reports_the_type() {
        let err = eval(&x().attr("nope"), frame()).expect_err("missing");
        assert!(matches!(
            err,
            PlyError::Symbolic(SymbolicError::MissingAttribute { ref type_name, ref name })
                if type_name == "DataFrame" && name == "nope"
        ));
    }

    #[test]
    fn plain_values_are_not_callable() {
        let err = Value::from(1_i64)
            .call(Vec::new(), Kwargs::new())
            .expect_err("not callable");
        assert!(matches!(err, PlyError::Symbolic(SymbolicError::NotCallable { .. })));
    }

    #[test]
    fn literals_render_like_scalars() {
        let expr = x().attr("name").eq_to("abc");
        assert_eq!(
            expr.to_string(),
            "getattr(getattr(Symbol(0), \"name\"), \"eq\")(\"abc\")"
        );
    }
}
