#![forbid(unsafe_code)]

use std::cmp::Ordering;

use ply_types::{DType, NullKind, Scalar, TypeError, cast_scalar_owned, common_dtype, infer_dtype};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityMask {
    bits: Vec<bool>,
}

impl ValidityMask {
    #[must_use]
    pub fn from_values(values: &[Scalar]) -> Self {
        let bits = values.iter().map(|value| !value.is_missing()).collect();
        Self { bits }
    }

    #[must_use]
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    #[must_use]
    pub fn count_valid(&self) -> usize {
        self.bits.iter().filter(|bit| **bit).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    dtype: DType,
    values: Vec<Scalar>,
    validity: ValidityMask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Gt,
    Lt,
    Eq,
    Ne,
    Ge,
    Le,
}

impl ComparisonOp {
    /// The operator that gives the same answer with operands swapped.
    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Gt => Self::Lt,
            Self::Lt => Self::Gt,
            Self::Eq => Self::Eq,
            Self::Ne => Self::Ne,
            Self::Ge => Self::Le,
            Self::Le => Self::Ge,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ColumnError {
    #[error("column length mismatch: left={left}, right={right}")]
    LengthMismatch { left: usize, right: usize },
    #[error("operation {op} is not supported for dtype {dtype:?}")]
    UnsupportedDtype { op: &'static str, dtype: DType },
    #[error(transparent)]
    Type(#[from] TypeError),
}

impl Column {
    /// Construct a column, coercing values to the target dtype.
    pub fn new(dtype: DType, values: Vec<Scalar>) -> Result<Self, ColumnError> {
        let needs_coercion = values.iter().any(|v| {
            let d = v.dtype();
            d != dtype && d != DType::Null
        });

        let coerced = if needs_coercion {
            values
                .into_iter()
                .map(|value| cast_scalar_owned(value, dtype))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            values
                .into_iter()
                .map(|value| match value {
                    Scalar::Null(_) => Scalar::missing_for_dtype(dtype),
                    other => other,
                })
                .collect()
        };

        let validity = ValidityMask::from_values(&coerced);

        Ok(Self {
            dtype,
            values: coerced,
            validity,
        })
    }

    pub fn from_values(values: Vec<Scalar>) -> Result<Self, ColumnError> {
        let dtype = infer_dtype(&values)?;
        Self::new(dtype, values)
    }

    /// A column holding `len` copies of `value`.
    pub fn broadcast(value: &Scalar, len: usize) -> Result<Self, ColumnError> {
        Self::new(value.dtype(), vec![value.clone(); len])
    }

    #[must_use]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    #[must_use]
    pub fn value(&self, idx: usize) -> Option<&Scalar> {
        self.values.get(idx)
    }

    #[must_use]
    pub fn validity(&self) -> &ValidityMask {
        &self.validity
    }

    pub fn reindex_by_positions(&self, positions: &[Option<usize>]) -> Result<Self, ColumnError> {
        let values = positions
            .iter()
            .map(|slot| match slot {
                Some(idx) => self
                    .values
                    .get(*idx)
                    .cloned()
                    .unwrap_or_else(|| Scalar::missing_for_dtype(self.dtype)),
                None => Scalar::missing_for_dtype(self.dtype),
            })
            .collect::<Vec<_>>();

        Self::new(self.dtype, values)
    }

    /// Gather rows by position; every position must be in range.
    pub fn take(&self, positions: &[usize]) -> Result<Self, ColumnError> {
        let values = positions
            .iter()
            .map(|idx| {
                self.values
                    .get(*idx)
                    .cloned()
                    .ok_or(ColumnError::LengthMismatch {
                        left: self.len(),
                        right: idx + 1,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(self.dtype, values)
    }

    /// Keep rows whose mask bit is set, preserving order.
    pub fn filter(&self, mask: &[bool]) -> Result<Self, ColumnError> {
        if mask.len() != self.len() {
            return Err(ColumnError::LengthMismatch {
                left: self.len(),
                right: mask.len(),
            });
        }
        let values = self
            .values
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(value, _)| value.clone())
            .collect();
        Self::new(self.dtype, values)
    }

    pub fn binary_numeric(&self, right: &Self, op: ArithmeticOp) -> Result<Self, ColumnError> {
        if self.len() != right.len() {
            return Err(ColumnError::LengthMismatch {
                left: self.len(),
                right: right.len(),
            });
        }

        let out_dtype = arithmetic_dtype(self.dtype, right.dtype, op)?;
        let values = self
            .values
            .iter()
            .zip(&right.values)
            .map(|(left, right)| arithmetic_scalar(left, right, op, out_dtype))
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(out_dtype, values)
    }

    /// `self <op> scalar`, or `scalar <op> self` when `reflected` is set.
    pub fn binary_numeric_scalar(
        &self,
        scalar: &Scalar,
        op: ArithmeticOp,
        reflected: bool,
    ) -> Result<Self, ColumnError> {
        let out_dtype = arithmetic_dtype(self.dtype, scalar.dtype(), op)?;
        let values = self
            .values
            .iter()
            .map(|value| {
                if reflected {
                    arithmetic_scalar(scalar, value, op, out_dtype)
                } else {
                    arithmetic_scalar(value, scalar, op, out_dtype)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(out_dtype, values)
    }

    pub fn compare(&self, right: &Self, op: ComparisonOp) -> Result<Self, ColumnError> {
        if self.len() != right.len() {
            return Err(ColumnError::LengthMismatch {
                left: self.len(),
                right: right.len(),
            });
        }
        let values = self
            .values
            .iter()
            .zip(&right.values)
            .map(|(left, right)| compare_scalars(left, right, op).map(Scalar::Bool))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(DType::Bool, values)
    }

    pub fn compare_scalar(&self, scalar: &Scalar, op: ComparisonOp) -> Result<Self, ColumnError> {
        let values = self
            .values
            .iter()
            .map(|value| compare_scalars(value, scalar, op).map(Scalar::Bool))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(DType::Bool, values)
    }

    pub fn logical(&self, right: &Self, op: LogicalOp) -> Result<Self, ColumnError> {
        if self.len() != right.len() {
            return Err(ColumnError::LengthMismatch {
                left: self.len(),
                right: right.len(),
            });
        }
        let left_bits = self.mask_bits()?;
        let right_bits = right.mask_bits()?;
        let values = left_bits
            .iter()
            .zip(&right_bits)
            .map(|(l, r)| {
                Scalar::Bool(match op {
                    LogicalOp::And => *l && *r,
                    LogicalOp::Or => *l || *r,
                })
            })
            .collect();
        Self::new(DType::Bool, values)
    }

    pub fn not(&self) -> Result<Self, ColumnError> {
        let values = self
            .mask_bits()?
            .into_iter()
            .map(|bit| Scalar::Bool(!bit))
            .collect();
        Self::new(DType::Bool, values)
    }

    pub fn neg(&self) -> Result<Self, ColumnError> {
        self.binary_numeric_scalar(&Scalar::Int64(-1), ArithmeticOp::Mul, false)
    }

    pub fn abs(&self) -> Result<Self, ColumnError> {
        let values = self
            .values
            .iter()
            .map(|value| match value {
                Scalar::Int64(v) => Ok(Scalar::Int64(v.abs())),
                Scalar::Float64(v) => Ok(Scalar::Float64(v.abs())),
                Scalar::Bool(v) => Ok(Scalar::Int64(i64::from(*v))),
                Scalar::Null(kind) => Ok(Scalar::Null(*kind)),
                Scalar::Utf8(_) => Err(ColumnError::UnsupportedDtype {
                    op: "abs",
                    dtype: DType::Utf8,
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let dtype = if self.dtype == DType::Bool {
            DType::Int64
        } else {
            self.dtype
        };
        Self::new(dtype, values)
    }

    /// Mask bits for a boolean column; missing entries read as `false`.
    pub fn mask_bits(&self) -> Result<Vec<bool>, ColumnError> {
        if !matches!(self.dtype, DType::Bool | DType::Null) {
            return Err(ColumnError::UnsupportedDtype {
                op: "boolean mask",
                dtype: self.dtype,
            });
        }
        Ok(self
            .values
            .iter()
            .map(|value| matches!(value, Scalar::Bool(true)))
            .collect())
    }

    #[must_use]
    pub fn count(&self) -> Scalar {
        Scalar::Int64(self.validity.count_valid() as i64)
    }

    pub fn sum(&self) -> Result<Scalar, ColumnError> {
        self.ensure_numeric("sum")?;
        let mut total = 0.0;
        for value in self.values.iter().filter(|value| !value.is_missing()) {
            total += value.to_f64()?;
        }
        Ok(match self.dtype {
            DType::Int64 | DType::Bool | DType::Null => Scalar::Int64(total as i64),
            _ => Scalar::Float64(total),
        })
    }

    pub fn mean(&self) -> Result<Scalar, ColumnError> {
        self.ensure_numeric("mean")?;
        let mut total = 0.0;
        let mut seen = 0_usize;
        for value in self.values.iter().filter(|value| !value.is_missing()) {
            total += value.to_f64()?;
            seen += 1;
        }
        if seen == 0 {
            return Ok(Scalar::Null(NullKind::NaN));
        }
        Ok(Scalar::Float64(total / seen as f64))
    }

    #[must_use]
    pub fn min(&self) -> Scalar {
        self.extreme(Ordering::Less)
    }

    #[must_use]
    pub fn max(&self) -> Scalar {
        self.extreme(Ordering::Greater)
    }

    fn extreme(&self, wanted: Ordering) -> Scalar {
        self.values
            .iter()
            .filter(|value| !value.is_missing())
            .fold(None::<&Scalar>, |best, value| match best {
                Some(current) if value.sort_cmp(current) != wanted => Some(current),
                _ => Some(value),
            })
            .cloned()
            .unwrap_or_else(|| Scalar::missing_for_dtype(self.dtype))
    }

    fn ensure_numeric(&self, op: &'static str) -> Result<(), ColumnError> {
        if matches!(self.dtype, DType::Utf8) {
            return Err(ColumnError::UnsupportedDtype {
                op,
                dtype: self.dtype,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn semantic_eq(&self, other: &Self) -> bool {
        self.dtype == other.dtype
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(left, right)| left.semantic_eq(right))
    }
}

fn arithmetic_dtype(left: DType, right: DType, op: ArithmeticOp) -> Result<DType, ColumnError> {
    let mut out_dtype = common_dtype(left, right)?;
    if matches!(out_dtype, DType::Utf8) {
        return Err(ColumnError::UnsupportedDtype {
            op: "arithmetic",
            dtype: out_dtype,
        });
    }
    if matches!(out_dtype, DType::Bool | DType::Null) {
        out_dtype = DType::Int64;
    }
    if matches!(op, ArithmeticOp::Div) {
        out_dtype = DType::Float64;
    }
    Ok(out_dtype)
}

/// Scalar-level arithmetic shared by the column and broadcast kernels.
pub fn arithmetic_scalar(
    left: &Scalar,
    right: &Scalar,
    op: ArithmeticOp,
    out_dtype: DType,
) -> Result<Scalar, ColumnError> {
    if left.is_missing() || right.is_missing() {
        return Ok(if left.is_nan() || right.is_nan() {
            Scalar::Null(NullKind::NaN)
        } else {
            Scalar::missing_for_dtype(out_dtype)
        });
    }

    let lhs = left.to_f64()?;
    let rhs = right.to_f64()?;
    let result = match op {
        ArithmeticOp::Add => lhs + rhs,
        ArithmeticOp::Sub => lhs - rhs,
        ArithmeticOp::Mul => lhs * rhs,
        ArithmeticOp::Div => lhs / rhs,
        ArithmeticOp::Rem => lhs.rem_euclid(rhs),
        ArithmeticOp::Pow => lhs.powf(rhs),
    };

    if matches!(out_dtype, DType::Int64)
        && result.is_finite()
        && result == result.trunc()
        && result >= i64::MIN as f64
        && result <= i64::MAX as f64
    {
        Ok(Scalar::Int64(result as i64))
    } else {
        Ok(Scalar::Float64(result))
    }
}

/// Element comparison; anything involving a missing value is `false`
/// except `Ne`, which is `true`.
pub fn compare_scalars(left: &Scalar, right: &Scalar, op: ComparisonOp) -> Result<bool, ColumnError> {
    if left.is_missing() || right.is_missing() {
        return Ok(matches!(op, ComparisonOp::Ne));
    }

    let ordering = match (left, right) {
        (Scalar::Utf8(a), Scalar::Utf8(b)) => a.cmp(b),
        (Scalar::Utf8(_), other) | (other, Scalar::Utf8(_)) => {
            return match op {
                ComparisonOp::Eq => Ok(false),
                ComparisonOp::Ne => Ok(true),
                _ => Err(ColumnError::Type(TypeError::IncompatibleDtypes {
                    left: DType::Utf8,
                    right: other.dtype(),
                })),
            };
        }
        (a, b) => {
            let lhs = a.to_f64()?;
            let rhs = b.to_f64()?;
            lhs.partial_cmp(&rhs).unwrap_or(Ordering::Equal)
        }
    };

    Ok(match op {
        ComparisonOp::Gt => ordering == Ordering::Greater,
        ComparisonOp::Lt => ordering == Ordering::Less,
        ComparisonOp::Eq => ordering == Ordering::Equal,
        ComparisonOp::Ne => ordering != Ordering::Equal,
        ComparisonOp::Ge => ordering != Ordering::Less,
        ComparisonOp::Le => ordering != Ordering::Greater,
    })
}

#[cfg(test)]
mod tests {
    use ply_types::{DType, NullKind, Scalar};

    use super::{ArithmeticOp, Column, ComparisonOp, LogicalOp};

    fn ints(values: &[i64]) -> Column {
        Column::from_values(values.iter().copied().map(Scalar::Int64).collect()).expect("ints")
    }

    #[test]
    fn reindex_injects_missing_values() {
        let column = ints(&[10, 20]);

        let out = column
            .reindex_by_positions(&[Some(1), None, Some(0)])
            .expect("reindex should work");

        assert_eq!(
            out.values(),
            &[
                Scalar::Int64(20),
                Scalar::Null(NullKind::Null),
                Scalar::Int64(10)
            ]
        );
    }

    #[test]
    fn numeric_addition_propagates_missing() {
        let left = Column::from_values(vec![
            Scalar::Int64(1),
            Scalar::Null(NullKind::Null),
            Scalar::Float64(f64::NAN),
        ])
        .expect("left");
        let right = ints(&[2, 5, 3]);

        let out = left
            .binary_numeric(&right, ArithmeticOp::Add)
            .expect("add should pass");

        assert_eq!(out.values()[0], Scalar::Float64(3.0));
        assert_eq!(out.values()[1], Scalar::Null(NullKind::NaN));
        assert_eq!(out.values()[2], Scalar::Null(NullKind::NaN));
    }

    #[test]
    fn reflected_scalar_arithmetic_swaps_operands() {
        let column = ints(&[1, 2, 4]);
        let out = column
            .binary_numeric_scalar(&Scalar::Int64(10), ArithmeticOp::Sub, true)
            .expect("rsub");
        assert_eq!(
            out.values(),
            &[Scalar::Int64(9), Scalar::Int64(8), Scalar::Int64(6)]
        );

        let div = column
            .binary_numeric_scalar(&Scalar::Int64(2), ArithmeticOp::Div, false)
            .expect("div");
        assert_eq!(div.dtype(), DType::Float64);
        assert_eq!(div.values()[0], Scalar::Float64(0.5));
    }

    #[test]
    fn compare_scalar_treats_missing_as_false() {
        let column = Column::from_values(vec![
            Scalar::Int64(1),
            Scalar::Null(NullKind::Null),
            Scalar::Int64(3),
        ])
        .expect("column");
        let out = column
            .compare_scalar(&Scalar::Float64(2.5), ComparisonOp::Lt)
            .expect("lt");
        assert_eq!(out.mask_bits().expect("bits"), vec![true, false, false]);
    }

    #[test]
    fn logical_and_combines_masks() {
        let left = Column::from_values(vec![Scalar::Bool(true), Scalar::Bool(true)]).expect("l");
        let right =
            Column::from_values(vec![Scalar::Bool(false), Scalar::Bool(true)]).expect("r");
        let out = left.logical(&right, LogicalOp::And).expect("and");
        assert_eq!(out.mask_bits().expect("bits"), vec![false, true]);
        assert!(ints(&[1]).mask_bits().is_err());
    }

    #[test]
    fn reductions_skip_missing_values() {
        let column = Column::from_values(vec![
            Scalar::Int64(4),
            Scalar::Null(NullKind::Null),
            Scalar::Int64(-2),
        ])
        .expect("column");
        assert_eq!(column.count(), Scalar::Int64(2));
        assert_eq!(column.sum().expect("sum"), Scalar::Int64(2));
        assert_eq!(column.mean().expect("mean"), Scalar::Float64(1.0));
        assert_eq!(column.min(), Scalar::Int64(-2));
        assert_eq!(column.max(), Scalar::Int64(4));
    }

    #[test]
    fn filter_keeps_order() {
        let out = ints(&[1, 2, 3, 4])
            .filter(&[false, true, true, false])
            .expect("filter");
        assert_eq!(out.values(), &[Scalar::Int64(2), Scalar::Int64(3)]);
    }

    #[test]
    fn column_round_trips_through_json() {
        let column = ints(&[1, 2]);
        let json = serde_json::to_string(&column).expect("serialize");
        let back: Column = serde_json::from_str(&json).expect("deserialize");
        assert!(column.semantic_eq(&back));
    }
}
