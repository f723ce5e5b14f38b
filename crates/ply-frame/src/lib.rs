#![forbid(unsafe_code)]

use ply_columnar::{ArithmeticOp, Column, ColumnError, ComparisonOp, LogicalOp};
use ply_index::{Index, IndexError, IndexLabel, align_union, validate_alignment_plan};
use ply_types::Scalar;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("index length ({index_len}) does not match column length ({column_len})")]
    LengthMismatch { index_len: usize, column_len: usize },
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),
    #[error(transparent)]
    Column(#[from] ColumnError),
    #[error(transparent)]
    Index(#[from] IndexError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    name: String,
    index: Index,
    column: Column,
}

impl Series {
    pub fn new(name: impl Into<String>, index: Index, column: Column) -> Result<Self, FrameError> {
        if index.len() != column.len() {
            return Err(FrameError::LengthMismatch {
                index_len: index.len(),
                column_len: column.len(),
            });
        }

        Ok(Self {
            name: name.into(),
            index,
            column,
        })
    }

    pub fn from_values(
        name: impl Into<String>,
        index_labels: Vec<IndexLabel>,
        values: Vec<Scalar>,
    ) -> Result<Self, FrameError> {
        let index = Index::new(index_labels);
        let column = Column::from_values(values)?;
        Self::new(name, index, column)
    }

    /// A series over the default `0..n` index.
    pub fn from_scalars(name: impl Into<String>, values: Vec<Scalar>) -> Result<Self, FrameError> {
        let index = Index::range(values.len());
        Self::new(name, index, Column::from_values(values)?)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn index(&self) -> &Index {
        &self.index
    }

    #[must_use]
    pub fn column(&self) -> &Column {
        &self.column
    }

    #[must_use]
    pub fn into_column(self) -> Column {
        self.column
    }

    #[must_use]
    pub fn values(&self) -> &[Scalar] {
        self.column.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.column.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.column.is_empty()
    }

    fn result_name(&self, other: &Self) -> String {
        if self.name == other.name {
            self.name.clone()
        } else {
            String::new()
        }
    }

    /// Label-aligned element-wise arithmetic; labels missing on one side
    /// produce missing values. Identical label sequences, duplicates
    /// included, combine positionally.
    pub fn binary(&self, other: &Self, op: ArithmeticOp) -> Result<Self, FrameError> {
        if self.index.labels() == other.index.labels() {
            let column = self.column.binary_numeric(&other.column, op)?;
            return Self::new(self.result_name(other), self.index.clone(), column);
        }

        let plan = align_union(&self.index, &other.index);
        validate_alignment_plan(&plan)?;

        let left = self.column.reindex_by_positions(&plan.left_positions)?;
        let right = other.column.reindex_by_positions(&plan.right_positions)?;
        let column = left.binary_numeric(&right, op)?;
        Self::new(self.result_name(other), plan.union_index, column)
    }

    pub fn binary_scalar(
        &self,
        scalar: &Scalar,
        op: ArithmeticOp,
        reflected: bool,
    ) -> Result<Self, FrameError> {
        let column = self.column.binary_numeric_scalar(scalar, op, reflected)?;
        Self::new(self.name.clone(), self.index.clone(), column)
    }

    /// Label-aligned comparison; identical labels, duplicates included,
    /// compare positionally.
    pub fn compare(&self, other: &Self, op: ComparisonOp) -> Result<Self, FrameError> {
        if self.index.labels() == other.index.labels() {
            let column = self.column.compare(&other.column, op)?;
            return Self::new(self.result_name(other), self.index.clone(), column);
        }

        let plan = align_union(&self.index, &other.index);
        validate_alignment_plan(&plan)?;
        let left = self.column.reindex_by_positions(&plan.left_positions)?;
        let right = other.column.reindex_by_positions(&plan.right_positions)?;
        let column = left.compare(&right, op)?;
        Self::new(self.result_name(other), plan.union_index, column)
    }

    pub fn compare_scalar(&self, scalar: &Scalar, op: ComparisonOp) -> Result<Self, FrameError> {
        let column = self.column.compare_scalar(scalar, op)?;
        Self::new(self.name.clone(), self.index.clone(), column)
    }

    pub fn logical(&self, other: &Self, op: LogicalOp) -> Result<Self, FrameError> {
        let aligned = other.align_to(&self.index)?;
        let column = self.column.logical(&aligned.column, op)?;
        Self::new(self.result_name(other), self.index.clone(), column)
    }

    pub fn not(&self) -> Result<Self, FrameError> {
        Self::new(self.name.clone(), self.index.clone(), self.column.not()?)
    }

    pub fn neg(&self) -> Result<Self, FrameError> {
        Self::new(self.name.clone(), self.index.clone(), self.column.neg()?)
    }

    pub fn abs(&self) -> Result<Self, FrameError> {
        Self::new(self.name.clone(), self.index.clone(), self.column.abs()?)
    }

    /// Reorder onto `target` by label; labels absent here become missing.
    pub fn align_to(&self, target: &Index) -> Result<Self, FrameError> {
        if self.index.labels() == target.labels() {
            return Self::new(self.name.clone(), target.clone(), self.column.clone());
        }
        let positions = target.positions_in(&self.index);
        let column = self.column.reindex_by_positions(&positions)?;
        Self::new(self.name.clone(), target.clone(), column)
    }

    pub fn filter(&self, mask: &[bool]) -> Result<Self, FrameError> {
        let index = self.index.filter(mask)?;
        let column = self.column.filter(mask)?;
        Self::new(self.name.clone(), index, column)
    }

    #[must_use]
    pub fn count(&self) -> Scalar {
        self.column.count()
    }

    pub fn sum(&self) -> Result<Scalar, FrameError> {
        Ok(self.column.sum()?)
    }

    pub fn mean(&self) -> Result<Scalar, FrameError> {
        Ok(self.column.mean()?)
    }

    #[must_use]
    pub fn min(&self) -> Scalar {
        self.column.min()
    }

    #[must_use]
    pub fn max(&self) -> Scalar {
        self.column.max()
    }
}

/// Row-labelled table with ordered, uniquely named columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    index: Index,
    columns: Vec<(String, Column)>,
}

impl DataFrame {
    pub fn new(index: Index, columns: Vec<(String, Column)>) -> Result<Self, FrameError> {
        for (position, (name, column)) in columns.iter().enumerate() {
            if column.len() != index.len() {
                return Err(FrameError::LengthMismatch {
                    index_len: index.len(),
                    column_len: column.len(),
                });
            }
            if columns[..position].iter().any(|(seen, _)| seen == name) {
                return Err(FrameError::DuplicateColumn(name.clone()));
            }
        }

        Ok(Self { index, columns })
    }

    /// Build from `(name, values)` pairs over the default `0..n` index.
    pub fn from_columns<N>(columns: Vec<(N, Vec<Scalar>)>) -> Result<Self, FrameError>
    where
        N: Into<String>,
    {
        let len = columns.first().map_or(0, |(_, values)| values.len());
        let columns = columns
            .into_iter()
            .map(|(name, values)| Ok::<_, FrameError>((name.into(), Column::from_values(values)?)))
            .collect::<Result<Vec<(String, Column)>, _>>()?;
        Self::new(Index::range(len), columns)
    }

    /// Frame with the given row labels and no columns.
    #[must_use]
    pub fn empty_with_index(index: Index) -> Self {
        Self {
            index,
            columns: Vec::new(),
        }
    }

    pub fn from_series(series_list: Vec<Series>) -> Result<Self, FrameError> {
        let mut series_iter = series_list.into_iter();
        let Some(first) = series_iter.next() else {
            return Self::new(Index::new(Vec::new()), Vec::new());
        };
        let mut union_index = first.index.clone();
        let mut columns = vec![(first.name, first.column)];

        for series in series_iter {
            let plan = align_union(&union_index, &series.index);
            validate_alignment_plan(&plan)?;

            if !plan.is_identity() {
                for (_, column) in &mut columns {
                    *column = column.reindex_by_positions(&plan.left_positions)?;
                }
            }

            let aligned_column = series.column.reindex_by_positions(&plan.right_positions)?;
            columns.push((series.name, aligned_column));
            union_index = plan.union_index;
        }

        Self::new(union_index, columns)
    }

    #[must_use]
    pub fn index(&self) -> &Index {
        &self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter_columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns
            .iter()
            .map(|(name, column)| (name.as_str(), column))
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, column)| column)
    }

    /// The named column as a series sharing this frame's index.
    pub fn series(&self, name: &str) -> Result<Series, FrameError> {
        let column = self
            .column(name)
            .ok_or_else(|| FrameError::UnknownColumn(name.to_owned()))?;
        Series::new(name, self.index.clone(), column.clone())
    }

    /// Project onto `names` in the given order, keeping the row index.
    pub fn select_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, FrameError> {
        let columns = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.column(name)
                    .cloned()
                    .map(|column| (name.to_owned(), column))
                    .ok_or_else(|| FrameError::UnknownColumn(name.to_owned()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(self.index.clone(), columns)
    }

    /// Set a column by name: an existing column is replaced in place, a new
    /// one is appended.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        column: Column,
    ) -> Result<(), FrameError> {
        let name = name.into();
        if column.len() != self.index.len() {
            return Err(FrameError::LengthMismatch {
                index_len: self.index.len(),
                column_len: column.len(),
            });
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(column = %name, rows = column.len(), "insert_column");

        match self
            .columns
            .iter_mut()
            .find(|(candidate, _)| *candidate == name)
        {
            Some((_, slot)) => *slot = column,
            None => self.columns.push((name, column)),
        }
        Ok(())
    }

    /// Replace the row labels; the label count must match the row count.
    pub fn with_index(mut self, index: Index) -> Result<Self, FrameError> {
        if index.len() != self.index.len() {
            return Err(FrameError::LengthMismatch {
                index_len: index.len(),
                column_len: self.index.len(),
            });
        }
        self.index = index;
        Ok(self)
    }

    /// Keep rows whose mask bit is set, preserving order and labels.
    pub fn filter_rows(&self, mask: &[bool]) -> Result<Self, FrameError> {
        let index = self.index.filter(mask)?;
        let columns = self
            .columns
            .iter()
            .map(|(name, column)| Ok((name.clone(), column.filter(mask)?)))
            .collect::<Result<Vec<_>, FrameError>>()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            rows_in = self.len(),
            rows_out = index.len(),
            "filter_rows"
        );

        Self::new(index, columns)
    }

    /// Gather rows by position (used to materialise per-group sub-frames).
    pub fn take_rows(&self, positions: &[usize]) -> Result<Self, FrameError> {
        let labels = positions
            .iter()
            .map(|pos| {
                self.index
                    .labels()
                    .get(*pos)
                    .cloned()
                    .ok_or(FrameError::LengthMismatch {
                        index_len: self.index.len(),
                        column_len: pos + 1,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut index = Index::new(labels);
        if let Some(name) = self.index.name() {
            index = index.with_name(name);
        }
        let columns = self
            .columns
            .iter()
            .map(|(name, column)| Ok((name.clone(), column.take(positions)?)))
            .collect::<Result<Vec<_>, FrameError>>()?;
        Self::new(index, columns)
    }
}
