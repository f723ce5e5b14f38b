#![forbid(unsafe_code)]

use std::collections::HashMap;

use ply_columnar::{Column, ColumnError};
use ply_frame::{DataFrame, FrameError, Series};
use ply_index::{Index, IndexLabel};
use ply_types::{NullKind, Scalar};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupByOptions {
    pub dropna: bool,
}

impl Default for GroupByOptions {
    fn default() -> Self {
        Self { dropna: true }
    }
}

#[derive(Debug, Error)]
pub enum GroupByError {
    #[error("unknown grouping column: {0}")]
    UnknownKey(String),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Column(#[from] ColumnError),
}

/// One distinct key and the input row positions that carry it.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    key: Scalar,
    label: IndexLabel,
    positions: Vec<usize>,
}

impl Group {
    #[must_use]
    pub fn key(&self) -> &Scalar {
        &self.key
    }

    #[must_use]
    pub fn label(&self) -> &IndexLabel {
        &self.label
    }

    #[must_use]
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum GroupKeyRef<'a> {
    Bool(bool),
    Int64(i64),
    FloatBits(u64),
    Utf8(&'a str),
    Null(NullKind),
}

impl<'a> GroupKeyRef<'a> {
    fn from_scalar(key: &'a Scalar) -> Self {
        match key {
            Scalar::Bool(v) => Self::Bool(*v),
            Scalar::Int64(v) => Self::Int64(*v),
            // `-0.0 == 0.0`, so both zeros share one group
            Scalar::Float64(v) => Self::FloatBits(if v.is_nan() {
                f64::NAN.to_bits()
            } else if *v == 0.0 {
                0.0_f64.to_bits()
            } else {
                v.to_bits()
            }),
            Scalar::Utf8(v) => Self::Utf8(v.as_str()),
            Scalar::Null(kind) => Self::Null(*kind),
        }
    }
}

fn label_for_key(key: &Scalar) -> IndexLabel {
    match key {
        Scalar::Int64(v) => IndexLabel::Int64(*v),
        Scalar::Utf8(v) => IndexLabel::Utf8(v.clone()),
        Scalar::Bool(v) => IndexLabel::Utf8(v.to_string()),
        Scalar::Float64(v) if v.is_finite() && *v == v.trunc() => IndexLabel::Int64(*v as i64),
        Scalar::Float64(v) => IndexLabel::Utf8(v.to_string()),
        Scalar::Null(_) => IndexLabel::Utf8("<null>".to_owned()),
    }
}

/// Partition `keys` into groups ordered by key value.
fn build_groups(keys: &[Scalar], options: GroupByOptions) -> Vec<Group> {
    let mut slot = HashMap::<GroupKeyRef<'_>, usize>::new();
    let mut groups = Vec::<Group>::new();

    for (position, key) in keys.iter().enumerate() {
        if options.dropna && key.is_missing() {
            continue;
        }
        let group_idx = *slot.entry(GroupKeyRef::from_scalar(key)).or_insert_with(|| {
            groups.push(Group {
                key: key.clone(),
                label: label_for_key(key),
                positions: Vec::new(),
            });
            groups.len() - 1
        });
        groups[group_idx].positions.push(position);
    }

    groups.sort_by(|left, right| left.key.sort_cmp(&right.key));

    #[cfg(feature = "tracing")]
    tracing::debug!(rows = keys.len(), groups = groups.len(), "build_groups");

    groups
}

fn group_index(groups: &[Group], key_name: &str) -> Index {
    Index::new(groups.iter().map(|group| group.label.clone()).collect()).with_name(key_name)
}

/// A frame split by the values of one of its columns.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrameGroupBy {
    frame: DataFrame,
    key: String,
    groups: Vec<Group>,
}

impl DataFrameGroupBy {
    pub fn new(frame: &DataFrame, key: &str) -> Result<Self, GroupByError> {
        Self::with_options(frame, key, GroupByOptions::default())
    }

    pub fn with_options(
        frame: &DataFrame,
        key: &str,
        options: GroupByOptions,
    ) -> Result<Self, GroupByError> {
        let keys = frame
            .column(key)
            .ok_or_else(|| GroupByError::UnknownKey(key.to_owned()))?;
        let groups = build_groups(keys.values(), options);
        Ok(Self {
            frame: frame.clone(),
            key: key.to_owned(),
            groups,
        })
    }

    #[must_use]
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    #[must_use]
    pub fn key_name(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Number of distinct groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Group labels in output order, named after the grouping column.
    #[must_use]
    pub fn group_index(&self) -> Index {
        group_index(&self.groups, &self.key)
    }

    /// Materialise each group as its own sub-frame.
    pub fn sub_frames(&self) -> Result<Vec<(IndexLabel, DataFrame)>, GroupByError> {
        self.groups
            .iter()
            .map(|group| {
                let frame = self.frame.take_rows(&group.positions)?;
                Ok((group.label.clone(), frame))
            })
            .collect()
    }

    /// The named column, split along the same groups.
    pub fn column(&self, name: &str) -> Result<SeriesGroupBy, GroupByError> {
        let series = self.frame.series(name)?;
        Ok(SeriesGroupBy {
            series,
            key: self.key.clone(),
            groups: self.groups.clone(),
        })
    }

    /// Rows per group.
    pub fn size(&self) -> Result<Series, GroupByError> {
        let values = self
            .groups
            .iter()
            .map(|group| Scalar::Int64(group.positions.len() as i64))
            .collect();
        Ok(Series::new(
            "size",
            self.group_index(),
            Column::from_values(values)?,
        )?)
    }

    /// Run `reducer` over every sub-frame, one output entry per group.
    pub fn apply<F, E>(&self, name: &str, mut reducer: F) -> Result<Series, E>
    where
        F: FnMut(&DataFrame) -> Result<Scalar, E>,
        E: From<GroupByError>,
    {
        let mut values = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            let sub = self
                .frame
                .take_rows(&group.positions)
                .map_err(GroupByError::from)?;
            values.push(reducer(&sub)?);
        }
        let column = Column::from_values(values).map_err(GroupByError::from)?;
        Ok(Series::new(name, self.group_index(), column).map_err(GroupByError::from)?)
    }
}

/// `frame.groupby(key)` on plain frames.
pub trait GroupByExt {
    fn groupby(&self, key: &str) -> Result<DataFrameGroupBy, GroupByError>;
}

impl GroupByExt for DataFrame {
    fn groupby(&self, key: &str) -> Result<DataFrameGroupBy, GroupByError> {
        DataFrameGroupBy::new(self, key)
    }
}

/// A single column split along a frame's groups.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesGroupBy {
    series: Series,
    key: String,
    groups: Vec<Group>,
}

impl SeriesGroupBy {
    /// Group `values` by the aligned `keys` series.
    pub fn new(values: &Series, keys: &Series, options: GroupByOptions) -> Result<Self, GroupByError> {
        let aligned_keys = keys.align_to(values.index())?;
        Ok(Self {
            series: values.clone(),
            key: keys.name().to_owned(),
            groups: build_groups(aligned_keys.values(), options),
        })
    }

    #[must_use]
    pub fn series(&self) -> &Series {
        &self.series
    }

    #[must_use]
    pub fn key_name(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    #[must_use]
    pub fn group_index(&self) -> Index {
        group_index(&self.groups, &self.key)
    }

    /// Run `reducer` over each group's values.
    pub fn apply<F, E>(&self, mut reducer: F) -> Result<Series, E>
    where
        F: FnMut(&Column) -> Result<Scalar, E>,
        E: From<GroupByError>,
    {
        let mut values = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            let part = self
                .series
                .column()
                .take(&group.positions)
                .map_err(GroupByError::from)?;
            values.push(reducer(&part)?);
        }
        let column = Column::from_values(values).map_err(GroupByError::from)?;
        Ok(Series::new(self.series.name(), self.group_index(), column)
            .map_err(GroupByError::from)?)
    }

    pub fn count(&self) -> Result<Series, GroupByError> {
        self.apply(|part| Ok(part.count()))
    }

    pub fn size(&self) -> Result<Series, GroupByError> {
        self.apply(|part| Ok(Scalar::Int64(part.len() as i64)))
    }

    pub fn sum(&self) -> Result<Series, GroupByError> {
        self.apply(|part| Ok(part.sum()?))
    }

    pub fn mean(&self) -> Result<Series, GroupByError> {
        self.apply(|part| Ok(part.mean()?))
    }

    pub fn min(&self) -> Result<Series, GroupByError> {
        self.apply(|part| Ok(part.min()))
    }

    pub fn max(&self) -> Result<Series, GroupByError> {
        self.apply(|part| Ok(part.max()))
    }
}
