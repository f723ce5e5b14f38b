#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::fmt;

use ply_types::{DType, Scalar};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IndexLabel {
    Int64(i64),
    Utf8(String),
}

impl IndexLabel {
    #[must_use]
    pub fn to_scalar(&self) -> Scalar {
        match self {
            Self::Int64(v) => Scalar::Int64(*v),
            Self::Utf8(v) => Scalar::Utf8(v.clone()),
        }
    }
}

impl From<i64> for IndexLabel {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<&str> for IndexLabel {
    fn from(value: &str) -> Self {
        Self::Utf8(value.to_owned())
    }
}

impl From<String> for IndexLabel {
    fn from(value: String) -> Self {
        Self::Utf8(value)
    }
}

impl TryFrom<&Scalar> for IndexLabel {
    type Error = IndexError;

    fn try_from(value: &Scalar) -> Result<Self, Self::Error> {
        match value {
            Scalar::Int64(v) => Ok(Self::Int64(*v)),
            Scalar::Utf8(v) => Ok(Self::Utf8(v.clone())),
            Scalar::Bool(v) => Ok(Self::Utf8(v.to_string())),
            Scalar::Float64(v) if v.is_finite() && *v == v.trunc() => Ok(Self::Int64(*v as i64)),
            other => Err(IndexError::UnsupportedLabel {
                dtype: other.dtype(),
            }),
        }
    }
}

impl fmt::Display for IndexLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int64(v) => write!(f, "{v}"),
            Self::Utf8(v) => write!(f, "{v}"),
        }
    }
}

/// Ordered row labels, optionally named after the column they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    labels: Vec<IndexLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl Index {
    #[must_use]
    pub fn new(labels: Vec<IndexLabel>) -> Self {
        Self { labels, name: None }
    }

    /// Default positional labels `0..len`.
    #[must_use]
    pub fn range(len: usize) -> Self {
        Self::new((0..len as i64).map(IndexLabel::Int64).collect())
    }

    #[must_use]
    pub fn from_i64(values: Vec<i64>) -> Self {
        Self::new(values.into_iter().map(IndexLabel::from).collect())
    }

    #[must_use]
    pub fn from_utf8(values: Vec<String>) -> Self {
        Self::new(values.into_iter().map(IndexLabel::from).collect())
    }

    pub fn from_scalars(values: &[Scalar]) -> Result<Self, IndexError> {
        let labels = values
            .iter()
            .map(IndexLabel::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(labels))
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[must_use]
    pub fn labels(&self) -> &[IndexLabel] {
        &self.labels
    }

    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        let mut seen = HashMap::<&IndexLabel, ()>::with_capacity(self.labels.len());
        for label in &self.labels {
            if seen.insert(label, ()).is_some() {
                return true;
            }
        }
        false
    }

    #[must_use]
    pub fn position(&self, needle: &IndexLabel) -> Option<usize> {
        self.labels.iter().position(|label| label == needle)
    }

    #[must_use]
    pub fn position_map_first(&self) -> HashMap<IndexLabel, usize> {
        let mut positions = HashMap::with_capacity(self.labels.len());
        for (idx, label) in self.labels.iter().enumerate() {
            positions.entry(label.clone()).or_insert(idx);
        }
        positions
    }

    /// Keep labels whose mask bit is set; the name survives.
    pub fn filter(&self, mask: &[bool]) -> Result<Self, IndexError> {
        if mask.len() != self.labels.len() {
            return Err(IndexError::MaskLengthMismatch {
                index_len: self.labels.len(),
                mask_len: mask.len(),
            });
        }
        let labels = self
            .labels
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(label, _)| label.clone())
            .collect();
        Ok(Self {
            labels,
            name: self.name.clone(),
        })
    }

    /// Position of each of `self`'s labels inside `target`.
    #[must_use]
    pub fn positions_in(&self, target: &Index) -> Vec<Option<usize>> {
        let target_positions = target.position_map_first();
        self.labels
            .iter()
            .map(|label| target_positions.get(label).copied())
            .collect()
    }

    #[must_use]
    pub fn to_scalars(&self) -> Vec<Scalar> {
        self.labels.iter().map(IndexLabel::to_scalar).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentPlan {
    pub union_index: Index,
    pub left_positions: Vec<Option<usize>>,
    pub right_positions: Vec<Option<usize>>,
}

impl AlignmentPlan {
    /// True when both sides already line up row-for-row.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.left_positions
            .iter()
            .zip(&self.right_positions)
            .enumerate()
            .all(|(pos, (left, right))| *left == Some(pos) && *right == Some(pos))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("alignment vectors must have equal lengths")]
    InvalidAlignmentVectors,
    #[error("mask length ({mask_len}) does not match index length ({index_len})")]
    MaskLengthMismatch { index_len: usize, mask_len: usize },
    #[error("values of dtype {dtype:?} cannot be used as index labels")]
    UnsupportedLabel { dtype: DType },
}

pub fn align_union(left: &Index, right: &Index) -> AlignmentPlan {
    if left.labels == right.labels && !left.has_duplicates() {
        let positions: Vec<Option<usize>> = (0..left.len()).map(Some).collect();
        return AlignmentPlan {
            union_index: Index::new(left.labels.clone()),
            left_positions: positions.clone(),
            right_positions: positions,
        };
    }

    let left_positions_map = left.position_map_first();
    let right_positions_map = right.position_map_first();

    let mut union_labels = left.labels.clone();
    for label in &right.labels {
        if !left_positions_map.contains_key(label) {
            union_labels.push(label.clone());
        }
    }

    let left_positions = union_labels
        .iter()
        .map(|label| left_positions_map.get(label).copied())
        .collect();

    let right_positions = union_labels
        .iter()
        .map(|label| right_positions_map.get(label).copied())
        .collect();

    AlignmentPlan {
        union_index: Index::new(union_labels),
        left_positions,
        right_positions,
    }
}

pub fn validate_alignment_plan(plan: &AlignmentPlan) -> Result<(), IndexError> {
    if plan.left_positions.len() != plan.right_positions.len()
        || plan.left_positions.len() != plan.union_index.len()
    {
        return Err(IndexError::InvalidAlignmentVectors);
    }

    Ok(())
}
