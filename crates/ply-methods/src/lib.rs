#![forbid(unsafe_code)]

//! Query methods over frames, series and grouped views.
//!
//! Conditions and column values are given as a [`Source`]: a deferred
//! expression over [`Value`], a plain function, or a constant. Expressions
//! are written against [`x()`], the first positional argument, which the
//! methods bind to the input they were called on:
//!
//! ```ignore
//! frame.ply_where([x().attr("month").eq_to(1)])?
//!     .ply_select(&["*"], Assignments::new().assign("gain", x().attr("arr") - x().attr("dep")))?;
//! ```

use ply_columnar::ColumnError;
use ply_frame::FrameError;
use ply_groupby::GroupByError;
use ply_index::IndexError;
use ply_symbolic::{Expression, SymbolKey, SymbolicError};
use ply_types::TypeError;
use thiserror::Error;

pub mod builtins;
mod methods;
mod selection;
mod value;

pub use methods::{
    Assignments, INDEX, IntoSource, PlyFrameExt, PlyGroupByExt, PlySeriesExt, function,
    ply_select, where_frame, where_series,
};
pub use ply_symbolic::Source;
pub use selection::Selection;
pub use value::{Function, Method, Value};

/// Expressions over host values.
pub type Expr = Expression<Value>;

/// The symbol bound to the first positional argument.
#[must_use]
pub fn x() -> Expr {
    Expression::symbol(0_usize)
}

#[must_use]
pub fn sym(key: impl Into<SymbolKey>) -> Expr {
    Expression::symbol(key)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectError {
    #[error("select received a repeated wildcard")]
    RepeatedWildcard,
    #[error("select received an unknown column directive: {0:?}")]
    UnknownColumn(String),
    #[error("select received column-excludes without a wildcard")]
    ExcludeWithoutWildcard,
    #[error("select received both a wildcard and column-includes")]
    WildcardWithIncludes,
    #[error("select received overlapping column-includes and column-excludes: {0:?}")]
    OverlappingIncludeExclude(String),
    #[error("select received a repeated column directive: {0:?}")]
    RepeatedColumn(String),
}

#[derive(Debug, Error)]
pub enum PlyError {
    #[error(transparent)]
    Symbolic(#[from] SymbolicError),
    #[error(transparent)]
    Select(#[from] SelectError),
    #[error("condition did not evaluate to a boolean mask (got {found})")]
    NonBooleanMask { found: String },
    #[error("cannot assign {found} to {target:?}")]
    Unassignable { target: String, found: String },
    #[error("{op}: {reason}")]
    InvalidArgument { op: String, reason: String },
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    GroupBy(#[from] GroupByError),
    #[error(transparent)]
    Column(#[from] ColumnError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Type(#[from] TypeError),
}

impl PlyError {
    pub(crate) fn invalid(op: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            op: op.to_owned(),
            reason: reason.into(),
        }
    }
}
