#![forbid(unsafe_code)]

//! dplyr-style query methods for frames, series and groupings.
//!
//! Conditions and computed columns are written as deferred expressions over
//! [`x()`], which stands for whatever value the method was called on:
//!
//! ```ignore
//! use pandas_ply::prelude::*;
//!
//! let delays = flights
//!     .groupby("dest")?
//!     .ply_select(
//!         Assignments::new()
//!             .assign("arr_delay", x().attr("arr_delay").method("mean", vec![]))
//!             .assign("size", x().method("size", vec![])),
//!     )?
//!     .ply_where([x().attr("size").gt(1000_i64)])?;
//! ```
//!
//! The symbolic engine lives in [`symbolic`] and is independent of the
//! tabular types; any host implementing [`symbolic::Dynamic`] can use it.

pub use ply_columnar::{ArithmeticOp, Column, ComparisonOp, LogicalOp};
pub use ply_frame::{DataFrame, FrameError, Series};
pub use ply_groupby::{DataFrameGroupBy, GroupByError, GroupByExt, GroupByOptions, SeriesGroupBy};
pub use ply_index::{Index, IndexError, IndexLabel};
pub use ply_methods::{
    Assignments, Expr, Function, INDEX, IntoSource, Method, PlyError, PlyFrameExt, PlyGroupByExt,
    PlySeriesExt, SelectError, Selection, Source, Value, builtins, function, ply_select, sym,
    where_frame, where_series, x,
};
pub use ply_types::{DType, NullKind, Scalar, TypeError};

/// The generic expression engine.
pub mod symbolic {
    pub use ply_symbolic::{
        Callable, Context, Dynamic, EvalOptions, Expression, Kwargs, Node, Operand, SymbolKey,
        SymbolicError, build_context, ops, sym_call, to_callable,
    };
}

pub mod prelude {
    pub use crate::builtins;
    pub use crate::symbolic::{Kwargs, Operand, sym_call};
    pub use crate::{
        Assignments, DataFrame, Expr, Function, GroupByExt, Index, IntoSource, PlyError,
        PlyFrameExt, PlyGroupByExt, PlySeriesExt, Scalar, Series, Value, function, sym, x,
    };
}
