use ply_frame::{DataFrame, Series};
use ply_groupby::{DataFrameGroupBy, SeriesGroupBy};
use ply_index::Index;
use ply_symbolic::{Expression, Kwargs, Source, to_callable};
use ply_types::Scalar;

use crate::PlyError;
use crate::selection::Selection;
use crate::value::{Function, Value};

/// Assignment name that replaces the row labels instead of adding a column.
pub const INDEX: &str = "index";

/// Anything accepted as a condition or a column value.
pub trait IntoSource {
    fn into_source(self) -> Source<Value>;
}

impl IntoSource for Source<Value> {
    fn into_source(self) -> Source<Value> {
        self
    }
}

impl IntoSource for Expression<Value> {
    fn into_source(self) -> Source<Value> {
        Source::Expression(self)
    }
}

impl IntoSource for &Expression<Value> {
    fn into_source(self) -> Source<Value> {
        Source::Expression(self.clone())
    }
}

impl IntoSource for Value {
    fn into_source(self) -> Source<Value> {
        Source::Constant(self)
    }
}

impl IntoSource for Function {
    fn into_source(self) -> Source<Value> {
        Source::Constant(Value::Function(self))
    }
}

macro_rules! constant_source {
    ($($ty:ty),+ $(,)?) => {$(
        impl IntoSource for $ty {
            fn into_source(self) -> Source<Value> {
                Source::Constant(Value::from(self))
            }
        }
    )+};
}

constant_source!(Scalar, Series, DataFrame, i64, f64, bool, &str, String);

impl IntoSource for i32 {
    fn into_source(self) -> Source<Value> {
        Source::Constant(Value::from(i64::from(self)))
    }
}

impl IntoSource for Vec<Scalar> {
    fn into_source(self) -> Source<Value> {
        Source::Constant(Value::List(self.into_iter().map(Value::Scalar).collect()))
    }
}

impl IntoSource for Vec<bool> {
    fn into_source(self) -> Source<Value> {
        Source::Constant(Value::List(self.into_iter().map(Value::from).collect()))
    }
}

/// A plain function of the input, passed through adaptation unchanged.
pub fn function<F>(f: F) -> Source<Value>
where
    F: Fn(&Value) -> Result<Value, PlyError> + 'static,
{
    Source::function(move |args: Vec<Value>, _kwargs: Kwargs<Value>| {
        let input = args
            .first()
            .ok_or_else(|| PlyError::invalid("function", "called without an input"))?;
        f(input)
    })
}

/// Ordered named column values.
#[derive(Debug, Clone, Default)]
pub struct Assignments {
    entries: Vec<(String, Source<Value>)>,
}

impl Assignments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `name`; assigning an existing name replaces its value in place.
    #[must_use]
    pub fn assign(mut self, name: impl Into<String>, value: impl IntoSource) -> Self {
        let name = name.into();
        let value = value.into_source();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

impl<N: Into<String>, S: IntoSource> FromIterator<(N, S)> for Assignments {
    fn from_iter<I: IntoIterator<Item = (N, S)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |acc, (name, value)| acc.assign(name, value))
    }
}

fn evaluate(source: Source<Value>, input: &Value) -> Result<Value, PlyError> {
    to_callable(source)(vec![input.clone()], Kwargs::new())
}

/// AND of every condition's mask, or `None` when there are no conditions.
fn combined_mask<I>(input: &Value, index: &Index, conditions: I) -> Result<Option<Vec<bool>>, PlyError>
where
    I: IntoIterator,
    I::Item: IntoSource,
{
    let mut combined: Option<Vec<bool>> = None;
    for condition in conditions {
        let mask = evaluate(condition.into_source(), input)?.to_mask(index)?;
        combined = Some(match combined {
            None => mask,
            Some(acc) => acc.iter().zip(&mask).map(|(a, b)| *a && *b).collect(),
        });
    }
    Ok(combined)
}

/// Rows of `frame` satisfying every condition, in their original order.
pub fn where_frame<I>(frame: &DataFrame, conditions: I) -> Result<DataFrame, PlyError>
where
    I: IntoIterator,
    I::Item: IntoSource,
{
    let input = Value::Frame(frame.clone());
    let Some(mask) = combined_mask(&input, frame.index(), conditions)? else {
        return Ok(frame.clone());
    };
    let out = frame.filter_rows(&mask)?;
    tracing::debug!(rows_in = frame.len(), rows_out = out.len(), "ply_where");
    Ok(out)
}

/// Entries of `series` satisfying every condition.
pub fn where_series<I>(series: &Series, conditions: I) -> Result<Series, PlyError>
where
    I: IntoIterator,
    I::Item: IntoSource,
{
    let input = Value::Series(series.clone());
    let Some(mask) = combined_mask(&input, series.index(), conditions)? else {
        return Ok(series.clone());
    };
    let out = series.filter(&mask)?;
    tracing::debug!(rows_in = series.len(), rows_out = out.len(), "ply_where");
    Ok(out)
}

/// Project and compute columns.
///
/// Directives are validated before any assignment is evaluated. Each
/// assignment sees the original `frame`; series results are aligned to its
/// row labels. An `index` assignment relabels the rows once all columns are
/// in place.
pub fn ply_select(
    frame: &DataFrame,
    directives: &[&str],
    assignments: Assignments,
) -> Result<DataFrame, PlyError> {
    let columns: Vec<&str> = frame.column_names().collect();
    let selection = Selection::parse(directives, &columns)?;
    let mut out = frame.select_columns(&selection.resolve(&columns))?;

    let input = Value::Frame(frame.clone());
    let mut relabel = None;
    for (name, source) in assignments.entries {
        let value = evaluate(source, &input)?;
        if name == INDEX {
            relabel = Some(value);
            continue;
        }
        let column = value.into_column(&name, frame.index())?;
        out.insert_column(name, column)?;
    }
    if let Some(value) = relabel {
        out = out.with_index(value.into_index()?)?;
    }

    tracing::debug!(
        columns = ?out.column_names().collect::<Vec<_>>(),
        rows = out.len(),
        "ply_select"
    );
    Ok(out)
}

/// One row per group; every assignment is evaluated once with the grouped
/// view and must yield a per-group series, a list or a scalar.
fn grouped_select(
    input: Value,
    groups: Index,
    assignments: Assignments,
) -> Result<DataFrame, PlyError> {
    let mut out = DataFrame::empty_with_index(groups.clone());
    let mut relabel = None;
    for (name, source) in assignments.entries {
        let value = evaluate(source, &input)?;
        if name == INDEX {
            relabel = Some(value);
            continue;
        }
        let column = value.into_column(&name, &groups)?;
        out.insert_column(name, column)?;
    }
    if let Some(value) = relabel {
        out = out.with_index(value.into_index()?)?;
    }

    tracing::debug!(
        groups = out.len(),
        columns = out.num_columns(),
        "ply_select grouped"
    );
    Ok(out)
}

/// Query methods on frames.
pub trait PlyFrameExt {
    fn ply_where<I>(&self, conditions: I) -> Result<DataFrame, PlyError>
    where
        I: IntoIterator,
        I::Item: IntoSource;

    fn ply_select(&self, directives: &[&str], assignments: Assignments)
    -> Result<DataFrame, PlyError>;
}

impl PlyFrameExt for DataFrame {
    fn ply_where<I>(&self, conditions: I) -> Result<DataFrame, PlyError>
    where
        I: IntoIterator,
        I::Item: IntoSource,
    {
        where_frame(self, conditions)
    }

    fn ply_select(
        &self,
        directives: &[&str],
        assignments: Assignments,
    ) -> Result<DataFrame, PlyError> {
        ply_select(self, directives, assignments)
    }
}

pub trait PlySeriesExt {
    fn ply_where<I>(&self, conditions: I) -> Result<Series, PlyError>
    where
        I: IntoIterator,
        I::Item: IntoSource;
}

impl PlySeriesExt for Series {
    fn ply_where<I>(&self, conditions: I) -> Result<Series, PlyError>
    where
        I: IntoIterator,
        I::Item: IntoSource,
    {
        where_series(self, conditions)
    }
}

/// Grouped aggregation; `x()` is bound to the grouped view itself.
pub trait PlyGroupByExt {
    fn ply_select(&self, assignments: Assignments) -> Result<DataFrame, PlyError>;
}

impl PlyGroupByExt for DataFrameGroupBy {
    fn ply_select(&self, assignments: Assignments) -> Result<DataFrame, PlyError> {
        grouped_select(Value::GroupBy(self.clone()), self.group_index(), assignments)
    }
}

impl PlyGroupByExt for SeriesGroupBy {
    fn ply_select(&self, assignments: Assignments) -> Result<DataFrame, PlyError> {
        grouped_select(
            Value::SeriesGroupBy(self.clone()),
            self.group_index(),
            assignments,
        )
    }
}
