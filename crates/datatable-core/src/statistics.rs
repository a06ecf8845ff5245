//! Per-column statistics
//!
//! Statistics are computed from a list of rows: every row for the table's
//! overall statistics, or the queried/non-queried rows for a query. Numeric
//! and temporal histograms bin over the column's focus extent so overall and
//! query histograms of the same column share their bins.
//!
//! # Parallel Processing
//!
//! When the `parallel` feature is enabled, columns are processed on the rayon
//! thread pool.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use datatable_stats::{
    correlation_row, CategoricalHistogram, CategoricalSummary, Histogram2D, Histogram2DDimension,
    NumericHistogram, NumericSummary, TemporalHistogram, TemporalSummary,
};

use crate::column::{Column, ColumnId, ColumnKind};
use crate::tuple::Tuple;
use crate::value::Value;

/// Statistics of a numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStatistics {
    pub summary: NumericSummary,
    /// `None` when there is no finite value to bin
    pub histogram: Option<NumericHistogram>,
    /// Pearson coefficient against every column, in column order; NaN for
    /// non-numeric columns
    pub correlations: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalStatistics {
    pub summary: TemporalSummary,
    /// `None` when the range has no duration
    pub histogram: Option<TemporalHistogram>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalStatistics {
    pub summary: CategoricalSummary,
    pub histogram: CategoricalHistogram,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageStatistics {
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BivariateStatistics {
    pub count: usize,
    /// Joint histogram of the two source values
    pub histogram: Option<Histogram2D>,
}

/// Statistics for one column over some set of rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnStatistics {
    Numeric(NumericStatistics),
    Temporal(TemporalStatistics),
    Categorical(CategoricalStatistics),
    Image(ImageStatistics),
    Bivariate(BivariateStatistics),
}

impl ColumnStatistics {
    /// Number of non-missing values
    pub fn count(&self) -> usize {
        match self {
            Self::Numeric(s) => s.summary.count,
            Self::Temporal(s) => s.summary.count,
            Self::Categorical(s) => s.summary.count,
            Self::Image(s) => s.count,
            Self::Bivariate(s) => s.count,
        }
    }

    pub fn as_numeric(&self) -> Option<&NumericStatistics> {
        match self {
            Self::Numeric(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_temporal(&self) -> Option<&TemporalStatistics> {
        match self {
            Self::Temporal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_categorical(&self) -> Option<&CategoricalStatistics> {
        match self {
            Self::Categorical(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bivariate(&self) -> Option<&BivariateStatistics> {
        match self {
            Self::Bivariate(s) => Some(s),
            _ => None,
        }
    }

    /// Largest 1-D histogram bin; 0 for kinds without one
    pub fn max_histogram_bin_count(&self) -> usize {
        match self {
            Self::Numeric(s) => s.histogram.as_ref().map_or(0, |h| h.max_bin_count()),
            Self::Temporal(s) => s.histogram.as_ref().map_or(0, |h| h.max_bin_count()),
            Self::Categorical(s) => s.histogram.max_bin_count(),
            Self::Image(_) | Self::Bivariate(_) => 0,
        }
    }

    /// Reorder the correlation row after a column reorder
    pub(crate) fn permute_correlations(&mut self, order: &[usize]) {
        if let Self::Numeric(s) = self {
            if s.correlations.len() == order.len() {
                s.correlations = order.iter().map(|&i| s.correlations[i]).collect();
            }
        }
    }
}

/// One column's values over a row list, aligned with that list
pub(crate) enum ColumnData<'a> {
    /// NaN where the value is missing
    Numeric(Vec<f64>),
    Temporal(Vec<Option<DateTime<Utc>>>),
    Categorical(Vec<Option<&'a str>>),
    Image(Vec<Option<&'a str>>),
    Pair(Vec<Option<(&'a Value, &'a Value)>>),
}

impl ColumnData<'_> {
    fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Self::Numeric(values) => Some(values.as_slice()),
            _ => None,
        }
    }
}

/// Gather each column's values for `rows`
pub(crate) fn extract_column_data<'a>(
    columns: &[Column],
    tuples: &'a [Tuple],
    rows: &[usize],
) -> Vec<ColumnData<'a>> {
    columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let cells = rows
                .iter()
                .map(move |&row| tuples.get(row).and_then(|t| t.element(index)));
            match column.kind() {
                ColumnKind::Numeric(_) => ColumnData::Numeric(
                    cells
                        .map(|v| v.and_then(Value::as_numeric).unwrap_or(f64::NAN))
                        .collect(),
                ),
                ColumnKind::Temporal(_) => {
                    ColumnData::Temporal(cells.map(|v| v.and_then(Value::as_temporal)).collect())
                }
                ColumnKind::Categorical { .. } => ColumnData::Categorical(
                    cells.map(|v| v.and_then(Value::as_categorical)).collect(),
                ),
                ColumnKind::Image => {
                    ColumnData::Image(cells.map(|v| v.and_then(Value::as_image)).collect())
                }
                ColumnKind::Bivariate { .. } => {
                    ColumnData::Pair(cells.map(|v| v.and_then(Value::as_pair)).collect())
                }
            }
        })
        .collect()
}

/// Compute statistics for every column over `rows`
///
/// `data` must come from [`extract_column_data`] with the same columns and rows.
pub(crate) fn compute_column_statistics(
    columns: &[Column],
    data: &[ColumnData<'_>],
    rows: &[usize],
    num_bins: usize,
) -> Vec<ColumnStatistics> {
    let numeric: Vec<Option<&[f64]>> = data.iter().map(ColumnData::as_numeric).collect();

    #[cfg(feature = "parallel")]
    let statistics = columns
        .par_iter()
        .zip(data.par_iter())
        .enumerate()
        .map(|(index, (column, values))| {
            statistics_for(column, index, values, rows, num_bins, &numeric)
        })
        .collect();

    #[cfg(not(feature = "parallel"))]
    let statistics = columns
        .iter()
        .zip(data.iter())
        .enumerate()
        .map(|(index, (column, values))| {
            statistics_for(column, index, values, rows, num_bins, &numeric)
        })
        .collect();

    statistics
}

fn statistics_for(
    column: &Column,
    index: usize,
    data: &ColumnData<'_>,
    rows: &[usize],
    num_bins: usize,
    numeric: &[Option<&[f64]>],
) -> ColumnStatistics {
    match data {
        ColumnData::Numeric(values) => {
            let summary = NumericSummary::from_data(values);
            let histogram = numeric_range(column, &summary).and_then(|(lo, hi)| {
                let binned = rows.iter().copied().zip(values.iter().copied());
                match NumericHistogram::from_rows(binned, num_bins, lo, hi) {
                    Ok(histogram) => Some(histogram),
                    Err(e) => {
                        warn!("No histogram for column '{}': {}", column.name(), e);
                        None
                    }
                }
            });
            ColumnStatistics::Numeric(NumericStatistics {
                summary,
                histogram,
                correlations: correlation_row(numeric, index),
            })
        }
        ColumnData::Temporal(values) => {
            let present: Vec<DateTime<Utc>> = values.iter().flatten().copied().collect();
            let summary = TemporalSummary::from_data(&present);
            let histogram = temporal_range(column, &summary).and_then(|(start, end)| {
                let binned = rows
                    .iter()
                    .zip(values)
                    .filter_map(|(&row, v)| v.map(|t| (row, t)));
                match TemporalHistogram::from_rows(binned, num_bins, start, end) {
                    Ok(histogram) => Some(histogram),
                    Err(e) => {
                        warn!("No histogram for column '{}': {}", column.name(), e);
                        None
                    }
                }
            });
            ColumnStatistics::Temporal(TemporalStatistics { summary, histogram })
        }
        ColumnData::Categorical(values) => {
            let present: Vec<&str> = values.iter().flatten().copied().collect();
            let summary = CategoricalSummary::from_data(&present, column.categories());
            let binned = rows
                .iter()
                .zip(values)
                .filter_map(|(&row, v)| v.map(|label| (row, label)));
            let histogram = CategoricalHistogram::from_rows(binned, column.categories());
            ColumnStatistics::Categorical(CategoricalStatistics { summary, histogram })
        }
        ColumnData::Image(values) => ColumnStatistics::Image(ImageStatistics {
            count: values.iter().flatten().count(),
        }),
        ColumnData::Pair(pairs) => {
            let present: Vec<(&Value, &Value)> = pairs.iter().flatten().copied().collect();
            ColumnStatistics::Bivariate(BivariateStatistics {
                count: present.len(),
                histogram: pair_histogram(&present, num_bins),
            })
        }
    }
}

/// Histogram range of a numeric column: focus extent, else the overall data range
fn numeric_range(column: &Column, summary: &NumericSummary) -> Option<(f64, f64)> {
    if let Some(focus) = column.numeric_extents().and_then(|e| e.focus) {
        return Some((focus.min, focus.max));
    }
    let overall = column
        .statistics()
        .and_then(ColumnStatistics::as_numeric)
        .map(|s| &s.summary)
        .filter(|s| !s.is_empty())
        .unwrap_or(summary);
    (!overall.is_empty()).then_some((overall.min, overall.max))
}

fn temporal_range(
    column: &Column,
    summary: &TemporalSummary,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    if let Some(focus) = column.temporal_extents().and_then(|e| e.focus) {
        return Some((focus.min, focus.max));
    }
    let overall = column
        .statistics()
        .and_then(ColumnStatistics::as_temporal)
        .map(|s| &s.summary)
        .filter(|s| !s.is_empty())
        .unwrap_or(summary);
    overall.start.zip(overall.end)
}

/// Binning of one side of a pair, derived from the values themselves
fn pair_dimension<'a, I>(values: I, num_bins: usize) -> Option<Histogram2DDimension>
where
    I: Iterator<Item = &'a Value> + Clone,
{
    match values.clone().next()? {
        Value::Numeric(_) => {
            let finite = values.filter_map(Value::as_numeric).filter(|v| v.is_finite());
            let (lo, hi) = finite.fold(None, |acc: Option<(f64, f64)>, v| {
                Some(acc.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))))
            })?;
            Histogram2DDimension::numeric(lo, hi, num_bins).ok()
        }
        Value::Temporal(_) => {
            let instants = values.filter_map(Value::as_temporal);
            let start = instants.clone().min()?;
            let end = instants.max()?;
            Histogram2DDimension::temporal(start, end, num_bins).ok()
        }
        Value::Categorical(_) => {
            let mut categories: Vec<String> = Vec::new();
            for label in values.filter_map(Value::as_categorical) {
                if !categories.iter().any(|c| c == label) {
                    categories.push(label.to_string());
                }
            }
            Some(Histogram2DDimension::categorical(categories))
        }
        Value::Image(_) | Value::Pair(_, _) => None,
    }
}

fn value_bin(dimension: &Histogram2DDimension, value: &Value) -> Option<usize> {
    match value {
        Value::Numeric(v) => dimension.numeric_bin(*v),
        Value::Temporal(t) => dimension.temporal_bin(*t),
        Value::Categorical(label) => dimension.categorical_bin(label),
        Value::Image(_) | Value::Pair(_, _) => None,
    }
}

fn pair_histogram(pairs: &[(&Value, &Value)], num_bins: usize) -> Option<Histogram2D> {
    let x_dim = pair_dimension(pairs.iter().map(|(x, _)| *x), num_bins)?;
    let y_dim = pair_dimension(pairs.iter().map(|(_, y)| *y), num_bins)?;
    let x_bins: Vec<Option<usize>> = pairs.iter().map(|(x, _)| value_bin(&x_dim, x)).collect();
    let y_bins: Vec<Option<usize>> = pairs.iter().map(|(_, y)| value_bin(&y_dim, y)).collect();
    Histogram2D::from_bin_indices(x_dim, &x_bins, y_dim, &y_bins).ok()
}

/// Joint histograms keyed by `(x column, y column)`, both orientations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Histogram2DSet {
    histograms: HashMap<(ColumnId, ColumnId), Histogram2D>,
    max_bin_count: usize,
}

impl Histogram2DSet {
    pub fn get(&self, x: ColumnId, y: ColumnId) -> Option<&Histogram2D> {
        self.histograms.get(&(x, y))
    }

    /// Largest cell count across every stored histogram
    pub fn max_bin_count(&self) -> usize {
        self.max_bin_count
    }

    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }

    /// Histograms for every ordered pair of binnable columns
    ///
    /// Numeric and temporal columns bin over their focus extent, falling back
    /// to the overall data range; categorical columns bin by category.
    pub(crate) fn compute(columns: &[Column], data: &[ColumnData<'_>], num_bins: usize) -> Self {
        let binned: Vec<Option<(Histogram2DDimension, Vec<Option<usize>>)>> = columns
            .iter()
            .zip(data)
            .map(|(column, values)| column_bins(column, values, num_bins))
            .collect();

        let mut set = Self::default();
        for (i, x) in binned.iter().enumerate() {
            let Some((x_dim, x_bins)) = x else { continue };
            for (j, y) in binned.iter().enumerate().skip(i + 1) {
                let Some((y_dim, y_bins)) = y else { continue };
                let Ok(histogram) =
                    Histogram2D::from_bin_indices(x_dim.clone(), x_bins, y_dim.clone(), y_bins)
                else {
                    continue;
                };

                set.max_bin_count = set.max_bin_count.max(histogram.max_bin_count());
                let (x_id, y_id) = (columns[i].id(), columns[j].id());
                set.histograms.insert((y_id, x_id), histogram.transposed());
                set.histograms.insert((x_id, y_id), histogram);
            }
        }
        set
    }
}

fn column_bins(
    column: &Column,
    data: &ColumnData<'_>,
    num_bins: usize,
) -> Option<(Histogram2DDimension, Vec<Option<usize>>)> {
    match data {
        ColumnData::Numeric(values) => {
            let summary = NumericSummary::from_data(values);
            let (lo, hi) = numeric_range(column, &summary)?;
            let dim = Histogram2DDimension::numeric(lo, hi, num_bins).ok()?;
            let bins = values.iter().map(|&v| dim.numeric_bin(v)).collect();
            Some((dim, bins))
        }
        ColumnData::Temporal(values) => {
            let present: Vec<DateTime<Utc>> = values.iter().flatten().copied().collect();
            let (start, end) = temporal_range(column, &TemporalSummary::from_data(&present))?;
            let dim = Histogram2DDimension::temporal(start, end, num_bins).ok()?;
            let bins = values
                .iter()
                .map(|v| v.and_then(|t| dim.temporal_bin(t)))
                .collect();
            Some((dim, bins))
        }
        ColumnData::Categorical(values) => {
            let dim = Histogram2DDimension::categorical(column.categories().to_vec());
            let bins = values
                .iter()
                .map(|v| v.and_then(|label| dim.categorical_bin(label)))
                .collect();
            Some((dim, bins))
        }
        ColumnData::Image(_) | ColumnData::Pair(_) => None,
    }
}
