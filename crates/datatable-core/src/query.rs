//! The active query: a set of column selections and the tuple partition
//! they induce
//!
//! A row is queried when, for every column that has selections, its value
//! satisfies at least one of them. With no selections every row is queried.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use datatable_stats::Histogram2D;

use crate::column::{Column, ColumnId};
use crate::config::DataTableConfig;
use crate::selection::{ColumnSelection, SelectionId, SelectionKind};
use crate::statistics::{
    compute_column_statistics, extract_column_data, ColumnStatistics, Histogram2DSet,
};
use crate::tuple::Tuple;

/// Selections plus the queried/non-queried partition and its statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    id: String,
    selections: Vec<ColumnSelection>,
    queried_rows: Vec<usize>,
    non_queried_rows: Vec<usize>,
    /// Tuple count when the partition was last evaluated
    evaluated_tuple_count: usize,
    num_histogram_bins: usize,
    calculate_statistics: bool,
    calculate_non_query_statistics: bool,
    calculate_histogram2d: bool,
    statistics: HashMap<ColumnId, ColumnStatistics>,
    non_query_statistics: HashMap<ColumnId, ColumnStatistics>,
    histograms2d: Histogram2DSet,
}

impl Query {
    pub fn new(id: impl Into<String>, num_histogram_bins: usize, config: &DataTableConfig) -> Self {
        Self {
            id: id.into(),
            selections: Vec::new(),
            queried_rows: Vec::new(),
            non_queried_rows: Vec::new(),
            evaluated_tuple_count: 0,
            num_histogram_bins,
            calculate_statistics: config.calculate_query_statistics,
            calculate_non_query_statistics: config.calculate_non_query_statistics,
            calculate_histogram2d: config.calculate_histogram2d,
            statistics: HashMap::new(),
            non_query_statistics: HashMap::new(),
            histograms2d: Histogram2DSet::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn selections(&self) -> &[ColumnSelection] {
        &self.selections
    }

    pub fn selection(&self, id: SelectionId) -> Option<&ColumnSelection> {
        self.selections.iter().find(|s| s.id() == id)
    }

    /// Selections on one column, in insertion order
    pub fn column_selections(&self, column: ColumnId) -> Vec<&ColumnSelection> {
        self.selections
            .iter()
            .filter(|s| s.column() == column)
            .collect()
    }

    pub fn has_column_selections(&self) -> bool {
        !self.selections.is_empty()
    }

    /// Queried rows, ascending
    pub fn queried_rows(&self) -> &[usize] {
        &self.queried_rows
    }

    /// Rows failing the query, ascending
    pub fn non_queried_rows(&self) -> &[usize] {
        &self.non_queried_rows
    }

    pub fn is_queried(&self, row: usize) -> bool {
        self.queried_rows.binary_search(&row).is_ok()
    }

    /// Whether rows were added since the partition was last evaluated
    pub fn is_stale(&self, tuple_count: usize) -> bool {
        self.evaluated_tuple_count != tuple_count
    }

    pub fn num_histogram_bins(&self) -> usize {
        self.num_histogram_bins
    }

    pub fn is_calculating_statistics(&self) -> bool {
        self.calculate_statistics
    }

    pub fn is_calculating_non_query_statistics(&self) -> bool {
        self.calculate_non_query_statistics
    }

    /// Statistics of a column over the queried rows
    pub fn statistics(&self, column: ColumnId) -> Option<&ColumnStatistics> {
        self.statistics.get(&column)
    }

    /// Statistics of a column over the non-queried rows
    pub fn non_query_statistics(&self, column: ColumnId) -> Option<&ColumnStatistics> {
        self.non_query_statistics.get(&column)
    }

    /// Joint histogram of the queried rows
    pub fn histogram2d(&self, x: ColumnId, y: ColumnId) -> Option<&Histogram2D> {
        self.histograms2d.get(x, y)
    }

    pub fn histograms2d(&self) -> &Histogram2DSet {
        &self.histograms2d
    }

    pub fn max_histogram2d_bin_count(&self) -> usize {
        self.histograms2d.max_bin_count()
    }

    pub(crate) fn add_selection(&mut self, selection: ColumnSelection) {
        self.selections.push(selection);
    }

    pub(crate) fn remove_selection(&mut self, id: SelectionId) -> Option<ColumnSelection> {
        let index = self.selections.iter().position(|s| s.id() == id)?;
        Some(self.selections.remove(index))
    }

    pub(crate) fn remove_selections_for_column(&mut self, column: ColumnId) -> Vec<ColumnSelection> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.selections)
            .into_iter()
            .partition(|s| s.column() == column);
        self.selections = kept;
        removed
    }

    pub(crate) fn set_selection_kind(&mut self, id: SelectionId, kind: SelectionKind) -> bool {
        match self.selections.iter_mut().find(|s| s.id() == id) {
            Some(selection) => {
                selection.set_kind(kind);
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_num_histogram_bins(&mut self, num_bins: usize) {
        self.num_histogram_bins = num_bins;
    }

    pub(crate) fn set_calculate_statistics(&mut self, enabled: bool) {
        self.calculate_statistics = enabled;
    }

    pub(crate) fn set_calculate_non_query_statistics(&mut self, enabled: bool) {
        self.calculate_non_query_statistics = enabled;
    }

    pub(crate) fn permute_correlations(&mut self, order: &[usize]) {
        for statistics in self
            .statistics
            .values_mut()
            .chain(self.non_query_statistics.values_mut())
        {
            statistics.permute_correlations(order);
        }
    }

    /// Re-partition `tuples` against the selections, then recompute statistics
    ///
    /// Selections on columns not in `columns` impose no constraint.
    pub(crate) fn set_queried_tuples(&mut self, columns: &[Column], tuples: &[Tuple]) {
        let mut constraints: Vec<(usize, Vec<&SelectionKind>)> = Vec::new();
        for selection in &self.selections {
            let Some(index) = columns.iter().position(|c| c.id() == selection.column()) else {
                continue;
            };
            match constraints.iter_mut().find(|(i, _)| *i == index) {
                Some((_, kinds)) => kinds.push(selection.kind()),
                None => constraints.push((index, vec![selection.kind()])),
            }
        }

        let mut queried = Vec::new();
        let mut non_queried = Vec::new();
        for (row, tuple) in tuples.iter().enumerate() {
            let passes = constraints.iter().all(|(index, kinds)| {
                tuple
                    .element(*index)
                    .map_or(false, |value| kinds.iter().any(|k| k.contains(value)))
            });
            if passes {
                queried.push(row);
            } else {
                non_queried.push(row);
            }
        }

        self.queried_rows = queried;
        self.non_queried_rows = non_queried;
        self.evaluated_tuple_count = tuples.len();
        self.calculate_statistics(columns, tuples);
    }

    /// Recompute queried (and optionally non-queried) statistics
    pub(crate) fn calculate_statistics(&mut self, columns: &[Column], tuples: &[Tuple]) {
        self.statistics.clear();
        self.non_query_statistics.clear();
        self.histograms2d = Histogram2DSet::default();

        if self.calculate_statistics {
            let data = extract_column_data(columns, tuples, &self.queried_rows);
            let computed =
                compute_column_statistics(columns, &data, &self.queried_rows, self.num_histogram_bins);
            self.statistics = columns.iter().map(Column::id).zip(computed).collect();
            if self.calculate_histogram2d {
                self.histograms2d = Histogram2DSet::compute(columns, &data, self.num_histogram_bins);
            }
        }

        if self.calculate_non_query_statistics {
            let data = extract_column_data(columns, tuples, &self.non_queried_rows);
            let computed = compute_column_statistics(
                columns,
                &data,
                &self.non_queried_rows,
                self.num_histogram_bins,
            );
            self.non_query_statistics = columns.iter().map(Column::id).zip(computed).collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn table() -> (Vec<Column>, Vec<Tuple>) {
        let columns = vec![
            Column::numeric("A").with_numeric_extent(1.0, 5.0),
            Column::categorical("B").with_categories(["x", "y", "z"]),
        ];
        let tuples = [(1.0, "x"), (2.0, "x"), (3.0, "y"), (4.0, "y"), (5.0, "z")]
            .iter()
            .map(|&(a, b)| Tuple::new(vec![Value::Numeric(a), Value::from(b)]))
            .collect();
        (columns, tuples)
    }

    fn query() -> Query {
        Query::new("Q1", 5, &DataTableConfig::default())
    }

    #[test]
    fn test_no_selections_queries_everything() {
        let (columns, tuples) = table();
        let mut query = query();
        query.set_queried_tuples(&columns, &tuples);

        assert_eq!(query.queried_rows(), &[0, 1, 2, 3, 4]);
        assert!(query.non_queried_rows().is_empty());
        assert!(!query.is_stale(5));
    }

    #[test]
    fn test_or_within_column_and_across_columns() {
        let (columns, tuples) = table();
        let a = columns[0].id();
        let b = columns[1].id();
        let mut query = query();
        query.add_selection(ColumnSelection::numeric_range(a, 1.0, 1.5));
        query.add_selection(ColumnSelection::numeric_range(a, 3.5, 5.0));
        query.add_selection(ColumnSelection::categorical(b, ["x", "y"]));
        query.set_queried_tuples(&columns, &tuples);

        assert_eq!(query.queried_rows(), &[0, 3]);
        assert_eq!(query.non_queried_rows(), &[1, 2, 4]);
        assert!(query.is_queried(3));
        assert!(!query.is_queried(4));
    }

    #[test]
    fn test_query_statistics_keyed_by_column() {
        let (columns, tuples) = table();
        let a = columns[0].id();
        let b = columns[1].id();
        let mut query = query();
        query.add_selection(ColumnSelection::numeric_range(a, 2.0, 4.0));
        query.set_queried_tuples(&columns, &tuples);

        let counts = query
            .statistics(b)
            .and_then(ColumnStatistics::as_categorical)
            .map(|s| s.histogram.counts())
            .unwrap();
        assert_eq!(counts.get("x"), Some(&1));
        assert_eq!(counts.get("y"), Some(&2));
        assert!(query.non_query_statistics(b).is_none());
        assert!(query.histogram2d(a, b).is_some());
    }

    #[test]
    fn test_remove_selections_for_column() {
        let (columns, _) = table();
        let a = columns[0].id();
        let b = columns[1].id();
        let mut query = query();
        query.add_selection(ColumnSelection::numeric_range(a, 2.0, 4.0));
        query.add_selection(ColumnSelection::categorical(b, ["x"]));
        query.add_selection(ColumnSelection::numeric_range(a, 0.0, 1.0));

        let removed = query.remove_selections_for_column(a);
        assert_eq!(removed.len(), 2);
        assert_eq!(query.selections().len(), 1);
        assert!(query.column_selections(a).is_empty());
    }

    #[test]
    fn test_non_query_statistics_on_demand() {
        let (columns, tuples) = table();
        let a = columns[0].id();
        let mut query = query();
        query.set_calculate_non_query_statistics(true);
        query.add_selection(ColumnSelection::numeric_range(a, 4.0, 5.0));
        query.set_queried_tuples(&columns, &tuples);

        let outside = query.non_query_statistics(a).unwrap();
        assert_eq!(outside.count(), 3);
        assert_eq!(query.statistics(a).unwrap().count(), 2);
    }
}
