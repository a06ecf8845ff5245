//! The data table: columns, tuples, the active query and their statistics
//!
//! [`DataTable`] is the single writer for everything it owns. Every mutating
//! call runs to completion, including statistics recomputation, before it
//! notifies listeners and returns.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info};

use datatable_stats::Histogram2D;

use crate::column::{Column, ColumnExtents, ColumnId, ColumnKind, Extent};
use crate::config::DataTableConfig;
use crate::error::{get_index, DataTableError, DataTableResult};
use crate::event::{DataTableEvent, DataTableListener, ListenerId, Listeners};
use crate::query::Query;
use crate::selection::{ColumnSelection, SelectionId, SelectionKind};
use crate::statistics::{
    compute_column_statistics, extract_column_data, ColumnStatistics, Histogram2DSet,
};
use crate::tuple::Tuple;
use crate::value::Value;

/// How column metadata follows the data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetadataUpdate {
    /// Fill in missing extents, append unseen categories
    Initialize,
    /// Reset scale extents and category lists to the surviving data
    Rebuild,
}

/// In-memory multivariate table
///
/// Tuples are aligned positionally with the enabled column list; values of
/// disabled columns live in each tuple's disabled list, aligned with the
/// disabled column list.
///
/// Listeners must not call back into the table; the table is mutably
/// borrowed for the whole notification.
#[derive(Debug)]
pub struct DataTable {
    config: DataTableConfig,
    columns: Vec<Column>,
    disabled_columns: Vec<Column>,
    tuples: Vec<Tuple>,
    focus_rows: Vec<usize>,
    context_rows: Vec<usize>,
    active_query: Query,
    query_counter: u32,
    num_histogram_bins: usize,
    highlighted_column: Option<ColumnId>,
    histograms2d: Histogram2DSet,
    listeners: Listeners,
}

impl Default for DataTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DataTable {
    /// Create an empty table with the default configuration
    pub fn new() -> Self {
        Self::from_valid_config(DataTableConfig::default())
    }

    /// Create an empty table, rejecting an invalid configuration
    pub fn with_config(config: DataTableConfig) -> DataTableResult<Self> {
        config
            .validate()
            .map_err(|e| DataTableError::invalid(e.to_string()))?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: DataTableConfig) -> Self {
        let num_histogram_bins = config.default_num_histogram_bins;
        let active_query = Query::new("Q1", num_histogram_bins, &config);
        Self {
            config,
            columns: Vec::new(),
            disabled_columns: Vec::new(),
            tuples: Vec::new(),
            focus_rows: Vec::new(),
            context_rows: Vec::new(),
            active_query,
            query_counter: 1,
            num_histogram_bins,
            highlighted_column: None,
            histograms2d: Histogram2DSet::default(),
            listeners: Listeners::default(),
        }
    }

    pub fn config(&self) -> &DataTableConfig {
        &self.config
    }

    // ---- listeners ----

    pub fn add_listener<L>(&mut self, listener: L) -> ListenerId
    where
        L: DataTableListener + 'static,
    {
        self.listeners.add(Box::new(listener))
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn notify(&mut self, event: DataTableEvent) {
        debug!("DataTable event: {}", event.name());
        self.listeners.notify(&event);
    }

    // ---- loading ----

    /// Replace all state with `tuples` over `columns`
    ///
    /// Every tuple must hold one value per column, of the column's kind.
    /// Numeric and temporal columns without preset extents take them from
    /// the data; categorical columns collect their categories.
    pub fn set_data(&mut self, tuples: Vec<Tuple>, columns: Vec<Column>) -> DataTableResult<()> {
        if columns.is_empty() {
            return Err(DataTableError::invalid("set_data requires at least one column"));
        }
        let schema: Vec<&Column> = columns.iter().collect();
        for (row, tuple) in tuples.iter().enumerate() {
            if !tuple.disabled_elements().is_empty() {
                return Err(DataTableError::invalid(format!(
                    "tuple {} carries disabled values",
                    row
                )));
            }
            check_row(row, tuple.elements(), &schema)?;
        }

        self.columns = columns;
        for column in &mut self.columns {
            column.set_enabled(true);
            column.set_statistics(None);
        }
        self.disabled_columns.clear();
        self.tuples = tuples;
        self.highlighted_column = None;
        self.num_histogram_bins = self.config.bins_for_row_count(self.tuples.len());
        self.query_counter = 0;
        self.active_query = self.next_query();

        self.update_column_metadata(MetadataUpdate::Initialize);
        self.update_focus_context();
        self.calculate_statistics();
        self.refresh_query();

        info!(
            "Loaded {} tuples with {} columns ({} histogram bins)",
            self.tuples.len(),
            self.columns.len(),
            self.num_histogram_bins
        );
        self.debug_check_alignment();
        self.notify(DataTableEvent::Reset);
        Ok(())
    }

    /// Append tuples
    ///
    /// Each tuple holds values for the enabled columns followed by the
    /// disabled columns. The active query is not re-evaluated: new rows stay
    /// outside the partition until [`DataTable::recompute_query`] is called.
    pub fn add_tuples(&mut self, tuples: Vec<Tuple>) -> DataTableResult<()> {
        if tuples.is_empty() {
            return Ok(());
        }
        let schema: Vec<&Column> = self.columns.iter().chain(&self.disabled_columns).collect();
        for (row, tuple) in tuples.iter().enumerate() {
            check_row(self.tuples.len() + row, tuple.elements(), &schema)?;
        }

        let count = tuples.len();
        let enabled_count = self.columns.len();
        self.tuples.extend(
            tuples
                .into_iter()
                .map(|t| Tuple::split(t.into_elements(), enabled_count)),
        );

        self.update_column_metadata(MetadataUpdate::Initialize);
        self.update_focus_context();
        self.calculate_statistics();

        debug!("Added {} tuples ({} total)", count, self.tuples.len());
        self.notify(DataTableEvent::TuplesAdded { count });
        Ok(())
    }

    /// Drop every column, tuple and selection
    pub fn clear(&mut self) {
        self.columns.clear();
        self.disabled_columns.clear();
        self.tuples.clear();
        self.focus_rows.clear();
        self.context_rows.clear();
        self.highlighted_column = None;
        self.histograms2d = Histogram2DSet::default();
        self.num_histogram_bins = self.config.default_num_histogram_bins;
        self.active_query = self.next_query();

        debug!("Cleared table");
        self.notify(DataTableEvent::Reset);
    }

    // ---- tuples ----

    pub fn tuples(&self) -> &[Tuple] {
        &self.tuples
    }

    pub fn tuple_count(&self) -> usize {
        self.tuples.len()
    }

    pub fn tuple(&self, index: usize) -> DataTableResult<&Tuple> {
        get_index(&self.tuples, index)
    }

    /// Rows whose every element is inside its column's focus extent
    pub fn focus_rows(&self) -> &[usize] {
        &self.focus_rows
    }

    /// Rows with at least one element outside its column's focus extent
    pub fn context_rows(&self) -> &[usize] {
        &self.context_rows
    }

    pub fn focus_tuples(&self) -> impl Iterator<Item = &Tuple> + '_ {
        self.focus_rows.iter().filter_map(|&row| self.tuples.get(row))
    }

    pub fn context_tuples(&self) -> impl Iterator<Item = &Tuple> + '_ {
        self.context_rows.iter().filter_map(|&row| self.tuples.get(row))
    }

    /// Discard the queried rows; returns how many were removed
    ///
    /// Without selections nothing is removed.
    pub fn remove_selected_tuples(&mut self) -> usize {
        if !self.active_query.has_column_selections() {
            return 0;
        }
        self.refresh_if_stale();
        let doomed = self.active_query.queried_rows().to_vec();
        self.remove_tuples(&doomed)
    }

    /// Discard the non-queried rows; returns how many were removed
    pub fn remove_unselected_tuples(&mut self) -> usize {
        if !self.active_query.has_column_selections() {
            return 0;
        }
        self.refresh_if_stale();
        let doomed = self.active_query.non_queried_rows().to_vec();
        self.remove_tuples(&doomed)
    }

    fn remove_tuples(&mut self, rows: &[usize]) -> usize {
        let doomed: HashSet<usize> = rows.iter().copied().collect();
        let mut row = 0;
        self.tuples.retain(|_| {
            let keep = !doomed.contains(&row);
            row += 1;
            keep
        });
        let count = doomed.len();

        self.active_query = self.next_query();
        self.update_column_metadata(MetadataUpdate::Rebuild);
        self.update_focus_context();
        self.calculate_statistics();
        self.refresh_query();

        debug!("Removed {} tuples ({} remain)", count, self.tuples.len());
        self.debug_check_alignment();
        self.notify(DataTableEvent::TuplesRemoved { count });
        count
    }

    // ---- columns ----

    /// Enabled columns in display order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, index: usize) -> DataTableResult<&Column> {
        get_index(&self.columns, index)
    }

    pub fn disabled_columns(&self) -> &[Column] {
        &self.disabled_columns
    }

    pub fn disabled_column_count(&self) -> usize {
        self.disabled_columns.len()
    }

    pub fn disabled_column(&self, index: usize) -> DataTableResult<&Column> {
        get_index(&self.disabled_columns, index)
    }

    /// Position of an enabled column
    pub fn column_index(&self, id: ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| c.id() == id)
    }

    /// Enabled or disabled column by id
    pub fn column_by_id(&self, id: ColumnId) -> Option<&Column> {
        self.columns
            .iter()
            .chain(&self.disabled_columns)
            .find(|c| c.id() == id)
    }

    /// First enabled or disabled column with this name
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .chain(&self.disabled_columns)
            .find(|c| c.name() == name)
    }

    fn columns_where(&self, predicate: impl Fn(&Column) -> bool) -> Vec<&Column> {
        self.columns
            .iter()
            .chain(&self.disabled_columns)
            .filter(|c| predicate(*c))
            .collect()
    }

    /// Numeric columns, enabled first
    pub fn numeric_columns(&self) -> Vec<&Column> {
        self.columns_where(Column::is_numeric)
    }

    pub fn temporal_columns(&self) -> Vec<&Column> {
        self.columns_where(Column::is_temporal)
    }

    pub fn categorical_columns(&self) -> Vec<&Column> {
        self.columns_where(Column::is_categorical)
    }

    /// The first image column, if any
    pub fn image_column(&self) -> Option<&Column> {
        self.columns
            .iter()
            .chain(&self.disabled_columns)
            .find(|c| c.is_image())
    }

    /// Every tuple's value in enabled column `index`
    pub fn column_values(&self, index: usize) -> DataTableResult<Vec<&Value>> {
        get_index(&self.columns, index)?;
        Ok(self.tuples.iter().filter_map(|t| t.element(index)).collect())
    }

    /// Queried tuples' values in enabled column `index`
    pub fn column_queried_values(&self, index: usize) -> DataTableResult<Vec<&Value>> {
        get_index(&self.columns, index)?;
        Ok(self
            .active_query
            .queried_rows()
            .iter()
            .filter_map(|&row| self.tuples.get(row).and_then(|t| t.element(index)))
            .collect())
    }

    /// Rename an enabled or disabled column
    pub fn set_column_name(&mut self, id: ColumnId, name: impl Into<String>) -> bool {
        let Some(column) = self
            .columns
            .iter_mut()
            .chain(&mut self.disabled_columns)
            .find(|c| c.id() == id)
        else {
            return false;
        };
        column.set_name(name.into());

        debug!("Renamed column {}", id);
        self.notify(DataTableEvent::ColumnNameChanged { column: id });
        true
    }

    pub fn highlighted_column(&self) -> Option<&Column> {
        self.highlighted_column
            .and_then(|id| self.columns.iter().find(|c| c.id() == id))
    }

    /// Highlight an enabled column, or clear the highlight with `None`
    ///
    /// Returns `false` when nothing changed.
    pub fn set_highlighted_column(&mut self, column: Option<ColumnId>) -> bool {
        if column == self.highlighted_column {
            return false;
        }
        if let Some(id) = column {
            if self.column_index(id).is_none() {
                return false;
            }
        }

        let old = std::mem::replace(&mut self.highlighted_column, column);
        self.notify(DataTableEvent::HighlightedColumnChanged { old, new: column });
        true
    }

    /// Move an enabled column and its values to the disabled lists
    ///
    /// Selections on the column are dropped from the active query.
    pub fn disable_column(&mut self, id: ColumnId) -> bool {
        if !self.disable_without_notify(id) {
            return false;
        }
        self.after_column_set_change();

        debug!("Disabled column {}", id);
        self.notify(DataTableEvent::ColumnDisabled { column: id });
        true
    }

    /// Disable several columns with a single notification
    ///
    /// Returns how many were disabled.
    pub fn disable_columns(&mut self, ids: &[ColumnId]) -> usize {
        let disabled: Vec<ColumnId> = ids
            .iter()
            .copied()
            .filter(|&id| self.disable_without_notify(id))
            .collect();
        if disabled.is_empty() {
            return 0;
        }
        self.after_column_set_change();

        debug!("Disabled {} columns", disabled.len());
        let count = disabled.len();
        self.notify(DataTableEvent::ColumnsDisabled { columns: disabled });
        count
    }

    fn disable_without_notify(&mut self, id: ColumnId) -> bool {
        let Some(index) = self.column_index(id) else {
            return false;
        };

        let mut column = self.columns.remove(index);
        column.set_enabled(false);
        column.set_statistics(None);
        column.clear_focus_context();
        for tuple in &mut self.tuples {
            tuple.disable_element(index);
        }
        self.disabled_columns.push(column);

        self.active_query.remove_selections_for_column(id);
        if self.highlighted_column == Some(id) {
            self.highlighted_column = None;
        }
        true
    }

    /// Move a disabled column back; it is appended after the enabled columns
    ///
    /// Selections dropped when it was disabled are not restored.
    pub fn enable_column(&mut self, id: ColumnId) -> bool {
        let Some(index) = self.disabled_columns.iter().position(|c| c.id() == id) else {
            return false;
        };

        let mut column = self.disabled_columns.remove(index);
        column.set_enabled(true);
        for tuple in &mut self.tuples {
            tuple.enable_element(index);
        }
        self.columns.push(column);
        self.after_column_set_change();

        debug!("Enabled column {}", id);
        self.notify(DataTableEvent::ColumnEnabled { column: id });
        true
    }

    fn after_column_set_change(&mut self) {
        self.update_focus_context();
        self.calculate_statistics();
        self.refresh_query();
        self.debug_check_alignment();
    }

    /// Reorder the enabled columns
    ///
    /// `order` must name every enabled column exactly once. Values and
    /// correlation rows are permuted; statistics are not recomputed.
    pub fn change_column_order(&mut self, order: &[ColumnId]) -> DataTableResult<()> {
        if order.len() != self.columns.len() {
            return Err(DataTableError::invalid(format!(
                "column order names {} columns, table has {}",
                order.len(),
                self.columns.len()
            )));
        }
        let mut source = Vec::with_capacity(order.len());
        for id in order {
            let index = self
                .column_index(*id)
                .ok_or_else(|| DataTableError::not_found(format!("column {}", id)))?;
            if source.contains(&index) {
                return Err(DataTableError::invalid(format!(
                    "column {} appears twice in the new order",
                    id
                )));
            }
            source.push(index);
        }

        let mut old: Vec<Option<Column>> = self.columns.drain(..).map(Some).collect();
        for &index in &source {
            if let Some(column) = old[index].take() {
                self.columns.push(column);
            }
        }
        for column in &mut self.columns {
            if let Some(statistics) = column.statistics_mut() {
                statistics.permute_correlations(&source);
            }
        }
        for tuple in &mut self.tuples {
            tuple.permute(&source);
        }
        self.active_query.permute_correlations(&source);
        // Column positions changed; row sets per column did not
        self.rebuild_table_focus_rows();

        debug!("Changed column order");
        self.debug_check_alignment();
        self.notify(DataTableEvent::ColumnOrderChanged);
        Ok(())
    }

    /// Move one enabled column in front of the column now at `new_index`
    ///
    /// An index at or past the column count moves it to the end.
    pub fn move_column(&mut self, id: ColumnId, new_index: usize) -> DataTableResult<bool> {
        let Some(current) = self.column_index(id) else {
            return Ok(false);
        };
        let mut new_index = new_index.min(self.columns.len());
        // Removing the column shifts everything after it left by one
        if current < new_index {
            new_index -= 1;
        }
        if new_index == current {
            return Ok(false);
        }

        let mut order: Vec<ColumnId> = self.columns.iter().map(Column::id).collect();
        order.remove(current);
        order.insert(new_index, id);
        self.change_column_order(&order)?;
        Ok(true)
    }

    /// Insert a column pairing the values of enabled columns `x` and `y`
    ///
    /// Named "`y` vs. `x`"; `index` is clamped to the column count. Returns
    /// `None` when either source column is not enabled.
    pub fn add_bivariate_column(
        &mut self,
        x: ColumnId,
        y: ColumnId,
        index: usize,
    ) -> Option<ColumnId> {
        let x_index = self.column_index(x)?;
        let y_index = self.column_index(y)?;
        let name = format!(
            "{} vs. {}",
            self.columns[y_index].name(),
            self.columns[x_index].name()
        );
        let index = index.min(self.columns.len());

        let column = Column::bivariate(name, x, y);
        let id = column.id();
        for tuple in &mut self.tuples {
            let pair = match (tuple.element(x_index), tuple.element(y_index)) {
                (Some(a), Some(b)) => Value::pair(a.clone(), b.clone()),
                _ => continue,
            };
            tuple.insert_element(index, pair);
        }
        self.columns.insert(index, column);
        self.after_column_set_change();

        debug!("Added bivariate column {} at {}", id, index);
        self.notify(DataTableEvent::BivariateColumnAdded { column: id, index });
        Some(id)
    }

    // ---- extents ----

    /// Set the scale extent of numeric columns
    ///
    /// With `set_focus` the focus extent is reset to the new scale; otherwise
    /// it is clamped into it.
    pub fn set_numeric_column_scale_extents(
        &mut self,
        ids: &[ColumnId],
        min: f64,
        max: f64,
        set_focus: bool,
    ) -> DataTableResult<()> {
        check_numeric_extent(min, max)?;
        self.set_scale_extents(ids, |kind| match kind {
            ColumnKind::Numeric(extents) => {
                Some(apply_scale(extents, Extent::new(min, max), set_focus))
            }
            _ => None,
        });
        Ok(())
    }

    /// Set the scale extent of temporal columns; a focus extent reaching
    /// outside it is clamped
    pub fn set_temporal_column_scale_extents(
        &mut self,
        ids: &[ColumnId],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DataTableResult<()> {
        check_temporal_extent(start, end)?;
        self.set_scale_extents(ids, |kind| match kind {
            ColumnKind::Temporal(extents) => {
                Some(apply_scale(extents, Extent::new(start, end), false))
            }
            _ => None,
        });
        Ok(())
    }

    /// `apply` returns `None` for columns of the wrong kind, otherwise
    /// whether the focus extent moved
    fn set_scale_extents<F>(&mut self, ids: &[ColumnId], mut apply: F)
    where
        F: FnMut(&mut ColumnKind) -> Option<bool>,
    {
        let mut changed = Vec::new();
        let mut focus_changed = false;
        for column in self.columns.iter_mut().chain(&mut self.disabled_columns) {
            if !ids.contains(&column.id()) {
                continue;
            }
            if let Some(moved) = apply(column.kind_mut()) {
                focus_changed |= moved;
                changed.push(column.id());
            }
        }
        if changed.is_empty() {
            return;
        }
        if focus_changed {
            self.update_focus_context();
            self.calculate_statistics();
            self.refresh_query();
        }

        debug!("Set scale extents of {} columns", changed.len());
        self.notify(DataTableEvent::ColumnExtentsChanged { columns: changed });
    }

    /// Set a numeric column's focus extent, clamped to its scale extent
    ///
    /// Range selections on the column entirely outside the new focus are
    /// removed; overhanging ones are clipped to it.
    pub fn set_numeric_column_focus_extents(
        &mut self,
        id: ColumnId,
        min: f64,
        max: f64,
    ) -> DataTableResult<()> {
        check_numeric_extent(min, max)?;
        let Some(index) = self.column_index(id) else {
            return Ok(());
        };
        let ColumnKind::Numeric(extents) = self.columns[index].kind_mut() else {
            return Ok(());
        };
        let Extent { min, max } = apply_focus(extents, Extent::new(min, max));

        self.reconcile_selections(id, |kind| match kind {
            SelectionKind::NumericRange { min: lo, max: hi } => {
                clip_range(*lo, *hi, min, max).map(|(lo, hi)| SelectionKind::NumericRange {
                    min: lo,
                    max: hi,
                })
            }
            other => Some(other.clone()),
        });
        Ok(())
    }

    /// Set a temporal column's focus extent, clamped to its scale extent,
    /// reconciling its selections
    pub fn set_temporal_column_focus_extents(
        &mut self,
        id: ColumnId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DataTableResult<()> {
        check_temporal_extent(start, end)?;
        let Some(index) = self.column_index(id) else {
            return Ok(());
        };
        let ColumnKind::Temporal(extents) = self.columns[index].kind_mut() else {
            return Ok(());
        };
        let Extent {
            min: start,
            max: end,
        } = apply_focus(extents, Extent::new(start, end));

        self.reconcile_selections(id, |kind| match kind {
            SelectionKind::TemporalRange { start: lo, end: hi } => clip_range(*lo, *hi, start, end)
                .map(|(lo, hi)| SelectionKind::TemporalRange { start: lo, end: hi }),
            other => Some(other.clone()),
        });
        Ok(())
    }

    /// Apply `clip` to each selection on `column`; `None` removes it
    fn reconcile_selections<F>(&mut self, column: ColumnId, clip: F)
    where
        F: Fn(&SelectionKind) -> Option<SelectionKind>,
    {
        let mut removed = Vec::new();
        let selections: Vec<ColumnSelection> = self
            .active_query
            .column_selections(column)
            .into_iter()
            .cloned()
            .collect();
        for selection in selections {
            match clip(selection.kind()) {
                Some(kind) => {
                    if &kind != selection.kind() {
                        self.active_query.set_selection_kind(selection.id(), kind);
                    }
                }
                None => {
                    if let Some(gone) = self.active_query.remove_selection(selection.id()) {
                        removed.push(gone);
                    }
                }
            }
        }

        self.update_focus_context();
        self.calculate_statistics();
        self.refresh_query();

        debug!("Set focus extents of column {}", column);
        if !removed.is_empty() {
            self.notify(DataTableEvent::SelectionsRemoved { selections: removed });
        }
        self.notify(DataTableEvent::ColumnFocusExtentsChanged { column });
    }

    // ---- selections ----

    pub fn active_query(&self) -> &Query {
        &self.active_query
    }

    /// Add a selection to the active query and re-evaluate it
    ///
    /// The selection's column must be enabled and of a kind the predicate
    /// applies to.
    pub fn add_column_selection(&mut self, selection: ColumnSelection) -> DataTableResult<SelectionId> {
        let column = self
            .columns
            .iter()
            .find(|c| c.id() == selection.column())
            .ok_or_else(|| DataTableError::not_found(format!("column {}", selection.column())))?;
        if !selection.kind().applies_to(column.kind()) {
            return Err(DataTableError::invalid(format!(
                "selection does not apply to {} column '{}'",
                column.kind().name(),
                column.name()
            )));
        }
        selection.kind().validate()?;

        let id = selection.id();
        self.active_query.add_selection(selection.clone());
        self.refresh_query();

        debug!("Added selection {}", id);
        self.notify(DataTableEvent::SelectionAdded { selection });
        Ok(id)
    }

    /// Replace a selection's predicate
    ///
    /// An emptied categorical or image set removes the selection instead.
    pub fn update_column_selection(&mut self, id: SelectionId, kind: SelectionKind) -> DataTableResult<()> {
        let selection = self
            .active_query
            .selection(id)
            .ok_or_else(|| DataTableError::not_found(format!("selection {}", id)))?;
        let column = self
            .columns
            .iter()
            .find(|c| c.id() == selection.column())
            .ok_or_else(|| DataTableError::not_found(format!("column {}", selection.column())))?;
        if !kind.applies_to(column.kind()) {
            return Err(DataTableError::invalid(format!(
                "selection does not apply to {} column '{}'",
                column.kind().name(),
                column.name()
            )));
        }
        kind.validate()?;

        if kind.is_empty_set() {
            self.remove_column_selection(id);
            return Ok(());
        }

        self.active_query.set_selection_kind(id, kind);
        self.refresh_query();
        let Some(selection) = self.active_query.selection(id).cloned() else {
            return Err(DataTableError::not_found(format!("selection {}", id)));
        };

        debug!("Changed selection {}", id);
        self.notify(DataTableEvent::SelectionChanged { selection });
        Ok(())
    }

    pub fn remove_column_selection(&mut self, id: SelectionId) -> Option<ColumnSelection> {
        let selection = self.active_query.remove_selection(id)?;
        self.refresh_query();

        debug!("Removed selection {}", id);
        self.notify(DataTableEvent::SelectionRemoved {
            selection: selection.clone(),
        });
        Some(selection)
    }

    /// Remove several selections with a single notification
    pub fn remove_column_selections(&mut self, ids: &[SelectionId]) -> Vec<ColumnSelection> {
        let removed: Vec<ColumnSelection> = ids
            .iter()
            .filter_map(|&id| self.active_query.remove_selection(id))
            .collect();
        if removed.is_empty() {
            return removed;
        }
        self.refresh_query();

        debug!("Removed {} selections", removed.len());
        self.notify(DataTableEvent::SelectionsRemoved {
            selections: removed.clone(),
        });
        removed
    }

    pub fn remove_column_selections_for_column(&mut self, column: ColumnId) -> Vec<ColumnSelection> {
        let removed = self.active_query.remove_selections_for_column(column);
        if removed.is_empty() {
            return removed;
        }
        self.refresh_query();

        debug!("Removed all selections on column {}", column);
        self.notify(DataTableEvent::AllSelectionsForColumnRemoved { column });
        removed
    }

    /// Replace the active query with an empty one
    pub fn remove_all_column_selections(&mut self) {
        if !self.active_query.has_column_selections() {
            return;
        }
        self.active_query = self.next_query();
        self.refresh_query();

        debug!("Removed all selections; active query is {}", self.active_query.id());
        self.notify(DataTableEvent::AllSelectionsRemoved);
    }

    /// Re-evaluate the active query against every tuple
    pub fn recompute_query(&mut self) {
        self.refresh_query();
        self.notify(DataTableEvent::StatisticsChanged);
    }

    /// Whether tuples were added since the query was last evaluated
    pub fn query_is_stale(&self) -> bool {
        self.active_query.is_stale(self.tuples.len())
    }

    pub fn queried_rows(&self) -> &[usize] {
        self.active_query.queried_rows()
    }

    pub fn non_queried_rows(&self) -> &[usize] {
        self.active_query.non_queried_rows()
    }

    pub fn queried_tuples(&self) -> impl Iterator<Item = &Tuple> + '_ {
        self.queried_rows()
            .iter()
            .filter_map(|&row| self.tuples.get(row))
    }

    // ---- statistics ----

    pub fn num_histogram_bins(&self) -> usize {
        self.num_histogram_bins
    }

    /// Change the bin count of every histogram, overall and queried
    pub fn set_num_histogram_bins(&mut self, num_bins: usize) -> DataTableResult<()> {
        if num_bins == 0 {
            return Err(DataTableError::invalid("histogram bin count must be positive"));
        }
        if num_bins == self.num_histogram_bins {
            return Ok(());
        }

        self.num_histogram_bins = num_bins;
        self.calculate_statistics();
        self.active_query.set_num_histogram_bins(num_bins);
        self.active_query
            .calculate_statistics(&self.columns, &self.tuples);

        debug!("Histogram bins set to {}", num_bins);
        self.notify(DataTableEvent::NumHistogramBinsChanged { num_bins });
        Ok(())
    }

    pub fn is_calculating_query_statistics(&self) -> bool {
        self.config.calculate_query_statistics
    }

    pub fn set_calculate_query_statistics(&mut self, enabled: bool) {
        if enabled == self.config.calculate_query_statistics {
            return;
        }
        self.config.calculate_query_statistics = enabled;
        self.active_query.set_calculate_statistics(enabled);
        self.active_query
            .calculate_statistics(&self.columns, &self.tuples);
        self.notify(DataTableEvent::StatisticsChanged);
    }

    pub fn is_calculating_non_query_statistics(&self) -> bool {
        self.config.calculate_non_query_statistics
    }

    pub fn set_calculate_non_query_statistics(&mut self, enabled: bool) {
        if enabled == self.config.calculate_non_query_statistics {
            return;
        }
        self.config.calculate_non_query_statistics = enabled;
        self.active_query.set_calculate_non_query_statistics(enabled);
        self.active_query
            .calculate_statistics(&self.columns, &self.tuples);
        self.notify(DataTableEvent::StatisticsChanged);
    }

    /// Overall statistics of an enabled column
    pub fn column_statistics(&self, id: ColumnId) -> Option<&ColumnStatistics> {
        self.columns
            .iter()
            .find(|c| c.id() == id)
            .and_then(Column::statistics)
    }

    /// Statistics of an enabled column over the queried rows
    pub fn query_statistics(&self, id: ColumnId) -> Option<&ColumnStatistics> {
        self.active_query.statistics(id)
    }

    /// Statistics of an enabled column over the non-queried rows
    pub fn non_query_statistics(&self, id: ColumnId) -> Option<&ColumnStatistics> {
        self.active_query.non_query_statistics(id)
    }

    /// Joint histogram of two enabled columns over every row
    pub fn histogram2d(&self, x: ColumnId, y: ColumnId) -> Option<&Histogram2D> {
        self.histograms2d.get(x, y)
    }

    /// Largest cell across the overall joint histograms
    pub fn max_histogram2d_bin_count(&self) -> usize {
        self.histograms2d.max_bin_count()
    }

    // ---- invariants ----

    /// Check that every tuple is aligned with both column lists and that the
    /// query partition covers every evaluated row exactly once
    pub fn verify_alignment(&self) -> DataTableResult<()> {
        for (row, tuple) in self.tuples.iter().enumerate() {
            if tuple.element_count() != self.columns.len()
                || tuple.disabled_elements().len() != self.disabled_columns.len()
            {
                return Err(DataTableError::InvariantViolation {
                    message: format!(
                        "tuple {} has {}+{} values for {}+{} columns",
                        row,
                        tuple.element_count(),
                        tuple.disabled_elements().len(),
                        self.columns.len(),
                        self.disabled_columns.len()
                    ),
                });
            }
        }

        if !self.query_is_stale() {
            let queried = self.active_query.queried_rows();
            let non_queried = self.active_query.non_queried_rows();
            if queried.len() + non_queried.len() != self.tuples.len()
                || queried.iter().any(|row| non_queried.binary_search(row).is_ok())
            {
                return Err(DataTableError::InvariantViolation {
                    message: format!(
                        "query partition {}+{} does not cover {} tuples",
                        queried.len(),
                        non_queried.len(),
                        self.tuples.len()
                    ),
                });
            }
        }
        Ok(())
    }

    fn debug_check_alignment(&self) {
        debug_assert_eq!(self.verify_alignment(), Ok(()));
    }

    // ---- recomputation ----

    fn next_query(&mut self) -> Query {
        self.query_counter += 1;
        Query::new(
            format!("Q{}", self.query_counter),
            self.num_histogram_bins,
            &self.config,
        )
    }

    fn refresh_query(&mut self) {
        self.active_query
            .set_queried_tuples(&self.columns, &self.tuples);
    }

    fn refresh_if_stale(&mut self) {
        if self.query_is_stale() {
            self.refresh_query();
        }
    }

    /// Recompute every enabled column's overall statistics and the overall
    /// joint histograms
    fn calculate_statistics(&mut self) {
        let start = Instant::now();
        let rows: Vec<usize> = (0..self.tuples.len()).collect();
        let data = extract_column_data(&self.columns, &self.tuples, &rows);
        let computed =
            compute_column_statistics(&self.columns, &data, &rows, self.num_histogram_bins);
        for (column, statistics) in self.columns.iter_mut().zip(computed) {
            column.set_statistics(Some(statistics));
        }

        self.histograms2d = if self.config.calculate_histogram2d {
            Histogram2DSet::compute(&self.columns, &data, self.num_histogram_bins)
        } else {
            Histogram2DSet::default()
        };

        info!(
            "Calculated statistics for {} columns over {} tuples in {:?}",
            self.columns.len(),
            rows.len(),
            start.elapsed()
        );
    }

    /// Reclassify every element as focus or context
    fn update_focus_context(&mut self) {
        for column in &mut self.columns {
            column.clear_focus_context();
        }
        for (row, tuple) in self.tuples.iter_mut().enumerate() {
            for (index, column) in self.columns.iter_mut().enumerate() {
                let in_focus = match tuple.element(index) {
                    Some(value) => column.set_focus_context(row, value),
                    None => true,
                };
                tuple.set_element_focus(index, in_focus);
            }
        }
        self.rebuild_table_focus_rows();
    }

    fn rebuild_table_focus_rows(&mut self) {
        self.focus_rows.clear();
        self.context_rows.clear();
        for (row, tuple) in self.tuples.iter().enumerate() {
            if tuple.is_in_focus() {
                self.focus_rows.push(row);
            } else {
                self.context_rows.push(row);
            }
        }
    }

    /// Bring extents and category lists in line with the tuples
    fn update_column_metadata(&mut self, update: MetadataUpdate) {
        let tuples = &self.tuples;
        let lists = [
            (false, &mut self.columns),
            (true, &mut self.disabled_columns),
        ];
        for (disabled, columns) in lists {
            for (index, column) in columns.iter_mut().enumerate() {
                let values = tuples.iter().filter_map(move |t| {
                    if disabled {
                        t.disabled_element(index)
                    } else {
                        t.element(index)
                    }
                });

                if column.is_categorical() {
                    if update == MetadataUpdate::Rebuild {
                        column.clear_categories();
                    }
                    for label in values.filter_map(Value::as_categorical) {
                        column.add_category(label);
                    }
                    continue;
                }

                match column.kind_mut() {
                    ColumnKind::Numeric(extents) => {
                        update_extents(extents, numeric_data_range(values), update)
                    }
                    ColumnKind::Temporal(extents) => {
                        update_extents(extents, temporal_data_range(values), update)
                    }
                    _ => {}
                }
            }
        }
    }
}

fn check_row(row: usize, values: &[Value], schema: &[&Column]) -> DataTableResult<()> {
    if values.len() != schema.len() {
        return Err(DataTableError::invalid(format!(
            "tuple {} has {} values for {} columns",
            row,
            values.len(),
            schema.len()
        )));
    }
    for (value, column) in values.iter().zip(schema) {
        if !value.fits(column.kind()) {
            return Err(DataTableError::invalid(format!(
                "tuple {} has a {} value for {} column '{}'",
                row,
                value.kind_name(),
                column.kind().name(),
                column.name()
            )));
        }
    }
    Ok(())
}

fn check_numeric_extent(min: f64, max: f64) -> DataTableResult<()> {
    if min.is_nan() || max.is_nan() || min > max {
        return Err(DataTableError::invalid(format!(
            "invalid numeric extent [{}, {}]",
            min, max
        )));
    }
    Ok(())
}

fn check_temporal_extent(start: DateTime<Utc>, end: DateTime<Utc>) -> DataTableResult<()> {
    if start > end {
        return Err(DataTableError::invalid(format!(
            "invalid temporal extent {} .. {}",
            start, end
        )));
    }
    Ok(())
}

/// Set the scale extent, resetting or clamping the focus into it; returns
/// whether the focus changed
fn apply_scale<T: PartialOrd + Copy>(
    extents: &mut ColumnExtents<T>,
    scale: Extent<T>,
    set_focus: bool,
) -> bool {
    extents.scale = Some(scale);
    let focus = match extents.focus {
        Some(focus) if !set_focus => focus.clamped_to(&scale),
        _ => scale,
    };
    let changed = extents.focus != Some(focus);
    extents.focus = Some(focus);
    changed
}

/// Store `focus` clamped into the scale extent; returns the stored focus
fn apply_focus<T: PartialOrd + Copy>(
    extents: &mut ColumnExtents<T>,
    focus: Extent<T>,
) -> Extent<T> {
    let focus = match extents.scale {
        Some(scale) => focus.clamped_to(&scale),
        None => focus,
    };
    extents.focus = Some(focus);
    focus
}

fn update_extents<T: PartialOrd + Copy>(
    extents: &mut ColumnExtents<T>,
    data_range: Option<Extent<T>>,
    update: MetadataUpdate,
) {
    match update {
        MetadataUpdate::Initialize => extents.initialize(data_range),
        MetadataUpdate::Rebuild => extents.reset_scale(data_range),
    }
}

/// Clip `[lo, hi]` into `[min, max]`; `None` when they do not overlap
fn clip_range<T: PartialOrd + Copy>(lo: T, hi: T, min: T, max: T) -> Option<(T, T)> {
    if hi < min || lo > max {
        return None;
    }
    let lo = if lo < min { min } else { lo };
    let hi = if hi > max { max } else { hi };
    Some((lo, hi))
}

fn numeric_data_range<'a>(values: impl Iterator<Item = &'a Value>) -> Option<Extent<f64>> {
    values
        .filter_map(Value::as_numeric)
        .filter(|v| v.is_finite())
        .fold(None, |range: Option<Extent<f64>>, v| {
            Some(match range {
                Some(r) => Extent::new(r.min.min(v), r.max.max(v)),
                None => Extent::new(v, v),
            })
        })
}

fn temporal_data_range<'a>(
    values: impl Iterator<Item = &'a Value>,
) -> Option<Extent<DateTime<Utc>>> {
    values
        .filter_map(Value::as_temporal)
        .fold(None, |range: Option<Extent<DateTime<Utc>>>, t| {
            Some(match range {
                Some(r) => Extent::new(r.min.min(t), r.max.max(t)),
                None => Extent::new(t, t),
            })
        })
}
