//! Change notifications
//!
//! Every successful mutation of a [`crate::DataTable`] emits exactly one
//! [`DataTableEvent`] to each registered listener, after the table has
//! reached its new consistent state. Listeners run synchronously on the
//! mutating thread in registration order.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::column::ColumnId;
use crate::selection::ColumnSelection;

/// Handle returned when registering a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub Uuid);

impl ListenerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// What changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataTableEvent {
    /// New data replaced everything, or the table was cleared
    Reset,
    TuplesAdded { count: usize },
    TuplesRemoved { count: usize },
    ColumnDisabled { column: ColumnId },
    ColumnsDisabled { columns: Vec<ColumnId> },
    ColumnEnabled { column: ColumnId },
    ColumnOrderChanged,
    ColumnNameChanged { column: ColumnId },
    HighlightedColumnChanged {
        old: Option<ColumnId>,
        new: Option<ColumnId>,
    },
    /// Scale extents of one or more columns were set
    ColumnExtentsChanged { columns: Vec<ColumnId> },
    ColumnFocusExtentsChanged { column: ColumnId },
    SelectionAdded { selection: ColumnSelection },
    SelectionChanged { selection: ColumnSelection },
    SelectionRemoved { selection: ColumnSelection },
    SelectionsRemoved { selections: Vec<ColumnSelection> },
    AllSelectionsForColumnRemoved { column: ColumnId },
    AllSelectionsRemoved,
    NumHistogramBinsChanged { num_bins: usize },
    /// Statistics were recomputed without any structural change
    StatisticsChanged,
    BivariateColumnAdded { column: ColumnId, index: usize },
}

impl DataTableEvent {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::TuplesAdded { .. } => "tuples_added",
            Self::TuplesRemoved { .. } => "tuples_removed",
            Self::ColumnDisabled { .. } => "column_disabled",
            Self::ColumnsDisabled { .. } => "columns_disabled",
            Self::ColumnEnabled { .. } => "column_enabled",
            Self::ColumnOrderChanged => "column_order_changed",
            Self::ColumnNameChanged { .. } => "column_name_changed",
            Self::HighlightedColumnChanged { .. } => "highlighted_column_changed",
            Self::ColumnExtentsChanged { .. } => "column_extents_changed",
            Self::ColumnFocusExtentsChanged { .. } => "column_focus_extents_changed",
            Self::SelectionAdded { .. } => "selection_added",
            Self::SelectionChanged { .. } => "selection_changed",
            Self::SelectionRemoved { .. } => "selection_removed",
            Self::SelectionsRemoved { .. } => "selections_removed",
            Self::AllSelectionsForColumnRemoved { .. } => "all_selections_for_column_removed",
            Self::AllSelectionsRemoved => "all_selections_removed",
            Self::NumHistogramBinsChanged { .. } => "num_histogram_bins_changed",
            Self::StatisticsChanged => "statistics_changed",
            Self::BivariateColumnAdded { .. } => "bivariate_column_added",
        }
    }
}

/// Receives table change notifications
///
/// Any `FnMut(&DataTableEvent)` closure is a listener.
pub trait DataTableListener {
    fn on_event(&mut self, event: &DataTableEvent);
}

impl<F> DataTableListener for F
where
    F: FnMut(&DataTableEvent),
{
    fn on_event(&mut self, event: &DataTableEvent) {
        self(event)
    }
}

/// Registered listeners in registration order
#[derive(Default)]
pub(crate) struct Listeners {
    entries: Vec<(ListenerId, Box<dyn DataTableListener>)>,
}

impl Listeners {
    pub(crate) fn add(&mut self, listener: Box<dyn DataTableListener>) -> ListenerId {
        let id = ListenerId::new();
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn notify(&mut self, event: &DataTableEvent) {
        for (_, listener) in &mut self.entries {
            listener.on_event(event);
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}
