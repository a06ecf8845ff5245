//! Column selections
//!
//! A selection is a predicate over one column's values. The active query
//! combines selections: OR among selections on the same column, AND across
//! columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::column::{ColumnId, ColumnKind};
use crate::error::{DataTableError, DataTableResult};
use crate::value::Value;

/// Unique identifier for a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SelectionId(pub Uuid);

impl SelectionId {
    /// Create a new random selection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SelectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SelectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The predicate a selection applies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectionKind {
    /// Inclusive numeric range
    NumericRange { min: f64, max: f64 },

    /// Inclusive instant range
    TemporalRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Set of accepted category labels
    CategoricalSet { categories: BTreeSet<String> },

    /// Set of accepted image keys
    ImageSet { keys: BTreeSet<String> },
}

impl SelectionKind {
    /// Whether `value` satisfies the predicate; mismatched value kinds never do
    pub fn contains(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::NumericRange { min, max }, Value::Numeric(v)) => *v >= *min && *v <= *max,
            (Self::TemporalRange { start, end }, Value::Temporal(t)) => t >= start && t <= end,
            (Self::CategoricalSet { categories }, Value::Categorical(label)) => {
                categories.contains(label)
            }
            (Self::ImageSet { keys }, Value::Image(key)) => keys.contains(key),
            _ => false,
        }
    }

    /// Whether this predicate can be applied to a column of `kind`
    pub fn applies_to(&self, kind: &ColumnKind) -> bool {
        matches!(
            (self, kind),
            (Self::NumericRange { .. }, ColumnKind::Numeric(_))
                | (Self::TemporalRange { .. }, ColumnKind::Temporal(_))
                | (Self::CategoricalSet { .. }, ColumnKind::Categorical { .. })
                | (Self::ImageSet { .. }, ColumnKind::Image)
        )
    }

    /// A set selection with nothing in it selects nothing and is discarded
    pub fn is_empty_set(&self) -> bool {
        match self {
            Self::CategoricalSet { categories } => categories.is_empty(),
            Self::ImageSet { keys } => keys.is_empty(),
            _ => false,
        }
    }

    pub(crate) fn validate(&self) -> DataTableResult<()> {
        match self {
            Self::NumericRange { min, max } => {
                if min.is_nan() || max.is_nan() {
                    return Err(DataTableError::invalid("numeric selection bound is NaN"));
                }
                if min > max {
                    return Err(DataTableError::invalid(format!(
                        "numeric selection min {} exceeds max {}",
                        min, max
                    )));
                }
            }
            Self::TemporalRange { start, end } => {
                if start > end {
                    return Err(DataTableError::invalid(format!(
                        "temporal selection start {} is after end {}",
                        start, end
                    )));
                }
            }
            Self::CategoricalSet { .. } | Self::ImageSet { .. } => {}
        }
        Ok(())
    }
}

/// A predicate bound to a column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSelection {
    id: SelectionId,
    column: ColumnId,
    kind: SelectionKind,
}

impl ColumnSelection {
    pub fn new(column: ColumnId, kind: SelectionKind) -> Self {
        Self {
            id: SelectionId::new(),
            column,
            kind,
        }
    }

    pub fn numeric_range(column: ColumnId, min: f64, max: f64) -> Self {
        Self::new(column, SelectionKind::NumericRange { min, max })
    }

    pub fn temporal_range(column: ColumnId, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::new(column, SelectionKind::TemporalRange { start, end })
    }

    pub fn categorical<I, S>(column: ColumnId, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            column,
            SelectionKind::CategoricalSet {
                categories: categories.into_iter().map(Into::into).collect(),
            },
        )
    }

    pub fn image<I, S>(column: ColumnId, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            column,
            SelectionKind::ImageSet {
                keys: keys.into_iter().map(Into::into).collect(),
            },
        )
    }

    pub fn id(&self) -> SelectionId {
        self.id
    }

    pub fn column(&self) -> ColumnId {
        self.column
    }

    pub fn kind(&self) -> &SelectionKind {
        &self.kind
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.kind.contains(value)
    }

    pub(crate) fn set_kind(&mut self, kind: SelectionKind) {
        self.kind = kind;
    }
}
