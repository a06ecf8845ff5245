//! Columns: named, typed attributes of a table
//!
//! A column owns its kind-specific metadata (extents for ordered kinds,
//! category list for categorical), its overall statistics, and the rows it
//! currently partitions into focus and lower/upper context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::statistics::ColumnStatistics;
use crate::value::Value;

/// Unique identifier for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnId(pub Uuid);

impl ColumnId {
    /// Create a new random column ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ColumnId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ColumnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed interval `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Extent<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp both ends into `outer`
    pub fn clamped_to(&self, outer: &Extent<T>) -> Self {
        let clamp = |v: T| {
            if v < outer.min {
                outer.min
            } else if v > outer.max {
                outer.max
            } else {
                v
            }
        };
        Self {
            min: clamp(self.min),
            max: clamp(self.max),
        }
    }
}

/// Scale and focus extents of an ordered column
///
/// The scale extent is the full axis; the focus extent is the sub-range
/// treated as "in focus". Both stay `None` until data or the caller sets them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnExtents<T> {
    pub scale: Option<Extent<T>>,
    pub focus: Option<Extent<T>>,
}

impl<T> Default for ColumnExtents<T> {
    fn default() -> Self {
        Self {
            scale: None,
            focus: None,
        }
    }
}

impl<T: PartialOrd + Copy> ColumnExtents<T> {
    /// Where a value sits relative to the focus extent
    fn locate(&self, value: T) -> Placement {
        match self.focus {
            Some(focus) if value < focus.min => Placement::Lower,
            Some(focus) if value > focus.max => Placement::Upper,
            _ => Placement::Focus,
        }
    }

    /// Fill in missing extents from a data range; focus defaults to scale
    pub(crate) fn initialize(&mut self, data_range: Option<Extent<T>>) {
        if self.scale.is_none() {
            self.scale = data_range;
        }
        if self.focus.is_none() {
            self.focus = self.scale;
        }
    }

    /// Reset scale to `data_range` and pull the focus inside it
    pub(crate) fn reset_scale(&mut self, data_range: Option<Extent<T>>) {
        let Some(scale) = data_range else {
            return;
        };
        self.scale = Some(scale);
        self.focus = Some(match self.focus {
            Some(focus) => focus.clamped_to(&scale),
            None => scale,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Focus,
    Lower,
    Upper,
}

/// Kind-specific column metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric(ColumnExtents<f64>),
    Temporal(ColumnExtents<DateTime<Utc>>),
    /// Known categories in first-seen order
    Categorical { categories: Vec<String> },
    Image,
    /// Pairs drawn from two source columns
    Bivariate { x: ColumnId, y: ColumnId },
}

impl ColumnKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric",
            Self::Temporal(_) => "temporal",
            Self::Categorical { .. } => "categorical",
            Self::Image => "image",
            Self::Bivariate { .. } => "bivariate",
        }
    }
}

/// A table column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    id: ColumnId,
    name: String,
    enabled: bool,
    kind: ColumnKind,
    statistics: Option<ColumnStatistics>,
    focus_rows: Vec<usize>,
    lower_context_rows: Vec<usize>,
    upper_context_rows: Vec<usize>,
}

impl Column {
    fn with_kind(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            id: ColumnId::new(),
            name: name.into(),
            enabled: true,
            kind,
            statistics: None,
            focus_rows: Vec::new(),
            lower_context_rows: Vec::new(),
            upper_context_rows: Vec::new(),
        }
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self::with_kind(name, ColumnKind::Numeric(ColumnExtents::default()))
    }

    pub fn temporal(name: impl Into<String>) -> Self {
        Self::with_kind(name, ColumnKind::Temporal(ColumnExtents::default()))
    }

    pub fn categorical(name: impl Into<String>) -> Self {
        Self::with_kind(
            name,
            ColumnKind::Categorical {
                categories: Vec::new(),
            },
        )
    }

    pub fn image(name: impl Into<String>) -> Self {
        Self::with_kind(name, ColumnKind::Image)
    }

    pub(crate) fn bivariate(name: impl Into<String>, x: ColumnId, y: ColumnId) -> Self {
        Self::with_kind(name, ColumnKind::Bivariate { x, y })
    }

    /// Preset the numeric scale (and focus) extent instead of deriving it from data
    pub fn with_numeric_extent(mut self, min: f64, max: f64) -> Self {
        if let ColumnKind::Numeric(extents) = &mut self.kind {
            extents.scale = Some(Extent::new(min, max));
            extents.focus = extents.scale;
        }
        self
    }

    /// Preset the temporal scale (and focus) extent
    pub fn with_temporal_extent(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        if let ColumnKind::Temporal(extents) = &mut self.kind {
            extents.scale = Some(Extent::new(start, end));
            extents.focus = extents.scale;
        }
        self
    }

    /// Preset the category order
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for label in categories {
            self.add_category(&label.into());
        }
        self
    }

    pub fn id(&self) -> ColumnId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn kind(&self) -> &ColumnKind {
        &self.kind
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, ColumnKind::Numeric(_))
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self.kind, ColumnKind::Temporal(_))
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self.kind, ColumnKind::Categorical { .. })
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, ColumnKind::Image)
    }

    pub fn is_bivariate(&self) -> bool {
        matches!(self.kind, ColumnKind::Bivariate { .. })
    }

    pub fn numeric_extents(&self) -> Option<&ColumnExtents<f64>> {
        match &self.kind {
            ColumnKind::Numeric(extents) => Some(extents),
            _ => None,
        }
    }

    pub fn temporal_extents(&self) -> Option<&ColumnExtents<DateTime<Utc>>> {
        match &self.kind {
            ColumnKind::Temporal(extents) => Some(extents),
            _ => None,
        }
    }

    /// Category list; empty for non-categorical columns
    pub fn categories(&self) -> &[String] {
        match &self.kind {
            ColumnKind::Categorical { categories } => categories,
            _ => &[],
        }
    }

    /// Source column ids of a bivariate column
    pub fn bivariate_sources(&self) -> Option<(ColumnId, ColumnId)> {
        match self.kind {
            ColumnKind::Bivariate { x, y } => Some((x, y)),
            _ => None,
        }
    }

    /// Overall statistics; `None` until the table computes them
    pub fn statistics(&self) -> Option<&ColumnStatistics> {
        self.statistics.as_ref()
    }

    pub fn focus_rows(&self) -> &[usize] {
        &self.focus_rows
    }

    pub fn lower_context_rows(&self) -> &[usize] {
        &self.lower_context_rows
    }

    pub fn upper_context_rows(&self) -> &[usize] {
        &self.upper_context_rows
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn kind_mut(&mut self) -> &mut ColumnKind {
        &mut self.kind
    }

    pub(crate) fn set_statistics(&mut self, statistics: Option<ColumnStatistics>) {
        self.statistics = statistics;
    }

    pub(crate) fn statistics_mut(&mut self) -> Option<&mut ColumnStatistics> {
        self.statistics.as_mut()
    }

    /// Append a category unless already known
    pub(crate) fn add_category(&mut self, label: &str) {
        if let ColumnKind::Categorical { categories } = &mut self.kind {
            if !categories.iter().any(|c| c == label) {
                categories.push(label.to_string());
            }
        }
    }

    pub(crate) fn clear_categories(&mut self) {
        if let ColumnKind::Categorical { categories } = &mut self.kind {
            categories.clear();
        }
    }

    pub(crate) fn clear_focus_context(&mut self) {
        self.focus_rows.clear();
        self.lower_context_rows.clear();
        self.upper_context_rows.clear();
    }

    /// Classify `row` by its value in this column and record it
    ///
    /// Returns whether the value is in focus. Only numeric and temporal
    /// columns have a focus extent; everything else is always in focus, as
    /// are missing (NaN) numeric values.
    pub(crate) fn set_focus_context(&mut self, row: usize, value: &Value) -> bool {
        let placement = match (&self.kind, value) {
            (ColumnKind::Numeric(extents), Value::Numeric(v)) if !v.is_nan() => extents.locate(*v),
            (ColumnKind::Temporal(extents), Value::Temporal(t)) => extents.locate(*t),
            _ => Placement::Focus,
        };

        match placement {
            Placement::Focus => self.focus_rows.push(row),
            Placement::Lower => self.lower_context_rows.push(row),
            Placement::Upper => self.upper_context_rows.push(row),
        }
        placement == Placement::Focus
    }
}
