//! datatable-core - In-memory multivariate data engine
//!
//! This crate provides the table model underneath every linked view:
//!
//! - **Columns**: numeric, temporal, categorical, image and bivariate
//!   columns with scale/focus extents and cached statistics
//! - **Tuples**: rows aligned with the enabled column order, with a parallel
//!   store for the values of disabled columns
//! - **Queries**: per-column selections combined into a queried/non-queried
//!   partition, with statistics for the queried subset
//! - **Events**: one notification per committed mutation
//!
//! # Example
//!
//! ```
//! use datatable_core::{Column, ColumnSelection, DataTable, Tuple, Value};
//!
//! let tuples = vec![
//!     Tuple::new(vec![Value::Numeric(1.0), Value::from("x")]),
//!     Tuple::new(vec![Value::Numeric(2.0), Value::from("y")]),
//! ];
//! let mut table = DataTable::new();
//! table
//!     .set_data(tuples, vec![Column::numeric("A"), Column::categorical("B")])
//!     .unwrap();
//!
//! let a = table.column(0).unwrap().id();
//! table
//!     .add_column_selection(ColumnSelection::numeric_range(a, 1.5, 3.0))
//!     .unwrap();
//! assert_eq!(table.queried_rows(), &[1]);
//! ```

pub mod column;
pub mod config;
pub mod error;
pub mod event;
pub mod query;
pub mod selection;
pub mod statistics;
pub mod table;
pub mod tuple;
pub mod value;

pub use column::{Column, ColumnExtents, ColumnId, ColumnKind, Extent};
pub use config::{ConfigError, DataTableConfig};
pub use error::{DataTableError, DataTableResult};
pub use event::{DataTableEvent, DataTableListener, ListenerId};
pub use query::Query;
pub use selection::{ColumnSelection, SelectionId, SelectionKind};
pub use statistics::{
    BivariateStatistics, CategoricalStatistics, ColumnStatistics, Histogram2DSet,
    ImageStatistics, NumericStatistics, TemporalStatistics,
};
pub use table::DataTable;
pub use tuple::Tuple;
pub use value::Value;

// Re-export the statistics engine types that appear in this crate's API
pub use datatable_stats::{
    CategoricalHistogram, CategoricalSummary, CategoryBin, Histogram2D, Histogram2DDimension,
    HistogramBin, NumericHistogram, NumericSummary, StatsError, TemporalHistogram,
    TemporalSummary,
};
