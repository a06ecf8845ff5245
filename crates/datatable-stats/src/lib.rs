//! datatable-stats - Histogram and statistics engine for multivariate tables
//!
//! This crate provides the numeric primitives underneath every table view:
//!
//! - **Histogram**: uniform-width numeric bins, equal-duration temporal bins
//!   and one-bin-per-category categorical histograms
//! - **Histogram2D**: joint bin counts over two independently binned dimensions
//! - **Summary**: descriptive statistics for numeric, temporal and categorical values
//! - **Correlation**: Pearson coefficients between aligned numeric arrays
//!
//! Everything here is a pure function of the values passed in. Bins record the
//! row indices that fell into them so callers can map a bin back to tuples.

pub mod categorical;
pub mod correlation;
pub mod error;
pub mod histogram;
pub mod histogram2d;
pub mod summary;
pub mod temporal;

pub use categorical::*;
pub use correlation::*;
pub use error::*;
pub use histogram::*;
pub use histogram2d::*;
pub use summary::*;
pub use temporal::*;
