//! Error types for datatable-core
//!
//! Lookups that can naturally miss return `Option` instead of an error;
//! structural requests against unknown columns are silent no-ops. What is
//! left is misuse of an argument, an out-of-range index, or a broken
//! internal invariant.

use datatable_stats::StatsError;
use thiserror::Error;

/// Main error type for table operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataTableError {
    /// Malformed request: empty column set, zero bins, inverted range, misaligned rows
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A column or selection that must exist does not
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Index-based accessor past the end of its list
    #[error("Index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Tuple/column alignment broken; indicates a bug, not bad input
    #[error("Internal invariant violated: {message}")]
    InvariantViolation { message: String },

    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),
}

impl DataTableError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }
}

/// Result type alias for table operations
pub type DataTableResult<T> = Result<T, DataTableError>;

/// Fetch `items[index]` or report the index as out of range
pub(crate) fn get_index<T>(items: &[T], index: usize) -> DataTableResult<&T> {
    items.get(index).ok_or(DataTableError::IndexOutOfRange {
        index,
        len: items.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DataTableError::IndexOutOfRange { index: 7, len: 3 };
        assert!(err.to_string().contains("7"));

        let err = DataTableError::invalid("empty column set");
        assert!(err.to_string().contains("empty column set"));
    }

    #[test]
    fn test_stats_error_converts() {
        let err: DataTableError = StatsError::InvalidBinCount { bins: 0 }.into();
        assert!(matches!(err, DataTableError::Stats(_)));
    }

    #[test]
    fn test_get_index() {
        let items = vec![1, 2, 3];
        assert_eq!(get_index(&items, 1), Ok(&2));
        assert_eq!(
            get_index(&items, 3),
            Err(DataTableError::IndexOutOfRange { index: 3, len: 3 })
        );
    }
}
