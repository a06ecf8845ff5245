//! Error types for datatable-stats

use thiserror::Error;

/// Errors raised while binning or summarising values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// Zero bins requested
    #[error("Invalid histogram bin count: {bins}")]
    InvalidBinCount { bins: usize },

    /// Range is empty, inverted, or not finite
    #[error("Invalid histogram range: {message}")]
    InvalidRange { message: String },

    /// Two arrays that must be aligned are not
    #[error("Length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },
}

/// Result type alias for statistics operations
pub type StatsResult<T> = Result<T, StatsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StatsError::LengthMismatch { left: 3, right: 4 };
        assert!(err.to_string().contains("3 vs 4"));

        let err = StatsError::InvalidBinCount { bins: 0 };
        assert!(err.to_string().contains('0'));
    }
}
