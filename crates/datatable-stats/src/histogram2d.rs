//! Joint histograms over two binned dimensions
//!
//! Each dimension is binned independently with the same clamp and exclusion
//! rules as the 1-D histograms; a row contributes to cell `(i, j)` only when
//! it has a bin in both dimensions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};
use crate::histogram::{numeric_bin_index, temporal_bin_index};

/// How one axis of a 2-D histogram is divided into bins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Histogram2DDimension {
    /// Uniform-width bins over `[lo, hi]`
    Numeric { lo: f64, hi: f64, num_bins: usize },

    /// Equal-duration bins over `[start, end]`
    Temporal {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        num_bins: usize,
    },

    /// One bin per category, in category order
    Categorical { categories: Vec<String> },
}

impl Histogram2DDimension {
    pub fn numeric(lo: f64, hi: f64, num_bins: usize) -> StatsResult<Self> {
        if num_bins == 0 {
            return Err(StatsError::InvalidBinCount { bins: num_bins });
        }
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(StatsError::InvalidRange {
                message: format!("[{}, {}]", lo, hi),
            });
        }
        Ok(Self::Numeric { lo, hi, num_bins })
    }

    pub fn temporal(start: DateTime<Utc>, end: DateTime<Utc>, num_bins: usize) -> StatsResult<Self> {
        if num_bins == 0 || (end - start).num_milliseconds() <= 0 {
            return Err(StatsError::InvalidRange {
                message: format!("{} .. {} in {} bins", start, end, num_bins),
            });
        }
        Ok(Self::Temporal {
            start,
            end,
            num_bins,
        })
    }

    pub fn categorical(categories: Vec<String>) -> Self {
        Self::Categorical { categories }
    }

    pub fn num_bins(&self) -> usize {
        match self {
            Self::Numeric { num_bins, .. } | Self::Temporal { num_bins, .. } => *num_bins,
            Self::Categorical { categories } => categories.len(),
        }
    }

    /// Bin of a numeric value; `None` for other dimension kinds
    pub fn numeric_bin(&self, value: f64) -> Option<usize> {
        match self {
            Self::Numeric { lo, hi, num_bins } => numeric_bin_index(value, *lo, *hi, *num_bins),
            _ => None,
        }
    }

    pub fn temporal_bin(&self, value: DateTime<Utc>) -> Option<usize> {
        match self {
            Self::Temporal {
                start,
                end,
                num_bins,
            } => temporal_bin_index(value, *start, *end, *num_bins),
            _ => None,
        }
    }

    pub fn categorical_bin(&self, label: &str) -> Option<usize> {
        match self {
            Self::Categorical { categories } => categories.iter().position(|c| c == label),
            _ => None,
        }
    }

    /// Label of a categorical bin
    pub fn bin_category(&self, index: usize) -> Option<&str> {
        match self {
            Self::Categorical { categories } => categories.get(index).map(String::as_str),
            _ => None,
        }
    }
}

/// Cell counts for the cross product of two binned dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram2D {
    x_dimension: Histogram2DDimension,
    y_dimension: Histogram2DDimension,
    /// Row-major: `counts[ix * y_bins + iy]`
    counts: Vec<usize>,
    max_bin_count: usize,
}

impl Histogram2D {
    /// Join per-row bin indices from two dimensions
    ///
    /// `x_bins[k]` and `y_bins[k]` belong to the same row.
    pub fn from_bin_indices(
        x_dimension: Histogram2DDimension,
        x_bins: &[Option<usize>],
        y_dimension: Histogram2DDimension,
        y_bins: &[Option<usize>],
    ) -> StatsResult<Self> {
        if x_bins.len() != y_bins.len() {
            return Err(StatsError::LengthMismatch {
                left: x_bins.len(),
                right: y_bins.len(),
            });
        }

        let nx = x_dimension.num_bins();
        let ny = y_dimension.num_bins();
        let mut counts = vec![0usize; nx * ny];

        for (ix, iy) in x_bins.iter().zip(y_bins) {
            if let (Some(ix), Some(iy)) = (ix, iy) {
                if *ix < nx && *iy < ny {
                    counts[ix * ny + iy] += 1;
                }
            }
        }

        let max_bin_count = counts.iter().copied().max().unwrap_or(0);
        Ok(Self {
            x_dimension,
            y_dimension,
            counts,
            max_bin_count,
        })
    }

    pub fn x_dimension(&self) -> &Histogram2DDimension {
        &self.x_dimension
    }

    pub fn y_dimension(&self) -> &Histogram2DDimension {
        &self.y_dimension
    }

    pub fn bin_count(&self, ix: usize, iy: usize) -> usize {
        let ny = self.y_dimension.num_bins();
        if ix >= self.x_dimension.num_bins() || iy >= ny {
            return 0;
        }
        self.counts[ix * ny + iy]
    }

    pub fn max_bin_count(&self) -> usize {
        self.max_bin_count
    }

    pub fn total_count(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Same histogram with the axes swapped
    pub fn transposed(&self) -> Self {
        let nx = self.x_dimension.num_bins();
        let ny = self.y_dimension.num_bins();
        let mut counts = vec![0usize; nx * ny];
        for ix in 0..nx {
            for iy in 0..ny {
                counts[iy * nx + ix] = self.counts[ix * ny + iy];
            }
        }

        Self {
            x_dimension: self.y_dimension.clone(),
            y_dimension: self.x_dimension.clone(),
            counts,
            max_bin_count: self.max_bin_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bins_of(dim: &Histogram2DDimension, values: &[f64]) -> Vec<Option<usize>> {
        values.iter().map(|&v| dim.numeric_bin(v)).collect()
    }

    #[test]
    fn test_joint_counts() {
        let x_dim = Histogram2DDimension::numeric(0.0, 10.0, 2).unwrap();
        let y_dim = Histogram2DDimension::categorical(vec!["a".into(), "b".into()]);

        let x = bins_of(&x_dim, &[1.0, 2.0, 9.0, 10.0]);
        let y: Vec<Option<usize>> = ["a", "a", "b", "c"]
            .iter()
            .map(|l| y_dim.categorical_bin(l))
            .collect();

        let hist = Histogram2D::from_bin_indices(x_dim, &x, y_dim, &y).unwrap();

        assert_eq!(hist.bin_count(0, 0), 2);
        assert_eq!(hist.bin_count(1, 1), 1);
        // "c" has no bin in y
        assert_eq!(hist.total_count(), 3);
        assert_eq!(hist.max_bin_count(), 2);
    }

    #[test]
    fn test_transposed() {
        let x_dim = Histogram2DDimension::numeric(0.0, 1.0, 3).unwrap();
        let y_dim = Histogram2DDimension::numeric(0.0, 1.0, 2).unwrap();
        let x = vec![Some(2), Some(0)];
        let y = vec![Some(1), Some(1)];

        let hist = Histogram2D::from_bin_indices(x_dim, &x, y_dim, &y).unwrap();
        let t = hist.transposed();

        assert_eq!(t.x_dimension().num_bins(), 2);
        assert_eq!(t.bin_count(1, 2), 1);
        assert_eq!(t.bin_count(1, 0), 1);
        assert_eq!(t.bin_count(0, 2), 0);
    }

    #[test]
    fn test_length_mismatch() {
        let dim = Histogram2DDimension::numeric(0.0, 1.0, 2).unwrap();
        let err = Histogram2D::from_bin_indices(dim.clone(), &[Some(0)], dim, &[]).unwrap_err();
        assert_eq!(err, StatsError::LengthMismatch { left: 1, right: 0 });
    }

    #[test]
    fn test_dimension_validation() {
        assert!(Histogram2DDimension::numeric(1.0, 0.0, 2).is_err());
        assert!(Histogram2DDimension::numeric(0.0, 1.0, 0).is_err());
    }
}
