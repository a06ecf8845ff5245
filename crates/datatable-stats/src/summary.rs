//! Descriptive statistics for numeric columns
//!
//! Provides the summaries shown on numeric axes and box plots:
//! - Mean, sample variance, standard deviation
//! - Min, max, median, quartiles
//! - Skewness and excess kurtosis
//! - Box-plot whiskers at 1.5 x IQR

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Whisker fences sit this many interquartile ranges beyond the quartiles
pub const WHISKER_IQR_FACTOR: f64 = 1.5;

/// Summary statistics for a numeric dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    /// Number of finite values
    pub count: usize,
    /// Number of missing/NaN values
    pub missing: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// 50th percentile
    pub median: f64,
    /// Sample (bias-corrected) variance
    pub variance: f64,
    pub std_dev: f64,
    pub percentile_25: f64,
    pub percentile_75: f64,
    /// Sample skewness, NaN with fewer than three values
    pub skewness: f64,
    /// Excess kurtosis, NaN with fewer than four values
    pub kurtosis: f64,
    /// Smallest datum not below `Q1 - 1.5 * IQR`
    pub lower_whisker: f64,
    /// Largest datum not above `Q3 + 1.5 * IQR`
    pub upper_whisker: f64,
}

impl NumericSummary {
    /// Compute summary statistics from data
    pub fn from_data(data: &[f64]) -> Self {
        let mut sorted: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
        let missing = data.len() - sorted.len();

        if sorted.is_empty() {
            return Self::empty(missing);
        }

        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let count = sorted.len();
        let n = count as f64;
        let mean = sorted.iter().sum::<f64>() / n;

        let variance = if count > 1 {
            sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)
        } else {
            0.0
        };
        let std_dev = variance.sqrt();

        let min = sorted[0];
        let max = sorted[count - 1];
        let median = percentile_of_sorted(&sorted, 50.0);
        let percentile_25 = percentile_of_sorted(&sorted, 25.0);
        let percentile_75 = percentile_of_sorted(&sorted, 75.0);

        let (lower_whisker, upper_whisker) =
            whiskers(&sorted, percentile_25, percentile_75);

        Self {
            count,
            missing,
            min,
            max,
            mean,
            median,
            variance,
            std_dev,
            percentile_25,
            percentile_75,
            skewness: skewness(&sorted, mean, std_dev),
            kurtosis: kurtosis(&sorted, mean, variance),
            lower_whisker,
            upper_whisker,
        }
    }

    /// Create empty statistics (all NaN)
    fn empty(missing: usize) -> Self {
        Self {
            count: 0,
            missing,
            min: f64::NAN,
            max: f64::NAN,
            mean: f64::NAN,
            median: f64::NAN,
            variance: f64::NAN,
            std_dev: f64::NAN,
            percentile_25: f64::NAN,
            percentile_75: f64::NAN,
            skewness: f64::NAN,
            kurtosis: f64::NAN,
            lower_whisker: f64::NAN,
            upper_whisker: f64::NAN,
        }
    }

    /// Interquartile range (Q3 - Q1)
    pub fn iqr(&self) -> f64 {
        self.percentile_75 - self.percentile_25
    }

    /// Get the range (max - min)
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Percentile of an ascending, NaN-free slice
///
/// Uses the `p * (n + 1)` position estimator, interpolating between the two
/// neighbouring order statistics and clamping to the extremes.
pub fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    match n {
        0 => return f64::NAN,
        1 => return sorted[0],
        _ => {}
    }

    let pos = p * (n as f64 + 1.0) / 100.0;
    if pos < 1.0 {
        return sorted[0];
    }
    if pos >= n as f64 {
        return sorted[n - 1];
    }

    let fpos = pos.floor();
    let lower = sorted[fpos as usize - 1];
    let upper = sorted[fpos as usize];
    lower + (pos - fpos) * (upper - lower)
}

/// Percentile of unsorted data; non-finite values are ignored
pub fn percentile(data: &[f64], p: f64) -> f64 {
    let mut sorted: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    percentile_of_sorted(&sorted, p)
}

fn whiskers(sorted: &[f64], q1: f64, q3: f64) -> (f64, f64) {
    let reach = WHISKER_IQR_FACTOR * (q3 - q1);
    let lower_fence = q1 - reach;
    let upper_fence = q3 + reach;

    let lower = sorted
        .iter()
        .copied()
        .find(|&x| x >= lower_fence)
        .unwrap_or(sorted[0]);
    let upper = sorted
        .iter()
        .rev()
        .copied()
        .find(|&x| x <= upper_fence)
        .unwrap_or(sorted[sorted.len() - 1]);

    (lower, upper)
}

fn skewness(values: &[f64], mean: f64, std_dev: f64) -> f64 {
    let n = values.len() as f64;
    if values.len() < 3 {
        return f64::NAN;
    }
    if std_dev * std_dev < 1e-20 {
        return 0.0;
    }

    let cubed: f64 = values.iter().map(|x| ((x - mean) / std_dev).powi(3)).sum();
    n / ((n - 1.0) * (n - 2.0)) * cubed
}

fn kurtosis(values: &[f64], mean: f64, variance: f64) -> f64 {
    let n = values.len() as f64;
    if values.len() < 4 {
        return f64::NAN;
    }
    if variance < 1e-19 {
        return 0.0;
    }

    let fourth: f64 = values
        .iter()
        .map(|x| (x - mean).powi(4) / (variance * variance))
        .sum();
    let coefficient = n * (n + 1.0) / ((n - 1.0) * (n - 2.0) * (n - 3.0));
    let correction = 3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0));
    coefficient * fourth - correction
}
