//! One-dimensional histograms
//!
//! Three flavours share one bin type:
//!
//! - [`NumericHistogram`]: uniform-width bins over `[lo, hi]`
//! - [`TemporalHistogram`]: equal-duration bins over `[start, end]` at
//!   millisecond resolution
//! - [`CategoricalHistogram`]: one bin per observed category
//!
//! Values outside the range are excluded, never clamped, so an out-of-focus
//! value cannot inflate a focus-range histogram. A value exactly equal to the
//! upper bound lands in the last bin.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{StatsError, StatsResult};

/// A histogram bin: the rows whose values fell inside it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub rows: Vec<usize>,
}

impl HistogramBin {
    pub fn count(&self) -> usize {
        self.rows.len()
    }
}

fn max_count(bins: &[HistogramBin]) -> usize {
    bins.iter().map(HistogramBin::count).max().unwrap_or(0)
}

/// Bin index of a numeric value in `[lo, hi]` split into `num_bins` bins
///
/// Returns `None` for values outside the range (or non-finite values).
pub fn numeric_bin_index(value: f64, lo: f64, hi: f64, num_bins: usize) -> Option<usize> {
    if num_bins == 0 || !value.is_finite() || value < lo || value > hi {
        return None;
    }
    if value == hi {
        return Some(num_bins - 1);
    }

    let bin_width = (hi - lo) / num_bins as f64;
    let index = ((value - lo) / bin_width).floor() as usize;
    Some(index.min(num_bins - 1))
}

/// Bin index of an instant in `[start, end]` split into `num_bins`
/// equal-duration bins, measured in milliseconds
pub fn temporal_bin_index(
    value: DateTime<Utc>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    num_bins: usize,
) -> Option<usize> {
    let total = (end - start).num_milliseconds() as i128;
    let offset = (value - start).num_milliseconds() as i128;
    if num_bins == 0 || total <= 0 || offset < 0 || offset > total {
        return None;
    }
    if offset == total {
        return Some(num_bins - 1);
    }

    let index = offset * num_bins as i128 / total;
    Some((index as usize).min(num_bins - 1))
}

fn validate_numeric_range(num_bins: usize, lo: f64, hi: f64) -> StatsResult<()> {
    if num_bins == 0 {
        return Err(StatsError::InvalidBinCount { bins: num_bins });
    }
    if !lo.is_finite() || !hi.is_finite() || lo > hi {
        return Err(StatsError::InvalidRange {
            message: format!("[{}, {}]", lo, hi),
        });
    }
    Ok(())
}

/// Uniform-width histogram over numeric values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericHistogram {
    lo: f64,
    hi: f64,
    bins: Vec<HistogramBin>,
    max_bin_count: usize,
}

impl NumericHistogram {
    /// Bin `values`; bin rows are positions in the slice
    pub fn new(values: &[f64], num_bins: usize, lo: f64, hi: f64) -> StatsResult<Self> {
        Self::from_rows(values.iter().copied().enumerate(), num_bins, lo, hi)
    }

    /// Bin `(row, value)` pairs, recording `row` in each bin
    pub fn from_rows<I>(rows: I, num_bins: usize, lo: f64, hi: f64) -> StatsResult<Self>
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        validate_numeric_range(num_bins, lo, hi)?;

        let mut bins = vec![HistogramBin::default(); num_bins];
        for (row, value) in rows {
            if let Some(index) = numeric_bin_index(value, lo, hi, num_bins) {
                bins[index].rows.push(row);
            }
        }

        let max_bin_count = max_count(&bins);
        Ok(Self {
            lo,
            hi,
            bins,
            max_bin_count,
        })
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    pub fn hi(&self) -> f64 {
        self.hi
    }

    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn bins(&self) -> &[HistogramBin] {
        &self.bins
    }

    pub fn bin_count(&self, index: usize) -> usize {
        self.bins.get(index).map(HistogramBin::count).unwrap_or(0)
    }

    pub fn bin_rows(&self, index: usize) -> &[usize] {
        self.bins.get(index).map(|b| b.rows.as_slice()).unwrap_or(&[])
    }

    pub fn max_bin_count(&self) -> usize {
        self.max_bin_count
    }

    /// Sum of all bin counts
    pub fn total_count(&self) -> usize {
        self.bins.iter().map(HistogramBin::count).sum()
    }

    pub fn bin_width(&self) -> f64 {
        (self.hi - self.lo) / self.bins.len() as f64
    }

    pub fn bin_lower_bound(&self, index: usize) -> f64 {
        self.lo + index as f64 * self.bin_width()
    }

    pub fn bin_upper_bound(&self, index: usize) -> f64 {
        self.lo + (index + 1) as f64 * self.bin_width()
    }
}

/// Equal-duration histogram over instants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalHistogram {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    bins: Vec<HistogramBin>,
    max_bin_count: usize,
}

impl TemporalHistogram {
    pub fn new(
        values: &[DateTime<Utc>],
        num_bins: usize,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StatsResult<Self> {
        Self::from_rows(values.iter().copied().enumerate(), num_bins, start, end)
    }

    /// Bin `(row, instant)` pairs
    ///
    /// Fails with `InvalidRange` when `num_bins` is zero or the range has no
    /// duration.
    pub fn from_rows<I>(
        rows: I,
        num_bins: usize,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StatsResult<Self>
    where
        I: IntoIterator<Item = (usize, DateTime<Utc>)>,
    {
        if num_bins == 0 {
            return Err(StatsError::InvalidRange {
                message: "temporal histogram needs at least one bin".to_string(),
            });
        }
        if (end - start).num_milliseconds() <= 0 {
            return Err(StatsError::InvalidRange {
                message: format!("empty temporal range {} .. {}", start, end),
            });
        }

        let mut bins = vec![HistogramBin::default(); num_bins];
        for (row, value) in rows {
            if let Some(index) = temporal_bin_index(value, start, end, num_bins) {
                bins[index].rows.push(row);
            }
        }

        let max_bin_count = max_count(&bins);
        Ok(Self {
            start,
            end,
            bins,
            max_bin_count,
        })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn bins(&self) -> &[HistogramBin] {
        &self.bins
    }

    pub fn bin_count(&self, index: usize) -> usize {
        self.bins.get(index).map(HistogramBin::count).unwrap_or(0)
    }

    pub fn bin_rows(&self, index: usize) -> &[usize] {
        self.bins.get(index).map(|b| b.rows.as_slice()).unwrap_or(&[])
    }

    pub fn max_bin_count(&self) -> usize {
        self.max_bin_count
    }

    pub fn total_count(&self) -> usize {
        self.bins.iter().map(HistogramBin::count).sum()
    }

    /// Duration covered by a single bin (millisecond resolution)
    pub fn bin_duration(&self) -> Duration {
        let total = (self.end - self.start).num_milliseconds();
        Duration::milliseconds(total / self.bins.len() as i64)
    }

    pub fn bin_lower_bound(&self, index: usize) -> DateTime<Utc> {
        self.offset(index)
    }

    pub fn bin_upper_bound(&self, index: usize) -> DateTime<Utc> {
        self.offset(index + 1)
    }

    fn offset(&self, index: usize) -> DateTime<Utc> {
        let total = (self.end - self.start).num_milliseconds() as i128;
        let millis = total * index as i128 / self.bins.len() as i128;
        self.start + Duration::milliseconds(millis as i64)
    }
}

/// A categorical bin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBin {
    pub label: String,
    pub rows: Vec<usize>,
}

impl CategoryBin {
    pub fn count(&self) -> usize {
        self.rows.len()
    }
}

/// One bin per observed category
///
/// Bins are stored in category order. Display order is a caller concern;
/// [`CategoricalHistogram::bins_by_count`] and
/// [`CategoricalHistogram::bins_by_label_desc`] provide both orderings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalHistogram {
    bins: Vec<CategoryBin>,
    max_bin_count: usize,
}

impl CategoricalHistogram {
    pub fn new<S: AsRef<str>>(values: &[S], categories: &[String]) -> Self {
        Self::from_rows(
            values.iter().enumerate().map(|(row, v)| (row, v.as_ref())),
            categories,
        )
    }

    /// Bin `(row, label)` pairs
    ///
    /// Bins follow `categories` order; labels missing from `categories` get a
    /// bin appended in first-seen order. Categories with no rows have no bin.
    pub fn from_rows<'a, I>(rows: I, categories: &[String]) -> Self
    where
        I: IntoIterator<Item = (usize, &'a str)>,
    {
        let mut bins: Vec<CategoryBin> = categories
            .iter()
            .map(|label| CategoryBin {
                label: label.clone(),
                rows: Vec::new(),
            })
            .collect();

        for (row, label) in rows {
            match bins.iter_mut().find(|b| b.label == label) {
                Some(bin) => bin.rows.push(row),
                None => bins.push(CategoryBin {
                    label: label.to_string(),
                    rows: vec![row],
                }),
            }
        }

        bins.retain(|b| !b.rows.is_empty());
        let max_bin_count = bins.iter().map(CategoryBin::count).max().unwrap_or(0);

        Self {
            bins,
            max_bin_count,
        }
    }

    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn bins(&self) -> &[CategoryBin] {
        &self.bins
    }

    pub fn bin(&self, label: &str) -> Option<&CategoryBin> {
        self.bins.iter().find(|b| b.label == label)
    }

    /// Count for a label, zero when unobserved
    pub fn count(&self, label: &str) -> usize {
        self.bin(label).map(CategoryBin::count).unwrap_or(0)
    }

    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.bins
            .iter()
            .map(|b| (b.label.clone(), b.count()))
            .collect()
    }

    pub fn max_bin_count(&self) -> usize {
        self.max_bin_count
    }

    pub fn total_count(&self) -> usize {
        self.bins.iter().map(CategoryBin::count).sum()
    }

    /// Bins ordered by descending count, ties broken by label
    pub fn bins_by_count(&self) -> Vec<&CategoryBin> {
        let mut bins: Vec<&CategoryBin> = self.bins.iter().collect();
        bins.sort_by(|a, b| b.count().cmp(&a.count()).then_with(|| a.label.cmp(&b.label)));
        bins
    }

    /// Bins ordered by reverse-lexicographic label
    pub fn bins_by_label_desc(&self) -> Vec<&CategoryBin> {
        let mut bins: Vec<&CategoryBin> = self.bins.iter().collect();
        bins.sort_by(|a, b| b.label.cmp(&a.label));
        bins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn instant(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).single().unwrap()
    }

    #[test]
    fn test_numeric_counts_sum_to_inputs() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let hist = NumericHistogram::new(&values, 5, 1.0, 5.0).unwrap();

        assert_eq!(hist.num_bins(), 5);
        assert_eq!(hist.total_count(), 5);
        assert!(hist.bins().iter().all(|b| b.count() == 1));
        assert_eq!(hist.bin_rows(4), &[4]);
    }

    #[test]
    fn test_numeric_upper_bound_lands_in_last_bin() {
        let hist = NumericHistogram::new(&[0.0, 10.0], 4, 0.0, 10.0).unwrap();
        assert_eq!(hist.bin_count(0), 1);
        assert_eq!(hist.bin_count(3), 1);
    }

    #[test]
    fn test_numeric_out_of_range_excluded() {
        let hist = NumericHistogram::new(&[-1.0, 0.5, 11.0, f64::NAN], 2, 0.0, 10.0).unwrap();
        assert_eq!(hist.total_count(), 1);
    }

    #[test]
    fn test_numeric_constant_range() {
        let hist = NumericHistogram::new(&[3.0, 3.0], 4, 3.0, 3.0).unwrap();
        assert_eq!(hist.bin_count(3), 2);
    }

    #[test]
    fn test_numeric_invalid_arguments() {
        assert_eq!(
            NumericHistogram::new(&[1.0], 0, 0.0, 1.0).unwrap_err(),
            StatsError::InvalidBinCount { bins: 0 }
        );
        assert!(NumericHistogram::new(&[1.0], 3, 2.0, 1.0).is_err());
        assert!(NumericHistogram::new(&[1.0], 3, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_numeric_rows_are_recorded() {
        let rows = vec![(10, 0.1), (20, 0.9), (30, 0.2)];
        let hist = NumericHistogram::from_rows(rows, 2, 0.0, 1.0).unwrap();
        assert_eq!(hist.bin_rows(0), &[10, 30]);
        assert_eq!(hist.bin_rows(1), &[20]);
        assert_eq!(hist.max_bin_count(), 2);
    }

    #[test]
    fn test_temporal_bins() {
        let values: Vec<DateTime<Utc>> = (0..=10).map(|s| instant(s * 60)).collect();
        let hist = TemporalHistogram::new(&values, 10, instant(0), instant(600)).unwrap();

        assert_eq!(hist.total_count(), 11);
        assert_eq!(hist.bin_count(9), 2);
        assert_eq!(hist.bin_duration(), Duration::seconds(60));
        assert_eq!(hist.bin_lower_bound(1), instant(60));
        assert_eq!(hist.bin_upper_bound(9), instant(600));
    }

    #[test]
    fn test_temporal_outside_range_excluded() {
        let values = vec![instant(-1), instant(5), instant(11)];
        let hist = TemporalHistogram::new(&values, 2, instant(0), instant(10)).unwrap();
        assert_eq!(hist.total_count(), 1);
    }

    #[test]
    fn test_temporal_invalid_range() {
        assert!(matches!(
            TemporalHistogram::new(&[], 4, instant(5), instant(5)),
            Err(StatsError::InvalidRange { .. })
        ));
        assert!(matches!(
            TemporalHistogram::new(&[], 0, instant(0), instant(5)),
            Err(StatsError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_temporal_short_range_many_bins() {
        let start = instant(0);
        let end = start + Duration::milliseconds(5);
        let values = vec![start, start + Duration::milliseconds(3), end];
        let hist = TemporalHistogram::new(&values, 100, start, end).unwrap();
        assert_eq!(hist.total_count(), 3);
        assert_eq!(hist.bin_count(99), 1);
    }

    #[test]
    fn test_categorical_orderings() {
        let categories = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        let values = vec!["x", "y", "y", "z", "y", "x"];
        let hist = CategoricalHistogram::new(&values, &categories);

        assert_eq!(hist.count("y"), 3);
        assert_eq!(hist.total_count(), 6);
        assert_eq!(hist.max_bin_count(), 3);

        let by_count: Vec<&str> = hist.bins_by_count().iter().map(|b| b.label.as_str()).collect();
        assert_eq!(by_count, vec!["y", "x", "z"]);

        let by_label: Vec<&str> = hist
            .bins_by_label_desc()
            .iter()
            .map(|b| b.label.as_str())
            .collect();
        assert_eq!(by_label, vec!["z", "y", "x"]);
    }

    #[test]
    fn test_categorical_skips_unobserved() {
        let categories = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        let hist = CategoricalHistogram::from_rows(vec![(1, "x"), (2, "y"), (3, "y")], &categories);

        assert_eq!(hist.num_bins(), 2);
        assert_eq!(hist.count("z"), 0);
        assert_eq!(hist.bin("y").unwrap().rows, vec![2, 3]);
    }
}
