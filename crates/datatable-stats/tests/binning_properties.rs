//! Property tests for binning and summaries

use datatable_stats::{
    correlation_row, numeric_bin_index, pearson, CategoricalHistogram, Histogram2D,
    Histogram2DDimension, NumericHistogram, NumericSummary,
};
use proptest::prelude::*;
use rstest::rstest;

fn values() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e6f64..1.0e6, 1..200)
}

proptest! {
    #[test]
    fn every_value_in_range_lands_in_one_bin(data in values(), bins in 1usize..64) {
        let summary = NumericSummary::from_data(&data);
        let histogram = NumericHistogram::new(&data, bins, summary.min, summary.max).unwrap();

        prop_assert_eq!(histogram.total_count(), data.len());
        prop_assert!(histogram.max_bin_count() <= data.len());
        for (row, &value) in data.iter().enumerate() {
            let index = numeric_bin_index(value, summary.min, summary.max, bins).unwrap();
            prop_assert!(histogram.bin_rows(index).contains(&row));
        }
    }

    #[test]
    fn values_outside_range_are_excluded(data in values(), lo in -10.0f64..0.0, hi in 0.0f64..10.0) {
        let histogram = NumericHistogram::new(&data, 8, lo, hi).unwrap();
        let inside = data.iter().filter(|&&v| v >= lo && v <= hi).count();
        prop_assert_eq!(histogram.total_count(), inside);
    }

    #[test]
    fn summary_is_ordered(data in values()) {
        let s = NumericSummary::from_data(&data);
        prop_assert!(s.min <= s.percentile_25);
        prop_assert!(s.percentile_25 <= s.median);
        prop_assert!(s.median <= s.percentile_75);
        prop_assert!(s.percentile_75 <= s.max);
        prop_assert!(s.lower_whisker >= s.min && s.upper_whisker <= s.max);
        prop_assert!(s.variance >= 0.0);
    }

    #[test]
    fn categorical_counts_sum_to_rows(labels in prop::collection::vec(0u8..6, 0..100)) {
        let names: Vec<String> = labels.iter().map(|l| format!("k{}", l)).collect();
        let categories: Vec<String> = (0..3).map(|l| format!("k{}", l)).collect();
        let histogram = CategoricalHistogram::new(&names, &categories);

        prop_assert_eq!(histogram.total_count(), labels.len());
        prop_assert!(histogram.bins().iter().all(|b| b.count() > 0));
    }

    #[test]
    fn joint_histogram_counts_rows_binned_on_both_axes(
        pairs in prop::collection::vec((0.0f64..1.0, 0.0f64..1.0), 0..100),
        nx in 1usize..10,
        ny in 1usize..10,
    ) {
        let x_dim = Histogram2DDimension::numeric(0.0, 1.0, nx).unwrap();
        let y_dim = Histogram2DDimension::numeric(0.0, 1.0, ny).unwrap();
        let x: Vec<Option<usize>> = pairs.iter().map(|p| x_dim.numeric_bin(p.0)).collect();
        let y: Vec<Option<usize>> = pairs.iter().map(|p| y_dim.numeric_bin(p.1)).collect();

        let histogram = Histogram2D::from_bin_indices(x_dim, &x, y_dim, &y).unwrap();
        prop_assert_eq!(histogram.total_count(), pairs.len());
        prop_assert_eq!(histogram.transposed().total_count(), pairs.len());
    }

    #[test]
    fn correlation_is_symmetric_and_bounded(
        pairs in prop::collection::vec((-100.0f64..100.0, -100.0f64..100.0), 3..50),
    ) {
        let x: Vec<f64> = pairs.iter().map(|p| p.0).collect();
        let y: Vec<f64> = pairs.iter().map(|p| p.1).collect();
        let xy = pearson(&x, &y).unwrap();
        let yx = pearson(&y, &x).unwrap();

        prop_assert!(xy.is_nan() || (-1.0..=1.0).contains(&xy));
        prop_assert!(xy.is_nan() == yx.is_nan());
        if !xy.is_nan() {
            prop_assert!((xy - yx).abs() < 1e-12);
        }

        let row = correlation_row(&[Some(x.as_slice()), None, Some(y.as_slice())], 0);
        prop_assert_eq!(row.len(), 3);
        prop_assert!(row[1].is_nan());
    }
}

#[rstest]
#[case::lower_bound(0.0, Some(0))]
#[case::inside_first_bin(2.4, Some(0))]
#[case::bin_edge(2.5, Some(1))]
#[case::upper_bound_goes_to_last_bin(10.0, Some(3))]
#[case::below_range(-0.1, None)]
#[case::above_range(10.1, None)]
#[case::nan(f64::NAN, None)]
fn test_numeric_bin_edges(#[case] value: f64, #[case] expected: Option<usize>) {
    assert_eq!(numeric_bin_index(value, 0.0, 10.0, 4), expected);
}

#[rstest]
#[case::zero_bins(0, 0.0, 1.0)]
#[case::inverted(4, 1.0, 0.0)]
#[case::infinite(4, 0.0, f64::INFINITY)]
fn test_invalid_histograms_are_rejected(#[case] bins: usize, #[case] lo: f64, #[case] hi: f64) {
    assert!(NumericHistogram::new(&[0.5], bins, lo, hi).is_err());
}

#[rstest]
#[case::single_point(vec![3.0, 3.0], 3.0, 3.0, 2, vec![0, 2])]
#[case::all_at_upper_bound(vec![1.0, 1.0, 1.0], 0.0, 1.0, 3, vec![0, 0, 3])]
fn test_values_at_hi_fill_last_bin(
    #[case] data: Vec<f64>,
    #[case] lo: f64,
    #[case] hi: f64,
    #[case] bins: usize,
    #[case] expected: Vec<usize>,
) {
    let histogram = NumericHistogram::new(&data, bins, lo, hi).unwrap();
    let counts: Vec<usize> = (0..bins).map(|i| histogram.bin_count(i)).collect();
    assert_eq!(counts, expected);
}
