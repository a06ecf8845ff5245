//! Property tests for table invariants
//!
//! Uses proptest to check the query partition, column enable/disable and
//! reorder round-trips, and histogram totals over generated tables.

mod common;

use common::fixtures::{example_table, mixed_table, snapshot};
use datatable_core::{Column, ColumnId, ColumnSelection, ColumnStatistics, DataTable, Tuple, Value};
use proptest::prelude::*;
use rstest::rstest;

/// Two numeric columns and one categorical column over generated rows
fn generated_table(rows: &[(f64, f64, u8)]) -> DataTable {
    let tuples = rows
        .iter()
        .map(|&(a, b, c)| {
            Tuple::new(vec![
                Value::Numeric(a),
                Value::Numeric(b),
                Value::from(format!("c{}", c % 4)),
            ])
        })
        .collect();
    let mut table = DataTable::new();
    table
        .set_data(
            tuples,
            vec![
                Column::numeric("a"),
                Column::numeric("b"),
                Column::categorical("c"),
            ],
        )
        .unwrap();
    table
}

fn row_strategy() -> impl Strategy<Value = Vec<(f64, f64, u8)>> {
    prop::collection::vec((-100.0f64..100.0, -1.0e3f64..1.0e3, any::<u8>()), 1..80)
}

fn ids(table: &DataTable) -> Vec<ColumnId> {
    table.columns().iter().map(Column::id).collect()
}

proptest! {
    #[test]
    fn queried_and_non_queried_partition_every_row(
        rows in row_strategy(),
        lo in -100.0f64..100.0,
        width in 0.0f64..120.0,
        labels in prop::collection::btree_set(0u8..4, 0..4),
    ) {
        let mut table = generated_table(&rows);
        let ids = ids(&table);
        table
            .add_column_selection(ColumnSelection::numeric_range(ids[0], lo, lo + width))
            .unwrap();
        if !labels.is_empty() {
            let names: Vec<String> = labels.iter().map(|l| format!("c{}", l)).collect();
            table
                .add_column_selection(ColumnSelection::categorical(ids[2], names))
                .unwrap();
        }

        let queried = table.queried_rows();
        let non_queried = table.non_queried_rows();
        prop_assert_eq!(queried.len() + non_queried.len(), rows.len());
        prop_assert!(queried.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(queried.iter().all(|r| non_queried.binary_search(r).is_err()));

        for &row in queried {
            let a = table.tuple(row).unwrap().element(0).and_then(Value::as_numeric).unwrap();
            prop_assert!(a >= lo && a <= lo + width);
        }
        prop_assert!(table.verify_alignment().is_ok());
    }

    #[test]
    fn disable_then_enable_keeps_values(rows in row_strategy(), victim in 0usize..3) {
        let mut table = generated_table(&rows);
        let before = snapshot(&table);
        let ids = ids(&table);

        prop_assert!(table.disable_column(ids[victim]));
        prop_assert!(table.enable_column(ids[victim]));

        let mut restored: Vec<ColumnId> = ids.iter().copied().filter(|&id| id != ids[victim]).collect();
        restored.push(ids[victim]);
        prop_assert_eq!(self::ids(&table), restored);

        table.change_column_order(&ids).unwrap();
        prop_assert_eq!(snapshot(&table), before);
    }

    #[test]
    fn reordering_and_back_is_identity(rows in row_strategy(), order in Just(vec![0usize, 1, 2]).prop_shuffle()) {
        let mut table = generated_table(&rows);
        let ids = ids(&table);
        let before = snapshot(&table);
        let correlations = |table: &DataTable, id: ColumnId| -> Vec<u64> {
            table
                .column_statistics(id)
                .and_then(ColumnStatistics::as_numeric)
                .map(|s| s.correlations.iter().map(|c| c.to_bits()).collect())
                .unwrap_or_default()
        };
        let before_corr = correlations(&table, ids[1]);

        let shuffled: Vec<ColumnId> = order.iter().map(|&i| ids[i]).collect();
        table.change_column_order(&shuffled).unwrap();
        prop_assert_eq!(self::ids(&table), shuffled);

        table.change_column_order(&ids).unwrap();
        prop_assert_eq!(snapshot(&table), before);
        prop_assert_eq!(correlations(&table, ids[1]), before_corr);
    }

    #[test]
    fn histogram_totals_match_rows_in_focus(rows in row_strategy(), bins in 1usize..40) {
        let mut table = generated_table(&rows);
        table.set_num_histogram_bins(bins).unwrap();
        let ids = ids(&table);

        let numeric = table
            .column_statistics(ids[0])
            .and_then(ColumnStatistics::as_numeric)
            .unwrap();
        let histogram = numeric.histogram.as_ref().unwrap();
        prop_assert_eq!(histogram.num_bins(), bins);
        prop_assert_eq!(histogram.total_count(), rows.len());

        let categorical = table
            .column_statistics(ids[2])
            .and_then(ColumnStatistics::as_categorical)
            .unwrap();
        prop_assert_eq!(categorical.histogram.total_count(), rows.len());
    }
}

#[rstest]
#[case::single_row(1)]
#[case::two_rows(2)]
#[case::many_rows(64)]
fn test_mixed_table_is_aligned(#[case] rows: usize) {
    let mut table = mixed_table(rows);
    assert_eq!(table.verify_alignment(), Ok(()));
    assert_eq!(table.focus_rows().len(), rows);

    let date = table.column_by_name("date").unwrap().id();
    table.disable_column(date);
    assert_eq!(table.verify_alignment(), Ok(()));
}

#[rstest]
#[case::constant(vec![4.0, 4.0, 4.0])]
#[case::with_nan(vec![1.0, f64::NAN, 3.0])]
#[case::single(vec![9.0])]
fn test_degenerate_numeric_columns(#[case] values: Vec<f64>) {
    let tuples = values
        .iter()
        .map(|&v| Tuple::new(vec![Value::Numeric(v)]))
        .collect();
    let mut table = DataTable::new();
    table.set_data(tuples, vec![Column::numeric("v")]).unwrap();

    let id = table.column(0).unwrap().id();
    let stats = table
        .column_statistics(id)
        .and_then(ColumnStatistics::as_numeric)
        .unwrap();
    let finite = values.iter().filter(|v| v.is_finite()).count();
    assert_eq!(stats.summary.count, finite);
    assert_eq!(stats.summary.missing, values.len() - finite);
    assert_eq!(table.focus_rows().len(), values.len());
}

#[test]
fn test_move_column_round_trip() {
    let mut table = example_table();
    let before = snapshot(&table);
    let a = table.column(0).unwrap().id();

    assert_eq!(table.move_column(a, 5), Ok(true));
    assert_eq!(table.column(1).unwrap().id(), a);
    assert_eq!(table.move_column(a, 0), Ok(true));
    assert_eq!(snapshot(&table), before);
}
