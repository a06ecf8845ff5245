//! Shared tables, listeners and logging for integration tests

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::cell::RefCell;
use std::rc::Rc;

use datatable_core::{Column, DataTable, DataTableEvent, Tuple, Value};

/// Install a test subscriber honouring `RUST_LOG`; safe to call repeatedly
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `A: [1, 2, 3, 4, 5]`, `B: [x, x, y, y, z]`
pub fn example_tuples() -> Vec<Tuple> {
    [(1.0, "x"), (2.0, "x"), (3.0, "y"), (4.0, "y"), (5.0, "z")]
        .iter()
        .map(|&(a, b)| Tuple::new(vec![Value::Numeric(a), Value::from(b)]))
        .collect()
}

pub fn example_table() -> DataTable {
    let mut table = DataTable::new();
    table
        .set_data(
            example_tuples(),
            vec![Column::numeric("A"), Column::categorical("B")],
        )
        .unwrap();
    table
}

#[allow(dead_code)]
pub fn instant(day: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day)
}

/// Numeric, categorical, temporal and image columns over `rows` rows
#[allow(dead_code)]
pub fn mixed_table(rows: usize) -> DataTable {
    let labels = ["red", "green", "blue"];
    let tuples = (0..rows)
        .map(|i| {
            let x = i as f64;
            Tuple::new(vec![
                Value::Numeric(x),
                Value::Numeric((x * 0.7).sin() * 10.0),
                Value::from(labels[i % labels.len()]),
                Value::Temporal(instant(i as i64)),
                Value::Image(format!("img_{:04}.png", i)),
            ])
        })
        .collect();

    let mut table = DataTable::new();
    table
        .set_data(
            tuples,
            vec![
                Column::numeric("x"),
                Column::numeric("wave"),
                Column::categorical("colour"),
                Column::temporal("date"),
                Column::image("thumbnail"),
            ],
        )
        .unwrap();
    table
}

/// Events seen by a registered listener
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<DataTableEvent>>>);

#[allow(dead_code)]
impl EventLog {
    pub fn attach(table: &mut DataTable) -> Self {
        let log = Self::default();
        let sink = Rc::clone(&log.0);
        table.add_listener(move |event: &DataTableEvent| sink.borrow_mut().push(event.clone()));
        log
    }

    pub fn events(&self) -> Vec<DataTableEvent> {
        self.0.borrow().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.0.borrow().iter().map(DataTableEvent::name).collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Values of every tuple, enabled then disabled, for round-trip comparisons
#[allow(dead_code)]
pub fn snapshot(table: &DataTable) -> Vec<Vec<Value>> {
    table
        .tuples()
        .iter()
        .map(|t| t.elements().iter().chain(t.disabled_elements()).cloned().collect())
        .collect()
}
