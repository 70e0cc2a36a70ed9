//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for report session integration tests.

#![allow(dead_code)]

use chrono::NaiveDate;
use report_engine::{GroupedRow, Record, ReportSchema};
use report_session::{ColumnStateStore, MemoryStore, ReportSession, SessionConfig, StaticSource};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Eight rows over four states. `r8` has no sales and no order date.
pub fn sample_records() -> Vec<Record> {
    let rows = [
        ("r1", "California", "Home", 100.0, 10.0, date(2025, 1, 5)),
        ("r2", "Texas", "Home", 200.0, 25.0, date(2025, 2, 10)),
        ("r3", "California", "Toys", 300.0, 40.0, date(2025, 3, 15)),
        ("r4", "Texas", "Toys", 400.0, 5.0, date(2025, 1, 20)),
        ("r5", "Florida", "Home", 500.0, 20.0, date(2025, 4, 1)),
        ("r6", "California", "Home", 600.0, 30.0, date(2025, 2, 28)),
        ("r7", "Texas", "Home", 700.0, 15.0, date(2025, 3, 3)),
    ];
    let mut records: Vec<Record> = rows
        .iter()
        .map(|(id, state, category, sales, orders, last)| {
            Record::new(*id)
                .with_text("state", state)
                .with_text("category", category)
                .with_number("totalSales", *sales)
                .with_number("orders", *orders)
                .with_date("lastOrderDate", *last)
        })
        .collect();
    records.push(
        Record::new("r8")
            .with_text("state", "Ohio")
            .with_text("category", "Toys")
            .with_number("orders", 50.0),
    );
    records
}

/// Test harness owning one session over the sample records.
pub struct TestHarness {
    pub session: ReportSession,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self::with_config(SessionConfig {
            page_size,
            ..SessionConfig::default()
        })
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self::with_store(config, Box::new(MemoryStore::new()))
    }

    pub fn with_store(config: SessionConfig, store: Box<dyn ColumnStateStore>) -> Self {
        let source = StaticSource::new(sample_records());
        let session = ReportSession::new(config, ReportSchema::sales_demo(), &source, store)
            .expect("session should open");
        TestHarness { session }
    }

    /// Ids of the leaf rows on the current page.
    pub fn page_ids(&mut self) -> Vec<String> {
        self.session
            .page_rows()
            .iter()
            .filter_map(GroupedRow::as_leaf)
            .map(|r| r.id.clone())
            .collect()
    }

    /// Ids of every row in the view.
    pub fn all_ids(&mut self) -> Vec<String> {
        self.session
            .view()
            .rows
            .iter()
            .map(|r| r.id().to_string())
            .collect()
    }
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
