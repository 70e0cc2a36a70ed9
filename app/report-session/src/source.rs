//! FILENAME: app/report-session/src/source.rs
//! Record sources. The demo source stands in for a real backend.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use report_engine::Record;

pub const DEMO_STATES: [&str; 6] = ["California", "Texas", "New York", "Florida", "Illinois", "Arizona"];
pub const DEMO_CATEGORIES: [&str; 6] = ["Electronics", "Apparel", "Home", "Beauty", "Sports", "Grocery"];

pub const DEMO_ROW_COUNT: usize = 120;

pub trait RecordSource {
    fn records(&self) -> Vec<Record>;
}

/// A fixed record set.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<Record>,
}

impl StaticSource {
    pub fn new(records: Vec<Record>) -> Self {
        StaticSource { records }
    }
}

impl RecordSource for StaticSource {
    fn records(&self) -> Vec<Record> {
        self.records.clone()
    }
}

/// Deterministic sales rows: states and categories cycle, sales in
/// [10000, 130000), orders in [30, 930), last order within 120 days of `today`.
#[derive(Debug, Clone)]
pub struct SalesDemoSource {
    today: NaiveDate,
    rows: usize,
    seed: u64,
}

impl SalesDemoSource {
    pub fn new(today: NaiveDate) -> Self {
        SalesDemoSource {
            today,
            rows: DEMO_ROW_COUNT,
            seed: 0x5eed_cafe,
        }
    }

    pub fn with_rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl RecordSource for SalesDemoSource {
    fn records(&self) -> Vec<Record> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..self.rows)
            .map(|i| {
                let total_sales: u32 = rng.gen_range(10_000..130_000);
                let orders: u32 = rng.gen_range(30..930);
                let days_ago: i64 = rng.gen_range(0..120);
                Record::new(format!("r{}", i))
                    .with_text("state", DEMO_STATES[i % DEMO_STATES.len()])
                    .with_text("category", DEMO_CATEGORIES[i % DEMO_CATEGORIES.len()])
                    .with_number("totalSales", total_sales as f64)
                    .with_number("orders", orders as f64)
                    .with_date("lastOrderDate", self.today - Duration::days(days_ago))
            })
            .collect()
    }
}
