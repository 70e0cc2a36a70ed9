//! FILENAME: core/report-engine/src/aggregate.rs
//! Aggregation Engine - reduces a set of records to per-measure scalars.
//!
//! Accumulators are mergeable, so the aggregate of a partition can be built
//! from the aggregates of its parts (sum of group sums == overall sum).

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::definition::{AggregationOp, AggregationSpec, Record, ReportSchema};

/// Measure key -> aggregated value. Fields without an active operator,
/// or with nothing to aggregate, have no entry.
pub type AggregateValues = FxHashMap<String, f64>;

// ============================================================================
// AGGREGATE ACCUMULATOR
// ============================================================================

/// Accumulator for one measure over one record set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateAccumulator {
    pub sum: f64,
    /// Records seen, numeric or not.
    pub count: u64,
    /// Records that carried a numeric value.
    pub count_numbers: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl AggregateAccumulator {
    pub fn new() -> Self {
        AggregateAccumulator::default()
    }

    /// Builds an accumulator for `field` over `records`.
    pub fn from_records(records: &[Record], field: &str) -> Self {
        let mut acc = AggregateAccumulator::new();
        for record in records {
            match record.get(field).as_f64() {
                Some(value) => acc.add_number(value),
                None => acc.add_non_number(),
            }
        }
        acc
    }

    pub fn add_number(&mut self, value: f64) {
        self.count += 1;
        self.count_numbers += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Counts a record whose field holds no number.
    pub fn add_non_number(&mut self) {
        self.count += 1;
    }

    /// Final value for `op`. `None` when the operator is inactive or
    /// nothing was accumulated.
    pub fn compute(&self, op: AggregationOp) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        match op {
            AggregationOp::None => None,
            AggregationOp::Sum => Some(self.sum),
            AggregationOp::Avg => Some(self.sum / self.count_numbers.max(1) as f64),
            AggregationOp::Min => self.min,
            AggregationOp::Max => self.max,
            AggregationOp::Count => Some(self.count as f64),
        }
    }

    pub fn merge(&mut self, other: &AggregateAccumulator) {
        if other.count == 0 {
            return;
        }
        self.sum += other.sum;
        self.count += other.count;
        self.count_numbers += other.count_numbers;
        if let Some(other_min) = other.min {
            self.min = Some(self.min.map_or(other_min, |m| m.min(other_min)));
        }
        if let Some(other_max) = other.max {
            self.max = Some(self.max.map_or(other_max, |m| m.max(other_max)));
        }
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Aggregates every schema measure that has an active operator.
/// An empty record set yields no entries at all, `count` included.
pub fn aggregate_records(
    records: &[Record],
    aggregations: &AggregationSpec,
    schema: &ReportSchema,
) -> AggregateValues {
    let mut values = AggregateValues::default();
    if records.is_empty() {
        return values;
    }

    for field in schema.measures() {
        let op = aggregations.get(&field.key);
        if !op.is_active() {
            continue;
        }
        let acc = AggregateAccumulator::from_records(records, &field.key);
        if let Some(value) = acc.compute(op) {
            values.insert(field.key.clone(), value);
        }
    }

    values
}
