//! FILENAME: core/report-engine/src/filter.rs
//! Predicate Evaluator - decides whether a record passes the filter set.
//!
//! Rules per field kind:
//! - Value list: empty list, or the record value is a member (OR within field)
//! - Number range: value >= min and value <= max, each only when present
//! - Date range: on/after start, and on/before end unless `no_end` is set
//!
//! A record is included when every present field rule holds (AND across
//! fields). Missing bounds never exclude anything.

use crate::definition::{FieldFilter, FieldValue, FilterSet, Record};

/// Evaluates a single field value against one field filter.
pub fn field_matches(value: &FieldValue, filter: &FieldFilter) -> bool {
    match filter {
        FieldFilter::Values(allowed) => {
            if allowed.is_empty() {
                return true;
            }
            let text = value.display_text();
            allowed.iter().any(|a| *a == text)
        }
        FieldFilter::Number(range) => match value.as_f64() {
            Some(n) => range.contains(n),
            None => range.is_unbounded(),
        },
        FieldFilter::Date(range) => match value.as_date() {
            Some(d) => range.contains(d),
            None => range.is_unbounded(),
        },
    }
}

/// True when the record satisfies every present filter.
pub fn record_matches(record: &Record, filters: &FilterSet) -> bool {
    filters
        .iter()
        .all(|(field, filter)| field_matches(record.get(field), filter))
}

/// Returns the visible subset of `records`, preserving source order.
pub fn apply_filters(records: &[Record], filters: &FilterSet) -> Vec<Record> {
    if filters.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|r| record_matches(r, filters))
        .cloned()
        .collect()
}
