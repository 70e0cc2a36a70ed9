//! FILENAME: core/report-engine/src/chips.rs
//! Chip Synthesizer - removable badges for every active setting.
//!
//! Chips are a projection of (FilterSet, GroupSpec, AggregationSpec) and are
//! rebuilt from scratch on every call. Removing a chip edits the state it was
//! derived from; the chip list itself is never stored.

use serde::{Deserialize, Serialize};

use crate::definition::{
    AggregationSpec, DateRange, FieldFilter, FilterSet, GroupSpec, NumberRange, ReportSchema,
    ReportState, DATE_FORMAT,
};

/// Placeholder for a missing range bound.
const MISSING_BOUND: &str = "—";

/// Shown instead of an end date when the range is open-ended.
const NO_END: &str = "No end";

const GROUPING_LABEL: &str = "Grouping";
const AGGREGATIONS_LABEL: &str = "Aggregations";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChipKind {
    Filter,
    Group,
    Aggregation,
}

/// A display-only badge for one active setting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chip {
    pub kind: ChipKind,
    /// Filter field, group field or aggregated measure.
    pub key: String,
    pub label: String,
    pub value: String,
}

impl Chip {
    fn new(kind: ChipKind, key: &str, label: &str, value: String) -> Self {
        Chip {
            kind,
            key: key.to_string(),
            label: label.to_string(),
            value,
        }
    }
}

fn format_bound(bound: Option<f64>) -> String {
    bound.map_or_else(|| MISSING_BOUND.to_string(), |b| b.to_string())
}

fn format_number_range(range: &NumberRange) -> String {
    format!("{}–{}", format_bound(range.min), format_bound(range.max))
}

fn format_date_range(range: &DateRange) -> String {
    let start = range
        .start
        .map_or_else(|| MISSING_BOUND.to_string(), |d| d.format(DATE_FORMAT).to_string());
    let end = if range.no_end {
        NO_END.to_string()
    } else {
        range
            .end
            .map_or_else(|| MISSING_BOUND.to_string(), |d| d.format(DATE_FORMAT).to_string())
    };
    format!("{} → {}", start, end)
}

/// Derives the chip list: filters (dimensions, measures, dates, in schema
/// order), then one chip per grouping field, then one per active aggregation.
pub fn synthesize_chips(
    schema: &ReportSchema,
    filters: &FilterSet,
    group_spec: &GroupSpec,
    aggregations: &AggregationSpec,
) -> Vec<Chip> {
    let mut chips = Vec::new();

    for field in schema.filter_order() {
        let Some(filter) = filters.get(&field.key) else {
            continue;
        };
        if filter.is_empty() {
            continue;
        }
        let value = match filter {
            FieldFilter::Values(values) => values.join(", "),
            FieldFilter::Number(range) => format_number_range(range),
            FieldFilter::Date(range) => format_date_range(range),
        };
        chips.push(Chip::new(ChipKind::Filter, &field.key, &field.label, value));
    }

    for field in group_spec.fields() {
        chips.push(Chip::new(ChipKind::Group, field, GROUPING_LABEL, field.clone()));
    }

    for field in schema.measures() {
        let op = aggregations.get(&field.key);
        if op.is_active() {
            chips.push(Chip::new(
                ChipKind::Aggregation,
                &field.key,
                AGGREGATIONS_LABEL,
                format!("{}={}", field.key, op),
            ));
        }
    }

    chips
}

/// Revokes the setting a chip stands for, touching nothing else.
pub fn remove_chip(chip: &Chip, state: &mut ReportState) {
    match chip.kind {
        ChipKind::Filter => {
            state.filters.remove(&chip.key);
        }
        ChipKind::Group => {
            state.group_spec.remove(&chip.key);
        }
        ChipKind::Aggregation => state.aggregations.reset(&chip.key),
    }
}

/// Resets filters and sort. Grouping and aggregation are display
/// configuration and survive.
pub fn clear_all(state: &mut ReportState) {
    state.filters.clear();
    state.sorter = None;
}
