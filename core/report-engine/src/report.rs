//! FILENAME: core/report-engine/src/report.rs
//! Report Definition - the serializable snapshot submitted on save.
//!
//! The wire shape is stable and round-trips:
//! - every filterable schema field appears under `filters`, `null` when unset
//! - dates are calendar strings (no time zone), `end` is `null` when `noEnd`
//! - `sorter` is omitted entirely when no sort is active
//!
//! Grouping and aggregation are display configuration and are not part of
//! the snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::definition::{
    ColumnStateMap, DateRange, FieldFilter, FieldKind, FilterSet, NumberRange, ReportSchema,
    SortOrder, SortState,
};
use crate::error::ReportError;

/// Whether the save overwrites the current report or creates a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveMode {
    Save,
    SaveAsNew,
}

/// Caller-supplied metadata of a saved report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub name: String,
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub mode: SaveMode,
}

/// Sort state as the table widget reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SorterWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default)]
    pub order: Option<SortOrder>,
}

impl SorterWire {
    /// A sort is only active with both a field and a direction.
    pub fn to_sort_state(&self) -> Option<SortState> {
        match (&self.field, self.order) {
            (Some(field), Some(order)) => Some(SortState::new(field, order)),
            _ => None,
        }
    }
}

impl From<&SortState> for SorterWire {
    fn from(sort: &SortState) -> Self {
        SorterWire {
            field: Some(sort.field.clone()),
            order: Some(sort.order),
        }
    }
}

/// Date range with calendar-string dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub no_end: bool,
}

impl From<&DateRange> for WireDateRange {
    fn from(range: &DateRange) -> Self {
        WireDateRange {
            start: range.start,
            end: range.effective_end(),
            no_end: range.no_end,
        }
    }
}

impl From<WireDateRange> for DateRange {
    fn from(wire: WireDateRange) -> Self {
        DateRange::new(wire.start, wire.end, wire.no_end)
    }
}

/// One field's filter on the wire. Variant order matters for untagged
/// decoding: a date range is recognised by its required `noEnd`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireFilter {
    Values(Vec<String>),
    Date(WireDateRange),
    Number(NumberRange),
}

impl WireFilter {
    fn from_filter(filter: &FieldFilter) -> Self {
        match filter {
            FieldFilter::Values(values) => WireFilter::Values(values.clone()),
            FieldFilter::Number(range) => WireFilter::Number(*range),
            FieldFilter::Date(range) => WireFilter::Date(range.into()),
        }
    }

    /// Converts back, provided the wire shape fits the field kind.
    fn into_filter(self, kind: FieldKind) -> Option<FieldFilter> {
        match (self, kind) {
            (WireFilter::Values(values), FieldKind::Dimension) => Some(FieldFilter::Values(values)),
            (WireFilter::Number(range), FieldKind::Measure) => Some(FieldFilter::Number(range)),
            (WireFilter::Date(range), FieldKind::Date) => Some(FieldFilter::Date(range.into())),
            _ => None,
        }
    }
}

/// The complete snapshot submitted to the report sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDefinition {
    pub meta: ReportMeta,
    pub data_source_id: String,
    pub created_at: DateTime<Utc>,
    pub columns_state_map: ColumnStateMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorter: Option<SorterWire>,
    pub filters: BTreeMap<String, Option<WireFilter>>,
}

impl ReportDefinition {
    /// Snapshots the current state.
    pub fn build(
        schema: &ReportSchema,
        meta: ReportMeta,
        data_source_id: &str,
        created_at: DateTime<Utc>,
        columns_state_map: &ColumnStateMap,
        sorter: Option<&SortState>,
        filters: &FilterSet,
    ) -> Self {
        let filters = schema
            .filter_order()
            .into_iter()
            .map(|field| {
                let wire = filters.get(&field.key).map(WireFilter::from_filter);
                (field.key.clone(), wire)
            })
            .collect();

        ReportDefinition {
            meta,
            data_source_id: data_source_id.to_string(),
            created_at,
            columns_state_map: columns_state_map.clone(),
            sorter: sorter.map(SorterWire::from),
            filters,
        }
    }

    /// Rebuilds the filter set. Entries for unknown fields, or whose shape
    /// does not fit the field kind, are dropped.
    pub fn filter_set(&self, schema: &ReportSchema) -> FilterSet {
        let mut set = FilterSet::new();
        for (key, wire) in &self.filters {
            let (Some(field), Some(wire)) = (schema.field(key), wire.clone()) else {
                continue;
            };
            set.set(key, wire.into_filter(field.kind));
        }
        set
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.sorter.as_ref().and_then(SorterWire::to_sort_state)
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        Ok(serde_json::from_str(json)?)
    }
}
