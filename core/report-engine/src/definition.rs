//! FILENAME: core/report-engine/src/definition.rs
//! Report Definition - Schema, records and the editable report state.
//!
//! This module contains all the types needed to DESCRIBE a report:
//! - The fixed column schema (which fields are dimensions, measures, dates)
//! - The immutable records supplied by the record source
//! - The user-editable parameters: filters, grouping, aggregation, sort
//! - Persisted per-column display state
//!
//! Everything derived from these (rows, summary, chips) lives in `view`.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// Calendar format used for dates everywhere a date becomes text.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// SCHEMA
// ============================================================================

/// What role a column plays in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    /// Categorical text; filtered by value list, usable for grouping.
    Dimension,
    /// Numeric; filtered by range, usable for aggregation.
    Measure,
    /// Calendar date; filtered by date range.
    Date,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Dimension => "dimension",
            FieldKind::Measure => "measure",
            FieldKind::Date => "date",
        }
    }
}

/// One column of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    /// Stable column key (e.g. "totalSales").
    pub key: String,

    /// Human label (e.g. "Total Sales").
    pub label: String,

    pub kind: FieldKind,

    /// Whether the field may appear in a GroupSpec.
    #[serde(default)]
    pub groupable: bool,
}

impl FieldDef {
    pub fn dimension(key: &str, label: &str) -> Self {
        FieldDef {
            key: key.to_string(),
            label: label.to_string(),
            kind: FieldKind::Dimension,
            groupable: true,
        }
    }

    pub fn measure(key: &str, label: &str) -> Self {
        FieldDef {
            key: key.to_string(),
            label: label.to_string(),
            kind: FieldKind::Measure,
            groupable: false,
        }
    }

    pub fn date(key: &str, label: &str) -> Self {
        FieldDef {
            key: key.to_string(),
            label: label.to_string(),
            kind: FieldKind::Date,
            groupable: false,
        }
    }
}

/// The fixed column configuration of a report.
/// Field order here is the canonical display and chip order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSchema {
    pub fields: Vec<FieldDef>,
}

impl ReportSchema {
    pub fn new(fields: Vec<FieldDef>) -> Self {
        ReportSchema { fields }
    }

    /// The sales demo columns: two groupable dimensions, two measures, one date.
    pub fn sales_demo() -> Self {
        ReportSchema::new(vec![
            FieldDef::dimension("state", "State"),
            FieldDef::dimension("category", "Category"),
            FieldDef::measure("totalSales", "Total Sales"),
            FieldDef::measure("orders", "Orders"),
            FieldDef::date("lastOrderDate", "Last Order Date"),
        ])
    }

    pub fn field(&self, key: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Looks up a field and checks its kind.
    pub fn expect_kind(&self, key: &str, kind: FieldKind) -> Result<&FieldDef, ReportError> {
        let field = self
            .field(key)
            .ok_or_else(|| ReportError::UnknownField(key.to_string()))?;
        if field.kind != kind {
            return Err(ReportError::KindMismatch {
                field: key.to_string(),
                expected: kind.as_str(),
            });
        }
        Ok(field)
    }

    pub fn dimensions(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.kind == FieldKind::Dimension)
    }

    pub fn measures(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.kind == FieldKind::Measure)
    }

    pub fn dates(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.kind == FieldKind::Date)
    }

    pub fn groupable(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.groupable)
    }

    /// Fixed filter order: dimensions, then measures, then dates.
    pub fn filter_order(&self) -> Vec<&FieldDef> {
        self.dimensions()
            .chain(self.measures())
            .chain(self.dates())
            .collect()
    }

    /// Columns currently displayed, honoring per-column state.
    /// Hidden columns are dropped; explicit `order` wins, ties and
    /// unordered columns fall back to schema position.
    pub fn visible_columns(&self, states: &ColumnStateMap) -> Vec<&FieldDef> {
        let mut columns: Vec<(usize, &FieldDef)> = self
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| states.get(&f.key).map_or(true, |s| s.show))
            .collect();

        columns.sort_by_key(|(position, f)| {
            let order = states
                .get(&f.key)
                .and_then(|s| s.order)
                .map_or(*position as u64, u64::from);
            (order, *position)
        });

        columns.into_iter().map(|(_, f)| f).collect()
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// A single cell value of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Date(NaiveDate),
    Text(String),
    Empty,
}

static EMPTY_VALUE: FieldValue = FieldValue::Empty;

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }

    /// Text used for membership tests, group keys and labels.
    pub fn display_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Date(d) => d.format(DATE_FORMAT).to_string(),
            FieldValue::Empty => String::new(),
        }
    }

    /// Natural ordering for sorting: numbers numerically, dates
    /// chronologically, text lexicographically. Empty sorts last.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Empty, FieldValue::Empty) => Ordering::Equal,
            (FieldValue::Empty, _) => Ordering::Greater,
            (_, FieldValue::Empty) => Ordering::Less,
            (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
            (FieldValue::Date(a), FieldValue::Date(b)) => a.cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (a, b) => a.display_text().cmp(&b.display_text()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_text())
    }
}

/// One immutable row from the record source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier within the record set.
    pub id: String,

    /// Field key -> value. Missing keys read as `FieldValue::Empty`.
    pub values: FxHashMap<String, FieldValue>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Record {
            id: id.into(),
            values: FxHashMap::default(),
        }
    }

    pub fn with(mut self, key: &str, value: FieldValue) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }

    pub fn with_text(self, key: &str, value: &str) -> Self {
        self.with(key, FieldValue::Text(value.to_string()))
    }

    pub fn with_number(self, key: &str, value: f64) -> Self {
        self.with(key, FieldValue::Number(value))
    }

    pub fn with_date(self, key: &str, value: NaiveDate) -> Self {
        self.with(key, FieldValue::Date(value))
    }

    pub fn get(&self, key: &str) -> &FieldValue {
        self.values.get(key).unwrap_or(&EMPTY_VALUE)
    }
}

/// A selectable option for a dimension filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(value: &str) -> Self {
        SelectOption {
            label: value.to_string(),
            value: value.to_string(),
        }
    }
}

// ============================================================================
// FILTER DEFINITIONS
// ============================================================================

/// Inclusive numeric bounds. A missing bound is unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl NumberRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        NumberRange { min, max }
    }

    pub fn at_least(min: f64) -> Self {
        NumberRange::new(Some(min), None)
    }

    pub fn at_most(max: f64) -> Self {
        NumberRange::new(None, Some(max))
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, value: f64) -> bool {
        if let Some(min) = self.min {
            if value < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return false;
            }
        }
        true
    }
}

/// Inclusive calendar bounds. `no_end` means "from start onward" and
/// overrides any `end` that is also set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub no_end: bool,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>, no_end: bool) -> Self {
        DateRange { start, end, no_end }
    }

    /// The end bound that actually applies.
    pub fn effective_end(&self) -> Option<NaiveDate> {
        if self.no_end {
            None
        } else {
            self.end
        }
    }

    /// True when nothing was entered at all.
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none() && !self.no_end
    }

    /// True when no bound constrains any date.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.effective_end().is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        if let Some(start) = self.start {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.effective_end() {
            if date > end {
                return false;
            }
        }
        true
    }
}

/// The constraint on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldFilter {
    /// Record value must be one of these (OR within the field).
    Values(Vec<String>),
    Number(NumberRange),
    Date(DateRange),
}

impl FieldFilter {
    /// True when the filter holds nothing the user entered.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldFilter::Values(values) => values.is_empty(),
            FieldFilter::Number(range) => range.is_unbounded(),
            FieldFilter::Date(range) => range.is_empty(),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldFilter::Values(_) => FieldKind::Dimension,
            FieldFilter::Number(_) => FieldKind::Measure,
            FieldFilter::Date(_) => FieldKind::Date,
        }
    }
}

/// All active per-field constraints. A missing entry means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    filters: FxHashMap<String, FieldFilter>,
}

impl FilterSet {
    pub fn new() -> Self {
        FilterSet::default()
    }

    pub fn get(&self, field: &str) -> Option<&FieldFilter> {
        self.filters.get(field)
    }

    /// Sets or clears one field. Empty filters are stored as absent.
    pub fn set(&mut self, field: &str, filter: Option<FieldFilter>) {
        match filter {
            Some(filter) if !filter.is_empty() => {
                self.filters.insert(field.to_string(), filter);
            }
            _ => {
                self.filters.remove(field);
            }
        }
    }

    pub fn with(mut self, field: &str, filter: FieldFilter) -> Self {
        self.set(field, Some(filter));
        self
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldFilter> {
        self.filters.remove(field)
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldFilter)> {
        self.filters.iter()
    }

    pub fn values(&self, field: &str) -> Option<&[String]> {
        match self.filters.get(field) {
            Some(FieldFilter::Values(values)) => Some(values.as_slice()),
            _ => None,
        }
    }

    pub fn number_range(&self, field: &str) -> Option<&NumberRange> {
        match self.filters.get(field) {
            Some(FieldFilter::Number(range)) => Some(range),
            _ => None,
        }
    }

    pub fn date_range(&self, field: &str) -> Option<&DateRange> {
        match self.filters.get(field) {
            Some(FieldFilter::Date(range)) => Some(range),
            _ => None,
        }
    }
}

// ============================================================================
// GROUPING
// ============================================================================

/// Ordered, deduplicated list of grouping fields (outer to inner).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    fields: Vec<String>,
}

impl GroupSpec {
    pub fn new() -> Self {
        GroupSpec::default()
    }

    /// Builds a spec, keeping the first occurrence of each field.
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut spec = GroupSpec::new();
        for field in fields {
            spec.add(&field.into());
        }
        spec
    }

    /// Appends a field; no-op when already present.
    pub fn add(&mut self, field: &str) -> bool {
        if self.contains(field) {
            return false;
        }
        self.fields.push(field.to_string());
        true
    }

    /// Removes a field, preserving the order of the rest.
    pub fn remove(&mut self, field: &str) -> bool {
        let before = self.fields.len();
        self.fields.retain(|f| f != field);
        self.fields.len() != before
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

/// Reduction applied to a measure column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationOp {
    #[default]
    None,
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl AggregationOp {
    pub const ALL: [AggregationOp; 6] = [
        AggregationOp::None,
        AggregationOp::Sum,
        AggregationOp::Avg,
        AggregationOp::Min,
        AggregationOp::Max,
        AggregationOp::Count,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationOp::None => "none",
            AggregationOp::Sum => "sum",
            AggregationOp::Avg => "avg",
            AggregationOp::Min => "min",
            AggregationOp::Max => "max",
            AggregationOp::Count => "count",
        }
    }

    /// Menu label for the operator picker.
    pub fn label(&self) -> &'static str {
        match self {
            AggregationOp::None => "None",
            AggregationOp::Sum => "Total (Sum)",
            AggregationOp::Avg => "Average",
            AggregationOp::Min => "Min",
            AggregationOp::Max => "Max",
            AggregationOp::Count => "Count",
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, AggregationOp::None)
    }
}

impl fmt::Display for AggregationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationOp {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AggregationOp::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| ReportError::UnknownOperator(s.to_string()))
    }
}

/// Measure key -> chosen operator. `None` is equivalent to absence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationSpec {
    ops: FxHashMap<String, AggregationOp>,
}

impl AggregationSpec {
    pub fn new() -> Self {
        AggregationSpec::default()
    }

    pub fn with(mut self, field: &str, op: AggregationOp) -> Self {
        self.set(field, op);
        self
    }

    pub fn set(&mut self, field: &str, op: AggregationOp) {
        self.ops.insert(field.to_string(), op);
    }

    /// Resets the field to `none`; the entry itself is kept.
    pub fn reset(&mut self, field: &str) {
        if let Some(op) = self.ops.get_mut(field) {
            *op = AggregationOp::None;
        }
    }

    pub fn get(&self, field: &str) -> AggregationOp {
        self.ops.get(field).copied().unwrap_or_default()
    }

    /// Whether the field has an entry at all (even `none`).
    pub fn has_entry(&self, field: &str) -> bool {
        self.ops.contains_key(field)
    }

    pub fn has_active(&self) -> bool {
        self.ops.values().any(AggregationOp::is_active)
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

// ============================================================================
// SORT & COLUMN STATE
// ============================================================================

/// Sort direction, named as the table widget names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascend,
    Descend,
}

/// The single active sort. Absence (`Option::None`) means unsorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub field: String,
    pub order: SortOrder,
}

impl SortState {
    pub fn new(field: &str, order: SortOrder) -> Self {
        SortState {
            field: field.to_string(),
            order,
        }
    }
}

/// Which edge a column is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pinned {
    Left,
    Right,
}

/// Per-column display state persisted across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnState {
    #[serde(default = "default_true")]
    pub show: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed: Option<Pinned>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

fn default_true() -> bool {
    true
}

impl Default for ColumnState {
    fn default() -> Self {
        ColumnState {
            show: true,
            fixed: None,
            order: None,
        }
    }
}

/// Column key -> display state.
pub type ColumnStateMap = BTreeMap<String, ColumnState>;

// ============================================================================
// MAIN STATE STRUCT
// ============================================================================

/// The complete set of user-editable view parameters.
/// This is the "source of truth" every derived structure is computed from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportState {
    pub filters: FilterSet,
    pub group_spec: GroupSpec,
    pub aggregations: AggregationSpec,
    pub sorter: Option<SortState>,
}

impl ReportState {
    pub fn new() -> Self {
        ReportState::default()
    }
}
