//! FILENAME: core/report-engine/src/editor.rs
//! Filter Editors - per-field editing without any UI framework coupling.
//!
//! An editor renders the current value into a neutral `EditorModel`, turns a
//! candidate value into a `FilterPatch` on Apply, and produces a clearing
//! patch on Reset. A patch replaces exactly one field of a FilterSet.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::definition::{DateRange, FieldFilter, FilterSet, NumberRange, SelectOption};

// ============================================================================
// PATCH
// ============================================================================

/// Replacement for one field of a FilterSet (`None` clears it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPatch {
    pub field: String,
    pub filter: Option<FieldFilter>,
}

impl FilterPatch {
    pub fn set(field: &str, filter: FieldFilter) -> Self {
        FilterPatch {
            field: field.to_string(),
            filter: Some(filter),
        }
    }

    pub fn clear(field: &str) -> Self {
        FilterPatch {
            field: field.to_string(),
            filter: None,
        }
    }

    pub fn apply(self, filters: &mut FilterSet) {
        filters.set(&self.field, self.filter);
    }
}

// ============================================================================
// EDITOR MODEL
// ============================================================================

/// What an editor shows, independent of how a host draws it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorModel {
    /// Searchable multi-select.
    ValueList {
        field: String,
        options: Vec<SelectOption>,
        selected: Vec<String>,
        /// False until the option list has been loaded.
        options_loaded: bool,
    },
    /// Min / Max number inputs.
    NumberRange {
        field: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Start / end pickers plus a "No end date" checkbox. The end picker is
    /// empty while `no_end` is checked.
    DateRange {
        field: String,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        no_end: bool,
    },
}

// ============================================================================
// EDITORS
// ============================================================================

pub trait FilterEditor {
    /// The value this editor works with.
    type Value;

    fn field(&self) -> &str;

    fn render(&self, current: Option<&Self::Value>) -> EditorModel;

    fn commit(&self, candidate: Self::Value) -> FilterPatch;

    fn clear(&self) -> FilterPatch {
        FilterPatch::clear(self.field())
    }
}

/// Editor for dimension fields: pick any number of values.
#[derive(Debug, Clone)]
pub struct ValueListEditor {
    pub field: String,
    pub options: Option<Vec<SelectOption>>,
}

impl ValueListEditor {
    pub fn new(field: &str, options: Option<Vec<SelectOption>>) -> Self {
        ValueListEditor {
            field: field.to_string(),
            options,
        }
    }
}

impl FilterEditor for ValueListEditor {
    type Value = Vec<String>;

    fn field(&self) -> &str {
        &self.field
    }

    fn render(&self, current: Option<&Vec<String>>) -> EditorModel {
        EditorModel::ValueList {
            field: self.field.clone(),
            options: self.options.clone().unwrap_or_default(),
            selected: current.cloned().unwrap_or_default(),
            options_loaded: self.options.is_some(),
        }
    }

    fn commit(&self, candidate: Vec<String>) -> FilterPatch {
        if candidate.is_empty() {
            return self.clear();
        }
        FilterPatch::set(&self.field, FieldFilter::Values(candidate))
    }
}

/// Editor for measure fields: optional min and max.
#[derive(Debug, Clone)]
pub struct NumberRangeEditor {
    pub field: String,
}

impl NumberRangeEditor {
    pub fn new(field: &str) -> Self {
        NumberRangeEditor {
            field: field.to_string(),
        }
    }
}

impl FilterEditor for NumberRangeEditor {
    type Value = NumberRange;

    fn field(&self) -> &str {
        &self.field
    }

    fn render(&self, current: Option<&NumberRange>) -> EditorModel {
        let range = current.copied().unwrap_or_default();
        EditorModel::NumberRange {
            field: self.field.clone(),
            min: range.min,
            max: range.max,
        }
    }

    fn commit(&self, candidate: NumberRange) -> FilterPatch {
        if candidate.is_unbounded() {
            return self.clear();
        }
        FilterPatch::set(&self.field, FieldFilter::Number(candidate))
    }
}

/// Editor for date fields: start, end and an open-ended flag.
#[derive(Debug, Clone)]
pub struct DateRangeEditor {
    pub field: String,
}

impl DateRangeEditor {
    pub fn new(field: &str) -> Self {
        DateRangeEditor {
            field: field.to_string(),
        }
    }
}

impl FilterEditor for DateRangeEditor {
    type Value = DateRange;

    fn field(&self) -> &str {
        &self.field
    }

    fn render(&self, current: Option<&DateRange>) -> EditorModel {
        let range = current.copied().unwrap_or_default();
        EditorModel::DateRange {
            field: self.field.clone(),
            start: range.start,
            end: range.effective_end(),
            no_end: range.no_end,
        }
    }

    fn commit(&self, candidate: DateRange) -> FilterPatch {
        if candidate.is_empty() {
            return self.clear();
        }
        FilterPatch::set(&self.field, FieldFilter::Date(candidate))
    }
}
