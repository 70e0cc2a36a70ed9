//! FILENAME: core/report-engine/src/packed.rs
//! Packed filter values.
//!
//! Table widgets expose column filters as a list of string keys. Value lists
//! map onto that directly; ranges are packed into a single JSON key. Decoding
//! validates the shape and reports failures instead of trusting the input.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::definition::{DateRange, FieldFilter, FieldKind, NumberRange, DATE_FORMAT};
use crate::error::ReportError;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PackedNumberRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct PackedDateRange {
    start: Option<String>,
    end: Option<String>,
    #[serde(default)]
    no_end: bool,
}

fn decode_error(field: &str, reason: impl ToString) -> ReportError {
    ReportError::Decode {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Accepts a calendar date or a full RFC 3339 timestamp.
///
/// A timestamp keeps the date as written in its own offset; it is not shifted
/// to UTC or to local time. A client that packs local midnight as a UTC
/// timestamp from east of Greenwich lands on the previous day, so clients
/// should send `YYYY-MM-DD`.
fn parse_packed_date(field: &str, text: &str) -> Result<NaiveDate, ReportError> {
    if let Ok(date) = NaiveDate::parse_from_str(text, DATE_FORMAT) {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.date_naive())
        .map_err(|e| decode_error(field, format!("bad date '{}': {}", text, e)))
}

pub fn pack_number_range(range: &NumberRange) -> String {
    let packed = PackedNumberRange {
        min: range.min,
        max: range.max,
    };
    serde_json::to_string(&packed).unwrap_or_default()
}

pub fn unpack_number_range(field: &str, key: &str) -> Result<NumberRange, ReportError> {
    let packed: PackedNumberRange =
        serde_json::from_str(key).map_err(|e| decode_error(field, e))?;
    Ok(NumberRange::new(packed.min, packed.max))
}

/// Packs a date range; `end` is dropped when the range is open-ended.
pub fn pack_date_range(range: &DateRange) -> String {
    let packed = PackedDateRange {
        start: range.start.map(|d| d.format(DATE_FORMAT).to_string()),
        end: range.effective_end().map(|d| d.format(DATE_FORMAT).to_string()),
        no_end: range.no_end,
    };
    serde_json::to_string(&packed).unwrap_or_default()
}

pub fn unpack_date_range(field: &str, key: &str) -> Result<DateRange, ReportError> {
    let packed: PackedDateRange = serde_json::from_str(key).map_err(|e| decode_error(field, e))?;
    let start = packed
        .start
        .as_deref()
        .map(|s| parse_packed_date(field, s))
        .transpose()?;
    let end = packed
        .end
        .as_deref()
        .map(|s| parse_packed_date(field, s))
        .transpose()?;
    Ok(DateRange::new(start, end, packed.no_end))
}

/// Packs a filter into the key list a table widget carries.
pub fn pack_filter(filter: &FieldFilter) -> Vec<String> {
    match filter {
        FieldFilter::Values(values) => values.clone(),
        FieldFilter::Number(range) => vec![pack_number_range(range)],
        FieldFilter::Date(range) => vec![pack_date_range(range)],
    }
}

/// Decodes a widget key list for a field of the given kind.
/// An empty list is "no filter" (`Ok(None)`).
pub fn unpack_filter(
    field: &str,
    kind: FieldKind,
    keys: &[String],
) -> Result<Option<FieldFilter>, ReportError> {
    if keys.is_empty() {
        return Ok(None);
    }
    let filter = match kind {
        FieldKind::Dimension => FieldFilter::Values(keys.to_vec()),
        FieldKind::Measure => FieldFilter::Number(unpack_number_range(field, &keys[0])?),
        FieldKind::Date => FieldFilter::Date(unpack_date_range(field, &keys[0])?),
    };
    Ok(Some(filter))
}
