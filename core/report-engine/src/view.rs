//! FILENAME: core/report-engine/src/view.rs
//! Report View - The render-ready output of the engine.
//!
//! A view holds the row set (flat leaves, or group headers when grouping is
//! active), the optional summary row for the current page, and the active
//! setting chips. Consumers distinguish leaves from group headers by the
//! `GroupedRow` variant, never by inspecting fields.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::aggregate::AggregateValues;
use crate::chips::Chip;
use crate::definition::{AggregationOp, FieldValue, Record};

/// Label shown in the first cell of the summary row.
pub const SUMMARY_LABEL: &str = "Aggregations";

// ============================================================================
// GROUP KEY
// ============================================================================

/// Composite key of a group: one value per GroupSpec field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    /// Values in GroupSpec order.
    pub parts: SmallVec<[String; 4]>,

    /// Parts joined by `GROUP_KEY_SEPARATOR`; used for the row id only.
    pub joined: String,
}

impl GroupKey {
    pub fn new(parts: SmallVec<[String; 4]>, separator: &str) -> Self {
        let joined = parts.join(separator);
        GroupKey { parts, joined }
    }
}

// ============================================================================
// ROWS
// ============================================================================

/// A group of records sharing one composite key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupHeader {
    /// Row identifier, `group-<joined key>`.
    pub id: String,

    pub key: GroupKey,

    /// The grouping fields, in GroupSpec order.
    pub fields: Vec<String>,

    /// Aggregates over `members` under the current AggregationSpec.
    pub aggregates: AggregateValues,

    /// Member records in their original relative order.
    pub members: Vec<Record>,
}

impl GroupHeader {
    /// Human label, e.g. "state: Texas · category: Home".
    pub fn label(&self) -> String {
        self.fields
            .iter()
            .zip(self.key.parts.iter())
            .map(|(field, value)| format!("{}: {}", field, value))
            .collect::<Vec<_>>()
            .join(" · ")
    }

    /// Value displayed for a grouped field, taken from the first member.
    /// Non-grouped fields are not meaningful on a header and return None.
    pub fn display_value(&self, field: &str) -> Option<&FieldValue> {
        if !self.fields.iter().any(|f| f == field) {
            return None;
        }
        self.members.first().map(|r| r.get(field))
    }

    pub fn aggregate(&self, field: &str) -> Option<f64> {
        self.aggregates.get(field).copied()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// One row of the render-ready row set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "row", rename_all = "camelCase")]
pub enum GroupedRow {
    Leaf(Record),
    GroupHeader(GroupHeader),
}

impl GroupedRow {
    pub fn id(&self) -> &str {
        match self {
            GroupedRow::Leaf(record) => &record.id,
            GroupedRow::GroupHeader(header) => &header.id,
        }
    }

    pub fn as_leaf(&self) -> Option<&Record> {
        match self {
            GroupedRow::Leaf(record) => Some(record),
            GroupedRow::GroupHeader(_) => None,
        }
    }

    pub fn as_header(&self) -> Option<&GroupHeader> {
        match self {
            GroupedRow::Leaf(_) => None,
            GroupedRow::GroupHeader(header) => Some(header),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, GroupedRow::GroupHeader(_))
    }
}

// ============================================================================
// SUMMARY ROW
// ============================================================================

/// One cell of the summary row, aligned to a displayed column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SummaryCell {
    /// First column: carries the row label.
    Label { column: String, text: String },
    /// An aggregated measure.
    Value { column: String, op: AggregationOp, value: f64 },
    /// Nothing to show for this column.
    Blank { column: String },
}

impl SummaryCell {
    pub fn column(&self) -> &str {
        match self {
            SummaryCell::Label { column, .. }
            | SummaryCell::Value { column, .. }
            | SummaryCell::Blank { column } => column,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            SummaryCell::Value { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Text as rendered: averages with two decimals, blanks empty.
    pub fn display_text(&self) -> String {
        match self {
            SummaryCell::Label { text, .. } => text.clone(),
            SummaryCell::Value { op: AggregationOp::Avg, value, .. } => format!("{:.2}", value),
            SummaryCell::Value { value, .. } => value.to_string(),
            SummaryCell::Blank { .. } => String::new(),
        }
    }
}

/// Trailing summary row for the visible page of an ungrouped view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub cells: Vec<SummaryCell>,
}

impl SummaryRow {
    pub fn cell(&self, column: &str) -> Option<&SummaryCell> {
        self.cells.iter().find(|c| c.column() == column)
    }
}

// ============================================================================
// VIEW
// ============================================================================

/// Page window into the row set (1-based page index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
}

impl Pagination {
    pub fn new(page: usize, page_size: usize) -> Self {
        Pagination { page, page_size }
    }

    /// Number of pages needed for `total` rows (at least one).
    pub fn page_count(&self, total: usize) -> usize {
        let size = self.page_size.max(1);
        ((total + size - 1) / size).max(1)
    }

    /// Page index clamped into range.
    pub fn clamped_page(&self, total: usize) -> usize {
        self.page.clamp(1, self.page_count(total))
    }

    /// Index range of the current page within `total` rows.
    pub fn range(&self, total: usize) -> std::ops::Range<usize> {
        let size = self.page_size.max(1);
        let start = ((self.clamped_page(total) - 1) * size).min(total);
        let end = (start + size).min(total);
        start..end
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::new(1, 10)
    }
}

/// The complete rendered output for one report state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    /// Render-ready rows: sorted leaves, or group headers.
    pub rows: Vec<GroupedRow>,

    /// Records in the source before filtering.
    pub source_count: usize,

    /// Records passing the filter set.
    pub filtered_count: usize,

    /// Column keys in display order.
    pub columns: Vec<String>,

    pub pagination: Pagination,

    /// Present only when grouping is inactive.
    pub summary: Option<SummaryRow>,

    pub chips: Vec<Chip>,
}

impl ReportView {
    pub fn is_grouped(&self) -> bool {
        self.rows.iter().any(GroupedRow::is_group)
    }

    /// Rows on the current page.
    pub fn page_rows(&self) -> &[GroupedRow] {
        &self.rows[self.pagination.range(self.rows.len())]
    }

    pub fn page_count(&self) -> usize {
        self.pagination.page_count(self.rows.len())
    }

    pub fn group_headers(&self) -> impl Iterator<Item = &GroupHeader> {
        self.rows.iter().filter_map(GroupedRow::as_header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_ranges() {
        let p = Pagination::new(2, 10);
        assert_eq!(p.range(25), 10..20);
        assert_eq!(Pagination::new(3, 10).range(25), 20..25);
        assert_eq!(Pagination::new(9, 10).range(25), 20..25);
        assert_eq!(Pagination::new(1, 10).range(0), 0..0);
        assert_eq!(p.page_count(0), 1);
    }

    #[test]
    fn test_summary_cell_display() {
        let avg = SummaryCell::Value {
            column: "orders".to_string(),
            op: AggregationOp::Avg,
            value: 10.0 / 3.0,
        };
        assert_eq!(avg.display_text(), "3.33");

        let sum = SummaryCell::Value {
            column: "totalSales".to_string(),
            op: AggregationOp::Sum,
            value: 150.0,
        };
        assert_eq!(sum.display_text(), "150");
        assert_eq!(SummaryCell::Blank { column: "state".to_string() }.display_text(), "");
    }

    #[test]
    fn test_header_display_value_only_for_grouped_fields() {
        let member = Record::new("1")
            .with_text("state", "Texas")
            .with_text("category", "Home");
        let header = GroupHeader {
            id: "group-Texas".to_string(),
            key: GroupKey::new(SmallVec::from_vec(vec!["Texas".to_string()]), "\u{1f}"),
            fields: vec!["state".to_string()],
            aggregates: AggregateValues::default(),
            members: vec![member],
        };
        assert_eq!(
            header.display_value("state"),
            Some(&FieldValue::Text("Texas".to_string()))
        );
        assert_eq!(header.display_value("category"), None);
        assert_eq!(header.label(), "state: Texas");
    }
}
