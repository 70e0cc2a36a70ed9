//! FILENAME: core/report-engine/src/engine.rs
//! Report Engine - The calculation core that transforms records into a view.
//!
//! Algorithm:
//! 1. Filter the raw records through the predicate evaluator
//! 2. If a GroupSpec is set: partition by composite key, aggregate each
//!    group and order headers by key
//! 3. Otherwise: apply the active sort to the flat leaves
//! 4. Page the rows and, when ungrouped, build the summary row over the page
//! 5. Derive the active-setting chips
//!
//! Every step is a pure function of its inputs; nothing is cached here.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::aggregate::{aggregate_records, AggregateAccumulator};
use crate::chips::synthesize_chips;
use crate::definition::{
    AggregationSpec, FieldDef, GroupSpec, Record, ReportSchema, ReportState, SortOrder,
    SortState,
};
use crate::filter::apply_filters;
use crate::view::{
    GroupHeader, GroupKey, GroupedRow, Pagination, ReportView, SummaryCell, SummaryRow,
    SUMMARY_LABEL,
};

/// Joins the parts of a composite group key for the header id.
///
/// Group identity and ordering use the key parts themselves, so a value that
/// happens to contain U+001F cannot merge two groups.
pub const GROUP_KEY_SEPARATOR: &str = "\u{1f}";

// ============================================================================
// SORTING
// ============================================================================

/// Stable sort of leaf records by the active sort field.
/// Empty values stay last in both directions.
pub fn sort_records(records: &mut [Record], sorter: Option<&SortState>) {
    let Some(sorter) = sorter else {
        return;
    };
    records.sort_by(|a, b| {
        let (va, vb) = (a.get(&sorter.field), b.get(&sorter.field));
        if va.is_empty() || vb.is_empty() {
            return va.compare(vb);
        }
        match sorter.order {
            SortOrder::Ascend => va.compare(vb),
            SortOrder::Descend => vb.compare(va),
        }
    });
}

// ============================================================================
// GROUPING
// ============================================================================

fn group_key_for(record: &Record, fields: &[String]) -> GroupKey {
    let parts: SmallVec<[String; 4]> = fields
        .iter()
        .map(|f| record.get(f).display_text())
        .collect();
    GroupKey::new(parts, GROUP_KEY_SEPARATOR)
}

/// Partitions `records` by the GroupSpec.
///
/// With an empty GroupSpec the records come back unchanged as leaves. Otherwise
/// one header per distinct composite key, ordered ascending by key, each
/// carrying its members (original relative order) and their aggregates.
pub fn group_records(
    records: &[Record],
    group_spec: &GroupSpec,
    aggregations: &AggregationSpec,
    schema: &ReportSchema,
) -> Vec<GroupedRow> {
    if group_spec.is_empty() {
        return records.iter().cloned().map(GroupedRow::Leaf).collect();
    }

    let fields = group_spec.fields();
    let mut index: FxHashMap<SmallVec<[String; 4]>, usize> = FxHashMap::default();
    let mut groups: Vec<(GroupKey, Vec<Record>)> = Vec::new();

    for record in records {
        let key = group_key_for(record, fields);
        match index.get(&key.parts) {
            Some(&slot) => groups[slot].1.push(record.clone()),
            None => {
                index.insert(key.parts.clone(), groups.len());
                groups.push((key, vec![record.clone()]));
            }
        }
    }

    // Field by field, so "A" < "AB" regardless of what follows.
    groups.sort_by(|(a, _), (b, _)| a.parts.cmp(&b.parts));

    groups
        .into_iter()
        .map(|(key, members)| {
            let aggregates = aggregate_records(&members, aggregations, schema);
            GroupedRow::GroupHeader(GroupHeader {
                id: format!("group-{}", key.joined),
                key,
                fields: fields.to_vec(),
                aggregates,
                members,
            })
        })
        .collect()
}

// ============================================================================
// SUMMARY ROW
// ============================================================================

/// Builds the summary row over the visible page of leaf rows.
///
/// One cell per displayed column, in display order: the first carries the
/// label, measures with an active operator carry their aggregate, the rest
/// are blank. A column that is not displayed never appears.
pub fn compute_summary_row(
    page: &[Record],
    aggregations: &AggregationSpec,
    columns: &[&FieldDef],
) -> SummaryRow {
    let cells = columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let key = column.key.clone();
            if idx == 0 {
                return SummaryCell::Label {
                    column: key,
                    text: SUMMARY_LABEL.to_string(),
                };
            }
            let op = aggregations.get(&column.key);
            if !op.is_active() {
                return SummaryCell::Blank { column: key };
            }
            match AggregateAccumulator::from_records(page, &column.key).compute(op) {
                Some(value) => SummaryCell::Value { column: key, op, value },
                None => SummaryCell::Blank { column: key },
            }
        })
        .collect();

    SummaryRow { cells }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Runs the full pipeline for one report state.
/// This is the main entry point for the calculation engine.
pub fn calculate_report(
    schema: &ReportSchema,
    records: &[Record],
    state: &ReportState,
    columns: &[&FieldDef],
    pagination: Pagination,
) -> ReportView {
    let mut filtered = apply_filters(records, &state.filters);
    let filtered_count = filtered.len();

    let rows = if state.group_spec.is_empty() {
        sort_records(&mut filtered, state.sorter.as_ref());
        filtered.into_iter().map(GroupedRow::Leaf).collect()
    } else {
        group_records(&filtered, &state.group_spec, &state.aggregations, schema)
    };

    let pagination = Pagination::new(pagination.clamped_page(rows.len()), pagination.page_size);

    let summary = if state.group_spec.is_empty() {
        let page: Vec<Record> = rows[pagination.range(rows.len())]
            .iter()
            .filter_map(GroupedRow::as_leaf)
            .cloned()
            .collect();
        Some(compute_summary_row(&page, &state.aggregations, columns))
    } else {
        None
    };

    ReportView {
        rows,
        source_count: records.len(),
        filtered_count,
        columns: columns.iter().map(|c| c.key.clone()).collect(),
        pagination,
        summary,
        chips: synthesize_chips(schema, &state.filters, &state.group_spec, &state.aggregations),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{
        AggregationOp, ColumnStateMap, FieldFilter, FieldValue, NumberRange,
    };

    fn scenario_records() -> Vec<Record> {
        vec![
            Record::new("1").with_text("state", "CA").with_number("totalSales", 100.0),
            Record::new("2").with_text("state", "CA").with_number("totalSales", 50.0),
            Record::new("3").with_text("state", "TX").with_number("totalSales", 10.0),
        ]
    }

    fn headers(rows: &[GroupedRow]) -> Vec<&GroupHeader> {
        rows.iter().filter_map(GroupedRow::as_header).collect()
    }

    #[test]
    fn test_group_by_region_with_sum() {
        let schema = ReportSchema::sales_demo();
        let aggs = AggregationSpec::new().with("totalSales", AggregationOp::Sum);
        let rows = group_records(
            &scenario_records(),
            &GroupSpec::from_fields(["state"]),
            &aggs,
            &schema,
        );

        let headers = headers(&rows);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].key.parts.as_slice(), &["CA".to_string()]);
        assert_eq!(headers[0].aggregate("totalSales"), Some(150.0));
        assert_eq!(headers[0].member_count(), 2);
        assert_eq!(headers[1].key.parts.as_slice(), &["TX".to_string()]);
        assert_eq!(headers[1].aggregate("totalSales"), Some(10.0));
        assert_eq!(headers[1].member_count(), 1);
    }

    #[test]
    fn test_empty_group_spec_is_identity() {
        let schema = ReportSchema::sales_demo();
        let records = scenario_records();
        let rows = group_records(&records, &GroupSpec::new(), &AggregationSpec::new(), &schema);
        let leaves: Vec<Record> = rows.iter().filter_map(GroupedRow::as_leaf).cloned().collect();
        assert_eq!(leaves, records);
        assert!(rows.iter().all(|r| !r.is_group()));
    }

    #[test]
    fn test_group_order_independent_of_input_order() {
        let schema = ReportSchema::sales_demo();
        let spec = GroupSpec::from_fields(["state"]);
        let mut records = scenario_records();
        let forward = group_records(&records, &spec, &AggregationSpec::new(), &schema);
        records.reverse();
        let backward = group_records(&records, &spec, &AggregationSpec::new(), &schema);

        let keys = |rows: &[GroupedRow]| -> Vec<String> {
            rows.iter().map(|r| r.id().to_string()).collect()
        };
        assert_eq!(keys(&forward), keys(&backward));
        assert_eq!(keys(&forward), vec!["group-CA".to_string(), "group-TX".to_string()]);
    }

    #[test]
    fn test_members_keep_relative_order() {
        let schema = ReportSchema::sales_demo();
        let rows = group_records(
            &scenario_records(),
            &GroupSpec::from_fields(["state"]),
            &AggregationSpec::new(),
            &schema,
        );
        let ca = headers(&rows)[0];
        let ids: Vec<&str> = ca.members.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(ca.aggregates.is_empty());
    }

    #[test]
    fn test_multi_field_key_ordering() {
        let schema = ReportSchema::sales_demo();
        let records = vec![
            Record::new("1").with_text("state", "A").with_text("category", "z"),
            Record::new("2").with_text("state", "AB").with_text("category", "a"),
            Record::new("3").with_text("state", "A").with_text("category", "b"),
        ];
        let rows = group_records(
            &records,
            &GroupSpec::from_fields(["state", "category"]),
            &AggregationSpec::new(),
            &schema,
        );
        let labels: Vec<String> = headers(&rows).iter().map(|h| h.label()).collect();
        assert_eq!(
            labels,
            vec!["state: A · category: b", "state: A · category: z", "state: AB · category: a"]
        );
    }

    #[test]
    fn test_separator_inside_values_keeps_groups_apart() {
        let schema = ReportSchema::sales_demo();
        let records = vec![
            Record::new("1")
                .with_text("state", "a\u{1f}b")
                .with_text("category", "c")
                .with_number("totalSales", 1.0),
            Record::new("2")
                .with_text("state", "a")
                .with_text("category", "b\u{1f}c")
                .with_number("totalSales", 2.0),
        ];
        let rows = group_records(
            &records,
            &GroupSpec::from_fields(["state", "category"]),
            &AggregationSpec::new().with("totalSales", AggregationOp::Sum),
            &schema,
        );
        let headers = headers(&rows);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].key.parts.as_slice(), &["a".to_string(), "b\u{1f}c".to_string()]);
        assert_eq!(headers[0].aggregate("totalSales"), Some(2.0));
        assert_eq!(headers[1].key.parts.as_slice(), &["a\u{1f}b".to_string(), "c".to_string()]);
        assert_eq!(headers[1].aggregate("totalSales"), Some(1.0));
    }

    #[test]
    fn test_sort_descending_keeps_empty_last() {
        let mut records = vec![
            Record::new("1").with_number("orders", 5.0),
            Record::new("2"),
            Record::new("3").with_number("orders", 9.0),
        ];
        sort_records(&mut records, Some(&SortState::new("orders", SortOrder::Descend)));
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_summary_row_over_empty_page_has_no_value() {
        let schema = ReportSchema::sales_demo();
        let columns = schema.visible_columns(&ColumnStateMap::new());
        let aggs = AggregationSpec::new().with("orders", AggregationOp::Avg);
        let summary = compute_summary_row(&[], &aggs, &columns);

        assert_eq!(summary.cells.len(), columns.len());
        assert_eq!(summary.cell("orders").and_then(SummaryCell::value), None);
        assert_eq!(summary.cell("orders").map(SummaryCell::display_text), Some(String::new()));
    }

    #[test]
    fn test_summary_row_skips_hidden_columns() {
        let schema = ReportSchema::sales_demo();
        let mut states = ColumnStateMap::new();
        states.insert(
            "orders".to_string(),
            crate::definition::ColumnState { show: false, ..Default::default() },
        );
        let columns = schema.visible_columns(&states);
        let aggs = AggregationSpec::new()
            .with("orders", AggregationOp::Sum)
            .with("totalSales", AggregationOp::Max);
        let page = vec![
            Record::new("1").with_number("orders", 3.0).with_number("totalSales", 7.0),
            Record::new("2").with_number("orders", 4.0).with_number("totalSales", 2.0),
        ];
        let summary = compute_summary_row(&page, &aggs, &columns);

        assert!(summary.cell("orders").is_none());
        assert_eq!(summary.cell("totalSales").and_then(SummaryCell::value), Some(7.0));
        assert_eq!(summary.cells[0].display_text(), SUMMARY_LABEL);
    }

    #[test]
    fn test_calculate_report_pages_before_summary() {
        let schema = ReportSchema::sales_demo();
        let records: Vec<Record> = (1..=25)
            .map(|i| Record::new(i.to_string()).with_number("orders", i as f64))
            .collect();
        let mut state = ReportState::new();
        state.aggregations.set("orders", AggregationOp::Sum);
        state.filters.set(
            "orders",
            Some(FieldFilter::Number(NumberRange::at_least(6.0))),
        );
        let columns = schema.visible_columns(&ColumnStateMap::new());

        let view = calculate_report(&schema, &records, &state, &columns, Pagination::new(2, 10));
        assert_eq!(view.filtered_count, 20);
        assert_eq!(view.page_rows().len(), 10);
        assert_eq!(view.page_rows()[0].id(), "16");
        // Sum of 16..=25 only, not the whole filtered set.
        let summary = view.summary.as_ref().unwrap();
        assert_eq!(summary.cell("orders").and_then(SummaryCell::value), Some(205.0));
    }

    #[test]
    fn test_grouped_report_has_no_summary() {
        let schema = ReportSchema::sales_demo();
        let mut state = ReportState::new();
        state.group_spec.add("state");
        let columns = schema.visible_columns(&ColumnStateMap::new());
        let view = calculate_report(
            &schema,
            &scenario_records(),
            &state,
            &columns,
            Pagination::default(),
        );
        assert!(view.summary.is_none());
        assert!(view.is_grouped());
        assert_eq!(
            view.group_headers().next().and_then(|h| h.display_value("state")),
            Some(&FieldValue::Text("CA".to_string()))
        );
    }
}
