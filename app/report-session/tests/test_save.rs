//! FILENAME: app/report-session/tests/test_save.rs
//! PURPOSE: Save form validation, sink submission and the saved wire shape.

mod common;

use chrono::{TimeZone, Utc};
use common::{date, strings, TestHarness};
use report_engine::{
    DateRange, FieldFilter, NumberRange, ReportDefinition, ReportSchema, SaveMode, SortOrder,
};
use report_session::{MemorySink, SaveForm, SessionError, SinkError};
use serde_json::Value;

fn configured() -> TestHarness {
    let mut h = TestHarness::new();
    h.session
        .set_filter("state", Some(FieldFilter::Values(strings(&["Texas", "Ohio"]))))
        .unwrap();
    h.session
        .set_filter("orders", Some(FieldFilter::Number(NumberRange::new(Some(5.0), Some(50.0)))))
        .unwrap();
    h.session
        .set_filter(
            "lastOrderDate",
            Some(FieldFilter::Date(DateRange::new(Some(date(2025, 1, 1)), Some(date(2025, 6, 30)), true))),
        )
        .unwrap();
    h.session.set_sort("orders", SortOrder::Descend).unwrap();
    h.session.set_column_visible("category", false).unwrap();
    h
}

#[test]
fn test_blank_form_is_rejected_before_submit() {
    let h = configured();
    let mut sink = MemorySink::new();
    let form = SaveForm::new("  ", "", SaveMode::Save);

    let err = h.session.save(&form, &mut sink).unwrap_err();
    match err {
        SessionError::Validation(missing) => assert_eq!(missing, strings(&["name", "group"])),
        other => panic!("unexpected error {:?}", other),
    }
    assert!(sink.submitted().is_empty());
}

#[test]
fn test_save_submits_once() {
    let h = configured();
    let mut sink = MemorySink::new();
    let form = SaveForm::new(" Texas orders ", "Sales", SaveMode::SaveAsNew).with_description("   ");
    let created = Utc.with_ymd_and_hms(2025, 7, 1, 9, 30, 0).unwrap();

    let saved = h.session.save_at(&form, &mut sink, created).unwrap();

    assert_eq!(sink.submitted(), &[saved.clone()]);
    assert_eq!(saved.meta.name, "Texas orders");
    assert_eq!(saved.meta.description, None);
    assert_eq!(saved.data_source_id, "sales-demo");
    assert_eq!(saved.created_at, created);
}

#[test]
fn test_saved_wire_shape() {
    let h = configured();
    let mut sink = MemorySink::new();
    let form = SaveForm::new("Texas orders", "Sales", SaveMode::Save).with_description("weekly");
    let saved = h
        .session
        .save_at(&form, &mut sink, Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap())
        .unwrap();

    let json: Value = serde_json::from_str(&saved.to_json().unwrap()).unwrap();
    assert_eq!(json["meta"]["mode"], "save");
    assert_eq!(json["meta"]["description"], "weekly");
    assert_eq!(json["createdAt"], "2025-07-01T00:00:00Z");
    assert_eq!(json["columnsStateMap"]["category"]["show"], false);
    assert_eq!(json["sorter"]["field"], "orders");
    assert_eq!(json["sorter"]["order"], "descend");
    assert_eq!(json["filters"]["state"], serde_json::json!(["Texas", "Ohio"]));
    assert!(json["filters"]["category"].is_null());
    assert_eq!(json["filters"]["orders"], serde_json::json!({"min": 5.0, "max": 50.0}));
    assert_eq!(
        json["filters"]["lastOrderDate"],
        serde_json::json!({"start": "2025-01-01", "end": null, "noEnd": true})
    );
}

#[test]
fn test_saved_definition_restores_filters() {
    let h = configured();
    let mut sink = MemorySink::new();
    let form = SaveForm::new("Texas orders", "Sales", SaveMode::Save);
    let saved = h.session.save(&form, &mut sink).unwrap();

    let restored = ReportDefinition::from_json(&saved.to_json().unwrap()).unwrap();
    let filters = restored.filter_set(&ReportSchema::sales_demo());
    assert_eq!(filters.values("state"), h.session.state().filters.values("state"));
    assert_eq!(filters.number_range("orders"), h.session.state().filters.number_range("orders"));
    let range = filters.date_range("lastOrderDate").unwrap();
    assert!(range.no_end);
    assert_eq!(range.effective_end(), None);
    assert_eq!(restored.sort_state(), h.session.sort().cloned());
}

#[test]
fn test_sink_failure_is_reported() {
    let h = configured();
    let mut sink = MemorySink::rejecting("quota exceeded");
    let form = SaveForm::new("Texas orders", "Sales", SaveMode::Save);

    let err = h.session.save(&form, &mut sink).unwrap_err();
    assert!(matches!(err, SessionError::Sink(SinkError::Rejected(_))));
    assert!(sink.submitted().is_empty());
}
