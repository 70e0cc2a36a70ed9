//! FILENAME: app/report-session/tests/test_column_state.rs
//! PURPOSE: Column visibility, ordering and persistence across sessions.

mod common;

use common::TestHarness;
use report_engine::{AggregationOp, ColumnState, ColumnStateMap, Pinned};
use report_session::{ColumnStateStore, JsonFileStore, MemoryStore, SessionConfig};

fn visible_keys(h: &TestHarness) -> Vec<String> {
    h.session
        .visible_columns()
        .iter()
        .map(|f| f.key.clone())
        .collect()
}

#[test]
fn test_default_columns_follow_schema() {
    let h = TestHarness::new();
    assert_eq!(
        visible_keys(&h),
        vec!["state", "category", "totalSales", "orders", "lastOrderDate"]
    );
}

#[test]
fn test_hidden_column_leaves_summary_row() {
    let mut h = TestHarness::new();
    h.session.set_aggregation("orders", AggregationOp::Sum).unwrap();
    h.session.set_column_visible("orders", false).unwrap();

    assert!(!visible_keys(&h).contains(&"orders".to_string()));
    let summary = h.session.summary_row().cloned().unwrap();
    assert_eq!(summary.cells.len(), 4);
    assert!(summary.cell("orders").is_none());
    assert!(!h.session.view().columns.contains(&"orders".to_string()));
}

#[test]
fn test_explicit_order_wins() {
    let mut h = TestHarness::new();
    h.session
        .set_column_state(
            "lastOrderDate",
            ColumnState {
                show: true,
                fixed: Some(Pinned::Left),
                order: Some(0),
            },
        )
        .unwrap();
    assert_eq!(visible_keys(&h)[0], "lastOrderDate");
    assert!(h.session.set_column_state("region", ColumnState::default()).is_err());
}

#[test]
fn test_column_state_survives_sessions_in_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = SessionConfig::default();

    {
        let mut h = TestHarness::with_store(config.clone(), Box::new(JsonFileStore::new(dir.path())));
        h.session.set_column_visible("category", false).unwrap();
    }

    assert!(dir.path().join("report-columns-v2.json").exists());

    let h = TestHarness::with_store(config, Box::new(JsonFileStore::new(dir.path())));
    assert_eq!(h.session.columns_state().get("category").map(|s| s.show), Some(false));
    assert_eq!(
        visible_keys(&h),
        vec!["state", "totalSales", "orders", "lastOrderDate"]
    );
}

#[test]
fn test_storage_key_comes_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = SessionConfig {
        storage_key: "team-report".to_string(),
        ..SessionConfig::default()
    };
    let mut h = TestHarness::with_store(config, Box::new(JsonFileStore::new(dir.path())));
    h.session.set_column_visible("orders", false).unwrap();

    let store = JsonFileStore::new(dir.path());
    assert!(store.get("team-report").is_some());
    assert!(store.get("report-columns-v2").is_none());
}

#[test]
fn test_unreadable_stored_state_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("report-columns-v2.json"), "{ not json").unwrap();

    let h = TestHarness::with_store(SessionConfig::default(), Box::new(JsonFileStore::new(dir.path())));
    assert!(h.session.columns_state().is_empty());
    assert_eq!(visible_keys(&h).len(), 5);
}

#[test]
fn test_preloaded_memory_store() {
    let mut store = MemoryStore::new();
    let mut map = ColumnStateMap::new();
    map.insert("state".to_string(), ColumnState { show: false, ..ColumnState::default() });
    store.set("report-columns-v2", &map).unwrap();

    let h = TestHarness::with_store(SessionConfig::default(), Box::new(store));
    assert_eq!(visible_keys(&h)[0], "category");
}
