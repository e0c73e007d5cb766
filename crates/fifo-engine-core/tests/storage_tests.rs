use chrono::{Duration, Local};
use fifo_engine_core::storage::models::*;
use fifo_engine_core::storage::Store;

fn local_date(days_ago: i64) -> String {
    (Local::now() - Duration::days(days_ago))
        .format("%Y-%m-%d")
        .to_string()
}

fn make_snapshot(asset: &str, index_val: i32, category: Category, days_ago: i64, size_mb: f64) -> StorageSnapshot {
    StorageSnapshot {
        asset: asset.to_string(),
        index_val,
        category,
        measurement_date: local_date(days_ago),
        size_mb,
        file_count: 3,
    }
}

#[test]
fn test_schema_seeds_scheduler_singleton() {
    let store = Store::open_in_memory().unwrap();
    let row = store.get_schedule().unwrap();
    assert_eq!(row.schedule_hour, 3);
    assert_eq!(row.schedule_minute, 0);
    assert!(!row.is_enabled);
    assert_eq!(row.last_run, None);
}

#[test]
fn test_insert_and_get_history() {
    let store = Store::open_in_memory().unwrap();
    store.insert_snapshot(&make_snapshot("CAM_A", 1, Category::E, 0, 10.0)).unwrap();
    store.insert_snapshot(&make_snapshot("CAM_A", 1, Category::F, 1, 20.0)).unwrap();
    store.insert_snapshot(&make_snapshot("CAM_B", 2, Category::E, 2, 30.0)).unwrap();

    let all = store.get_history(14, &EntityFilter::any()).unwrap();
    assert_eq!(all.len(), 3);
    // Ordered by date ascending.
    assert_eq!(all[0].measurement_date, local_date(2));
    assert_eq!(all[2].measurement_date, local_date(0));
}

#[test]
fn test_get_history_entity_filters() {
    let store = Store::open_in_memory().unwrap();
    store.insert_snapshot(&make_snapshot("CAM_A", 1, Category::E, 0, 10.0)).unwrap();
    store.insert_snapshot(&make_snapshot("CAM_A", 2, Category::F, 0, 20.0)).unwrap();
    store.insert_snapshot(&make_snapshot("CAM_B", 1, Category::E, 0, 30.0)).unwrap();

    let by_asset = store
        .get_history(
            14,
            &EntityFilter {
                asset: "CAM_A".to_string(),
                index_val: -1,
                category: Category::Any,
            },
        )
        .unwrap();
    assert_eq!(by_asset.len(), 2);

    let by_index = store
        .get_history(
            14,
            &EntityFilter {
                asset: "CAM_A".to_string(),
                index_val: 2,
                category: Category::Any,
            },
        )
        .unwrap();
    assert_eq!(by_index.len(), 1);
    assert_eq!(by_index[0].size_mb, 20.0);

    let by_category = store
        .get_history(
            14,
            &EntityFilter {
                asset: String::new(),
                index_val: -1,
                category: Category::E,
            },
        )
        .unwrap();
    assert_eq!(by_category.len(), 2);
    assert!(by_category.iter().all(|r| r.category == Category::E));
}

#[test]
fn test_get_history_filter_values_are_bound_not_interpolated() {
    let store = Store::open_in_memory().unwrap();
    store.insert_snapshot(&make_snapshot("CAM_A", 1, Category::E, 0, 10.0)).unwrap();

    // A hostile asset value must behave as a plain (non-matching) string.
    let rows = store
        .get_history(
            14,
            &EntityFilter {
                asset: "x' OR '1'='1".to_string(),
                index_val: -1,
                category: Category::Any,
            },
        )
        .unwrap();
    assert!(rows.is_empty());
}

#[test]
fn test_same_day_duplicate_snapshots_are_kept() {
    let store = Store::open_in_memory().unwrap();
    store.insert_snapshot(&make_snapshot("CAM_A", 1, Category::E, 0, 10.0)).unwrap();
    store.insert_snapshot(&make_snapshot("CAM_A", 1, Category::E, 0, 12.0)).unwrap();

    let rows = store.get_history(14, &EntityFilter::any()).unwrap();
    assert_eq!(rows.len(), 2);

    // Today's total sums the duplicates.
    let total = store.get_total_current_mb().unwrap();
    assert!((total - 22.0).abs() < 1e-9);
}

#[test]
fn test_get_total_current_mb_ignores_other_days() {
    let store = Store::open_in_memory().unwrap();
    store.insert_snapshot(&make_snapshot("CAM_A", 1, Category::E, 0, 5.0)).unwrap();
    store.insert_snapshot(&make_snapshot("CAM_A", 1, Category::E, 1, 50.0)).unwrap();

    let total = store.get_total_current_mb().unwrap();
    assert!((total - 5.0).abs() < 1e-9);
}

#[test]
fn test_get_average_weights() {
    let store = Store::open_in_memory().unwrap();
    store.insert_snapshot(&make_snapshot("CAM_A", 1, Category::E, 0, 10.0)).unwrap();
    store.insert_snapshot(&make_snapshot("CAM_A", 1, Category::E, 1, 30.0)).unwrap();
    store.insert_snapshot(&make_snapshot("CAM_B", 1, Category::F, 0, 7.0)).unwrap();

    let weights = store.get_average_weights(14).unwrap();
    assert_eq!(weights.len(), 2);

    // Ordered by asset, so CAM_A comes first.
    let a = &weights[0];
    assert_eq!(a.asset, "CAM_A");
    assert!((a.avg_mb - 20.0).abs() < 1e-9);
    assert!((a.total_mb - 40.0).abs() < 1e-9);
    assert_eq!(a.day_count, 2);

    let b = &weights[1];
    assert_eq!(b.asset, "CAM_B");
    assert_eq!(b.day_count, 1);
}

#[test]
fn test_history_day_count() {
    let store = Store::open_in_memory().unwrap();
    assert_eq!(store.history_day_count().unwrap(), 0);

    store.insert_snapshot(&make_snapshot("CAM_A", 1, Category::E, 0, 1.0)).unwrap();
    store.insert_snapshot(&make_snapshot("CAM_B", 1, Category::E, 0, 1.0)).unwrap();
    store.insert_snapshot(&make_snapshot("CAM_A", 1, Category::E, 1, 1.0)).unwrap();

    // Two distinct dates despite three rows.
    assert_eq!(store.history_day_count().unwrap(), 2);
}

#[test]
fn test_forecast_insert_and_latest() {
    let store = Store::open_in_memory().unwrap();
    assert!(store.get_latest_forecast().unwrap().is_none());

    store.insert_forecast("2026-08-03", 120.5).unwrap();
    store.insert_forecast("2026-08-03", 130.25).unwrap();

    let latest = store.get_latest_forecast().unwrap().unwrap();
    assert_eq!(latest.forecast_date, "2026-08-03");
    assert!((latest.predicted_mb - 130.25).abs() < 1e-9);
    assert!(!latest.created_at.is_empty());
}

#[test]
fn test_deletion_log_append_and_read() {
    let store = Store::open_in_memory().unwrap();
    for i in 0..3 {
        store
            .log_deletion(&DeletionRecord {
                file_path: format!("/data/file_{}.dat", i),
                asset: "CAM_A".to_string(),
                size_mb: 1.5,
                reason: "PREDICTIVE_CLEANUP".to_string(),
                deleted_at: String::new(),
            })
            .unwrap();
    }

    let logs = store.get_deletion_logs(10).unwrap();
    assert_eq!(logs.len(), 3);
    // Newest first.
    assert_eq!(logs[0].file_path, "/data/file_2.dat");
    assert!(logs.iter().all(|l| l.reason == "PREDICTIVE_CLEANUP"));
    assert!(logs.iter().all(|l| !l.deleted_at.is_empty()));

    let limited = store.get_deletion_logs(2).unwrap();
    assert_eq!(limited.len(), 2);
}

#[test]
fn test_config_set_get_and_upsert() {
    let store = Store::open_in_memory().unwrap();
    assert_eq!(store.get_config("missing", "fallback").unwrap(), "fallback");

    store.set_config("last_run", "2026-08-01 03:00:00").unwrap();
    assert_eq!(
        store.get_config("last_run", "").unwrap(),
        "2026-08-01 03:00:00"
    );

    store.set_config("last_run", "2026-08-02 03:00:00").unwrap();
    assert_eq!(
        store.get_config("last_run", "").unwrap(),
        "2026-08-02 03:00:00"
    );
}

#[test]
fn test_update_schedule() {
    let store = Store::open_in_memory().unwrap();
    store.update_schedule(4, 30, true).unwrap();

    let row = store.get_schedule().unwrap();
    assert_eq!(row.schedule_hour, 4);
    assert_eq!(row.schedule_minute, 30);
    assert!(row.is_enabled);

    store.set_schedule_enabled(false).unwrap();
    assert!(!store.get_schedule().unwrap().is_enabled);
}

#[test]
fn test_category_wildcard_round_trips_through_store() {
    let store = Store::open_in_memory().unwrap();
    store.insert_snapshot(&make_snapshot("CAM_A", -1, Category::Any, 0, 42.0)).unwrap();

    let rows = store.get_history(14, &EntityFilter::any()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].category, Category::Any);
    assert_eq!(rows[0].index_val, -1);
}
