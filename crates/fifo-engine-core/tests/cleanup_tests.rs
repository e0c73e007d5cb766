use fifo_engine_core::cleanup::{execute_cleanup, CleanupLimits, CLEANUP_REASON};
use fifo_engine_core::storage::models::{Category, FileRecord};
use fifo_engine_core::storage::Store;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const HOUR: i64 = 3600;

fn now_epoch() -> i64 {
    chrono::Local::now().timestamp()
}

/// Create a real 1 MB-labelled file on disk and its candidate record.
fn make_candidate(
    dir: &Path,
    asset: &str,
    index_val: i32,
    seq: usize,
    age_secs: i64,
) -> FileRecord {
    let path = dir.join(format!("{}_{}_{}.dat", asset, index_val, seq));
    fs::write(&path, b"payload").unwrap();
    FileRecord {
        full_path: path,
        size_mb: 1.0,
        created_time: now_epoch() - age_secs,
        asset: asset.to_string(),
        index_val,
        category: Category::E,
        date: "2026-07-01".to_string(),
    }
}

#[test]
fn test_zero_amount_is_a_noop() {
    let store = Store::open_in_memory().unwrap();
    let dir = tempdir().unwrap();
    let mut files = vec![make_candidate(dir.path(), "CAM_A", 1, 0, 48 * HOUR)];

    let stats = execute_cleanup(&store, &mut files, 0.0, CleanupLimits::default()).unwrap();
    assert_eq!(stats.files_deleted, 0);
    assert_eq!(stats.mb_freed, 0.0);
    assert!(files[0].full_path.exists());
}

#[test]
fn test_empty_candidate_list() {
    let store = Store::open_in_memory().unwrap();
    let mut files: Vec<FileRecord> = Vec::new();
    let stats = execute_cleanup(&store, &mut files, 100.0, CleanupLimits::default()).unwrap();
    assert_eq!(stats.files_deleted, 0);
}

#[test]
fn test_cleanup_hits_target_across_entities() {
    let store = Store::open_in_memory().unwrap();
    let dir = tempdir().unwrap();

    // 10 entities with 30 old 1 MB files each.
    let mut files = Vec::new();
    for entity in 0..10 {
        let asset = format!("CAM_{:02}", entity);
        for seq in 0..30 {
            files.push(make_candidate(dir.path(), &asset, 1, seq, 48 * HOUR + seq as i64));
        }
    }

    let stats = execute_cleanup(&store, &mut files, 50.0, CleanupLimits::default()).unwrap();
    assert_eq!(stats.files_deleted, 50);
    assert!((stats.mb_freed - 50.0).abs() < 1e-9);

    // No entity dropped below the floor of 5.
    for entity in 0..10 {
        let asset = format!("CAM_{:02}", entity);
        let remaining = files
            .iter()
            .filter(|f| f.asset == asset && f.full_path.exists())
            .count();
        assert!(remaining >= 5, "entity {} has {} files left", asset, remaining);
    }
}

#[test]
fn test_oldest_files_deleted_first() {
    let store = Store::open_in_memory().unwrap();
    let dir = tempdir().unwrap();

    let mut files = Vec::new();
    for seq in 0..10 {
        // seq 0 is the newest, seq 9 the oldest.
        files.push(make_candidate(dir.path(), "CAM_A", 1, seq, 48 * HOUR + seq as i64 * HOUR));
    }

    let stats = execute_cleanup(&store, &mut files, 2.0, CleanupLimits::default()).unwrap();
    assert_eq!(stats.files_deleted, 2);

    // The two oldest are gone; the rest remain.
    let mut sorted = files.clone();
    sorted.sort_by_key(|f| f.created_time);
    assert!(!sorted[0].full_path.exists());
    assert!(!sorted[1].full_path.exists());
    for rec in &sorted[2..] {
        assert!(rec.full_path.exists());
    }
}

#[test]
fn test_retention_protects_recent_files() {
    let store = Store::open_in_memory().unwrap();
    let dir = tempdir().unwrap();

    let mut files = Vec::new();
    for seq in 0..8 {
        files.push(make_candidate(dir.path(), "CAM_A", 1, seq, 48 * HOUR));
    }
    for seq in 8..16 {
        // Inside the 24-hour retention window.
        files.push(make_candidate(dir.path(), "CAM_A", 1, seq, HOUR));
    }

    let stats = execute_cleanup(&store, &mut files, 100.0, CleanupLimits::default()).unwrap();

    // 16 candidates, floor of 5 allows 11 deletions, but only the 8 old
    // files are eligible.
    assert_eq!(stats.files_deleted, 8);
    for rec in files.iter().filter(|f| f.created_time > now_epoch() - 24 * HOUR) {
        assert!(rec.full_path.exists(), "recent file was deleted");
    }
}

#[test]
fn test_per_entity_floor_binds() {
    let store = Store::open_in_memory().unwrap();
    let dir = tempdir().unwrap();

    // Per entity: 6 old files and 4 recent ones.
    let mut files = Vec::new();
    for entity in 0..3 {
        let asset = format!("CAM_{:02}", entity);
        for seq in 0..6 {
            files.push(make_candidate(dir.path(), &asset, 1, seq, 48 * HOUR + seq as i64));
        }
        for seq in 6..10 {
            files.push(make_candidate(dir.path(), &asset, 1, seq, HOUR));
        }
    }

    let stats = execute_cleanup(&store, &mut files, 1000.0, CleanupLimits::default()).unwrap();

    // Each entity starts at 10; the floor stops deletion at 5 remaining,
    // so 5 of the 6 eligible files go and one old file survives.
    assert_eq!(stats.files_deleted, 15);
    for entity in 0..3 {
        let asset = format!("CAM_{:02}", entity);
        let remaining = files
            .iter()
            .filter(|f| f.asset == asset && f.full_path.exists())
            .count();
        assert_eq!(remaining, 5);
    }
}

#[test]
fn test_max_deletions_cap() {
    let store = Store::open_in_memory().unwrap();
    let dir = tempdir().unwrap();

    let mut files = Vec::new();
    for seq in 0..20 {
        files.push(make_candidate(dir.path(), "CAM_A", 1, seq, 48 * HOUR + seq as i64));
    }

    let limits = CleanupLimits {
        min_retention_hours: 24,
        max_deletions: 3,
    };
    let stats = execute_cleanup(&store, &mut files, 1000.0, limits).unwrap();
    assert_eq!(stats.files_deleted, 3);
}

#[test]
fn test_overshoot_bounded_by_one_file() {
    let store = Store::open_in_memory().unwrap();
    let dir = tempdir().unwrap();

    let mut files = Vec::new();
    for seq in 0..20 {
        files.push(make_candidate(dir.path(), "CAM_A", 1, seq, 48 * HOUR + seq as i64));
    }

    let amount = 2.5;
    let stats = execute_cleanup(&store, &mut files, amount, CleanupLimits::default()).unwrap();
    let largest = files.iter().map(|f| f.size_mb).fold(0.0f64, f64::max);
    assert!(stats.mb_freed <= amount + largest);
    assert!(stats.mb_freed >= amount);
}

#[test]
fn test_vanished_file_skipped_silently() {
    let store = Store::open_in_memory().unwrap();
    let dir = tempdir().unwrap();

    let mut files = Vec::new();
    for seq in 0..10 {
        files.push(make_candidate(dir.path(), "CAM_A", 1, seq, 48 * HOUR + seq as i64));
    }
    // Remove the oldest from disk behind the cleaner's back.
    let mut sorted = files.clone();
    sorted.sort_by_key(|f| f.created_time);
    fs::remove_file(&sorted[0].full_path).unwrap();

    let stats = execute_cleanup(&store, &mut files, 2.0, CleanupLimits::default()).unwrap();
    assert_eq!(stats.files_deleted, 2);

    // The vanished file produced no ledger entry.
    let logs = store.get_deletion_logs(100).unwrap();
    assert_eq!(logs.len(), 2);
    assert!(logs
        .iter()
        .all(|l| l.file_path != sorted[0].full_path.display().to_string()));
}

#[test]
fn test_every_deletion_is_ledgered() {
    let store = Store::open_in_memory().unwrap();
    let dir = tempdir().unwrap();

    let mut files = Vec::new();
    for seq in 0..10 {
        files.push(make_candidate(dir.path(), "CAM_A", 2, seq, 48 * HOUR + seq as i64));
    }

    let stats = execute_cleanup(&store, &mut files, 4.0, CleanupLimits::default()).unwrap();
    assert_eq!(stats.files_deleted, 4);

    let logs = store.get_deletion_logs(100).unwrap();
    assert_eq!(logs.len(), 4);
    for log in &logs {
        assert_eq!(log.reason, CLEANUP_REASON);
        assert_eq!(log.asset, "CAM_A");
        assert!((log.size_mb - 1.0).abs() < 1e-9);
    }
}
