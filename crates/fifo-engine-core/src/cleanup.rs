use crate::error::Error;
use crate::platform;
use crate::storage::models::{DeletionRecord, EntityKey, FileRecord};
use crate::storage::Store;
use std::collections::HashMap;
use tracing::{debug, info};

/// Ledger reason recorded for every file this module deletes.
pub const CLEANUP_REASON: &str = "PREDICTIVE_CLEANUP";

/// Minimum number of files preserved per entity.
const PER_ENTITY_FLOOR: i64 = 5;

/// Safety bounds for a cleanup pass.
#[derive(Debug, Clone, Copy)]
pub struct CleanupLimits {
    /// Files newer than this many hours are immune from deletion.
    pub min_retention_hours: i64,
    /// Hard cap on deletions per pass.
    pub max_deletions: usize,
}

impl Default for CleanupLimits {
    fn default() -> Self {
        CleanupLimits {
            min_retention_hours: 24,
            max_deletions: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupStats {
    pub files_deleted: usize,
    pub mb_freed: f64,
}

/// Delete the oldest candidates until `amount_to_delete_mb` is freed, the
/// deletion cap is hit, or no eligible file remains. Files inside the
/// retention window are skipped, and every entity keeps at least
/// `PER_ENTITY_FLOOR` files. Each successful deletion is recorded in the
/// ledger; per-file failures are skipped without aborting the pass.
pub fn execute_cleanup(
    store: &Store,
    files: &mut [FileRecord],
    amount_to_delete_mb: f64,
    limits: CleanupLimits,
) -> Result<CleanupStats, Error> {
    let mut stats = CleanupStats::default();
    if amount_to_delete_mb <= 0.0 || files.is_empty() {
        return Ok(stats);
    }

    let now = chrono::Local::now().timestamp();
    let cutoff = now - limits.min_retention_hours * 3600;

    // Oldest first. Ties keep candidate order.
    files.sort_by_key(|f| f.created_time);

    let mut entity_counts: HashMap<EntityKey, i64> = HashMap::new();
    for file in files.iter() {
        *entity_counts.entry(file.entity()).or_insert(0) += 1;
    }

    for file in files.iter() {
        if stats.mb_freed >= amount_to_delete_mb || stats.files_deleted >= limits.max_deletions {
            break;
        }

        if file.created_time > cutoff {
            continue;
        }

        let key = file.entity();
        if entity_counts.get(&key).copied().unwrap_or(0) <= PER_ENTITY_FLOOR {
            continue;
        }

        match platform::remove_file(&file.full_path) {
            Ok(()) => {
                store.log_deletion(&DeletionRecord {
                    file_path: file.full_path.display().to_string(),
                    asset: file.asset.clone(),
                    size_mb: file.size_mb,
                    reason: CLEANUP_REASON.to_string(),
                    deleted_at: String::new(),
                })?;
                stats.mb_freed += file.size_mb;
                stats.files_deleted += 1;
                if let Some(count) = entity_counts.get_mut(&key) {
                    *count -= 1;
                }
            }
            Err(e) => {
                debug!("Skipping {}: {}", file.full_path.display(), e);
            }
        }
    }

    info!(
        "Cleanup freed {:.2} MB across {} files (target {:.2} MB)",
        stats.mb_freed, stats.files_deleted, amount_to_delete_mb,
    );
    Ok(stats)
}
