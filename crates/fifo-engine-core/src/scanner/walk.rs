use super::{Granularity, ScanResult};
use crate::error::Error;
use crate::platform;
use crate::storage::models::{Category, EntityKey, FileRecord, StorageSnapshot};
use dashmap::DashMap;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Walk the fixed six-level schema `asset/<digits>/[EF]/YYYY/MM/DD/<files>`
/// under `root`. Entries that do not match the shape at any level are
/// silently skipped. Asset subtrees are walked in parallel; aggregation is
/// keyed by the granularity-projected entity.
pub fn scan_tree(root: &Path, granularity: Granularity) -> Result<ScanResult, Error> {
    let asset_dirs = match fs::read_dir(root) {
        Ok(entries) => entries
            .flatten()
            .filter(|e| e.path().is_dir())
            .map(|e| e.path())
            .collect::<Vec<_>>(),
        Err(e) => {
            warn!("Cannot read root directory {}: {}", root.display(), e);
            return Err(Error::InvalidPath(root.display().to_string()));
        }
    };

    let aggregate: DashMap<EntityKey, (f64, i64)> = DashMap::new();
    let files: Vec<FileRecord> = asset_dirs
        .par_iter()
        .flat_map(|asset_dir| walk_asset(asset_dir, granularity, &aggregate))
        .collect();

    let total_mb: f64 = files.iter().map(|f| f.size_mb).sum();
    let total_files = files.len();

    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    let mut entries: Vec<StorageSnapshot> = aggregate
        .into_iter()
        .map(|(key, (size_mb, file_count))| StorageSnapshot {
            asset: key.asset,
            index_val: key.index_val,
            category: key.category,
            measurement_date: today.clone(),
            size_mb,
            file_count,
        })
        .collect();
    entries.sort_by(|a, b| {
        (&a.asset, a.index_val, a.category).cmp(&(&b.asset, b.index_val, b.category))
    });

    debug!(
        "Scan of {} complete: {} files, {:.2} MB, {} aggregate entries",
        root.display(),
        total_files,
        total_mb,
        entries.len(),
    );

    Ok(ScanResult {
        total_mb,
        total_files,
        entries,
        files,
    })
}

/// Walk one asset subtree, pushing per-file records and folding sizes into
/// the shared aggregate map. Unreadable directories contribute nothing.
fn walk_asset(
    asset_dir: &Path,
    granularity: Granularity,
    aggregate: &DashMap<EntityKey, (f64, i64)>,
) -> Vec<FileRecord> {
    let mut files = Vec::new();
    let asset = match asset_dir.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_string(),
        None => return files,
    };

    for (index_dir, index_name) in numeric_subdirs(asset_dir, None) {
        let index_val: i32 = match index_name.parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        for (category_dir, category) in category_subdirs(&index_dir) {
            for (year_dir, year) in numeric_subdirs(&category_dir, Some(4)) {
                for (month_dir, month) in numeric_subdirs(&year_dir, Some(2)) {
                    for (day_dir, day) in numeric_subdirs(&month_dir, Some(2)) {
                        let date = format!("{}-{}-{}", year, month, day);
                        collect_day_files(
                            &day_dir,
                            &asset,
                            index_val,
                            category,
                            &date,
                            granularity,
                            aggregate,
                            &mut files,
                        );
                    }
                }
            }
        }
    }

    files
}

#[allow(clippy::too_many_arguments)]
fn collect_day_files(
    day_dir: &Path,
    asset: &str,
    index_val: i32,
    category: Category,
    date: &str,
    granularity: Granularity,
    aggregate: &DashMap<EntityKey, (f64, i64)>,
    files: &mut Vec<FileRecord>,
) {
    let entries = match fs::read_dir(day_dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let metadata = match entry.metadata() {
            Ok(md) if md.is_file() => md,
            _ => continue,
        };

        let size_mb = metadata.len() as f64 / BYTES_PER_MB;
        let created_time = platform::modified_epoch_secs(&metadata);

        files.push(FileRecord {
            full_path: path,
            size_mb,
            created_time,
            asset: asset.to_string(),
            index_val,
            category,
            date: date.to_string(),
        });

        let key = EntityKey {
            asset: asset.to_string(),
            index_val: if granularity.keeps_index() { index_val } else { -1 },
            category: if granularity.keeps_category() {
                category
            } else {
                Category::Any
            },
        };
        let mut slot = aggregate.entry(key).or_insert((0.0, 0));
        slot.0 += size_mb;
        slot.1 += 1;
    }
}

/// Subdirectories whose names are all digits, optionally of an exact width.
/// Returns (path, name) pairs; everything else is skipped.
fn numeric_subdirs(dir: &Path, width: Option<usize>) -> Vec<(PathBuf, String)> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    entries
        .flatten()
        .filter(|e| e.path().is_dir())
        .filter_map(|e| {
            let name = e.file_name().to_str()?.to_string();
            if !is_numeric(&name) {
                return None;
            }
            if let Some(w) = width {
                if name.len() != w {
                    return None;
                }
            }
            Some((e.path(), name))
        })
        .collect()
}

/// The `E`/`F` level. Case-sensitive; any other name is skipped.
fn category_subdirs(dir: &Path) -> Vec<(PathBuf, Category)> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    entries
        .flatten()
        .filter(|e| e.path().is_dir())
        .filter_map(|e| {
            let category = match e.file_name().to_str()? {
                "E" => Category::E,
                "F" => Category::F,
                _ => return None,
            };
            Some((e.path(), category))
        })
        .collect()
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric() {
        assert!(is_numeric("2024"));
        assert!(is_numeric("07"));
        assert!(!is_numeric(""));
        assert!(!is_numeric("20x4"));
        assert!(!is_numeric("-3"));
    }
}
