pub mod walk;

use crate::error::Error;
use crate::storage::models::{FileRecord, StorageSnapshot};
use crate::storage::Store;

pub use walk::scan_tree;

/// Projection level for aggregated scan output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Keep only the asset; index and category are projected out.
    Asset = 0,
    /// Keep asset and index; category is projected out.
    AssetIndex = 1,
    /// Keep the full (asset, index, category) entity.
    AssetIndexCategory = 2,
}

impl Granularity {
    pub fn keeps_index(self) -> bool {
        !matches!(self, Granularity::Asset)
    }

    pub fn keeps_category(self) -> bool {
        matches!(self, Granularity::AssetIndexCategory)
    }
}

impl TryFrom<i32> for Granularity {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Error> {
        match value {
            0 => Ok(Granularity::Asset),
            1 => Ok(Granularity::AssetIndex),
            2 => Ok(Granularity::AssetIndexCategory),
            _ => Err(Error::InvalidGranularity(value)),
        }
    }
}

/// Output of a full tree walk: totals, the per-file list retained for
/// cleanup, and aggregated snapshot rows stamped with today's date.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub total_mb: f64,
    pub total_files: usize,
    pub entries: Vec<StorageSnapshot>,
    pub files: Vec<FileRecord>,
}

/// Persist the aggregated entries of a scan as today's snapshot rows.
pub fn store_scan_results(store: &Store, result: &ScanResult) -> Result<(), Error> {
    for entry in &result.entries {
        store.insert_snapshot(entry)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granularity_from_i32() {
        assert_eq!(Granularity::try_from(0).unwrap(), Granularity::Asset);
        assert_eq!(Granularity::try_from(2).unwrap(), Granularity::AssetIndexCategory);
        assert!(Granularity::try_from(3).is_err());
        assert!(Granularity::try_from(-1).is_err());
    }

    #[test]
    fn test_granularity_projection_flags() {
        assert!(!Granularity::Asset.keeps_index());
        assert!(Granularity::AssetIndex.keeps_index());
        assert!(!Granularity::AssetIndex.keeps_category());
        assert!(Granularity::AssetIndexCategory.keeps_category());
    }
}
