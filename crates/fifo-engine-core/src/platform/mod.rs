use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Permanently delete a file. Deletion is terminal; there is no trash step.
pub fn remove_file(path: &Path) -> std::io::Result<()> {
    fs::remove_file(path)
}

/// Last-write timestamp of a file as seconds since the Unix epoch.
/// Returns 0 when the platform cannot report a modification time.
pub fn modified_epoch_secs(metadata: &fs::Metadata) -> i64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
