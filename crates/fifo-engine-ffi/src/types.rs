use std::ffi::{c_char, CStr, CString};
use std::ptr;

/// Result codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FifoResultCode {
    Ok = 0,
    Db = -1,
    Path = -2,
    Scan = -3,
    Forecast = -4,
    Cleanup = -5,
    Busy = -6,
    NoData = -7,
}

/// Action codes: 0 = safe, 1 = monitor, 2 = caution, 3 = cleanup.
pub const FIFO_ACTION_SAFE: i32 = 0;
pub const FIFO_ACTION_MONITOR: i32 = 1;
pub const FIFO_ACTION_CAUTION: i32 = 2;
pub const FIFO_ACTION_CLEANUP: i32 = 3;

/// Granularity codes: 0 = asset, 1 = asset+index, 2 = full entity.
pub const FIFO_GRAN_ASSET: i32 = 0;
pub const FIFO_GRAN_ASSET_INDEX: i32 = 1;
pub const FIFO_GRAN_ASSET_IDX_CAT: i32 = 2;

#[repr(C)]
pub struct FifoForecastResult {
    pub current_mb: f64,
    pub predicted_mb: f64,
    pub growth_rate_mb_per_day: f64,
    pub history_days_available: i32,
}

#[repr(C)]
pub struct FifoEvalResult {
    pub action: i32,
    pub projected_pct: f64,
    pub amount_to_delete_mb: f64,
}

#[repr(C)]
pub struct FifoCleanupResult {
    pub files_deleted: i32,
    pub mb_freed: f64,
    pub new_usage_mb: f64,
    pub new_usage_pct: f64,
}

#[repr(C)]
pub struct FifoFullResult {
    pub current_mb: f64,
    pub predicted_mb: f64,
    pub growth_rate: f64,
    pub limit_mb: f64,
    pub usage_pct: f64,
    pub action: i32,
    pub files_deleted: i32,
    pub mb_freed: f64,
    pub history_days: i32,
}

#[repr(C)]
pub struct FifoStatusInfo {
    pub is_scheduled: i32,
    pub schedule_hour: i32,
    pub schedule_minute: i32,
    pub last_run: [c_char; 32],
    pub next_run: [c_char; 32],
    pub current_mb: f64,
    pub predicted_mb: f64,
}

#[repr(C)]
pub struct FifoWeightInfo {
    pub asset: [c_char; 64],
    pub index_val: i32,
    pub category: c_char,
    pub avg_mb: f64,
    pub total_mb: f64,
    pub day_count: i32,
}

/// Progress callback for test-data generation.
pub type FifoProgressCallback = extern "C" fn(percent: i32, message: *const c_char);

/// Helper to convert a Rust string to a C string on the heap.
pub fn rust_string_to_c(s: &str) -> *mut c_char {
    CString::new(s)
        .map(|cs| cs.into_raw())
        .unwrap_or(ptr::null_mut())
}

/// Helper to convert a C string to a Rust string.
///
/// # Safety
/// The caller must ensure `ptr` is a valid null-terminated C string.
pub unsafe fn c_string_to_rust(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Copy `s` into a fixed-size C char buffer, always NUL-terminated.
pub fn copy_to_c_buf(s: &str, buf: &mut [c_char]) {
    let max = buf.len().saturating_sub(1);
    for (i, byte) in s.bytes().take(max).enumerate() {
        buf[i] = byte as c_char;
    }
    let end = s.len().min(max);
    buf[end] = 0;
}
