use crate::callbacks::FfiProgressBridge;
use crate::error::{map_core_error, set_last_error};
use crate::handle::{allocate_handle, destroy_handle, with_handle};
use crate::types::*;
use fifo_engine_core::scheduler::{ScheduleJob, ScheduleMode};
use fifo_engine_core::{Engine, Granularity, SilentReporter};
use std::ffi::c_char;
use std::path::{Path, PathBuf};

fn invalid_handle() -> FifoResultCode {
    set_last_error("Invalid engine handle".to_string());
    FifoResultCode::Db
}

fn parse_granularity(value: i32) -> Result<Granularity, FifoResultCode> {
    Granularity::try_from(value).map_err(map_core_error)
}

/// Create a new engine instance against the database at `db_path`.
/// Returns a handle (u64) or 0 on failure.
///
/// # Safety
/// `db_path` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn fifo_engine_create(db_path: *const c_char) -> u64 {
    let db_path_str = match c_string_to_rust(db_path) {
        Some(s) => s,
        None => "fifo_engine.db".to_string(),
    };

    match Engine::open(&db_path_str) {
        Ok(engine) => allocate_handle(engine),
        Err(e) => {
            set_last_error(format!("Failed to open engine: {}", e));
            0
        }
    }
}

/// Destroy an engine instance: stops its scheduler and closes its store.
#[no_mangle]
pub extern "C" fn fifo_engine_destroy(handle: u64) -> FifoResultCode {
    if destroy_handle(handle) {
        FifoResultCode::Ok
    } else {
        invalid_handle()
    }
}

/// Scan the archive root and persist today's aggregated snapshot.
///
/// # Safety
/// `root_path` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn fifo_scan(
    handle: u64,
    root_path: *const c_char,
    granularity: i32,
) -> FifoResultCode {
    let root = match c_string_to_rust(root_path) {
        Some(s) => s,
        None => {
            set_last_error("root_path is null".to_string());
            return FifoResultCode::Path;
        }
    };
    let granularity = match parse_granularity(granularity) {
        Ok(g) => g,
        Err(code) => return code,
    };

    let result = with_handle(handle, |engine| {
        match engine.scan(Path::new(&root), granularity) {
            Ok(_) => FifoResultCode::Ok,
            Err(e) => map_core_error(e),
        }
    });

    result.unwrap_or_else(invalid_handle)
}

/// Compute and persist a forecast from history plus the last scan.
///
/// # Safety
/// `out` may be null; when non-null it must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn fifo_forecast(
    handle: u64,
    out: *mut FifoForecastResult,
) -> FifoResultCode {
    let result = with_handle(handle, |engine| match engine.forecast() {
        Ok(data) => {
            if !out.is_null() {
                *out = FifoForecastResult {
                    current_mb: data.current_mb,
                    predicted_mb: data.predicted_mb,
                    growth_rate_mb_per_day: data.growth_rate,
                    history_days_available: data.days_available as i32,
                };
            }
            FifoResultCode::Ok
        }
        Err(e) => map_core_error(e),
    });

    result.unwrap_or_else(invalid_handle)
}

/// Map the cached forecast against a capacity limit.
///
/// # Safety
/// `out` may be null; when non-null it must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn fifo_evaluate(
    handle: u64,
    limit_mb: f64,
    out: *mut FifoEvalResult,
) -> FifoResultCode {
    let result = with_handle(handle, |engine| {
        let eval = engine.evaluate(limit_mb);
        if !out.is_null() {
            *out = FifoEvalResult {
                action: eval.action as i32,
                projected_pct: eval.projected_pct,
                amount_to_delete_mb: eval.amount_to_delete_mb,
            };
        }
        FifoResultCode::Ok
    });

    result.unwrap_or_else(invalid_handle)
}

/// FIFO cleanup against the cached scan, down to `target_pct` of the limit.
///
/// # Safety
/// `out` may be null; when non-null it must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn fifo_cleanup(
    handle: u64,
    limit_mb: f64,
    target_pct: f64,
    out: *mut FifoCleanupResult,
) -> FifoResultCode {
    let result = with_handle(handle, |engine| {
        match engine.cleanup(limit_mb, target_pct) {
            Ok(outcome) => {
                if !out.is_null() {
                    *out = FifoCleanupResult {
                        files_deleted: outcome.files_deleted as i32,
                        mb_freed: outcome.mb_freed,
                        new_usage_mb: outcome.new_usage_mb,
                        new_usage_pct: outcome.new_usage_pct,
                    };
                }
                FifoResultCode::Ok
            }
            Err(e) => map_core_error(e),
        }
    });

    result.unwrap_or_else(invalid_handle)
}

/// Run the full scan → forecast → evaluate → cleanup cycle. `target_pct`
/// is accepted for ABI stability; the cycle's cleanup amount comes from
/// the evaluator's fixed recovery target.
///
/// # Safety
/// `root_path` must be a valid null-terminated C string; `out` may be null.
#[no_mangle]
pub unsafe extern "C" fn fifo_execute_full(
    handle: u64,
    root_path: *const c_char,
    granularity: i32,
    limit_mb: f64,
    _target_pct: f64,
    out: *mut FifoFullResult,
) -> FifoResultCode {
    let root = match c_string_to_rust(root_path) {
        Some(s) => s,
        None => {
            set_last_error("root_path is null".to_string());
            return FifoResultCode::Path;
        }
    };
    let granularity = match parse_granularity(granularity) {
        Ok(g) => g,
        Err(code) => return code,
    };

    let result = with_handle(handle, |engine| {
        match engine.execute_full(Path::new(&root), granularity, limit_mb) {
            Ok(report) => {
                if !out.is_null() {
                    *out = FifoFullResult {
                        current_mb: report.current_mb,
                        predicted_mb: report.predicted_mb,
                        growth_rate: report.growth_rate,
                        limit_mb: report.limit_mb,
                        usage_pct: report.usage_pct,
                        action: report.action as i32,
                        files_deleted: report.files_deleted as i32,
                        mb_freed: report.mb_freed,
                        history_days: report.history_days as i32,
                    };
                }
                FifoResultCode::Ok
            }
            Err(e) => map_core_error(e),
        }
    });

    result.unwrap_or_else(invalid_handle)
}

/// Generate a synthetic 14-day archive with matching history rows.
///
/// # Safety
/// `root_path` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn fifo_generate_test_data(
    handle: u64,
    root_path: *const c_char,
    size_gb: f64,
    callback: Option<FifoProgressCallback>,
) -> FifoResultCode {
    let root = match c_string_to_rust(root_path) {
        Some(s) => s,
        None => {
            set_last_error("root_path is null".to_string());
            return FifoResultCode::Path;
        }
    };

    let result = with_handle(handle, |engine| {
        let outcome = match callback {
            Some(cb) => {
                engine.generate_test_data(Path::new(&root), size_gb, &FfiProgressBridge::new(cb))
            }
            None => engine.generate_test_data(Path::new(&root), size_gb, &SilentReporter),
        };
        match outcome {
            Ok(()) => FifoResultCode::Ok,
            Err(e) => map_core_error(e),
        }
    });

    result.unwrap_or_else(invalid_handle)
}

/// Generate one synthetic day of data, `day_offset` days from today.
///
/// # Safety
/// `root_path` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn fifo_generate_one_day(
    handle: u64,
    root_path: *const c_char,
    day_size_mb: f64,
    day_offset: i32,
    callback: Option<FifoProgressCallback>,
) -> FifoResultCode {
    let root = match c_string_to_rust(root_path) {
        Some(s) => s,
        None => {
            set_last_error("root_path is null".to_string());
            return FifoResultCode::Path;
        }
    };

    let result = with_handle(handle, |engine| {
        let offset = i64::from(day_offset);
        let outcome = match callback {
            Some(cb) => engine.generate_one_day(
                Path::new(&root),
                day_size_mb,
                offset,
                &FfiProgressBridge::new(cb),
            ),
            None => engine.generate_one_day(Path::new(&root), day_size_mb, offset, &SilentReporter),
        };
        match outcome {
            Ok(()) => FifoResultCode::Ok,
            Err(e) => map_core_error(e),
        }
    });

    result.unwrap_or_else(invalid_handle)
}

fn schedule_job(
    root: String,
    granularity: Granularity,
    limit_mb: f64,
    target_pct: f64,
    mode: ScheduleMode,
) -> ScheduleJob {
    ScheduleJob {
        root_path: PathBuf::from(root),
        granularity,
        limit_mb,
        target_pct,
        mode,
    }
}

/// Start the background scheduler in daily mode. Returns `Busy` when a
/// worker is already running.
///
/// # Safety
/// `root_path` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn fifo_schedule_start(
    handle: u64,
    root_path: *const c_char,
    granularity: i32,
    limit_mb: f64,
    target_pct: f64,
    hour: i32,
    minute: i32,
) -> FifoResultCode {
    let root = match c_string_to_rust(root_path) {
        Some(s) => s,
        None => {
            set_last_error("root_path is null".to_string());
            return FifoResultCode::Path;
        }
    };
    let granularity = match parse_granularity(granularity) {
        Ok(g) => g,
        Err(code) => return code,
    };
    let mode = ScheduleMode::Daily {
        hour: hour.clamp(0, 23) as u32,
        minute: minute.clamp(0, 59) as u32,
    };

    let result = with_handle(handle, |engine| {
        match engine.schedule_start(schedule_job(root, granularity, limit_mb, target_pct, mode)) {
            Ok(()) => FifoResultCode::Ok,
            Err(e) => map_core_error(e),
        }
    });

    result.unwrap_or_else(invalid_handle)
}

/// Start the background scheduler in fixed-interval mode.
///
/// # Safety
/// `root_path` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn fifo_schedule_start_interval(
    handle: u64,
    root_path: *const c_char,
    granularity: i32,
    limit_mb: f64,
    target_pct: f64,
    interval_minutes: i32,
) -> FifoResultCode {
    let root = match c_string_to_rust(root_path) {
        Some(s) => s,
        None => {
            set_last_error("root_path is null".to_string());
            return FifoResultCode::Path;
        }
    };
    let granularity = match parse_granularity(granularity) {
        Ok(g) => g,
        Err(code) => return code,
    };
    let mode = ScheduleMode::Interval {
        minutes: interval_minutes.max(1) as u32,
    };

    let result = with_handle(handle, |engine| {
        match engine.schedule_start(schedule_job(root, granularity, limit_mb, target_pct, mode)) {
            Ok(()) => FifoResultCode::Ok,
            Err(e) => map_core_error(e),
        }
    });

    result.unwrap_or_else(invalid_handle)
}

/// Stop the background scheduler; returns within about one second.
#[no_mangle]
pub extern "C" fn fifo_schedule_stop(handle: u64) -> FifoResultCode {
    let result = with_handle(handle, |engine| match engine.schedule_stop() {
        Ok(()) => FifoResultCode::Ok,
        Err(e) => map_core_error(e),
    });

    result.unwrap_or_else(invalid_handle)
}
