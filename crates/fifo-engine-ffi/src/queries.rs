use crate::error::{map_core_error, set_last_error};
use crate::handle::with_handle;
use crate::types::*;
use std::ffi::c_char;

fn invalid_handle() -> FifoResultCode {
    set_last_error("Invalid engine handle".to_string());
    FifoResultCode::Db
}

/// Scheduler and usage status.
///
/// # Safety
/// `out` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn fifo_get_status(
    handle: u64,
    out: *mut FifoStatusInfo,
) -> FifoResultCode {
    if out.is_null() {
        set_last_error("out is null".to_string());
        return FifoResultCode::Db;
    }

    let result = with_handle(handle, |engine| match engine.status() {
        Ok(status) => {
            let info = &mut *out;
            info.is_scheduled = status.is_scheduled as i32;
            info.schedule_hour = status.schedule_hour as i32;
            info.schedule_minute = status.schedule_minute as i32;
            copy_to_c_buf(&status.last_run, &mut info.last_run);
            copy_to_c_buf(&status.next_run, &mut info.next_run);
            info.current_mb = status.current_mb;
            info.predicted_mb = status.predicted_mb;
            FifoResultCode::Ok
        }
        Err(e) => map_core_error(e),
    });

    result.unwrap_or_else(invalid_handle)
}

/// Per-entity average weights over the last 14 days, copied into a
/// caller-provided buffer of `buf_size` entries.
///
/// # Safety
/// `buf` must point to at least `buf_size` entries; `out_count` may be null.
#[no_mangle]
pub unsafe extern "C" fn fifo_get_weights(
    handle: u64,
    buf: *mut FifoWeightInfo,
    buf_size: i32,
    out_count: *mut i32,
) -> FifoResultCode {
    if buf.is_null() || buf_size <= 0 {
        set_last_error("weight buffer is null or empty".to_string());
        return FifoResultCode::Db;
    }

    let result = with_handle(handle, |engine| match engine.weights(14) {
        Ok(weights) => {
            let count = weights.len().min(buf_size as usize);
            for (i, w) in weights.iter().take(count).enumerate() {
                let slot = &mut *buf.add(i);
                copy_to_c_buf(&w.asset, &mut slot.asset);
                slot.index_val = w.index_val;
                slot.category = w.category.as_char() as u8 as c_char;
                slot.avg_mb = w.avg_mb;
                slot.total_mb = w.total_mb;
                slot.day_count = w.day_count as i32;
            }
            if !out_count.is_null() {
                *out_count = count as i32;
            }
            FifoResultCode::Ok
        }
        Err(e) => map_core_error(e),
    });

    result.unwrap_or_else(invalid_handle)
}

/// Number of distinct measurement dates in history, or 0 on any failure.
#[no_mangle]
pub extern "C" fn fifo_get_history_day_count(handle: u64) -> i32 {
    with_handle(handle, |engine| {
        engine.history_day_count().unwrap_or(0) as i32
    })
    .unwrap_or(0)
}

/// Upsert a key/value configuration entry.
///
/// # Safety
/// `key` and `value` must be valid null-terminated C strings.
#[no_mangle]
pub unsafe extern "C" fn fifo_set_config(
    handle: u64,
    key: *const c_char,
    value: *const c_char,
) -> FifoResultCode {
    let (key, value) = match (c_string_to_rust(key), c_string_to_rust(value)) {
        (Some(k), Some(v)) => (k, v),
        _ => {
            set_last_error("key or value is null".to_string());
            return FifoResultCode::Db;
        }
    };

    let result = with_handle(handle, |engine| match engine.set_config(&key, &value) {
        Ok(()) => FifoResultCode::Ok,
        Err(e) => map_core_error(e),
    });

    result.unwrap_or_else(invalid_handle)
}

/// Read a configuration value into `value_buf` (empty string when unset).
///
/// # Safety
/// `key` must be a valid null-terminated C string; `value_buf` must point
/// to at least `buf_size` bytes.
#[no_mangle]
pub unsafe extern "C" fn fifo_get_config(
    handle: u64,
    key: *const c_char,
    value_buf: *mut c_char,
    buf_size: i32,
) -> FifoResultCode {
    let key = match c_string_to_rust(key) {
        Some(k) => k,
        None => {
            set_last_error("key is null".to_string());
            return FifoResultCode::Db;
        }
    };
    if value_buf.is_null() || buf_size <= 0 {
        set_last_error("value buffer is null or empty".to_string());
        return FifoResultCode::Db;
    }

    let result = with_handle(handle, |engine| match engine.get_config(&key, "") {
        Ok(value) => {
            let buf = std::slice::from_raw_parts_mut(value_buf, buf_size as usize);
            copy_to_c_buf(&value, buf);
            FifoResultCode::Ok
        }
        Err(e) => map_core_error(e),
    });

    result.unwrap_or_else(invalid_handle)
}
