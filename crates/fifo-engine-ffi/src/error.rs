use crate::types::{rust_string_to_c, FifoResultCode};
use fifo_engine_core::Error;
use std::cell::RefCell;
use std::ffi::c_char;

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

pub fn set_last_error(msg: String) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = Some(msg);
    });
}

pub fn map_core_error(e: Error) -> FifoResultCode {
    let msg = e.to_string();
    set_last_error(msg);
    match e {
        Error::Database(_) | Error::StoreClosed | Error::Config(_) => FifoResultCode::Db,
        Error::InvalidPath(_) | Error::InvalidGranularity(_) => FifoResultCode::Path,
        Error::Io(_) => FifoResultCode::Scan,
        Error::SchedulerBusy => FifoResultCode::Busy,
        Error::NoData => FifoResultCode::NoData,
    }
}

/// Get the last error message. Returns a C string that must be freed with
/// `fifo_free_string`.
#[no_mangle]
pub extern "C" fn fifo_last_error_message() -> *mut c_char {
    LAST_ERROR.with(|e| {
        let msg = e.borrow();
        match msg.as_ref() {
            Some(s) => rust_string_to_c(s),
            None => rust_string_to_c(""),
        }
    })
}

/// Free a string allocated by the FFI layer.
///
/// # Safety
/// `ptr` must have been allocated by this library (e.g., from
/// `fifo_last_error_message`).
#[no_mangle]
pub unsafe extern "C" fn fifo_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(std::ffi::CString::from_raw(ptr));
    }
}
