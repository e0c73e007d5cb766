use crate::types::FifoProgressCallback;
use fifo_engine_core::ProgressReporter;
use std::ffi::CString;

/// FFI progress bridge that implements ProgressReporter by forwarding to a
/// C callback.
pub struct FfiProgressBridge {
    callback: FifoProgressCallback,
}

// Safety: The C callback function pointer is a static function that is safe
// to call from any thread.
unsafe impl Send for FfiProgressBridge {}
unsafe impl Sync for FfiProgressBridge {}

impl FfiProgressBridge {
    pub fn new(callback: FifoProgressCallback) -> Self {
        Self { callback }
    }
}

impl ProgressReporter for FfiProgressBridge {
    fn on_generate_progress(&self, percent: u32, message: &str) {
        let c_msg = CString::new(message).unwrap_or_else(|_| CString::new("").unwrap());
        (self.callback)(percent as i32, c_msg.as_ptr());
    }
}
