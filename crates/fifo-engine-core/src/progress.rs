/// Trait for reporting long-running operation progress.
///
/// CLI implements with indicatif, FFI implements with a C function pointer
/// callback. The default implementation is a no-op.
pub trait ProgressReporter: Send + Sync {
    fn on_generate_progress(&self, _percent: u32, _message: &str) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
