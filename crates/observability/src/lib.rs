//! Tracing/logging setup shared by every binary and test harness.

pub mod logging;

pub use logging::LogFormat;

/// Initialize process-wide logging using `LOG_FORMAT` and `RUST_LOG`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    logging::init(LogFormat::from_env());
}
