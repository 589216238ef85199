//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from `RUST_LOG`
///
/// Intended for binaries and demos; library code only emits through `log`.
/// Calling it twice is harmless.
pub fn init() {
    let _ = env_logger::Builder::from_default_env().try_init();
}
