//! Gated logging macros for the alert core.
//!
//! Every record goes out under the `meeting_alert` target so the whole core can
//! be filtered with `RUST_LOG=meeting_alert=debug` without touching Tauri's own
//! output. A module opts in by declaring a flag before using the macros:
//!
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_info, log_warn};
//!
//! log_info!("flash windows created on {} monitors", count);
//! ```

/// Target shared by all alert-core log records.
pub const LOG_TARGET: &str = "meeting_alert";

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!(target: $crate::utils::logging::LOG_TARGET, $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!(target: $crate::utils::logging::LOG_TARGET, $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!(target: $crate::utils::logging::LOG_TARGET, $($arg)*);
        }
    };
}

/// Errors are never gated: a failed alert channel must always leave a trace.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        {
            let _ = ENABLE_LOGS;
            log::error!(target: $crate::utils::logging::LOG_TARGET, $($arg)*);
        }
    };
}

/// Initialise `env_logger` with an `info` default that `RUST_LOG` can override.
pub fn init() {
    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}
