//! Runtime configuration.
//!
//! | Variable | Effect |
//! |---|---|
//! | `ASSERTIVE_DISPLAY_SUCCESS_MESSAGES` | `1`/`true`/`yes`/`on` logs passing assertions too |
//! | `ASSERTIVE_LOG` | `tracing` filter directive for [`crate::logging::subscriber`] |
//!
//! The environment is read once; [`set_success_messages`] overrides it for
//! the rest of the process.

use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

/// Environment variable enabling success messages.
pub const SUCCESS_MESSAGES_ENV: &str = "ASSERTIVE_DISPLAY_SUCCESS_MESSAGES";

/// Environment variable holding the log filter used by test subscribers.
pub const LOG_FILTER_ENV: &str = "ASSERTIVE_LOG";

fn success_flag() -> &'static AtomicBool {
    static FLAG: OnceLock<AtomicBool> = OnceLock::new();
    FLAG.get_or_init(|| {
        let enabled = env::var(SUCCESS_MESSAGES_ENV)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        AtomicBool::new(enabled)
    })
}

/// Whether passing assertions log a `Success:` line.
pub fn success_messages_enabled() -> bool {
    success_flag().load(Ordering::Relaxed)
}

pub fn set_success_messages(enabled: bool) {
    success_flag().store(enabled, Ordering::Relaxed);
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
