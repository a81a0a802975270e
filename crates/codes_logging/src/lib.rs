#![deny(missing_docs)]
//! Logging macros shared by every crate in the codes workspace.
//!
//! The macros forward to the `log` facade through a re-export, so callers
//! do not need their own `log` dependency. Which backend receives the
//! records is up to the binary (or [`initialize_for_tests`]).

use log::LevelFilter;

#[doc(hidden)]
pub use log as __log;

/// Crates whose debug output drowns ours in transport tests.
const NOISY_TARGETS: [&str; 4] = ["hyper", "hyper_util", "reqwest", "wiremock"];

/// Environment variable overriding the test log level (`trace`..`off`).
pub const TEST_LOG_ENV: &str = "CODES_TEST_LOG";

#[doc(hidden)]
#[macro_export]
macro_rules! __codes_log {
    ($level:ident, $($arg:tt)*) => {{
        $crate::__log::$level!($($arg)*);
    }};
}

/// Trace-level record.
#[macro_export]
macro_rules! codes_trace {
    ($($arg:tt)*) => { $crate::__codes_log!(trace, $($arg)*) };
}

/// Debug-level record: per-message dispatch, payload shapes.
#[macro_export]
macro_rules! codes_debug {
    ($($arg:tt)*) => { $crate::__codes_log!(debug, $($arg)*) };
}

/// Info-level record: fetches, deletes, settings loads.
#[macro_export]
macro_rules! codes_info {
    ($($arg:tt)*) => { $crate::__codes_log!(info, $($arg)*) };
}

/// Warn-level record: a failed operation the user will see in the banner.
#[macro_export]
macro_rules! codes_warn {
    ($($arg:tt)*) => { $crate::__codes_log!(warn, $($arg)*) };
}

/// Error-level record: something the app cannot recover from on its own.
#[macro_export]
macro_rules! codes_error {
    ($($arg:tt)*) => { $crate::__codes_log!(error, $($arg)*) };
}

/// Installs a stderr logger for tests. Later calls are no-ops.
///
/// Level comes from [`TEST_LOG_ENV`], else debug in debug builds and info
/// otherwise. HTTP stack internals are filtered out.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

    let level = std::env::var(TEST_LOG_ENV)
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        });

    let mut builder = ConfigBuilder::new();
    for target in NOISY_TARGETS {
        builder.add_filter_ignore_str(target);
    }

    let _ = TermLogger::init(
        level,
        builder.build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}
