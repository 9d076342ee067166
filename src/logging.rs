//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--debug` flag
//! 2. `SMALLSH_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `warn`
//!
//! Output always goes to stderr so that command output on stdout stays exact.

use crate::error::ShellError;

pub const LOG_ENV: &str = "SMALLSH_LOG";

/// Install the global subscriber. Call once, before the shell starts.
pub fn init_logging(debug: bool) -> Result<(), ShellError> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        std::env::var(LOG_ENV)
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::WARN)
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| ShellError::LoggingError(e.to_string()))
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
