//! Logging Infrastructure
//!
//! Structured logging setup. `RUST_LOG` wins over the configured level when set.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the logger
pub fn init_logger() {
    init_logger_with_file(None, None, None);
}

/// Initialize the logger with optional JSON format and file output
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_logger_with_file(log_level: Option<&str>, json: Option<bool>, log_dir: Option<&Path>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    let file_appender = log_dir
        .filter(|dir| dir.exists())
        .map(|dir| tracing_appender::rolling::daily(dir, "order-ledger"));

    let result = match (json.unwrap_or(false), file_appender) {
        (true, Some(appender)) => builder.json().with_writer(appender).try_init(),
        (true, None) => builder.json().try_init(),
        (false, Some(appender)) => builder.with_ansi(false).with_writer(appender).try_init(),
        (false, None) => builder.try_init(),
    };

    if result.is_err() {
        tracing::debug!("Logger already initialized");
    }
}
