//! Logging Infrastructure
//!
//! Structured logging setup for both development and production.
//! `RUST_LOG` wins over the configured level when set.

use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize the logger
pub fn init_logger() {
    init_logger_with_file(None, None, None);
}

/// Initialize the logger with optional JSON formatting and daily file output
pub fn init_logger_with_file(log_level: Option<&str>, json: Option<bool>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    // File output only when the directory already exists
    let file_appender = log_dir
        .map(Path::new)
        .filter(|dir| dir.exists())
        .map(|dir| tracing_appender::rolling::daily(dir, "floor-core"));

    let result = match (json.unwrap_or(false), file_appender) {
        (true, Some(writer)) => builder.json().with_writer(writer).try_init(),
        (true, None) => builder.json().try_init(),
        (false, Some(writer)) => builder.with_writer(writer).try_init(),
        (false, None) => builder.try_init(),
    };

    if let Err(e) = result {
        eprintln!("logger already initialised: {e}");
    }
}

/// Logger for tests, safe to call repeatedly
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
