// src/logging.rs

//! Logging setup for this crate using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. explicit level passed to [`init_logging`]
//! 2. `TASKGRAPH_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Logs go to STDERR so an embedding binary's stdout stays free for its own
//! output.

use anyhow::Result;
use tracing_subscriber::fmt;

/// Initialise the global logging subscriber. Safe to call once at startup;
/// embedders that already installed a subscriber should skip this.
pub fn init_logging(explicit_level: Option<tracing::Level>) -> Result<()> {
    let level = explicit_level
        .or_else(|| std::env::var("TASKGRAPH_LOG").ok().and_then(|s| parse_level_str(&s)))
        .unwrap_or(tracing::Level::INFO);

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
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
