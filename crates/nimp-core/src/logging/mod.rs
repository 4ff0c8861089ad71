//! Structured logging for nimptool.
//!
//! Provides dual-mode logging on stderr:
//! - Human-readable console output (default)
//! - Machine-parseable JSONL for callers that collect diagnostics
//!
//! # Design Notes
//!
//! - stdout is reserved for command payloads (CSV and line output)
//! - stderr receives all log output
//! - The default level is `warn`, so a successful run writes nothing to stderr

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose events pass the filter.
const LOG_TARGETS: &[&str] = &["nimp_core", "nimp_common", "nimptool"];

/// Filter directive enabling `level` for the workspace crates only.
pub fn filter_directive(level: LogLevel) -> String {
    LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the logging subsystem.
///
/// Call once at startup before any logging occurs. Returns `false` if a
/// global subscriber was already installed.
pub fn init_logging(config: &LogConfig) -> bool {
    let filter = EnvFilter::new(filter_directive(config.level));

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_ansi(use_ansi);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
                .is_ok()
        }
        LogFormat::Jsonl => {
            let jsonl_layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(jsonl_layer)
                .try_init()
                .is_ok()
        }
    }
}
