//! Logging setup for sixchan.
//!
//! `RUST_LOG` wins over the configured level. Statement-level `sqlx` logging
//! is capped at `warn` so request traces stay readable.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::Result;

/// Per-target directives added on top of the base level.
const QUIET_TARGETS: &[&str] = &["sqlx=warn", "hyper=info"];

/// Canonical level name for a configured level; unknown names mean `info`.
fn parse_level(level: &str) -> &'static str {
    match level.trim().to_lowercase().as_str() {
        "off" => "off",
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => "info",
    }
}

/// Directives for `level`: the base level, HTTP traces at the same level,
/// and the quieted targets.
fn directives(level: &str) -> Vec<String> {
    let level = parse_level(level);
    let mut directives = vec![level.to_string(), format!("tower_http={level}")];
    directives.extend(QUIET_TARGETS.iter().map(|d| d.to_string()));
    directives
}

fn build_filter(level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    directives(level)
        .iter()
        .filter_map(|d| d.parse().ok())
        .fold(EnvFilter::default(), |filter, d| filter.add_directive(d))
}

/// Initialize logging from `config`.
///
/// Output goes to stdout and is appended to `config.file`. An empty file
/// path logs to the console only.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if config.file.trim().is_empty() {
        init_console_only(&config.level);
        return Ok(());
    }

    if let Some(parent) = Path::new(&config.file).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.file)?;
    let writer = std::io::stdout.and(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .with(build_filter(&config.level))
        .init();

    Ok(())
}

/// Initialize console-only logging.
pub fn init_console_only(level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(build_filter(level))
        .init();
}
