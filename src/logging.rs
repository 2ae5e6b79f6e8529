//! Tracing subscriber setup for hosts embedding the sizer

use anyhow::{Context, Result};
use tracing::Level as TraceLevel;
use tracing_subscriber::FmtSubscriber;

use crate::constants::env;

/// Map a `LOG_LEVEL` value to a tracing level (unknown values mean info)
pub fn parse_level(raw: &str) -> TraceLevel {
    match raw.trim().to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

/// Install a global fmt subscriber filtered by the `LOG_LEVEL` environment variable
pub fn init() -> Result<()> {
    let log_level = parse_level(
        &std::env::var(env::LOG_LEVEL).unwrap_or_else(|_| "info".to_string()),
    );

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;
    Ok(())
}
