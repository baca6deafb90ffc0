// src/logging.rs

//! Logging setup for `watchflow` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `WATCHFLOW_LOG` environment variable, either a bare level ("debug")
//!    or a full directive list ("watchflow=debug,notify=warn")
//! 3. default to `info`
//!
//! Logs are sent to STDERR; stdout carries the pipeline's own output
//! (task output, "ok" lines and verbose event echoes).

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "WATCHFLOW_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = build_filter(cli_level, std::env::var(LOG_ENV_VAR).ok().as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))?;

    Ok(())
}

/// Resolve the effective filter from the CLI flag and the env var value.
pub fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Result<EnvFilter> {
    if let Some(lvl) = cli_level {
        return Ok(EnvFilter::default().add_directive(level_from_log_level(lvl).into()));
    }

    match env_value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => match parse_level_str(value) {
            Some(level) => Ok(EnvFilter::default().add_directive(level.into())),
            None => EnvFilter::try_new(value)
                .with_context(|| format!("invalid {LOG_ENV_VAR} value {value:?}")),
        },
        None => Ok(EnvFilter::default().add_directive(LevelFilter::INFO.into())),
    }
}

fn level_from_log_level(lvl: LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}

/// Parse a bare level name. Returns `None` for anything else, including
/// directive lists.
pub fn parse_level_str(s: &str) -> Option<LevelFilter> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(LevelFilter::ERROR),
        "warn" | "warning" => Some(LevelFilter::WARN),
        "info" => Some(LevelFilter::INFO),
        "debug" => Some(LevelFilter::DEBUG),
        "trace" => Some(LevelFilter::TRACE),
        "off" => Some(LevelFilter::OFF),
        _ => None,
    }
}
