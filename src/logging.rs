// src/logging.rs

//! Logging setup for `buildrunner`.
//!
//! Everything goes to STDERR through one `tracing-subscriber` fmt layer:
//! the server's own lifecycle events (`buildrunner::*`) and every line the
//! build tool prints, re-emitted at `info` on [`OUTPUT_TARGET`]. A full app
//! build can print tens of thousands of lines, so the filter accepts
//! per-target directives as well as a bare level:
//!
//! ```text
//! BUILDRUNNER_LOG=debug                              # everything at debug
//! BUILDRUNNER_LOG=info,buildrunner::output=off       # lifecycle only, no tool output
//! BUILDRUNNER_LOG=warn,buildrunner::output=info      # tool output plus warnings
//! ```
//!
//! `--log-level` replaces the base level of `BUILDRUNNER_LOG` but keeps its
//! per-target directives, so `--log-level debug` with
//! `BUILDRUNNER_LOG=buildrunner::output=off` still hides tool output.
//! Without either, the level is `info`. Muting the output target never
//! affects the log files served by `GET /logs/{id}`.

use anyhow::Result;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Target used for forwarded build tool output lines.
pub const OUTPUT_TARGET: &str = "buildrunner::output";

/// Environment variable holding the level or filter directives.
pub const LOG_ENV: &str = "BUILDRUNNER_LOG";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV).ok();
    let (filter, rejected) = match build_filter(cli_level, env_value.as_deref()) {
        Ok(filter) => (filter, None),
        Err(e) => (build_filter(cli_level, None)?, Some(e)),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    if let Some(e) = rejected {
        tracing::warn!(env = LOG_ENV, error = %e, "ignoring invalid log filter");
    }
    Ok(())
}

/// Combine the CLI level and the raw `BUILDRUNNER_LOG` value into a filter.
pub fn build_filter(
    cli_level: Option<LogLevel>,
    env_value: Option<&str>,
) -> std::result::Result<EnvFilter, ParseError> {
    let env_value = env_value.map(str::trim).filter(|v| !v.is_empty());

    let directives = match (cli_level, env_value) {
        (Some(level), Some(env)) => std::iter::once(level_directive(level))
            .chain(env.split(',').map(str::trim).filter(|d| d.contains('=')))
            .collect::<Vec<_>>()
            .join(","),
        (Some(level), None) => level_directive(level).to_string(),
        (None, Some(env)) => env.to_string(),
        (None, None) => "info".to_string(),
    };

    EnvFilter::try_new(directives)
}

fn level_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
