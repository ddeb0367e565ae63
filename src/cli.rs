// src/cli.rs

//! CLI argument parsing using `clap`.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `buildrunner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "buildrunner",
    version,
    about = "Trigger containerized app builds over HTTP and poll their logs and status.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `BuildRunner.toml` in the current working directory if it
    /// exists, built-in defaults otherwise.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Address to listen on; overrides `[server].bind`.
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUILDRUNNER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and validate the config, print the effective settings, exit.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
