// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod jobs;
pub mod logging;
pub mod server;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::build::BuildOrchestrator;
use crate::cli::CliArgs;
use crate::config::{load_or_default, ConfigFile};
use crate::exec::ProcessRunner;
use crate::jobs::JobRegistry;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (+ CLI overrides)
/// - job registry and process runner
/// - build orchestrator
/// - HTTP server with Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = load_or_default(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        cfg.bind = bind;
    }

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let registry = Arc::new(JobRegistry::new());
    let orchestrator = BuildOrchestrator::new(cfg.build.clone(), registry, Arc::new(ProcessRunner));

    info!(
        program = %cfg.build.program,
        working_dir = %cfg.build.working_dir.display(),
        logs_dir = %cfg.build.logs_dir.display(),
        timeout_secs = cfg.build.timeout.as_secs(),
        max_concurrent_builds = cfg.build.max_concurrent_builds,
        "build settings loaded"
    );

    server::start_server(cfg.bind, orchestrator).await
}

/// Simple dry-run output: print the effective settings.
fn print_dry_run(cfg: &ConfigFile) {
    println!("buildrunner dry-run");
    println!("  server.bind = {}", cfg.bind);
    println!("  build.program = {}", cfg.build.program);
    if !cfg.build.args.is_empty() {
        println!("  build.args = {:?}", cfg.build.args);
    }
    println!("  build.working_dir = {}", cfg.build.working_dir.display());
    println!("  build.logs_dir = {}", cfg.build.logs_dir.display());
    println!("  build.timeout = {:?}", cfg.build.timeout);
    println!(
        "  build.max_concurrent_builds = {}",
        cfg.build.max_concurrent_builds
    );

    debug!("dry-run complete (server not started)");
}
