// src/exec/backend.rs

//! Pluggable process runner abstraction.
//!
//! The orchestrator talks to a `CommandRunner` instead of spawning processes
//! directly. Production uses [`ProcessRunner`], which wraps
//! [`run_command`]; tests can provide their own implementation that writes
//! scripted output and returns a chosen outcome without touching the OS.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::errors::Result;
use crate::exec::log_sink::LogSink;
use crate::exec::runner::{run_command, CommandSpec};
use crate::exec::RunOutcome;

/// Trait abstracting how a build command is executed.
pub trait CommandRunner: Send + Sync {
    /// Run `spec`, streaming its output into `sink`, and report how it ended.
    ///
    /// Implementations must honour `timeout` and `cancel` the same way
    /// [`run_command`] does.
    fn run<'a>(
        &'a self,
        spec: &'a CommandSpec,
        sink: &'a mut LogSink,
        timeout: Duration,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<RunOutcome>> + Send + 'a>>;
}

/// Real runner used in production: spawns an OS process per build.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run<'a>(
        &'a self,
        spec: &'a CommandSpec,
        sink: &'a mut LogSink,
        timeout: Duration,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<RunOutcome>> + Send + 'a>> {
        Box::pin(run_command(spec, sink, timeout, cancel))
    }
}
