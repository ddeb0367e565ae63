// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the build tool, using
//! `tokio::process::Command`, and recording what it prints.
//!
//! - [`runner`] spawns and supervises one process (timeout, cancellation,
//!   merged output streaming).
//! - [`log_sink`] owns the per-project log files the output lands in.
//! - [`backend`] provides the `CommandRunner` trait and the concrete
//!   `ProcessRunner` used in production, which tests can replace with a
//!   fake implementation.

pub mod backend;
pub mod log_sink;
pub mod runner;

pub use backend::{CommandRunner, ProcessRunner};
pub use log_sink::{LogSink, LogStore};
pub use runner::{run_command, CommandSpec};

/// How a supervised process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Exited with code 0.
    Success,
    /// Exited with a non-zero code (`-1` if killed by a signal).
    Failed(i32),
    /// Killed after exceeding the timeout.
    Stuck,
    /// Killed because the server is shutting down.
    Cancelled,
}
