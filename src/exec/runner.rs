// src/exec/runner.rs

//! Supervise a single build tool process.

use std::io;
use std::os::fd::OwnedFd;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::unix::pipe;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{BuildRunnerError, Result};
use crate::exec::log_sink::LogSink;
use crate::exec::RunOutcome;
use crate::logging::OUTPUT_TARGET;

/// A fully resolved process invocation.
///
/// The program is executed directly with `args`; no shell ever interprets
/// any part of it. `env` is layered on top of the server's own environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Name used to tag forwarded output and log events (the project id).
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

/// Run `spec` to completion, streaming its merged stdout/stderr into `sink`.
///
/// - Each line is written to `sink` and echoed on the `buildrunner::output`
///   tracing target before the next one is handled.
/// - `timeout` is measured from spawn by a timer, independent of output. When
///   it fires the child is killed and the result is [`RunOutcome::Stuck`].
/// - If `cancel` fires the child is killed and the result is
///   [`RunOutcome::Cancelled`].
/// - Spawn failures are returned as [`BuildRunnerError::Spawn`].
pub async fn run_command(
    spec: &CommandSpec,
    sink: &mut LogSink,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<RunOutcome> {
    info!(
        build = %spec.label,
        program = %spec.program,
        args = ?spec.args,
        cwd = ?spec.working_dir,
        "starting build process"
    );

    // stdout and stderr share one pipe so lines keep the order they were written in.
    let (output_rx, output_tx) = io::pipe()?;

    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::from(output_tx.try_clone()?))
        .stderr(Stdio::from(output_tx))
        .kill_on_drop(true);
    if let Some(dir) = &spec.working_dir {
        cmd.current_dir(dir);
    }

    let spawned = cmd.spawn();
    // The command still owns the parent's write ends; EOF only arrives once they are closed.
    drop(cmd);
    let mut child = spawned.map_err(|source| BuildRunnerError::Spawn {
        program: spec.program.clone(),
        source,
    })?;

    let started = Instant::now();
    let deadline = sleep(timeout);
    tokio::pin!(deadline);

    let (line_tx, mut line_rx) = mpsc::channel::<String>(256);
    let output = pipe::Receiver::from_owned_fd(OwnedFd::from(output_rx))?;
    let reader = spawn_line_reader(output, line_tx);

    let mut output_open = true;
    let mut lines_written: u64 = 0;

    loop {
        tokio::select! {
            line = line_rx.recv(), if output_open => {
                match line {
                    Some(line) => {
                        sink.write_line(&line).await?;
                        info!(target: OUTPUT_TARGET, build = %spec.label, "{}", line);
                        lines_written += 1;
                    }
                    None => {
                        debug!(build = %spec.label, lines_written, "output pipe closed");
                        output_open = false;
                    }
                }
            }

            status_res = child.wait(), if !output_open => {
                let status = status_res?;
                let code = status.code().unwrap_or(-1);
                let outcome = if status.success() {
                    RunOutcome::Success
                } else {
                    RunOutcome::Failed(code)
                };

                info!(
                    build = %spec.label,
                    exit_code = code,
                    success = status.success(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "build process exited"
                );
                return Ok(outcome);
            }

            // Grandchildren may still hold the pipe open after the child dies.
            _ = &mut deadline => {
                warn!(
                    build = %spec.label,
                    timeout_secs = timeout.as_secs_f64(),
                    lines_written,
                    "build exceeded timeout; killing process"
                );
                kill_child(&mut child, &spec.label).await;
                reader.abort();
                return Ok(RunOutcome::Stuck);
            }

            _ = cancel.cancelled() => {
                info!(build = %spec.label, "cancellation requested; killing process");
                kill_child(&mut child, &spec.label).await;
                reader.abort();
                return Ok(RunOutcome::Cancelled);
            }
        }
    }
}

/// Forward every line of `reader` into `tx` until EOF.
///
/// Invalid UTF-8 is replaced rather than ending the stream.
fn spawn_line_reader<R>(reader: R, tx: mpsc::Sender<String>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    while matches!(buf.last(), Some(b'\n' | b'\r')) {
                        buf.pop();
                    }
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!(error = %e, "error reading process output; stopping reader");
                    break;
                }
            }
        }
    })
}

async fn kill_child(child: &mut tokio::process::Child, label: &str) {
    if let Err(e) = child.kill().await {
        warn!(
            build = %label,
            error = %e,
            "failed to kill build process"
        );
    }
}
