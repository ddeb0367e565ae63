use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use buildrunner::errors::Result;
use buildrunner::exec::{CommandRunner, CommandSpec, LogSink, RunOutcome};

/// A fake runner that:
/// - records every `CommandSpec` it was asked to run
/// - writes a fixed list of lines to the sink
/// - optionally blocks until released (or cancelled)
/// - returns a preset outcome.
#[derive(Clone)]
pub struct ScriptedRunner {
    lines: Vec<String>,
    outcome: RunOutcome,
    gate: Option<Arc<Notify>>,
    calls: Arc<Mutex<Vec<CommandSpec>>>,
}

impl ScriptedRunner {
    pub fn new(outcome: RunOutcome) -> Self {
        Self {
            lines: Vec::new(),
            outcome,
            gate: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_lines(mut self, lines: &[&str]) -> Self {
        self.lines = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Block each run after writing its lines until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run<'a>(
        &'a self,
        spec: &'a CommandSpec,
        sink: &'a mut LogSink,
        _timeout: Duration,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<RunOutcome>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(spec.clone());

            for line in &self.lines {
                sink.write_line(line).await?;
            }

            if let Some(gate) = &self.gate {
                tokio::select! {
                    _ = gate.notified() => {}
                    _ = cancel.cancelled() => return Ok(RunOutcome::Cancelled),
                }
            }

            Ok(self.outcome)
        })
    }
}
