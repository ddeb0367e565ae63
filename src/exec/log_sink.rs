// src/exec/log_sink.rs

//! Per-project build logs on disk.
//!
//! Every project id maps to exactly one file, `<logs_dir>/<project_id>_log.txt`.
//! Starting a build truncates it; the runner then appends one line at a time
//! and flushes after each, so readers (and a crash) see everything written
//! so far.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::errors::Result;

/// Addresses and opens project log files under a single directory.
#[derive(Debug, Clone)]
pub struct LogStore {
    dir: PathBuf,
}

impl LogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Location of the log file for `project_id`.
    ///
    /// Callers must have validated `project_id` as a single path component.
    pub fn path_for(&self, project_id: &str) -> PathBuf {
        self.dir.join(format!("{project_id}_log.txt"))
    }

    /// Create (or truncate) the log for `project_id` and return a sink that
    /// appends to it. The logs directory is created on demand.
    pub async fn reset(&self, project_id: &str) -> Result<LogSink> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(project_id);
        let file = File::create(&path).await?;
        debug!(project = %project_id, path = %path.display(), "log truncated");
        Ok(LogSink { file, path })
    }

    /// Read the whole current log for `project_id`.
    ///
    /// Returns `Ok(None)` if no build has ever written a log for it. A build
    /// in progress yields whatever has been flushed so far.
    pub async fn read(&self, project_id: &str) -> Result<Option<String>> {
        match fs::read(self.path_for(project_id)).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Append-only handle on one project's log file.
#[derive(Debug)]
pub struct LogSink {
    file: File,
    path: PathBuf,
}

impl LogSink {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `line` plus a newline and flush it to the OS.
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        self.file.write_all(buf.as_bytes()).await?;
        self.file.flush().await?;
        Ok(())
    }
}
