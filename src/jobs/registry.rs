// src/jobs/registry.rs

//! In-memory job state table.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::errors::{BuildRunnerError, Result};
use crate::types::JobState;

/// Maps project id to the state of its most recent build.
///
/// One mutex guards the whole table; every operation holds it for a single
/// lookup or insert and never across I/O. Construct once at startup and share
/// it (usually behind an `Arc`) between the HTTP layer and build tasks.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<String, JobState>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // The table only holds plain values, so a panic elsewhere while the
    // lock was held cannot leave it half-updated.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, JobState>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current state for `project_id`, or [`JobState::Unknown`].
    pub fn get(&self, project_id: &str) -> JobState {
        self.lock()
            .get(project_id)
            .copied()
            .unwrap_or(JobState::Unknown)
    }

    /// Unconditionally store `state` (last writer wins).
    ///
    /// Storing `Unknown` removes the entry.
    pub fn set(&self, project_id: &str, state: JobState) {
        let mut jobs = self.lock();
        if state == JobState::Unknown {
            jobs.remove(project_id);
        } else {
            jobs.insert(project_id.to_string(), state);
        }
    }

    /// Mark `project_id` as running unless a build for it already is.
    pub fn try_begin(&self, project_id: &str) -> Result<()> {
        let mut jobs = self.lock();
        if jobs.get(project_id) == Some(&JobState::Running) {
            return Err(BuildRunnerError::AlreadyRunning(project_id.to_string()));
        }
        jobs.insert(project_id.to_string(), JobState::Running);
        debug!(project = %project_id, "job marked running");
        Ok(())
    }

    /// Move a running job to a terminal state.
    ///
    /// Returns `false` (and changes nothing) if the job is not currently
    /// `running` or `state` is not terminal.
    pub fn complete(&self, project_id: &str, state: JobState) -> bool {
        if !state.is_terminal() {
            warn!(project = %project_id, %state, "refusing non-terminal completion state");
            return false;
        }

        let mut jobs = self.lock();
        match jobs.get_mut(project_id) {
            Some(current) if *current == JobState::Running => {
                *current = state;
                debug!(project = %project_id, %state, "job completed");
                true
            }
            current => {
                warn!(
                    project = %project_id,
                    current = ?current,
                    requested = %state,
                    "ignoring completion for job that is not running"
                );
                false
            }
        }
    }

    /// Copy of every stored entry.
    pub fn snapshot(&self) -> HashMap<String, JobState> {
        self.lock().clone()
    }
}
