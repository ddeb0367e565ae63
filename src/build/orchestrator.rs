// src/build/orchestrator.rs

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::build::invocation::android_command;
use crate::build::request::BuildRequest;
use crate::config::BuildSettings;
use crate::errors::{BuildRunnerError, Result};
use crate::exec::{CommandRunner, LogStore, RunOutcome};
use crate::jobs::JobRegistry;
use crate::types::{JobState, Platform};

/// Owns everything a build needs: settings, log store, registry, runner and
/// the admission semaphore.
///
/// Cloning is cheap; clones share the same registry, semaphore and shutdown
/// token.
#[derive(Clone)]
pub struct BuildOrchestrator {
    settings: Arc<BuildSettings>,
    logs: LogStore,
    registry: Arc<JobRegistry>,
    runner: Arc<dyn CommandRunner>,
    permits: Arc<Semaphore>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for BuildOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildOrchestrator")
            .field("settings", &self.settings)
            .field("logs", &self.logs)
            .field("available_permits", &self.permits.available_permits())
            .finish_non_exhaustive()
    }
}

impl BuildOrchestrator {
    pub fn new(
        settings: BuildSettings,
        registry: Arc<JobRegistry>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let logs = LogStore::new(settings.logs_dir.clone());
        let permits = Arc::new(Semaphore::new(settings.max_concurrent_builds));
        Self {
            settings: Arc::new(settings),
            logs,
            registry,
            runner,
            permits,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn logs(&self) -> &LogStore {
        &self.logs
    }

    /// Validate, register and run a build to completion on the current task.
    ///
    /// Fails without side effects for a non-executable platform, invalid
    /// fields, or a build of the same project that is still running. A spawn
    /// failure is recorded as `failed` and also returned.
    pub async fn execute_build(
        &self,
        platform: Platform,
        request: BuildRequest,
    ) -> Result<RunOutcome> {
        self.admit(platform, &request)?;
        self.run_build(request).await
    }

    /// Validate and register a build, then run it on a background task.
    ///
    /// Returns as soon as the job is marked `running`; the outcome is only
    /// observable through the registry and the project's log.
    pub fn submit(&self, platform: Platform, request: BuildRequest) -> Result<()> {
        self.admit(platform, &request)?;

        let this = self.clone();
        tokio::spawn(async move {
            let project = request.project_id().to_string();
            match this.run_build(request).await {
                Ok(outcome) => debug!(%project, ?outcome, "background build finished"),
                Err(e) => debug!(%project, error = %e, "background build ended with error"),
            }
        });

        Ok(())
    }

    /// Cancel every running build (their processes are killed and the jobs
    /// recorded as `failed`).
    pub fn shutdown(&self) {
        info!("cancelling in-flight builds");
        self.shutdown.cancel();
    }

    /// Synchronous checks plus the `running` transition.
    fn admit(&self, platform: Platform, request: &BuildRequest) -> Result<()> {
        if !platform.is_executable() {
            info!(%platform, project = %request.project_id(), "rejecting unsupported platform");
            return Err(BuildRunnerError::UnsupportedPlatform(platform.to_string()));
        }
        request.validate()?;
        self.registry.try_begin(request.project_id())?;
        info!(%platform, project = %request.project_id(), "build accepted");
        Ok(())
    }

    /// Body of a build whose job is already `running`.
    async fn run_build(&self, request: BuildRequest) -> Result<RunOutcome> {
        let project = request.project_id().to_string();

        let result = self.run_registered(&request).await;
        let state = match &result {
            Ok(RunOutcome::Success) => JobState::Finished,
            Ok(RunOutcome::Stuck) => JobState::Stuck,
            Ok(RunOutcome::Failed(_)) | Ok(RunOutcome::Cancelled) => JobState::Failed,
            Err(e) => {
                error!(%project, error = %e, "build could not be executed");
                JobState::Failed
            }
        };

        self.registry.complete(&project, state);
        info!(%project, %state, "build recorded");
        result
    }

    async fn run_registered(&self, request: &BuildRequest) -> Result<RunOutcome> {
        let project = request.project_id();
        let mut sink = self.logs.reset(project).await?;

        let _permit = match self.permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                // The semaphore is never closed while the orchestrator lives.
                return Err(anyhow::anyhow!("build admission semaphore closed").into());
            }
        };

        let spec = android_command(&self.settings, request);
        let result = self
            .runner
            .run(&spec, &mut sink, self.settings.timeout, &self.shutdown)
            .await;

        let trailer = match &result {
            Ok(RunOutcome::Success) => None,
            Ok(RunOutcome::Failed(code)) => {
                Some(format!("[buildrunner] build failed with exit code {code}"))
            }
            Ok(RunOutcome::Stuck) => Some(format!(
                "[buildrunner] build exceeded timeout of {}s and was terminated",
                self.settings.timeout.as_secs()
            )),
            Ok(RunOutcome::Cancelled) => {
                Some("[buildrunner] build cancelled: server shutting down".to_string())
            }
            Err(e) => Some(format!("[buildrunner] build error: {e}")),
        };

        if let Some(line) = trailer {
            if let Err(e) = sink.write_line(&line).await {
                warn!(%project, error = %e, "failed to append status line to log");
            }
        }

        result
    }
}
