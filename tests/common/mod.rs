#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use buildrunner::build::BuildOrchestrator;
use buildrunner::config::BuildSettings;
use buildrunner::exec::CommandRunner;
use buildrunner::jobs::JobRegistry;
use buildrunner::types::JobState;

pub use buildrunner_test_utils::{init_tracing, with_timeout};

/// Orchestrator with a fresh registry around `runner`.
pub fn orchestrator(settings: BuildSettings, runner: Arc<dyn CommandRunner>) -> BuildOrchestrator {
    BuildOrchestrator::new(settings, Arc::new(JobRegistry::new()), runner)
}

/// Poll the registry until `project_id` leaves `running` (or 10s pass).
pub async fn wait_until_done(orchestrator: &BuildOrchestrator, project_id: &str) -> JobState {
    with_timeout(async {
        loop {
            let state = orchestrator.registry().get(project_id);
            if state.is_terminal() {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
}
