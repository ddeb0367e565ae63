// tests/orchestrator.rs
mod common;
use crate::common::{init_tracing, orchestrator, wait_until_done, with_timeout};

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::Notify;

use buildrunner::build::BuildOrchestrator;
use buildrunner::errors::BuildRunnerError;
use buildrunner::exec::{ProcessRunner, RunOutcome};
use buildrunner::types::{JobState, Platform};
use buildrunner_test_utils::builders::{BuildRequestBuilder, BuildSettingsBuilder};
use buildrunner_test_utils::fake_runner::ScriptedRunner;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn successful_build_is_finished_with_exact_log() -> TestResult {
    init_tracing();
    let logs = TempDir::new()?;
    let runner = ScriptedRunner::new(RunOutcome::Success).with_lines(&["a", "b", "c"]);
    let orch = orchestrator(BuildSettingsBuilder::new(logs.path()).build(), Arc::new(runner));

    let outcome = orch
        .execute_build(Platform::Android, BuildRequestBuilder::new("p1").build())
        .await?;

    assert_eq!(outcome, RunOutcome::Success);
    assert_eq!(orch.registry().get("p1"), JobState::Finished);
    assert_eq!(orch.logs().read("p1").await?.as_deref(), Some("a\nb\nc\n"));
    Ok(())
}

#[tokio::test]
async fn request_fields_map_to_build_tool_environment() -> TestResult {
    init_tracing();
    let logs = TempDir::new()?;
    let runner = ScriptedRunner::new(RunOutcome::Success);
    let settings = BuildSettingsBuilder::new(logs.path())
        .program("docker", &["compose", "up", "--build"])
        .working_dir("sdufReactNative")
        .build();
    let orch = orchestrator(settings, Arc::new(runner.clone()));

    let request = BuildRequestBuilder::new("proj-42")
        .url("https://api.example.org")
        .app_env("staging")
        .token("secret-token")
        .style_url("https://tiles.example.org/style.json")
        .app_name("Field Maps")
        .package_name("org.example.maps")
        .build();
    orch.execute_build(Platform::Android, request).await?;

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    let spec = &calls[0];
    assert_eq!(spec.program, "docker");
    assert_eq!(spec.args, vec!["compose", "up", "--build"]);
    assert_eq!(
        spec.working_dir.as_deref(),
        Some(std::path::Path::new("sdufReactNative"))
    );

    let env: Vec<(&str, &str)> = spec
        .env
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    assert_eq!(
        env,
        vec![
            ("URL", "https://api.example.org"),
            ("APP_ENV", "staging"),
            ("SOCKET_PROJECT_TOKEN", "secret-token"),
            ("SOCKET_PROJECT_ID", "proj-42"),
            ("styleURL", "https://tiles.example.org/style.json"),
            ("APP_NAME", "Field Maps"),
            ("APP_PACKAGE_NAME", "org.example.maps"),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn ios_is_rejected_without_side_effects() -> TestResult {
    init_tracing();
    let logs = TempDir::new()?;
    let runner = ScriptedRunner::new(RunOutcome::Success);
    let orch = orchestrator(
        BuildSettingsBuilder::new(logs.path()).build(),
        Arc::new(runner.clone()),
    );

    let result = orch
        .execute_build(Platform::Ios, BuildRequestBuilder::new("p1").build())
        .await;
    assert!(matches!(result, Err(BuildRunnerError::UnsupportedPlatform(_))));

    let submitted = orch.submit(Platform::Ios, BuildRequestBuilder::new("p1").build());
    assert!(matches!(submitted, Err(BuildRunnerError::UnsupportedPlatform(_))));

    assert_eq!(orch.registry().get("p1"), JobState::Unknown);
    assert!(orch.logs().read("p1").await?.is_none());
    assert!(runner.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn invalid_field_is_rejected_without_side_effects() -> TestResult {
    init_tracing();
    let logs = TempDir::new()?;
    let runner = ScriptedRunner::new(RunOutcome::Success);
    let orch = orchestrator(
        BuildSettingsBuilder::new(logs.path()).build(),
        Arc::new(runner.clone()),
    );

    let request = BuildRequestBuilder::new("p1").url("javascript:alert(1)").build();
    match orch.execute_build(Platform::Android, request).await {
        Err(BuildRunnerError::InvalidField { field, .. }) => assert_eq!(field, "url"),
        other => panic!("Expected InvalidField, got: {:?}", other),
    }

    let traversal = BuildRequestBuilder::new("../etc/passwd").build();
    assert!(matches!(
        orch.submit(Platform::Android, traversal),
        Err(BuildRunnerError::InvalidField { .. })
    ));

    assert!(orch.registry().snapshot().is_empty());
    assert!(!logs.path().join("p1_log.txt").exists());
    assert!(runner.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_and_stuck_outcomes_are_recorded() -> TestResult {
    init_tracing();
    let logs = TempDir::new()?;

    let failing = orchestrator(
        BuildSettingsBuilder::new(logs.path()).build(),
        Arc::new(ScriptedRunner::new(RunOutcome::Failed(2)).with_lines(&["compiling"])),
    );
    let outcome = failing
        .execute_build(Platform::Android, BuildRequestBuilder::new("fail").build())
        .await?;
    assert_eq!(outcome, RunOutcome::Failed(2));
    assert_eq!(failing.registry().get("fail"), JobState::Failed);
    let log = failing.logs().read("fail").await?.expect("log must exist");
    assert_eq!(
        log,
        "compiling\n[buildrunner] build failed with exit code 2\n"
    );

    let stuck = orchestrator(
        BuildSettingsBuilder::new(logs.path()).build(),
        Arc::new(ScriptedRunner::new(RunOutcome::Stuck)),
    );
    let outcome = stuck
        .execute_build(Platform::Android, BuildRequestBuilder::new("hang").build())
        .await?;
    assert_eq!(outcome, RunOutcome::Stuck);
    assert_eq!(stuck.registry().get("hang"), JobState::Stuck);
    Ok(())
}

#[tokio::test]
async fn spawn_error_is_returned_and_recorded_as_failed() -> TestResult {
    init_tracing();
    let logs = TempDir::new()?;
    let settings = BuildSettingsBuilder::new(logs.path())
        .program("definitely-not-a-real-program-4821", &[])
        .build();
    let orch = orchestrator(settings, Arc::new(ProcessRunner));

    let result = orch
        .execute_build(Platform::Android, BuildRequestBuilder::new("p1").build())
        .await;

    assert!(matches!(result, Err(BuildRunnerError::Spawn { .. })));
    assert_eq!(orch.registry().get("p1"), JobState::Failed);
    let log = orch.logs().read("p1").await?.expect("log must exist");
    assert!(log.starts_with("[buildrunner] build error:"));
    Ok(())
}

#[tokio::test]
async fn submit_returns_before_the_build_completes() -> TestResult {
    init_tracing();
    let logs = TempDir::new()?;
    let gate = Arc::new(Notify::new());
    let runner = ScriptedRunner::new(RunOutcome::Success)
        .with_lines(&["started"])
        .gated(Arc::clone(&gate));
    let orch = orchestrator(BuildSettingsBuilder::new(logs.path()).build(), Arc::new(runner));

    orch.submit(Platform::Android, BuildRequestBuilder::new("p1").build())?;
    assert_eq!(orch.registry().get("p1"), JobState::Running);

    // Still running while the runner is held.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(orch.registry().get("p1"), JobState::Running);

    gate.notify_one();
    assert_eq!(wait_until_done(&orch, "p1").await, JobState::Finished);
    Ok(())
}

#[tokio::test]
async fn second_trigger_for_a_running_project_is_rejected() -> TestResult {
    init_tracing();
    let logs = TempDir::new()?;
    let gate = Arc::new(Notify::new());
    let runner = ScriptedRunner::new(RunOutcome::Success)
        .with_lines(&["first build"])
        .gated(Arc::clone(&gate));
    let orch = orchestrator(
        BuildSettingsBuilder::new(logs.path()).build(),
        Arc::new(runner.clone()),
    );

    orch.submit(Platform::Android, BuildRequestBuilder::new("p1").build())?;
    let second = orch.submit(Platform::Android, BuildRequestBuilder::new("p1").build());
    assert!(matches!(second, Err(BuildRunnerError::AlreadyRunning(_))));

    gate.notify_one();
    assert_eq!(wait_until_done(&orch, "p1").await, JobState::Finished);
    assert_eq!(orch.logs().read("p1").await?.as_deref(), Some("first build\n"));
    assert_eq!(runner.calls().len(), 1);
    Ok(())
}

#[tokio::test]
async fn rebuild_truncates_previous_log() -> TestResult {
    init_tracing();
    let logs = TempDir::new()?;

    let first = orchestrator(
        BuildSettingsBuilder::new(logs.path()).shell("echo old-1; echo old-2").build(),
        Arc::new(ProcessRunner),
    );
    first
        .execute_build(Platform::Android, BuildRequestBuilder::new("p1").build())
        .await?;
    assert_eq!(first.logs().read("p1").await?.as_deref(), Some("old-1\nold-2\n"));

    let second = BuildOrchestrator::new(
        BuildSettingsBuilder::new(logs.path()).shell("echo new").build(),
        Arc::new(buildrunner::jobs::JobRegistry::new()),
        Arc::new(ProcessRunner),
    );
    second
        .execute_build(Platform::Android, BuildRequestBuilder::new("p1").build())
        .await?;
    assert_eq!(second.logs().read("p1").await?.as_deref(), Some("new\n"));
    Ok(())
}

#[tokio::test]
async fn concurrent_builds_for_different_projects_stay_separate() -> TestResult {
    init_tracing();
    let logs = TempDir::new()?;
    let settings = BuildSettingsBuilder::new(logs.path())
        .shell("for i in 1 2 3 4 5 6 7 8; do echo \"$SOCKET_PROJECT_ID-$i\"; sleep 0.01; done")
        .build();
    let orch = orchestrator(settings, Arc::new(ProcessRunner));

    let ids = ["alpha", "beta", "gamma", "delta"];
    for id in ids {
        orch.submit(Platform::Android, BuildRequestBuilder::new(id).build())?;
    }

    for id in ids {
        assert_eq!(wait_until_done(&orch, id).await, JobState::Finished);
        let expected: String = (1..=8).map(|i| format!("{id}-{i}\n")).collect();
        assert_eq!(orch.logs().read(id).await?.as_deref(), Some(expected.as_str()));
    }
    Ok(())
}

#[tokio::test]
async fn admission_limit_holds_extra_builds_until_a_slot_frees() -> TestResult {
    init_tracing();
    let logs = TempDir::new()?;
    let gate = Arc::new(Notify::new());
    let runner = ScriptedRunner::new(RunOutcome::Success).gated(Arc::clone(&gate));
    let settings = BuildSettingsBuilder::new(logs.path())
        .max_concurrent_builds(1)
        .build();
    let orch = orchestrator(settings, Arc::new(runner.clone()));

    orch.submit(Platform::Android, BuildRequestBuilder::new("first").build())?;
    orch.submit(Platform::Android, BuildRequestBuilder::new("second").build())?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(runner.calls().len(), 1);
    assert_eq!(orch.registry().get("second"), JobState::Running);

    gate.notify_one();
    with_timeout(async {
        while runner.calls().len() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    gate.notify_one();

    assert_eq!(wait_until_done(&orch, "first").await, JobState::Finished);
    assert_eq!(wait_until_done(&orch, "second").await, JobState::Finished);
    Ok(())
}

#[tokio::test]
async fn shutdown_cancels_running_builds_as_failed() -> TestResult {
    init_tracing();
    let logs = TempDir::new()?;
    let settings = BuildSettingsBuilder::new(logs.path())
        .shell("echo booting; exec sleep 30")
        .timeout(Duration::from_secs(30))
        .build();
    let orch = orchestrator(settings, Arc::new(ProcessRunner));

    orch.submit(Platform::Android, BuildRequestBuilder::new("p1").build())?;
    tokio::time::sleep(Duration::from_millis(200)).await;
    orch.shutdown();

    assert_eq!(wait_until_done(&orch, "p1").await, JobState::Failed);
    let log = orch.logs().read("p1").await?.expect("log must exist");
    assert!(log.ends_with("[buildrunner] build cancelled: server shutting down\n"));
    Ok(())
}

#[tokio::test]
async fn real_timeout_marks_build_stuck() -> TestResult {
    init_tracing();
    let logs = TempDir::new()?;
    let settings = BuildSettingsBuilder::new(logs.path())
        .shell("exec sleep 30")
        .timeout(Duration::from_millis(300))
        .build();
    let orch = orchestrator(settings, Arc::new(ProcessRunner));

    let outcome = with_timeout(
        orch.execute_build(Platform::Android, BuildRequestBuilder::new("p1").build()),
    )
    .await?;

    assert_eq!(outcome, RunOutcome::Stuck);
    assert_eq!(orch.registry().get("p1"), JobState::Stuck);
    Ok(())
}
