pub mod builders;
pub mod fake_runner;

use std::sync::Once;

use buildrunner::logging::{build_filter, LOG_ENV};
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Install a subscriber that writes through the test harness.
///
/// Captured output is only shown for failing tests (or with `--nocapture`).
/// The filter follows the server's `BUILDRUNNER_LOG` rules, so forwarded
/// build output can be muted while debugging a noisy process test:
/// `BUILDRUNNER_LOG=debug,buildrunner::output=off cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let env_value = std::env::var(LOG_ENV).ok();
        let filter = build_filter(None, env_value.as_deref())
            .unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 10-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(10), f)
        .await
        .expect("Test timed out after 10 seconds")
}
