//! Shared helpers for `interact` integration tests.

pub mod fake_peer;
pub mod scripts;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use interact::logging::LOG_ENV;
use tracing_subscriber::EnvFilter;

/// Upper bound for any single test session.
pub const TEST_DEADLINE: Duration = Duration::from_secs(5);

static INIT: Once = Once::new();

/// Route `tracing` output through the test harness's captured writer.
///
/// Filters with the same `INTERACT_LOG` directives as the binary
/// (default `info`); output only shows for failing tests or `--nocapture`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, failing the test if it takes longer than [`TEST_DEADLINE`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_DEADLINE, f).await {
        Ok(value) => value,
        Err(_) => panic!("test did not finish within {TEST_DEADLINE:?}"),
    }
}
