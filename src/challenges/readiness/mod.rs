//! Document readiness polling.
//!
//! There is no reliable cross-boundary completion event once a third-party
//! widget is involved, so readiness is observed by polling the document's
//! ready state until it reaches the caller-selected completeness level.

use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep};

use crate::driver::{BrowserDriver, ReadyState};

/// Interval between readiness probes.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default ceiling for the readiness wait.
pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(60);

/// Raised when the document never reaches an acceptable ready state.
#[derive(Debug, Error)]
pub enum ReadinessError {
    #[error("document did not become ready within {0:?}")]
    Timeout(Duration),
}

/// Poll the page's readiness state until it reaches the requested level.
///
/// With `require_full_load` unset, `Interactive` is enough; otherwise only
/// `Complete` is accepted. Transient read errors (state unreadable
/// mid-navigation) count as "not yet ready", not as failure.
pub async fn wait_document_ready(
    driver: &dyn BrowserDriver,
    require_full_load: bool,
    timeout: Duration,
) -> Result<(), ReadinessError> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        sleep(POLL_INTERVAL).await;
        let state = match driver.ready_state().await {
            Ok(state) => state,
            Err(err) => {
                log::debug!("ready state unreadable, polling again: {err}");
                continue;
            }
        };
        let acceptable = match state {
            ReadyState::Complete => true,
            ReadyState::Interactive => !require_full_load,
            ReadyState::Loading => false,
        };
        if acceptable {
            return Ok(());
        }
    }
    Err(ReadinessError::Timeout(timeout))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::StubDriver;

    #[tokio::test(start_paused = true)]
    async fn accepts_interactive_when_full_load_not_required() {
        let driver = StubDriver::new();
        driver.state.lock().unwrap().ready = ReadyState::Interactive;
        wait_document_ready(&driver, false, Duration::from_secs(5))
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn interactive_is_not_enough_for_full_load() {
        let driver = Arc::new(StubDriver::new());
        driver.state.lock().unwrap().ready = ReadyState::Interactive;

        let flipper = Arc::clone(&driver);
        tokio::spawn(async move {
            sleep(Duration::from_secs(2)).await;
            flipper.state.lock().unwrap().ready = ReadyState::Complete;
        });

        let started = Instant::now();
        wait_document_ready(driver.as_ref(), true, Duration::from_secs(10))
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_within_ceiling_plus_one_interval() {
        let driver = StubDriver::new();
        driver.state.lock().unwrap().ready = ReadyState::Loading;

        let timeout = Duration::from_secs(3);
        let started = Instant::now();
        let err = wait_document_ready(&driver, false, timeout)
            .await
            .unwrap_err();
        assert!(matches!(err, ReadinessError::Timeout(t) if t == timeout));
        assert!(started.elapsed() <= timeout + POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_read_errors_are_swallowed() {
        let driver = Arc::new(StubDriver::new());
        {
            let mut state = driver.state.lock().unwrap();
            state.ready = ReadyState::Complete;
            state.fail_ready_reads = true;
        }

        let flipper = Arc::clone(&driver);
        tokio::spawn(async move {
            sleep(Duration::from_secs(1)).await;
            flipper.state.lock().unwrap().fail_ready_reads = false;
        });

        wait_document_ready(driver.as_ref(), true, Duration::from_secs(10))
            .await
            .unwrap();
    }
}
