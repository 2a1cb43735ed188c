//! Bypass flow registry.
//!
//! Two flows cover the two Cloudflare presentations: the full-page
//! interstitial and the embedded widget. Both are synchronous-call polling
//! state machines over the driver; timeouts are the only cancellation
//! mechanism, and every ceiling is wall-clock, re-armed solely by the
//! instance-id renewal rule.

pub mod embedded;
pub mod full_page;

use thiserror::Error;
use tokio::time::{Instant, sleep};

use crate::challenges::detectors::{self, instance_id};
use crate::challenges::readiness::{ReadinessError, wait_document_ready};
use crate::challenges::widget::{self, WidgetHandle};
use crate::config::BypassConfig;
use crate::driver::{BrowserDriver, DriverError, LoadMode};

/// Terminal failure states surfaced by a bypass flow.
#[derive(Debug, Error)]
pub enum BypassError {
    /// No interactive control ever appeared within its ceiling.
    #[error("challenge never offered an interactive control")]
    ChallengeNotOffered,
    /// The provider actively flagged the session instead of passing it.
    #[error("challenge provider flagged the session")]
    ChallengeDetectedUs,
    /// Resolution was never observed within the applicable ceiling.
    #[error("challenge did not resolve before its deadline")]
    ChallengeTimedOut,
    #[error("post-challenge readiness wait failed: {0}")]
    Readiness(#[from] ReadinessError),
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),
}

/// Detection probe used inside polling loops.
///
/// A probe that fails mechanically counts as "still detected" so the loop
/// retries on its next interval instead of declaring premature success.
pub(crate) async fn still_detected(driver: &dyn BrowserDriver) -> bool {
    match detectors::is_challenge_present(driver).await {
        Ok(present) => present,
        Err(err) => {
            log::debug!("detection probe failed, assuming still challenged: {err}");
            true
        }
    }
}

/// Wait for the document to reach the completeness level the session is
/// configured for.
pub(crate) async fn wait_session_ready(
    driver: &dyn BrowserDriver,
    config: &BypassConfig,
) -> Result<(), BypassError> {
    let require_full_load = driver.load_mode() != LoadMode::Eager;
    wait_document_ready(driver, require_full_load, config.readiness_timeout).await?;
    Ok(())
}

/// Wait for the challenge to leave after a click, tolerating one silent
/// renewal.
///
/// The pre-click instance id is compared against the live one on every poll.
/// A change means the provider renewed the challenge: the failure window is
/// re-armed exactly once to the tighter renewal ceiling, inside which a
/// freshly offered control or the taking-long banner means the session was
/// flagged rather than passed.
pub(crate) async fn await_resolution(
    driver: &dyn BrowserDriver,
    config: &BypassConfig,
    previous_id: Option<&str>,
) -> Result<(), BypassError> {
    let deadline = Instant::now() + config.resolution_ceiling;
    loop {
        if !still_detected(driver).await {
            return Ok(());
        }
        let current_id = match instance_id(driver).await {
            Ok(id) => id,
            Err(err) => {
                log::debug!("instance id read failed: {err}");
                None
            }
        };
        if let (Some(previous), Some(current)) = (previous_id, current_id.as_deref()) {
            if previous != current {
                log::info!("challenge instance renewed ({previous} -> {current})");
                return await_renewed_resolution(driver, config).await;
            }
        }
        if Instant::now() > deadline {
            return Err(BypassError::ChallengeTimedOut);
        }
        sleep(config.control_poll_interval).await;
    }
}

/// Tighter wait entered at most once, after an observed instance renewal.
async fn await_renewed_resolution(
    driver: &dyn BrowserDriver,
    config: &BypassConfig,
) -> Result<(), BypassError> {
    let deadline = Instant::now() + config.renewal_ceiling;
    loop {
        if !still_detected(driver).await {
            return Ok(());
        }
        if let Ok(Some(handle)) = widget::resolve_nested_widget(driver).await {
            if fresh_control_offered(driver, &handle).await
                || widget::is_taking_long(driver, &handle).await
            {
                return Err(BypassError::ChallengeDetectedUs);
            }
        }
        if Instant::now() > deadline {
            return Err(BypassError::ChallengeTimedOut);
        }
        sleep(config.control_poll_interval).await;
    }
}

async fn fresh_control_offered(driver: &dyn BrowserDriver, handle: &WidgetHandle) -> bool {
    match widget::find_interactive_control(driver, handle).await {
        Ok(control) => control.is_some(),
        Err(err) => {
            log::debug!("control probe failed during renewal wait: {err}");
            false
        }
    }
}
