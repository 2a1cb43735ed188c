//! Embedded-widget flow.
//!
//! States: AwaitWidget -> CheckState -> Click -> AwaitResolution ->
//! AwaitReadiness. Unlike the interstitial, the page around the widget stays
//! up; resolution is confirmed by the widget's own success indicator rather
//! than detection clearing.
//!
//! When the shadow path keeps detaching and no fallback frame exists, the DOM
//! is known to be unstable; the flow stops issuing structured queries and
//! falls back to a single centre-jitter click on the response parent.

use tokio::time::{Instant, sleep};

use crate::challenges::interaction::{click_element_center_with_jitter, click_element_humanlike};
use crate::challenges::widget::{self, WidgetError, WidgetHandle};
use crate::config::BypassConfig;
use crate::driver::BrowserDriver;

use super::{BypassError, still_detected, wait_session_ready};

/// Outcome of one AwaitWidget polling round.
enum WidgetWait {
    Resolved(WidgetHandle),
    /// Detection cleared before a widget resolved; readiness already awaited.
    NotChallenged,
    /// The DOM is unstable; take the degraded click path.
    Unstable,
}

/// Drive the embedded widget to resolution.
pub async fn solve_embedded_widget(
    driver: &dyn BrowserDriver,
    config: &BypassConfig,
) -> Result<(), BypassError> {
    match await_widget(driver, config).await? {
        WidgetWait::Resolved(_) => {}
        WidgetWait::NotChallenged => return Ok(()),
        WidgetWait::Unstable => return degraded_click(driver, config).await,
    }

    let deadline = Instant::now() + config.control_ceiling;
    loop {
        let handle = match await_widget(driver, config).await? {
            WidgetWait::Resolved(handle) => handle,
            WidgetWait::NotChallenged => return Ok(()),
            WidgetWait::Unstable => return degraded_click(driver, config).await,
        };

        // CheckState: the widget may already carry a verdict.
        if indicator_visible(driver, &handle, Indicator::Success).await {
            return wait_session_ready(driver, config).await;
        }
        if indicator_visible(driver, &handle, Indicator::Failure).await
            || widget::is_taking_long(driver, &handle).await
        {
            return Err(BypassError::ChallengeDetectedUs);
        }

        match widget::find_interactive_control(driver, &handle).await {
            Ok(Some(control)) => {
                log::info!("widget control found, clicking");
                click_element_humanlike(driver, Some(&control)).await?;
                await_widget_resolution(driver, config).await?;
                return wait_session_ready(driver, config).await;
            }
            Ok(None) => {}
            Err(err) => log::debug!("control lookup failed, retrying next poll: {err}"),
        }

        if Instant::now() > deadline {
            return Err(BypassError::ChallengeNotOffered);
        }
        sleep(config.control_poll_interval).await;
    }
}

/// Poll `resolve_widget_with_fallback` until a handle appears, detection
/// clears, or the DOM proves unstable.
async fn await_widget(
    driver: &dyn BrowserDriver,
    config: &BypassConfig,
) -> Result<WidgetWait, BypassError> {
    loop {
        match widget::resolve_widget_with_fallback(driver).await {
            Ok(Some(handle)) => return Ok(WidgetWait::Resolved(handle)),
            Ok(None) => {}
            Err(WidgetError::ShadowRootDetached) => return Ok(WidgetWait::Unstable),
            Err(WidgetError::Driver(err)) => {
                log::debug!("widget resolution failed, re-polling: {err}");
            }
        }
        if !still_detected(driver).await {
            wait_session_ready(driver, config).await?;
            return Ok(WidgetWait::NotChallenged);
        }
        sleep(config.widget_poll_interval).await;
    }
}

/// Degraded path: pause briefly, click the response parent's centre with
/// jitter, and exit without further structured queries.
async fn degraded_click(
    driver: &dyn BrowserDriver,
    config: &BypassConfig,
) -> Result<(), BypassError> {
    log::warn!("widget DOM unstable, falling back to centre-jitter click");
    sleep(config.detached_retry_pause).await;
    let parent = match widget::find_response_parent(driver).await {
        Ok(parent) => parent,
        Err(err) => {
            log::debug!("response parent lookup failed on degraded path: {err}");
            None
        }
    };
    click_element_center_with_jitter(driver, parent.as_ref()).await?;
    Ok(())
}

/// Wait for the widget to confirm resolution after a click.
async fn await_widget_resolution(
    driver: &dyn BrowserDriver,
    config: &BypassConfig,
) -> Result<(), BypassError> {
    let deadline = Instant::now() + config.resolution_ceiling;
    loop {
        if let Ok(Some(handle)) = widget::resolve_widget_with_fallback(driver).await {
            if indicator_visible(driver, &handle, Indicator::Success).await {
                return Ok(());
            }
            if indicator_visible(driver, &handle, Indicator::Failure).await
                || widget::is_taking_long(driver, &handle).await
            {
                return Err(BypassError::ChallengeDetectedUs);
            }
        }
        if !still_detected(driver).await {
            return Ok(());
        }
        if Instant::now() > deadline {
            return Err(BypassError::ChallengeTimedOut);
        }
        sleep(config.control_poll_interval).await;
    }
}

enum Indicator {
    Success,
    Failure,
}

async fn indicator_visible(
    driver: &dyn BrowserDriver,
    handle: &WidgetHandle,
    indicator: Indicator,
) -> bool {
    let probed = match indicator {
        Indicator::Success => widget::is_success_visible(driver, handle).await,
        Indicator::Failure => widget::is_failure_visible(driver, handle).await,
    };
    match probed {
        Ok(visible) => visible,
        Err(err) => {
            log::debug!("indicator probe failed: {err}");
            false
        }
    }
}
