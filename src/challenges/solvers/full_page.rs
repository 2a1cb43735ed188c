//! Full-page interstitial flow.
//!
//! States: AwaitFrame -> AwaitCheckbox -> Click -> AwaitResolution ->
//! AwaitReadiness. The interstitial replaces the whole page, so "resolved"
//! means detection clearing, and a benign interstitial that disappears before
//! a widget ever resolves counts as success with no click performed.

use tokio::time::{Instant, sleep};

use crate::challenges::detectors::instance_id;
use crate::challenges::interaction::click_element_humanlike;
use crate::challenges::widget::{self, WidgetError, WidgetHandle};
use crate::config::BypassConfig;
use crate::driver::BrowserDriver;

use super::{BypassError, await_resolution, still_detected, wait_session_ready};

/// Drive the full-page interstitial to resolution.
pub async fn solve_full_page(
    driver: &dyn BrowserDriver,
    config: &BypassConfig,
) -> Result<(), BypassError> {
    // AwaitFrame: bounded only by the challenge remaining detected.
    if await_widget(driver, config).await?.is_none() {
        return Ok(());
    }

    let previous_id = match instance_id(driver).await {
        Ok(id) => id,
        Err(err) => {
            log::debug!("pre-click instance id read failed: {err}");
            None
        }
    };

    let deadline = Instant::now() + config.control_ceiling;
    loop {
        // The widget handle may have detached since the last poll; always
        // re-resolve before querying into it.
        let Some(handle) = await_widget(driver, config).await? else {
            return Ok(());
        };

        if let Some(control) = find_control(driver, &handle).await {
            log::info!("interstitial control found, clicking");
            click_element_humanlike(driver, Some(&control)).await?;
            await_resolution(driver, config, previous_id.as_deref()).await?;
            return wait_session_ready(driver, config).await;
        }

        if Instant::now() > deadline {
            return Err(BypassError::ChallengeNotOffered);
        }
        sleep(config.control_poll_interval).await;
    }
}

/// Poll widget resolution until a handle appears or detection clears.
///
/// Returns `None` when the challenge stopped being detected first; the page
/// readiness wait has already run in that case.
async fn await_widget(
    driver: &dyn BrowserDriver,
    config: &BypassConfig,
) -> Result<Option<WidgetHandle>, BypassError> {
    loop {
        match widget::resolve_nested_widget(driver).await {
            Ok(Some(handle)) => return Ok(Some(handle)),
            Ok(None) => {}
            // Detachment on the interstitial just means the widget is
            // re-rendering; the next poll re-resolves from scratch.
            Err(WidgetError::ShadowRootDetached) => {
                log::debug!("interstitial widget detached, re-polling");
            }
            Err(WidgetError::Driver(err)) => {
                log::debug!("widget resolution failed, re-polling: {err}");
            }
        }
        if !still_detected(driver).await {
            wait_session_ready(driver, config).await?;
            return Ok(None);
        }
        sleep(config.widget_poll_interval).await;
    }
}

async fn find_control(
    driver: &dyn BrowserDriver,
    handle: &WidgetHandle,
) -> Option<crate::driver::ElementId> {
    match widget::find_interactive_control(driver, handle).await {
        Ok(control) => control,
        Err(err) => {
            log::debug!("control lookup failed, retrying next poll: {err}");
            None
        }
    }
}
