//! Human-plausible pointer interaction.
//!
//! Automation heuristics key on perfectly linear, zero-latency pointer paths.
//! Every click here goes through a randomized micro-movement and a variable
//! dwell before the button press. Bounds are small enough to stay inside the
//! clickable target while still varying trajectory and timing.

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::driver::{BrowserDriver, DriverResult, ElementId};

/// Per-axis pointer offset bound for element-relative clicks, in pixels.
const ELEMENT_OFFSET_PX: i32 = 3;

/// Per-axis jitter bound for centre-point clicks, in pixels.
const CENTER_JITTER_PX: i32 = 5;

/// Move the pointer onto `element` with slight jitter, dwell, then click.
///
/// No-op when the element is absent.
pub async fn click_element_humanlike(
    driver: &dyn BrowserDriver,
    element: Option<&ElementId>,
) -> DriverResult<()> {
    let Some(element) = element else {
        return Ok(());
    };

    let (offset_x, offset_y, travel, dwell) = {
        let mut rng = rand::thread_rng();
        (
            rng.gen_range(-ELEMENT_OFFSET_PX..=ELEMENT_OFFSET_PX),
            rng.gen_range(-ELEMENT_OFFSET_PX..=ELEMENT_OFFSET_PX),
            Duration::from_secs_f32(rng.gen_range(0.25..0.45)),
            Duration::from_secs_f32(rng.gen_range(0.05..0.15)),
        )
    };

    driver
        .move_to_element(element, offset_x, offset_y, travel)
        .await?;
    sleep(dwell).await;
    driver.click().await
}

/// Move the pointer to a literal page coordinate, dwell, then click.
pub async fn click_point_humanlike(
    driver: &dyn BrowserDriver,
    x: f64,
    y: f64,
) -> DriverResult<()> {
    let (travel, dwell) = {
        let mut rng = rand::thread_rng();
        (
            Duration::from_secs_f32(rng.gen_range(0.3..0.55)),
            Duration::from_secs_f32(rng.gen_range(0.05..0.12)),
        )
    };

    driver.move_to_point(x, y, travel).await?;
    sleep(dwell).await;
    driver.click().await
}

/// Click near the centre of an element's bounding box.
///
/// Degraded path for when no structured control handle is resolvable but an
/// approximate click target is known. No-op when the element is absent.
pub async fn click_element_center_with_jitter(
    driver: &dyn BrowserDriver,
    element: Option<&ElementId>,
) -> DriverResult<()> {
    let Some(element) = element else {
        return Ok(());
    };

    let rect = driver.rect(element).await?;
    let (center_x, center_y) = rect.center();
    let (jitter_x, jitter_y) = {
        let mut rng = rand::thread_rng();
        (
            rng.gen_range(-CENTER_JITTER_PX..=CENTER_JITTER_PX),
            rng.gen_range(-CENTER_JITTER_PX..=CENTER_JITTER_PX),
        )
    };

    click_point_humanlike(
        driver,
        center_x + f64::from(jitter_x),
        center_y + f64::from(jitter_y),
    )
    .await
}
