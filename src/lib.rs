//! # turnstile-bypass
//!
//! Autonomous Cloudflare Turnstile challenge bypass for driver-controlled
//! browser sessions.
//!
//! The crate owns no browser of its own: callers plug an existing automation
//! session in through the [`BrowserDriver`] trait, and the bypass core takes
//! care of the hard part: finding the challenge widget behind nested shadow
//! roots and frames, clicking it with human-plausible pointer motion, and
//! telling transient DOM churn apart from the provider actually flagging the
//! session.
//!
//! ## Features
//!
//! - Detects both Cloudflare presentations (full-page interstitial and
//!   embedded widget) from independent page-level signals
//! - Resolves the widget across shadow-root nesting with a same-origin frame
//!   fallback
//! - Randomized pointer trajectories and dwell times on every click
//! - Independent, wall-clock timeout tiers for every wait in the flow
//! - Survives silent challenge renewal (ray-id change) without double
//!   re-arming the failure window
//!
//! ## Example
//!
//! ```no_run
//! use turnstile_bypass::{BrowserDriver, CloudflareBypass};
//!
//! async fn continue_past_challenge(
//!     driver: &dyn BrowserDriver,
//! ) -> Result<(), Box<dyn std::error::Error>> {
//!     let bypass = CloudflareBypass::new();
//!     if bypass.bypass_if_detected(driver).await? {
//!         println!("challenge resolved, session may continue");
//!     }
//!     Ok(())
//! }
//! ```

mod bypass;

pub mod challenges;
pub mod config;
pub mod driver;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::bypass::{BypassOutcome, CloudflareBypass};

pub use crate::config::BypassConfig;

pub use crate::driver::{
    BrowserDriver,
    DriverError,
    DriverResult,
    ElementId,
    ElementRect,
    FrameId,
    LoadMode,
    Locator,
    QueryScope,
    ReadyState,
    ShadowRootId,
};

pub use crate::challenges::detectors::{
    Opponent,
    classify_opponent,
    instance_id,
    is_challenge_present,
    is_interstitial,
};

pub use crate::challenges::interaction::{
    click_element_center_with_jitter,
    click_element_humanlike,
    click_point_humanlike,
};

pub use crate::challenges::readiness::{
    DEFAULT_READINESS_TIMEOUT,
    ReadinessError,
    wait_document_ready,
};

pub use crate::challenges::solvers::BypassError;

pub use crate::challenges::widget::{
    WidgetError,
    WidgetHandle,
    find_interactive_control,
    find_response_parent,
    open_widget_shadow_root,
    resolve_nested_widget,
    resolve_widget_with_fallback,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
