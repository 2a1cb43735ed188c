//! Widget location module.
//!
//! The Turnstile widget hides behind nested DOM encapsulation: the response
//! control's parent hosts a shadow root, which sometimes wraps the real
//! widget in one further shadow layer, and under DOM churn the widget is only
//! reachable as a same-origin frame. This module resolves a usable
//! [`WidgetHandle`] across all of those layouts.
//!
//! Handles are never cached across polling iterations. Detachment between two
//! calls is an expected race, reported as [`WidgetError::ShadowRootDetached`]
//! and recovered by the solvers, never treated as corruption.

use std::time::Duration;

use thiserror::Error;

use crate::challenges::detectors::find_response_control;
use crate::driver::{
    BrowserDriver, DriverError, DriverResult, ElementId, FrameId, Locator, QueryScope,
    ShadowRootId,
};

/// Locator for the widget frame fallback.
const WIDGET_FRAME_XPATH: &str = r#"//iframe[contains(@src,"challenges.cloudflare.com")]"#;

/// Checkbox control inside a resolved widget.
const CHECKBOX_SELECTOR: &str = r#"input[type="checkbox"]"#;

/// Generic clickable control inside a resolved widget.
const CLICKABLE_ROLE_SELECTOR: &str = r#"[role="button"]"#;

/// Success indicator, identified by its visible display state.
const SUCCESS_INDICATOR_SELECTOR: &str =
    r#"#success[style*="display: grid"][style*="visibility: visible"]"#;

/// Failure indicator, identified by its visible display state.
const FAILURE_INDICATOR_SELECTOR: &str =
    r#"#fail[style*="display: grid"][style*="visibility: visible"]"#;

/// Text probe evaluated against a widget scope to read its banner text.
const WIDGET_TEXT_SCRIPT: &str =
    r#"return (this.innerText || this.textContent || "").toLowerCase();"#;

const TAKING_LONG_PHRASE: &str = "taking longer than expected";

/// Wherever the challenge's interactive controls currently live.
///
/// Tagged by encapsulation layer; the `Page` variant is the degenerate case
/// where the handle behaves like a top-level driver scope with no direct
/// element query capability of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetHandle {
    Frame(FrameId),
    ShadowRoot(ShadowRootId),
    Element(ElementId),
    Page,
}

impl WidgetHandle {
    /// Scope for direct element queries inside the widget, or `None` when
    /// the handle offers no such capability and callers must take one more
    /// indirection level through the top-level document.
    pub fn element_scope(&self) -> Option<QueryScope> {
        match self {
            WidgetHandle::Frame(frame) => Some(QueryScope::Frame(frame.clone())),
            WidgetHandle::ShadowRoot(root) => Some(QueryScope::ShadowRoot(root.clone())),
            WidgetHandle::Element(element) => Some(QueryScope::Element(element.clone())),
            WidgetHandle::Page => None,
        }
    }
}

/// Failure states specific to widget resolution.
#[derive(Debug, Error)]
pub enum WidgetError {
    /// The response control's parent existed at lookup time but its shadow
    /// root was no longer attached. Recoverable; the DOM mutated between two
    /// calls.
    #[error("widget shadow root detached between lookups")]
    ShadowRootDetached,
    #[error("driver error while resolving widget: {0}")]
    Driver(#[from] DriverError),
}

/// Parent of the response-carrying control, i.e. the widget's shadow host.
/// Absence is a normal, non-error outcome.
pub async fn find_response_parent(
    driver: &dyn BrowserDriver,
) -> DriverResult<Option<ElementId>> {
    match find_response_control(driver).await? {
        Some(control) => driver.parent(&control).await,
        None => Ok(None),
    }
}

/// Open the shadow root attached to the response control's parent.
pub async fn open_widget_shadow_root(
    driver: &dyn BrowserDriver,
) -> Result<Option<ShadowRootId>, WidgetError> {
    let Some(parent) = find_response_parent(driver).await? else {
        return Ok(None);
    };
    match driver.shadow_root(&parent).await? {
        Some(root) => Ok(Some(root)),
        None => Err(WidgetError::ShadowRootDetached),
    }
}

/// Resolve the deepest reachable widget handle through the shadow layers.
///
/// Cloudflare sometimes wraps the real widget in one extra shadow layer;
/// when the top-level root hosts a shadow-bearing child, descend exactly one
/// level and return that root instead.
pub async fn resolve_nested_widget(
    driver: &dyn BrowserDriver,
) -> Result<Option<WidgetHandle>, WidgetError> {
    let Some(root) = open_widget_shadow_root(driver).await? else {
        return Ok(None);
    };

    match first_child_shadow(driver, &root).await {
        Ok(Some(nested)) => Ok(Some(WidgetHandle::ShadowRoot(nested))),
        Ok(None) => Ok(Some(WidgetHandle::ShadowRoot(root))),
        Err(err) => {
            log::debug!("nested shadow probe failed, using top-level root: {err}");
            Ok(Some(WidgetHandle::ShadowRoot(root)))
        }
    }
}

/// Resolve the widget, falling back to the same-origin frame when the shadow
/// path detaches mid-resolution.
///
/// `ShadowRootDetached` propagates only when the frame fallback also finds
/// nothing, signalling to the caller that the DOM is unstable. Any other
/// failure means "not currently resolvable" and the caller's polling loop
/// retries.
pub async fn resolve_widget_with_fallback(
    driver: &dyn BrowserDriver,
) -> Result<Option<WidgetHandle>, WidgetError> {
    match resolve_nested_widget(driver).await {
        Ok(handle) => Ok(handle),
        Err(WidgetError::ShadowRootDetached) => {
            log::debug!("widget shadow root detached, trying frame fallback");
            match driver.frame(&Locator::xpath(WIDGET_FRAME_XPATH)).await {
                Ok(Some(frame)) => Ok(Some(WidgetHandle::Frame(frame))),
                Ok(None) => Err(WidgetError::ShadowRootDetached),
                Err(err) => {
                    log::debug!("frame fallback failed: {err}");
                    Err(WidgetError::ShadowRootDetached)
                }
            }
        }
        Err(WidgetError::Driver(err)) => {
            log::debug!("widget resolution failed, retrying next poll: {err}");
            Ok(None)
        }
    }
}

/// Find the clickable control inside a resolved widget.
///
/// Prefers a checkbox, then anything with a button role. Handles without
/// direct query capability are treated as one more indirection level: the
/// response-element parent is re-resolved from the top-level document.
pub async fn find_interactive_control(
    driver: &dyn BrowserDriver,
    widget: &WidgetHandle,
) -> DriverResult<Option<ElementId>> {
    if let Some(scope) = widget.element_scope() {
        if let Some(checkbox) = driver
            .find_element(&scope, &Locator::css(CHECKBOX_SELECTOR), Duration::ZERO)
            .await?
        {
            return Ok(Some(checkbox));
        }
        if let Some(button) = driver
            .find_element(
                &scope,
                &Locator::css(CLICKABLE_ROLE_SELECTOR),
                Duration::ZERO,
            )
            .await?
        {
            return Ok(Some(button));
        }
        return Ok(None);
    }

    find_response_parent(driver).await
}

/// Whether the widget currently shows its success indicator.
pub async fn is_success_visible(
    driver: &dyn BrowserDriver,
    widget: &WidgetHandle,
) -> DriverResult<bool> {
    indicator_visible(driver, widget, SUCCESS_INDICATOR_SELECTOR).await
}

/// Whether the widget currently shows its failure indicator.
pub async fn is_failure_visible(
    driver: &dyn BrowserDriver,
    widget: &WidgetHandle,
) -> DriverResult<bool> {
    indicator_visible(driver, widget, FAILURE_INDICATOR_SELECTOR).await
}

/// Whether the widget shows the "taking longer than expected" banner.
///
/// Text probe failures read as "banner absent"; the widget may be mid-render.
pub async fn is_taking_long(driver: &dyn BrowserDriver, widget: &WidgetHandle) -> bool {
    let Some(scope) = widget.element_scope() else {
        return false;
    };
    match driver.eval_text(&scope, WIDGET_TEXT_SCRIPT).await {
        Ok(text) => text.contains(TAKING_LONG_PHRASE),
        Err(err) => {
            log::debug!("widget text probe failed: {err}");
            false
        }
    }
}

async fn indicator_visible(
    driver: &dyn BrowserDriver,
    widget: &WidgetHandle,
    selector: &str,
) -> DriverResult<bool> {
    let Some(scope) = widget.element_scope() else {
        return Ok(false);
    };
    Ok(driver
        .find_element(&scope, &Locator::css(selector), Duration::ZERO)
        .await?
        .is_some())
}

async fn first_child_shadow(
    driver: &dyn BrowserDriver,
    root: &ShadowRootId,
) -> DriverResult<Option<ShadowRootId>> {
    let children = driver
        .children(&QueryScope::ShadowRoot(root.clone()), "*", Duration::ZERO)
        .await?;
    for child in children {
        match driver.shadow_root(&child).await {
            Ok(Some(nested)) => return Ok(Some(nested)),
            Ok(None) => {}
            Err(err) => log::debug!("child shadow root read failed: {err}"),
        }
    }
    Ok(None)
}
