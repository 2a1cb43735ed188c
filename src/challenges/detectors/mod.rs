//! Challenge detection module.
//!
//! Decides whether the session is currently looking at a Cloudflare
//! verification page. Detection is a pure OR of three independent signals
//! (title phrase, URL fragment, response control in the DOM); none takes
//! precedence and the absence of all three is conclusive.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::driver::{BrowserDriver, DriverResult, ElementId, Locator, QueryScope};

/// Challenge providers this crate knows how to recognise.
///
/// Open set: a future provider adds a variant here plus a predicate in
/// [`classify_opponent`], not a rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Opponent {
    Cloudflare,
}

/// Title of the full-page interstitial presentation.
const INTERSTITIAL_TITLE: &str = "Just a moment...";

/// Response-carrying control, excluding the invisible-variant container.
pub(crate) const RESPONSE_CONTROL_SELECTOR: &str =
    r#"[name="cf-turnstile-response"]:not(#cf-invisible-turnstile [name="cf-turnstile-response"])"#;

/// Element carrying the current challenge instance id.
const RAY_ID_SELECTOR: &str = ".ray-id code";

static TITLE_SIGNAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)cloudflare|just a moment|checking your browser")
        .expect("invalid title signal regex")
});

static URL_SIGNAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)cdn-cgi/challenge-platform|challenges\.cloudflare\.com")
        .expect("invalid url signal regex")
});

/// Returns `true` if any detection signal indicates an active Cloudflare
/// challenge.
///
/// Title and URL reads racing a navigation are treated as "signal absent"
/// rather than failure; only the DOM query propagates mechanism errors.
pub async fn is_challenge_present(driver: &dyn BrowserDriver) -> DriverResult<bool> {
    match driver.title().await {
        Ok(title) if TITLE_SIGNAL_RE.is_match(&title) => return Ok(true),
        Ok(_) => {}
        Err(err) => log::debug!("title read failed during detection: {err}"),
    }

    match driver.url().await {
        Ok(url) if URL_SIGNAL_RE.is_match(&url) => return Ok(true),
        Ok(_) => {}
        Err(err) => log::debug!("url read failed during detection: {err}"),
    }

    Ok(find_response_control(driver).await?.is_some())
}

/// Classify which provider is presenting the challenge, if any.
pub async fn classify_opponent(driver: &dyn BrowserDriver) -> DriverResult<Option<Opponent>> {
    if is_challenge_present(driver).await? {
        Ok(Some(Opponent::Cloudflare))
    } else {
        Ok(None)
    }
}

/// Whether the page presents the full-page interstitial rather than an
/// embedded widget.
pub async fn is_interstitial(driver: &dyn BrowserDriver) -> DriverResult<bool> {
    let title = driver.title().await.unwrap_or_default();
    Ok(title.trim() == INTERSTITIAL_TITLE)
}

/// Current challenge instance id (Cloudflare ray id), if the page exposes one.
///
/// The provider issues a new id when it silently renews the challenge; the
/// solvers compare successive reads to spot that renewal.
pub async fn instance_id(driver: &dyn BrowserDriver) -> DriverResult<Option<String>> {
    let element = driver
        .find_element(
            &QueryScope::Page,
            &Locator::css(RAY_ID_SELECTOR),
            Duration::ZERO,
        )
        .await?;

    match element {
        Some(el) => {
            let text = driver.text(&el).await?;
            let trimmed = text.trim();
            Ok(if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            })
        }
        None => Ok(None),
    }
}

/// Locate the response-carrying control in the top-level document.
pub(crate) async fn find_response_control(
    driver: &dyn BrowserDriver,
) -> DriverResult<Option<ElementId>> {
    driver
        .find_element(
            &QueryScope::Page,
            &Locator::css(RESPONSE_CONTROL_SELECTOR),
            Duration::ZERO,
        )
        .await
}
