//! High level bypass orchestration.
//!
//! Wires the detector and the two solver flows into a single entry point.
//! One look at the page-level signals picks the flow: the interstitial title
//! routes to the full-page solver, anything else to the embedded-widget
//! solver.
//!
//! Flows are not reentrant: at most one bypass may run per driver session at
//! a time, which is the caller's responsibility to uphold.

use crate::challenges::detectors::{self, Opponent};
use crate::challenges::solvers::{BypassError, embedded, full_page};
use crate::config::BypassConfig;
use crate::driver::BrowserDriver;

/// Terminal result of one bypass evaluation.
#[derive(Debug)]
pub enum BypassOutcome {
    /// A challenge was detected and driven to resolution.
    Resolved,
    /// No challenge was being presented.
    NotPresent,
    /// A challenge was detected but the flow failed.
    Failed(BypassError),
}

/// Coordinates challenge detection and flow selection for one session.
#[derive(Debug, Clone, Default)]
pub struct CloudflareBypass {
    config: BypassConfig,
}

impl CloudflareBypass {
    /// Create an orchestrator with the default timeout tiers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an orchestrator with custom timeout tiers.
    pub fn with_config(config: BypassConfig) -> Self {
        Self { config }
    }

    /// Borrow the active configuration.
    pub fn config(&self) -> &BypassConfig {
        &self.config
    }

    /// Run the bypass if a challenge is currently presented.
    ///
    /// Returns `true` iff a challenge was detected and the flow ran to a
    /// resolved outcome, `false` when none was detected.
    pub async fn bypass_if_detected(
        &self,
        driver: &dyn BrowserDriver,
    ) -> Result<bool, BypassError> {
        let Some(opponent) = detectors::classify_opponent(driver).await? else {
            return Ok(false);
        };

        match opponent {
            Opponent::Cloudflare => {
                if detectors::is_interstitial(driver).await? {
                    log::info!("full-page interstitial detected, running full-page flow");
                    full_page::solve_full_page(driver, &self.config).await?;
                } else {
                    log::info!("embedded widget detected, running widget flow");
                    embedded::solve_embedded_widget(driver, &self.config).await?;
                }
            }
        }

        Ok(true)
    }

    /// Evaluate the session and fold the result into a [`BypassOutcome`].
    pub async fn evaluate(&self, driver: &dyn BrowserDriver) -> BypassOutcome {
        match self.bypass_if_detected(driver).await {
            Ok(true) => BypassOutcome::Resolved,
            Ok(false) => BypassOutcome::NotPresent,
            Err(error) => BypassOutcome::Failed(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubDriver;

    #[tokio::test(start_paused = true)]
    async fn clean_page_is_not_bypassed() {
        let driver = StubDriver::new();
        let bypass = CloudflareBypass::new();
        assert!(!bypass.bypass_if_detected(&driver).await.unwrap());
        assert!(matches!(
            bypass.evaluate(&driver).await,
            BypassOutcome::NotPresent
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn outcome_folds_flow_errors() {
        let driver = StubDriver::new();
        // Embedded widget detected via URL but no widget ever resolves and
        // detection never clears.
        {
            let mut state = driver.state.lock().unwrap();
            state.url = "https://example.com/cdn-cgi/challenge-platform/h/b".into();
            state.response_control = true;
            state.shadow = crate::testing::ShadowLayout::Attached;
        }

        let bypass = CloudflareBypass::new();
        let outcome = bypass.evaluate(&driver).await;
        assert!(matches!(
            outcome,
            BypassOutcome::Failed(BypassError::ChallengeNotOffered)
        ));
    }
}
