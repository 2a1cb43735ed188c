//! Bypass flow configuration.
//!
//! Every timeout tier of the state machine is independently tunable. The
//! defaults mirror the intervals Cloudflare's own widget is observed to
//! tolerate; shortening them mostly helps tests.

use std::time::Duration;

use crate::challenges::readiness::DEFAULT_READINESS_TIMEOUT;

/// Timeout and polling tiers governing both bypass flows.
#[derive(Debug, Clone)]
pub struct BypassConfig {
    /// Interval between widget resolution attempts.
    pub widget_poll_interval: Duration,
    /// Interval between interactive-control and resolution probes.
    pub control_poll_interval: Duration,
    /// Ceiling on a clickable control appearing.
    pub control_ceiling: Duration,
    /// Ceiling on the challenge resolving after a click.
    pub resolution_ceiling: Duration,
    /// Tighter ceiling applied once after an instance-id renewal.
    pub renewal_ceiling: Duration,
    /// Ceiling on the post-resolution readiness wait.
    pub readiness_timeout: Duration,
    /// Pause before the degraded click path when the DOM is known unstable.
    pub detached_retry_pause: Duration,
}

impl Default for BypassConfig {
    fn default() -> Self {
        Self {
            widget_poll_interval: Duration::from_millis(750),
            control_poll_interval: Duration::from_secs(1),
            control_ceiling: Duration::from_secs(16),
            resolution_ceiling: Duration::from_secs(30),
            renewal_ceiling: Duration::from_secs(12),
            readiness_timeout: DEFAULT_READINESS_TIMEOUT,
            detached_retry_pause: Duration::from_millis(750),
        }
    }
}

impl BypassConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_control_ceiling(mut self, ceiling: Duration) -> Self {
        self.control_ceiling = ceiling;
        self
    }

    pub fn with_resolution_ceiling(mut self, ceiling: Duration) -> Self {
        self.resolution_ceiling = ceiling;
        self
    }

    pub fn with_renewal_ceiling(mut self, ceiling: Duration) -> Self {
        self.renewal_ceiling = ceiling;
        self
    }

    pub fn with_readiness_timeout(mut self, timeout: Duration) -> Self {
        self.readiness_timeout = timeout;
        self
    }

    pub fn with_widget_poll_interval(mut self, interval: Duration) -> Self {
        self.widget_poll_interval = interval;
        self
    }

    pub fn with_control_poll_interval(mut self, interval: Duration) -> Self {
        self.control_poll_interval = interval;
        self
    }
}
