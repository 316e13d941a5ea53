// ── Runtime coordinator configuration ──
//
// Describes *how* to poll one door. Carries tuning only, never touches
// disk -- the consumer constructs a `CoordinatorConfig` and hands it in.

use std::time::Duration;

/// Configuration for a single coordinator instance.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Cadence of the fast cycle (binary device states).
    pub fast_interval: Duration,
    /// Minimum gap between pet-status fetches. The slow cycle piggybacks
    /// on the fast cycle, so the effective gap rounds up to the next
    /// fast tick.
    pub slow_interval: Duration,
    /// Bound on every individual call to the door. Expiry counts as a
    /// transport failure.
    pub call_timeout: Duration,
    /// Poll pet passage events and include event-less pets in the
    /// roster. When off, the slow plane is never fetched.
    pub include_all_events: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            fast_interval: Duration::from_secs(5),
            // The pet-status backend is rate-limited upstream; keep the
            // pressure low.
            slow_interval: Duration::from_secs(120),
            call_timeout: Duration::from_secs(10),
            include_all_events: false,
        }
    }
}
