use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Per-class numeric tolerances for the change detector.
///
/// The magnitudes are inherited from the upstream dashboard and have no
/// documented derivation; they are kept as named values rather than tuned.
#[derive(Debug, Clone)]
pub struct Tolerances {
    /// Regular fields: smallest numeric delta that counts as a real change.
    pub regular: Decimal,
    /// High-tolerance fields (model probabilities etc.): larger dead band
    /// so upstream oscillation does not cause flicker.
    pub high: Decimal,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            regular: dec!(0.001),
            high: dec!(0.02),
        }
    }
}

/// Timing knobs for the smoothing pipeline and staleness monitor.
#[derive(Debug, Clone)]
pub struct Timing {
    /// Minimum latency before an accepted snapshot may commit.
    pub settle_delay: Duration,
    /// Trailing quiet period, restarted by every accepted snapshot.
    pub debounce_delay: Duration,
    /// How often the staleness monitor runs.
    pub staleness_check_interval: Duration,
    /// Feed age at which the `Degraded` overlay is raised.
    pub soft_threshold: Duration,
    /// Feed age at which the `Inactive` overlay is raised.
    pub hard_threshold: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(75),
            debounce_delay: Duration::from_millis(25),
            staleness_check_interval: Duration::from_secs(60),
            soft_threshold: Duration::from_secs(60),
            hard_threshold: Duration::from_secs(120),
        }
    }
}

/// Notification queue sizing and lifetime.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Maximum number of live notifications; oldest evicted beyond this.
    pub capacity: usize,
    /// Wall-clock lifetime of each notification.
    pub lifetime: Duration,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            lifetime: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub tolerances: Tolerances,
    pub timing: Timing,
    pub notify: NotifyConfig,
}
