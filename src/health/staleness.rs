use std::time::Instant;

use tracing::warn;

use crate::config::Timing;

/// Freshness overlay raised on top of a live transport when the feed has
/// gone quiet. `Inactive` covers the zombie case: socket open, remote no
/// longer publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOverlay {
    Degraded,
    Inactive,
}

/// What a staleness check decided, for the runtime to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StalenessEvent {
    /// First crossing of the soft threshold this episode.
    WentDegraded,
    /// First crossing of the hard threshold this episode.
    WentInactive,
    /// Fresh data arrived while an overlay was active.
    Recovered,
}

/// Watches the age of the last freshness signal (committed snapshot or
/// active heartbeat) independently of transport status. Each overlay level
/// is announced once per stale episode, not once per check.
#[derive(Debug)]
pub struct StalenessMonitor {
    timing: Timing,
    last_fresh: Option<Instant>,
    announced: Option<FeedOverlay>,
}

impl StalenessMonitor {
    pub fn new(timing: Timing) -> Self {
        Self {
            timing,
            last_fresh: None,
            announced: None,
        }
    }

    /// Restart the stale episode on a transport reconnect. The freshness
    /// clock starts from the reconnect, so a feed that is still dead
    /// re-crosses the thresholds and announces again instead of staying
    /// latched behind a stale `announced` level.
    pub fn reset(&mut self, now: Instant) {
        self.last_fresh = Some(now);
        self.announced = None;
    }

    /// Record a freshness signal. Clears any overlay immediately.
    pub fn on_fresh(&mut self, now: Instant) -> Option<StalenessEvent> {
        self.last_fresh = Some(now);
        if self.announced.take().is_some() {
            Some(StalenessEvent::Recovered)
        } else {
            None
        }
    }

    /// Periodic check. Returns an event only when the overlay level
    /// actually escalates.
    pub fn check(&mut self, now: Instant) -> Option<StalenessEvent> {
        let last = self.last_fresh?;
        let age = now.duration_since(last);

        let level = if age >= self.timing.hard_threshold {
            Some(FeedOverlay::Inactive)
        } else if age >= self.timing.soft_threshold {
            Some(FeedOverlay::Degraded)
        } else {
            None
        };

        // escalation only; de-escalation requires fresh data
        match level {
            Some(FeedOverlay::Inactive)
                if self.announced != Some(FeedOverlay::Inactive) =>
            {
                self.announced = Some(FeedOverlay::Inactive);
                warn!(age_secs = age.as_secs(), "feed inactive, zombie connection");
                Some(StalenessEvent::WentInactive)
            }
            Some(FeedOverlay::Degraded) if self.announced.is_none() => {
                self.announced = Some(FeedOverlay::Degraded);
                warn!(age_secs = age.as_secs(), "feed degraded, no fresh data");
                Some(StalenessEvent::WentDegraded)
            }
            _ => None,
        }
    }

    pub fn overlay(&self) -> Option<FeedOverlay> {
        self.announced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn monitor() -> StalenessMonitor {
        StalenessMonitor::new(Timing::default())
    }

    #[test]
    fn quiet_until_first_fresh_signal() {
        let mut m = monitor();
        // nothing to measure against yet
        assert_eq!(m.check(Instant::now()), None);
    }

    #[test]
    fn soft_then_hard_each_announced_once() {
        let t0 = Instant::now();
        let mut m = monitor();
        m.on_fresh(t0);

        assert_eq!(m.check(t0 + Duration::from_secs(30)), None);
        assert_eq!(
            m.check(t0 + Duration::from_secs(61)),
            Some(StalenessEvent::WentDegraded)
        );
        // repeated checks at the same level stay silent
        assert_eq!(m.check(t0 + Duration::from_secs(90)), None);

        assert_eq!(
            m.check(t0 + Duration::from_secs(130)),
            Some(StalenessEvent::WentInactive)
        );
        assert_eq!(m.check(t0 + Duration::from_secs(190)), None);
        assert_eq!(m.overlay(), Some(FeedOverlay::Inactive));
    }

    #[test]
    fn hard_threshold_can_fire_without_soft_announcement() {
        let t0 = Instant::now();
        let mut m = monitor();
        m.on_fresh(t0);

        // monitor was asleep across both thresholds
        assert_eq!(
            m.check(t0 + Duration::from_secs(130)),
            Some(StalenessEvent::WentInactive)
        );
    }

    #[test]
    fn fresh_data_recovers_immediately() {
        let t0 = Instant::now();
        let mut m = monitor();
        m.on_fresh(t0);
        m.check(t0 + Duration::from_secs(70));
        assert_eq!(m.overlay(), Some(FeedOverlay::Degraded));

        let t1 = t0 + Duration::from_secs(71);
        assert_eq!(m.on_fresh(t1), Some(StalenessEvent::Recovered));
        assert_eq!(m.overlay(), None);
        assert_eq!(m.check(t1 + Duration::from_secs(10)), None);
    }

    #[test]
    fn recovery_without_overlay_is_silent() {
        let mut m = monitor();
        assert_eq!(m.on_fresh(Instant::now()), None);
    }

    #[test]
    fn reset_restarts_episode_for_a_still_dead_feed() {
        let t0 = Instant::now();
        let mut m = monitor();
        m.on_fresh(t0);
        assert_eq!(
            m.check(t0 + Duration::from_secs(130)),
            Some(StalenessEvent::WentInactive)
        );

        // transport reconnected; remote is still silent
        m.reset(t0 + Duration::from_secs(141));
        assert_eq!(m.overlay(), None);

        // clock restarts from the reconnect, then escalates again
        assert_eq!(m.check(t0 + Duration::from_secs(190)), None);
        assert_eq!(
            m.check(t0 + Duration::from_secs(202)),
            Some(StalenessEvent::WentDegraded)
        );
        assert_eq!(
            m.check(t0 + Duration::from_secs(262)),
            Some(StalenessEvent::WentInactive)
        );
    }

    #[test]
    fn no_deescalation_without_fresh_data() {
        let t0 = Instant::now();
        let mut m = monitor();
        m.on_fresh(t0);
        m.check(t0 + Duration::from_secs(130));
        assert_eq!(m.overlay(), Some(FeedOverlay::Inactive));
        // time does not move backwards out of inactive
        assert_eq!(m.check(t0 + Duration::from_secs(131)), None);
        assert_eq!(m.overlay(), Some(FeedOverlay::Inactive));
    }
}
