use std::time::Instant;

use crate::config::Timing;

use super::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    /// Fixed delay before the candidate is eligible to commit.
    Settling { until: Instant },
    /// Trailing quiet period; any new accepted snapshot restarts the
    /// whole pipeline.
    Debouncing { until: Instant },
}

/// Delays commit of an accepted snapshot through a settle window plus a
/// trailing debounce, so a burst of rapid updates collapses into one commit
/// of the last snapshot in the burst.
///
/// Holds at most one in-flight candidate; a newly accepted snapshot cancels
/// and replaces the pending one. Time is injected so the runtime drives this
/// off a single `sleep_until` and tests need no timers.
#[derive(Debug)]
pub struct SmoothingPipeline {
    timing: Timing,
    candidate: Option<Snapshot>,
    stage: Stage,
}

impl SmoothingPipeline {
    pub fn new(timing: Timing) -> Self {
        Self {
            timing,
            candidate: None,
            stage: Stage::Idle,
        }
    }

    /// Replace the pending candidate and restart both stages.
    pub fn accept(&mut self, snapshot: Snapshot, now: Instant) {
        self.candidate = Some(snapshot);
        self.stage = Stage::Settling {
            until: now + self.timing.settle_delay,
        };
    }

    /// Deadline the runtime should sleep until, if anything is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.stage {
            Stage::Idle => None,
            Stage::Settling { until } | Stage::Debouncing { until } => Some(until),
        }
    }

    /// Advance the stage machine. Returns the snapshot to commit once both
    /// stages have elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<Snapshot> {
        match self.stage {
            Stage::Idle => None,
            Stage::Settling { until } if now >= until => {
                self.stage = Stage::Debouncing {
                    until: now + self.timing.debounce_delay,
                };
                None
            }
            Stage::Debouncing { until } if now >= until => {
                self.stage = Stage::Idle;
                self.candidate.take()
            }
            _ => None,
        }
    }

    /// Drop any pending candidate without committing it.
    pub fn clear(&mut self) {
        self.candidate = None;
        self.stage = Stage::Idle;
    }

    pub fn is_pending(&self) -> bool {
        self.candidate.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::snapshot::FieldValue;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn snap(price: rust_decimal::Decimal) -> Snapshot {
        let mut s = Snapshot::default();
        s.fields
            .insert("price".into(), FieldValue::Number(price));
        s
    }

    fn pipeline() -> SmoothingPipeline {
        SmoothingPipeline::new(Timing::default())
    }

    /// Drive the machine forward as the runtime would, firing at each
    /// deadline until it commits or goes quiet.
    fn run_to_commit(p: &mut SmoothingPipeline) -> Option<Snapshot> {
        while let Some(deadline) = p.next_deadline() {
            if let Some(snapshot) = p.poll(deadline) {
                return Some(snapshot);
            }
        }
        None
    }

    #[test]
    fn isolated_snapshot_commits_after_settle_and_debounce() {
        let t0 = Instant::now();
        let mut p = pipeline();
        p.accept(snap(dec!(100)), t0);

        // still settling
        assert_eq!(p.poll(t0 + Duration::from_millis(50)), None);
        assert!(p.is_pending());

        let committed = run_to_commit(&mut p).unwrap();
        assert_eq!(committed, snap(dec!(100)));
        assert!(!p.is_pending());
        assert_eq!(p.next_deadline(), None);
    }

    #[test]
    fn burst_commits_only_the_last_snapshot() {
        let t0 = Instant::now();
        let mut p = pipeline();

        for i in 0..10u64 {
            let at = t0 + Duration::from_millis(i * 5);
            assert_eq!(p.poll(at), None);
            p.accept(snap(rust_decimal::Decimal::from(100 + i)), at);
        }

        let committed = run_to_commit(&mut p).unwrap();
        assert_eq!(committed, snap(dec!(109)));
        // nothing further to commit
        assert_eq!(run_to_commit(&mut p), None);
    }

    #[test]
    fn accept_during_debounce_restarts_settle() {
        let t0 = Instant::now();
        let mut p = pipeline();
        p.accept(snap(dec!(100)), t0);

        let settle_done = p.next_deadline().unwrap();
        assert_eq!(p.poll(settle_done), None);
        assert!(matches!(p.stage, Stage::Debouncing { .. }));

        // late replacement supersedes the candidate entirely
        p.accept(snap(dec!(101)), settle_done + Duration::from_millis(10));
        assert!(matches!(p.stage, Stage::Settling { .. }));

        let committed = run_to_commit(&mut p).unwrap();
        assert_eq!(committed, snap(dec!(101)));
    }

    #[test]
    fn clear_cancels_pending_commit() {
        let t0 = Instant::now();
        let mut p = pipeline();
        p.accept(snap(dec!(100)), t0);
        p.clear();
        assert_eq!(p.next_deadline(), None);
        assert_eq!(run_to_commit(&mut p), None);
    }

    #[test]
    fn early_poll_is_a_no_op() {
        let t0 = Instant::now();
        let mut p = pipeline();
        p.accept(snap(dec!(100)), t0);
        assert_eq!(p.poll(t0), None);
        assert!(matches!(p.stage, Stage::Settling { .. }));
    }
}
