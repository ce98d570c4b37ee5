//! Hold-to-confirm trigger: a predicate must hold continuously for a
//! duration before the bound action fires, then a cooldown blocks re-firing.
//!
//! One `HoldTrigger` is instantiated per action (save, close, revert,
//! rename, back navigation, create file, ...).  The caller evaluates the
//! predicate once per frame and builds the action when `update` reports
//! `Fired`.

use tracing::debug;

/// Phase of a hold trigger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoldPhase {
    /// Predicate not satisfied; progress is zero.
    NotHeld,
    /// Predicate satisfied continuously since `since_ms`.
    Holding { since_ms: f64 },
    /// Fired; re-arming is blocked until `until_ms`.
    Cooling { until_ms: f64 },
}

/// Result of one frame of evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoldOutcome {
    Idle,
    Progress(f32),
    /// Progress reached 100 on this frame; fire the action.
    Fired,
    CoolingDown,
}

impl HoldOutcome {
    pub fn fired(&self) -> bool {
        matches!(self, Self::Fired)
    }
}

/// Timed hold state machine.
#[derive(Debug, Clone)]
pub struct HoldTrigger {
    name: &'static str,
    /// Continuous hold required to fire (ms).
    pub duration_ms: f64,
    /// Refractory period after firing (ms).
    pub cooldown_ms: f64,
    phase: HoldPhase,
    progress: f32,
}

impl HoldTrigger {
    pub fn new(name: &'static str, duration_ms: f64, cooldown_ms: f64) -> Self {
        Self {
            name,
            duration_ms,
            cooldown_ms,
            phase: HoldPhase::NotHeld,
            progress: 0.0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn phase(&self) -> HoldPhase {
        self.phase
    }

    /// Hold progress in percent (0-100).
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_cooling(&self) -> bool {
        matches!(self.phase, HoldPhase::Cooling { .. })
    }

    /// Evaluate the predicate for the frame at `now_ms`.
    pub fn update(&mut self, active: bool, now_ms: f64) -> HoldOutcome {
        if let HoldPhase::Cooling { until_ms } = self.phase {
            if now_ms < until_ms {
                self.progress = 0.0;
                return HoldOutcome::CoolingDown;
            }
            self.phase = HoldPhase::NotHeld;
        }

        if !active {
            self.phase = HoldPhase::NotHeld;
            self.progress = 0.0;
            return HoldOutcome::Idle;
        }

        let since_ms = match self.phase {
            HoldPhase::Holding { since_ms } => since_ms,
            _ => {
                self.phase = HoldPhase::Holding { since_ms: now_ms };
                now_ms
            }
        };

        let elapsed = (now_ms - since_ms).max(0.0);
        let progress = if self.duration_ms <= 0.0 {
            100.0
        } else {
            ((elapsed / self.duration_ms) * 100.0).min(100.0) as f32
        };

        if progress >= 100.0 {
            debug!("Hold trigger fired: {} after {:.0}ms", self.name, elapsed);
            self.phase = HoldPhase::Cooling {
                until_ms: now_ms + self.cooldown_ms,
            };
            self.progress = 0.0;
            return HoldOutcome::Fired;
        }

        self.progress = progress;
        HoldOutcome::Progress(progress)
    }

    /// Drop any hold in progress.  A running cooldown is kept.
    pub fn cancel(&mut self) {
        if let HoldPhase::Holding { .. } = self.phase {
            self.phase = HoldPhase::NotHeld;
        }
        self.progress = 0.0;
    }

    /// Return to the initial state, clearing cooldown as well.
    pub fn reset(&mut self) {
        self.phase = HoldPhase::NotHeld;
        self.progress = 0.0;
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive the trigger with a predicate sampled every `step_ms`.
    fn run(trigger: &mut HoldTrigger, from_ms: f64, to_ms: f64, step_ms: f64, active: bool) -> usize {
        let mut fired = 0;
        let mut t = from_ms;
        while t <= to_ms {
            if trigger.update(active, t).fired() {
                fired += 1;
            }
            t += step_ms;
        }
        fired
    }

    #[test]
    fn test_new_trigger_idle() {
        let trigger = HoldTrigger::new("save", 1000.0, 2000.0);
        assert_eq!(trigger.phase(), HoldPhase::NotHeld);
        assert_eq!(trigger.progress(), 0.0);
    }

    #[test]
    fn test_progress_monotonic_while_held() {
        let mut trigger = HoldTrigger::new("save", 1000.0, 2000.0);
        let mut last = 0.0;
        let mut t = 0.0;
        while t < 990.0 {
            trigger.update(true, t);
            assert!(trigger.progress() >= last, "progress decreased at {t}");
            last = trigger.progress();
            t += 16.0;
        }
        assert!(last > 90.0);
    }

    #[test]
    fn test_predicate_failure_resets_instantly() {
        let mut trigger = HoldTrigger::new("close", 1000.0, 2000.0);
        trigger.update(true, 0.0);
        trigger.update(true, 600.0);
        assert!((trigger.progress() - 60.0).abs() < 0.01);

        assert_eq!(trigger.update(false, 616.0), HoldOutcome::Idle);
        assert_eq!(trigger.progress(), 0.0);

        // Restart counts from scratch, no partial credit.
        trigger.update(true, 632.0);
        assert_eq!(trigger.progress(), 0.0);
        trigger.update(true, 1132.0);
        assert!((trigger.progress() - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_fires_once_at_duration() {
        // Thumb held for 1050ms at 60fps: exactly one fire near 1000ms.
        let mut trigger = HoldTrigger::new("save", 1000.0, 2000.0);
        let mut fired_at = Vec::new();
        let mut t = 0.0;
        while t <= 1050.0 {
            if trigger.update(true, t).fired() {
                fired_at.push(t);
            }
            t += 16.0;
        }
        assert_eq!(fired_at.len(), 1, "fired {:?}", fired_at);
        assert!(fired_at[0] >= 1000.0 && fired_at[0] < 1020.0);
    }

    #[test]
    fn test_cooldown_blocks_refire() {
        let mut trigger = HoldTrigger::new("save", 1000.0, 2000.0);
        assert_eq!(run(&mut trigger, 0.0, 1000.0, 10.0, true), 1);
        // Still holding: cooldown ends at 3000, then a fresh 1000ms hold.
        assert_eq!(run(&mut trigger, 1010.0, 2990.0, 10.0, true), 0);
        assert!(trigger.is_cooling());
        assert_eq!(run(&mut trigger, 3000.0, 3990.0, 10.0, true), 0);
        assert_eq!(run(&mut trigger, 4000.0, 4000.0, 10.0, true), 1);
    }

    #[test]
    fn test_release_during_cooldown_keeps_cooldown() {
        let mut trigger = HoldTrigger::new("revert", 1000.0, 2000.0);
        run(&mut trigger, 0.0, 1000.0, 10.0, true);
        assert_eq!(trigger.update(false, 1200.0), HoldOutcome::CoolingDown);
        assert_eq!(trigger.update(true, 1300.0), HoldOutcome::CoolingDown);
        assert!(trigger.is_cooling());
        assert_eq!(trigger.update(true, 3000.0), HoldOutcome::Progress(0.0));
    }

    #[test]
    fn test_zero_duration_fires_immediately() {
        let mut trigger = HoldTrigger::new("instant", 0.0, 500.0);
        assert!(trigger.update(true, 5.0).fired());
    }

    #[test]
    fn test_cancel_keeps_cooldown_reset_clears() {
        let mut trigger = HoldTrigger::new("back", 500.0, 1000.0);
        run(&mut trigger, 0.0, 500.0, 10.0, true);
        trigger.cancel();
        assert!(trigger.is_cooling());
        trigger.reset();
        assert_eq!(trigger.phase(), HoldPhase::NotHeld);

        trigger.update(true, 600.0);
        trigger.update(true, 700.0);
        trigger.cancel();
        assert_eq!(trigger.phase(), HoldPhase::NotHeld);
        assert_eq!(trigger.progress(), 0.0);
    }
}
