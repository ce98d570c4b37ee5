//! Two-hand zoom channel.
//!
//! The distance between both index fingertips is smoothed and mapped to a
//! font size.  Sudden jumps are treated as tracking glitches and frozen out
//! for a cooldown; holding the hands still long enough hard-locks the
//! channel, which then releases itself after a fixed delay.
//!
//! Timers are polled: the lock release is detected on the first frame at
//! or after its deadline, so it can only be observed once.

use tracing::{debug, info, warn};

use super::landmarks::lerp;

// ── Config ─────────────────────────────────────────────────

/// Zoom channel tuning.  Distances are normalized image units.
#[derive(Debug, Clone)]
pub struct ZoomConfig {
    /// Per-frame raw distance change treated as a glitch.
    pub glitch_velocity: f32,
    /// Updates ignored after a glitch (ms).
    pub glitch_cooldown_ms: f64,
    /// Exponential smoothing factor for new samples.
    pub smoothing: f32,
    /// Per-frame velocity below which the hands count as still.
    pub stable_velocity: f32,
    /// Stillness required before hard-locking (ms).
    pub stable_duration_ms: f64,
    /// How long a hard lock lasts (ms).
    pub lock_duration_ms: f64,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_px: f32,
    pub max_px: f32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            glitch_velocity: 0.08,
            glitch_cooldown_ms: 1000.0,
            smoothing: 0.2,
            stable_velocity: 0.005,
            stable_duration_ms: 2000.0,
            lock_duration_ms: 2000.0,
            min_distance: 0.05,
            max_distance: 0.5,
            min_px: 12.0,
            max_px: 36.0,
        }
    }
}

/// Linear map from hand distance to output size, clamped to
/// `[min_px, max_px]`.
pub fn map_distance_to_px(distance: f32, cfg: &ZoomConfig) -> f32 {
    let span = cfg.max_distance - cfg.min_distance;
    if span <= 0.0 {
        return cfg.min_px;
    }
    let t = ((distance - cfg.min_distance) / span).clamp(0.0, 1.0);
    cfg.min_px + t * (cfg.max_px - cfg.min_px)
}

// ── Channel ────────────────────────────────────────────────

/// Lock sub-state of the zoom channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomLockState {
    Free,
    /// Velocity has stayed below the stability threshold since `since_ms`.
    Stabilizing { since_ms: f64 },
    /// All input ignored until `until_ms`.
    HardLocked { until_ms: f64 },
}

impl ZoomLockState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Stabilizing { .. } => "stabilizing",
            Self::HardLocked { .. } => "hard-locked",
        }
    }
}

/// Output of one zoom update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomEvent {
    /// New rounded output size.
    Size(u32),
    Locked,
    Unlocked,
}

#[derive(Debug, Clone)]
pub struct ZoomChannel {
    raw: Option<f32>,
    smoothed: Option<f32>,
    velocity: f32,
    lock: ZoomLockState,
    glitch_until_ms: f64,
    last_px: Option<u32>,
}

impl Default for ZoomChannel {
    fn default() -> Self {
        Self {
            raw: None,
            smoothed: None,
            velocity: 0.0,
            lock: ZoomLockState::Free,
            glitch_until_ms: 0.0,
            last_px: None,
        }
    }
}

impl ZoomChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self) -> Option<f32> {
        self.raw
    }

    pub fn smoothed(&self) -> Option<f32> {
        self.smoothed
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn lock_state(&self) -> ZoomLockState {
        self.lock
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.lock, ZoomLockState::HardLocked { .. })
    }

    /// Last emitted output size.
    pub fn size_px(&self) -> Option<u32> {
        self.last_px
    }

    /// Feed the fingertip distance for this frame (`None` when fewer than
    /// two hands are tracked).
    pub fn update(&mut self, distance: Option<f32>, now_ms: f64, cfg: &ZoomConfig) -> Vec<ZoomEvent> {
        let mut events = Vec::new();

        if let ZoomLockState::HardLocked { until_ms } = self.lock {
            if now_ms < until_ms {
                return events;
            }
            info!("Zoom unlocked");
            self.reset_tracking();
            events.push(ZoomEvent::Unlocked);
            return events;
        }

        let Some(raw) = distance else {
            self.reset_tracking();
            return events;
        };

        let prev = self.raw.replace(raw).unwrap_or(raw);
        self.velocity = (raw - prev).abs();

        if now_ms < self.glitch_until_ms {
            return events;
        }
        if self.velocity > cfg.glitch_velocity {
            warn!(
                "Zoom glitch: distance jumped {:.3} -> {:.3}, ignoring for {:.0}ms",
                prev, raw, cfg.glitch_cooldown_ms
            );
            self.glitch_until_ms = now_ms + cfg.glitch_cooldown_ms;
            self.lock = ZoomLockState::Free;
            return events;
        }

        let smoothed = match self.smoothed {
            Some(s) => lerp(s, raw, cfg.smoothing),
            None => raw,
        };
        self.smoothed = Some(smoothed);

        let px = map_distance_to_px(smoothed, cfg).round() as u32;
        if self.last_px != Some(px) {
            debug!("Zoom size: {}px (distance {:.3})", px, smoothed);
            self.last_px = Some(px);
            events.push(ZoomEvent::Size(px));
        }

        if self.velocity < cfg.stable_velocity {
            match self.lock {
                ZoomLockState::Free => {
                    self.lock = ZoomLockState::Stabilizing { since_ms: now_ms };
                }
                ZoomLockState::Stabilizing { since_ms } if now_ms - since_ms >= cfg.stable_duration_ms => {
                    info!("Zoom locked at {}px", px);
                    self.lock = ZoomLockState::HardLocked {
                        until_ms: now_ms + cfg.lock_duration_ms,
                    };
                    events.push(ZoomEvent::Locked);
                }
                _ => {}
            }
        } else {
            self.lock = ZoomLockState::Free;
        }

        events
    }

    /// Forget the current gesture.  The last output size is kept.
    fn reset_tracking(&mut self) {
        self.raw = None;
        self.smoothed = None;
        self.velocity = 0.0;
        self.lock = ZoomLockState::Free;
    }

    /// Return to the initial state.  A hard lock is released now rather
    /// than at its deadline, and the release is returned.
    pub fn reset(&mut self) -> Option<ZoomEvent> {
        let released = self.is_locked().then_some(ZoomEvent::Unlocked);
        if released.is_some() {
            info!("Zoom unlocked by reset");
        }
        *self = Self::default();
        released
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ZoomConfig {
        ZoomConfig::default()
    }

    #[test]
    fn test_mapping_endpoints_and_clamp() {
        let c = cfg();
        assert!((map_distance_to_px(0.05, &c) - 12.0).abs() < 1e-4);
        assert!((map_distance_to_px(0.5, &c) - 36.0).abs() < 1e-4);
        assert!((map_distance_to_px(0.275, &c) - 24.0).abs() < 1e-4);
        assert_eq!(map_distance_to_px(-3.0, &c), 12.0);
        assert_eq!(map_distance_to_px(0.01, &c), 12.0);
        assert_eq!(map_distance_to_px(0.9, &c), 36.0);
        assert_eq!(map_distance_to_px(f32::MAX, &c), 36.0);
    }

    #[test]
    fn test_first_sample_emits_size() {
        let mut z = ZoomChannel::new();
        let events = z.update(Some(0.275), 0.0, &cfg());
        assert_eq!(events, vec![ZoomEvent::Size(24)]);
        assert_eq!(z.smoothed(), Some(0.275));
        // Same size again: nothing new.
        assert!(z.update(Some(0.275), 16.0, &cfg()).is_empty());
    }

    #[test]
    fn test_exponential_smoothing() {
        let mut z = ZoomChannel::new();
        z.update(Some(0.20), 0.0, &cfg());
        z.update(Some(0.25), 16.0, &cfg());
        let s = z.smoothed().unwrap();
        assert!((s - 0.21).abs() < 1e-5, "0.8*0.20 + 0.2*0.25, got {s}");
    }

    #[test]
    fn test_glitch_freezes_updates() {
        let mut z = ZoomChannel::new();
        z.update(Some(0.20), 0.0, &cfg());
        assert!(z.update(Some(0.40), 16.0, &cfg()).is_empty(), "jump of 0.2 is a glitch");
        assert_eq!(z.smoothed(), Some(0.20));

        // Small moves inside the glitch cooldown are ignored too.
        assert!(z.update(Some(0.41), 500.0, &cfg()).is_empty());
        assert_eq!(z.smoothed(), Some(0.20));

        // After the cooldown smoothing resumes from the held value.
        z.update(Some(0.42), 1016.0, &cfg());
        let s = z.smoothed().unwrap();
        assert!((s - (0.8 * 0.20 + 0.2 * 0.42)).abs() < 1e-5);
    }

    #[test]
    fn test_stability_lock_and_release() {
        let c = cfg();
        let mut z = ZoomChannel::new();
        let mut locked_at = None;
        let mut t = 0.0;
        while t <= 2100.0 {
            if z.update(Some(0.3), t, &c).contains(&ZoomEvent::Locked) {
                locked_at = Some(t);
            }
            t += 20.0;
        }
        assert_eq!(locked_at, Some(2000.0));
        assert!(z.is_locked());

        // Locked: moving the hands changes nothing.
        assert!(z.update(Some(0.45), 3000.0, &c).is_empty());
        assert_eq!(z.smoothed(), Some(0.3));

        // Release fires once, tracking starts fresh.
        assert_eq!(z.update(Some(0.45), 4000.0, &c), vec![ZoomEvent::Unlocked]);
        assert_eq!(z.lock_state(), ZoomLockState::Free);
        assert_eq!(z.smoothed(), None);
        let events = z.update(Some(0.45), 4020.0, &c);
        assert!(!events.contains(&ZoomEvent::Unlocked));
        assert_eq!(z.smoothed(), Some(0.45));
    }

    #[test]
    fn test_motion_breaks_stabilizing() {
        let c = cfg();
        let mut z = ZoomChannel::new();
        z.update(Some(0.30), 0.0, &c);
        assert!(matches!(z.lock_state(), ZoomLockState::Stabilizing { .. }));
        z.update(Some(0.33), 1500.0, &c);
        assert_eq!(z.lock_state(), ZoomLockState::Free);
        // Stillness restarts the clock.
        z.update(Some(0.33), 1600.0, &c);
        assert!(z.update(Some(0.33), 3000.0, &c).iter().all(|e| *e != ZoomEvent::Locked));
        assert!(z.update(Some(0.33), 3600.0, &c).contains(&ZoomEvent::Locked));
    }

    #[test]
    fn test_missing_hand_resets_tracking() {
        let mut z = ZoomChannel::new();
        z.update(Some(0.20), 0.0, &cfg());
        z.update(None, 16.0, &cfg());
        assert_eq!(z.smoothed(), None);
        // Re-acquired far away: no glitch, starts fresh.
        z.update(Some(0.45), 32.0, &cfg());
        assert_eq!(z.smoothed(), Some(0.45));
    }

    #[test]
    fn test_reset_releases_lock_once() {
        let c = cfg();
        let mut z = ZoomChannel::new();
        let mut t = 0.0;
        while t <= 2000.0 {
            z.update(Some(0.3), t, &c);
            t += 20.0;
        }
        assert!(z.is_locked());
        assert_eq!(z.reset(), Some(ZoomEvent::Unlocked));
        assert!(!z.is_locked());
        assert_eq!(z.size_px(), None);
        // Released already; the old deadline is not reported again.
        assert!(!z.update(Some(0.3), 4100.0, &c).contains(&ZoomEvent::Unlocked));
        assert_eq!(z.reset(), None);
    }
}
