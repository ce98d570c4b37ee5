//! Number mode: finger-count entry and the pinch dial.
//!
//! While number mode is on, a steady two-hand finger count is confirmed by
//! a hold, and a pinching primary hand turns a dial whose value follows
//! the tilt of the hand.

use tracing::{debug, info};

use super::hold::HoldTrigger;
use super::landmarks::{HandLandmarks, Landmark};

// ── Config ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NumberConfig {
    /// Steady count required before the number is accepted (ms).
    pub hold_ms: f64,
    pub cooldown_ms: f64,
    /// Per-frame angle change (degrees) under which the dial is still.
    pub dial_stable_deg: f32,
    /// Stillness required to lock the dial value (ms).
    pub dial_lock_ms: f64,
    /// Hand tilt (degrees either side of upright) spanning the dial range.
    pub dial_range_deg: f32,
}

impl Default for NumberConfig {
    fn default() -> Self {
        Self {
            hold_ms: 1000.0,
            cooldown_ms: 2000.0,
            dial_stable_deg: 2.0,
            dial_lock_ms: 1500.0,
            dial_range_deg: 90.0,
        }
    }
}

// ── Finger count ───────────────────────────────────────────

/// Confirms a finger count once it has stayed unchanged for the hold
/// duration.
#[derive(Debug, Clone)]
pub struct NumberCounter {
    candidate: Option<u8>,
    trigger: HoldTrigger,
}

impl NumberCounter {
    pub fn new(cfg: &NumberConfig) -> Self {
        Self {
            candidate: None,
            trigger: HoldTrigger::new("number", cfg.hold_ms, cfg.cooldown_ms),
        }
    }

    pub fn candidate(&self) -> Option<u8> {
        self.candidate
    }

    pub fn progress(&self) -> f32 {
        self.trigger.progress()
    }

    /// Feed this frame's total count.  Returns the number when confirmed.
    pub fn update(&mut self, count: Option<u8>, now_ms: f64) -> Option<u8> {
        if count != self.candidate {
            self.trigger.cancel();
            self.candidate = count;
        }
        let n = count?;
        if self.trigger.update(true, now_ms).fired() {
            info!("Number detected: {}", n);
            return Some(n);
        }
        None
    }

    pub fn reset(&mut self) {
        self.candidate = None;
        self.trigger.reset();
    }
}

// ── Dial ───────────────────────────────────────────────────

/// Dial output for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DialEvent {
    Rotate { value: u8, angle: f32 },
    Lock { value: u8 },
}

/// Tilt of the wrist→middle-knuckle vector in degrees; 0 is upright,
/// positive leans toward larger x.
pub fn hand_tilt_deg(hand: &HandLandmarks) -> f32 {
    let wrist = hand.point(Landmark::Wrist);
    let mcp = hand.point(Landmark::MiddleMcp);
    let dx = mcp.x - wrist.x;
    let up = wrist.y - mcp.y;
    dx.atan2(up).to_degrees()
}

/// Map a tilt angle onto the 0-100 dial scale.
pub fn dial_value(angle_deg: f32, range_deg: f32) -> u8 {
    if range_deg <= 0.0 {
        return 50;
    }
    let t = ((angle_deg + range_deg) / (2.0 * range_deg)).clamp(0.0, 1.0);
    (t * 100.0).round() as u8
}

/// Pinch-driven dial.  Active only while the primary hand pinches; each
/// pinch can lock at most once.
#[derive(Debug, Clone, Default)]
pub struct DialController {
    last_angle: Option<f32>,
    value: Option<u8>,
    stable_since_ms: Option<f64>,
    locked: bool,
}

impl DialController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> Option<u8> {
        self.value
    }

    pub fn is_active(&self) -> bool {
        self.last_angle.is_some()
    }

    pub fn update(
        &mut self,
        hand: Option<&HandLandmarks>,
        pinching: bool,
        now_ms: f64,
        cfg: &NumberConfig,
    ) -> Vec<DialEvent> {
        let mut events = Vec::new();
        let Some(hand) = hand.filter(|_| pinching) else {
            if self.is_active() {
                debug!("Dial released at {:?}", self.value);
            }
            self.reset();
            return events;
        };

        let angle = hand_tilt_deg(hand);
        let value = dial_value(angle, cfg.dial_range_deg);
        if self.value != Some(value) {
            self.value = Some(value);
            events.push(DialEvent::Rotate { value, angle });
        }

        let still = self
            .last_angle
            .is_some_and(|prev| (angle - prev).abs() < cfg.dial_stable_deg);
        if !still {
            self.stable_since_ms = Some(now_ms);
        }
        self.last_angle = Some(angle);

        if let Some(since) = self.stable_since_ms {
            if !self.locked && now_ms - since >= cfg.dial_lock_ms {
                self.locked = true;
                info!("Dial locked at {}", value);
                events.push(DialEvent::Lock { value });
            }
        }
        events
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ── Tests ──────────────────────────────────────────────────
