//! Shake detector: direction reversals of a fisted wrist.
//!
//! Movement is measured from an anchor that advances every time the wrist
//! travels past the reversal distance.  The dominant axis of each move is
//! recorded; a move along the same axis in the opposite direction counts as
//! a reversal.  Enough reversals inside the window toggle number mode.

use tracing::{debug, info};

/// Shake detection tuning.
#[derive(Debug, Clone)]
pub struct ShakeConfig {
    /// Window in which the reversals must happen (ms).
    pub window_ms: f64,
    /// Wrist travel that registers a direction (normalized units).
    pub reversal_distance: f32,
    pub reversals_required: u32,
    /// Refractory period after a toggle (ms).
    pub cooldown_ms: f64,
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self {
            window_ms: 1000.0,
            reversal_distance: 0.025,
            reversals_required: 3,
            cooldown_ms: 1500.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone, Default)]
pub struct ShakeDetector {
    anchor: Option<(f32, f32)>,
    direction: Option<(Axis, bool)>,
    reversals: u32,
    window_start_ms: f64,
    cooldown_until_ms: f64,
}

impl ShakeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reversals(&self) -> u32 {
        self.reversals
    }

    pub fn is_cooling(&self, now_ms: f64) -> bool {
        now_ms < self.cooldown_until_ms
    }

    /// Feed the wrist position for this frame, `None` unless the hand is a
    /// fist.  Returns true on the frame a shake completes.
    pub fn update(&mut self, wrist: Option<(f32, f32)>, now_ms: f64, cfg: &ShakeConfig) -> bool {
        if self.is_cooling(now_ms) {
            self.clear();
            return false;
        }
        let Some((x, y)) = wrist else {
            self.clear();
            return false;
        };
        let Some((ax, ay)) = self.anchor else {
            self.start(x, y, now_ms);
            return false;
        };
        if now_ms - self.window_start_ms > cfg.window_ms {
            if self.reversals > 0 {
                debug!("Shake window expired after {} reversals", self.reversals);
            }
            self.start(x, y, now_ms);
            return false;
        }

        let dx = x - ax;
        let dy = y - ay;
        let (axis, delta) = if dx.abs() >= dy.abs() { (Axis::X, dx) } else { (Axis::Y, dy) };
        if delta.abs() <= cfg.reversal_distance {
            return false;
        }

        let positive = delta > 0.0;
        if let Some((prev_axis, prev_positive)) = self.direction {
            if prev_axis == axis && prev_positive != positive {
                self.reversals += 1;
                debug!("Shake reversal {} on {:?}", self.reversals, axis);
            }
        }
        self.direction = Some((axis, positive));
        self.anchor = Some((x, y));

        if self.reversals >= cfg.reversals_required {
            info!("Shake detected ({} reversals)", self.reversals);
            self.cooldown_until_ms = now_ms + cfg.cooldown_ms;
            self.clear();
            return true;
        }
        false
    }

    fn start(&mut self, x: f32, y: f32, now_ms: f64) {
        self.anchor = Some((x, y));
        self.direction = None;
        self.reversals = 0;
        self.window_start_ms = now_ms;
    }

    fn clear(&mut self) {
        self.anchor = None;
        self.direction = None;
        self.reversals = 0;
    }

    /// Return to the initial state, including the cooldown.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ── Tests ──────────────────────────────────────────────────
