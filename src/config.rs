//! Engine configuration.
//!
//! One `Default`-implementing struct per subsystem, collected in
//! `EngineConfig`.  A config file is a single s-expression plist with
//! kebab-case keys; keys it does not mention keep their defaults.
//!
//! ```text
//! (:pinch-grab 0.04 :drag-threshold-px 50 :mirror t
//!  :dynamic-normalization scale-invariant :dtw-window nil)
//! ```

use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use lexpr::Value;
use tracing::warn;

use crate::dynamic::{DtwOptions, EngineOptions, FrameNormalization};
use crate::tracking::drag::DragConfig;
use crate::tracking::number::NumberConfig;
use crate::tracking::pose::PoseThresholds;
use crate::tracking::shake::ShakeConfig;
use crate::tracking::zoom::ZoomConfig;

// ── Subsystem configs ──────────────────────────────────────

/// Mapping of the primary index fingertip to screen space.
#[derive(Debug, Clone)]
pub struct CursorConfig {
    /// Exponential smoothing factor toward the new position.
    pub smoothing: f32,
    pub screen_width: f32,
    pub screen_height: f32,
    /// Mirror x (selfie camera).
    pub mirror: bool,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.10,
            screen_width: 1280.0,
            screen_height: 720.0,
            mirror: true,
        }
    }
}

/// Hover-and-hold navigation.
#[derive(Debug, Clone)]
pub struct NavigationConfig {
    pub folder_hold_ms: f64,
    pub back_hold_ms: f64,
    /// Hold when the secondary hand pinches (dual-hand click).
    pub dual_click_hold_ms: f64,
    pub cooldown_ms: f64,
    /// Single-threshold pinch test for the secondary hand.
    pub secondary_pinch: f32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            folder_hold_ms: 1000.0,
            back_hold_ms: 500.0,
            dual_click_hold_ms: 100.0,
            cooldown_ms: 1000.0,
            secondary_pinch: 0.05,
        }
    }
}

/// Hold durations for file lifecycle and dialog actions.
#[derive(Debug, Clone)]
pub struct ActionHoldConfig {
    /// Save, close and revert.
    pub file_hold_ms: f64,
    pub cooldown_ms: f64,
    pub rename_open_hold_ms: f64,
    /// Rename confirm/cancel.
    pub dialog_hold_ms: f64,
    pub create_hold_ms: f64,
    pub create_cooldown_ms: f64,
    /// Index fingertip distance that counts as a two-hand touch.
    pub touch_threshold: f32,
}

impl Default for ActionHoldConfig {
    fn default() -> Self {
        Self {
            file_hold_ms: 1000.0,
            cooldown_ms: 2000.0,
            rename_open_hold_ms: 800.0,
            dialog_hold_ms: 800.0,
            create_hold_ms: 1000.0,
            create_cooldown_ms: 2000.0,
            touch_threshold: 0.05,
        }
    }
}

// ── Aggregate ──────────────────────────────────────────────

/// Every tunable of the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Vision labels at or below this score are discarded.
    pub min_label_score: f32,
    pub pose: PoseThresholds,
    pub cursor: CursorConfig,
    pub navigation: NavigationConfig,
    pub actions: ActionHoldConfig,
    pub drag: DragConfig,
    pub zoom: ZoomConfig,
    pub shake: ShakeConfig,
    pub number: NumberConfig,
    pub dynamic: EngineOptions,
    pub dtw: DtwOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_label_score: 0.5,
            pose: PoseThresholds::default(),
            cursor: CursorConfig::default(),
            navigation: NavigationConfig::default(),
            actions: ActionHoldConfig::default(),
            drag: DragConfig::default(),
            zoom: ZoomConfig::default(),
            shake: ShakeConfig::default(),
            number: NumberConfig::default(),
            dynamic: EngineOptions::default(),
            dtw: DtwOptions::default(),
        }
    }
}

impl EngineConfig {
    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_sexp(&text).with_context(|| format!("loading config {}", path.display()))
    }

    /// Parse a plist over the defaults.
    pub fn from_sexp(text: &str) -> Result<Self> {
        let value = lexpr::from_str(text).context("config is not a valid s-expression")?;
        let mut cfg = Self::default();
        let mut current = &value;
        loop {
            match current {
                Value::Cons(pair) => {
                    let Some(key) = keyword_name(pair.car()) else {
                        bail!("expected a keyword, found {}", pair.car());
                    };
                    let Value::Cons(next) = pair.cdr() else {
                        bail!("keyword :{} has no value", key);
                    };
                    let Some(val) = value_string(next.car()) else {
                        bail!("unsupported value for :{}: {}", key, next.car());
                    };
                    cfg.set(&key, &val)?;
                    current = next.cdr();
                }
                Value::Null | Value::Nil => break,
                other => bail!("config must be a plist, found {}", other),
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply one setting.  Unknown keys are logged and ignored.
    pub fn set(&mut self, key: &str, val: &str) -> Result<()> {
        match key {
            "min-label-score" => self.min_label_score = parse(key, val)?,
            "pinch-grab" => self.pose.pinch_grab = parse(key, val)?,
            "pinch-release" => self.pose.pinch_release = parse(key, val)?,
            "curl-threshold" => self.pose.curl = parse(key, val)?,
            "fist-wrist-threshold" => self.pose.fist_wrist = parse(key, val)?,
            "fist-min-curled" => self.pose.fist_min_curled = parse(key, val)?,
            "point-extension" => self.pose.point_extension = parse(key, val)?,
            "horizontal-ratio" => self.pose.horizontal_ratio = parse(key, val)?,
            "thumb-extended" => self.pose.thumb_extended = parse(key, val)?,
            "open-palm-span" => self.pose.open_palm_span = parse(key, val)?,
            "cursor-smoothing" => self.cursor.smoothing = parse(key, val)?,
            "screen-width" => self.cursor.screen_width = parse(key, val)?,
            "screen-height" => self.cursor.screen_height = parse(key, val)?,
            "mirror" => self.cursor.mirror = parse_bool(val),
            "folder-hold-ms" => self.navigation.folder_hold_ms = parse(key, val)?,
            "back-hold-ms" => self.navigation.back_hold_ms = parse(key, val)?,
            "dual-click-hold-ms" => self.navigation.dual_click_hold_ms = parse(key, val)?,
            "navigation-cooldown-ms" => self.navigation.cooldown_ms = parse(key, val)?,
            "secondary-pinch" => self.navigation.secondary_pinch = parse(key, val)?,
            "file-hold-ms" => self.actions.file_hold_ms = parse(key, val)?,
            "action-cooldown-ms" => self.actions.cooldown_ms = parse(key, val)?,
            "rename-open-hold-ms" => self.actions.rename_open_hold_ms = parse(key, val)?,
            "dialog-hold-ms" => self.actions.dialog_hold_ms = parse(key, val)?,
            "create-hold-ms" => self.actions.create_hold_ms = parse(key, val)?,
            "create-cooldown-ms" => self.actions.create_cooldown_ms = parse(key, val)?,
            "touch-threshold" => self.actions.touch_threshold = parse(key, val)?,
            "drag-threshold-px" => self.drag.threshold_px = parse(key, val)?,
            "drag-open-hold-ms" => self.drag.open_hold_ms = parse(key, val)?,
            "drag-rename-hold-ms" => self.drag.rename_hold_ms = parse(key, val)?,
            "drag-debounce-ms" => self.drag.debounce_ms = parse(key, val)?,
            "scissors-open" => self.drag.scissors_open = parse(key, val)?,
            "scissors-close" => self.drag.scissors_close = parse(key, val)?,
            "zoom-glitch-velocity" => self.zoom.glitch_velocity = parse(key, val)?,
            "zoom-glitch-cooldown-ms" => self.zoom.glitch_cooldown_ms = parse(key, val)?,
            "zoom-smoothing" => self.zoom.smoothing = parse(key, val)?,
            "zoom-stable-velocity" => self.zoom.stable_velocity = parse(key, val)?,
            "zoom-stable-ms" => self.zoom.stable_duration_ms = parse(key, val)?,
            "zoom-lock-ms" => self.zoom.lock_duration_ms = parse(key, val)?,
            "zoom-min-distance" => self.zoom.min_distance = parse(key, val)?,
            "zoom-max-distance" => self.zoom.max_distance = parse(key, val)?,
            "zoom-min-px" => self.zoom.min_px = parse(key, val)?,
            "zoom-max-px" => self.zoom.max_px = parse(key, val)?,
            "shake-window-ms" => self.shake.window_ms = parse(key, val)?,
            "shake-distance" => self.shake.reversal_distance = parse(key, val)?,
            "shake-reversals" => self.shake.reversals_required = parse(key, val)?,
            "shake-cooldown-ms" => self.shake.cooldown_ms = parse(key, val)?,
            "number-hold-ms" => self.number.hold_ms = parse(key, val)?,
            "number-cooldown-ms" => self.number.cooldown_ms = parse(key, val)?,
            "dial-stable-deg" => self.number.dial_stable_deg = parse(key, val)?,
            "dial-lock-ms" => self.number.dial_lock_ms = parse(key, val)?,
            "dial-range-deg" => self.number.dial_range_deg = parse(key, val)?,
            "dynamic-time-steps" => self.dynamic.time_steps = parse(key, val)?,
            "dynamic-min-confidence" => self.dynamic.min_confidence = parse(key, val)?,
            "dynamic-cooldown-ms" => self.dynamic.cooldown_ms = parse(key, val)?,
            "dynamic-normalization" => {
                self.dynamic.normalization = FrameNormalization::from_name(val)
                    .with_context(|| format!("unknown normalization '{}'", val))?
            }
            "dtw-threshold" => self.dtw.threshold = parse(key, val)?,
            "dtw-max-templates" => self.dtw.max_templates_per_label = parse(key, val)?,
            "dtw-window" => {
                self.dtw.window = if val == "nil" { None } else { Some(parse(key, val)?) }
            }
            "dtw-distance-scale" => self.dtw.distance_scale = parse(key, val)?,
            _ => warn!("Ignoring unknown config key :{}", key),
        }
        Ok(())
    }

    /// Reject settings that would make a state machine meaningless.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.pose.pinch_grab < self.pose.pinch_release,
            "pinch-grab ({}) must be below pinch-release ({})",
            self.pose.pinch_grab,
            self.pose.pinch_release
        );
        ensure!(
            self.drag.scissors_close < self.drag.scissors_open,
            "scissors-close must be below scissors-open"
        );
        ensure!(
            self.zoom.min_distance < self.zoom.max_distance,
            "zoom-min-distance must be below zoom-max-distance"
        );
        ensure!(
            self.cursor.smoothing > 0.0 && self.cursor.smoothing <= 1.0,
            "cursor-smoothing must be in (0, 1]"
        );
        ensure!(
            self.zoom.smoothing > 0.0 && self.zoom.smoothing <= 1.0,
            "zoom-smoothing must be in (0, 1]"
        );
        ensure!(
            self.cursor.screen_width > 0.0 && self.cursor.screen_height > 0.0,
            "screen size must be positive"
        );
        ensure!(self.dynamic.time_steps > 0, "dynamic-time-steps must be positive");
        ensure!(self.dtw.max_templates_per_label > 0, "dtw-max-templates must be positive");
        ensure!(self.dtw.distance_scale > 0.0, "dtw-distance-scale must be positive");
        Ok(())
    }

    /// Effective configuration as a plist accepted by `from_sexp`.
    pub fn config_sexp(&self) -> String {
        let b = |v: bool| if v { "t" } else { "nil" };
        let window = self
            .dtw
            .window
            .map(|w| w.to_string())
            .unwrap_or_else(|| "nil".to_string());
        let fields: Vec<(&str, String)> = vec![
            ("min-label-score", self.min_label_score.to_string()),
            ("pinch-grab", self.pose.pinch_grab.to_string()),
            ("pinch-release", self.pose.pinch_release.to_string()),
            ("curl-threshold", self.pose.curl.to_string()),
            ("fist-wrist-threshold", self.pose.fist_wrist.to_string()),
            ("fist-min-curled", self.pose.fist_min_curled.to_string()),
            ("point-extension", self.pose.point_extension.to_string()),
            ("horizontal-ratio", self.pose.horizontal_ratio.to_string()),
            ("thumb-extended", self.pose.thumb_extended.to_string()),
            ("open-palm-span", self.pose.open_palm_span.to_string()),
            ("cursor-smoothing", self.cursor.smoothing.to_string()),
            ("screen-width", self.cursor.screen_width.to_string()),
            ("screen-height", self.cursor.screen_height.to_string()),
            ("mirror", b(self.cursor.mirror).to_string()),
            ("folder-hold-ms", self.navigation.folder_hold_ms.to_string()),
            ("back-hold-ms", self.navigation.back_hold_ms.to_string()),
            ("dual-click-hold-ms", self.navigation.dual_click_hold_ms.to_string()),
            ("navigation-cooldown-ms", self.navigation.cooldown_ms.to_string()),
            ("secondary-pinch", self.navigation.secondary_pinch.to_string()),
            ("file-hold-ms", self.actions.file_hold_ms.to_string()),
            ("action-cooldown-ms", self.actions.cooldown_ms.to_string()),
            ("rename-open-hold-ms", self.actions.rename_open_hold_ms.to_string()),
            ("dialog-hold-ms", self.actions.dialog_hold_ms.to_string()),
            ("create-hold-ms", self.actions.create_hold_ms.to_string()),
            ("create-cooldown-ms", self.actions.create_cooldown_ms.to_string()),
            ("touch-threshold", self.actions.touch_threshold.to_string()),
            ("drag-threshold-px", self.drag.threshold_px.to_string()),
            ("drag-open-hold-ms", self.drag.open_hold_ms.to_string()),
            ("drag-rename-hold-ms", self.drag.rename_hold_ms.to_string()),
            ("drag-debounce-ms", self.drag.debounce_ms.to_string()),
            ("scissors-open", self.drag.scissors_open.to_string()),
            ("scissors-close", self.drag.scissors_close.to_string()),
            ("zoom-glitch-velocity", self.zoom.glitch_velocity.to_string()),
            ("zoom-glitch-cooldown-ms", self.zoom.glitch_cooldown_ms.to_string()),
            ("zoom-smoothing", self.zoom.smoothing.to_string()),
            ("zoom-stable-velocity", self.zoom.stable_velocity.to_string()),
            ("zoom-stable-ms", self.zoom.stable_duration_ms.to_string()),
            ("zoom-lock-ms", self.zoom.lock_duration_ms.to_string()),
            ("zoom-min-distance", self.zoom.min_distance.to_string()),
            ("zoom-max-distance", self.zoom.max_distance.to_string()),
            ("zoom-min-px", self.zoom.min_px.to_string()),
            ("zoom-max-px", self.zoom.max_px.to_string()),
            ("shake-window-ms", self.shake.window_ms.to_string()),
            ("shake-distance", self.shake.reversal_distance.to_string()),
            ("shake-reversals", self.shake.reversals_required.to_string()),
            ("shake-cooldown-ms", self.shake.cooldown_ms.to_string()),
            ("number-hold-ms", self.number.hold_ms.to_string()),
            ("number-cooldown-ms", self.number.cooldown_ms.to_string()),
            ("dial-stable-deg", self.number.dial_stable_deg.to_string()),
            ("dial-lock-ms", self.number.dial_lock_ms.to_string()),
            ("dial-range-deg", self.number.dial_range_deg.to_string()),
            ("dynamic-time-steps", self.dynamic.time_steps.to_string()),
            ("dynamic-min-confidence", self.dynamic.min_confidence.to_string()),
            ("dynamic-cooldown-ms", self.dynamic.cooldown_ms.to_string()),
            ("dynamic-normalization", self.dynamic.normalization.as_str().to_string()),
            ("dtw-threshold", self.dtw.threshold.to_string()),
            ("dtw-max-templates", self.dtw.max_templates_per_label.to_string()),
            ("dtw-window", window),
            ("dtw-distance-scale", self.dtw.distance_scale.to_string()),
        ];
        let body: Vec<String> = fields.iter().map(|(k, v)| format!(":{} {}", k, v)).collect();
        format!("({})", body.join(" "))
    }
}

// ── Plist helpers ──────────────────────────────────────────

/// Name of a plist key, for both `Value::Keyword("key")` (elisp parser)
/// and `Value::Symbol(":key")` (default parser).
fn keyword_name(value: &Value) -> Option<String> {
    match value {
        Value::Keyword(k) => Some(k.to_string()),
        Value::Symbol(s) => s.strip_prefix(':').map(str::to_string),
        _ => None,
    }
}

/// Plist value as a string.
fn value_string(value: &Value) -> Option<String> {
    match value {
        Value::Keyword(v) => Some(v.to_string()),
        Value::Symbol(v) => Some(v.strip_prefix(':').unwrap_or(&**v).to_string()),
        Value::String(v) => Some(v.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "t" } else { "nil" }.to_string()),
        Value::Null | Value::Nil => Some("nil".to_string()),
        _ => None,
    }
}

fn parse<T: std::str::FromStr>(key: &str, val: &str) -> Result<T> {
    match val.parse() {
        Ok(v) => Ok(v),
        Err(_) => bail!("invalid value for :{}: {}", key, val),
    }
}

fn parse_bool(val: &str) -> bool {
    !matches!(val, "nil" | "false" | "#f")
}

// ── Tests ──────────────────────────────────────────────────
