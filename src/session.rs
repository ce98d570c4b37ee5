//! Per-session gesture state and frame orchestration.
//!
//! A `GestureSession` owns every timer, hysteresis flag and channel of one
//! tracking session.  The caller feeds it one `FrameInput` at a time along
//! with the current UI mode and a `Listing` to hit-test against, and gets
//! back the actions fired on that frame plus a snapshot of the observed
//! state for rendering.

use tracing::{debug, info};

use crate::action::{Action, ItemRef, LockStatus, Navigation};
use crate::config::EngineConfig;
use crate::dynamic::DynamicGestureEngine;
use crate::listing::{HitTarget, Listing};
use crate::tracking::drag::{DragController, DragResolution, FloatingDragObject, SecondaryPose};
use crate::tracking::hold::HoldTrigger;
use crate::tracking::landmarks::{distance, lerp, FrameInput, HandLandmarks, HandObservation, Landmark, StaticPose};
use crate::tracking::number::{DialController, DialEvent, NumberCounter};
use crate::tracking::pose::{self, PinchEdge, PinchState, PoseThresholds};
use crate::tracking::shake::ShakeDetector;
use crate::tracking::zoom::{ZoomChannel, ZoomEvent, ZoomLockState};

// ── Types ──────────────────────────────────────────────────

/// What the UI is showing, supplied by the caller every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiMode {
    /// File browser: cursor, navigation, drag, create-file, shake.
    #[default]
    Browse,
    /// A file is open: save/close/revert/rename holds and zoom.
    FileOpen,
    /// Rename dialog: confirm/cancel holds.
    Renaming,
}

impl UiMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browse => "browse",
            Self::FileOpen => "file-open",
            Self::Renaming => "renaming",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "browse" => Some(Self::Browse),
            "file-open" => Some(Self::FileOpen),
            "renaming" => Some(Self::Renaming),
            _ => None,
        }
    }
}

/// Dynamic gesture label bound to an action.
#[derive(Debug, Clone)]
pub struct DynamicBinding {
    pub label: String,
    pub action: Action,
}

/// Observed state after a frame, for rendering.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub timestamp_ms: f64,
    pub mode: UiMode,
    pub cursor: Option<(f32, f32)>,
    pub hover_id: Option<String>,
    pub pinching: bool,
    pub navigation_progress: f32,
    pub create_progress: f32,
    /// Screen-space midpoint of a two-hand touch.
    pub touch_point: Option<(f32, f32)>,
    pub floating: Option<FloatingDragObject>,
    pub resolution_progress: f32,
    pub save_progress: f32,
    pub close_progress: f32,
    pub revert_progress: f32,
    pub rename_progress: f32,
    pub confirm_progress: f32,
    pub cancel_progress: f32,
    pub zoom_lock: ZoomLockState,
    pub zoom_px: Option<u32>,
    pub number_mode: bool,
    pub number_candidate: Option<u8>,
    pub number_progress: f32,
    pub dial_value: Option<u8>,
    pub dynamic_buffered: usize,
    pub last_dynamic: Option<String>,
}

impl SessionSnapshot {
    /// S-expression rendering of the snapshot.
    pub fn status_sexp(&self) -> String {
        let floating = match &self.floating {
            Some(f) => format!(
                "(:id \"{}\" :x {:.0} :y {:.0} :mode {} :progress {:.0})",
                crate::action::escape_string(&f.item.id),
                f.position.0,
                f.position.1,
                f.mode.as_str(),
                self.resolution_progress,
            ),
            None => "nil".to_string(),
        };
        format!(
            "(:mode {} :cursor {} :hover {} :pinching {} :navigation {:.0} :create {:.0} :touch {} :floating {} \
:file (:save {:.0} :close {:.0} :revert {:.0} :rename {:.0}) :dialog (:confirm {:.0} :cancel {:.0}) \
:zoom (:state {} :px {}) :number-mode {} :number (:candidate {} :progress {:.0}) :dial {} :dynamic (:buffered {} :last {}))",
            self.mode.as_str(),
            point_sexp(self.cursor),
            str_sexp(self.hover_id.as_deref()),
            bool_sexp(self.pinching),
            self.navigation_progress,
            self.create_progress,
            point_sexp(self.touch_point),
            floating,
            self.save_progress,
            self.close_progress,
            self.revert_progress,
            self.rename_progress,
            self.confirm_progress,
            self.cancel_progress,
            self.zoom_lock.as_str(),
            opt_sexp(self.zoom_px),
            bool_sexp(self.number_mode),
            opt_sexp(self.number_candidate),
            self.number_progress,
            opt_sexp(self.dial_value),
            self.dynamic_buffered,
            str_sexp(self.last_dynamic.as_deref()),
        )
    }
}

fn bool_sexp(b: bool) -> &'static str {
    if b {
        "t"
    } else {
        "nil"
    }
}

fn point_sexp(p: Option<(f32, f32)>) -> String {
    p.map(|(x, y)| format!("({:.0} {:.0})", x, y))
        .unwrap_or_else(|| "nil".to_string())
}

fn str_sexp(s: Option<&str>) -> String {
    s.map(|s| format!("\"{}\"", crate::action::escape_string(s)))
        .unwrap_or_else(|| "nil".to_string())
}

fn opt_sexp<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "nil".to_string())
}

/// Result of one frame.
#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub actions: Vec<Action>,
    pub snapshot: SessionSnapshot,
}

// ── Session ────────────────────────────────────────────────

#[derive(Debug)]
pub struct GestureSession {
    config: EngineConfig,
    mode: UiMode,

    // Browse
    cursor: Option<(f32, f32)>,
    pinch: PinchState,
    hover: Option<HitTarget>,
    navigation: HoldTrigger,
    create_file: HoldTrigger,
    touch_point: Option<(f32, f32)>,
    drag: DragController,

    // File open / renaming
    save: HoldTrigger,
    close: HoldTrigger,
    revert: HoldTrigger,
    rename_open: HoldTrigger,
    confirm_rename: HoldTrigger,
    cancel_rename: HoldTrigger,
    zoom: ZoomChannel,

    // Number mode
    shake: ShakeDetector,
    number_mode: bool,
    counter: NumberCounter,
    dial: DialController,

    // Dynamic gestures
    dynamic: Option<DynamicGestureEngine>,
    last_dynamic: Option<String>,
    bindings: Vec<DynamicBinding>,
}

impl GestureSession {
    pub fn new(config: EngineConfig) -> Self {
        let nav = &config.navigation;
        let acts = &config.actions;
        Self {
            mode: UiMode::Browse,
            cursor: None,
            pinch: PinchState::new(),
            hover: None,
            navigation: HoldTrigger::new("navigate", nav.folder_hold_ms, nav.cooldown_ms),
            create_file: HoldTrigger::new("create-file", acts.create_hold_ms, acts.create_cooldown_ms),
            touch_point: None,
            drag: DragController::new(),
            save: HoldTrigger::new("save", acts.file_hold_ms, acts.cooldown_ms),
            close: HoldTrigger::new("close", acts.file_hold_ms, acts.cooldown_ms),
            revert: HoldTrigger::new("revert", acts.file_hold_ms, acts.cooldown_ms),
            rename_open: HoldTrigger::new("rename-open", acts.rename_open_hold_ms, acts.cooldown_ms),
            confirm_rename: HoldTrigger::new("confirm-rename", acts.dialog_hold_ms, acts.cooldown_ms),
            cancel_rename: HoldTrigger::new("cancel-rename", acts.dialog_hold_ms, acts.cooldown_ms),
            zoom: ZoomChannel::new(),
            shake: ShakeDetector::new(),
            number_mode: false,
            counter: NumberCounter::new(&config.number),
            dial: DialController::new(),
            dynamic: None,
            last_dynamic: None,
            bindings: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn mode(&self) -> UiMode {
        self.mode
    }

    pub fn is_number_mode(&self) -> bool {
        self.number_mode
    }

    /// Attach (or detach) the dynamic gesture engine.
    pub fn set_dynamic_engine(&mut self, engine: Option<DynamicGestureEngine>) {
        self.dynamic = engine;
    }

    // ── Bindings ───────────────────────────────────────────

    /// Bind a dynamic gesture label, replacing any existing binding.
    pub fn add_binding(&mut self, label: &str, action: Action) {
        self.bindings.retain(|b| b.label != label);
        self.bindings.push(DynamicBinding {
            label: label.to_string(),
            action,
        });
    }

    /// Returns true if a binding was removed.
    pub fn remove_binding(&mut self, label: &str) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|b| b.label != label);
        self.bindings.len() < before
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn bindings_sexp(&self) -> String {
        if self.bindings.is_empty() {
            return "nil".to_string();
        }
        let items: Vec<String> = self
            .bindings
            .iter()
            .map(|b| {
                format!(
                    "(:gesture \"{}\" :action \"{}\")",
                    crate::action::escape_string(&b.label),
                    b.action.name()
                )
            })
            .collect();
        format!("({})", items.join(" "))
    }

    // ── Lifecycle ──────────────────────────────────────────

    /// Back to the initial state: all timers, cooldowns, channels and
    /// buffers are cleared.  Configuration, the dynamic classifier and the
    /// bindings are kept.
    pub fn reset(&mut self) {
        let mut dynamic = self.dynamic.take();
        if let Some(engine) = dynamic.as_mut() {
            engine.reset();
        }
        let bindings = std::mem::take(&mut self.bindings);
        *self = Self::new(self.config.clone());
        self.dynamic = dynamic;
        self.bindings = bindings;
        debug!("Gesture session reset");
    }

    // ── Frame update ───────────────────────────────────────

    /// Advance the session by one frame.
    pub fn update(&mut self, frame: &FrameInput, mode: UiMode, listing: &dyn Listing) -> FrameOutput {
        let now = frame.timestamp_ms;
        let mut actions = Vec::new();

        if mode != self.mode {
            self.switch_mode(mode, &mut actions);
        }

        self.update_dynamic(frame, now, &mut actions);

        match mode {
            UiMode::Browse => {
                self.update_shake(frame, now, &mut actions);
                if self.number_mode {
                    self.update_number(frame, now, &mut actions);
                } else {
                    self.update_browse(frame, now, listing, &mut actions);
                }
            }
            UiMode::FileOpen => self.update_file_open(frame, now, &mut actions),
            UiMode::Renaming => self.update_renaming(frame, now, &mut actions),
        }

        for action in &actions {
            debug!("Action: {} {:?}", action.name(), action.payload());
        }

        FrameOutput {
            actions,
            snapshot: self.snapshot(now),
        }
    }

    fn switch_mode(&mut self, mode: UiMode, actions: &mut Vec<Action>) {
        info!("UI mode: {} -> {}", self.mode.as_str(), mode.as_str());
        if self.mode == UiMode::FileOpen && self.zoom.reset().is_some() {
            actions.push(Action::ZoomStatus(LockStatus::Unlocked));
        }
        for trigger in [
            &mut self.navigation,
            &mut self.create_file,
            &mut self.save,
            &mut self.close,
            &mut self.revert,
            &mut self.rename_open,
            &mut self.confirm_rename,
            &mut self.cancel_rename,
        ] {
            trigger.cancel();
        }
        self.drag.cancel();
        self.pinch.reset();
        self.hover = None;
        self.touch_point = None;
        self.dial.reset();
        self.mode = mode;
    }

    fn update_dynamic(&mut self, frame: &FrameInput, now: f64, actions: &mut Vec<Action>) {
        let (Some(engine), Some(primary)) = (self.dynamic.as_mut(), frame.primary()) else {
            return;
        };
        let Some(prediction) = engine.push(primary.landmarks.points(), now) else {
            return;
        };
        match self.bindings.iter().find(|b| b.label == prediction.label) {
            Some(binding) => actions.push(binding.action.clone()),
            None => debug!("No binding for dynamic gesture {}", prediction.label),
        }
        self.last_dynamic = Some(prediction.label);
    }

    // ── Number mode ────────────────────────────────────────

    fn update_shake(&mut self, frame: &FrameInput, now: f64, actions: &mut Vec<Action>) {
        let pose_cfg = &self.config.pose;
        let wrist = frame
            .primary()
            .filter(|h| pose::is_fist(&h.landmarks, pose_cfg))
            .map(|h| {
                let w = h.landmarks.wrist();
                (w.x, w.y)
            });
        if !self.shake.update(wrist, now, &self.config.shake) {
            return;
        }

        self.number_mode = !self.number_mode;
        self.counter.reset();
        self.dial.reset();
        if self.number_mode {
            info!("Entering number mode");
            self.navigation.cancel();
            self.create_file.cancel();
            self.drag.cancel();
            self.hover = None;
            self.touch_point = None;
            actions.push(Action::EnterNumberMode);
        } else {
            info!("Leaving number mode");
            actions.push(Action::ExitNumberMode);
        }
    }

    fn update_number(&mut self, frame: &FrameInput, now: f64, actions: &mut Vec<Action>) {
        let pinching = match frame.primary() {
            Some(primary) => {
                self.pinch
                    .update(pose::pinch_distance(&primary.landmarks), &self.config.pose);
                self.pinch.is_pinching()
            }
            None => {
                self.pinch.reset();
                false
            }
        };

        // The dial owns the primary hand while it pinches.
        let count = if pinching {
            None
        } else {
            pose::count_fingers_total(frame.hands.iter().map(|h| &h.landmarks), &self.config.pose)
        };
        if let Some(n) = self.counter.update(count, now) {
            actions.push(Action::NumberDetected(n));
        }

        let primary = frame.primary().map(|h| &h.landmarks);
        for event in self.dial.update(primary, pinching, now, &self.config.number) {
            actions.push(match event {
                DialEvent::Rotate { value, angle } => Action::DialRotate { value, angle },
                DialEvent::Lock { .. } => Action::DialLock,
            });
        }
    }

    // ── Browse ─────────────────────────────────────────────

    fn update_browse(&mut self, frame: &FrameInput, now: f64, listing: &dyn Listing, actions: &mut Vec<Action>) {
        let Some(primary) = frame.primary() else {
            self.lose_primary(now);
            return;
        };
        let cursor = self.track_cursor(&primary.landmarks);

        // Two-hand touch: create a file.
        let touch = match frame.secondary() {
            Some(secondary) if !self.drag.is_dragging() => {
                let a = primary.landmarks.point(Landmark::IndexTip);
                let b = secondary.landmarks.point(Landmark::IndexTip);
                if distance(a, b) < self.config.actions.touch_threshold {
                    Some(self.to_screen((a.x + b.x) / 2.0, (a.y + b.y) / 2.0))
                } else {
                    None
                }
            }
            _ => None,
        };
        self.touch_point = touch;
        if self.create_file.update(touch.is_some(), now).fired() {
            actions.push(Action::CreateFile {
                parent_id: listing.current_folder().map(str::to_string),
            });
            self.touch_point = None;
        }

        let hit = listing.hit_test(cursor.0, cursor.1);

        match self
            .pinch
            .update(pose::pinch_distance(&primary.landmarks), &self.config.pose)
        {
            Some(PinchEdge::Started) => {
                let target = match &hit {
                    Some(HitTarget::Item(item)) => Some(item.clone()),
                    _ => None,
                };
                self.drag.pinch_started(cursor, target);
            }
            Some(PinchEdge::Released) => {
                self.drag.pinch_released();
            }
            None => {}
        }
        let pinching = self.pinch.is_pinching();
        let secondary_pinch = frame
            .secondary()
            .is_some_and(|h| pose::is_pinching(&h.landmarks, self.config.navigation.secondary_pinch));

        // Hover change restarts navigation.
        if hit.as_ref().map(HitTarget::id) != self.hover.as_ref().map(HitTarget::id) {
            self.navigation.cancel();
            self.hover = hit.clone();
        }

        let navigable = hit.as_ref().is_some_and(HitTarget::is_navigable);
        let interacting = (pinching || secondary_pinch) && navigable && !self.drag.is_dragging();
        let nav = &self.config.navigation;
        self.navigation.duration_ms = if secondary_pinch {
            nav.dual_click_hold_ms
        } else if matches!(hit, Some(HitTarget::Back)) {
            nav.back_hold_ms
        } else {
            nav.folder_hold_ms
        };
        if self.navigation.update(interacting, now).fired() {
            let target = match &hit {
                Some(HitTarget::Back) => Some(Navigation::Up),
                Some(HitTarget::Item(item)) => Some(Navigation::Enter(item.clone())),
                None => None,
            };
            if let Some(target) = target {
                info!("Navigate: {:?}", target);
                actions.push(Action::Navigate(target));
                self.drag.cancel();
            }
        }

        if pinching {
            let held = frame
                .secondary()
                .and_then(|h| secondary_pose(h, &self.config.pose));
            if let Some(resolution) = self.drag.update(cursor, held, now, &self.config.drag) {
                actions.push(match resolution {
                    DragResolution::Open(item) if item.is_folder() => {
                        Action::Navigate(Navigation::Enter(item))
                    }
                    DragResolution::Open(item) => Action::OpenFile(item),
                    DragResolution::Rename(item) => Action::RenameFile(ItemRef::from(&item)),
                    DragResolution::Delete(item) => Action::DeleteFile(ItemRef::from(&item)),
                });
            }
        }
    }

    fn lose_primary(&mut self, now: f64) {
        if self.pinch.is_pinching() {
            self.drag.pinch_released();
        }
        self.pinch.reset();
        self.cursor = None;
        self.hover = None;
        self.touch_point = None;
        self.navigation.update(false, now);
        self.create_file.update(false, now);
    }

    /// Smoothed screen position of the primary index fingertip.
    fn track_cursor(&mut self, hand: &HandLandmarks) -> (f32, f32) {
        let tip = hand.point(Landmark::IndexTip);
        let target = self.to_screen(tip.x, tip.y);
        let k = self.config.cursor.smoothing;
        let next = match self.cursor {
            Some((x, y)) => (lerp(x, target.0, k), lerp(y, target.1, k)),
            None => target,
        };
        self.cursor = Some(next);
        next
    }

    fn to_screen(&self, x: f32, y: f32) -> (f32, f32) {
        let c = &self.config.cursor;
        let x = if c.mirror { 1.0 - x } else { x };
        (x * c.screen_width, y * c.screen_height)
    }

    // ── File open / renaming ───────────────────────────────

    fn update_file_open(&mut self, frame: &FrameInput, now: f64, actions: &mut Vec<Action>) {
        let t = &self.config.pose;
        let thumb_up = frame.any_pose(StaticPose::ThumbUp);
        let thumb_down = frame.any_pose(StaticPose::ThumbDown);
        let closed = frame.hands.iter().any(|h| is_closed_hand(h, t));
        let pointing = frame
            .hands
            .iter()
            .any(|h| pose::is_horizontal_point(&h.landmarks, t));

        if self.save.update(thumb_up, now).fired() {
            actions.push(Action::SaveFile);
        }
        if self.close.update(closed, now).fired() {
            actions.push(Action::CloseFile);
        }
        if self.revert.update(thumb_down, now).fired() {
            actions.push(Action::RevertFile);
        }
        if self.rename_open.update(pointing, now).fired() {
            actions.push(Action::RenameOpenFile);
        }

        let spread = match (frame.primary(), frame.secondary()) {
            (Some(a), Some(b)) => Some(distance(
                a.landmarks.point(Landmark::IndexTip),
                b.landmarks.point(Landmark::IndexTip),
            )),
            _ => None,
        };
        for event in self.zoom.update(spread, now, &self.config.zoom) {
            actions.push(match event {
                ZoomEvent::Size(px) => Action::ZoomFile(px),
                ZoomEvent::Locked => Action::ZoomStatus(LockStatus::Locked),
                ZoomEvent::Unlocked => Action::ZoomStatus(LockStatus::Unlocked),
            });
        }
    }

    fn update_renaming(&mut self, frame: &FrameInput, now: f64, actions: &mut Vec<Action>) {
        let t = &self.config.pose;
        let confirm = frame.any_pose(StaticPose::ThumbUp);
        let cancel = frame.hands.iter().any(|h| is_closed_hand(h, t));
        if self.confirm_rename.update(confirm, now).fired() {
            actions.push(Action::ConfirmRename);
        }
        if self.cancel_rename.update(cancel, now).fired() {
            actions.push(Action::CancelRename);
        }
    }

    // ── Snapshot ───────────────────────────────────────────

    fn snapshot(&self, now: f64) -> SessionSnapshot {
        SessionSnapshot {
            timestamp_ms: now,
            mode: self.mode,
            cursor: self.cursor,
            hover_id: self.hover.as_ref().map(|h| h.id().to_string()),
            pinching: self.pinch.is_pinching(),
            navigation_progress: self.navigation.progress(),
            create_progress: self.create_file.progress(),
            touch_point: self.touch_point,
            floating: self.drag.floating().cloned(),
            resolution_progress: self.drag.resolution_progress(now, &self.config.drag),
            save_progress: self.save.progress(),
            close_progress: self.close.progress(),
            revert_progress: self.revert.progress(),
            rename_progress: self.rename_open.progress(),
            confirm_progress: self.confirm_rename.progress(),
            cancel_progress: self.cancel_rename.progress(),
            zoom_lock: self.zoom.lock_state(),
            zoom_px: self.zoom.size_px(),
            number_mode: self.number_mode,
            number_candidate: self.counter.candidate(),
            number_progress: self.counter.progress(),
            dial_value: self.dial.value(),
            dynamic_buffered: self.dynamic.as_ref().map_or(0, |e| e.buffered()),
            last_dynamic: self.last_dynamic.clone(),
        }
    }
}

/// Secondary-hand pose relevant to a floating drag object.
fn secondary_pose(hand: &HandObservation, t: &PoseThresholds) -> Option<SecondaryPose> {
    if hand.pose == StaticPose::OpenPalm {
        Some(SecondaryPose::OpenPalm)
    } else if pose::is_horizontal_scissors(&hand.landmarks, t) {
        Some(SecondaryPose::Scissors {
            spread: pose::finger_spread(&hand.landmarks),
        })
    } else if pose::is_horizontal_point(&hand.landmarks, t) {
        Some(SecondaryPose::HorizontalPoint)
    } else {
        None
    }
}

/// Closed hand for close/cancel: the recognizer's fist label, or the
/// landmark fist test with neither the thumb out nor the index pointing.
fn is_closed_hand(hand: &HandObservation, t: &PoseThresholds) -> bool {
    if hand.pose == StaticPose::ClosedFist {
        return true;
    }
    hand.pose == StaticPose::None
        && pose::is_fist(&hand.landmarks, t)
        && !pose::is_thumb_extended(&hand.landmarks, t)
        && !pose::is_horizontal_point(&hand.landmarks, t)
}

// ── Tests ──────────────────────────────────────────────────
