//! Pinch-drag controller with secondary-hand resolution.
//!
//! A pinch on an item arms a potential drag; moving the cursor past the
//! drag threshold lifts the item into a floating object.  While floating,
//! the secondary hand resolves it: open palm opens, a horizontal point
//! renames, a scissors snip deletes.  Releasing the pinch drops the item
//! without any action.

use tracing::{debug, info};

use crate::listing::ListingItem;

// ── Config ─────────────────────────────────────────────────

/// Drag and resolution thresholds.
#[derive(Debug, Clone)]
pub struct DragConfig {
    /// Cursor travel (screen px) from the pinch point before a drag starts.
    pub threshold_px: f32,
    /// Secondary open palm hold to open/enter (ms).
    pub open_hold_ms: f64,
    /// Secondary horizontal point hold to rename (ms).
    pub rename_hold_ms: f64,
    /// Gap in the qualifying pose tolerated before reverting to dragging (ms).
    pub debounce_ms: f64,
    /// Index/middle spread that arms the scissors cut.
    pub scissors_open: f32,
    /// Index/middle spread that completes the cut.
    pub scissors_close: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            threshold_px: 40.0,
            open_hold_ms: 300.0,
            rename_hold_ms: 500.0,
            debounce_ms: 150.0,
            scissors_open: 0.04,
            scissors_close: 0.02,
        }
    }
}

// ── Types ──────────────────────────────────────────────────

/// Secondary-hand pose relevant to drag resolution, one per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SecondaryPose {
    OpenPalm,
    HorizontalPoint,
    Scissors { spread: f32 },
}

/// What a floating object is currently doing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolutionMode {
    Dragging,
    ResolvingOpen { since_ms: f64 },
    ResolvingRename { since_ms: f64 },
    ResolvingDelete { opened: bool },
}

impl ResolutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dragging => "dragging",
            Self::ResolvingOpen { .. } => "resolving-open",
            Self::ResolvingRename { .. } => "resolving-rename",
            Self::ResolvingDelete { .. } => "resolving-delete",
        }
    }

    fn matches(&self, pose: &SecondaryPose) -> bool {
        matches!(
            (self, pose),
            (Self::ResolvingOpen { .. }, SecondaryPose::OpenPalm)
                | (Self::ResolvingRename { .. }, SecondaryPose::HorizontalPoint)
                | (Self::ResolvingDelete { .. }, SecondaryPose::Scissors { .. })
        )
    }

    fn start(pose: &SecondaryPose, now_ms: f64, cfg: &DragConfig) -> Self {
        match *pose {
            SecondaryPose::OpenPalm => Self::ResolvingOpen { since_ms: now_ms },
            SecondaryPose::HorizontalPoint => Self::ResolvingRename { since_ms: now_ms },
            SecondaryPose::Scissors { spread } => Self::ResolvingDelete {
                opened: spread >= cfg.scissors_open,
            },
        }
    }
}

/// An item lifted out of the listing by the primary hand.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingDragObject {
    pub item: ListingItem,
    /// Screen-space position (follows the cursor).
    pub position: (f32, f32),
    pub mode: ResolutionMode,
}

/// How a drag ended, when it ended with an action.
#[derive(Debug, Clone, PartialEq)]
pub enum DragResolution {
    /// Open palm: open a file or enter a folder.
    Open(ListingItem),
    Rename(ListingItem),
    Delete(ListingItem),
}

// ── Controller ─────────────────────────────────────────────

/// Pinch-start capture, drag gate, and resolution sub-state-machine.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    pinch_start: Option<(f32, f32)>,
    potential_target: Option<ListingItem>,
    floating: Option<FloatingDragObject>,
    last_pose_ms: f64,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn floating(&self) -> Option<&FloatingDragObject> {
        self.floating.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.floating.is_some()
    }

    pub fn potential_target(&self) -> Option<&ListingItem> {
        self.potential_target.as_ref()
    }

    /// Pinch began at `cursor` over `target` (None for empty space or the
    /// back zone).
    pub fn pinch_started(&mut self, cursor: (f32, f32), target: Option<ListingItem>) {
        self.pinch_start = Some(cursor);
        self.potential_target = target;
    }

    /// Pinch released.  Any floating object is dropped without action.
    /// Returns true when a drag was cancelled.
    pub fn pinch_released(&mut self) -> bool {
        self.pinch_start = None;
        self.potential_target = None;
        match self.floating.take() {
            Some(obj) => {
                debug!("Drag cancelled by release: {}", obj.item.id);
                true
            }
            None => false,
        }
    }

    /// Drop everything, e.g. when navigation replaced the listing.
    pub fn cancel(&mut self) {
        if let Some(obj) = self.floating.take() {
            debug!("Drag cancelled: {}", obj.item.id);
        }
        self.pinch_start = None;
        self.potential_target = None;
    }

    /// Per-frame update while the primary hand is pinching.
    pub fn update(
        &mut self,
        cursor: (f32, f32),
        secondary: Option<SecondaryPose>,
        now_ms: f64,
        cfg: &DragConfig,
    ) -> Option<DragResolution> {
        if self.floating.is_none() {
            self.try_lift(cursor, cfg);
            return None;
        }

        let obj = self.floating.as_mut()?;
        obj.position = cursor;

        match secondary {
            Some(pose) => {
                self.last_pose_ms = now_ms;
                if !obj.mode.matches(&pose) {
                    obj.mode = ResolutionMode::start(&pose, now_ms, cfg);
                    debug!("Drag resolution: {} for {}", obj.mode.as_str(), obj.item.id);
                }
                let done = match (&mut obj.mode, pose) {
                    (ResolutionMode::ResolvingOpen { since_ms }, _) => {
                        now_ms - *since_ms > cfg.open_hold_ms
                    }
                    (ResolutionMode::ResolvingRename { since_ms }, _) => {
                        now_ms - *since_ms > cfg.rename_hold_ms
                    }
                    (ResolutionMode::ResolvingDelete { opened, .. }, SecondaryPose::Scissors { spread }) => {
                        if spread >= cfg.scissors_open {
                            *opened = true;
                        }
                        *opened && spread < cfg.scissors_close
                    }
                    _ => false,
                };
                if done {
                    return self.resolve();
                }
            }
            None => {
                if obj.mode != ResolutionMode::Dragging
                    && now_ms - self.last_pose_ms > cfg.debounce_ms
                {
                    debug!("Drag resolution lapsed: {}", obj.item.id);
                    obj.mode = ResolutionMode::Dragging;
                }
            }
        }
        None
    }

    /// Resolution progress in percent, for the observed-state snapshot.
    pub fn resolution_progress(&self, now_ms: f64, cfg: &DragConfig) -> f32 {
        let Some(obj) = &self.floating else {
            return 0.0;
        };
        let pct = |since: f64, dur: f64| (((now_ms - since) / dur) * 100.0).clamp(0.0, 100.0) as f32;
        match obj.mode {
            ResolutionMode::Dragging => 0.0,
            ResolutionMode::ResolvingOpen { since_ms } => pct(since_ms, cfg.open_hold_ms),
            ResolutionMode::ResolvingRename { since_ms } => pct(since_ms, cfg.rename_hold_ms),
            ResolutionMode::ResolvingDelete { opened, .. } => {
                if opened {
                    50.0
                } else {
                    0.0
                }
            }
        }
    }

    fn try_lift(&mut self, cursor: (f32, f32), cfg: &DragConfig) {
        let (Some(start), Some(target)) = (self.pinch_start, self.potential_target.as_ref()) else {
            return;
        };
        let dx = cursor.0 - start.0;
        let dy = cursor.1 - start.1;
        if (dx * dx + dy * dy).sqrt() > cfg.threshold_px {
            info!("Drag started: {} ({})", target.id, target.name);
            self.floating = Some(FloatingDragObject {
                item: target.clone(),
                position: cursor,
                mode: ResolutionMode::Dragging,
            });
        }
    }

    /// End the drag with its resolution.  The pinch must be released
    /// before another drag can start.
    fn resolve(&mut self) -> Option<DragResolution> {
        let obj = self.floating.take()?;
        self.potential_target = None;
        let resolution = match obj.mode {
            ResolutionMode::ResolvingOpen { .. } => DragResolution::Open(obj.item),
            ResolutionMode::ResolvingRename { .. } => DragResolution::Rename(obj.item),
            ResolutionMode::ResolvingDelete { .. } => DragResolution::Delete(obj.item),
            ResolutionMode::Dragging => return None,
        };
        info!("Drag resolved: {:?}", resolution);
        Some(resolution)
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> DragConfig {
        DragConfig::default()
    }

    fn lifted() -> DragController {
        let mut d = DragController::new();
        d.pinch_started((100.0, 100.0), Some(ListingItem::file("f1", "a.txt", "x")));
        assert!(d.update((120.0, 100.0), None, 0.0, &cfg()).is_none());
        assert!(!d.is_dragging(), "20px must not lift");
        d.update((150.0, 100.0), None, 16.0, &cfg());
        assert!(d.is_dragging());
        d
    }

    #[test]
    fn test_drag_needs_target() {
        let mut d = DragController::new();
        d.pinch_started((100.0, 100.0), None);
        d.update((300.0, 300.0), None, 0.0, &cfg());
        assert!(!d.is_dragging());
    }

    #[test]
    fn test_drag_follows_cursor() {
        let mut d = lifted();
        d.update((200.0, 220.0), None, 32.0, &cfg());
        assert_eq!(d.floating().map(|f| f.position), Some((200.0, 220.0)));
    }

    #[test]
    fn test_release_cancels() {
        let mut d = lifted();
        assert!(d.pinch_released());
        assert!(!d.is_dragging());
        assert!(!d.pinch_released());
    }

    #[test]
    fn test_open_after_hold() {
        let mut d = lifted();
        assert!(d.update((150.0, 100.0), Some(SecondaryPose::OpenPalm), 100.0, &cfg()).is_none());
        assert_eq!(d.floating().unwrap().mode.as_str(), "resolving-open");
        assert!(d.update((150.0, 100.0), Some(SecondaryPose::OpenPalm), 300.0, &cfg()).is_none());
        // Exactly 300ms held is not yet enough.
        assert!(d.update((150.0, 100.0), Some(SecondaryPose::OpenPalm), 400.0, &cfg()).is_none());
        let res = d.update((150.0, 100.0), Some(SecondaryPose::OpenPalm), 401.0, &cfg());
        assert!(matches!(res, Some(DragResolution::Open(ref item)) if item.id == "f1"));
        assert!(!d.is_dragging());

        // Still pinching after resolution: no new drag.
        d.update((400.0, 400.0), None, 420.0, &cfg());
        assert!(!d.is_dragging());
    }

    #[test]
    fn test_rename_after_hold() {
        let mut d = lifted();
        let pose = Some(SecondaryPose::HorizontalPoint);
        assert!(d.update((150.0, 100.0), pose, 100.0, &cfg()).is_none());
        assert!(d.update((150.0, 100.0), pose, 550.0, &cfg()).is_none());
        assert!(d.update((150.0, 100.0), pose, 600.0, &cfg()).is_none());
        let res = d.update((150.0, 100.0), pose, 601.0, &cfg());
        assert!(matches!(res, Some(DragResolution::Rename(_))));
    }

    #[test]
    fn test_switching_pose_restarts_timer() {
        let mut d = lifted();
        d.update((150.0, 100.0), Some(SecondaryPose::OpenPalm), 100.0, &cfg());
        d.update((150.0, 100.0), Some(SecondaryPose::HorizontalPoint), 350.0, &cfg());
        // Open would have fired at 400; rename needs until 850.
        assert!(d
            .update((150.0, 100.0), Some(SecondaryPose::HorizontalPoint), 500.0, &cfg())
            .is_none());
        assert_eq!(d.floating().unwrap().mode.as_str(), "resolving-rename");
    }

    #[test]
    fn test_short_gap_is_debounced() {
        let mut d = lifted();
        d.update((150.0, 100.0), Some(SecondaryPose::OpenPalm), 100.0, &cfg());
        d.update((150.0, 100.0), None, 200.0, &cfg());
        assert_eq!(d.floating().unwrap().mode.as_str(), "resolving-open");
        let res = d.update((150.0, 100.0), Some(SecondaryPose::OpenPalm), 410.0, &cfg());
        assert!(matches!(res, Some(DragResolution::Open(_))));
    }

    #[test]
    fn test_long_gap_reverts_to_dragging() {
        let mut d = lifted();
        d.update((150.0, 100.0), Some(SecondaryPose::OpenPalm), 100.0, &cfg());
        d.update((150.0, 100.0), None, 260.0, &cfg());
        assert_eq!(d.floating().unwrap().mode, ResolutionMode::Dragging);
        // Palm returns: timer restarts.
        assert!(d
            .update((150.0, 100.0), Some(SecondaryPose::OpenPalm), 300.0, &cfg())
            .is_none());
        assert!(d
            .update((150.0, 100.0), Some(SecondaryPose::OpenPalm), 500.0, &cfg())
            .is_none());
    }

    #[test]
    fn test_scissors_open_then_close_deletes_once() {
        let mut d = lifted();
        let open = Some(SecondaryPose::Scissors { spread: 0.05 });
        let closed = Some(SecondaryPose::Scissors { spread: 0.015 });
        assert!(d.update((150.0, 100.0), open, 100.0, &cfg()).is_none());
        assert_eq!(d.floating().unwrap().mode.as_str(), "resolving-delete");
        let res = d.update((150.0, 100.0), closed, 133.0, &cfg());
        assert!(matches!(res, Some(DragResolution::Delete(ref item)) if item.id == "f1"));
        assert!(!d.is_dragging());
        assert!(d.update((150.0, 100.0), closed, 166.0, &cfg()).is_none());
    }

    #[test]
    fn test_scissors_closed_without_opening_does_not_delete() {
        let mut d = lifted();
        let half = Some(SecondaryPose::Scissors { spread: 0.03 });
        let closed = Some(SecondaryPose::Scissors { spread: 0.01 });
        d.update((150.0, 100.0), half, 100.0, &cfg());
        assert!(d.update((150.0, 100.0), closed, 133.0, &cfg()).is_none());
        assert!(d.is_dragging());
    }

    #[test]
    fn test_scissors_abandoned_cancels_cut() {
        let mut d = lifted();
        d.update((150.0, 100.0), Some(SecondaryPose::Scissors { spread: 0.05 }), 100.0, &cfg());
        d.update((150.0, 100.0), None, 300.0, &cfg());
        assert_eq!(d.floating().unwrap().mode, ResolutionMode::Dragging);
        // Re-entering closed: a fresh cut that never opened.
        assert!(d
            .update((150.0, 100.0), Some(SecondaryPose::Scissors { spread: 0.01 }), 316.0, &cfg())
            .is_none());
    }

    #[test]
    fn test_resolution_progress() {
        let mut d = lifted();
        assert_eq!(d.resolution_progress(20.0, &cfg()), 0.0);
        d.update((150.0, 100.0), Some(SecondaryPose::OpenPalm), 100.0, &cfg());
        assert!((d.resolution_progress(250.0, &cfg()) - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_cancel_clears_everything() {
        let mut d = lifted();
        d.cancel();
        assert!(!d.is_dragging());
        assert!(d.potential_target().is_none());
    }
}
