//! Static pose classifiers over a single hand skeleton.
//!
//! Pure functions refining the recognizer's coarse label: hysteretic pinch,
//! an orientation-independent fist, horizontal pointing and scissors poses,
//! and a finger-counting decision tree that supports both counting
//! conventions.

use super::landmarks::{Finger, HandLandmarks, Landmark};

// ── Config ─────────────────────────────────────────────────

/// Thresholds for the static pose classifiers, in normalized image units.
#[derive(Debug, Clone)]
pub struct PoseThresholds {
    /// Thumb/index tip distance below which a pinch starts.
    pub pinch_grab: f32,
    /// Thumb/index tip distance above which a pinch ends.
    pub pinch_release: f32,
    /// Tip-to-MCP distance below which a finger counts as curled.
    pub curl: f32,
    /// Tip-to-wrist distance below which a finger counts as curled
    /// (catches palm-away fists where tips hide behind the knuckles).
    pub fist_wrist: f32,
    /// Minimum fingers curled for a fist.
    pub fist_min_curled: usize,
    /// Minimum per-axis tip-to-MCP displacement for a pointing index.
    pub point_extension: f32,
    /// Horizontal/vertical displacement ratio for horizontal pointing.
    pub horizontal_ratio: f32,
    /// Thumb tip to index MCP distance above which the thumb is extended.
    pub thumb_extended: f32,
    /// Thumb tip to pinky tip span above which the hand is an open palm.
    pub open_palm_span: f32,
}

impl Default for PoseThresholds {
    fn default() -> Self {
        Self {
            pinch_grab: 0.05,
            pinch_release: 0.10,
            curl: 0.08,
            fist_wrist: 0.12,
            fist_min_curled: 3,
            point_extension: 0.04,
            horizontal_ratio: 1.2,
            thumb_extended: 0.07,
            open_palm_span: 0.28,
        }
    }
}

// ── Pinch ──────────────────────────────────────────────────

/// Hysteretic pinch detector.  Enters below the grab threshold and exits
/// only above the release threshold.
#[derive(Debug, Clone, Default)]
pub struct PinchState {
    pinching: bool,
}

/// Pinch edge reported by `PinchState::update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinchEdge {
    Started,
    Released,
}

impl PinchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pinching(&self) -> bool {
        self.pinching
    }

    /// Feed one thumb/index tip distance.  Returns the edge, if any.
    pub fn update(&mut self, distance: f32, t: &PoseThresholds) -> Option<PinchEdge> {
        if self.pinching {
            if distance > t.pinch_release {
                self.pinching = false;
                return Some(PinchEdge::Released);
            }
        } else if distance < t.pinch_grab {
            self.pinching = true;
            return Some(PinchEdge::Started);
        }
        None
    }

    /// Force the released state, without reporting an edge.
    pub fn reset(&mut self) {
        self.pinching = false;
    }
}

/// Thumb/index tip distance.
pub fn pinch_distance(hand: &HandLandmarks) -> f32 {
    hand.landmark_distance(Landmark::IndexTip, Landmark::ThumbTip)
}

/// Stateless pinch test (single threshold), used for the secondary hand.
pub fn is_pinching(hand: &HandLandmarks, threshold: f32) -> bool {
    pinch_distance(hand) < threshold
}

// ── Finger state ───────────────────────────────────────────

/// Tip-to-MCP distance of a finger.
fn tip_to_mcp(hand: &HandLandmarks, finger: Finger) -> f32 {
    hand.landmark_distance(finger.tip(), finger.mcp())
}

/// Tip-to-MCP displacement `(dx, dy)` of a finger.
fn tip_displacement(hand: &HandLandmarks, finger: Finger) -> (f32, f32) {
    let tip = hand.point(finger.tip());
    let mcp = hand.point(finger.mcp());
    (tip.x - mcp.x, tip.y - mcp.y)
}

/// Whether a finger is folded (tip close to its knuckle).
pub fn is_curled(hand: &HandLandmarks, finger: Finger, t: &PoseThresholds) -> bool {
    tip_to_mcp(hand, finger) < t.curl
}

pub fn is_extended(hand: &HandLandmarks, finger: Finger, t: &PoseThresholds) -> bool {
    !is_curled(hand, finger, t)
}

/// Whether the thumb is swung away from the palm.
pub fn is_thumb_extended(hand: &HandLandmarks, t: &PoseThresholds) -> bool {
    hand.landmark_distance(Landmark::ThumbTip, Landmark::IndexMcp) > t.thumb_extended
}

/// Thumb tip to pinky tip distance.
pub fn hand_span(hand: &HandLandmarks) -> f32 {
    hand.landmark_distance(Landmark::ThumbTip, Landmark::PinkyTip)
}

/// Distance between index and middle fingertips.
pub fn finger_spread(hand: &HandLandmarks) -> f32 {
    hand.landmark_distance(Landmark::IndexTip, Landmark::MiddleTip)
}

// ── Pose predicates ────────────────────────────────────────

/// Orientation-independent fist: enough fingers curled, judged either by
/// tip-to-MCP or by the looser tip-to-wrist distance.
pub fn is_fist(hand: &HandLandmarks, t: &PoseThresholds) -> bool {
    let wrist = hand.wrist();
    let curled = Finger::ALL
        .iter()
        .filter(|f| {
            tip_to_mcp(hand, **f) < t.curl
                || super::landmarks::distance(hand.point(f.tip()), wrist) < t.fist_wrist
        })
        .count();
    curled >= t.fist_min_curled
}

/// Index finger pointing sideways with the middle finger folded.
pub fn is_horizontal_point(hand: &HandLandmarks, t: &PoseThresholds) -> bool {
    let (dx, dy) = tip_displacement(hand, Finger::Index);
    let index_extended = dx.abs() > t.point_extension || dy.abs() > t.point_extension;
    index_extended
        && is_curled(hand, Finger::Middle, t)
        && dx.abs() > t.horizontal_ratio * dy.abs()
}

/// Index and middle extended sideways like scissor blades, ring folded.
pub fn is_horizontal_scissors(hand: &HandLandmarks, t: &PoseThresholds) -> bool {
    if !is_extended(hand, Finger::Index, t)
        || !is_extended(hand, Finger::Middle, t)
        || !is_curled(hand, Finger::Ring, t)
    {
        return false;
    }
    let horizontal = |finger| {
        let (dx, dy) = tip_displacement(hand, finger);
        dx.abs() > dy.abs()
    };
    horizontal(Finger::Index) || horizontal(Finger::Middle)
}

// ── Finger counting ────────────────────────────────────────

/// Which counting convention produced a finger count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountingStyle {
    /// Thumb counts as one (thumb, thumb+index, ...).
    Inclusive,
    /// Thumb tucked, fingers only (index, index+middle, ...).
    Exclusive,
    /// Wide open hand.
    OpenHand,
}

/// Count the raised fingers of one hand.
///
/// A wide span with the thumb out is five.  Otherwise the thumb decides the
/// convention: extended counts thumb plus fingers (1-5), tucked counts
/// fingers alone (1-4) and a closed hand is no number at all.
pub fn count_fingers_with_style(
    hand: &HandLandmarks,
    t: &PoseThresholds,
) -> Option<(u8, CountingStyle)> {
    let thumb = is_thumb_extended(hand, t);
    if thumb && hand_span(hand) > t.open_palm_span {
        return Some((5, CountingStyle::OpenHand));
    }

    let raised = Finger::ALL
        .iter()
        .filter(|f| is_extended(hand, **f, t))
        .count() as u8;

    if thumb {
        Some((1 + raised, CountingStyle::Inclusive))
    } else if raised == 0 {
        None
    } else {
        Some((raised, CountingStyle::Exclusive))
    }
}

pub fn count_fingers(hand: &HandLandmarks, t: &PoseThresholds) -> Option<u8> {
    count_fingers_with_style(hand, t).map(|(n, _)| n)
}

/// Sum the counts of up to two hands (0-10).  `None` when no hand shows
/// a number.
pub fn count_fingers_total<'a, I>(hands: I, t: &PoseThresholds) -> Option<u8>
where
    I: IntoIterator<Item = &'a HandLandmarks>,
{
    hands
        .into_iter()
        .filter_map(|h| count_fingers(h, t))
        .fold(None, |acc, n| Some(acc.unwrap_or(0) + n))
}

// ── Tests ──────────────────────────────────────────────────
