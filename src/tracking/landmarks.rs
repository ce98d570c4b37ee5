//! Hand landmark data structures as produced by the vision pipeline.
//!
//! Models the 21 anatomically fixed points per hand, the coarse static pose
//! label the recognizer attaches to each hand, and the per-frame input the
//! session consumes.  Also hosts the small geometry helpers every classifier
//! builds on.

use serde::Deserialize;
use tracing::debug;

// ── Landmark definitions ───────────────────────────────────

/// The 21 hand landmarks, in vision-pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Landmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

impl Landmark {
    /// Convert landmark enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// The four non-thumb fingers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 4] = [Self::Index, Self::Middle, Self::Ring, Self::Pinky];

    pub fn tip(&self) -> Landmark {
        match self {
            Self::Index => Landmark::IndexTip,
            Self::Middle => Landmark::MiddleTip,
            Self::Ring => Landmark::RingTip,
            Self::Pinky => Landmark::PinkyTip,
        }
    }

    pub fn mcp(&self) -> Landmark {
        match self {
            Self::Index => Landmark::IndexMcp,
            Self::Middle => Landmark::MiddleMcp,
            Self::Ring => Landmark::RingMcp,
            Self::Pinky => Landmark::PinkyMcp,
        }
    }
}

// ── Points ─────────────────────────────────────────────────

/// A normalized landmark position.  `z` is zero when the pipeline
/// does not supply depth.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Point3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn xy(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }
}

/// Euclidean distance in the image plane.  All threshold checks use this,
/// the vision pipeline's depth estimate is too noisy to gate on.
pub fn distance(a: &Point3, b: &Point3) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Move `a` a fraction `t` of the way toward `b`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

// ── Hand landmarks ─────────────────────────────────────────

/// One tracked hand's skeleton for a single frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    points: [Point3; LANDMARK_COUNT],
}

impl HandLandmarks {
    /// Build from a slice of exactly 21 points.  Returns `None` on any
    /// other length; a short skeleton is a pipeline glitch, not an error.
    pub fn from_slice(points: &[Point3]) -> Option<Self> {
        if points.len() != LANDMARK_COUNT {
            debug!(
                "Hand landmarks: expected {} points, got {}",
                LANDMARK_COUNT,
                points.len(),
            );
            return None;
        }
        let mut out = [Point3::default(); LANDMARK_COUNT];
        out.copy_from_slice(points);
        Some(Self { points: out })
    }

    pub fn from_array(points: [Point3; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    pub fn point(&self, landmark: Landmark) -> &Point3 {
        &self.points[landmark.index()]
    }

    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Mutable access, used by fixtures and filters.
    pub fn set(&mut self, landmark: Landmark, p: Point3) {
        self.points[landmark.index()] = p;
    }

    /// Image-plane distance between two landmarks of this hand.
    pub fn landmark_distance(&self, a: Landmark, b: Landmark) -> f32 {
        distance(self.point(a), self.point(b))
    }

    pub fn wrist(&self) -> &Point3 {
        self.point(Landmark::Wrist)
    }
}

// ── Static pose labels ─────────────────────────────────────

/// Coarse per-hand label supplied by the vision recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StaticPose {
    #[default]
    None,
    ClosedFist,
    OpenPalm,
    PointingUp,
    ThumbDown,
    ThumbUp,
    Victory,
    ILoveYou,
}

impl StaticPose {
    /// Parse the recognizer's category name.  Unknown names map to `None`.
    pub fn from_category(name: &str) -> Self {
        match name {
            "Closed_Fist" => Self::ClosedFist,
            "Open_Palm" => Self::OpenPalm,
            "Pointing_Up" => Self::PointingUp,
            "Thumb_Down" => Self::ThumbDown,
            "Thumb_Up" => Self::ThumbUp,
            "Victory" => Self::Victory,
            "ILoveYou" => Self::ILoveYou,
            _ => Self::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ClosedFist => "closed-fist",
            Self::OpenPalm => "open-palm",
            Self::PointingUp => "pointing-up",
            Self::ThumbDown => "thumb-down",
            Self::ThumbUp => "thumb-up",
            Self::Victory => "victory",
            Self::ILoveYou => "i-love-you",
        }
    }
}

// ── Frame input ────────────────────────────────────────────

/// One hand as delivered by the vision collaborator.
#[derive(Debug, Clone)]
pub struct HandObservation {
    pub landmarks: HandLandmarks,
    /// Best-guess pose label, already filtered by confidence.
    pub pose: StaticPose,
}

impl HandObservation {
    /// Accept a raw recognizer label, dropping it to `StaticPose::None`
    /// unless the score clears `min_score`.
    pub fn new(landmarks: HandLandmarks, category: &str, score: f32, min_score: f32) -> Self {
        let pose = if score > min_score {
            StaticPose::from_category(category)
        } else {
            StaticPose::None
        };
        Self { landmarks, pose }
    }

    /// Observation with an already-resolved pose.
    pub fn with_pose(landmarks: HandLandmarks, pose: StaticPose) -> Self {
        Self { landmarks, pose }
    }
}

/// Everything the engine sees for one video frame.  `hands[0]` is primary.
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub timestamp_ms: f64,
    pub hands: Vec<HandObservation>,
}

impl FrameInput {
    pub fn new(timestamp_ms: f64, mut hands: Vec<HandObservation>) -> Self {
        if hands.len() > 2 {
            debug!("Frame input: {} hands, keeping first two", hands.len());
            hands.truncate(2);
        }
        Self {
            timestamp_ms,
            hands,
        }
    }

    pub fn primary(&self) -> Option<&HandObservation> {
        self.hands.first()
    }

    pub fn secondary(&self) -> Option<&HandObservation> {
        self.hands.get(1)
    }

    /// Whether any tracked hand carries the given vision label.
    pub fn any_pose(&self, pose: StaticPose) -> bool {
        self.hands.iter().any(|h| h.pose == pose)
    }
}

// ── Wire format ────────────────────────────────────────────

/// One hand of a recorded frame, as serialized by the capture tooling.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedHand {
    pub landmarks: Vec<Point3>,
    #[serde(default)]
    pub gesture: Option<String>,
    #[serde(default)]
    pub score: f32,
}

/// One recorded frame (a line of a JSON-lines capture).
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedFrame {
    pub timestamp_ms: f64,
    #[serde(default)]
    pub hands: Vec<RecordedHand>,
}

impl RecordedFrame {
    /// Convert to engine input, dropping hands with a malformed skeleton.
    pub fn into_input(self, min_label_score: f32) -> FrameInput {
        let hands = self
            .hands
            .into_iter()
            .filter_map(|h| {
                let landmarks = HandLandmarks::from_slice(&h.landmarks)?;
                let category = h.gesture.as_deref().unwrap_or("None");
                Some(HandObservation::new(landmarks, category, h.score, min_label_score))
            })
            .collect();
        FrameInput::new(self.timestamp_ms, hands)
    }
}

// ── Test fixtures ──────────────────────────────────────────


// ── Tests ──────────────────────────────────────────────────
