//! Frame gesture engine: per-frame hand features and the state machines
//! built on them.
//!
//! Provides:
//! - `landmarks`: skeleton types, frame input, geometry helpers
//! - `pose`: static pose classifiers (pinch, fist, pointing, scissors, counting)
//! - `hold`: hold-to-confirm trigger with cooldown
//! - `drag`: pinch drag with secondary-hand resolution
//! - `zoom`: two-hand zoom channel with glitch rejection and stability lock
//! - `shake`: fist shake detector (number mode toggle)
//! - `number`: finger-count entry and pinch dial

pub mod drag;
pub mod hold;
pub mod landmarks;
pub mod number;
pub mod pose;
pub mod shake;
pub mod zoom;

pub use hold::{HoldOutcome, HoldPhase, HoldTrigger};
pub use landmarks::{FrameInput, HandLandmarks, HandObservation, Landmark, Point3, StaticPose};
pub use pose::{PinchState, PoseThresholds};
