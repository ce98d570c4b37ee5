//! handsignal - hand gesture engine for touchless file browsing.
//!
//! Provides:
//! - `tracking`: per-frame hand features, hold triggers, drag, zoom, shake, number entry
//! - `dynamic`: sliding-window trajectory recognition with a DTW template classifier
//! - `listing`: hit-testable file listing seam
//! - `action`: actions emitted to the file-store/UI collaborator
//! - `config`: engine configuration (s-expression plist)
//! - `session`: per-session orchestration of all of the above
//! - `replay`: in-memory file store that consumes actions during replay

pub mod action;
pub mod config;
pub mod dynamic;
pub mod listing;
pub mod replay;
pub mod session;
pub mod tracking;

pub use action::Action;
pub use config::EngineConfig;
pub use session::{FrameOutput, GestureSession, SessionSnapshot, UiMode};
