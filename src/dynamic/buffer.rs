//! Sliding window of feature vectors for one hand.

use std::collections::VecDeque;

use tracing::debug;

use super::normalize::FrameNormalization;
use crate::tracking::landmarks::Point3;

/// Fixed-capacity FIFO of the last `time_steps` feature vectors.
#[derive(Debug, Clone)]
pub struct SequenceBuffer {
    time_steps: usize,
    normalization: FrameNormalization,
    frames: VecDeque<Vec<f32>>,
}

impl SequenceBuffer {
    pub fn new(time_steps: usize, normalization: FrameNormalization) -> Self {
        let time_steps = time_steps.max(1);
        Self {
            time_steps,
            normalization,
            frames: VecDeque::with_capacity(time_steps + 1),
        }
    }

    pub fn time_steps(&self) -> usize {
        self.time_steps
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Exactly `time_steps` frames are present.
    pub fn is_ready(&self) -> bool {
        self.frames.len() == self.time_steps
    }

    /// Append one skeleton.  Returns false if it was too short to use.
    pub fn add_frame(&mut self, points: &[Point3]) -> bool {
        let Some(frame) = self.normalization.apply(points) else {
            debug!("Sequence buffer: skipped frame with {} landmarks", points.len());
            return false;
        };
        self.frames.push_back(frame);
        while self.frames.len() > self.time_steps {
            self.frames.pop_front();
        }
        true
    }

    /// Oldest-first view of the window.
    pub fn sequence(&mut self) -> &[Vec<f32>] {
        self.frames.make_contiguous()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
