//! Debounced predict-and-fire wrapper around the sequence buffer.
//!
//! Every accepted frame is appended; once the window is full and the
//! cooldown has passed, the classifier runs over it.  A confident result
//! clears the window and restarts the cooldown.  `push` takes `&mut self`,
//! so no frame can be appended while a prediction over the same window is
//! in progress.

use anyhow::{ensure, Result};
use tracing::{debug, info};

use super::buffer::SequenceBuffer;
use super::classifier::SequenceClassifier;
use super::normalize::{FrameNormalization, FEATURE_LEN};
use crate::tracking::landmarks::Point3;

#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Window length in frames.
    pub time_steps: usize,
    pub min_confidence: f32,
    pub cooldown_ms: f64,
    pub normalization: FrameNormalization,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            time_steps: 30,
            min_confidence: 0.8,
            cooldown_ms: 600.0,
            normalization: FrameNormalization::WristRelative,
        }
    }
}

/// An accepted dynamic gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicGesturePrediction {
    pub gesture_id: usize,
    pub label: String,
    pub confidence: f32,
    pub probabilities: Vec<f32>,
}

pub struct DynamicGestureEngine {
    buffer: SequenceBuffer,
    classifier: Box<dyn SequenceClassifier + Send>,
    options: EngineOptions,
    last_trigger_ms: Option<f64>,
}

impl std::fmt::Debug for DynamicGestureEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicGestureEngine")
            .field("buffer", &self.buffer)
            .field("labels", &self.classifier.labels())
            .field("options", &self.options)
            .field("last_trigger_ms", &self.last_trigger_ms)
            .finish()
    }
}

impl DynamicGestureEngine {
    /// Fails if the classifier was built for feature vectors the buffer
    /// does not produce.
    pub fn new(classifier: Box<dyn SequenceClassifier + Send>, options: EngineOptions) -> Result<Self> {
        if let Some(width) = classifier.feature_len() {
            ensure!(
                width == FEATURE_LEN,
                "classifier expects {} features per frame, buffer produces {}",
                width,
                FEATURE_LEN
            );
        }
        Ok(Self {
            buffer: SequenceBuffer::new(options.time_steps, options.normalization),
            classifier,
            options,
            last_trigger_ms: None,
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn labels(&self) -> &[String] {
        self.classifier.labels()
    }

    /// Frames currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Forget the buffer and the cooldown.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.last_trigger_ms = None;
    }

    /// Append one skeleton and classify if eligible.
    pub fn push(&mut self, landmarks: &[Point3], now_ms: f64) -> Option<DynamicGesturePrediction> {
        self.buffer.add_frame(landmarks);
        if !self.buffer.is_ready() {
            return None;
        }
        if let Some(last) = self.last_trigger_ms {
            if now_ms - last < self.options.cooldown_ms {
                return None;
            }
        }

        let probabilities = self.classifier.predict(self.buffer.sequence());
        let (gesture_id, confidence) = probabilities
            .iter()
            .copied()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, p)| match best {
                Some((_, bp)) if bp >= p => best,
                _ => Some((i, p)),
            })?;

        if confidence < self.options.min_confidence {
            debug!("Dynamic gesture below confidence: {:.3}", confidence);
            return None;
        }

        let label = self
            .classifier
            .labels()
            .get(gesture_id)
            .cloned()
            .unwrap_or_else(|| format!("gesture_{gesture_id}"));
        info!("Dynamic gesture: {} ({:.3})", label, confidence);

        self.last_trigger_ms = Some(now_ms);
        self.buffer.clear();
        Some(DynamicGesturePrediction {
            gesture_id,
            label,
            confidence,
            probabilities,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::classifier::{Dataset, DtwClassifier, DtwOptions, Sample};
    use crate::tracking::landmarks::LANDMARK_COUNT;

    /// Scores fixed regardless of input.
    struct Fixed {
        labels: Vec<String>,
        scores: Vec<f32>,
    }

    impl SequenceClassifier for Fixed {
        fn labels(&self) -> &[String] {
            &self.labels
        }

        fn predict(&self, sequence: &[Vec<f32>]) -> Vec<f32> {
            if sequence.is_empty() {
                return vec![0.0; self.labels.len()];
            }
            self.scores.clone()
        }
    }

    fn fixed(scores: &[f32]) -> Box<dyn SequenceClassifier + Send> {
        Box::new(Fixed {
            labels: (0..scores.len()).map(|i| format!("g{i}")).collect(),
            scores: scores.to_vec(),
        })
    }

    fn opts(t: usize) -> EngineOptions {
        EngineOptions { time_steps: t, ..EngineOptions::default() }
    }

    fn hand(x: f32) -> Vec<Point3> {
        let mut pts = vec![Point3::xy(0.5, 0.5); LANDMARK_COUNT];
        pts[8] = Point3::xy(0.5 + x, 0.5);
        pts
    }

    #[test]
    fn test_waits_for_full_window() {
        let mut e = DynamicGestureEngine::new(fixed(&[0.1, 0.95]), opts(3)).unwrap();
        assert!(e.push(&hand(0.0), 0.0).is_none());
        assert!(e.push(&hand(0.0), 16.0).is_none());
        let p = e.push(&hand(0.0), 32.0).unwrap();
        assert_eq!(p.gesture_id, 1);
        assert_eq!(p.label, "g1");
        assert_eq!(p.probabilities, vec![0.1, 0.95]);
        assert_eq!(e.buffered(), 0, "success clears the window");
    }

    #[test]
    fn test_cooldown_between_triggers() {
        let mut e = DynamicGestureEngine::new(fixed(&[0.9]), opts(1)).unwrap();
        assert!(e.push(&hand(0.0), 0.0).is_some());
        assert!(e.push(&hand(0.0), 300.0).is_none());
        assert!(e.push(&hand(0.0), 599.0).is_none());
        assert!(e.push(&hand(0.0), 600.0).is_some());
    }

    #[test]
    fn test_low_confidence_keeps_window() {
        let mut e = DynamicGestureEngine::new(fixed(&[0.5, 0.7]), opts(2)).unwrap();
        e.push(&hand(0.0), 0.0);
        assert!(e.push(&hand(0.0), 16.0).is_none());
        assert_eq!(e.buffered(), 2);
    }

    #[test]
    fn test_no_labels_no_prediction() {
        let mut e = DynamicGestureEngine::new(fixed(&[]), opts(1)).unwrap();
        assert!(e.push(&hand(0.0), 0.0).is_none());
    }

    #[test]
    fn test_short_skeleton_not_buffered() {
        let mut e = DynamicGestureEngine::new(fixed(&[0.9]), opts(1)).unwrap();
        assert!(e.push(&hand(0.0)[..4], 0.0).is_none());
        assert_eq!(e.buffered(), 0);
    }

    #[test]
    fn test_with_dtw_templates() {
        // Template recorded in the buffer's own feature format.
        let mut buf = SequenceBuffer::new(4, FrameNormalization::WristRelative);
        for x in [0.0, 0.1, 0.2, 0.3] {
            buf.add_frame(&hand(x));
        }
        let swipe = buf.sequence().to_vec();
        let still = vec![swipe[0].clone(); 4];
        let ds = Dataset {
            samples: vec![
                Sample { label: "swipe".into(), sequence: swipe },
                Sample { label: "still".into(), sequence: still },
            ],
        };
        let dtw = DtwClassifier::from_dataset(ds, DtwOptions::default()).unwrap();
        let mut e = DynamicGestureEngine::new(Box::new(dtw), opts(4)).unwrap();

        let mut got = None;
        for (i, x) in [0.0, 0.1, 0.2, 0.3].into_iter().enumerate() {
            got = e.push(&hand(x), i as f64 * 33.0);
        }
        let p = got.unwrap();
        assert_eq!(p.label, "swipe");
        assert!(p.confidence >= 0.99);
    }

    #[test]
    fn test_rejects_mismatched_feature_width() {
        let ds = Dataset {
            samples: vec![Sample { label: "flat".into(), sequence: vec![vec![0.0, 0.0]; 3] }],
        };
        let dtw = DtwClassifier::from_dataset(ds, DtwOptions::default()).unwrap();
        assert_eq!(dtw.feature_len(), Some(2));
        let err = DynamicGestureEngine::new(Box::new(dtw), opts(3)).unwrap_err();
        assert!(err.to_string().contains("expects 2 features"), "{err}");

        // An empty model has no fixed width.
        let none = DtwClassifier::empty(DtwOptions::default());
        assert!(DynamicGestureEngine::new(Box::new(none), opts(3)).is_ok());
    }
}
