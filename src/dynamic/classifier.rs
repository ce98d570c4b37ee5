//! Template-matching sequence classifier.
//!
//! Templates come from a recorded dataset grouped by label.  Prediction
//! computes the DTW distance from the live window to every template, keeps
//! the nearest per label and converts it to a similarity in `[0, 1]`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use super::dtw::{dtw_distance, similarity_from_distance};

// ── Seam ───────────────────────────────────────────────────

/// Anything that scores a feature sequence against a fixed label set.
pub trait SequenceClassifier {
    /// Labels in prediction order.
    fn labels(&self) -> &[String];

    /// One score per label, in `labels()` order.  Empty input or an empty
    /// model yields all zeros.
    fn predict(&self, sequence: &[Vec<f32>]) -> Vec<f32>;

    /// Feature-vector length the model was built for, if fixed.
    fn feature_len(&self) -> Option<usize> {
        None
    }
}

// ── Dataset ────────────────────────────────────────────────

/// One labeled recording.
#[derive(Debug, Clone, Deserialize)]
pub struct Sample {
    pub label: String,
    pub sequence: Vec<Vec<f32>>,
}

/// Recorder output: `{"samples": [{"label": ..., "sequence": [[...], ...]}]}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dataset {
    pub samples: Vec<Sample>,
}

impl Dataset {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid gesture dataset JSON")
    }
}

/// Read a dataset file.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading dataset {}", path.display()))?;
    Dataset::from_json(&text).with_context(|| format!("parsing dataset {}", path.display()))
}

// ── Templates ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct GestureTemplate {
    pub label: String,
    pub sequence: Vec<Vec<f32>>,
}

/// Options for `DtwClassifier`.
#[derive(Debug, Clone)]
pub struct DtwOptions {
    /// Minimum similarity accepted by `match_sequence`.
    pub threshold: f32,
    pub max_templates_per_label: usize,
    /// Sakoe-Chiba half-width; `None` is unconstrained.
    pub window: Option<usize>,
    /// Distance scale in the similarity conversion.
    pub distance_scale: f32,
    /// Required feature-vector length, when known up front.
    pub expected_features: Option<usize>,
}

impl Default for DtwOptions {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            max_templates_per_label: 10,
            window: None,
            distance_scale: 0.5,
            expected_features: None,
        }
    }
}

/// Best label for a sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub label: String,
    pub similarity: f32,
}

/// Nearest-template DTW classifier with an immutable template store.
#[derive(Debug, Clone)]
pub struct DtwClassifier {
    options: DtwOptions,
    labels: Vec<String>,
    templates: Vec<GestureTemplate>,
    feature_len: Option<usize>,
}

impl DtwClassifier {
    /// A classifier with no templates; every prediction is zero.
    pub fn empty(options: DtwOptions) -> Self {
        Self {
            feature_len: options.expected_features,
            options,
            labels: Vec::new(),
            templates: Vec::new(),
        }
    }

    /// Build the template store.  Fails if feature vectors are not all the
    /// same length, or differ from `options.expected_features`.
    pub fn from_dataset(dataset: Dataset, options: DtwOptions) -> Result<Self> {
        ensure!(
            options.max_templates_per_label > 0,
            "max_templates_per_label must be positive"
        );

        let mut width = options.expected_features;
        for sample in &dataset.samples {
            for (i, frame) in sample.sequence.iter().enumerate() {
                match width {
                    Some(w) if w != frame.len() => bail!(
                        "template '{}' frame {} has {} features, expected {}",
                        sample.label,
                        i,
                        frame.len(),
                        w
                    ),
                    Some(_) => {}
                    None => width = Some(frame.len()),
                }
            }
        }

        let mut by_label: BTreeMap<String, Vec<Vec<Vec<f32>>>> = BTreeMap::new();
        for sample in dataset.samples {
            if sample.sequence.is_empty() {
                debug!("Skipping empty sample for '{}'", sample.label);
                continue;
            }
            by_label.entry(sample.label).or_default().push(sample.sequence);
        }

        let max = options.max_templates_per_label;
        let mut labels = Vec::with_capacity(by_label.len());
        let mut templates = Vec::new();
        for (label, sequences) in by_label {
            let step = (sequences.len() / max).max(1);
            templates.extend(
                sequences
                    .into_iter()
                    .step_by(step)
                    .take(max)
                    .map(|sequence| GestureTemplate {
                        label: label.clone(),
                        sequence,
                    }),
            );
            labels.push(label);
        }

        info!(
            "DTW classifier loaded: {} templates, {} labels [{}]",
            templates.len(),
            labels.len(),
            labels.join(", ")
        );
        Ok(Self {
            options,
            labels,
            templates,
            feature_len: width,
        })
    }

    pub fn options(&self) -> &DtwOptions {
        &self.options
    }

    pub fn templates(&self) -> &[GestureTemplate] {
        &self.templates
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Label for a prediction index.
    pub fn label_name(&self, id: usize) -> String {
        self.labels
            .get(id)
            .cloned()
            .unwrap_or_else(|| format!("gesture_{id}"))
    }

    /// Best label if its similarity reaches the threshold.
    pub fn match_sequence(&self, sequence: &[Vec<f32>]) -> Option<Match> {
        let scores = self.predict(sequence);
        let (idx, best) = scores
            .iter()
            .copied()
            .enumerate()
            .fold((0, 0.0f32), |acc, (i, s)| if s > acc.1 { (i, s) } else { acc });
        if best > 0.0 && best >= self.options.threshold {
            Some(Match {
                label: self.label_name(idx),
                similarity: best,
            })
        } else {
            None
        }
    }
}

impl SequenceClassifier for DtwClassifier {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn feature_len(&self) -> Option<usize> {
        self.feature_len
    }

    fn predict(&self, sequence: &[Vec<f32>]) -> Vec<f32> {
        if self.templates.is_empty() || sequence.is_empty() {
            return vec![0.0; self.labels.len()];
        }

        let mut nearest: BTreeMap<&str, f32> = BTreeMap::new();
        for template in &self.templates {
            let d = dtw_distance(sequence, &template.sequence, self.options.window);
            let slot = nearest.entry(template.label.as_str()).or_insert(f32::INFINITY);
            if d < *slot {
                *slot = d;
            }
        }

        self.labels
            .iter()
            .map(|label| {
                let d = nearest.get(label.as_str()).copied().unwrap_or(f32::INFINITY);
                similarity_from_distance(d, self.options.distance_scale)
            })
            .collect()
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(from: f32, to: f32, n: usize) -> Vec<Vec<f32>> {
        (0..n)
            .map(|i| {
                let v = from + (to - from) * i as f32 / (n - 1) as f32;
                vec![v, 0.0]
            })
            .collect()
    }

    fn dataset() -> Dataset {
        Dataset {
            samples: vec![
                Sample { label: "swipe_right".into(), sequence: ramp(0.0, 1.0, 8) },
                Sample { label: "swipe_left".into(), sequence: ramp(1.0, 0.0, 8) },
                Sample { label: "swipe_right".into(), sequence: ramp(0.0, 0.9, 10) },
            ],
        }
    }

    #[test]
    fn test_labels_sorted() {
        let c = DtwClassifier::from_dataset(dataset(), DtwOptions::default()).unwrap();
        assert_eq!(c.labels(), &["swipe_left".to_string(), "swipe_right".to_string()]);
        assert_eq!(c.template_count(), 3);
        assert_eq!(c.feature_len(), Some(2));
        assert_eq!(c.label_name(7), "gesture_7");
    }

    #[test]
    fn test_predict_nearest_label() {
        let c = DtwClassifier::from_dataset(dataset(), DtwOptions::default()).unwrap();
        let scores = c.predict(&ramp(0.0, 1.0, 12));
        assert_eq!(scores.len(), 2);
        assert!(scores[1] > scores[0], "{:?}", scores);
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));

        let m = c.match_sequence(&ramp(0.0, 1.0, 8)).unwrap();
        assert_eq!(m.label, "swipe_right");
        assert_eq!(m.similarity, 1.0);
    }

    #[test]
    fn test_match_below_threshold() {
        let opts = DtwOptions { threshold: 0.99, ..DtwOptions::default() };
        let c = DtwClassifier::from_dataset(dataset(), opts).unwrap();
        assert!(c.match_sequence(&ramp(0.5, 0.5, 8)).is_none());
    }

    #[test]
    fn test_empty_inputs_score_zero() {
        let c = DtwClassifier::from_dataset(dataset(), DtwOptions::default()).unwrap();
        assert_eq!(c.predict(&[]), vec![0.0, 0.0]);
        assert!(c.match_sequence(&[]).is_none());

        let none = DtwClassifier::empty(DtwOptions::default());
        assert!(none.predict(&ramp(0.0, 1.0, 4)).is_empty());
        assert!(none.match_sequence(&ramp(0.0, 1.0, 4)).is_none());
    }

    #[test]
    fn test_even_stride_template_cap() {
        let samples = (0..25)
            .map(|i| Sample { label: "wave".into(), sequence: vec![vec![i as f32]] })
            .collect();
        let c = DtwClassifier::from_dataset(Dataset { samples }, DtwOptions::default()).unwrap();
        let picked: Vec<f32> = c.templates().iter().map(|t| t.sequence[0][0]).collect();
        assert_eq!(picked, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0, 18.0]);
    }

    #[test]
    fn test_ragged_features_fail_fast() {
        let mut ds = dataset();
        ds.samples[1].sequence[3] = vec![0.0, 0.0, 0.0];
        let err = DtwClassifier::from_dataset(ds, DtwOptions::default()).unwrap_err();
        assert!(err.to_string().contains("swipe_left"), "{err}");
    }

    #[test]
    fn test_expected_feature_mismatch() {
        let opts = DtwOptions { expected_features: Some(63), ..DtwOptions::default() };
        assert!(DtwClassifier::from_dataset(dataset(), opts).is_err());
    }

    #[test]
    fn test_dataset_json() {
        let ds = Dataset::from_json(r#"{"samples":[{"label":"tap","sequence":[[0.0,1.0],[0.5,0.5]]}]}"#)
            .unwrap();
        assert_eq!(ds.samples.len(), 1);
        assert_eq!(ds.samples[0].sequence[1], vec![0.5, 0.5]);
        assert!(Dataset::from_json("{\"samples\": 3}").is_err());
    }
}
