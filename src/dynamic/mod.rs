//! Dynamic (trajectory) gesture recognition.
//!
//! Provides:
//! - `normalize`: landmark frame → wrist-relative feature vector
//! - `buffer`: fixed-length sliding window of feature vectors
//! - `dtw`: banded Dynamic Time Warping distance and similarity
//! - `classifier`: `SequenceClassifier` seam and the DTW template classifier
//! - `engine`: debounced predict-and-fire wrapper

pub mod buffer;
pub mod classifier;
pub mod dtw;
pub mod engine;
pub mod normalize;

pub use classifier::{load_dataset, Dataset, DtwClassifier, DtwOptions, SequenceClassifier};
pub use engine::{DynamicGestureEngine, DynamicGesturePrediction, EngineOptions};
pub use normalize::{FrameNormalization, FEATURE_LEN};
