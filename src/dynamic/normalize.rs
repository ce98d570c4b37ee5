//! Landmark frame → feature vector.
//!
//! A feature vector is the 21 landmarks flattened as `[x0, y0, z0, x1, ...]`
//! relative to the wrist.  The scale-invariant variant additionally divides
//! by the wrist→middle-MCP length so hand size and camera distance drop out.

use crate::tracking::landmarks::{Point3, LANDMARK_COUNT};

/// Values per feature vector.
pub const FEATURE_LEN: usize = LANDMARK_COUNT * 3;

/// Reference segment and guard for scale normalization.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub scale_a: usize,
    pub scale_b: usize,
    pub epsilon: f32,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            scale_a: 0,
            scale_b: 9,
            epsilon: 1e-6,
        }
    }
}

/// How the sequence buffer turns landmarks into features.  Must match the
/// format the templates were recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameNormalization {
    #[default]
    WristRelative,
    ScaleInvariant,
}

impl FrameNormalization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WristRelative => "wrist-relative",
            Self::ScaleInvariant => "scale-invariant",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "wrist-relative" => Some(Self::WristRelative),
            "scale-invariant" => Some(Self::ScaleInvariant),
            _ => None,
        }
    }

    pub fn apply(&self, points: &[Point3]) -> Option<Vec<f32>> {
        match self {
            Self::WristRelative => wrist_relative_frame(points),
            Self::ScaleInvariant => normalize_frame(points, &NormalizeOptions::default()),
        }
    }
}

/// Wrist-relative features.  `None` for a short skeleton.
pub fn wrist_relative_frame(points: &[Point3]) -> Option<Vec<f32>> {
    scaled(points, 1.0)
}

/// Wrist-relative, scale-invariant features.  `None` for a short skeleton.
pub fn normalize_frame(points: &[Point3], opts: &NormalizeOptions) -> Option<Vec<f32>> {
    if points.len() < LANDMARK_COUNT {
        return None;
    }
    let base = points[0];
    let a = points.get(opts.scale_a).copied().unwrap_or(base);
    let b = points.get(opts.scale_b).copied().unwrap_or(base);
    let (dx, dy, dz) = (b.x - a.x, b.y - a.y, b.z - a.z);
    let scale = (dx * dx + dy * dy + dz * dz).sqrt().max(opts.epsilon);
    scaled(points, scale)
}

fn scaled(points: &[Point3], scale: f32) -> Option<Vec<f32>> {
    let base = *points.first()?;
    if points.len() < LANDMARK_COUNT {
        return None;
    }
    let mut out = Vec::with_capacity(FEATURE_LEN);
    for p in &points[..LANDMARK_COUNT] {
        out.push((p.x - base.x) / scale);
        out.push((p.y - base.y) / scale);
        out.push((p.z - base.z) / scale);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skeleton(offset: f32, size: f32) -> Vec<Point3> {
        (0..LANDMARK_COUNT)
            .map(|i| {
                let i = i as f32;
                Point3::new(offset + size * i * 0.01, offset - size * i * 0.02, 0.0)
            })
            .collect()
    }

    #[test]
    fn test_wrist_is_origin() {
        let f = wrist_relative_frame(&skeleton(0.3, 1.0)).unwrap();
        assert_eq!(f.len(), FEATURE_LEN);
        assert_eq!(&f[..3], &[0.0, 0.0, 0.0]);
        assert!((f[3] - 0.01).abs() < 1e-6);
        assert!((f[4] + 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_short_skeleton_rejected() {
        let pts = skeleton(0.3, 1.0);
        assert!(wrist_relative_frame(&pts[..20]).is_none());
        assert!(normalize_frame(&pts[..5], &NormalizeOptions::default()).is_none());
        assert!(wrist_relative_frame(&[]).is_none());
    }

    #[test]
    fn test_scale_invariance() {
        let opts = NormalizeOptions::default();
        let small = normalize_frame(&skeleton(0.2, 1.0), &opts).unwrap();
        let big = normalize_frame(&skeleton(0.6, 2.0), &opts).unwrap();
        for (a, b) in small.iter().zip(&big) {
            assert!((a - b).abs() < 1e-4, "{a} vs {b}");
        }
    }

    #[test]
    fn test_degenerate_scale_guarded() {
        let pts = vec![Point3::xy(0.5, 0.5); LANDMARK_COUNT];
        let f = normalize_frame(&pts, &NormalizeOptions::default()).unwrap();
        assert!(f.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_normalization_names() {
        for n in [FrameNormalization::WristRelative, FrameNormalization::ScaleInvariant] {
            assert_eq!(FrameNormalization::from_name(n.as_str()), Some(n));
        }
        assert_eq!(FrameNormalization::from_name("bogus"), None);
    }
}
