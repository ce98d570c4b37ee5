//! Dynamic Time Warping over feature-vector sequences.

/// Euclidean distance over the common prefix of two vectors.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// DTW distance normalized by `n + m`.
///
/// `window` is the Sakoe-Chiba band half-width; `None` leaves the path
/// unconstrained.  Empty input yields `f32::INFINITY`, as does a band too
/// narrow to reach the corner.
pub fn dtw_distance<A, B>(a: &[A], b: &[B], window: Option<usize>) -> f32
where
    A: AsRef<[f32]>,
    B: AsRef<[f32]>,
{
    let (n, m) = (a.len(), b.len());
    if n == 0 || m == 0 {
        return f32::INFINITY;
    }
    let w = window.unwrap_or(n.max(m));

    // Two rolling rows of the (n+1)x(m+1) cost matrix.
    let mut prev = vec![f32::INFINITY; m + 1];
    let mut curr = vec![f32::INFINITY; m + 1];
    prev[0] = 0.0;

    for i in 1..=n {
        curr.fill(f32::INFINITY);
        let j_start = i.saturating_sub(w).max(1);
        let j_end = (i + w).min(m);
        for j in j_start..=j_end {
            let cost = euclidean_distance(a[i - 1].as_ref(), b[j - 1].as_ref());
            let best = prev[j].min(curr[j - 1]).min(prev[j - 1]);
            curr[j] = cost + best;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[m] / (n + m) as f32
}

/// `exp(-distance / scale)`: 1 for identical sequences, toward 0 as they
/// diverge.
pub fn similarity_from_distance(distance: f32, scale: f32) -> f32 {
    (-distance / scale).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(values: &[f32]) -> Vec<Vec<f32>> {
        values.iter().map(|v| vec![*v, *v * 0.5]).collect()
    }

    #[test]
    fn test_euclidean() {
        assert_eq!(euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        // Extra trailing values are ignored.
        assert_eq!(euclidean_distance(&[1.0], &[1.0, 9.0]), 0.0);
    }

    #[test]
    fn test_self_distance_zero() {
        let s = seq(&[0.0, 0.3, 0.9, 0.4, 0.1]);
        assert_eq!(dtw_distance(&s, &s, None), 0.0);
        assert_eq!(dtw_distance(&s, &s, Some(1)), 0.0);
        assert_eq!(similarity_from_distance(dtw_distance(&s, &s, None), 0.5), 1.0);
    }

    #[test]
    fn test_empty_is_infinite() {
        let empty: Vec<Vec<f32>> = Vec::new();
        let s = seq(&[1.0]);
        assert_eq!(dtw_distance(&empty, &s, None), f32::INFINITY);
        assert_eq!(dtw_distance(&s, &empty, None), f32::INFINITY);
        assert_eq!(dtw_distance(&empty, &empty, None), f32::INFINITY);
        assert_eq!(similarity_from_distance(dtw_distance(&empty, &s, None), 0.5), 0.0);
    }

    #[test]
    fn test_known_values() {
        let a = vec![vec![0.0f32]];
        let b = vec![vec![1.0f32]];
        assert!((dtw_distance(&a, &b, None) - 0.5).abs() < 1e-6);

        let a = vec![vec![0.0f32], vec![0.0]];
        assert!((dtw_distance(&a, &b, None) - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_warping_absorbs_tempo() {
        let slow = seq(&[0.0, 0.0, 0.5, 0.5, 1.0, 1.0]);
        let fast = seq(&[0.0, 0.5, 1.0]);
        let other = seq(&[1.0, 0.5, 0.0]);
        assert_eq!(dtw_distance(&slow, &fast, None), 0.0);
        assert!(dtw_distance(&slow, &other, None) > 0.1);
    }

    #[test]
    fn test_non_negative() {
        let a = seq(&[-3.0, 2.0, -1.0, 7.5]);
        let b = seq(&[0.1, -0.2]);
        assert!(dtw_distance(&a, &b, None) >= 0.0);
        assert!(dtw_distance(&b, &a, Some(2)) >= 0.0);
    }

    #[test]
    fn test_narrow_band_cannot_reach_corner() {
        let long = seq(&[0.0; 6]);
        let short = seq(&[0.0; 2]);
        assert_eq!(dtw_distance(&long, &short, Some(1)), f32::INFINITY);
        assert_eq!(dtw_distance(&long, &short, Some(4)), 0.0);
    }
}
