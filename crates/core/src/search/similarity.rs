//! Cosine similarity for the semantic scorer.
//!
//! The semantic score is `1 - cosine_distance`, i.e. plain cosine similarity:
//! 1.0 for identical direction, negative for opposite vectors.

/// Cosine similarity between two f32 slices, accumulated in f64.
///
/// Returns 0.0 when either vector has zero norm. The result is clamped to
/// \[-1, 1\] to absorb rounding. Slices must have equal length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    // Chunked loop so the compiler can vectorize the three accumulators.
    let chunks_a = a.chunks_exact(4);
    let chunks_b = b.chunks_exact(4);
    let rem_a = chunks_a.remainder();
    let rem_b = chunks_b.remainder();
    for (ca, cb) in chunks_a.zip(chunks_b) {
        for i in 0..4 {
            let x = ca[i] as f64;
            let y = cb[i] as f64;
            dot += x * y;
            norm_a += x * x;
            norm_b += y * y;
        }
    }
    for (&x, &y) in rem_a.iter().zip(rem_b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0)
}

/// Cosine distance: `1 - cosine_similarity`. Range \[0, 2\].
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    1.0 - cosine_similarity(a, b)
}

/// L2-normalizes a vector in place. Zero vectors are left unchanged.
pub fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x = (*x as f64 / norm) as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors() {
        let v = [0.3, -1.2, 4.0, 0.5, 2.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
        assert!(cosine_distance(&v, &v).abs() < 1e-9);
    }

    #[test]
    fn test_opposite_vectors() {
        let a = [1.0, 2.0, 3.0];
        let b = [-1.0, -2.0, -3.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_orthogonal_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_zero_norm_is_zero_similarity() {
        assert_eq!(cosine_similarity(&[0.0, 0.0, 0.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_scale_invariant() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b: Vec<f32> = a.iter().map(|x| x * 10.0).collect();
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize() {
        let mut v = [3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = [0.0, 0.0];
        normalize(&mut zero);
        assert_eq!(zero, [0.0, 0.0]);
    }
}
