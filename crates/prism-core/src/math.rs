//! Shared math utilities.
//!
//! Model outputs are f32 (ONNX); similarity arithmetic accumulates in
//! f64 so fusion and ranking work in double precision.

/// L2-normalize a vector in place so its magnitude is 1.
pub fn l2_normalize_in_place(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// L2-normalize a slice, returning a new vector with unit magnitude.
pub fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let mut result = v.to_vec();
    l2_normalize_in_place(&mut result);
    result
}

/// Dot product of two equal-length vectors with f64 accumulation.
///
/// Both inputs are unit vectors by contract, so this is their cosine
/// similarity in [-1, 1]. Zero vectors (a skipped normalization
/// upstream) simply yield 0.0 — no division happens here.
pub fn dot(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "dimension mismatch in dot product");
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum()
}
