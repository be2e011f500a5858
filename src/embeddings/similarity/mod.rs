
use crate::{Result, WikicheckError};

fn check_lengths(v1: &[f32], v2: &[f32]) -> Result<()> {
    if v1.len() != v2.len() {
        return Err(WikicheckError::DimensionMismatch {
            expected: v1.len(),
            actual: v2.len(),
        });
    }
    Ok(())
}

#[inline]
pub fn dot_product(v1: &[f32], v2: &[f32]) -> Result<f32> {
    check_lengths(v1, v2)?;
    Ok(v1.iter().zip(v2).map(|(a, b)| a * b).sum())
}

/// Cosine of the angle between `v1` and `v2`: 1 for parallel vectors, -1 for opposite ones
#[inline]
pub fn cosine_similarity(v1: &[f32], v2: &[f32]) -> Result<f32> {
    check_lengths(v1, v2)?;

    let mut dot = 0.0f32;
    let mut norm1 = 0.0f32;
    let mut norm2 = 0.0f32;
    for (&a, &b) in v1.iter().zip(v2) {
        dot += a * b;
        norm1 += a * a;
        norm2 += b * b;
    }

    let denominator = norm1.sqrt() * norm2.sqrt();
    if denominator <= f32::EPSILON {
        return Err(WikicheckError::InvalidInput(
            "cosine similarity is undefined for a zero vector".to_string(),
        ));
    }

    Ok(dot / denominator)
}

/// `1 - cosine_similarity(v1, v2)`: 0 for parallel vectors, 2 for opposite ones.
///
/// Smaller means closer, the inverse orientation of [`cosine_similarity`].
#[inline]
pub fn cosine_distance(v1: &[f32], v2: &[f32]) -> Result<f32> {
    cosine_similarity(v1, v2).map(|similarity| 1.0 - similarity)
}
