//! Vector operations for embeddings.

use crate::{Error, Result};
use std::cmp::Ordering;

pub type Vector = Vec<f32>;

fn check_dims(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::validation(format!(
            "Vector dimensions must match: {} != {}",
            a.len(),
            b.len()
        )));
    }
    Ok(())
}

pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dims(a, b)?;
    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

pub fn normalize_vector(v: &[f32]) -> Vector {
    let mag = magnitude(v);
    if mag == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / mag).collect()
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    let dot = dot_product(a, b)?;
    let mag_a = magnitude(a);
    let mag_b = magnitude(b);
    if mag_a == 0.0 || mag_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (mag_a * mag_b))
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dims(a, b)?;
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    Euclidean,
    DotProduct,
}

impl SimilarityMetric {
    pub fn score(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        match self {
            SimilarityMetric::Cosine => cosine_similarity(a, b),
            SimilarityMetric::Euclidean => euclidean_distance(a, b),
            SimilarityMetric::DotProduct => dot_product(a, b),
        }
    }

    /// Distances rank ascending, similarities descending.
    pub fn higher_is_better(&self) -> bool {
        !matches!(self, SimilarityMetric::Euclidean)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityResult {
    pub index: usize,
    pub score: f32,
}

/// Rank `candidates` against `query`, best first, keeping at most `top_k`.
/// Candidates whose dimensions differ from the query are skipped.
pub fn find_most_similar(
    query: &[f32],
    candidates: &[Vec<f32>],
    top_k: usize,
    metric: SimilarityMetric,
) -> Vec<SimilarityResult> {
    let mut scores: Vec<SimilarityResult> = candidates
        .iter()
        .enumerate()
        .filter_map(|(i, c)| {
            metric
                .score(query, c)
                .ok()
                .map(|s| SimilarityResult { index: i, score: s })
        })
        .collect();
    if metric.higher_is_better() {
        scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    } else {
        scores.sort_by(|a, b| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal));
    }
    scores.truncate(top_k);
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_dot_product_basic() {
        let result = dot_product(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
        assert!(approx_eq(result, 32.0));
    }

    #[test]
    fn test_dot_product_dimension_mismatch() {
        assert!(dot_product(&[1.0, 2.0], &[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_normalize_vector_basic() {
        let normalized = normalize_vector(&[3.0, 4.0]);
        assert!(approx_eq(normalized[0], 0.6));
        assert!(approx_eq(normalized[1], 0.8));
        assert!(approx_eq(magnitude(&normalized), 1.0));
    }

    #[test]
    fn test_normalize_vector_zero() {
        let v = vec![0.0, 0.0, 0.0];
        assert_eq!(normalize_vector(&v), v);
    }

    #[test]
    fn test_cosine_similarity_identical_and_opposite() {
        let a = [1.0, 2.0, 3.0];
        assert!(approx_eq(cosine_similarity(&a, &a).unwrap(), 1.0));
        assert!(approx_eq(
            cosine_similarity(&a, &[-1.0, -2.0, -3.0]).unwrap(),
            -1.0
        ));
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let result = cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).unwrap();
        assert!(approx_eq(result, 0.0));
    }

    #[test]
    fn test_euclidean_distance_basic() {
        let result = euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]).unwrap();
        assert!(approx_eq(result, 5.0));
    }

    #[test]
    fn test_find_most_similar_cosine() {
        let query = vec![1.0, 0.0, 0.0];
        let candidates = vec![
            vec![1.0, 0.0, 0.0], // identical
            vec![0.0, 1.0, 0.0], // orthogonal
            vec![0.7, 0.7, 0.0], // 45 degrees
        ];
        let results = find_most_similar(&query, &candidates, 2, SimilarityMetric::Cosine);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].index, 0);
        assert_eq!(results[1].index, 2);
        assert!(approx_eq(results[0].score, 1.0));
    }

    #[test]
    fn test_find_most_similar_euclidean() {
        let query = vec![0.0, 0.0];
        let candidates = vec![vec![1.0, 0.0], vec![3.0, 4.0], vec![0.5, 0.5]];
        let results = find_most_similar(&query, &candidates, 2, SimilarityMetric::Euclidean);
        // smaller is better
        assert_eq!(results[0].index, 2);
        assert_eq!(results[1].index, 0);
    }

    #[test]
    fn test_find_most_similar_skips_mismatched() {
        let query = vec![1.0, 0.0];
        let candidates = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0]];
        let results = find_most_similar(&query, &candidates, 5, SimilarityMetric::DotProduct);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].index, 1);
    }
}
