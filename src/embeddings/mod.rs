//! Embedding support.
//!
//! This module provides:
//! - The [`Embedder`] trait (text in, vector out)
//! - [`EmbeddingClient`], backed by Gemini `embedContent`
//! - Vector operations (similarity, distance, normalization)

mod client;
mod vectors;

pub use client::{EmbeddingClient, EmbeddingClientBuilder};
pub use vectors::{
    cosine_similarity, dot_product, euclidean_distance, find_most_similar, magnitude,
    normalize_vector, SimilarityMetric, SimilarityResult, Vector,
};

use crate::Result;
use async_trait::async_trait;

/// Maps text to a fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vector>;

    /// Embed several texts, returning vectors in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let mut out = Vec::with_capacity(texts.len());
        for t in texts {
            out.push(self.embed(t).await?);
        }
        Ok(out)
    }

    fn model(&self) -> &str;
}
