//! Optional embedding port backing the character-voice-consistency rule
//! (spec.md §4.4 rule 8, §9 Open Question: "heuristic vs. embedding
//! similarity"). DESIGN.md resolves the open question in favor of a
//! heuristic default with this trait as a pluggable upgrade — most
//! deployments never construct an adapter for it.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding backend error: {0}")]
    Backend(String),
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait EmbeddingPort: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Cosine similarity between two equal-length embedding vectors, in
/// `[-1.0, 1.0]`. Returns `0.0` for mismatched or zero-length inputs
/// rather than panicking — callers treat that as "no signal".
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
