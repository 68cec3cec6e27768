//! Embedding provider interface
//!
//! The embedding model is an external collaborator: an opaque text to
//! fixed-length vector function. Providers must be deterministic for
//! identical input so similarity scores stay reproducible.

use crate::error::{MemoryError, Result};
use async_trait::async_trait;

/// Default vector width, matching small sentence-embedding models
pub const DEFAULT_DIMENSION: usize = 384;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &'static str;
    fn dimension(&self) -> usize;

    /// Embed a batch of texts. The returned vectors correspond
    /// index-for-index to the input texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| MemoryError::EmbeddingFailed("provider returned no vectors".into()))
    }

    /// Eagerly initialize the underlying model. The first inference call
    /// typically pays model-load latency; callers that care can warm the
    /// provider up front. No-op unless the provider overrides it.
    async fn warm(&self) -> Result<()> {
        Ok(())
    }
}

/// Zero-config embedding provider.
///
/// Hashes tokens into buckets and normalizes the result: no network, no
/// model download, and identical text always embeds to the identical
/// vector. Not a substitute for a learned model's semantic quality.
#[derive(Debug, Clone)]
pub struct HashEmbeddingProvider {
    dimension: usize,
}

impl HashEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dimension];
        let mut seen_token = false;

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            seen_token = true;
            let idx = (fnv1a(token) as usize) % self.dimension;
            vec[idx] += 1.0;
        }

        if !seen_token {
            return vec;
        }

        let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vec {
                *v /= norm;
            }
        }

        vec
    }
}

impl Default for HashEmbeddingProvider {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

fn fnv1a(token: &str) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    for b in token.as_bytes() {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
