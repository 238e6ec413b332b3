//! Text embedding for mnemo.
//!
//! The embedding service turns document and query text into dense vectors
//! through the [`Embedder`] trait. Two implementations:
//!
//! - [`HashEmbedder`]: deterministic token-hash embeddings, no model files.
//!   Texts sharing words get positively correlated vectors, which is enough
//!   for tests and for running the service without a downloaded model.
//! - [`local::LocalEmbedder`]: ONNX Runtime inference over a sentence
//!   transformer (requires the `local-embeddings` feature).

pub mod error;
#[cfg(feature = "local-embeddings")]
pub mod local;

pub use error::{EmbedError, Result};

use std::sync::Arc;

use async_trait::async_trait;

/// Default embedding dimensions (MiniLM-L6-v2 produces 384-dim vectors).
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Trait for generating text embeddings.
///
/// Implementations must produce L2-normalized vectors so cosine similarity
/// reduces to a dot product in the index.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts.
    ///
    /// The default embeds sequentially; implementations override for real
    /// batching.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Dimensionality of produced vectors.
    fn dimensions(&self) -> usize;

    /// Implementation name, reported by the service status endpoint.
    fn name(&self) -> &str;
}

/// A shareable embedder handle.
pub type SharedEmbedder = Arc<dyn Embedder>;

// ─────────────────────────────────────────────────────────────────────────────
// Hash Embedder
// ─────────────────────────────────────────────────────────────────────────────

/// Deterministic bag-of-tokens embedder.
///
/// Each lowercase alphanumeric token hashes to a pseudo-random unit vector;
/// a text embeds as the normalized sum of its token vectors. Identical
/// texts embed identically, and texts sharing tokens score positive cosine
/// similarity, so search behavior is exercisable without a model.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    /// Create a hash embedder with the given dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut sum = vec![0.0f32; self.dimensions];

        let lowered = text.to_lowercase();
        let tokens = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty());

        for token in tokens {
            // One LCG stream per token, seeded by an FNV-1a hash.
            let mut state = fnv1a(token);
            for slot in sum.iter_mut() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                *slot += ((state >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            }
        }

        normalize(&mut sum);
        Ok(sum)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// FNV-1a hash, stable across platforms.
fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in s.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// L2-normalize in place; the zero vector stays zero.
pub(crate) fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-9 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
