//! The embedding-provider port (§4.3, §6).

use async_trait::async_trait;

use crate::error::Result;

/// Produces dense embeddings for capture and retrieval text.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch in one round trip. Implementations should preserve order
    /// and return a vector the same length as `texts`.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// The dimensionality of vectors this provider returns, used to size
    /// collections at creation time.
    fn dimension(&self) -> usize;
}
