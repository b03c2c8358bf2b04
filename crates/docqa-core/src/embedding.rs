//! Embedding model trait

use async_trait::async_trait;

use crate::Result;

/// Trait for embedding models that turn text into fixed-size vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| crate::Error::Retrieval("Embedding model returned no vector".to_string()))
    }

    /// Embed a batch of texts; output is parallel to the input
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Name of the embedding model, recorded with persisted indexes
    fn model_name(&self) -> &str;
}
