//! Re-ranking model trait

use async_trait::async_trait;

use crate::Result;

/// A pairwise relevance model (cross-encoder style).
///
/// Given one query and a list of passages, returns one score per passage in
/// input order. Higher means more relevant.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>>;

    /// Name of the model behind the scores
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<T: Reranker + ?Sized> Reranker for Box<T> {
    async fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>> {
        (**self).score(query, passages).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
