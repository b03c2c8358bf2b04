//! Vector store trait and passage types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Where a passage came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageMetadata {
    /// Source file name
    pub source: String,
    /// 1-based page number inside the source
    pub page: usize,
    /// Position of the chunk within its page
    pub chunk_index: usize,
}

/// A unit of retrievable text. The content doubles as its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub content: String,
    pub metadata: PassageMetadata,
}

impl Passage {
    pub fn new(content: impl Into<String>, metadata: PassageMetadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Short "source p.N" label used when rendering context
    pub fn citation(&self) -> String {
        if self.metadata.source.is_empty() {
            format!("p.{}", self.metadata.page)
        } else {
            format!("{} p.{}", self.metadata.source, self.metadata.page)
        }
    }
}

/// A passage paired with a score; higher is more relevant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub score: f32,
}

/// Configuration for vector search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub top_k: usize,
    pub score_threshold: Option<f32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 20,
            score_threshold: None,
        }
    }
}

/// Trait for vector stores
///
/// Results of `search` are ordered by descending similarity. Implementations
/// are expected to be read-only once built, so a single store can be shared
/// across concurrent lookups.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Embed and add passages, returning how many were stored
    async fn add_passages(&self, passages: Vec<Passage>) -> Result<usize>;

    /// Nearest-neighbour search by query text
    async fn search(&self, query: &str, config: &SearchConfig) -> Result<Vec<ScoredPassage>>;

    /// Get the total number of passages
    async fn count(&self) -> Result<usize>;

    /// Remove every passage
    async fn clear(&self) -> Result<()>;
}
