//! Document loader trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Result;

/// A page-level document produced by a loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub source: String,
    pub page: usize,
    pub text: String,
}

/// Configuration for splitting documents into chunks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub embed_batch_size: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 700,
            chunk_overlap: 70,
            embed_batch_size: 32,
        }
    }
}

/// Trait for document loaders
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load every supported document found in a directory
    async fn load_dir(&self, dir: &Path) -> Result<Vec<Document>>;
}
