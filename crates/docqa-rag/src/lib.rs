//! Retrieval-augmented question answering for docqa
//!
//! This crate provides the local vector store, the document loader and text
//! splitter, and the pipeline stages: query expansion, batch retrieval,
//! deduplication, re-ranking and answer generation.

mod document_loader;
mod embedder;
mod engine;
mod expander;
mod reranker;
mod retriever;
mod vector_store;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests;

pub use document_loader::{DirectoryLoader, TextSplitter, split_pages};
pub use embedder::HashEmbedder;
pub use engine::RagPipeline;
pub use expander::{QueryExpander, parse_variants};
pub use reranker::{HttpReranker, LexicalReranker, rerank_and_select, select_top};
pub use retriever::{BatchRetriever, deduplicate};
pub use vector_store::LocalVectorStore;

// Re-export core types for convenience
pub use docqa_core::{
    Document, DocumentLoader, Embedder, Error, NOT_FOUND_ANSWER, Passage, PassageMetadata,
    RagAnswer, RagEngine, Reranker, Result, Retrieval, RetrievalConfig, ScoredPassage,
    SearchConfig, SplitterConfig, VectorStore,
};
