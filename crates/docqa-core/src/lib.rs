//! Core traits and types for docqa
//!
//! This crate defines the fundamental traits and types used across the docqa
//! workspace: the language model, embedding model, vector store, re-ranker and
//! document loader seams, plus the shared data model and error type. Every
//! collaborator sits behind a trait so the pipeline can run against test
//! doubles.

pub mod document;
pub mod embedding;
pub mod error;
pub mod intent;
pub mod llm;
pub mod rag;
pub mod reranker;
pub mod vector_store;

pub use document::{Document, DocumentLoader, SplitterConfig};
pub use embedding::Embedder;
pub use error::{Error, ExpressionError, Result};
pub use intent::Intent;
pub use llm::{GenerationConfig, GenerationResult, LLMProvider};
pub use rag::{NOT_FOUND_ANSWER, RagAnswer, RagEngine, Retrieval, RetrievalConfig};
pub use reranker::Reranker;
pub use vector_store::{Passage, PassageMetadata, ScoredPassage, SearchConfig, VectorStore};
