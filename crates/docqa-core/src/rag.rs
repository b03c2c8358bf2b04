//! RAG (Retrieval-Augmented Generation) engine trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;

use crate::{Error, Result, ScoredPassage};

/// Reply used when the selected context does not hold the answer
pub const NOT_FOUND_ANSWER: &str =
    "Based on the provided documents, I could not find the requested information.";

/// Knobs for the expand → retrieve → dedupe → rerank pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Paraphrases requested from the expander
    pub expansions: usize,
    /// Nearest neighbours fetched per query variant
    pub fetch_k: usize,
    /// Passages kept after re-ranking
    pub top_n: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            expansions: 3,
            fetch_k: 20,
            top_n: 6,
        }
    }
}

impl RetrievalConfig {
    /// Read overrides from `RAG_EXPANSIONS`, `RAG_FETCH_K` and `RAG_TOP_N`
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Ok(Self {
            expansions: env_usize("RAG_EXPANSIONS", defaults.expansions)?,
            fetch_k: env_usize("RAG_FETCH_K", defaults.fetch_k)?,
            top_n: env_usize("RAG_TOP_N", defaults.top_n)?,
        })
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_fetch_k(mut self, fetch_k: usize) -> Self {
        self.fetch_k = fetch_k;
        self
    }
}

fn env_usize(key: &str, default: usize) -> Result<usize> {
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| {
            Error::Configuration(format!("{} must be a positive integer, got '{}'", key, value))
        }),
        Err(_) => Ok(default),
    }
}

/// Outcome of the retrieval stages for one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Retrieval {
    /// Original question followed by generated paraphrases
    pub variants: Vec<String>,
    /// Unique candidates before re-ranking
    pub candidates: usize,
    /// Re-ranked passages, best first
    pub passages: Vec<ScoredPassage>,
}

/// Final answer plus the evidence it was generated from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnswer {
    pub answer: String,
    pub retrieval: Retrieval,
}

/// Trait for RAG engines
#[async_trait]
pub trait RagEngine: Send + Sync {
    /// Run the retrieval stages for a question
    async fn retrieve(&self, question: &str) -> Result<Retrieval>;

    /// Retrieve and generate an answer grounded in the selected passages
    async fn answer(&self, question: &str) -> Result<RagAnswer>;
}
