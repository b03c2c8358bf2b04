//! Ollama integration for docqa
//!
//! This crate provides the Ollama implementation of the `LLMProvider` and
//! `Embedder` traits.

mod client;
mod config;


pub use client::OllamaClient;
pub use config::{DEFAULT_HOST, OllamaConfig};

// Re-export core types for convenience
pub use docqa_core::{Embedder, Error, GenerationConfig, GenerationResult, LLMProvider, Result};
