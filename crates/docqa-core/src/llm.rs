//! LLM provider trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::Result;

/// Configuration for text generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model_id: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub stop_sequences: Vec<String>,
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model_id: "llama3:instruct".to_string(),
            max_tokens: 512,
            temperature: None,
            top_p: None,
            top_k: None,
            stop_sequences: Vec::new(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Result of a text generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub text: String,
    pub model_id: String,
    pub tokens_used: Option<u32>,
}

/// Trait for LLM providers (e.g., Ollama)
///
/// The pipeline treats a provider as stateless: a rendered prompt goes in,
/// a completion comes out.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Connect to the provider and verify it is reachable
    async fn connect(&mut self) -> Result<()>;

    /// Generate text using the LLM with default configuration
    async fn generate(&self, prompt: &str) -> Result<GenerationResult>;

    /// Generate text with custom configuration
    async fn generate_with_config(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult>;

    /// Get the model ID being used
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: LLMProvider + ?Sized> LLMProvider for Arc<T> {
    async fn connect(&mut self) -> Result<()> {
        match Arc::get_mut(self) {
            Some(inner) => inner.connect().await,
            None => Err(crate::Error::Configuration(
                "Cannot connect a shared LLM provider".to_string(),
            )),
        }
    }

    async fn generate(&self, prompt: &str) -> Result<GenerationResult> {
        (**self).generate(prompt).await
    }

    async fn generate_with_config(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        (**self).generate_with_config(prompt, config).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}
