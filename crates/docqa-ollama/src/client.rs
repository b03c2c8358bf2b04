//! Ollama client implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;

use docqa_core::{Embedder, Error, GenerationConfig, GenerationResult, LLMProvider, Result};

use crate::config::OllamaConfig;

/// Ollama client serving both completions and embeddings
pub struct OllamaClient {
    config: OllamaConfig,
    client: Client,
    current_model: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateOptions {
    pub num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub options: GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaClient {
    /// Model constants
    pub const LLAMA3_8B: &'static str = "llama3:8b";
    pub const LLAMA3_INSTRUCT: &'static str = "llama3:instruct";
    pub const NOMIC_EMBED_TEXT: &'static str = "nomic-embed-text";

    /// Create a new Ollama client from configuration
    pub fn new(config: OllamaConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        let current_model = config.model.clone();

        Ok(Self {
            config,
            client,
            current_model,
        })
    }

    /// Create a new Ollama client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = OllamaConfig::from_env()?;
        Self::new(config)
    }

    /// Set the model to use for generation
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.current_model = model_id.into();
        self
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Per-call deadline: never shorter than the configured `OLLAMA_TIMEOUT_SECS`
    pub(crate) fn request_timeout(&self, config: &GenerationConfig) -> Duration {
        config.timeout.max(Duration::from_secs(self.config.timeout_secs))
    }

    pub(crate) fn build_request(prompt: &str, config: &GenerationConfig) -> GenerateRequest {
        GenerateRequest {
            model: config.model_id.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: GenerateOptions {
                num_predict: config.max_tokens,
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k,
                stop: config.stop_sequences.clone(),
            },
        }
    }

    /// Perform the actual generation request
    async fn perform_generation(&self, prompt: &str, config: &GenerationConfig) -> Result<GenerateResponse> {
        let request_body = Self::build_request(prompt, config);
        let url = self.config.endpoint("/api/generate");

        tracing::debug!(model = %request_body.model, prompt_chars = prompt.len(), "ollama generate");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(e.to_string())
                } else {
                    Error::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Generation(format!(
                "Ollama request failed with status {}: {}",
                status, error_text
            )));
        }

        response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// Trim a completion and drop a leading "Answer:" echo
pub(crate) fn clean_completion(text: &str) -> String {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("Answer:")
        .map(str::trim)
        .unwrap_or(trimmed)
        .to_string()
}

#[async_trait]
impl LLMProvider for OllamaClient {
    async fn connect(&mut self) -> Result<()> {
        let url = self.config.endpoint("/api/tags");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Ollama is not reachable at {}: {}", self.config.host, e)))?;

        if !response.status().is_success() {
            return Err(Error::Network(format!(
                "Ollama health check failed: {}",
                response.status()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let wanted = [self.current_model.as_str(), self.config.embed_model.as_str()];
        for model in wanted {
            let present = tags
                .models
                .iter()
                .any(|tag| tag.name == model || tag.name.trim_end_matches(":latest") == model);
            if !present {
                tracing::warn!(model, "model not pulled on the Ollama host");
            }
        }

        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<GenerationResult> {
        let config = GenerationConfig {
            model_id: self.current_model.clone(),
            ..Default::default()
        };
        self.generate_with_config(prompt, &config).await
    }

    async fn generate_with_config(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        let generation_future = self.perform_generation(prompt, config);

        let response = match timeout(self.request_timeout(config), generation_future).await {
            Ok(result) => result?,
            Err(_) => return Err(Error::Timeout("Request timed out".to_string())),
        };

        let text = clean_completion(&response.response);
        if text.is_empty() {
            return Err(Error::Generation("Empty response from Ollama".to_string()));
        }

        Ok(GenerationResult {
            text,
            model_id: config.model_id.clone(),
            tokens_used: response.eval_count,
        })
    }

    fn model_id(&self) -> &str {
        &self.current_model
    }
}

#[async_trait]
impl Embedder for OllamaClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.config.endpoint("/api/embed");
        let request_body = EmbedRequest {
            model: &self.config.embed_model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Retrieval(format!(
                "Ollama embedding request failed with status {}: {}",
                status, error_text
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        if body.embeddings.len() != texts.len() {
            return Err(Error::Retrieval(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                body.embeddings.len()
            )));
        }

        Ok(body.embeddings)
    }

    fn model_name(&self) -> &str {
        &self.config.embed_model
    }
}
