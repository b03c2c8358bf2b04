//! Ollama configuration

use docqa_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

pub const DEFAULT_HOST: &str = "http://localhost:11434";

/// Configuration for the Ollama client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
    pub embed_model: String,
    pub timeout_secs: u64,
}

impl OllamaConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let host = env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());

        let model = env::var("OLLAMA_MODEL")
            .unwrap_or_else(|_| crate::OllamaClient::LLAMA3_INSTRUCT.to_string());

        let embed_model = env::var("OLLAMA_EMBED_MODEL")
            .unwrap_or_else(|_| crate::OllamaClient::NOMIC_EMBED_TEXT.to_string());

        let timeout_secs = match env::var("OLLAMA_TIMEOUT_SECS") {
            Ok(value) => value.trim().parse().map_err(|_| {
                Error::Configuration(format!(
                    "OLLAMA_TIMEOUT_SECS must be a number of seconds, got '{}'",
                    value
                ))
            })?,
            Err(_) => 120,
        };

        let config = Self {
            host,
            model,
            embed_model,
            timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create configuration with explicit values
    pub fn new(host: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            model: model.into(),
            embed_model: crate::OllamaClient::NOMIC_EMBED_TEXT.to_string(),
            timeout_secs: 120,
        }
    }

    pub fn with_embed_model(mut self, embed_model: impl Into<String>) -> Self {
        self.embed_model = embed_model.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Check that the host is an http(s) URL
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.host).map_err(|e| {
            Error::Configuration(format!("OLLAMA_HOST '{}' is not a valid URL: {}", self.host, e))
        })?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(Error::Configuration(format!(
                "OLLAMA_HOST must use http or https, got '{}'",
                other
            ))),
        }
    }

    /// Join an API path onto the host
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.host.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, crate::OllamaClient::LLAMA3_INSTRUCT)
    }
}
