//! On-disk cache of model completions

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs;

use docqa_core::{Error, GenerationConfig, GenerationResult, LLMProvider, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    model_id: String,
    response: String,
    created_at: DateTime<Utc>,
}

/// Wraps a provider and replays earlier completions for identical prompts.
///
/// Entries are keyed by the md5 of model id and prompt and saved to a JSON
/// file after every miss.
pub struct CachedProvider<L: LLMProvider> {
    inner: L,
    path: PathBuf,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl<L: LLMProvider> CachedProvider<L> {
    /// Wrap `inner`, loading an existing cache file when present
    pub async fn open(inner: L, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if Path::new(&path).exists() {
            let content = fs::read_to_string(&path).await?;
            serde_json::from_str(&content).map_err(|e| Error::Serialization(e.to_string()))?
        } else {
            HashMap::new()
        };

        Ok(Self {
            inner,
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn cache_key(model_id: &str, prompt: &str) -> String {
        format!("{:x}", md5::compute(format!("{}\n{}", model_id, prompt)))
    }

    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, CacheEntry>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Other("cache lock poisoned".to_string()))
    }

    async fn save(&self) -> Result<()> {
        let json = {
            let entries = self.lock()?;
            serde_json::to_string_pretty(&*entries).map_err(|e| Error::Serialization(e.to_string()))?
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl<L: LLMProvider> LLMProvider for CachedProvider<L> {
    async fn connect(&mut self) -> Result<()> {
        self.inner.connect().await
    }

    async fn generate(&self, prompt: &str) -> Result<GenerationResult> {
        let config = GenerationConfig {
            model_id: self.model_id().to_string(),
            ..Default::default()
        };
        self.generate_with_config(prompt, &config).await
    }

    async fn generate_with_config(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        let key = Self::cache_key(&config.model_id, prompt);

        let cached = self.lock()?.get(&key).cloned();
        if let Some(entry) = cached {
            tracing::debug!(key = %key, "cache hit");
            return Ok(GenerationResult {
                text: entry.response,
                model_id: entry.model_id,
                tokens_used: None,
            });
        }

        let result = self.inner.generate_with_config(prompt, config).await?;
        self.lock()?.insert(
            key,
            CacheEntry {
                model_id: result.model_id.clone(),
                response: result.text.clone(),
                created_at: Utc::now(),
            },
        );
        self.save().await?;

        Ok(result)
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}
