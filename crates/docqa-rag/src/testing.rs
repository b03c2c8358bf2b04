//! In-process test doubles for the model and index seams

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use docqa_core::{
    Error, GenerationConfig, GenerationResult, LLMProvider, Passage, PassageMetadata, Reranker,
    Result, ScoredPassage, SearchConfig, VectorStore,
};

/// Vector store returning canned hits per exact query string
pub struct StaticStore {
    hits: HashMap<String, Vec<String>>,
    fail: bool,
}

impl StaticStore {
    pub fn new() -> Self {
        Self {
            hits: HashMap::new(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            hits: HashMap::new(),
            fail: true,
        }
    }

    pub fn with_hits(mut self, query: &str, contents: &[&str]) -> Self {
        self.hits
            .insert(query.to_string(), contents.iter().map(|c| c.to_string()).collect());
        self
    }
}

#[async_trait]
impl VectorStore for StaticStore {
    async fn add_passages(&self, passages: Vec<Passage>) -> Result<usize> {
        Ok(passages.len())
    }

    async fn search(&self, query: &str, config: &SearchConfig) -> Result<Vec<ScoredPassage>> {
        if self.fail {
            return Err(Error::VectorStore("index unavailable".to_string()));
        }

        let contents = self.hits.get(query).cloned().unwrap_or_default();
        let total = contents.len();
        Ok(contents
            .into_iter()
            .enumerate()
            .take(config.top_k)
            .map(|(rank, content)| ScoredPassage {
                passage: Passage::new(
                    content,
                    PassageMetadata {
                        source: "static.pdf".to_string(),
                        page: rank + 1,
                        chunk_index: 0,
                    },
                ),
                score: 1.0 - rank as f32 / total.max(1) as f32,
            })
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.hits.values().map(Vec::len).sum())
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }
}

/// LLM that answers by the first matching prompt substring and records prompts
pub struct ScriptedLlm {
    rules: Vec<(String, String)>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn on(mut self, needle: &str, reply: &str) -> Self {
        self.rules.push((needle.to_string(), reply.to_string()));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedLlm {
    async fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<GenerationResult> {
        self.generate_with_config(prompt, &GenerationConfig::default()).await
    }

    async fn generate_with_config(
        &self,
        prompt: &str,
        _config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .ok_or_else(|| Error::Generation("model offline".to_string()))?;

        Ok(GenerationResult {
            text: reply,
            model_id: "scripted".to_string(),
            tokens_used: None,
        })
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

/// Reranker scoring passages from a fixed content → score table (0.0 otherwise)
pub struct TableReranker {
    scores: HashMap<String, f32>,
    pub calls: Mutex<usize>,
}

impl TableReranker {
    pub fn new(scores: &[(&str, f32)]) -> Self {
        Self {
            scores: scores.iter().map(|(c, s)| (c.to_string(), *s)).collect(),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Reranker for TableReranker {
    async fn score(&self, _query: &str, passages: &[&str]) -> Result<Vec<f32>> {
        *self.calls.lock().unwrap() += 1;
        Ok(passages
            .iter()
            .map(|p| self.scores.get(*p).copied().unwrap_or(0.0))
            .collect())
    }

    fn model_name(&self) -> &str {
        "table"
    }
}
