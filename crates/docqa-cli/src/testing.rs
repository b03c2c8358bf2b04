//! Scripted collaborators for assistant tests

use async_trait::async_trait;
use std::sync::Mutex;

use docqa_core::{
    Error, GenerationConfig, GenerationResult, LLMProvider, Passage, PassageMetadata, RagAnswer,
    RagEngine, Result, Retrieval, ScoredPassage,
};

/// LLM answering by the first rule whose needle appears in the prompt
pub struct ScriptedLlm {
    rules: Vec<(String, String)>,
    prompts: Mutex<Vec<String>>,
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

/// RAG engine returning one fixed passage and answer, counting calls
pub struct CannedRag {
    answer: String,
    calls: Mutex<usize>,
}

impl CannedRag {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl RagEngine for CannedRag {
    async fn retrieve(&self, question: &str) -> Result<Retrieval> {
        *self.calls.lock().unwrap() += 1;
        Ok(Retrieval {
            variants: vec![question.to_string()],
            candidates: 1,
            passages: vec![ScoredPassage {
                passage: Passage::new(
                    "The code of conduct applies to all employees.",
                    PassageMetadata {
                        source: "conduct.pdf".to_string(),
                        page: 2,
                        chunk_index: 0,
                    },
                ),
                score: 0.93,
            }],
        })
    }

    async fn answer(&self, question: &str) -> Result<RagAnswer> {
        let retrieval = self.retrieve(question).await?;
        Ok(RagAnswer {
            answer: self.answer.clone(),
            retrieval,
        })
    }
}
