//! RAG pipeline: expand → retrieve → dedupe → rerank → generate

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use docqa_core::{
    Error, GenerationConfig, LLMProvider, NOT_FOUND_ANSWER, RagAnswer, RagEngine, Reranker,
    Result, Retrieval, RetrievalConfig, ScoredPassage, VectorStore,
};

use crate::expander::QueryExpander;
use crate::reranker::rerank_and_select;
use crate::retriever::{BatchRetriever, deduplicate};

/// Retrieval-augmented question answering over a vector store
pub struct RagPipeline<L: LLMProvider, V: VectorStore, R: Reranker> {
    llm: Arc<L>,
    expander: QueryExpander<L>,
    retriever: BatchRetriever<V>,
    reranker: Arc<R>,
    config: RetrievalConfig,
}

impl<L: LLMProvider, V: VectorStore, R: Reranker> RagPipeline<L, V, R> {
    pub fn new(llm: Arc<L>, store: Arc<V>, reranker: Arc<R>, config: RetrievalConfig) -> Self {
        Self {
            expander: QueryExpander::new(llm.clone(), config.expansions),
            retriever: BatchRetriever::new(store, config.fetch_k),
            llm,
            reranker,
            config,
        }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Numbered context block, one passage per entry, best first
    pub fn build_context(&self, passages: &[ScoredPassage]) -> String {
        let mut context = String::new();

        for (i, scored) in passages.iter().enumerate() {
            context.push_str(&format!(
                "{}. [{}] {}\n\n",
                i + 1,
                scored.passage.citation(),
                scored.passage.content.trim()
            ));
        }

        context
    }

    pub fn build_prompt(&self, question: &str, context: &str) -> String {
        format!(
            "You are a highly qualified research assistant. Answer the user's question precisely \
            and concisely, based strictly on the context provided.\n\
            Analyse every context excerpt below before writing your answer.\n\
            If the required information is not present in any of the excerpts, reply exactly: '{}'\n\
            Do not use any prior knowledge.\n\
            \n\
            Context:\n\
            {}\n\
            Question:\n\
            {}\n\
            \n\
            Precise answer:",
            NOT_FOUND_ANSWER,
            context.trim_end(),
            question
        )
    }
}

#[async_trait]
impl<L, V, R> RagEngine for RagPipeline<L, V, R>
where
    L: LLMProvider + 'static,
    V: VectorStore + 'static,
    R: Reranker + 'static,
{
    async fn retrieve(&self, question: &str) -> Result<Retrieval> {
        let started = Instant::now();

        let variants = self.expander.expand(question).await?;
        tracing::info!(variants = variants.len(), "expanded question");

        let results = self.retriever.retrieve(&variants).await?;
        let hits: usize = results.iter().map(Vec::len).sum();

        let candidates = deduplicate(results);
        let candidate_count = candidates.len();
        tracing::info!(hits, unique = candidate_count, "retrieved candidates");

        let passages =
            rerank_and_select(self.reranker.as_ref(), question, candidates, self.config.top_n)
                .await?;
        tracing::info!(
            selected = passages.len(),
            reranker = self.reranker.model_name(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "reranked candidates"
        );

        Ok(Retrieval {
            variants,
            candidates: candidate_count,
            passages,
        })
    }

    async fn answer(&self, question: &str) -> Result<RagAnswer> {
        let retrieval = self.retrieve(question).await?;

        let context = self.build_context(&retrieval.passages);
        let prompt = self.build_prompt(question, &context);

        let started = Instant::now();
        let config = GenerationConfig {
            model_id: self.llm.model_id().to_string(),
            ..Default::default()
        };
        let result = self
            .llm
            .generate_with_config(&prompt, &config)
            .await
            .map_err(|e| match e {
                Error::Timeout(_) | Error::Generation(_) => e,
                other => Error::Generation(format!("Answer generation failed: {}", other)),
            })?;
        tracing::debug!(elapsed_ms = started.elapsed().as_millis() as u64, "generated answer");

        Ok(RagAnswer {
            answer: result.text.trim().to_string(),
            retrieval,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reranker::LexicalReranker;
    use crate::testing::{ScriptedLlm, StaticStore};
    use docqa_core::{Passage, PassageMetadata};

    fn pipeline() -> RagPipeline<ScriptedLlm, StaticStore, LexicalReranker> {
        RagPipeline::new(
            Arc::new(ScriptedLlm::new()),
            Arc::new(StaticStore::new()),
            Arc::new(LexicalReranker),
            RetrievalConfig::default(),
        )
    }

    #[test]
    fn test_build_context_numbers_passages() {
        let passages = vec![
            ScoredPassage {
                passage: Passage::new(
                    "  Employees must act with integrity.\n",
                    PassageMetadata {
                        source: "conduct.pdf".to_string(),
                        page: 3,
                        chunk_index: 0,
                    },
                ),
                score: 0.9,
            },
            ScoredPassage {
                passage: Passage::new("Gifts above a set value must be declared.", PassageMetadata::default()),
                score: 0.4,
            },
        ];

        let context = pipeline().build_context(&passages);
        assert_eq!(
            context,
            "1. [conduct.pdf p.3] Employees must act with integrity.\n\n\
             2. [p.0] Gifts above a set value must be declared.\n\n"
        );
    }

    #[test]
    fn test_build_context_empty() {
        assert!(pipeline().build_context(&[]).is_empty());
    }

    #[test]
    fn test_prompt_carries_fallback_and_question() {
        let prompt = pipeline().build_prompt("Who approves travel?", "1. [a p.1] text\n\n");
        assert!(prompt.contains(NOT_FOUND_ANSWER));
        assert!(prompt.contains("Question:\nWho approves travel?"));
        assert!(prompt.contains("Context:\n1. [a p.1] text\n"));
    }
}
