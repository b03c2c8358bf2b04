//! Re-ranking models and top-K selection

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use docqa_core::{Error, Passage, Reranker, Result, ScoredPassage};

/// Score every candidate against the original question and keep the best `top_n`.
///
/// The sort is stable, so equal scores keep the candidates' retrieval order.
pub async fn rerank_and_select<R: Reranker + ?Sized>(
    reranker: &R,
    question: &str,
    candidates: Vec<Passage>,
    top_n: usize,
) -> Result<Vec<ScoredPassage>> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let texts: Vec<&str> = candidates.iter().map(|p| p.content.as_str()).collect();
    let scores = reranker.score(question, &texts).await?;

    select_top(candidates, scores, top_n)
}

/// Pair candidates with scores, sort descending (stable), truncate to `top_n`
pub fn select_top(candidates: Vec<Passage>, scores: Vec<f32>, top_n: usize) -> Result<Vec<ScoredPassage>> {
    if scores.len() != candidates.len() {
        return Err(Error::Rerank(format!(
            "Reranker returned {} scores for {} candidates",
            scores.len(),
            candidates.len()
        )));
    }

    let mut scored: Vec<ScoredPassage> = candidates
        .into_iter()
        .zip(scores)
        .map(|(passage, score)| ScoredPassage {
            passage,
            score: if score.is_nan() { f32::NEG_INFINITY } else { score },
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_n);
    Ok(scored)
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    texts: &'a [&'a str],
    raw_scores: bool,
}

#[derive(Deserialize)]
struct RerankHit {
    index: usize,
    score: f32,
}

/// Cross-encoder served over HTTP (text-embeddings-inference `/rerank` API).
///
/// Passages are sent in batches of at most `batch_size` texts, matching the
/// server's `--max-client-batch-size` (32 by default).
pub struct HttpReranker {
    client: Client,
    url: String,
    model: String,
    batch_size: usize,
}

impl HttpReranker {
    pub const BGE_RERANKER_BASE: &'static str = "BAAI/bge-reranker-base";
    pub const DEFAULT_BATCH_SIZE: usize = 32;

    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            client,
            url: format!("{}/rerank", base_url.trim_end_matches('/')),
            model: model.into(),
            batch_size: Self::DEFAULT_BATCH_SIZE,
        })
    }

    /// Set the largest number of texts sent in one request
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    async fn score_batch(&self, query: &str, texts: &[&str]) -> Result<Vec<RerankHit>> {
        let request = RerankRequest {
            query,
            texts,
            raw_scores: false,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::Rerank(format!(
                "Rerank request failed with status {}: {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))
    }
}

#[async_trait]
impl Reranker for HttpReranker {
    async fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>> {
        let mut hits = Vec::with_capacity(passages.len());

        for (batch_index, batch) in passages.chunks(self.batch_size).enumerate() {
            let offset = batch_index * self.batch_size;
            let batch_hits = self.score_batch(query, batch).await?;
            tracing::debug!(offset, texts = batch.len(), "rerank batch scored");

            for hit in batch_hits {
                if hit.index >= batch.len() {
                    return Err(Error::Rerank(format!(
                        "Rerank hit index {} out of range for a batch of {}",
                        hit.index,
                        batch.len()
                    )));
                }
                hits.push(RerankHit {
                    index: offset + hit.index,
                    score: hit.score,
                });
            }
        }

        scores_in_input_order(hits, passages.len())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// The rerank API returns hits sorted by score; put them back in input order
fn scores_in_input_order(hits: Vec<RerankHit>, expected: usize) -> Result<Vec<f32>> {
    let mut scores: Vec<Option<f32>> = vec![None; expected];

    for hit in hits {
        let slot = scores.get_mut(hit.index).ok_or_else(|| {
            Error::Rerank(format!("Rerank hit index {} out of range", hit.index))
        })?;
        *slot = Some(hit.score);
    }

    scores
        .into_iter()
        .enumerate()
        .map(|(i, score)| score.ok_or_else(|| Error::Rerank(format!("No score for passage {}", i))))
        .collect()
}

/// Offline reranker: fraction of the question's terms found in the passage
pub struct LexicalReranker;

impl LexicalReranker {
    fn terms(text: &str) -> HashSet<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| word.chars().count() > 2)
            .map(str::to_string)
            .collect()
    }

    fn text_similarity(query: &str, content: &str) -> f32 {
        let query_terms = Self::terms(query);
        if query_terms.is_empty() {
            return 0.0;
        }

        let content_terms = Self::terms(content);
        let matches = query_terms.intersection(&content_terms).count();
        matches as f32 / query_terms.len() as f32
    }
}

#[async_trait]
impl Reranker for LexicalReranker {
    async fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>> {
        Ok(passages
            .iter()
            .map(|content| Self::text_similarity(query, content))
            .collect())
    }

    fn model_name(&self) -> &str {
        "lexical-overlap"
    }
}
