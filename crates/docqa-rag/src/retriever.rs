//! Multi-query batch retrieval and candidate deduplication

use futures::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;

use docqa_core::{Error, Passage, Result, SearchConfig, VectorStore};

/// Issues one nearest-neighbour lookup per query variant
pub struct BatchRetriever<V: VectorStore> {
    store: Arc<V>,
    fetch_k: usize,
}

impl<V: VectorStore> BatchRetriever<V> {
    pub fn new(store: Arc<V>, fetch_k: usize) -> Self {
        Self { store, fetch_k }
    }

    /// Search every variant concurrently.
    ///
    /// The outer vector is parallel to `variants`; each inner vector is ordered
    /// by descending similarity.
    pub async fn retrieve(&self, variants: &[String]) -> Result<Vec<Vec<Passage>>> {
        let config = SearchConfig {
            top_k: self.fetch_k,
            score_threshold: None,
        };

        let lookups = variants.iter().map(|variant| self.store.search(variant, &config));
        let results = try_join_all(lookups)
            .await
            .map_err(|e| Error::Retrieval(format!("Vector search failed: {}", e)))?;

        Ok(results
            .into_iter()
            .map(|hits| hits.into_iter().map(|hit| hit.passage).collect())
            .collect())
    }
}

/// Merge per-variant results into unique passages keyed by exact content.
///
/// The first occurrence of a content string wins and the output keeps
/// first-seen order. Near-duplicates with different text stay distinct.
pub fn deduplicate(results: Vec<Vec<Passage>>) -> Vec<Passage> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::new();

    for passage in results.into_iter().flatten() {
        if seen.insert(passage.content.clone()) {
            unique.push(passage);
        }
    }

    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticStore;
    use docqa_core::PassageMetadata;

    fn p(content: &str, page: usize) -> Passage {
        Passage::new(
            content,
            PassageMetadata {
                source: "doc.pdf".to_string(),
                page,
                chunk_index: 0,
            },
        )
    }

    #[test]
    fn test_identical_content_across_variants_appears_once() {
        let results = vec![
            vec![p("alpha", 1), p("beta", 2)],
            vec![p("beta", 9), p("gamma", 3)],
            vec![p("alpha", 7)],
        ];

        let unique = deduplicate(results);
        let contents: Vec<&str> = unique.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["alpha", "beta", "gamma"]);
        // first occurrence wins
        assert_eq!(unique[1].metadata.page, 2);
    }

    #[test]
    fn test_near_duplicates_are_kept() {
        let unique = deduplicate(vec![vec![p("alpha.", 1)], vec![p("alpha", 1)]]);
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn test_deduplicate_empty() {
        assert!(deduplicate(Vec::new()).is_empty());
        assert!(deduplicate(vec![Vec::new(), Vec::new()]).is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_is_parallel_to_variants() {
        let store = StaticStore::new()
            .with_hits("q1", &["a", "b"])
            .with_hits("q2", &["b", "c"]);
        let retriever = BatchRetriever::new(Arc::new(store), 10);

        let results = retriever
            .retrieve(&["q1".to_string(), "q2".to_string(), "q3".to_string()])
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0][1].content, "b");
        assert_eq!(results[1][1].content, "c");
        assert!(results[2].is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_respects_fetch_k() {
        let store = StaticStore::new().with_hits("q", &["a", "b", "c"]);
        let retriever = BatchRetriever::new(Arc::new(store), 2);

        let results = retriever.retrieve(&["q".to_string()]).await.unwrap();
        assert_eq!(results[0].len(), 2);
    }

    #[tokio::test]
    async fn test_store_failure_is_retrieval_error() {
        let retriever = BatchRetriever::new(Arc::new(StaticStore::failing()), 5);
        let result = retriever.retrieve(&["q".to_string()]).await;
        assert!(matches!(result, Err(Error::Retrieval(_))));
    }
}
