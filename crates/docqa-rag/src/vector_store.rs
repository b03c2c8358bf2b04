//! Local vector store with on-disk persistence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use docqa_core::{
    Document, Embedder, Error, Passage, Result, ScoredPassage, SearchConfig, SplitterConfig,
    VectorStore,
};

use crate::document_loader::TextSplitter;

const INDEX_FILE: &str = "index.json";
const INDEX_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    id: String,
    passage: Passage,
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedIndex {
    version: u32,
    embedding_model: String,
    dimension: usize,
    created_at: DateTime<Utc>,
    entries: Vec<IndexEntry>,
}

/// In-memory vector store using exhaustive cosine similarity.
///
/// Entries keep insertion order, so equal similarities come back in the order
/// passages were indexed.
pub struct LocalVectorStore<E: Embedder> {
    embedder: Arc<E>,
    entries: RwLock<Vec<IndexEntry>>,
    batch_size: usize,
}

impl<E: Embedder + 'static> LocalVectorStore<E> {
    /// Create an empty store
    pub fn new(embedder: Arc<E>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
            batch_size: SplitterConfig::default().embed_batch_size,
        }
    }

    /// Set how many passages are embedded per model call
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Split documents into chunks and index them
    pub async fn build_from_documents(
        embedder: Arc<E>,
        documents: &[Document],
        config: &SplitterConfig,
    ) -> Result<Self> {
        let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap)?;
        let passages = splitter.split_documents(documents);
        tracing::info!(
            documents = documents.len(),
            chunks = passages.len(),
            "building vector index"
        );

        let store = Self::new(embedder).with_batch_size(config.embed_batch_size);
        store.add_passages(passages).await?;
        Ok(store)
    }

    /// Whether a persisted index exists in `dir`
    pub fn exists(dir: &Path) -> bool {
        index_file(dir).is_file()
    }

    /// Write the index to `dir/index.json`
    pub async fn persist(&self, dir: &Path) -> Result<()> {
        let entries = self.read_entries()?.clone();
        let dimension = entries.first().map(|e| e.embedding.len()).unwrap_or(0);

        let persisted = PersistedIndex {
            version: INDEX_VERSION,
            embedding_model: self.embedder.model_name().to_string(),
            dimension,
            created_at: Utc::now(),
            entries,
        };

        let json = serde_json::to_string(&persisted)?;
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(index_file(dir), json).await?;

        tracing::info!(path = %dir.display(), entries = persisted.entries.len(), "vector index saved");
        Ok(())
    }

    /// Load an index written by [`LocalVectorStore::persist`].
    ///
    /// Fails if the index was built with a different embedding model, since
    /// its vectors would not be comparable with new query embeddings.
    pub async fn load(dir: &Path, embedder: Arc<E>) -> Result<Self> {
        let path = index_file(dir);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            Error::VectorStore(format!("Failed to read index {}: {}", path.display(), e))
        })?;

        let persisted: PersistedIndex = serde_json::from_str(&content)?;

        if persisted.version != INDEX_VERSION {
            return Err(Error::VectorStore(format!(
                "Unsupported index version {} (expected {})",
                persisted.version, INDEX_VERSION
            )));
        }

        if persisted.embedding_model != embedder.model_name() {
            return Err(Error::VectorStore(format!(
                "Index was built with embedding model '{}' but '{}' is configured; rebuild the index",
                persisted.embedding_model,
                embedder.model_name()
            )));
        }

        if let Some(entry) = persisted
            .entries
            .iter()
            .find(|entry| entry.embedding.len() != persisted.dimension)
        {
            return Err(Error::VectorStore(format!(
                "Index entry {} has {} dimensions but the index declares {}",
                entry.id,
                entry.embedding.len(),
                persisted.dimension
            )));
        }

        if !persisted.entries.is_empty() {
            let sample = embedder.embed(&persisted.entries[0].passage.content).await?;
            if sample.len() != persisted.dimension {
                return Err(Error::VectorStore(format!(
                    "Index has {} dimensions but '{}' produces {}; rebuild the index",
                    persisted.dimension,
                    embedder.model_name(),
                    sample.len()
                )));
            }
        }

        tracing::info!(
            path = %dir.display(),
            entries = persisted.entries.len(),
            dimension = persisted.dimension,
            created_at = %persisted.created_at,
            "vector index loaded"
        );

        Ok(Self {
            embedder,
            entries: RwLock::new(persisted.entries),
            batch_size: SplitterConfig::default().embed_batch_size,
        })
    }

    fn read_entries(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<IndexEntry>>> {
        self.entries
            .read()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))
    }

    /// Simple cosine similarity calculation
    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }
}

fn index_file(dir: &Path) -> PathBuf {
    dir.join(INDEX_FILE)
}

#[async_trait]
impl<E: Embedder + 'static> VectorStore for LocalVectorStore<E> {
    async fn add_passages(&self, passages: Vec<Passage>) -> Result<usize> {
        let mut added = 0;

        for batch in passages.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|p| p.content.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            if embeddings.len() != batch.len() {
                return Err(Error::VectorStore(format!(
                    "Embedder returned {} vectors for {} passages",
                    embeddings.len(),
                    batch.len()
                )));
            }

            let new_entries = batch.iter().cloned().zip(embeddings).map(|(passage, embedding)| {
                IndexEntry {
                    id: uuid::Uuid::new_v4().to_string(),
                    passage,
                    embedding,
                }
            });

            let mut entries = self
                .entries
                .write()
                .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))?;
            entries.extend(new_entries);
            added += batch.len();
            tracing::debug!(indexed = entries.len(), "embedded passage batch");
        }

        Ok(added)
    }

    async fn search(&self, query: &str, config: &SearchConfig) -> Result<Vec<ScoredPassage>> {
        let query_embedding = self.embedder.embed(query).await?;

        let entries = self.read_entries()?;
        if let Some(first) = entries.first() {
            if first.embedding.len() != query_embedding.len() {
                return Err(Error::VectorStore(format!(
                    "Query embedding has {} dimensions but the index has {}",
                    query_embedding.len(),
                    first.embedding.len()
                )));
            }
        }

        let mut results: Vec<ScoredPassage> = entries
            .iter()
            .map(|entry| ScoredPassage {
                passage: entry.passage.clone(),
                score: Self::cosine_similarity(&query_embedding, &entry.embedding),
            })
            .filter(|hit| config.score_threshold.is_none_or(|threshold| hit.score >= threshold))
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(config.top_k);

        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.read_entries()?.len())
    }

    async fn clear(&self) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))?;
        entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashEmbedder;
    use docqa_core::PassageMetadata;

    fn passage(content: &str, page: usize) -> Passage {
        Passage::new(
            content,
            PassageMetadata {
                source: "policy.pdf".to_string(),
                page,
                chunk_index: 0,
            },
        )
    }

    async fn seeded_store() -> LocalVectorStore<HashEmbedder> {
        let store = LocalVectorStore::new(Arc::new(HashEmbedder::new()));
        store
            .add_passages(vec![
                passage("The code of conduct applies to every employee and contractor.", 1),
                passage("Quarterly revenue grew by twelve percent.", 2),
                passage("Board governance is reviewed annually.", 3),
            ])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_add_and_count() {
        let store = seeded_store().await;
        assert_eq!(store.count().await.unwrap(), 3);

        store.clear().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let store = seeded_store().await;
        let config = SearchConfig {
            top_k: 2,
            score_threshold: None,
        };

        let hits = store.search("code of conduct for employees", &config).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].passage.metadata.page, 1);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_search_applies_threshold() {
        let store = seeded_store().await;
        let config = SearchConfig {
            top_k: 10,
            score_threshold: Some(0.99),
        };

        let hits = store.search("completely unrelated words", &config).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_persist_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store().await;
        store.persist(dir.path()).await.unwrap();
        assert!(LocalVectorStore::<HashEmbedder>::exists(dir.path()));

        let loaded = LocalVectorStore::load(dir.path(), Arc::new(HashEmbedder::new()))
            .await
            .unwrap();
        assert_eq!(loaded.count().await.unwrap(), 3);

        let config = SearchConfig::default();
        let before = store.search("board governance", &config).await.unwrap();
        let after = loaded.search("board governance", &config).await.unwrap();
        assert_eq!(before, after);
    }

    struct RenamedEmbedder(HashEmbedder);

    #[async_trait]
    impl Embedder for RenamedEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.0.embed_batch(texts).await
        }

        fn model_name(&self) -> &str {
            "some-other-model"
        }
    }

    #[tokio::test]
    async fn test_load_rejects_other_embedding_model() {
        let dir = tempfile::tempdir().unwrap();
        seeded_store().await.persist(dir.path()).await.unwrap();

        let result =
            LocalVectorStore::load(dir.path(), Arc::new(RenamedEmbedder(HashEmbedder::new()))).await;
        assert!(matches!(result, Err(Error::VectorStore(_))));
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0; 8]).collect())
        }

        fn model_name(&self) -> &str {
            HashEmbedder::MODEL_NAME
        }
    }

    #[tokio::test]
    async fn test_load_rejects_embedder_with_other_dimension() {
        let dir = tempfile::tempdir().unwrap();
        seeded_store().await.persist(dir.path()).await.unwrap();

        let result = LocalVectorStore::load(dir.path(), Arc::new(ShortEmbedder)).await;
        assert!(matches!(result, Err(Error::VectorStore(message)) if message.contains("384")));
    }

    #[tokio::test]
    async fn test_load_rejects_inconsistent_dimension_header() {
        let dir = tempfile::tempdir().unwrap();
        seeded_store().await.persist(dir.path()).await.unwrap();

        let path = index_file(dir.path());
        let mut index: serde_json::Value =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        index["dimension"] = serde_json::json!(128);
        tokio::fs::write(&path, index.to_string()).await.unwrap();

        let result = LocalVectorStore::load(dir.path(), Arc::new(HashEmbedder::new())).await;
        assert!(matches!(result, Err(Error::VectorStore(_))));
    }

    #[tokio::test]
    async fn test_search_rejects_query_of_other_dimension() {
        let store = LocalVectorStore::new(Arc::new(ShortEmbedder));
        store
            .entries
            .write()
            .unwrap()
            .push(IndexEntry {
                id: "legacy".to_string(),
                passage: passage("Board governance is reviewed annually.", 3),
                embedding: vec![0.5; 384],
            });

        let result = store.search("board governance", &SearchConfig::default()).await;
        assert!(matches!(result, Err(Error::VectorStore(_))));
    }

    #[tokio::test]
    async fn test_build_from_documents_chunks_pages() {
        let documents = vec![Document {
            source: "manual.pdf".to_string(),
            page: 4,
            text: "word ".repeat(400),
        }];
        let config = SplitterConfig {
            chunk_size: 500,
            chunk_overlap: 50,
            embed_batch_size: 2,
        };

        let store = LocalVectorStore::build_from_documents(Arc::new(HashEmbedder::new()), &documents, &config)
            .await
            .unwrap();

        assert!(store.count().await.unwrap() >= 4);
    }
}
