//! Offline hash-based embedder

use async_trait::async_trait;

use docqa_core::{Embedder, Result};

/// Bag-of-words embedder built from hashed unigrams and bigrams.
///
/// It needs no model server, which makes it useful for smoke runs and tests.
/// Vectors are L2-normalised so cosine similarity reduces to a dot product.
/// Features are hashed with md5, so persisted vectors stay comparable across
/// builds.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub const MODEL_NAME: &'static str = "hash-bow-md5-384";

    pub fn new() -> Self {
        Self { dimension: 384 }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let normalized: String = text
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        let words: Vec<&str> = normalized.split_whitespace().collect();

        let mut embedding = vec![0.0f32; self.dimension];

        for word in &words {
            let hash = hash_of(word);
            embedding[(hash % self.dimension as u64) as usize] += 1.0;
            if word.len() > 3 {
                embedding[((hash >> 16) % self.dimension as u64) as usize] += 0.5;
            }
        }

        for window in words.windows(2) {
            let hash = hash_of(&format!("{} {}", window[0], window[1]));
            embedding[(hash % self.dimension as u64) as usize] += 0.3;
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for val in embedding.iter_mut() {
                *val /= magnitude;
            }
        }

        embedding
    }
}

/// First eight bytes of the md5 digest, little-endian
fn hash_of(text: &str) -> u64 {
    let digest = md5::compute(text.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.0[..8]);
    u64::from_le_bytes(bytes)
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }

    fn model_name(&self) -> &str {
        Self::MODEL_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_embeddings_are_normalised_and_deterministic() {
        let embedder = HashEmbedder::new();
        let a = embedder.embed("Code of conduct policy").await.unwrap();
        let b = embedder.embed("code of CONDUCT policy!").await.unwrap();

        assert_eq!(a.len(), 384);
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_feature_hash_is_pinned() {
        assert_eq!(hash_of("policy"), 30495544875659252);
        assert_eq!(hash_of("code of"), 3394083853614373406);
    }

    #[tokio::test]
    async fn test_features_land_on_pinned_slots() {
        let embedder = HashEmbedder::new();
        let v = embedder.embed("policy").await.unwrap();
        let unigram = (30495544875659252u64 % 384) as usize;
        let long_word = ((30495544875659252u64 >> 16) % 384) as usize;
        assert!(v[unigram] > 0.0);
        assert!(v[long_word] > 0.0);
        assert_eq!(v.iter().filter(|x| **x > 0.0).count(), if unigram == long_word { 1 } else { 2 });
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let embedder = HashEmbedder::new();
        let v = embedder.embed("   ").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
