//! Vector similarity search
//!
//! Two backends implement [`VectorIndex`]:
//! - `InMemoryVectorStore`: linear-scan cosine top-k over a process-local map
//! - `PineconeVectorStore`: remote serverless index

mod memory;
mod pinecone;

pub use memory::InMemoryVectorStore;
pub use pinecone::PineconeVectorStore;

use crate::config::{VectorStoreConfig, VectorStoreKind};
use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Metadata stored next to an embedding
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// One similarity search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Paper ID the embedding belongs to
    pub paper_id: i32,

    /// Cosine similarity to the query
    pub score: f32,

    /// Metadata stored with the embedding
    pub metadata: Metadata,
}

/// Common trait for vector index backends
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace the embedding for a paper
    async fn add_document(
        &self,
        paper_id: i32,
        embedding: Vec<f32>,
        metadata: Metadata,
    ) -> Result<()>;

    /// Return up to `top_k` entries ordered by descending similarity
    async fn similarity_search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<SearchHit>>;

    /// Backend name for logs and readiness checks
    fn backend(&self) -> &'static str;
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 when either vector has zero norm or is empty, when the lengths
/// differ, and when a non-finite component makes the result undefined.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let score = dot / (norm_a.sqrt() * norm_b.sqrt());
    if score.is_finite() {
        score as f32
    } else {
        0.0
    }
}

/// Build the configured vector index
pub async fn create_vector_index(config: &VectorStoreConfig) -> Result<Arc<dyn VectorIndex>> {
    match config.kind {
        VectorStoreKind::Memory => {
            tracing::info!("Using in-memory vector store");
            Ok(Arc::new(InMemoryVectorStore::new()))
        }
        VectorStoreKind::Pinecone => {
            let store = PineconeVectorStore::connect(config).await?;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_is_scale_invariant() {
        let a = [0.3, -1.2, 4.0];
        let b = [0.6, -2.4, 8.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_norm_guard() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 1.0], &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_cosine_non_finite_input() {
        assert_eq!(cosine_similarity(&[f32::INFINITY, 1.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_length_mismatch() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[tokio::test]
    async fn test_memory_backend_from_config() {
        let index = create_vector_index(&VectorStoreConfig::default()).await.unwrap();
        assert_eq!(index.backend(), "memory");
    }
}
