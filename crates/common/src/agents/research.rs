use crate::embeddings::Embedder;
use crate::errors::{AppError, Result};
use crate::vector::{SearchHit, VectorIndex};
use std::sync::Arc;
use std::time::Instant;

/// Semantic search over uploaded papers
#[derive(Clone)]
pub struct ResearchAgent {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl ResearchAgent {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Embed `query` and return the `top_k` closest papers
    pub async fn find_relevant_papers(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(AppError::Validation {
                message: "query must not be empty".to_string(),
                field: Some("query".to_string()),
            });
        }

        let start = Instant::now();
        let query_embedding = self.embedder.embed(query).await?;
        let hits = self.index.similarity_search(&query_embedding, top_k).await?;

        crate::metrics::record_search(start.elapsed().as_secs_f64(), self.index.backend(), hits.len());
        tracing::debug!(top_k, results = hits.len(), "Similarity search complete");

        Ok(hits)
    }
}
