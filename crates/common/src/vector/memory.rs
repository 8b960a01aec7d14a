//! In-memory vector store
//!
//! Entries live only in process memory and are lost on restart.

use super::{cosine_similarity, Metadata, SearchHit, VectorIndex};
use crate::errors::{AppError, Result};
use std::collections::HashMap;
use std::sync::RwLock;

struct Entry {
    paper_id: i32,
    embedding: Vec<f32>,
    metadata: Metadata,
}

#[derive(Default)]
struct Inner {
    /// Entries in first-insertion order
    entries: Vec<Entry>,
    /// paper_id -> position in `entries`
    positions: HashMap<i32, usize>,
}

/// Linear-scan cosine similarity index
#[derive(Default)]
pub struct InMemoryVectorStore {
    inner: RwLock<Inner>,
}

impl InMemoryVectorStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.inner.read().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    /// Whether the store has no documents
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or replace a document. A replaced document keeps its original
    /// position for tie-breaking.
    pub fn insert(&self, paper_id: i32, embedding: Vec<f32>, metadata: Metadata) -> Result<()> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;

        match inner.positions.get(&paper_id).copied() {
            Some(pos) => {
                let entry = &mut inner.entries[pos];
                entry.embedding = embedding;
                entry.metadata = metadata;
            }
            None => {
                let pos = inner.entries.len();
                inner.entries.push(Entry { paper_id, embedding, metadata });
                inner.positions.insert(paper_id, pos);
            }
        }

        Ok(())
    }

    /// Top-k search by cosine similarity, descending. Ties keep insertion order.
    pub fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        let inner = self.inner.read().map_err(|_| poisoned())?;

        if inner.entries.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = inner
            .entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (pos, cosine_similarity(query_embedding, &entry.embedding)))
            .collect();

        // sort_by is stable, so equal scores stay in insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(pos, score)| {
                let entry = &inner.entries[pos];
                SearchHit {
                    paper_id: entry.paper_id,
                    score,
                    metadata: entry.metadata.clone(),
                }
            })
            .collect())
    }
}

fn poisoned() -> AppError {
    AppError::VectorStore {
        message: "in-memory index lock poisoned".to_string(),
    }
}

#[async_trait::async_trait]
impl VectorIndex for InMemoryVectorStore {
    async fn add_document(
        &self,
        paper_id: i32,
        embedding: Vec<f32>,
        metadata: Metadata,
    ) -> Result<()> {
        self.insert(paper_id, embedding, metadata)
    }

    async fn similarity_search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        self.search(query_embedding, top_k)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(title: &str) -> Metadata {
        let mut m = Metadata::new();
        m.insert("title".to_string(), json!(title));
        m
    }

    fn ids(hits: &[SearchHit]) -> Vec<i32> {
        hits.iter().map(|h| h.paper_id).collect()
    }

    #[test]
    fn test_empty_store_returns_nothing() {
        let store = InMemoryVectorStore::new();
        assert!(store.search(&[1.0, 0.0], 3).unwrap().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_descending_order_with_metadata() {
        let store = InMemoryVectorStore::new();
        store.insert(1, vec![0.0, 1.0], meta("orthogonal")).unwrap();
        store.insert(2, vec![1.0, 0.0], meta("same")).unwrap();
        store.insert(3, vec![1.0, 1.0], meta("diagonal")).unwrap();

        let hits = store.search(&[1.0, 0.0], 3).unwrap();
        assert_eq!(ids(&hits), vec![2, 3, 1]);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert!((hits[1].score - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert_eq!(hits[0].metadata["title"], "same");
    }

    #[test]
    fn test_top_k_truncates_and_overshoots() {
        let store = InMemoryVectorStore::new();
        for id in 1..=5 {
            store.insert(id, vec![id as f32, 1.0], Metadata::new()).unwrap();
        }

        assert_eq!(store.search(&[1.0, 0.0], 2).unwrap().len(), 2);
        assert_eq!(store.search(&[1.0, 0.0], 50).unwrap().len(), 5);
        assert!(store.search(&[1.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let store = InMemoryVectorStore::new();
        store.insert(30, vec![2.0, 0.0], Metadata::new()).unwrap();
        store.insert(10, vec![1.0, 0.0], Metadata::new()).unwrap();
        store.insert(20, vec![5.0, 0.0], Metadata::new()).unwrap();

        let hits = store.search(&[1.0, 0.0], 3).unwrap();
        assert_eq!(ids(&hits), vec![30, 10, 20]);
    }

    #[test]
    fn test_zero_norm_scores_zero() {
        let store = InMemoryVectorStore::new();
        store.insert(1, vec![0.0, 0.0], Metadata::new()).unwrap();
        store.insert(2, vec![0.0, 1.0], Metadata::new()).unwrap();

        let hits = store.search(&[0.0, 0.0], 2).unwrap();
        assert!(hits.iter().all(|h| h.score == 0.0));
        assert_eq!(ids(&hits), vec![1, 2]);
    }

    #[test]
    fn test_non_finite_embedding_scores_zero() {
        let store = InMemoryVectorStore::new();
        store.insert(1, vec![f32::INFINITY, 0.0], Metadata::new()).unwrap();
        store.insert(2, vec![1.0, 0.0], Metadata::new()).unwrap();
        store.insert(3, vec![0.0, 1.0], Metadata::new()).unwrap();

        let hits = store.search(&[1.0, 0.0], 3).unwrap();
        assert_eq!(ids(&hits), vec![2, 1, 3]);
        assert_eq!(hits[1].score, 0.0);
    }

    #[test]
    fn test_readd_replaces_and_keeps_position() {
        let store = InMemoryVectorStore::new();
        store.insert(1, vec![1.0, 0.0], meta("old")).unwrap();
        store.insert(2, vec![1.0, 0.0], meta("other")).unwrap();
        store.insert(1, vec![1.0, 0.0], meta("new")).unwrap();

        assert_eq!(store.len(), 2);
        let hits = store.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(ids(&hits), vec![1, 2]);
        assert_eq!(hits[0].metadata["title"], "new");
    }

    #[tokio::test]
    async fn test_trait_object_dispatch() {
        let store: Box<dyn VectorIndex> = Box::new(InMemoryVectorStore::new());
        store.add_document(7, vec![0.5, 0.5], meta("p")).await.unwrap();
        let hits = store.similarity_search(&[1.0, 1.0], 1).await.unwrap();
        assert_eq!(hits[0].paper_id, 7);
        assert_eq!(store.backend(), "memory");
    }
}
