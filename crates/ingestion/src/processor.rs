//! Ingestion processor
//!
//! Upload pipeline: extract text, store raw file, insert paper, embed, index.

use crate::errors::IngestionError;
use crate::pdf;
use crate::storage::UploadStore;
use papermind_common::db::models::Paper;
use papermind_common::db::Repository;
use papermind_common::embeddings::Embedder;
use papermind_common::vector::{Metadata, VectorIndex};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};

/// Maximum paper title length (matches the `papers.title` column)
pub const MAX_TITLE_LEN: usize = 255;

/// A paper upload as received from the client
#[derive(Debug, Clone)]
pub struct UploadedPaper {
    pub title: String,
    pub abstract_text: String,
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Ingestion processor
#[derive(Clone)]
pub struct IngestionProcessor {
    repository: Repository,
    store: UploadStore,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl IngestionProcessor {
    pub fn new(
        repository: Repository,
        store: UploadStore,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            repository,
            store,
            embedder,
            index,
        }
    }

    /// Store, extract, persist and index an uploaded paper.
    ///
    /// Once the paper row exists, embedding or indexing failures are logged
    /// and the paper is returned without an index entry.
    #[instrument(skip(self, upload), fields(filename = %upload.filename, size = upload.bytes.len()))]
    pub async fn ingest_upload(&self, upload: UploadedPaper) -> Result<Paper, IngestionError> {
        let start = Instant::now();

        let title = upload.title.trim().to_string();
        if title.is_empty() {
            return Err(IngestionError::MissingField("title"));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(IngestionError::InvalidUpload(format!(
                "title must be at most {} characters",
                MAX_TITLE_LEN
            )));
        }
        if upload.bytes.is_empty() {
            return Err(IngestionError::MissingField("file"));
        }

        // Rejected uploads must not leave files behind
        let bytes = Arc::new(upload.bytes);
        let content = {
            let bytes = Arc::clone(&bytes);
            tokio::task::spawn_blocking(move || pdf::extract_text(&bytes))
                .await
                .map_err(|e| IngestionError::TaskFailed(e.to_string()))??
        };

        let path = self.store.save(&upload.filename, &bytes).await?;
        info!(path = %path.display(), "Saved raw upload");

        let paper = match self
            .repository
            .create_paper(title, Some(upload.abstract_text), Some(content))
            .await
        {
            Ok(paper) => paper,
            Err(e) => {
                self.store.remove(&path).await;
                return Err(e.into());
            }
        };

        info!(paper_id = paper.id, "Paper stored");

        let indexed = match self.index_paper(&paper).await {
            Ok(()) => true,
            Err(e) => {
                error!(paper_id = paper.id, error = %e, "Failed to index paper, continuing without embedding");
                false
            }
        };

        papermind_common::metrics::record_upload(start.elapsed().as_secs_f64(), indexed);
        Ok(paper)
    }

    async fn index_paper(&self, paper: &Paper) -> papermind_common::Result<()> {
        let embedding = self.embedder.embed(embedding_text(paper)).await?;

        let mut metadata = Metadata::new();
        metadata.insert("title".to_string(), json!(paper.title));
        metadata.insert(
            "abstract".to_string(),
            json!(paper.abstract_text.as_deref().unwrap_or_default()),
        );

        self.index.add_document(paper.id, embedding, metadata).await
    }
}

/// Extracted content, or the title when the PDF had no text
fn embedding_text(paper: &Paper) -> &str {
    match paper.content.as_deref() {
        Some(content) if !content.trim().is_empty() => content,
        _ => &paper.title,
    }
}
