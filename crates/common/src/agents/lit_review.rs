//! Literature review: candidate gathering, relevance ranking, explanations

use super::{Candidate, LiteratureReview, LiteratureReviewRequest, RankedCandidate, ReviewMode};
use crate::arxiv::{ArxivPaper, PaperSearch};
use crate::embeddings::Embedder;
use crate::errors::{AppError, Result};
use crate::llm::ChatModel;
use crate::vector::{cosine_similarity, SearchHit, VectorIndex};
use futures::future::join_all;
use std::sync::Arc;
use validator::Validate;

/// Recommends and ranks papers for a research description
#[derive(Clone)]
pub struct LitReviewAgent {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    chat: Arc<dyn ChatModel>,
    papers: Arc<dyn PaperSearch>,
    temperature: f32,
}

impl LitReviewAgent {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        chat: Arc<dyn ChatModel>,
        papers: Arc<dyn PaperSearch>,
        temperature: f32,
    ) -> Self {
        Self {
            embedder,
            index,
            chat,
            papers,
            temperature,
        }
    }

    /// Uploaded papers closest to `text`
    pub async fn recommend_local_papers(&self, text: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        tracing::info!("Generating embedding for input text to find relevant local papers");
        let query_embedding = self.embedder.embed(text).await?;
        let hits = self.index.similarity_search(&query_embedding, top_k).await?;
        tracing::info!(count = hits.len(), "Found local candidate papers");
        Ok(hits)
    }

    /// arXiv search results for `text`
    pub async fn recommend_external_papers(&self, text: &str, max_results: usize) -> Result<Vec<ArxivPaper>> {
        tracing::info!(max_results, "Querying arXiv for external papers");
        let papers = self.papers.search(text, max_results).await?;
        tracing::info!(count = papers.len(), "Retrieved external papers");
        Ok(papers)
    }

    /// Score candidates against `user_text` by cosine similarity and keep the
    /// `top_k` best. Equal scores keep their input order.
    pub async fn rank_papers_by_relevance(
        &self,
        user_text: &str,
        candidates: Vec<Candidate>,
        top_k: usize,
    ) -> Result<Vec<RankedCandidate>> {
        if candidates.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(user_text).await?;
        let texts: Vec<String> = candidates.iter().map(|c| c.ranking_text().to_string()).collect();
        let candidate_embeddings = self.embedder.embed_batch(&texts).await?;
        if candidate_embeddings.len() != candidates.len() {
            return Err(AppError::EmbeddingError {
                message: format!(
                    "expected {} embeddings, got {}",
                    candidates.len(),
                    candidate_embeddings.len()
                ),
            });
        }

        let mut ranked: Vec<RankedCandidate> = candidates
            .into_iter()
            .zip(candidate_embeddings)
            .map(|(candidate, embedding)| RankedCandidate {
                similarity_score: cosine_similarity(&query_embedding, &embedding),
                candidate,
                explanation: None,
            })
            .collect();

        ranked.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
        ranked.truncate(top_k);

        Ok(ranked)
    }

    /// Ask the chat model why a paper is relevant. Chat failures come back as
    /// the error message text.
    pub async fn explain_relevance(&self, user_text: &str, candidate_text: &str) -> String {
        let prompt = format!(
            "The user is researching: {}\n\n\
             Below is a paper abstract or summary:\n{}\n\n\
             Briefly explain why this paper might be relevant to the user's research. \
             Provide a concise paragraph.",
            user_text, candidate_text
        );

        match self.chat.complete("", &prompt, self.temperature).await {
            Ok(explanation) => explanation.trim().to_string(),
            Err(e) => {
                tracing::error!(error = %e, "Relevance explanation failed");
                format!("Error during chat completion: {}", e)
            }
        }
    }

    /// Run a literature review in the given mode
    pub async fn review(&self, mode: ReviewMode, request: &LiteratureReviewRequest) -> Result<LiteratureReview> {
        request.validate()?;
        let text = request.text.as_str();

        let mut papers = match mode {
            ReviewMode::Local => self
                .recommend_local_papers(text, request.top_k)
                .await?
                .iter()
                .map(|hit| RankedCandidate {
                    candidate: Candidate::from(hit),
                    similarity_score: hit.score,
                    explanation: None,
                })
                .collect(),
            ReviewMode::External => {
                let external = self.recommend_external_papers(text, request.max_results).await?;
                let candidates = external.into_iter().map(Candidate::from).collect();
                self.rank_papers_by_relevance(text, candidates, request.top_k).await?
            }
            ReviewMode::Full => {
                let local = self.recommend_local_papers(text, request.top_k).await?;
                let external = self.recommend_external_papers(text, request.max_results).await?;
                let candidates = local
                    .iter()
                    .map(Candidate::from)
                    .chain(external.into_iter().map(Candidate::from))
                    .collect();
                self.rank_papers_by_relevance(text, candidates, request.top_k).await?
            }
        };

        if request.explain {
            let explanations = join_all(
                papers
                    .iter()
                    .map(|p| self.explain_relevance(text, p.candidate.ranking_text())),
            )
            .await;
            for (paper, explanation) in papers.iter_mut().zip(explanations) {
                paper.explanation = Some(explanation);
            }
        }

        tracing::info!(mode = %mode, count = papers.len(), "Literature review complete");

        Ok(LiteratureReview {
            mode,
            query: request.text.clone(),
            papers,
        })
    }
}
