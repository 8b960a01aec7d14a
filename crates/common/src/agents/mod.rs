//! Research agents
//!
//! - `SummarizerAgent`: condenses paper text with the chat model
//! - `ResearchAgent`: semantic search over uploaded papers
//! - `LitReviewAgent`: recommends local and arXiv papers, ranked by relevance

mod lit_review;
mod research;
mod summarizer;

pub use lit_review::LitReviewAgent;
pub use research::ResearchAgent;
pub use summarizer::SummarizerAgent;

use crate::arxiv::ArxivPaper;
use crate::errors::AppError;
use crate::vector::SearchHit;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

/// Literature review mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewMode {
    /// Papers already uploaded
    Local,
    /// arXiv results
    External,
    /// Both, ranked together
    Full,
}

impl ReviewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewMode::Local => "local",
            ReviewMode::External => "external",
            ReviewMode::Full => "full",
        }
    }
}

impl fmt::Display for ReviewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(ReviewMode::Local),
            "external" => Ok(ReviewMode::External),
            "full" => Ok(ReviewMode::Full),
            other => Err(AppError::Validation {
                message: format!("Unknown review mode '{}', expected local, external or full", other),
                field: Some("mode".to_string()),
            }),
        }
    }
}

/// Where a candidate paper came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    Local,
    Arxiv,
}

/// A paper considered during literature review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub source: CandidateSource,

    /// Local paper ID, absent for arXiv results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_id: Option<i32>,

    pub title: String,

    #[serde(rename = "abstract")]
    pub abstract_text: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Candidate {
    /// Text used for relevance scoring: the abstract, or the title when the
    /// abstract is empty
    pub fn ranking_text(&self) -> &str {
        if self.abstract_text.trim().is_empty() {
            &self.title
        } else {
            &self.abstract_text
        }
    }
}

fn metadata_str(hit: &SearchHit, key: &str) -> String {
    hit.metadata
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

impl From<&SearchHit> for Candidate {
    fn from(hit: &SearchHit) -> Self {
        Self {
            source: CandidateSource::Local,
            paper_id: Some(hit.paper_id),
            title: metadata_str(hit, "title"),
            abstract_text: metadata_str(hit, "abstract"),
            authors: None,
            published: None,
            url: None,
        }
    }
}

impl From<ArxivPaper> for Candidate {
    fn from(paper: ArxivPaper) -> Self {
        Self {
            source: CandidateSource::Arxiv,
            paper_id: None,
            title: paper.title,
            abstract_text: paper.abstract_text,
            authors: Some(paper.authors),
            published: Some(paper.published),
            url: Some(paper.url),
        }
    }
}

/// A candidate with its relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,

    pub similarity_score: f32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

fn default_top_k() -> usize {
    5
}

fn default_max_results() -> usize {
    3
}

fn not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("text must not be empty".into()));
    }
    Ok(())
}

/// Literature review request body
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LiteratureReviewRequest {
    /// Research description or draft abstract
    #[validate(custom(function = "not_blank"))]
    pub text: String,

    /// Number of ranked papers to return
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Number of arXiv results to fetch
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Ask the chat model why each paper is relevant
    #[serde(default)]
    pub explain: bool,
}

/// Literature review result
#[derive(Debug, Clone, Serialize)]
pub struct LiteratureReview {
    pub mode: ReviewMode,
    pub query: String,
    pub papers: Vec<RankedCandidate>,
}
