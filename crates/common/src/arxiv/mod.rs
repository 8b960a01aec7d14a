//! arXiv search client
//!
//! Queries the public Atom API and converts entries into [`ArxivPaper`].

use crate::config::ArxivConfig;
use crate::errors::{AppError, Result};
use feed_rs::parser;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A paper returned by an arXiv search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArxivPaper {
    pub title: String,

    /// Author names joined with ", "
    pub authors: String,

    #[serde(rename = "abstract")]
    pub abstract_text: String,

    /// Publication date as YYYY-MM-DD, empty when unknown
    pub published: String,

    pub url: String,
}

/// External paper search used by the literature-review agent
#[async_trait::async_trait]
pub trait PaperSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<ArxivPaper>>;
}

/// HTTP client for the arXiv query API
#[derive(Clone)]
pub struct ArxivClient {
    client: reqwest::Client,
    api_url: String,
    default_max_results: usize,
}

impl ArxivClient {
    pub fn new(config: &ArxivConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            default_max_results: config.max_results,
        })
    }

    /// Configured result count used when a caller does not pass one
    pub fn default_max_results(&self) -> usize {
        self.default_max_results
    }

    /// Search arXiv across all fields
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<ArxivPaper>> {
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let search_query = format!("all:{}", query);
        let max = max_results.to_string();

        tracing::debug!(query, max_results, "Querying arXiv");

        let result = async {
            let body = self
                .client
                .get(&self.api_url)
                .query(&[
                    ("search_query", search_query.as_str()),
                    ("start", "0"),
                    ("max_results", max.as_str()),
                ])
                .send()
                .await
                .map_err(|e| AppError::upstream("arxiv", format!("Request failed: {}", e)))?
                .error_for_status()
                .map_err(|e| AppError::upstream("arxiv", format!("API error: {}", e)))?
                .bytes()
                .await
                .map_err(|e| AppError::upstream("arxiv", format!("Failed to read response: {}", e)))?;

            parse_feed(&body, max_results)
        }
        .await;

        match &result {
            Ok(papers) => crate::metrics::record_external_search(papers.len(), true),
            Err(e) => {
                tracing::warn!(error = %e, "arXiv search failed");
                crate::metrics::record_external_search(0, false);
            }
        }

        result
    }
}

#[async_trait::async_trait]
impl PaperSearch for ArxivClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<ArxivPaper>> {
        ArxivClient::search(self, query, max_results).await
    }
}

/// Parse an arXiv Atom feed into at most `max_results` papers
pub fn parse_feed(body: &[u8], max_results: usize) -> Result<Vec<ArxivPaper>> {
    let feed = parser::parse(body)
        .map_err(|e| AppError::upstream("arxiv", format!("Failed to parse Atom feed: {}", e)))?;

    let papers = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let title = entry
                .title
                .as_ref()
                .map(|t| collapse_whitespace(&t.content))
                .unwrap_or_default();
            let abstract_text = entry
                .summary
                .as_ref()
                .map(|s| collapse_whitespace(&s.content))
                .unwrap_or_default();

            if title.is_empty() && abstract_text.is_empty() {
                return None;
            }

            let authors = entry
                .authors
                .iter()
                .map(|author| author.name.trim())
                .collect::<Vec<_>>()
                .join(", ");
            let published = entry
                .published
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            let url = entry
                .links
                .iter()
                .find(|link| link.rel.as_deref() == Some("alternate"))
                .or_else(|| entry.links.first())
                .map(|link| link.href.clone())
                .unwrap_or_else(|| entry.id.clone());

            Some(ArxivPaper {
                title,
                authors,
                abstract_text,
                published,
                url,
            })
        })
        .take(max_results)
        .collect();

    Ok(papers)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
