//! Pinecone serverless index over the REST API

use super::{Metadata, SearchHit, VectorIndex};
use crate::config::VectorStoreConfig;
use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const API_VERSION: &str = "2024-07";

#[derive(Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexDescription>,
}

#[derive(Deserialize)]
struct IndexDescription {
    name: String,
    #[serde(default)]
    host: Option<String>,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: String,
    values: &'a [f32],
    metadata: &'a Metadata,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Metadata>,
}

/// Remote vector index hosted by Pinecone
pub struct PineconeVectorStore {
    client: reqwest::Client,
    api_key: String,
    index_name: String,
    host: String,
}

impl PineconeVectorStore {
    /// Connect to the configured index, creating it if it does not exist
    pub async fn connect(config: &VectorStoreConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::Configuration {
                message: "Pinecone API key required (vector_store.api_key)".to_string(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        let controller = config.controller_url.trim_end_matches('/').to_string();

        let existing: IndexList = client
            .get(format!("{}/indexes", controller))
            .header("Api-Key", &api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await
            .map_err(pinecone_error)?
            .error_for_status()
            .map_err(pinecone_error)?
            .json()
            .await
            .map_err(pinecone_error)?;

        if !existing.indexes.iter().any(|i| i.name == config.index_name) {
            tracing::info!(
                index = %config.index_name,
                dimension = config.dimension,
                metric = %config.metric,
                "Creating Pinecone index"
            );

            client
                .post(format!("{}/indexes", controller))
                .header("Api-Key", &api_key)
                .header("X-Pinecone-API-Version", API_VERSION)
                .json(&json!({
                    "name": config.index_name,
                    "dimension": config.dimension,
                    "metric": config.metric,
                    "spec": {
                        "serverless": {
                            "cloud": config.cloud,
                            "region": config.region,
                        }
                    }
                }))
                .send()
                .await
                .map_err(pinecone_error)?
                .error_for_status()
                .map_err(pinecone_error)?;
        }

        let description: IndexDescription = client
            .get(format!("{}/indexes/{}", controller, config.index_name))
            .header("Api-Key", &api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await
            .map_err(pinecone_error)?
            .error_for_status()
            .map_err(pinecone_error)?
            .json()
            .await
            .map_err(pinecone_error)?;

        let host = description.host.filter(|h| !h.is_empty()).ok_or_else(|| {
            AppError::VectorStore {
                message: format!("Pinecone index {} has no host yet", config.index_name),
            }
        })?;

        tracing::info!(index = %config.index_name, host = %host, "Connected to Pinecone index");

        Ok(Self {
            client,
            api_key,
            index_name: config.index_name.clone(),
            host: normalize_host(&host),
        })
    }

    /// Name of the backing index
    pub fn index_name(&self) -> &str {
        &self.index_name
    }
}

fn pinecone_error(e: reqwest::Error) -> AppError {
    AppError::VectorStore {
        message: format!("Pinecone request failed: {}", e),
    }
}

fn normalize_host(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", host.trim_end_matches('/'))
    }
}

/// Convert query matches into hits, skipping ids that are not paper ids
fn hits_from_matches(matches: Vec<QueryMatch>) -> Vec<SearchHit> {
    matches
        .into_iter()
        .filter_map(|m| match m.id.parse::<i32>() {
            Ok(paper_id) => Some(SearchHit {
                paper_id,
                score: m.score,
                metadata: m.metadata.unwrap_or_default(),
            }),
            Err(_) => {
                tracing::warn!(id = %m.id, "Skipping Pinecone match with non-numeric id");
                None
            }
        })
        .collect()
}

#[async_trait::async_trait]
impl VectorIndex for PineconeVectorStore {
    async fn add_document(
        &self,
        paper_id: i32,
        embedding: Vec<f32>,
        metadata: Metadata,
    ) -> Result<()> {
        let vector = UpsertVector {
            id: paper_id.to_string(),
            values: &embedding,
            metadata: &metadata,
        };

        self.client
            .post(format!("{}/vectors/upsert", self.host))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&json!({ "vectors": [vector] }))
            .send()
            .await
            .map_err(pinecone_error)?
            .error_for_status()
            .map_err(pinecone_error)?;

        tracing::debug!(paper_id, index = %self.index_name, "Upserted embedding");
        Ok(())
    }

    async fn similarity_search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let response: QueryResponse = self
            .client
            .post(format!("{}/query", self.host))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&json!({
                "vector": query_embedding,
                "topK": top_k,
                "includeMetadata": true,
            }))
            .send()
            .await
            .map_err(pinecone_error)?
            .error_for_status()
            .map_err(pinecone_error)?
            .json()
            .await
            .map_err(pinecone_error)?;

        Ok(hits_from_matches(response.matches))
    }

    fn backend(&self) -> &'static str {
        "pinecone"
    }
}
