//! Search handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use papermind_common::{errors::Result, SearchHit};

fn default_top_k() -> usize {
    3
}

/// Query string for `/papers/search`
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,

    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

/// Semantic search over uploaded papers
pub async fn search_papers(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    let results = state
        .research
        .find_relevant_papers(&params.query, params.top_k)
        .await?;

    Ok(Json(SearchResponse { results }))
}
