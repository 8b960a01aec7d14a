//! Literature review handler

use axum::{
    extract::{Path, State},
    Json,
};

use crate::AppState;
use papermind_common::{
    agents::{LiteratureReview, LiteratureReviewRequest, ReviewMode},
    errors::Result,
};

/// Recommend papers for a research description. `mode` is one of
/// `local`, `external`, or `full`.
pub async fn literature_review(
    State(state): State<AppState>,
    Path(mode): Path<String>,
    Json(request): Json<LiteratureReviewRequest>,
) -> Result<Json<LiteratureReview>> {
    let mode: ReviewMode = mode.parse()?;
    let review = state.lit_review.review(mode, &request).await?;
    Ok(Json(review))
}
