//! Paper management handlers

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::AppState;
use papermind_common::{
    db::models::Paper,
    errors::{AppError, Result},
};
use papermind_ingestion::UploadedPaper;

/// Summary response
#[derive(Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

/// List all papers
pub async fn list_papers(State(state): State<AppState>) -> Result<Json<Vec<Paper>>> {
    Ok(Json(state.repo.list_papers().await?))
}

/// Get a paper by ID
pub async fn get_paper(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Paper>> {
    find_paper(&state, id).await.map(Json)
}

/// Upload a PDF as multipart form data with `title`, optional `abstract`,
/// and `file` fields
pub async fn upload_paper(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Paper>> {
    let limit = state.config.server.max_upload_bytes;

    let mut title = None;
    let mut abstract_text = String::new();
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        match field.name() {
            Some("title") => {
                title = Some(field.text().await.map_err(|e| multipart_error(e, limit))?);
            }
            Some("abstract") => {
                abstract_text = field.text().await.map_err(|e| multipart_error(e, limit))?;
            }
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload.pdf").to_string();
                let bytes = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
                file = Some((filename, bytes.to_vec()));
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unknown multipart field");
            }
        }
    }

    let title = title.ok_or_else(|| AppError::MissingField {
        field: "title".to_string(),
    })?;
    let (filename, bytes) = file.ok_or_else(|| AppError::MissingField {
        field: "file".to_string(),
    })?;

    let paper = state
        .processor
        .ingest_upload(UploadedPaper {
            title,
            abstract_text,
            filename,
            bytes,
        })
        .await?;

    Ok(Json(paper))
}

/// Summarize a paper's extracted text
pub async fn summarize_paper(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SummaryResponse>> {
    let paper = find_paper(&state, id).await?;

    let summary = state
        .summarizer
        .summarize_text(paper.content.as_deref().unwrap_or_default())
        .await;

    Ok(Json(SummaryResponse { summary }))
}

async fn find_paper(state: &AppState, id: i32) -> Result<Paper> {
    state
        .repo
        .find_paper_by_id(id)
        .await?
        .ok_or(AppError::PaperNotFound { id: id.to_string() })
}

fn multipart_error(e: MultipartError, limit: usize) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge { size: limit + 1, limit }
    } else {
        AppError::InvalidFormat {
            message: e.body_text(),
        }
    }
}
