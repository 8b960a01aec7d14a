//! Ingestion error types

use papermind_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("PDF parse error: {message}")]
    PdfParseError { message: String },

    #[error("Required field missing: {0}")]
    MissingField(&'static str),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Storage error for {path}: {source}")]
    Storage {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Extraction task failed: {0}")]
    TaskFailed(String),

    #[error(transparent)]
    App(#[from] AppError),
}

impl From<IngestionError> for AppError {
    fn from(e: IngestionError) -> Self {
        match e {
            IngestionError::PdfParseError { message } => AppError::InvalidFormat {
                message: format!("Could not read PDF: {}", message),
            },
            IngestionError::MissingField(field) => AppError::MissingField {
                field: field.to_string(),
            },
            IngestionError::InvalidUpload(message) => AppError::Validation {
                message,
                field: None,
            },
            IngestionError::Storage { .. } | IngestionError::TaskFailed(_) => AppError::Internal {
                message: e.to_string(),
            },
            IngestionError::App(inner) => inner,
        }
    }
}
