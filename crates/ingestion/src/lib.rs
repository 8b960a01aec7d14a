//! PaperMind ingestion
//!
//! Turns an uploaded PDF into a stored, searchable paper.

pub mod errors;
pub mod pdf;
pub mod processor;
pub mod storage;

pub use errors::IngestionError;
pub use processor::{IngestionProcessor, UploadedPaper};
pub use storage::UploadStore;
