//! PaperMind Common Library
//!
//! Shared code for the PaperMind services including:
//! - Database models and repository patterns
//! - Embedding and chat LLM client abstractions
//! - Vector index (in-memory and Pinecone)
//! - arXiv search client
//! - Research, summarization, and literature-review agents
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod agents;
pub mod arxiv;
pub mod auth;
pub mod config;
pub mod db;
pub mod embeddings;
pub mod errors;
pub mod llm;
pub mod metrics;
pub mod vector;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use db::{DbPool, Repository};
pub use embeddings::Embedder;
pub use llm::ChatModel;
pub use vector::{SearchHit, VectorIndex};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Default embedding dimension (text-embedding-ada-002)
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1536;

/// Default chat completion model
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
