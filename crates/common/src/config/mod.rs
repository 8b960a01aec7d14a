//! Configuration management for PaperMind services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/config.yaml, config/local)
//! - Legacy variables OPENAI_API_KEY and DATABASE_URL
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// LLM provider configuration (embeddings and chat)
    #[serde(default)]
    pub llm: LlmConfig,

    /// Vector index configuration
    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    /// arXiv search configuration
    #[serde(default)]
    pub arxiv: ArxivConfig,

    /// Raw upload storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum accepted upload size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL (postgres:// or sqlite:)
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Provider: openai, mock
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    /// API key for the provider
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Chat completion model
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Embedding model
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Sampling temperature for chat completions
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for embedding requests
    #[serde(default = "default_llm_retries")]
    pub max_retries: u32,
}

/// Which vector index backs similarity search
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreKind {
    Memory,
    Pinecone,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VectorStoreConfig {
    /// Backend: memory, pinecone
    #[serde(default = "default_vector_kind", alias = "type")]
    pub kind: VectorStoreKind,

    /// Pinecone API key
    pub api_key: Option<String>,

    /// Pinecone index name
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Vector dimension used when creating the index
    #[serde(default = "default_index_dimension")]
    pub dimension: usize,

    /// Distance metric used when creating the index
    #[serde(default = "default_metric")]
    pub metric: String,

    /// Serverless cloud
    #[serde(default = "default_cloud")]
    pub cloud: String,

    /// Serverless region
    #[serde(default = "default_region", alias = "environment")]
    pub region: String,

    /// Pinecone control plane URL
    #[serde(default = "default_pinecone_controller")]
    pub controller_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArxivConfig {
    /// arXiv query endpoint
    #[serde(default = "default_arxiv_url")]
    pub api_url: String,

    /// Default number of external results
    #[serde(default = "default_arxiv_max_results")]
    pub max_results: usize,

    /// Request timeout in seconds
    #[serde(default = "default_arxiv_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory where raw uploads are written
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Install the Prometheus recorder and serve /metrics
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,

    /// Service name reported in logs
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_request_timeout() -> u64 { 120 }
fn default_max_upload_bytes() -> usize { 50 * 1024 * 1024 }
fn default_database_url() -> String { "postgres://localhost/papermind".to_string() }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_llm_provider() -> String { "openai".to_string() }
fn default_api_base() -> String { "https://api.openai.com/v1".to_string() }
fn default_chat_model() -> String { crate::DEFAULT_CHAT_MODEL.to_string() }
fn default_embedding_model() -> String { crate::DEFAULT_EMBEDDING_MODEL.to_string() }
fn default_temperature() -> f32 { 0.7 }
fn default_llm_timeout() -> u64 { 60 }
fn default_llm_retries() -> u32 { 3 }
fn default_vector_kind() -> VectorStoreKind { VectorStoreKind::Memory }
fn default_index_name() -> String { "my-index".to_string() }
fn default_index_dimension() -> usize { crate::DEFAULT_EMBEDDING_DIMENSION }
fn default_metric() -> String { "cosine".to_string() }
fn default_cloud() -> String { "aws".to_string() }
fn default_region() -> String { "us-east-1".to_string() }
fn default_pinecone_controller() -> String { "https://api.pinecone.io".to_string() }
fn default_arxiv_url() -> String { "http://export.arxiv.org/api/query".to_string() }
fn default_arxiv_max_results() -> usize { 3 }
fn default_arxiv_timeout() -> u64 { 30 }
fn default_upload_dir() -> PathBuf { PathBuf::from("data/raw") }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_metrics_enabled() -> bool { true }
fn default_service_name() -> String { "papermind".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            api_key: None,
            api_base: default_api_base(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
            max_retries: default_llm_retries(),
        }
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            kind: default_vector_kind(),
            api_key: None,
            index_name: default_index_name(),
            dimension: default_index_dimension(),
            metric: default_metric(),
            cloud: default_cloud(),
            region: default_region(),
            controller_url: default_pinecone_controller(),
        }
    }
}

impl Default for ArxivConfig {
    fn default() -> Self {
        Self {
            api_url: default_arxiv_url(),
            max_results: default_arxiv_max_results(),
            timeout_secs: default_arxiv_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { upload_dir: default_upload_dir() }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_enabled: default_metrics_enabled(),
            service_name: default_service_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Deployment config (config/config.yaml)
            .add_source(File::with_name("config/config").required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            // Legacy variables win over everything else
            .set_override_option("llm.api_key", std::env::var("OPENAI_API_KEY").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific file (TOML, YAML or JSON by extension)
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            llm: LlmConfig::default(),
            vector_store: VectorStoreConfig::default(),
            arxiv: ArxivConfig::default(),
            storage: StorageConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}
