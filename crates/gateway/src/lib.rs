//! PaperMind API Gateway
//!
//! HTTP surface for paper upload, search, summarization, literature review,
//! and user management.

pub mod handlers;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use papermind_common::{
    agents::{LitReviewAgent, ResearchAgent, SummarizerAgent},
    arxiv::PaperSearch,
    config::AppConfig,
    db::{DbPool, Repository},
    embeddings::Embedder,
    llm::ChatModel,
    metrics,
    vector::VectorIndex,
};
use papermind_ingestion::{IngestionProcessor, UploadStore};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repo: Repository,
    pub index: Arc<dyn VectorIndex>,
    pub summarizer: SummarizerAgent,
    pub research: ResearchAgent,
    pub lit_review: LitReviewAgent,
    pub processor: IngestionProcessor,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire agents and the upload pipeline from their dependencies
    pub fn new(
        config: Arc<AppConfig>,
        db: DbPool,
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
        index: Arc<dyn VectorIndex>,
        papers: Arc<dyn PaperSearch>,
    ) -> Self {
        let repo = Repository::new(db);
        let temperature = config.llm.temperature;

        Self {
            summarizer: SummarizerAgent::new(chat.clone(), temperature),
            research: ResearchAgent::new(embedder.clone(), index.clone()),
            lit_review: LitReviewAgent::new(
                embedder.clone(),
                index.clone(),
                chat,
                papers,
                temperature,
            ),
            processor: IngestionProcessor::new(
                repo.clone(),
                UploadStore::new(config.storage.upload_dir.clone()),
                embedder,
                index.clone(),
            ),
            repo,
            index,
            config,
            metrics_handle: None,
        }
    }

    /// Serve `/metrics` from this Prometheus recorder
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}

/// Prometheus builder with bucketed latency histograms
pub fn prometheus_builder() -> Result<PrometheusBuilder, BuildError> {
    metrics::histogram_buckets()
        .into_iter()
        .try_fold(PrometheusBuilder::new(), |builder, (name, buckets)| {
            builder.set_buckets_for_metric(Matcher::Full(name), buckets)
        })
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    use handlers::{health, papers, review, search, users};

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let max_upload = state.config.server.max_upload_bytes;
    let timeout = state.config.request_timeout();

    Router::new()
        .route("/", get(handlers::root))
        // Health endpoints
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/metrics", get(health::metrics))
        // User endpoints
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/", get(users::list_users).post(users::create_user))
        .route("/users/{id}", get(users::get_user))
        // Paper endpoints
        .route("/papers", get(papers::list_papers).post(papers::upload_paper))
        .route("/papers/", get(papers::list_papers).post(papers::upload_paper))
        .route("/papers/search", get(search::search_papers))
        .route("/papers/{id}", get(papers::get_paper))
        .route("/papers/summarize/{id}", post(papers::summarize_paper))
        .route("/papers/literature_review/{mode}", post(review::literature_review))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(axum::middleware::from_fn(middleware::track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}
