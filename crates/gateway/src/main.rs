//! PaperMind API Gateway binary

use anyhow::Context;
use papermind_common::{
    arxiv::ArxivClient, config::AppConfig, db::DbPool, embeddings, llm, metrics, vector,
};
use papermind_gateway::{create_router, prometheus_builder, AppState};
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;
    let config = Arc::new(config);

    init_tracing(&config);

    info!(
        service = %config.observability.service_name,
        "Starting PaperMind API Gateway v{}",
        papermind_common::VERSION
    );

    // Initialize metrics
    let metrics_handle = if config.observability.metrics_enabled {
        let handle = prometheus_builder()
            .context("Invalid histogram buckets")?
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        metrics::register_metrics();
        Some(handle)
    } else {
        None
    };

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;
    db.ensure_schema().await?;

    // External services
    let embedder = embeddings::create_embedder(&config.llm)?;
    let chat = llm::create_chat_model(&config.llm)?;
    let index = vector::create_vector_index(&config.vector_store).await?;
    let arxiv = Arc::new(ArxivClient::new(&config.arxiv)?);

    info!(
        embedding_model = embedder.model_name(),
        chat_model = chat.model_name(),
        vector_backend = index.backend(),
        "Services initialized"
    );

    let mut state = AppState::new(config.clone(), db, embedder, chat, index, arxiv);
    if let Some(handle) = metrics_handle {
        state = state.with_metrics(handle);
    }

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = config.bind_address();
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
