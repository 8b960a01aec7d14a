//! Metrics and observability utilities
//!
//! Prometheus metrics with a shared prefix. Recording is a no-op until a
//! recorder is installed, so library code can call these freely in tests.

use metrics::{counter, describe_counter, describe_histogram, gauge, describe_gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all PaperMind metrics
pub const METRICS_PREFIX: &str = "papermind";

/// Histogram buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.00, 30.00,
];

/// Buckets for LLM and embedding calls (typically slower)
pub const LLM_BUCKETS: &[f64] = &[0.100, 0.250, 0.500, 1.000, 2.000, 5.000, 10.00, 30.00, 60.00];

/// Histograms that get explicit buckets instead of the exporter's summary
pub fn histogram_buckets() -> Vec<(String, &'static [f64])> {
    vec![
        (format!("{}_request_duration_seconds", METRICS_PREFIX), LATENCY_BUCKETS),
        (format!("{}_search_duration_seconds", METRICS_PREFIX), LATENCY_BUCKETS),
        // uploads include an embedding call
        (format!("{}_upload_duration_seconds", METRICS_PREFIX), LLM_BUCKETS),
        (format!("{}_llm_duration_seconds", METRICS_PREFIX), LLM_BUCKETS),
    ]
}

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of similarity searches"
    );

    describe_histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Similarity search latency in seconds"
    );

    describe_gauge!(
        format!("{}_search_results_count", METRICS_PREFIX),
        Unit::Count,
        "Number of results returned by the last search"
    );

    describe_counter!(
        format!("{}_papers_uploaded_total", METRICS_PREFIX),
        Unit::Count,
        "Total papers uploaded"
    );

    describe_histogram!(
        format!("{}_upload_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Upload processing latency in seconds"
    );

    describe_counter!(
        format!("{}_llm_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total LLM API requests (chat and embedding)"
    );

    describe_histogram!(
        format!("{}_llm_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "LLM API latency in seconds"
    );

    describe_counter!(
        format!("{}_external_searches_total", METRICS_PREFIX),
        Unit::Count,
        "Total arXiv searches"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record a similarity search against the vector index
pub fn record_search(duration_secs: f64, backend: &str, result_count: usize) {
    counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        "backend" => backend.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        "backend" => backend.to_string()
    )
    .record(duration_secs);

    gauge!(
        format!("{}_search_results_count", METRICS_PREFIX),
        "backend" => backend.to_string()
    )
    .set(result_count as f64);
}

/// Record an uploaded paper; `indexed` is false when embedding failed
pub fn record_upload(duration_secs: f64, indexed: bool) {
    counter!(
        format!("{}_papers_uploaded_total", METRICS_PREFIX),
        "indexed" => indexed.to_string()
    )
    .increment(1);

    histogram!(format!("{}_upload_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

/// Record a chat or embedding API call
pub fn record_llm_call(kind: &str, duration_secs: f64, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_llm_requests_total", METRICS_PREFIX),
        "kind" => kind.to_string(),
        "status" => status
    )
    .increment(1);

    histogram!(
        format!("{}_llm_duration_seconds", METRICS_PREFIX),
        "kind" => kind.to_string()
    )
    .record(duration_secs);
}

/// Record an arXiv search
pub fn record_external_search(result_count: usize, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_external_searches_total", METRICS_PREFIX),
        "status" => status
    )
    .increment(1);

    tracing::debug!(result_count, status, "External search recorded");
}
