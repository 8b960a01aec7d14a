//! HTTP integration tests for the PaperMind API
//!
//! Each test builds the router over an in-memory SQLite database, mock LLM
//! clients, an in-memory vector index, and a temporary upload directory, then
//! drives it with `oneshot`.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use papermind_common::{
    arxiv::{ArxivPaper, PaperSearch},
    config::AppConfig,
    db::DbPool,
    embeddings::MockEmbedder,
    llm::MockChat,
    vector::InMemoryVectorStore,
    Result,
};
use papermind_gateway::{create_router, prometheus_builder, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "papermind-test-boundary";

struct FixedSearch(Vec<ArxivPaper>);

#[async_trait]
impl PaperSearch for FixedSearch {
    async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<ArxivPaper>> {
        Ok(self.0.iter().take(max_results).cloned().collect())
    }
}

struct TestApp {
    router: Router,
    uploads: TempDir,
}

impl TestApp {
    fn stored_uploads(&self) -> usize {
        std::fs::read_dir(self.uploads.path()).unwrap().count()
    }
}

async fn test_app() -> TestApp {
    let uploads = tempfile::tempdir().unwrap();

    let mut config = AppConfig::default();
    config.database.url = "sqlite::memory:".to_string();
    config.database.max_connections = 1;
    config.database.min_connections = 1;
    config.storage.upload_dir = uploads.path().to_path_buf();
    config.server.max_upload_bytes = 1024 * 1024;

    let db = DbPool::new(&config.database).await.unwrap();
    db.ensure_schema().await.unwrap();

    let arxiv = FixedSearch(vec![ArxivPaper {
        title: "Robot Learning".to_string(),
        authors: "Grace Hopper".to_string(),
        abstract_text: "robot arm control with reinforcement learning".to_string(),
        published: "2022-05-01".to_string(),
        url: "http://arxiv.org/abs/2205.00001v1".to_string(),
    }]);

    let state = AppState::new(
        Arc::new(config),
        db,
        Arc::new(MockEmbedder::new(256)),
        Arc::new(MockChat::new()),
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(arxiv),
    );

    TestApp {
        router: create_router(state),
        uploads,
    }
}

fn sample_pdf(text: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: &TestApp, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: &TestApp, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn upload(app: &TestApp, fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> (StatusCode, Value) {
    let request = Request::post("/papers/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(fields, file)))
        .unwrap();
    send(app, request).await
}

async fn upload_pdf(app: &TestApp, title: &str, abstract_text: &str, text: &str) -> Value {
    let pdf = sample_pdf(text);
    let (status, body) = upload(
        app,
        &[("title", title), ("abstract", abstract_text)],
        Some(("paper.pdf", &pdf)),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "upload failed: {body}");
    body
}

#[tokio::test]
async fn test_root_and_health() {
    let app = test_app().await;

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to the AI Academic Research Assistant API");

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = get(&app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["database"]["status"], "up");
    assert_eq!(body["checks"]["vector_store"]["backend"], "memory");
}

#[tokio::test]
async fn test_metrics_without_recorder_is_not_found() {
    let app = test_app().await;
    let (status, _) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_is_returned() {
    let app = test_app().await;
    let response = app
        .router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_create_and_list_users() {
    let app = test_app().await;

    let (status, user) = post_json(
        &app,
        "/users/",
        json!({"username": "alice", "email": "alice@example.com", "password": "s3cret"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["username"], "alice");
    assert_eq!(user["email"], "alice@example.com");
    assert!(user.get("password").is_none());
    assert!(user.get("password_hash").is_none());

    let (status, users) = get(&app, "/users/").await;
    assert_eq!(status, StatusCode::OK);
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], user["id"]);

    let (status, fetched) = get(&app, &format!("/users/{}", user["id"])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["username"], "alice");
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let app = test_app().await;
    let body = json!({"username": "bob", "email": "bob@example.com", "password": "pw"});

    let (status, _) = post_json(&app, "/users/", body).await;
    assert_eq!(status, StatusCode::OK);

    let (status, error) = post_json(
        &app,
        "/users",
        json!({"username": "bob", "email": "other@example.com", "password": "pw"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Username already taken."));
    assert_eq!(error["error"]["field"], "username");

    let (status, error) = post_json(
        &app,
        "/users",
        json!({"username": "bobby", "email": "bob@example.com", "password": "pw"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["field"], "email");
}

#[tokio::test]
async fn test_concurrent_duplicate_user_is_bad_request() {
    let app = test_app().await;
    let body = json!({"username": "ada", "email": "ada@example.com", "password": "pw"});

    let (first, second) = tokio::join!(
        post_json(&app, "/users/", body.clone()),
        post_json(&app, "/users/", body),
    );

    let mut statuses = [first.0.as_u16(), second.0.as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, [200, 400]);

    let error = if first.0 == StatusCode::BAD_REQUEST { first.1 } else { second.1 };
    assert_eq!(error["error"]["code"], "VALIDATION_ERROR");
    assert!(!error["error"]["message"].as_str().unwrap().contains("UNIQUE"));

    let (_, users) = get(&app, "/users/").await;
    assert_eq!(users.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_email_rejected() {
    let app = test_app().await;
    let (status, error) = post_json(
        &app,
        "/users/",
        json!({"username": "carol", "email": "not-an-email", "password": "pw"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["field"], "email");
}

#[tokio::test]
async fn test_missing_user_and_paper() {
    let app = test_app().await;

    let (status, error) = get(&app, "/users/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"]["message"], "User not found.");

    let (status, error) = get(&app, "/papers/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"]["message"], "Paper not found.");

    let (status, _) = send(
        &app,
        Request::post("/papers/summarize/42").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_list_get_summarize() {
    let app = test_app().await;

    let paper = upload_pdf(
        &app,
        "Protein Folding",
        "We fold proteins.",
        "Deep learning predicts protein folding structures",
    )
    .await;
    assert_eq!(paper["title"], "Protein Folding");
    assert_eq!(paper["abstract"], "We fold proteins.");
    assert!(paper["content"].as_str().unwrap().contains("protein folding"));

    let (status, papers) = get(&app, "/papers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(papers.as_array().unwrap().len(), 1);

    let (status, fetched) = get(&app, &format!("/papers/{}", paper["id"])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "Protein Folding");

    let (status, summary) = send(
        &app,
        Request::post(format!("/papers/summarize/{}", paper["id"]))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let summary = summary["summary"].as_str().unwrap();
    assert!(summary.starts_with("[mock completion] Summarize the following text:"));
    assert!(summary.contains("Deep learning"));
}

#[tokio::test]
async fn test_upload_is_searchable() {
    let app = test_app().await;

    let folding = upload_pdf(&app, "Folding", "", "protein folding with attention").await;
    let robots = upload_pdf(&app, "Robots", "", "robot arm control policies").await;

    let (status, body) = get(&app, "/papers/search?query=robot%20arm%20control").await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["paper_id"], robots["id"]);
    assert_eq!(results[0]["metadata"]["title"], "Robots");
    assert_eq!(results[1]["paper_id"], folding["id"]);

    let (_, body) = get(&app, "/papers/search?query=protein&top_k=1").await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["paper_id"], folding["id"]);
}

#[tokio::test]
async fn test_search_requires_query() {
    let app = test_app().await;
    for uri in ["/papers/search", "/papers/search?query=%20%20"] {
        let (status, error) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"]["field"], "query");
    }
}

#[tokio::test]
async fn test_upload_validation() {
    let app = test_app().await;
    let pdf = sample_pdf("text");

    let (status, error) = upload(&app, &[("abstract", "a")], Some(("paper.pdf", &pdf))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["field"], "title");

    let (status, error) = upload(&app, &[("title", "No file")], None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["field"], "file");

    let (status, _) = upload(
        &app,
        &[("title", "Not a PDF")],
        Some(("notes.txt", b"just some text")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, papers) = get(&app, "/papers/").await;
    assert!(papers.as_array().unwrap().is_empty());
    assert_eq!(app.stored_uploads(), 0);
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let app = test_app().await;
    let oversized = vec![b'x'; 2 * 1024 * 1024];

    let (status, error) = upload(
        &app,
        &[("title", "Too big")],
        Some(("huge.pdf", &oversized)),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(error["error"]["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(app.stored_uploads(), 0);
}

#[tokio::test]
async fn test_literature_review_modes() {
    let app = test_app().await;
    upload_pdf(&app, "Robot Control", "robot arm control", "robot arm control policies").await;
    upload_pdf(&app, "Folding", "protein folding", "protein folding").await;

    let (status, review) = post_json(
        &app,
        "/papers/literature_review/local",
        json!({"text": "robot arm control", "top_k": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(review["mode"], "local");
    assert_eq!(review["query"], "robot arm control");
    let papers = review["papers"].as_array().unwrap();
    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0]["title"], "Robot Control");
    assert_eq!(papers[0]["source"], "local");

    let (status, review) = post_json(
        &app,
        "/papers/literature_review/external",
        json!({"text": "robot arm control"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let papers = review["papers"].as_array().unwrap();
    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0]["source"], "arxiv");
    assert_eq!(papers[0]["authors"], "Grace Hopper");

    let (status, review) = post_json(
        &app,
        "/papers/literature_review/full",
        json!({"text": "robot arm control", "explain": true}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let papers = review["papers"].as_array().unwrap();
    assert_eq!(papers.len(), 3);
    let scores: Vec<f64> = papers
        .iter()
        .map(|p| p["similarity_score"].as_f64().unwrap())
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    assert!(papers.iter().all(|p| p["explanation"].is_string()));
}

#[tokio::test]
async fn test_literature_review_rejects_bad_input() {
    let app = test_app().await;

    let (status, error) = post_json(
        &app,
        "/papers/literature_review/everything",
        json!({"text": "anything"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"]["field"], "mode");

    for text in ["", "   "] {
        let (status, error) =
            post_json(&app, "/papers/literature_review/local", json!({"text": text})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"]["field"], "text");
    }
}

#[test]
fn test_prometheus_histograms_are_bucketed() {
    let recorder = prometheus_builder().unwrap().build_recorder();
    let handle = recorder.handle();

    metrics::with_local_recorder(&recorder, || {
        papermind_common::metrics::record_llm_call("chat", 1.5, true);
        papermind_common::metrics::RequestMetrics::start("GET", "/health").finish(200);
    });

    let rendered = handle.render();
    assert!(rendered.contains("papermind_llm_duration_seconds_bucket"));
    assert!(rendered.contains("papermind_request_duration_seconds_bucket"));
}
