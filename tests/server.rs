use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use tower::ServiceExt;

use docsum::config::ServerConfig;
use docsum::extract::extract_text;
use docsum::models::{DocumentFormat, LengthBounds};
use docsum::pipeline::Pipeline;
use docsum::server::router;
use docsum::summarizer::{DisabledSummarizer, SummarizeError, Summarizer};

const BOUNDARY: &str = "docsum-test-boundary";

/// Echoes the first `bounds.min` words.
struct LeadSummarizer;

#[async_trait]
impl Summarizer for LeadSummarizer {
    fn model_name(&self) -> &str {
        "lead"
    }

    async fn summarize(&self, text: &str, bounds: LengthBounds) -> Result<String, SummarizeError> {
        Ok(text
            .split_whitespace()
            .take(bounds.min)
            .collect::<Vec<_>>()
            .join(" "))
    }
}

/// Never finishes.
struct StuckSummarizer;

#[async_trait]
impl Summarizer for StuckSummarizer {
    fn model_name(&self) -> &str {
        "stuck"
    }

    async fn summarize(&self, _: &str, _: LengthBounds) -> Result<String, SummarizeError> {
        std::future::pending().await
    }
}

fn app_with(summarizer: Arc<dyn Summarizer>, config: ServerConfig) -> Router {
    router(Pipeline::new(summarizer), &config)
}

fn app() -> Router {
    app_with(Arc::new(LeadSummarizer), ServerConfig::default())
}

fn multipart_body(filename: &str, content: &[u8], length: Option<&str>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n",
            BOUNDARY, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n");
    if let Some(length) = length {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"length\"\r\n\r\n{}\r\n",
                BOUNDARY, length
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn summarize_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/summarize")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn root_reports_running() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Document summarizer API is running");
}

#[tokio::test]
async fn health_reports_version() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn summarize_text_upload() {
    let text = vec!["token"; 300].join(" ");
    let response = app()
        .oneshot(summarize_request(multipart_body(
            "notes.txt",
            text.as_bytes(),
            Some("short"),
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert!(json.get("error").is_none());
    assert_eq!(json["summary"].as_str().unwrap().split_whitespace().count(), 30);
    assert_eq!(json["stats"]["original_words"], 300);
    assert_eq!(json["stats"]["summary_words"], 30);
    assert_eq!(json["stats"]["reduction_percentage"], 90.0);
}

#[tokio::test]
async fn summarize_defaults_to_medium() {
    let text = vec!["token"; 300].join(" ");
    let response = app()
        .oneshot(summarize_request(multipart_body("notes.txt", text.as_bytes(), None)))
        .await
        .unwrap();
    let json = json_body(response).await;
    assert_eq!(json["stats"]["summary_words"], 60);
}

#[tokio::test]
async fn unsupported_type_is_bad_request() {
    let response = app()
        .oneshot(summarize_request(multipart_body("deck.pptx", b"abc", None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "unsupported file type: deck.pptx");
}

#[tokio::test]
async fn empty_document_is_bad_request() {
    let response = app()
        .oneshot(summarize_request(multipart_body("blank.txt", b"  \n ", None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("no extractable words"));
    assert!(json.get("summary").is_none());
}

#[tokio::test]
async fn missing_file_field_is_bad_request() {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"length\"\r\n\r\nshort\r\n--{b}--\r\n",
        b = BOUNDARY
    );
    let response = app()
        .oneshot(summarize_request(body.into_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "missing multipart field: file");
}

#[tokio::test]
async fn model_failure_is_server_error() {
    let app = app_with(Arc::new(DisabledSummarizer), ServerConfig::default());
    let response = app
        .oneshot(summarize_request(multipart_body("notes.txt", b"some words", None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("summarization error"));
}

#[tokio::test]
async fn slow_model_times_out() {
    let config = ServerConfig {
        request_timeout_secs: 1,
        ..ServerConfig::default()
    };
    let app = app_with(Arc::new(StuckSummarizer), config);
    let response = app
        .oneshot(summarize_request(multipart_body("notes.txt", b"some words", None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let config = ServerConfig {
        max_upload_bytes: 1024,
        ..ServerConfig::default()
    };
    let app = app_with(Arc::new(LeadSummarizer), config);
    let text = vec!["token"; 2000].join(" ");
    let response = app
        .oneshot(summarize_request(multipart_body("big.txt", text.as_bytes(), None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn download_returns_docx() {
    let request = Request::builder()
        .method("POST")
        .uri("/download")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"summary": "Hello world."}"#))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"summary.docx\""
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = extract_text(&bytes, DocumentFormat::WordDocument).unwrap();
    assert!(text.contains("Hello world."));
}

#[tokio::test]
async fn download_rejects_malformed_json() {
    let request = Request::builder()
        .method("POST")
        .uri("/download")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"text": 1}"#))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
