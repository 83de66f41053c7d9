//! HTTP boundary for the summarization pipeline.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Liveness message |
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/summarize` | Multipart upload (`file`, optional `length`) → `{summary, stats}` |
//! | `POST` | `/download` | JSON `{summary}` → `summary.docx` |
//!
//! # Error Contract
//!
//! Every failure is a JSON body with a single `error` string:
//!
//! ```json
//! { "error": "unsupported file type: slides.pptx" }
//! ```
//!
//! Status codes: 400 for anything wrong with the upload (unsupported type,
//! undecodable or corrupt document, no words, bad multipart), 413 when the
//! body exceeds `server.max_upload_bytes`, 500 for model failures and 504
//! when a request runs past `server.request_timeout_secs`.
//!
//! A timed-out request drops its summarize call: the local model stops
//! decoding at its next step and an in-flight Ollama request is abandoned.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser front-ends on
//! any host can call the API.

use anyhow::Context;
use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{Config, ServerConfig};
use crate::download::{build_summary_docx, SUMMARY_FILENAME};
use crate::models::{DocumentFormat, DownloadRequest, LengthTier, SummaryResult};
use crate::pipeline::{Pipeline, PipelineError};
use crate::summarizer::Summarizer;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    pipeline: Pipeline,
    /// Bound on one `/summarize` call.
    request_timeout: Duration,
}

/// Build the application router around `pipeline`.
///
/// Exposed separately from [`run_server`] so tests can drive it in-process.
pub fn router(pipeline: Pipeline, config: &ServerConfig) -> Router {
    let state = AppState {
        pipeline,
        request_timeout: Duration::from_secs(config.request_timeout_secs),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/summarize", post(handle_summarize))
        .route("/download", post(handle_download))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on `[server].bind` and run until the process exits.
///
/// The summarizer is loaded by the caller and shared read-only by every
/// request.
pub async fn run_server(config: &Config, summarizer: Arc<dyn Summarizer>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let pipeline = Pipeline::new(summarizer);
    let model = pipeline.model_name().to_string();
    let app = router(pipeline, &config.server);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!(bind = %bind_addr, model = %model, "summarizer API listening");

    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError {
        status: err.status(),
        message: err.body_text(),
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let status = match err {
            PipelineError::Summarization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PipelineError::UnsupportedFormat(_)
            | PipelineError::Decode(_)
            | PipelineError::Format(_)
            | PipelineError::DivisionUndefined => StatusCode::BAD_REQUEST,
        };
        AppError {
            status,
            message: err.to_string(),
        }
    }
}

// ============ GET / and GET /health ============

async fn handle_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Document summarizer API is running" }))
}

#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /summarize ============

struct Upload {
    filename: String,
    bytes: Vec<u8>,
    tier: LengthTier,
}

/// Collect the `file` and `length` fields; other fields are ignored.
async fn read_upload(multipart: &mut Multipart) -> Result<Upload, AppError> {
    let mut file = None;
    let mut tier = LengthTier::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| bad_request("file field must include a filename"))?;
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((filename, bytes.to_vec()));
            }
            "length" => {
                let label = field.text().await.map_err(multipart_error)?;
                tier = LengthTier::from_label(&label);
            }
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or_else(|| bad_request("missing multipart field: file"))?;
    Ok(Upload {
        filename,
        bytes,
        tier,
    })
}

/// Handler for `POST /summarize`.
async fn handle_summarize(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SummaryResult>, AppError> {
    let mut multipart = multipart.map_err(|e| AppError {
        status: e.status(),
        message: e.body_text(),
    })?;
    let upload = read_upload(&mut multipart).await?;

    let span = tracing::info_span!(
        "summarize",
        request_id = %Uuid::new_v4(),
        filename = %upload.filename,
        bytes = upload.bytes.len(),
        tier = %upload.tier,
    );
    let run = state
        .pipeline
        .summarize_named(&upload.filename, upload.bytes, upload.tier);

    match tokio::time::timeout(state.request_timeout, run)
        .instrument(span.clone())
        .await
    {
        Ok(result) => Ok(Json(result?)),
        Err(_) => {
            span.in_scope(|| {
                tracing::warn!(timeout_secs = state.request_timeout.as_secs(), "summarize timed out")
            });
            Err(AppError {
                status: StatusCode::GATEWAY_TIMEOUT,
                message: format!(
                    "summarization timed out after {}s",
                    state.request_timeout.as_secs()
                ),
            })
        }
    }
}

// ============ POST /download ============

/// Handler for `POST /download`.
async fn handle_download(Json(request): Json<DownloadRequest>) -> Result<Response, AppError> {
    let bytes = build_summary_docx(&request.summary).map_err(|e| AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: e.to_string(),
    })?;

    let headers = [
        (
            header::CONTENT_TYPE,
            DocumentFormat::WordDocument.media_type().to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", SUMMARY_FILENAME),
        ),
    ];
    Ok((headers, bytes).into_response())
}
