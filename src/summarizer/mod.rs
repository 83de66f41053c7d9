//! Summarization engine abstraction and implementations.
//!
//! Defines the [`Summarizer`] trait and concrete implementations:
//! - **[`DisabledSummarizer`]**: returns errors; used when no model is configured.
//! - **[`OllamaSummarizer`]**: calls a local Ollama instance's `/api/generate` endpoint.
//! - **`LocalSummarizer`**: runs a BART-family ONNX model locally via tract; no
//!   network calls after the first model download.
//!
//! A summarizer is built once at startup with [`create_summarizer`] and shared
//! read-only across requests as an `Arc<dyn Summarizer>`. Implementations hold
//! no per-call mutable state, so concurrent calls are safe.
//!
//! # Determinism
//!
//! Every provider decodes without sampling: the local model runs a fixed
//! beam search and Ollama runs at temperature 0 with a fixed seed. The same text and bounds
//! produce the same summary.

#[cfg(feature = "local-summarizer")]
mod local_tract;

#[cfg(feature = "local-summarizer")]
pub use local_tract::LocalSummarizer;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::SummarizerConfig;
use crate::models::LengthBounds;

/// Fixed seed sent to Ollama so repeated requests decode identically.
const OLLAMA_SEED: u64 = 42;

/// Errors surfaced while generating a summary.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// No model is loaded or the provider is unreachable.
    #[error("summarization model unavailable: {0}")]
    Unavailable(String),
    /// The model raised while generating.
    #[error("summarization failed: {0}")]
    Inference(String),
    /// The provider answered with something we could not use.
    #[error("malformed summarizer response: {0}")]
    InvalidResponse(String),
}

/// An abstractive summarization model.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Returns the model identifier (e.g. `"bart-large-cnn"`).
    fn model_name(&self) -> &str;

    /// Summarize `text`, passing `bounds.min` / `bounds.max` to the model
    /// as generation-length constraints.
    async fn summarize(&self, text: &str, bounds: LengthBounds) -> Result<String, SummarizeError>;
}

// ============ Disabled ============

/// A summarizer that always fails.
///
/// Used when `summarizer.provider = "disabled"`, which lets the server and
/// the `extract`/`download` commands run without a model.
pub struct DisabledSummarizer;

#[async_trait]
impl Summarizer for DisabledSummarizer {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn summarize(&self, _text: &str, _bounds: LengthBounds) -> Result<String, SummarizeError> {
        Err(SummarizeError::Unavailable(
            "summarizer provider is disabled".to_string(),
        ))
    }
}

// ============ Ollama ============

/// Summarizer backed by a local Ollama instance.
///
/// Calls `POST {url}/api/generate` (default `http://localhost:11434`) with
/// streaming off. Requests are not retried.
pub struct OllamaSummarizer {
    model: String,
    url: String,
    client: reqwest::Client,
}

impl OllamaSummarizer {
    pub fn new(config: &SummarizerConfig) -> anyhow::Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("summarizer.model required for Ollama provider"))?;
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434".to_string());
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { model, url, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.url.trim_end_matches('/'))
    }
}

/// Prompt asking an instruction-tuned model for a summary within `bounds` words.
fn ollama_prompt(text: &str, bounds: LengthBounds) -> String {
    format!(
        "Summarize the following document in {} to {} words. \
         Respond with the summary text only.\n\n{}",
        bounds.min, bounds.max, text
    )
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn summarize(&self, text: &str, bounds: LengthBounds) -> Result<String, SummarizeError> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": ollama_prompt(text, bounds),
            "stream": false,
            "options": {
                "temperature": 0.0,
                "seed": OLLAMA_SEED,
                // Words → tokens headroom; the prompt asks for the word range.
                "num_predict": bounds.max * 2,
            }
        });

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                SummarizeError::Unavailable(format!(
                    "Ollama connection error (is Ollama running at {}?): {}",
                    self.url, e
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(SummarizeError::Inference(format!(
                "Ollama API error {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SummarizeError::InvalidResponse(e.to_string()))?;
        parse_ollama_response(&json)
    }
}

fn parse_ollama_response(json: &serde_json::Value) -> Result<String, SummarizeError> {
    let text = json
        .get("response")
        .and_then(|r| r.as_str())
        .ok_or_else(|| SummarizeError::InvalidResponse("missing response field".to_string()))?
        .trim();
    if text.is_empty() {
        return Err(SummarizeError::InvalidResponse(
            "model returned an empty summary".to_string(),
        ));
    }
    Ok(text.to_string())
}

/// Create the configured [`Summarizer`].
///
/// | Config Value | Summarizer |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledSummarizer`] |
/// | `"ollama"` | [`OllamaSummarizer`] |
/// | `"local"` | `LocalSummarizer` (requires the `local-summarizer` feature) |
///
/// The local model is downloaded (first run only) and loaded here, on a
/// blocking thread, so the returned handle is ready to serve.
pub async fn create_summarizer(config: &SummarizerConfig) -> anyhow::Result<Arc<dyn Summarizer>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledSummarizer)),
        "ollama" => Ok(Arc::new(OllamaSummarizer::new(config)?)),
        #[cfg(feature = "local-summarizer")]
        "local" => {
            let config = config.clone();
            let summarizer =
                tokio::task::spawn_blocking(move || LocalSummarizer::load(&config)).await??;
            Ok(Arc::new(summarizer))
        }
        #[cfg(not(feature = "local-summarizer"))]
        "local" => anyhow::bail!("Local summarizer requires --features local-summarizer"),
        other => anyhow::bail!("Unknown summarizer provider: {}", other),
    }
}
