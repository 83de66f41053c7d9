//! End-to-end summarization pipeline.
//!
//! ```text
//! Received → Extracted → Truncated → BoundsResolved → Summarized → StatisticsComputed → Completed
//!     └──────────────┴───────────┴──────────────┴────────────┴────────────────┴──▶ Failed(reason)
//! ```
//!
//! The pipeline is linear with no retries. Each component returns a typed
//! error; [`Pipeline`] is the only place those errors are translated into the
//! caller-facing [`PipelineError`] / [`PipelineOutcome`] contract.
//!
//! # Statistics contract
//!
//! `reduction_percentage` is measured against the full extracted text, even
//! though the model only sees the first [`MAX_INPUT_WORDS`] words. For long
//! documents most of the reduction therefore comes from truncation; the
//! `processed_words` / `excerpt_reduction_percentage` fields report the
//! reduction relative to what the model actually read.
//!
//! A document with no words fails with [`PipelineError::DivisionUndefined`]
//! before the model is invoked.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::extract::{extract_text, ExtractError};
use crate::models::{DocumentFormat, LengthTier, SourceDocument, SummaryResult};
use crate::stats::{self, StatsError};
use crate::summarizer::{SummarizeError, Summarizer};
use crate::truncate::{truncate_words, MAX_INPUT_WORDS};

/// Caller-facing failure of one pipeline run.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("format error: {0}")]
    Format(String),
    #[error("summarization error: {0}")]
    Summarization(String),
    #[error("{}", StatsError::DivisionUndefined)]
    DivisionUndefined,
}

impl PipelineError {
    /// Stable machine-readable code.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::UnsupportedFormat(_) => "unsupported_format",
            PipelineError::Decode(_) => "decode_error",
            PipelineError::Format(_) => "format_error",
            PipelineError::Summarization(_) => "summarization_error",
            PipelineError::DivisionUndefined => "division_undefined",
        }
    }

    /// Only model failures may succeed on resubmission; the pipeline itself
    /// never retries.
    pub fn is_retriable(&self) -> bool {
        matches!(self, PipelineError::Summarization(_))
    }
}

impl From<ExtractError> for PipelineError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::UnsupportedFormat(name) => PipelineError::UnsupportedFormat(name),
            ExtractError::Decode(msg) => PipelineError::Decode(msg),
            e @ ExtractError::Format { .. } => PipelineError::Format(e.to_string()),
        }
    }
}

impl From<SummarizeError> for PipelineError {
    fn from(err: SummarizeError) -> Self {
        PipelineError::Summarization(err.to_string())
    }
}

impl From<StatsError> for PipelineError {
    fn from(err: StatsError) -> Self {
        match err {
            StatsError::DivisionUndefined => PipelineError::DivisionUndefined,
        }
    }
}

/// Serialized result of a run: exactly `{summary, stats}` or `{error}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PipelineOutcome {
    Success(SummaryResult),
    Failure { error: String },
}

impl From<Result<SummaryResult, PipelineError>> for PipelineOutcome {
    fn from(result: Result<SummaryResult, PipelineError>) -> Self {
        match result {
            Ok(summary) => PipelineOutcome::Success(summary),
            Err(e) => PipelineOutcome::Failure {
                error: e.to_string(),
            },
        }
    }
}

/// Pipeline states, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Extracted,
    Truncated,
    BoundsResolved,
    Summarized,
    StatisticsComputed,
    Completed,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Received => "received",
            PipelineStage::Extracted => "extracted",
            PipelineStage::Truncated => "truncated",
            PipelineStage::BoundsResolved => "bounds_resolved",
            PipelineStage::Summarized => "summarized",
            PipelineStage::StatisticsComputed => "statistics_computed",
            PipelineStage::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Composes extraction, truncation, length policy, summarization and
/// statistics around a shared summarizer.
#[derive(Clone)]
pub struct Pipeline {
    summarizer: Arc<dyn Summarizer>,
}

impl Pipeline {
    pub fn new(summarizer: Arc<dyn Summarizer>) -> Self {
        Self { summarizer }
    }

    pub fn model_name(&self) -> &str {
        self.summarizer.model_name()
    }

    /// Run the full pipeline on one document.
    pub async fn run(
        &self,
        document: SourceDocument,
        tier: LengthTier,
    ) -> Result<SummaryResult, PipelineError> {
        let mut stage = PipelineStage::Received;
        let result = self.run_stages(document, tier, &mut stage).await;
        if let Err(e) = &result {
            tracing::warn!(after = %stage, kind = e.kind(), error = %e, "summarization pipeline failed");
        }
        result
    }

    /// Resolve the format from `filename`, then [`run`](Self::run).
    pub async fn summarize_named(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        tier: LengthTier,
    ) -> Result<SummaryResult, PipelineError> {
        let format = DocumentFormat::from_filename(filename)?;
        self.run(SourceDocument::new(bytes, format), tier).await
    }

    /// Boundary entry point: never fails, every error becomes `{error}`.
    ///
    /// A missing `length` label means `medium`; unknown labels do too.
    pub async fn summarize_upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        length: Option<&str>,
    ) -> PipelineOutcome {
        let tier = length.map(LengthTier::from_label).unwrap_or_default();
        self.summarize_named(filename, bytes, tier).await.into()
    }

    async fn run_stages(
        &self,
        document: SourceDocument,
        tier: LengthTier,
        stage: &mut PipelineStage,
    ) -> Result<SummaryResult, PipelineError> {
        let format = document.format();
        let original = extract_text(document.bytes(), format)?;
        drop(document);
        let original_words = stats::word_count(&original);
        advance(stage, PipelineStage::Extracted);
        tracing::debug!(%format, original_words, "extracted text");

        if original_words == 0 {
            return Err(StatsError::DivisionUndefined.into());
        }

        let excerpt = truncate_words(&original, MAX_INPUT_WORDS);
        advance(stage, PipelineStage::Truncated);

        let bounds = tier.bounds();
        advance(stage, PipelineStage::BoundsResolved);
        tracing::debug!(%tier, min = bounds.min, max = bounds.max, "resolved length bounds");

        let summary = self.summarizer.summarize(&excerpt, bounds).await?;
        advance(stage, PipelineStage::Summarized);

        let stats = stats::with_excerpt(stats::compute(&original, &summary)?, &excerpt)?;
        advance(stage, PipelineStage::StatisticsComputed);

        advance(stage, PipelineStage::Completed);
        tracing::info!(
            model = self.summarizer.model_name(),
            original_words = stats.original_words,
            processed_words = stats.processed_words,
            summary_words = stats.summary_words,
            reduction = stats.reduction_percentage,
            "summary generated"
        );
        Ok(SummaryResult { summary, stats })
    }
}

fn advance(stage: &mut PipelineStage, next: PipelineStage) {
    tracing::debug!(from = %stage, to = %next, "pipeline stage");
    *stage = next;
}
