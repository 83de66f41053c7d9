//! Core data models used throughout the summarizer.
//!
//! These types describe the documents, length tiers, and results that flow
//! through the `extract → truncate → summarize → stats` pipeline. Nothing
//! here is persisted; every value lives for the duration of one request.

use serde::{Deserialize, Serialize};

use crate::extract::ExtractError;

/// MIME type of plain UTF-8 text.
pub const MIME_TEXT: &str = "text/plain";
/// MIME type of an OOXML word-processing document (`.docx`).
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
/// MIME type of a PDF document.
pub const MIME_PDF: &str = "application/pdf";

/// Declared format of an uploaded document.
///
/// Resolved once at the boundary (from a filename suffix or a canonical tag)
/// and passed into the core as a closed enum, so extraction never inspects
/// strings to decide what to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    PlainText,
    WordDocument,
    PdfDocument,
}

impl DocumentFormat {
    /// All supported formats, in tag order.
    pub const ALL: [DocumentFormat; 3] = [
        DocumentFormat::PlainText,
        DocumentFormat::WordDocument,
        DocumentFormat::PdfDocument,
    ];

    /// Resolve a format from a filename suffix (`.txt`, `.docx`, `.pdf`).
    ///
    /// Matching is case-insensitive. Any other suffix, or no suffix at all,
    /// is an [`ExtractError::UnsupportedFormat`].
    pub fn from_filename(filename: &str) -> Result<Self, ExtractError> {
        let lower = filename.trim().to_ascii_lowercase();
        if lower.ends_with(".txt") {
            Ok(DocumentFormat::PlainText)
        } else if lower.ends_with(".docx") {
            Ok(DocumentFormat::WordDocument)
        } else if lower.ends_with(".pdf") {
            Ok(DocumentFormat::PdfDocument)
        } else {
            Err(ExtractError::UnsupportedFormat(filename.to_string()))
        }
    }

    /// Resolve a format from its canonical tag (`plain-text`, `word-document`, `pdf-document`).
    pub fn from_tag(tag: &str) -> Result<Self, ExtractError> {
        Self::ALL
            .into_iter()
            .find(|f| f.tag() == tag)
            .ok_or_else(|| ExtractError::UnsupportedFormat(tag.to_string()))
    }

    /// Canonical tag for this format.
    pub fn tag(self) -> &'static str {
        match self {
            DocumentFormat::PlainText => "plain-text",
            DocumentFormat::WordDocument => "word-document",
            DocumentFormat::PdfDocument => "pdf-document",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            DocumentFormat::PlainText => MIME_TEXT,
            DocumentFormat::WordDocument => MIME_DOCX,
            DocumentFormat::PdfDocument => MIME_PDF,
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// An uploaded document: raw bytes plus its declared format.
///
/// Immutable once received; consumed by the extractor.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    bytes: Vec<u8>,
    format: DocumentFormat,
}

impl SourceDocument {
    pub fn new(bytes: Vec<u8>, format: DocumentFormat) -> Self {
        Self { bytes, format }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }
}

/// Caller-selected verbosity of the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthTier {
    Short,
    #[default]
    Medium,
    Detailed,
}

impl LengthTier {
    pub fn as_str(self) -> &'static str {
        match self {
            LengthTier::Short => "short",
            LengthTier::Medium => "medium",
            LengthTier::Detailed => "detailed",
        }
    }
}

impl std::fmt::Display for LengthTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generation-length constraints handed to the summarization engine.
///
/// Units are the engine's native unit (sub-word tokens for the local model),
/// so they bound the output rather than fix its final word count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LengthBounds {
    pub min: usize,
    pub max: usize,
}

/// Word counts and reduction figures for one summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    /// Words in the full extracted text (before truncation).
    pub original_words: usize,
    /// Words in the generated summary.
    pub summary_words: usize,
    /// Reduction relative to the full original, one decimal.
    pub reduction_percentage: f64,
    /// Words actually fed to the model after truncation.
    pub processed_words: usize,
    /// Reduction relative to the truncated excerpt, one decimal.
    pub excerpt_reduction_percentage: f64,
}

/// Successful pipeline result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResult {
    pub summary: String,
    pub stats: SummaryStats,
}

/// Body of `POST /download`: a summary supplied by the caller.
///
/// Stateless; it does not refer to a previous summarization.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadRequest {
    pub summary: String,
}
