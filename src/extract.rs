//! Multi-format text extraction (plain text, DOCX, PDF).
//!
//! Callers supply bytes plus an already-resolved [`DocumentFormat`]; this
//! module returns plain UTF-8 text. Extraction never panics: every failure is
//! an [`ExtractError`], including panics raised inside the PDF reader.

use std::io::Read;
use std::panic::{self, AssertUnwindSafe};

use quick_xml::events::Event;
use thiserror::Error;

use crate::models::DocumentFormat;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

const DOCX_BODY_ENTRY: &str = "word/document.xml";

/// Extraction failure.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The declared format is not one we can read.
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
    /// Plain-text bytes were not valid UTF-8.
    #[error("Could not decode text as UTF-8: {0}")]
    Decode(String),
    /// The byte stream is not a valid document of the declared format.
    #[error("could not read {format}: {message}")]
    Format {
        format: DocumentFormat,
        message: String,
    },
}

impl ExtractError {
    fn docx(message: impl std::fmt::Display) -> Self {
        ExtractError::Format {
            format: DocumentFormat::WordDocument,
            message: message.to_string(),
        }
    }

    fn pdf(message: impl std::fmt::Display) -> Self {
        ExtractError::Format {
            format: DocumentFormat::PdfDocument,
            message: message.to_string(),
        }
    }
}

/// Extract plain text from `bytes` according to `format`.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractError> {
    match format {
        DocumentFormat::PlainText => extract_plain(bytes),
        DocumentFormat::WordDocument => extract_docx(bytes),
        DocumentFormat::PdfDocument => extract_pdf(bytes),
    }
}

fn extract_plain(bytes: &[u8]) -> Result<String, ExtractError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ExtractError::Decode(e.to_string()))?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let pages = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }))
    .map_err(|_| ExtractError::pdf("reader aborted while parsing the file"))?
    .map_err(ExtractError::pdf)?;

    Ok(pages.concat())
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive =
        zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(ExtractError::docx)?;
    let entry = archive.by_name(DOCX_BODY_ENTRY).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => {
            ExtractError::docx(format!("{} not found", DOCX_BODY_ENTRY))
        }
        other => ExtractError::docx(other),
    })?;

    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(ExtractError::docx)?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::docx(format!(
            "{} exceeds size limit ({} bytes)",
            DOCX_BODY_ENTRY, MAX_XML_ENTRY_BYTES
        )));
    }

    docx_raw_text(&doc_xml)
}

/// Raw text of a WordprocessingML body: run text only, paragraphs separated
/// by a blank line, explicit breaks as newlines and tabs as tabs.
///
/// Tabs and breaks count only inside a run (`w:r`) and outside its
/// properties; `w:tab` under `w:pPr/w:tabs` is a tab-stop definition.
fn docx_raw_text(xml: &[u8]) -> Result<String, ExtractError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_text = false;
    let mut in_run = false;
    let mut props_depth = 0usize;
    loop {
        let content = in_run && props_depth == 0;
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"r" => in_run = true,
                b"pPr" | b"rPr" => props_depth += 1,
                b"t" if content => in_text = true,
                b"tab" if content => out.push('\t'),
                b"br" | b"cr" if content => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" if content => out.push('\t'),
                b"br" | b"cr" if content => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                let text = te.unescape().map_err(ExtractError::docx)?;
                out.push_str(&text);
            }
            Ok(Event::CData(cd)) if in_text => {
                out.push_str(&String::from_utf8_lossy(&cd));
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"r" => in_run = false,
                b"pPr" | b"rPr" => props_depth = props_depth.saturating_sub(1),
                b"p" => out.push_str("\n\n"),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::docx(e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}
