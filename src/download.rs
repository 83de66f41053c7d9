//! Builds the downloadable summary document.
//!
//! The output is a minimal WordprocessingML package: a `Heading1` paragraph
//! reading "Document Summary" followed by one body paragraph holding the
//! summary. Line breaks in the summary become `<w:br/>`; everything else is
//! written verbatim (escaped, whitespace preserved).

use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Fixed filename offered to the client.
pub const SUMMARY_FILENAME: &str = "summary.docx";

pub const SUMMARY_HEADING: &str = "Document Summary";

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style></w:styles>"#;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("could not write summary document: {0}")]
    Package(String),
}

impl DownloadError {
    fn package(err: impl std::fmt::Display) -> Self {
        DownloadError::Package(err.to_string())
    }
}

/// Package `summary` as a `.docx` byte stream.
pub fn build_summary_docx(summary: &str) -> Result<Vec<u8>, DownloadError> {
    let document_xml = document_xml(summary)?;

    let parts: [(&str, &[u8]); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
        ("_rels/.rels", PACKAGE_RELS_XML.as_bytes()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS_XML.as_bytes()),
        ("word/styles.xml", STYLES_XML.as_bytes()),
        ("word/document.xml", &document_xml),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, data) in parts {
        zip.start_file(name, options).map_err(DownloadError::package)?;
        zip.write_all(data).map_err(DownloadError::package)?;
    }
    let cursor = zip.finish().map_err(DownloadError::package)?;
    Ok(cursor.into_inner())
}

fn document_xml(summary: &str) -> Result<Vec<u8>, DownloadError> {
    let mut writer = Writer::new(Vec::new());
    let mut emit = |event: Event<'_>| writer.write_event(event).map_err(DownloadError::package);

    emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    emit(Event::Start(
        BytesStart::new("w:document").with_attributes([("xmlns:w", WORDML_NS)]),
    ))?;
    emit(Event::Start(BytesStart::new("w:body")))?;

    // Heading
    emit(Event::Start(BytesStart::new("w:p")))?;
    emit(Event::Start(BytesStart::new("w:pPr")))?;
    emit(Event::Empty(
        BytesStart::new("w:pStyle").with_attributes([("w:val", "Heading1")]),
    ))?;
    emit(Event::End(BytesEnd::new("w:pPr")))?;
    emit(Event::Start(BytesStart::new("w:r")))?;
    emit(Event::Start(BytesStart::new("w:t")))?;
    emit(Event::Text(BytesText::new(SUMMARY_HEADING)))?;
    emit(Event::End(BytesEnd::new("w:t")))?;
    emit(Event::End(BytesEnd::new("w:r")))?;
    emit(Event::End(BytesEnd::new("w:p")))?;

    // Body
    emit(Event::Start(BytesStart::new("w:p")))?;
    emit(Event::Start(BytesStart::new("w:r")))?;
    let normalized = summary.replace("\r\n", "\n");
    for (i, line) in normalized.split('\n').enumerate() {
        if i > 0 {
            emit(Event::Empty(BytesStart::new("w:br")))?;
        }
        emit(Event::Start(
            BytesStart::new("w:t").with_attributes([("xml:space", "preserve")]),
        ))?;
        emit(Event::Text(BytesText::new(line)))?;
        emit(Event::End(BytesEnd::new("w:t")))?;
    }
    emit(Event::End(BytesEnd::new("w:r")))?;
    emit(Event::End(BytesEnd::new("w:p")))?;

    emit(Event::End(BytesEnd::new("w:body")))?;
    emit(Event::End(BytesEnd::new("w:document")))?;

    Ok(writer.into_inner())
}
