//! Per-format content extraction.
//!
//! Dispatch is by exact or prefix match on the declared content type. Each
//! strategy is total: parse failures and missing capabilities produce a
//! placeholder (or no text) plus error metadata instead of propagating.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Value as JsonValue};

use crate::truncate::{truncate_text, MAX_TEXT_LENGTH};

#[cfg(feature = "docx")]
use std::io::Read;

/// Content type of OOXML word-processing documents.
const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
/// Legacy Word binary format; no extraction capability for it.
const MIME_DOC: &str = "application/msword";

/// Raw image bytes above this size are not inlined as base64 in metadata.
const MAX_INLINE_IMAGE_BYTES: usize = 4 * 1024 * 1024;

/// Result of a content extraction: optional text for the model context plus
/// structured metadata (format info, counts, error flags).
#[derive(Debug, Clone)]
pub struct Extraction {
    pub text: Option<String>,
    pub metadata: JsonValue,
}

impl Extraction {
    fn with_text(text: String, metadata: JsonValue) -> Self {
        Extraction {
            text: Some(text),
            metadata,
        }
    }

    fn without_text(metadata: JsonValue) -> Self {
        Extraction {
            text: None,
            metadata,
        }
    }
}

/// Format-dispatched text extractor.
///
/// `extract` never panics and never returns an error; callers can rely on
/// always getting an [`Extraction`] back, possibly carrying only an `error`
/// metadata field.
pub struct ContentExtractor {
    max_text_length: usize,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentExtractor {
    pub fn new() -> Self {
        Self {
            max_text_length: MAX_TEXT_LENGTH,
        }
    }

    /// Override the truncation limit (tests and special deployments).
    pub fn with_max_text_length(max_text_length: usize) -> Self {
        Self { max_text_length }
    }

    pub fn extract(&self, data: &[u8], content_type: &str, filename: &str) -> Extraction {
        let result = if content_type.starts_with("image/") {
            self.extract_image(data, content_type)
        } else {
            match content_type {
                "text/plain" => self.extract_plain_text(data),
                "application/pdf" => self.extract_pdf(data),
                MIME_DOCX => self.extract_docx(data),
                MIME_DOC => Extraction::with_text(
                    "[WORD: legacy .doc extraction not available]".to_string(),
                    json!({ "error": "capability_unavailable", "content_type": MIME_DOC }),
                ),
                "application/json" => self.extract_json(data),
                other => Extraction::without_text(json!({
                    "type": "unsupported",
                    "content_type": other,
                })),
            }
        };

        if let Some(error) = result.metadata.get("error") {
            tracing::warn!(
                filename = %filename,
                content_type = %content_type,
                error = %error,
                "Content extraction degraded"
            );
        }

        result
    }

    /// Images are not decoded; the text is a placeholder for vision-capable
    /// models and the metadata carries a size-capped base64 of the raw bytes.
    fn extract_image(&self, data: &[u8], content_type: &str) -> Extraction {
        let description = format!(
            "[IMAGE: Base64 encoded {} image - {} bytes]",
            content_type,
            data.len()
        );

        let mut metadata = json!({
            "type": "image",
            "content_type": content_type,
            "size": data.len(),
        });

        if data.len() <= MAX_INLINE_IMAGE_BYTES {
            metadata["base64_data"] = json!(STANDARD.encode(data));
        } else {
            metadata["base64_omitted"] = json!(true);
        }

        Extraction::with_text(description, metadata)
    }

    /// Try encodings in fixed order; first success wins.
    fn extract_plain_text(&self, data: &[u8]) -> Extraction {
        let decoded = std::str::from_utf8(data)
            .ok()
            .map(|s| (s.to_string(), "utf-8"))
            .or_else(|| decode_utf16(data).map(|s| (s, "utf-16")))
            .or_else(|| Some((decode_latin1(data), "latin-1")));

        match decoded {
            Some((text, encoding)) => {
                let (text, truncated) = truncate_text(&text, self.max_text_length);
                let word_count = text.split_whitespace().count();
                Extraction::with_text(
                    text.clone(),
                    json!({
                        "type": "text",
                        "encoding": encoding,
                        "length": text.chars().count(),
                        "word_count": word_count,
                        "truncated": truncated,
                    }),
                )
            }
            None => Extraction::with_text(
                "[TEXT: could not decode text file]".to_string(),
                json!({ "error": "encoding_error" }),
            ),
        }
    }

    #[cfg(feature = "pdf")]
    fn extract_pdf(&self, data: &[u8]) -> Extraction {
        match pdf_extract::extract_text_from_mem(data) {
            Ok(raw) => {
                let (text, page_count) = paginate_pdf_text(&raw);
                let (text, truncated) = truncate_text(&text, self.max_text_length);
                let word_count = text.split_whitespace().count();
                Extraction::with_text(
                    text.clone(),
                    json!({
                        "type": "pdf",
                        "page_count": page_count,
                        "text_length": text.chars().count(),
                        "word_count": word_count,
                        "truncated": truncated,
                    }),
                )
            }
            Err(e) => Extraction::with_text(
                "[PDF: could not process PDF file]".to_string(),
                json!({ "error": e.to_string() }),
            ),
        }
    }

    #[cfg(not(feature = "pdf"))]
    fn extract_pdf(&self, _data: &[u8]) -> Extraction {
        Extraction::with_text(
            "[PDF: text extraction capability not enabled]".to_string(),
            json!({ "error": "capability_unavailable" }),
        )
    }

    #[cfg(feature = "docx")]
    fn extract_docx(&self, data: &[u8]) -> Extraction {
        match docx_paragraphs(data) {
            Ok(paragraphs) => {
                let paragraph_count = paragraphs.len();
                let (text, truncated) =
                    truncate_text(&paragraphs.join("\n"), self.max_text_length);
                let word_count = text.split_whitespace().count();
                Extraction::with_text(
                    text.clone(),
                    json!({
                        "type": "word_document",
                        "paragraph_count": paragraph_count,
                        "text_length": text.chars().count(),
                        "word_count": word_count,
                        "truncated": truncated,
                    }),
                )
            }
            Err(e) => Extraction::with_text(
                "[WORD: could not process Word document]".to_string(),
                json!({ "error": e }),
            ),
        }
    }

    #[cfg(not(feature = "docx"))]
    fn extract_docx(&self, _data: &[u8]) -> Extraction {
        Extraction::with_text(
            "[WORD: text extraction capability not enabled]".to_string(),
            json!({ "error": "capability_unavailable" }),
        )
    }

    /// Re-serialize JSON with stable indentation for readability.
    fn extract_json(&self, data: &[u8]) -> Extraction {
        match serde_json::from_slice::<JsonValue>(data) {
            Ok(value) => {
                let formatted = serde_json::to_string_pretty(&value)
                    .unwrap_or_else(|_| value.to_string());
                let (text, truncated) = truncate_text(&formatted, self.max_text_length);
                Extraction::with_text(
                    text.clone(),
                    json!({
                        "type": "json",
                        "text_length": text.chars().count(),
                        "is_valid_json": true,
                        "truncated": truncated,
                    }),
                )
            }
            Err(e) => Extraction::with_text(
                "[JSON: could not process JSON file]".to_string(),
                json!({ "error": e.to_string() }),
            ),
        }
    }
}

/// Decode UTF-16 with a BOM (LE or FF FE / BE FE FF). Without a BOM the bytes
/// are not treated as UTF-16, so the latin-1 fallback stays reachable.
fn decode_utf16(data: &[u8]) -> Option<String> {
    if data.len() < 2 || data.len() % 2 != 0 {
        return None;
    }
    let little_endian = match (data[0], data[1]) {
        (0xFF, 0xFE) => true,
        (0xFE, 0xFF) => false,
        _ => return None,
    };
    let units: Vec<u16> = data[2..]
        .chunks_exact(2)
        .map(|pair| {
            if little_endian {
                u16::from_le_bytes([pair[0], pair[1]])
            } else {
                u16::from_be_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    String::from_utf16(&units).ok()
}

/// Latin-1 maps every byte to the code point of the same value; infallible.
fn decode_latin1(data: &[u8]) -> String {
    data.iter().map(|&b| b as char).collect()
}

/// Split extracted PDF text into pages on form feeds and prefix page headers.
/// Returns the concatenated text and the page count.
#[cfg(feature = "pdf")]
fn paginate_pdf_text(raw: &str) -> (String, usize) {
    let pages: Vec<&str> = raw
        .split('\u{0C}')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if pages.len() <= 1 {
        return (raw.trim().to_string(), 1);
    }

    let text = pages
        .iter()
        .enumerate()
        .map(|(i, page)| format!("Page {}:\n{}", i + 1, page))
        .collect::<Vec<_>>()
        .join("\n\n");
    (text, pages.len())
}

/// Pull non-empty paragraph texts (`w:p` / `w:t` runs) out of
/// `word/document.xml` inside the OOXML archive.
#[cfg(feature = "docx")]
fn docx_paragraphs(data: &[u8]) -> Result<Vec<String>, String> {
    // Zip-bomb protection for the single XML entry we read.
    const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

    let mut archive =
        zip::ZipArchive::new(std::io::Cursor::new(data)).map_err(|e| e.to_string())?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| "word/document.xml not found".to_string())?;

    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| e.to_string())?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err("word/document.xml exceeds size limit".to_string());
    }

    // No text trimming: spacing between runs inside a paragraph is significant.
    let mut reader = quick_xml::Reader::from_reader(doc_xml.as_slice());
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                let name = e.local_name();
                if name.as_ref() == b"p" {
                    in_paragraph = true;
                    current.clear();
                } else if in_paragraph && name.as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        current.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"p" && in_paragraph {
                    in_paragraph = false;
                    if !current.trim().is_empty() {
                        paragraphs.push(current.trim().to_string());
                    }
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }
    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::truncate::TRUNCATION_MARKER;

    fn extractor() -> ContentExtractor {
        ContentExtractor::new()
    }

    #[test]
    fn test_plain_text_utf8() {
        let result = extractor().extract(b"hello", "text/plain", "hello.txt");
        assert_eq!(result.text.as_deref(), Some("hello"));
        assert_eq!(result.metadata["encoding"], "utf-8");
        assert_eq!(result.metadata["word_count"], 1);
    }

    #[test]
    fn test_plain_text_utf16_with_bom() {
        let mut data = vec![0xFF, 0xFE];
        for unit in "héllo".encode_utf16() {
            data.extend_from_slice(&unit.to_le_bytes());
        }
        let result = extractor().extract(&data, "text/plain", "hello.txt");
        assert_eq!(result.text.as_deref(), Some("héllo"));
        assert_eq!(result.metadata["encoding"], "utf-16");
    }

    #[test]
    fn test_plain_text_latin1_fallback() {
        // 0xE9 is 'é' in latin-1 and invalid standalone UTF-8.
        let result = extractor().extract(&[0x63, 0x61, 0x66, 0xE9], "text/plain", "cafe.txt");
        assert_eq!(result.text.as_deref(), Some("café"));
        assert_eq!(result.metadata["encoding"], "latin-1");
    }

    #[test]
    fn test_plain_text_truncation() {
        let extractor = ContentExtractor::with_max_text_length(10);
        let result = extractor.extract("abcdefghijklmnop".as_bytes(), "text/plain", "long.txt");
        let text = result.text.unwrap();
        assert_eq!(text, format!("abcdefghij{}", TRUNCATION_MARKER));
        assert_eq!(result.metadata["truncated"], true);
    }

    #[test]
    fn test_json_pretty_printed() {
        let result = extractor().extract(br#"{"b":1,"a":[2,3]}"#, "application/json", "data.json");
        let text = result.text.unwrap();
        assert!(text.contains("\n"));
        assert!(text.contains("\"a\""));
        assert_eq!(result.metadata["is_valid_json"], true);
    }

    #[test]
    fn test_json_invalid_degrades() {
        let result = extractor().extract(b"{not json", "application/json", "bad.json");
        assert_eq!(
            result.text.as_deref(),
            Some("[JSON: could not process JSON file]")
        );
        assert!(result.metadata.get("error").is_some());
    }

    #[test]
    fn test_image_placeholder_and_base64() {
        let data = [0u8, 1, 2, 3];
        let result = extractor().extract(&data, "image/png", "pixel.png");
        let text = result.text.unwrap();
        assert!(text.contains("image/png"));
        assert!(text.contains("4 bytes"));
        assert_eq!(result.metadata["base64_data"], STANDARD.encode(data));
        assert_eq!(result.metadata["size"], 4);
    }

    #[test]
    fn test_large_image_base64_omitted() {
        let data = vec![0u8; MAX_INLINE_IMAGE_BYTES + 1];
        let result = extractor().extract(&data, "image/jpeg", "big.jpg");
        assert!(result.metadata.get("base64_data").is_none());
        assert_eq!(result.metadata["base64_omitted"], true);
    }

    #[test]
    fn test_unsupported_type_has_no_text() {
        let result = extractor().extract(b"PK", "application/zip", "archive.zip");
        assert!(result.text.is_none());
        assert_eq!(result.metadata["type"], "unsupported");
        assert_eq!(result.metadata["content_type"], "application/zip");
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_invalid_pdf_degrades_without_panic() {
        let result = extractor().extract(b"not a pdf", "application/pdf", "bad.pdf");
        assert_eq!(
            result.text.as_deref(),
            Some("[PDF: could not process PDF file]")
        );
        assert!(result.metadata.get("error").is_some());
    }

    #[cfg(feature = "docx")]
    #[test]
    fn test_docx_paragraph_extraction() {
        use std::io::Write;

        let mut data = Vec::new();
        {
            let cursor = std::io::Cursor::new(&mut data);
            let mut writer = zip::ZipWriter::new(cursor);
            let options = zip::write::SimpleFileOptions::default();
            writer
                .start_file("word/document.xml", options)
                .expect("start file");
            writer
                .write_all(
                    br#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
    <w:p><w:r><w:t>Second </w:t></w:r><w:r><w:t>paragraph.</w:t></w:r></w:p>
    <w:p></w:p>
  </w:body>
</w:document>"#,
                )
                .expect("write entry");
            writer.finish().expect("finish zip");
        }

        let result = extractor().extract(
            &data,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "doc.docx",
        );
        let text = result.text.expect("text");
        assert_eq!(text, "First paragraph.\nSecond paragraph.");
        assert_eq!(result.metadata["paragraph_count"], 2);
        assert_eq!(result.metadata["type"], "word_document");
    }

    #[cfg(feature = "docx")]
    #[test]
    fn test_invalid_docx_degrades_without_panic() {
        let result = extractor().extract(
            b"not a zip",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "bad.docx",
        );
        assert_eq!(
            result.text.as_deref(),
            Some("[WORD: could not process Word document]")
        );
        assert!(result.metadata.get("error").is_some());
    }

    #[test]
    fn test_legacy_doc_reports_missing_capability() {
        let result = extractor().extract(b"\xD0\xCF\x11\xE0", "application/msword", "old.doc");
        assert_eq!(result.metadata["error"], "capability_unavailable");
        assert!(result.text.is_some());
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_paginate_pdf_text_with_form_feeds() {
        let (text, pages) = paginate_pdf_text("first page\u{0C}second page");
        assert_eq!(pages, 2);
        assert!(text.starts_with("Page 1:\nfirst page"));
        assert!(text.contains("Page 2:\nsecond page"));
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn test_paginate_pdf_text_single_page() {
        let (text, pages) = paginate_pdf_text("only page\n");
        assert_eq!(pages, 1);
        assert_eq!(text, "only page");
    }
}
