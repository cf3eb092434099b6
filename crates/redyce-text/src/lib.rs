//! Redyce Text Extraction
//!
//! Turns stored document bytes into plain text for requirement extraction.
//! Implements the `TextExtractor` trait from `redyce-domain`.
//!
//! # Supported formats
//!
//! - `text/plain`, `text/markdown`, `text/csv`: decoded as UTF-8 (lossy)
//! - `application/pdf`: page-wise text via `lopdf`
//! - DOCX: paragraphs of `word/document.xml`
//!
//! Scanned PDFs yield little or no text; OCR is out of scope and such
//! documents fail the minimum-length check of the extraction job.

#![warn(missing_docs)]

mod docx;
mod error;
mod pdf;

pub use error::TextError;

use redyce_domain::traits::TextExtractor;
use redyce_domain::{DocumentKind, ExtractedText};
use tracing::debug;

/// MIME type of Word 2007+ documents
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Document formats this crate can read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// UTF-8 text (plain, Markdown, CSV)
    Text,
    /// Portable Document Format
    Pdf,
    /// Office Open XML word processing document
    Docx,
}

impl DocumentFormat {
    /// Map a MIME type (parameters such as `charset` ignored) to a format
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "text/plain" | "text/markdown" | "text/x-markdown" | "text/csv" => {
                Some(DocumentFormat::Text)
            }
            "application/pdf" => Some(DocumentFormat::Pdf),
            DOCX_MIME => Some(DocumentFormat::Docx),
            _ => None,
        }
    }

    /// Short name recorded in extraction metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Text => "text",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }
}

/// Text extractor dispatching on MIME type
///
/// # Examples
///
/// ```
/// use redyce_text::DocumentTextExtractor;
/// use redyce_domain::traits::TextExtractor;
///
/// let extractor = DocumentTextExtractor::new();
/// let extracted = extractor.extract(b"Article 1", "text/plain", None).unwrap();
/// assert_eq!(extracted.text, "Article 1");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentTextExtractor;

impl DocumentTextExtractor {
    /// Create an extractor
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for DocumentTextExtractor {
    type Error = TextError;

    fn extract(
        &self,
        bytes: &[u8],
        mime_type: &str,
        kind: Option<DocumentKind>,
    ) -> Result<ExtractedText, Self::Error> {
        let format = DocumentFormat::from_mime(mime_type)
            .ok_or_else(|| TextError::UnsupportedMime(mime_type.to_string()))?;

        let mut extracted = match format {
            DocumentFormat::Text => ExtractedText::new(String::from_utf8_lossy(bytes)),
            DocumentFormat::Pdf => {
                let (text, pages) = pdf::extract_pdf(bytes)?;
                let mut extracted = ExtractedText::new(text);
                extracted
                    .metadata
                    .insert("pages".to_string(), pages.to_string());
                extracted
            }
            DocumentFormat::Docx => {
                let (text, paragraphs) = docx::extract_docx(bytes)?;
                let mut extracted = ExtractedText::new(text);
                extracted
                    .metadata
                    .insert("paragraphs".to_string(), paragraphs.to_string());
                extracted
            }
        };

        extracted
            .metadata
            .insert("format".to_string(), format.as_str().to_string());
        if let Some(kind) = kind {
            extracted
                .metadata
                .insert("document_kind".to_string(), kind.as_str().to_string());
        }

        debug!(
            format = format.as_str(),
            chars = extracted.text.chars().count(),
            "Extracted document text"
        );
        Ok(extracted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_mime() {
        assert_eq!(
            DocumentFormat::from_mime("text/plain; charset=utf-8"),
            Some(DocumentFormat::Text)
        );
        assert_eq!(
            DocumentFormat::from_mime("Application/PDF"),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(DocumentFormat::from_mime(DOCX_MIME), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_mime("image/png"), None);
    }

    #[test]
    fn test_plain_text_is_lossy_utf8() {
        let extractor = DocumentTextExtractor::new();
        let extracted = extractor
            .extract(b"caf\xC3\xA9 \xFF", "text/markdown", Some(DocumentKind::Rc))
            .unwrap();

        assert!(extracted.text.starts_with("café "));
        assert_eq!(extracted.metadata.get("format").map(String::as_str), Some("text"));
        assert_eq!(
            extracted.metadata.get("document_kind").map(String::as_str),
            Some("RC")
        );
    }

    #[test]
    fn test_pdf_metadata_reports_pages() {
        let bytes = pdf::tests::build_pdf(&["Article 1", "Article 2"]);
        let extracted = DocumentTextExtractor::new()
            .extract(&bytes, "application/pdf", None)
            .unwrap();
        assert_eq!(extracted.metadata.get("pages").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_docx_dispatch() {
        let extracted = DocumentTextExtractor::new()
            .extract(&docx::tests::sample_docx(), DOCX_MIME, Some(DocumentKind::Cctp))
            .unwrap();
        assert!(extracted.text.contains("Article 1 - Objet"));
        assert_eq!(
            extracted.metadata.get("paragraphs").map(String::as_str),
            Some("2")
        );
    }

    #[test]
    fn test_unsupported_mime() {
        let result = DocumentTextExtractor::new().extract(b"\x89PNG", "image/png", None);
        assert!(matches!(result, Err(TextError::UnsupportedMime(m)) if m == "image/png"));
    }
}
