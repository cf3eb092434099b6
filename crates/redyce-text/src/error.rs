//! Error types for text extraction

use thiserror::Error;

/// Errors that can occur while turning document bytes into text
#[derive(Error, Debug)]
pub enum TextError {
    /// No parser handles this MIME type
    #[error("Unsupported document type: {0}")]
    UnsupportedMime(String),

    /// The PDF could not be loaded or read
    #[error("Failed to process PDF: {0}")]
    Pdf(String),

    /// The DOCX archive or its XML body could not be read
    #[error("Failed to process DOCX: {0}")]
    Docx(String),
}
