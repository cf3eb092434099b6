//! Error types for requirement extraction

use thiserror::Error;

/// Errors that can occur during extraction
///
/// Per-document failures never escape [`crate::RequirementExtractor::extract_for_document`];
/// they are recorded on the document and in the returned outcome.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Document (or job) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request
    #[error("Validation error: {0}")]
    Validation(String),

    /// Extracted text is below the configured minimum
    #[error("Document text too short ({0} characters)")]
    TextTooShort(usize),

    /// The text extractor could not read the document bytes
    #[error("Text extraction failed: {0}")]
    TextExtraction(String),

    /// Completion provider error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Completion could not be decoded into requirements
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Persistence error
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractorError {
    /// HTTP status class a surrounding API would answer with
    pub fn http_status(&self) -> u16 {
        match self {
            ExtractorError::NotFound(_) => 404,
            ExtractorError::Validation(_) | ExtractorError::Config(_) => 400,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_classes() {
        assert_eq!(ExtractorError::NotFound("doc".into()).http_status(), 404);
        assert_eq!(ExtractorError::Validation("bad".into()).http_status(), 400);
        assert_eq!(ExtractorError::TextTooShort(30).http_status(), 500);
        assert_eq!(ExtractorError::Llm("down".into()).http_status(), 500);
    }

    #[test]
    fn test_too_short_message() {
        assert_eq!(
            ExtractorError::TextTooShort(30).to_string(),
            "Document text too short (30 characters)"
        );
    }
}
