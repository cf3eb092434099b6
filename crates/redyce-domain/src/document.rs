//! Source documents and their requirement-extraction lifecycle

use crate::ids::{DocumentId, ProjectId};
use std::collections::BTreeMap;
use std::fmt;

/// Requirement-extraction status of a document
///
/// Lifecycle: `(none) → Waiting → Processing → {Done | Error}`.
/// A document never returns to `Waiting` on its own; re-extraction requires
/// an explicit re-enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionStatus {
    /// Queued for extraction
    Waiting,
    /// Extraction in progress
    Processing,
    /// Extraction finished successfully
    Done,
    /// Extraction failed; see the document's error message
    Error,
}

impl ExtractionStatus {
    /// Get the status name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStatus::Waiting => "WAITING",
            ExtractionStatus::Processing => "PROCESSING",
            ExtractionStatus::Done => "DONE",
            ExtractionStatus::Error => "ERROR",
        }
    }

    /// Parse a stored status name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "WAITING" => Some(ExtractionStatus::Waiting),
            "PROCESSING" => Some(ExtractionStatus::Processing),
            "DONE" => Some(ExtractionStatus::Done),
            "ERROR" => Some(ExtractionStatus::Error),
            _ => None,
        }
    }

    /// Whether a document in this status (or never processed) is a
    /// candidate for extraction
    pub fn is_pending(status: Option<Self>) -> bool {
        matches!(status, None | Some(ExtractionStatus::Waiting))
    }
}

impl fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status write against a document
///
/// Each variant carries exactly the side fields the transition touches:
/// `Done` stamps the completion time and clears the error, `Error` records
/// the message, `Waiting` clears a previous error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// Mark as queued and clear any previous error
    Waiting,
    /// Mark as in progress
    Processing,
    /// Mark as done at the given timestamp
    Done {
        /// Completion time (seconds since epoch)
        processed_at: u64,
    },
    /// Mark as failed with a message
    Error {
        /// Human-readable failure reason
        message: String,
    },
}

impl StatusUpdate {
    /// The status this update writes
    pub fn status(&self) -> ExtractionStatus {
        match self {
            StatusUpdate::Waiting => ExtractionStatus::Waiting,
            StatusUpdate::Processing => ExtractionStatus::Processing,
            StatusUpdate::Done { .. } => ExtractionStatus::Done,
            StatusUpdate::Error { .. } => ExtractionStatus::Error,
        }
    }
}

/// Category of tender document, used as a parsing hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// Règlement de consultation
    Rc,
    /// Cahier des clauses techniques particulières
    Cctp,
    /// Cahier des clauses administratives particulières
    Ccap,
    /// Décomposition du prix global et forfaitaire
    Dpgf,
    /// Acte d'engagement
    Ae,
    /// Anything else
    Other,
}

impl DocumentKind {
    /// Get the kind name as stored
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Rc => "RC",
            DocumentKind::Cctp => "CCTP",
            DocumentKind::Ccap => "CCAP",
            DocumentKind::Dpgf => "DPGF",
            DocumentKind::Ae => "AE",
            DocumentKind::Other => "OTHER",
        }
    }

    /// Parse a kind name; unknown names map to `Other`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "RC" => DocumentKind::Rc,
            "CCTP" => DocumentKind::Cctp,
            "CCAP" => DocumentKind::Ccap,
            "DPGF" => DocumentKind::Dpgf,
            "AE" => DocumentKind::Ae,
            _ => DocumentKind::Other,
        }
    }
}

/// An uploaded source document with its raw bytes
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document identity
    pub id: DocumentId,
    /// Owning project
    pub project_id: ProjectId,
    /// Original file name
    pub name: String,
    /// MIME type of the stored bytes
    pub mime_type: String,
    /// Optional tender document category
    pub kind: Option<DocumentKind>,
    /// Raw stored bytes
    pub content: Vec<u8>,
    /// Requirement-extraction status (`None` if never enqueued)
    pub requirement_status: Option<ExtractionStatus>,
    /// When extraction last completed successfully
    pub requirement_processed_at: Option<u64>,
    /// Message of the last extraction failure
    pub requirement_error_message: Option<String>,
    /// Upload time (seconds since epoch)
    pub created_at: u64,
}

impl Document {
    /// Create a freshly uploaded document that has never been enqueued
    pub fn new(
        id: DocumentId,
        project_id: ProjectId,
        name: impl Into<String>,
        mime_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            id,
            project_id,
            name: name.into(),
            mime_type: mime_type.into(),
            kind: None,
            content,
            requirement_status: None,
            requirement_processed_at: None,
            requirement_error_message: None,
            created_at: crate::current_timestamp(),
        }
    }

    /// Set the document category hint
    pub fn with_kind(mut self, kind: DocumentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Lightweight view without the stored bytes
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            project_id: self.project_id.clone(),
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            requirement_status: self.requirement_status,
            requirement_processed_at: self.requirement_processed_at,
            requirement_error_message: self.requirement_error_message.clone(),
        }
    }
}

/// Document metadata without content, for listings
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSummary {
    /// Document identity
    pub id: DocumentId,
    /// Owning project
    pub project_id: ProjectId,
    /// Original file name
    pub name: String,
    /// MIME type
    pub mime_type: String,
    /// Requirement-extraction status
    pub requirement_status: Option<ExtractionStatus>,
    /// When extraction last completed successfully
    pub requirement_processed_at: Option<u64>,
    /// Message of the last extraction failure
    pub requirement_error_message: Option<String>,
}

/// Output of a text extractor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedText {
    /// Plain text content
    pub text: String,
    /// Format-specific metadata (page count, parser used, ...)
    pub metadata: BTreeMap<String, String>,
}

impl ExtractedText {
    /// Plain text without metadata
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }
}
