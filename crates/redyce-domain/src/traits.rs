//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::completion::{Completion, CompletionOptions, CompletionRequest};
use crate::document::{Document, DocumentKind, DocumentSummary, ExtractedText, StatusUpdate};
use crate::ids::{DocumentId, JobId, ProjectId};
use crate::job::Job;
use crate::requirement::{InsertOutcome, Requirement, UsageRecord};
use async_trait::async_trait;

/// Persistence for documents, cached analyses, requirements and usage
///
/// Implemented by the infrastructure layer (redyce-store)
pub trait ExtractionStore {
    /// Error type for store operations
    type Error;

    /// Insert a document, or update the metadata and bytes of an existing one
    ///
    /// Extraction status and requirements of an existing document are kept.
    /// Changed bytes discard its cached analysis.
    fn insert_document(&mut self, document: &Document) -> Result<(), Self::Error>;

    /// Get a document, including its bytes
    fn get_document(&self, id: &DocumentId) -> Result<Option<Document>, Self::Error>;

    /// List documents, optionally restricted to a project
    fn list_documents(
        &self,
        project_id: Option<&ProjectId>,
    ) -> Result<Vec<DocumentSummary>, Self::Error>;

    /// Documents that have never been processed or are waiting, plus failed
    /// ones when `include_failed` is set
    fn find_extraction_candidates(
        &self,
        project_id: Option<&ProjectId>,
        include_failed: bool,
    ) -> Result<Vec<DocumentId>, Self::Error>;

    /// Write a requirement-extraction status transition
    ///
    /// Returns `false` if the document does not exist.
    fn set_extraction_status(
        &mut self,
        id: &DocumentId,
        update: &StatusUpdate,
    ) -> Result<bool, Self::Error>;

    /// Get previously extracted text for a document
    fn get_cached_analysis(&self, id: &DocumentId) -> Result<Option<String>, Self::Error>;

    /// Persist extracted text so retries skip re-parsing
    fn save_cached_analysis(&mut self, id: &DocumentId, text: &str) -> Result<(), Self::Error>;

    /// Insert a requirement unless one with the same
    /// `(project_id, document_id, content_hash)` exists
    fn insert_requirement(&mut self, requirement: &Requirement)
        -> Result<InsertOutcome, Self::Error>;

    /// Requirements extracted from a document, oldest first
    fn requirements_for_document(
        &self,
        document_id: &DocumentId,
    ) -> Result<Vec<Requirement>, Self::Error>;

    /// Record token usage for cost attribution
    fn record_usage(&mut self, usage: &UsageRecord) -> Result<(), Self::Error>;
}

/// Durable record of coordinated jobs
///
/// Lets the priority manager survive a process restart with its paused jobs
/// and cursors intact.
pub trait JobLedger {
    /// Error type for ledger operations
    type Error;

    /// Insert or replace a job snapshot
    fn save_job(&mut self, job: &Job) -> Result<(), Self::Error>;

    /// Remove a job
    fn delete_job(&mut self, id: JobId) -> Result<(), Self::Error>;

    /// Load every recorded job
    fn load_jobs(&self) -> Result<Vec<Job>, Self::Error>;
}

/// Text-completion service
///
/// Implemented by the infrastructure layer (redyce-llm)
#[async_trait]
pub trait CompletionClient {
    /// Error type for completion calls
    type Error;

    /// Generate a completion for the prompt
    async fn complete(
        &self,
        request: CompletionRequest,
        options: CompletionOptions,
    ) -> Result<Completion, Self::Error>;
}

/// Converts stored document bytes into plain text
///
/// Implemented by the infrastructure layer (redyce-text)
pub trait TextExtractor {
    /// Error type for extraction failures
    type Error;

    /// Extract text from raw bytes of the given MIME type
    fn extract(
        &self,
        bytes: &[u8],
        mime_type: &str,
        kind: Option<DocumentKind>,
    ) -> Result<ExtractedText, Self::Error>;
}
