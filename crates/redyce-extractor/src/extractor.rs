//! The per-document requirement extraction job

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::parse_requirements;
use crate::prompt::{PromptBuilder, SYSTEM_INSTRUCTION};
use crate::types::{ExtractionOutcome, RequirementCandidate};
use crate::window::window_text;
use redyce_domain::traits::{CompletionClient, ExtractionStore, TextExtractor};
use redyce_domain::{
    content_hash, current_timestamp, normalize_priority, CompletionMetadata, CompletionOptions,
    CompletionRequest, Document, DocumentId, ExtractionStatus, InsertOutcome, Requirement,
    RequirementId, RequirementStatus, StatusUpdate, UsageRecord, UserId,
};
use std::borrow::Cow;
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Operation name under which extraction usage is recorded
pub const USAGE_OPERATION: &str = "requirement_extraction";

/// Extracts requirements from stored documents
///
/// Drives one document through `WAITING → PROCESSING → {DONE | ERROR}`:
/// text extraction (cached), length checks, windowing, one completion call,
/// schema-checked parsing and insert-if-absent of every candidate.
pub struct RequirementExtractor<L, T, S>
where
    L: CompletionClient,
    T: TextExtractor,
    S: ExtractionStore,
{
    llm: Arc<L>,
    text: Arc<T>,
    store: Arc<Mutex<S>>,
    config: ExtractorConfig,
}

impl<L, T, S> RequirementExtractor<L, T, S>
where
    L: CompletionClient + Send + Sync + 'static,
    T: TextExtractor + Send + Sync + 'static,
    S: ExtractionStore + Send + 'static,
    L::Error: Display,
    T::Error: Display,
    S::Error: Display,
{
    /// Create a new extractor
    pub fn new(llm: L, text: T, store: S, config: ExtractorConfig) -> Self {
        Self::from_shared(Arc::new(llm), Arc::new(text), Arc::new(Mutex::new(store)), config)
    }

    /// Create an extractor over collaborators shared with other components
    pub fn from_shared(
        llm: Arc<L>,
        text: Arc<T>,
        store: Arc<Mutex<S>>,
        config: ExtractorConfig,
    ) -> Self {
        Self {
            llm,
            text,
            store,
            config,
        }
    }

    /// The completion client
    pub fn llm(&self) -> &L {
        &self.llm
    }

    /// The shared store
    pub fn store(&self) -> &Arc<Mutex<S>> {
        &self.store
    }

    /// Get the configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Run `f` against the locked store
    ///
    /// The guard never outlives the call, so this is safe to use between
    /// `.await` points.
    pub(crate) fn with_store<R>(
        &self,
        f: impl FnOnce(&mut S) -> Result<R, S::Error>,
    ) -> Result<R, ExtractorError> {
        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut store).map_err(|e| ExtractorError::Store(e.to_string()))
    }

    /// Queue a document for extraction
    ///
    /// Returns `false` without touching the document when it is already DONE
    /// or PROCESSING. Any other document (including a failed one) is set to
    /// WAITING and its error cleared.
    pub fn enqueue_document(&self, document_id: &DocumentId) -> Result<bool, ExtractorError> {
        let status = self.current_status(document_id)?;
        if matches!(
            status,
            Some(ExtractionStatus::Done) | Some(ExtractionStatus::Processing)
        ) {
            debug!(document_id = %document_id, ?status, "Document not re-enqueued");
            return Ok(false);
        }
        self.with_store(|s| s.set_extraction_status(document_id, &StatusUpdate::Waiting))?;
        debug!(document_id = %document_id, "Document enqueued");
        Ok(true)
    }

    /// Put a failed document back in the queue
    ///
    /// Returns `false` unless the document is in ERROR.
    pub fn requeue_failed(&self, document_id: &DocumentId) -> Result<bool, ExtractorError> {
        if self.current_status(document_id)? != Some(ExtractionStatus::Error) {
            return Ok(false);
        }
        self.with_store(|s| s.set_extraction_status(document_id, &StatusUpdate::Waiting))?;
        info!(document_id = %document_id, "Failed document re-enqueued");
        Ok(true)
    }

    fn current_status(
        &self,
        document_id: &DocumentId,
    ) -> Result<Option<ExtractionStatus>, ExtractorError> {
        self.with_store(|s| s.get_document(document_id))?
            .map(|doc| doc.requirement_status)
            .ok_or_else(|| ExtractorError::NotFound(format!("document {}", document_id)))
    }

    /// Extract the requirements of one document
    ///
    /// Never fails: every error ends up in the returned outcome and, when the
    /// document exists, as its ERROR status and message.
    pub async fn extract_for_document(
        &self,
        document_id: &DocumentId,
        user_id: &UserId,
    ) -> ExtractionOutcome {
        let mut outcome = ExtractionOutcome::new(document_id.clone());

        let document = match self.with_store(|s| s.get_document(document_id)) {
            Ok(Some(document)) => document,
            Ok(None) => {
                let err = ExtractorError::NotFound(format!("document {}", document_id));
                warn!(document_id = %document_id, "Extraction requested for unknown document");
                outcome.error = Some(err.to_string());
                return outcome;
            }
            Err(e) => {
                error!(document_id = %document_id, error = %e, "Failed to load document");
                outcome.error = Some(e.to_string());
                return outcome;
            }
        };

        info!(
            document_id = %document_id,
            project_id = %document.project_id,
            name = %document.name,
            "Starting requirement extraction"
        );

        match self.run(document, user_id, &mut outcome).await {
            Ok(()) => {
                let done = StatusUpdate::Done {
                    processed_at: current_timestamp(),
                };
                match self.with_store(|s| s.set_extraction_status(document_id, &done)) {
                    Ok(_) => {
                        outcome.success = true;
                        info!(
                            document_id = %document_id,
                            created = outcome.requirements_created,
                            skipped = outcome.requirements_skipped,
                            "Requirement extraction done"
                        );
                    }
                    Err(e) => {
                        error!(document_id = %document_id, error = %e, "Failed to mark document done");
                        outcome.error = Some(e.to_string());
                    }
                }
            }
            Err(e) => {
                warn!(document_id = %document_id, error = %e, "Requirement extraction failed");
                self.record_failure(document_id, &e.to_string());
                outcome.error = Some(e.to_string());
            }
        }
        outcome
    }

    /// Best-effort ERROR write for a document
    pub(crate) fn record_failure(&self, document_id: &DocumentId, message: &str) {
        let update = StatusUpdate::Error {
            message: message.to_string(),
        };
        if let Err(e) = self.with_store(|s| s.set_extraction_status(document_id, &update)) {
            error!(document_id = %document_id, error = %e, "Failed to record extraction error");
        }
    }

    async fn run(
        &self,
        mut document: Document,
        user_id: &UserId,
        outcome: &mut ExtractionOutcome,
    ) -> Result<(), ExtractorError> {
        self.with_store(|s| s.set_extraction_status(&document.id, &StatusUpdate::Processing))?;

        let text = self.load_text(&mut document).await?;
        let length = text.chars().count();
        if length < self.config.min_text_length {
            return Err(ExtractorError::TextTooShort(length));
        }

        let windowed = window_text(
            &text,
            self.config.max_text_length,
            self.config.head_chars,
            self.config.tail_chars,
        );
        if let Cow::Owned(_) = windowed {
            debug!(
                document_id = %document.id,
                length,
                "Text exceeds max length, keeping head and tail"
            );
        }

        let request = CompletionRequest::new(
            PromptBuilder::new(&windowed)
                .with_document_name(&document.name)
                .with_kind(document.kind)
                .build(),
        )
        .with_system(SYSTEM_INSTRUCTION);
        let options = CompletionOptions {
            model: self.config.model.clone(),
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
        };

        let completion = self
            .llm
            .complete(request, options)
            .await
            .map_err(|e| ExtractorError::Llm(e.to_string()))?;

        outcome.model = Some(completion.metadata.model.clone());
        outcome.input_tokens = completion.metadata.input_tokens;
        outcome.output_tokens = completion.metadata.output_tokens;
        self.track_usage(&document, user_id, &completion.metadata);

        let candidates = parse_requirements(&completion.content)?;
        debug!(document_id = %document.id, candidates = candidates.len(), "Parsed completion");

        for candidate in candidates {
            let requirement = build_requirement(&document, candidate);
            match self.with_store(|s| s.insert_requirement(&requirement))? {
                InsertOutcome::Created => outcome.requirements_created += 1,
                InsertOutcome::Duplicate => {
                    debug!(
                        document_id = %document.id,
                        content_hash = %requirement.content_hash,
                        "Requirement already present"
                    );
                    outcome.requirements_skipped += 1;
                }
            }
        }
        Ok(())
    }

    /// Cached text, or a fresh extraction that is then cached
    async fn load_text(&self, document: &mut Document) -> Result<String, ExtractorError> {
        if let Some(text) = self.with_store(|s| s.get_cached_analysis(&document.id))? {
            debug!(document_id = %document.id, "Using cached analysis");
            return Ok(text);
        }

        let extractor = Arc::clone(&self.text);
        let bytes = std::mem::take(&mut document.content);
        let mime_type = document.mime_type.clone();
        let kind = document.kind;

        let extracted = tokio::task::spawn_blocking(move || {
            extractor
                .extract(&bytes, &mime_type, kind)
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| ExtractorError::TextExtraction(format!("extraction task failed: {}", e)))?
        .map_err(ExtractorError::TextExtraction)?;

        debug!(
            document_id = %document.id,
            chars = extracted.text.chars().count(),
            metadata = ?extracted.metadata,
            "Extracted document text"
        );

        if let Err(e) = self.with_store(|s| s.save_cached_analysis(&document.id, &extracted.text)) {
            warn!(document_id = %document.id, error = %e, "Failed to cache extracted text");
        }
        Ok(extracted.text)
    }

    fn track_usage(
        &self,
        document: &Document,
        user_id: &UserId,
        metadata: &CompletionMetadata,
    ) {
        let usage = UsageRecord {
            user_id: user_id.clone(),
            project_id: Some(document.project_id.clone()),
            operation: USAGE_OPERATION.to_string(),
            model: metadata.model.clone(),
            input_tokens: metadata.input_tokens,
            output_tokens: metadata.output_tokens,
            created_at: current_timestamp(),
        };
        if let Err(e) = self.with_store(|s| s.record_usage(&usage)) {
            warn!(document_id = %document.id, error = %e, "Failed to record usage");
        }
    }
}

fn build_requirement(document: &Document, candidate: RequirementCandidate) -> Requirement {
    let hash = content_hash(&document.project_id, &document.id, &candidate.title);
    let description = candidate
        .description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| candidate.title.clone());

    Requirement {
        id: RequirementId::new(),
        project_id: document.project_id.clone(),
        document_id: document.id.clone(),
        code: candidate.code,
        title: candidate.title,
        description,
        category: candidate.category,
        priority: normalize_priority(candidate.priority.as_deref()),
        status: RequirementStatus::default(),
        source_page: candidate.page,
        source_quote: candidate.quote,
        content_hash: hash,
        created_at: current_timestamp(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redyce_domain::{ProjectId, RequirementPriority};

    fn candidate(title: &str) -> RequirementCandidate {
        RequirementCandidate {
            title: title.to_string(),
            description: None,
            code: Some("Art. 4.2".to_string()),
            category: None,
            priority: Some("medium".to_string()),
            page: Some(12),
            quote: None,
        }
    }

    #[test]
    fn test_build_requirement_defaults() {
        let document = Document::new(
            DocumentId::new("d1"),
            ProjectId::new("p1"),
            "cctp.pdf",
            "application/pdf",
            vec![],
        );
        let requirement = build_requirement(&document, candidate("Fournir un PAQ"));

        assert_eq!(requirement.description, "Fournir un PAQ");
        assert_eq!(requirement.priority, RequirementPriority::Med);
        assert_eq!(requirement.status, RequirementStatus::ATraiter);
        assert_eq!(requirement.source_page, Some(12));
        assert_eq!(requirement.code.as_deref(), Some("Art. 4.2"));
        assert_eq!(
            requirement.content_hash,
            content_hash(&document.project_id, &document.id, "Fournir un PAQ")
        );
    }
}
