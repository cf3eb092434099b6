//! Types for extraction outcomes and model responses

use redyce_domain::DocumentId;
use serde::Deserialize;

/// Result of extracting one document
///
/// Failures are values here: `success == false` with `error` set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOutcome {
    /// Document processed
    pub document_id: DocumentId,
    /// Whether the document reached DONE
    pub success: bool,
    /// Requirements newly written
    pub requirements_created: usize,
    /// Requirements already present (same content hash)
    pub requirements_skipped: usize,
    /// Failure message, recorded on the document as well
    pub error: Option<String>,
    /// Model that served the completion, when one was made
    pub model: Option<String>,
    /// Prompt tokens reported by the provider
    pub input_tokens: Option<u64>,
    /// Completion tokens reported by the provider
    pub output_tokens: Option<u64>,
}

impl ExtractionOutcome {
    pub(crate) fn new(document_id: DocumentId) -> Self {
        Self {
            document_id,
            success: false,
            requirements_created: 0,
            requirements_skipped: 0,
            error: None,
            model: None,
            input_tokens: None,
            output_tokens: None,
        }
    }

    /// Failure outcome for a document whose task never reported back
    pub(crate) fn failed(document_id: DocumentId, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(document_id)
        }
    }
}

/// A failed document in a backfill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillFailure {
    /// Document that failed
    pub document_id: DocumentId,
    /// Failure message
    pub error: String,
}

/// Running totals of a backfill
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Documents selected for extraction
    pub total: usize,
    /// Documents finished so far (success or failure)
    pub processed: usize,
    /// Documents that reached DONE
    pub succeeded: usize,
    /// Documents that ended in ERROR
    pub failed: usize,
    /// Requirements written across all documents
    pub requirements_created: usize,
    /// Duplicates skipped across all documents
    pub requirements_skipped: usize,
    /// Per-document failures
    pub failures: Vec<BackfillFailure>,
    /// Whether every batch has run
    pub finished: bool,
}

impl BackfillReport {
    /// Fold one document outcome into the totals
    pub fn record(&mut self, outcome: &ExtractionOutcome) {
        self.processed += 1;
        self.requirements_created += outcome.requirements_created;
        self.requirements_skipped += outcome.requirements_skipped;
        if outcome.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
            self.failures.push(BackfillFailure {
                document_id: outcome.document_id.clone(),
                error: outcome.error.clone().unwrap_or_default(),
            });
        }
    }

    /// Documents not yet processed
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.processed)
    }
}

/// The JSON object the model is asked to reply with
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RequirementsPayload {
    pub requirements: Vec<RequirementCandidate>,
}

/// One requirement as proposed by the model
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct RequirementCandidate {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub quote: Option<String>,
}
