//! Redyce Domain Layer
//!
//! Core model and trait boundaries for requirement extraction from tender
//! documents ("appels d'offres"). Infrastructure lives in other crates.
//!
//! ## Key Concepts
//!
//! - **Document**: an uploaded source document (RC, CCTP, CCAP, DPGF, AE...)
//!   carrying a requirement-extraction status
//! - **Requirement**: one actionable obligation extracted from a document,
//!   deduplicated by its content hash
//! - **Job**: an in-process unit of work arbitrated per project by priority
//! - **Content hash**: stable fingerprint of (project, document, normalized title)
//!
//! ## Architecture
//!
//! - Pure business logic and value types
//! - Trait definitions for every external interaction (store, job ledger,
//!   completion client, text extractor)
//! - Dependencies limited to identifier generation and hashing primitives

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod completion;
pub mod content_hash;
pub mod document;
pub mod ids;
pub mod job;
pub mod requirement;
pub mod traits;

// Re-exports for convenience
pub use completion::{Completion, CompletionMetadata, CompletionOptions, CompletionRequest};
pub use content_hash::{content_hash, normalize_title, CONTENT_HASH_LENGTH};
pub use document::{
    Document, DocumentKind, DocumentSummary, ExtractedText, ExtractionStatus, StatusUpdate,
};
pub use ids::{DocumentId, JobId, ProjectId, RequirementId, UserId};
pub use job::{Job, JobPriority, JobStatus, JobType};
pub use requirement::{
    normalize_priority, InsertOutcome, Requirement, RequirementPriority, RequirementStatus,
    UsageRecord,
};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current timestamp in seconds since Unix epoch
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
