//! Redyce Extractor
//!
//! Turns stored tender documents into structured requirements using an LLM.
//!
//! # Overview
//!
//! Each document goes through `WAITING → PROCESSING → {DONE | ERROR}`. The
//! extraction job reads the document text (cached after the first parse),
//! keeps the head and tail of over-long texts, asks the completion client for
//! a `{"requirements":[...]}` object and writes every candidate unless a
//! requirement with the same content hash already exists.
//!
//! # Architecture
//!
//! ```text
//! Document → TextExtractor → window → CompletionClient → parser → ExtractionStore
//! ```
//!
//! # Key Features
//!
//! - **Extraction job**: failures become outcomes and ERROR statuses, never panics
//! - **Deduplication**: re-running a document skips requirements already present
//! - **Backfill**: bounded-concurrency batches over every pending document
//! - **Project runner**: LOW priority job that yields to interactive work
//!
//! # Example Usage
//!
//! ```no_run
//! use redyce_domain::{DocumentId, UserId};
//! use redyce_extractor::{ExtractorConfig, RequirementExtractor};
//! use redyce_llm::MockProvider;
//! use redyce_store::SqliteStore;
//! use redyce_text::DocumentTextExtractor;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = RequirementExtractor::new(
//!     MockProvider::default(),
//!     DocumentTextExtractor::new(),
//!     SqliteStore::new("redyce.db")?,
//!     ExtractorConfig::default(),
//! );
//!
//! let outcome = extractor
//!     .extract_for_document(&DocumentId::new("cctp-lot-2"), &UserId::new("alice"))
//!     .await;
//!
//! println!("Created: {}", outcome.requirements_created);
//! println!("Skipped: {}", outcome.requirements_skipped);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod backfill;
mod config;
mod error;
mod extractor;
mod parser;
mod prompt;
mod runner;
mod types;
mod window;


pub use backfill::{BackfillHandle, BackfillOrchestrator, BackfillScope};
pub use config::{BackfillConfig, ExtractorConfig};
pub use error::ExtractorError;
pub use extractor::{RequirementExtractor, USAGE_OPERATION};
pub use prompt::{PromptBuilder, SYSTEM_INSTRUCTION};
pub use runner::{ProjectRunner, RunnerOutcome};
pub use types::{BackfillFailure, BackfillReport, ExtractionOutcome};
pub use window::{window_text, OMISSION_MARKER};
